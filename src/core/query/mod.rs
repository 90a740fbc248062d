pub mod executor;
pub mod pipeline;
