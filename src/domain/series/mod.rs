pub mod dto;
pub mod group_unit;
pub mod service;
