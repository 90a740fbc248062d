//! Series request/response DTOs.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::domain::series::group_unit::GroupUnit;
use crate::errors::AppError;

/// Timestamp wire format, both directions. No timezone component.
pub const WIRE_TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

#[derive(Deserialize, Debug)]
pub struct SeriesRequest {
    pub dt_from: String,
    pub dt_upto: String,
    pub group_type: String,
}

#[derive(Serialize, Deserialize, Debug, PartialEq)]
pub struct SeriesResponse {
    pub dataset: Vec<f64>,
    pub labels: Vec<String>,
}

/// Validated query window, carried from validation through reshaping.
#[derive(Debug, Clone)]
pub struct QueryWindow {
    pub from: NaiveDateTime,
    pub upto: NaiveDateTime,
    /// Literal `dt_upto` request string; the boundary patch echoes it verbatim.
    pub upto_raw: String,
    pub unit: GroupUnit,
}

pub fn parse_wire_timestamp(raw: &str) -> Result<NaiveDateTime, AppError> {
    NaiveDateTime::parse_from_str(raw, WIRE_TIMESTAMP_FORMAT)
        .map_err(|err| AppError::DateParseFailure(raw.to_string(), err.to_string()))
}

pub fn format_wire_timestamp(dt: NaiveDateTime) -> String {
    dt.format(WIRE_TIMESTAMP_FORMAT).to_string()
}
