//! Turns raw bucket rows into the parallel `dataset`/`labels` arrays.

use crate::core::query::executor::BucketRow;
use crate::domain::series::dto::{format_wire_timestamp, QueryWindow, SeriesResponse};

/// Builds the response arrays, index-aligned and in ascending bucket order.
///
/// Upper-boundary patch: the densify stage never synthesizes a bucket that
/// starts exactly at `dt_upto` (its bounds are upper-exclusive). When the
/// window's upper bound falls exactly on an hour/day boundary and no record
/// landed there, one trailing zero entry is appended, labelled with the
/// literal `dt_upto` request string. Week/month windows are never patched.
pub fn reshape(rows: Vec<BucketRow>, window: &QueryWindow) -> SeriesResponse {
    let mut dataset = Vec::with_capacity(rows.len() + 1);
    let mut labels = Vec::with_capacity(rows.len() + 1);

    for row in &rows {
        labels.push(format_wire_timestamp(row.bucket_start));
        dataset.push(row.total);
    }

    if needs_upper_edge_patch(&rows, window) {
        labels.push(window.upto_raw.clone());
        dataset.push(0.0);
    }

    SeriesResponse { dataset, labels }
}

fn needs_upper_edge_patch(rows: &[BucketRow], window: &QueryWindow) -> bool {
    window.unit.patches_upper_edge()
        && window.unit.truncate(window.upto) == window.upto
        && rows.last().map_or(true, |row| row.bucket_start < window.upto)
}
