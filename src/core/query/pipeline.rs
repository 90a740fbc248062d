//! Request-to-aggregation-pipeline compiler.

use mongodb::bson::{doc, Bson, DateTime, Document};

use crate::domain::series::dto::QueryWindow;
use crate::domain::series::group_unit::GroupUnit;

/// Compiles a validated window into the five-stage aggregation pipeline:
/// range filter, densify, truncate-and-project, group-and-sum, sort.
///
/// Densify bounds are lower-inclusive and upper-exclusive, so a bucket that
/// starts exactly at `dt_upto` is never synthesized here; the reshaper
/// restores that edge for hour/day windows.
pub fn compile_pipeline(window: &QueryWindow) -> Vec<Document> {
    let from = Bson::DateTime(DateTime::from_chrono(window.from.and_utc()));
    let upto = Bson::DateTime(DateTime::from_chrono(window.upto.and_utc()));
    let unit = window.unit.as_str();

    let mut date_trunc = doc! { "date": "$dt", "unit": unit };
    if window.unit == GroupUnit::Week {
        // Weeks truncate to Monday; $dateTrunc defaults to Sunday otherwise.
        date_trunc.insert("startOfWeek", "monday");
    }

    vec![
        doc! { "$match": { "dt": { "$gte": from.clone(), "$lte": upto.clone() } } },
        doc! { "$densify": {
            "field": "dt",
            "range": { "step": 1, "unit": unit, "bounds": [from, upto] },
        } },
        // Densified placeholders carry no `value`; $sum treats missing as 0,
        // which is what materializes empty buckets.
        doc! { "$project": {
            "bucket_start": { "$dateTrunc": date_trunc },
            "value": 1,
        } },
        doc! { "$group": { "_id": "$bucket_start", "total": { "$sum": "$value" } } },
        doc! { "$sort": { "_id": 1 } },
    ]
}
