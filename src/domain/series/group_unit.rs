use chrono::{Datelike, Duration, NaiveDateTime, Timelike};

/// Bucketing granularity for the aggregation pipeline.
///
/// Closed set: adding a unit without updating the pipeline literal and the
/// truncation rule is a compile error, not a silent fall-through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupUnit {
    Hour,
    Day,
    Week,
    Month,
}

impl GroupUnit {
    /// Case-insensitive parse of the request literal.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.to_lowercase().as_str() {
            "hour" => Some(GroupUnit::Hour),
            "day" => Some(GroupUnit::Day),
            "week" => Some(GroupUnit::Week),
            "month" => Some(GroupUnit::Month),
            _ => None,
        }
    }

    /// Unit literal as MongoDB `$dateTrunc` / `$densify` expect it.
    pub fn as_str(&self) -> &'static str {
        match self {
            GroupUnit::Hour => "hour",
            GroupUnit::Day => "day",
            GroupUnit::Week => "week",
            GroupUnit::Month => "month",
        }
    }

    /// Rounds `dt` down to the start of its bucket.
    ///
    /// Weeks start on Monday, matching `startOfWeek: "monday"` in the
    /// compiled pipeline.
    pub fn truncate(&self, dt: NaiveDateTime) -> NaiveDateTime {
        match self {
            GroupUnit::Hour => dt
                .date()
                .and_hms_opt(dt.hour(), 0, 0)
                .unwrap(),
            GroupUnit::Day => dt.date().and_hms_opt(0, 0, 0).unwrap(),
            GroupUnit::Week => {
                let monday =
                    dt.date() - Duration::days(dt.weekday().num_days_from_monday() as i64);
                monday.and_hms_opt(0, 0, 0).unwrap()
            }
            GroupUnit::Month => dt
                .date()
                .with_day(1)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap(),
        }
    }

    /// Units whose closed upper bound is restored by the reshaper when the
    /// densify stage leaves it out (hour/day only, per the bot contract).
    pub fn patches_upper_edge(&self) -> bool {
        matches!(self, GroupUnit::Hour | GroupUnit::Day)
    }
}
