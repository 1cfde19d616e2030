use chrono::{DateTime, Utc};

pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Nanosecond timestamp used to derive unique placeholder contact values.
pub fn high_res_nanos() -> i64 {
    Utc::now().timestamp_nanos_opt().unwrap_or_default()
}
