use chrono::{DateTime, Duration, Utc};

pub fn now() -> DateTime<Utc> {
    Utc::now()
}

pub fn minutes_from_now(minutes: i64) -> DateTime<Utc> {
    now() + Duration::minutes(minutes)
}
