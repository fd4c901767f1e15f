//! Test data factories for creating valid test fixtures.
//!
//! Each factory creates a complete, valid object with sensible defaults.
//! Use the closure parameter to override specific fields as needed.

use chrono::NaiveDateTime;
use uuid::Uuid;

use crate::application::use_cases::usage::UsageRecord;

/// A fixed base timestamp so fixture ordering is reproducible.
pub fn test_datetime() -> NaiveDateTime {
    chrono::DateTime::from_timestamp(1_700_000_000, 0)
        .unwrap()
        .naive_utc()
}

pub fn test_datetime_offset_secs(secs: i64) -> NaiveDateTime {
    test_datetime() + chrono::Duration::seconds(secs)
}

/// Create a usage record with sensible defaults, `offset_secs` past the base
/// timestamp. Larger offsets are newer.
pub fn create_test_usage_record(
    api_key_id: Uuid,
    offset_secs: i64,
    overrides: impl FnOnce(&mut UsageRecord),
) -> UsageRecord {
    let mut record = UsageRecord {
        id: Uuid::new_v4(),
        api_key_id,
        endpoint: "/summarize".to_string(),
        method: "POST".to_string(),
        status_code: 200,
        response_time: 0.42,
        ip_address: "10.0.0.1".to_string(),
        user_agent: Some("curl/8.0".to_string()),
        created_at: test_datetime_offset_secs(offset_secs),
    };
    overrides(&mut record);
    record
}
