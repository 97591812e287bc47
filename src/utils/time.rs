use chrono::{DateTime, Utc};

/* APIs often give timestamps as a float number of milliseconds (JSON numbers), e.g. 1711843200000.0 */
pub fn millis_to_datetime_utc(timestamp_ms: f64) -> Option<DateTime<Utc>> {
    if !timestamp_ms.is_finite() {
        return None;
    }
    let millis = timestamp_ms.trunc() as i64;
    let seconds = millis.div_euclid(1000);
    let nanoseconds = (millis.rem_euclid(1000) as u32) * 1_000_000;

    return DateTime::from_timestamp(seconds, nanoseconds);
}
