use chrono::{SecondsFormat, Utc};

/// Current UTC time as ISO-8601 with millisecond precision,
/// e.g. `2026-08-01T12:34:56.789Z`.
pub fn now_iso() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Generate a request id of the form `req_<12 hex chars>`.
pub fn gen_request_id() -> String {
    let id = uuid::Uuid::new_v4().simple().to_string();
    format!("req_{}", &id[..12])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn now_iso_has_millis_and_z_suffix() {
        let ts = now_iso();
        assert!(ts.ends_with('Z'));
        // 2026-08-01T12:34:56.789Z -> fraction is exactly three digits.
        let frac = ts.split('.').nth(1).expect("fractional part");
        assert_eq!(frac.len(), 4); // "789Z"
    }

    #[test]
    fn request_ids_are_prefixed_and_unique() {
        let a = gen_request_id();
        let b = gen_request_id();
        assert!(a.starts_with("req_"));
        assert_eq!(a.len(), 16);
        assert_ne!(a, b);
    }
}
