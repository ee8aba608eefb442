/// Current UTC timestamp (milliseconds)
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Generate a Snowflake-style i64 for use as resource ID.
///
/// Layout (53 bits, fits in JavaScript's Number.MAX_SAFE_INTEGER):
///   - 41 bits: milliseconds since 2024-01-01 UTC (~69 years)
///   - 12 bits: random (4096 values per ms)
pub fn snowflake_id() -> i64 {
    use rand::Rng;
    // Custom epoch: 2024-01-01 00:00:00 UTC
    const EPOCH_MS: i64 = 1_704_067_200_000;
    let now = now_millis();
    let ts = (now - EPOCH_MS) & 0x1FF_FFFF_FFFF; // 41 bits
    let rand_bits: i64 = rand::thread_rng().gen_range(0..0x1000); // 12 bits
    (ts << 12) | rand_bits
}

/// Public order reference: `ECO-YYYYMMDD-<id>`
pub fn order_number(id: i64, created_at_millis: i64) -> String {
    let date = chrono::DateTime::from_timestamp_millis(created_at_millis)
        .unwrap_or_default()
        .format("%Y%m%d");
    format!("ECO-{date}-{id}")
}

/// Normalize an Indonesian phone number to the `62…` form used by WhatsApp.
///
/// Returns `None` for numbers that cannot be a mobile number.
pub fn normalize_phone(raw: &str) -> Option<String> {
    let digits: String = raw.chars().filter(char::is_ascii_digit).collect();
    let normalized = if let Some(rest) = digits.strip_prefix('0') {
        format!("62{rest}")
    } else if digits.starts_with("62") {
        digits
    } else if digits.starts_with('8') {
        format!("62{digits}")
    } else {
        return None;
    };
    // 62 + 8xx… ; Indonesian mobile numbers are 9-13 digits after the country code
    let local_len = normalized.len() - 2;
    if !(9..=13).contains(&local_len) || !normalized[2..].starts_with('8') {
        return None;
    }
    Some(normalized)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snowflake_ids_are_positive_and_ordered() {
        let a = snowflake_id();
        std::thread::sleep(std::time::Duration::from_millis(2));
        let b = snowflake_id();
        assert!(a > 0);
        assert!(b > a);
    }

    #[test]
    fn test_order_number_format() {
        // 2026-10-18 00:00:00 UTC
        let n = order_number(123, 1_792_281_600_000);
        assert_eq!(n, "ECO-20261018-123");
    }

    #[test]
    fn test_normalize_phone() {
        assert_eq!(normalize_phone("081234567890").as_deref(), Some("6281234567890"));
        assert_eq!(normalize_phone("+62 812-3456-7890").as_deref(), Some("6281234567890"));
        assert_eq!(normalize_phone("6281234567890").as_deref(), Some("6281234567890"));
        assert_eq!(normalize_phone("81234567890").as_deref(), Some("6281234567890"));
    }

    #[test]
    fn test_normalize_phone_rejects_garbage() {
        assert_eq!(normalize_phone(""), None);
        assert_eq!(normalize_phone("0812"), None);
        assert_eq!(normalize_phone("0221234567"), None); // landline
        assert_eq!(normalize_phone("+1 415 555 0100"), None);
    }
}
