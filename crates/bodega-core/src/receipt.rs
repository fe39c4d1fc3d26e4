//! # Receipt Numbering
//!
//! POS receipt number generation: `RCP-YYYYMMDD-NNNN`, where `NNNN` is the
//! next unused 4-digit sequence for that calendar day.
//!
//! The core does not own receipt number storage; the persistence layer
//! supplies the existing receipt numbers for the day and checks uniqueness
//! for explicitly supplied numbers.

use chrono::NaiveDate;

/// Receipt number prefix.
pub const RECEIPT_PREFIX: &str = "RCP";

/// Returns the receipt prefix for a calendar day: `RCP-YYYYMMDD`.
pub fn receipt_prefix(date: NaiveDate) -> String {
    format!("{}-{}", RECEIPT_PREFIX, date.format("%Y%m%d"))
}

/// Extracts the sequence from a receipt number for the given day.
///
/// Sequences are zero-padded to 4 digits but keep growing past `9999`, so
/// any all-digit tail of at least 4 characters is accepted. Returns `None`
/// for receipts from other days or with a malformed tail.
pub fn receipt_sequence(receipt_number: &str, date: NaiveDate) -> Option<u32> {
    let prefix = receipt_prefix(date);
    let tail = receipt_number.strip_prefix(&prefix)?.strip_prefix('-')?;
    if tail.len() < 4 || !tail.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    tail.parse().ok()
}

/// Generates the next receipt number for a day.
///
/// Takes `max(existing sequence) + 1`, starting at `0001`. Gaps are NOT
/// refilled: with `0001` and `0003` present, the next number is `0004`.
///
/// ## Example
/// ```rust
/// use chrono::NaiveDate;
/// use bodega_core::receipt::next_receipt_number;
///
/// let day = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
/// let existing = vec![
///     "RCP-20250101-0001".to_string(),
///     "RCP-20250101-0003".to_string(),
/// ];
/// assert_eq!(next_receipt_number(day, &existing), "RCP-20250101-0004");
/// ```
pub fn next_receipt_number(date: NaiveDate, existing: &[String]) -> String {
    let max_seq = existing
        .iter()
        .filter_map(|number| receipt_sequence(number, date))
        .max()
        .unwrap_or(0);

    format!("{}-{:04}", receipt_prefix(date), max_seq + 1)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, 1).unwrap()
    }

    #[test]
    fn test_first_receipt_of_day() {
        assert_eq!(next_receipt_number(day(), &[]), "RCP-20250101-0001");
    }

    #[test]
    fn test_max_plus_one_not_gap_filling() {
        let existing = vec![
            "RCP-20250101-0001".to_string(),
            "RCP-20250101-0003".to_string(),
        ];
        assert_eq!(next_receipt_number(day(), &existing), "RCP-20250101-0004");
    }

    #[test]
    fn test_other_days_ignored() {
        let existing = vec![
            "RCP-20241231-0099".to_string(),
            "RCP-20250101-0002".to_string(),
        ];
        assert_eq!(next_receipt_number(day(), &existing), "RCP-20250101-0003");
    }

    #[test]
    fn test_malformed_tails_ignored() {
        let existing = vec![
            "RCP-20250101-12".to_string(),
            "RCP-20250101-ABCD".to_string(),
            "RCP-20250101-0007".to_string(),
        ];
        assert_eq!(next_receipt_number(day(), &existing), "RCP-20250101-0008");
    }

    #[test]
    fn test_receipt_sequence() {
        assert_eq!(receipt_sequence("RCP-20250101-0042", day()), Some(42));
        assert_eq!(receipt_sequence("RCP-20250102-0042", day()), None);
        assert_eq!(receipt_sequence("RCP-20250101-00x7", day()), None);
        assert_eq!(receipt_sequence("garbage", day()), None);
    }

    #[test]
    fn test_sequence_keeps_counting_past_9999() {
        let existing = vec!["RCP-20250101-9999".to_string()];
        assert_eq!(next_receipt_number(day(), &existing), "RCP-20250101-10000");

        // The widened number still round-trips, so the day after 10000
        // sales continues at 10001 instead of re-issuing 10000
        let existing = vec![
            "RCP-20250101-9999".to_string(),
            "RCP-20250101-10000".to_string(),
        ];
        assert_eq!(receipt_sequence("RCP-20250101-10000", day()), Some(10000));
        assert_eq!(next_receipt_number(day(), &existing), "RCP-20250101-10001");
    }
}
