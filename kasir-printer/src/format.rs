//! Money, date and number formatting for Indonesian receipts
//!
//! Rupiah with "." thousands grouping and no decimals, dates as
//! `dd/mm/yyyy hh:mm`.

use chrono::NaiveDateTime;
use rust_decimal::{Decimal, RoundingStrategy};
use shared::SaleTimestamp;

/// Currency prefix printed before every amount
pub const CURRENCY_PREFIX: &str = "Rp ";

const THOUSANDS_SEPARATOR: char = '.';

/// Date format used on receipts and test pages
pub const DATE_FORMAT: &str = "%d/%m/%Y %H:%M";

/// Format an amount as Rupiah: `1500000` → `"Rp 1.500.000"`
///
/// Fractions are rounded half away from zero; negative amounts keep the
/// minus sign after the prefix (`"Rp -5.000"`).
pub fn format_currency(amount: Decimal) -> String {
    let rounded = amount.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);
    let digits = rounded.abs().normalize().to_string();
    let grouped = group_thousands(&digits);

    if rounded.is_sign_negative() && !rounded.is_zero() {
        format!("{}-{}", CURRENCY_PREFIX, grouped)
    } else {
        format!("{}{}", CURRENCY_PREFIX, grouped)
    }
}

fn group_thousands(digits: &str) -> String {
    let len = digits.len();
    let mut out = String::with_capacity(len + len / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            out.push(THOUSANDS_SEPARATOR);
        }
        out.push(c);
    }
    out
}

/// Render a sale timestamp; text is passed through unchanged
pub fn format_date(ts: &SaleTimestamp) -> String {
    match ts {
        SaleTimestamp::Text(text) => text.clone(),
        SaleTimestamp::Local(at) => format_datetime(at),
    }
}

pub fn format_datetime(at: &NaiveDateTime) -> String {
    at.format(DATE_FORMAT).to_string()
}

/// Quantities and percentages without trailing zeros (`2.00` → `"2"`)
pub fn format_number(n: Decimal) -> String {
    n.normalize().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_format_currency() {
        assert_eq!(format_currency(Decimal::ZERO), "Rp 0");
        assert_eq!(format_currency(dec("1500000")), "Rp 1.500.000");
        assert_eq!(format_currency(dec("999")), "Rp 999");
        assert_eq!(format_currency(dec("1000")), "Rp 1.000");
        assert_eq!(format_currency(dec("105000")), "Rp 105.000");
        assert_eq!(format_currency(dec("1234567890")), "Rp 1.234.567.890");
    }

    #[test]
    fn test_format_currency_rounds_fractions() {
        assert_eq!(format_currency(dec("1500.49")), "Rp 1.500");
        assert_eq!(format_currency(dec("1500.5")), "Rp 1.501");
        assert_eq!(format_currency(dec("90000.00")), "Rp 90.000");
        assert_eq!(format_currency(dec("-0.4")), "Rp 0");
    }

    #[test]
    fn test_format_currency_negative() {
        assert_eq!(format_currency(dec("-5000")), "Rp -5.000");
    }

    #[test]
    fn test_format_date() {
        let text = SaleTimestamp::Text("2026-10-17 09:30".into());
        assert_eq!(format_date(&text), "2026-10-17 09:30");

        let at = NaiveDate::from_ymd_opt(2026, 3, 7)
            .unwrap()
            .and_hms_opt(8, 5, 59)
            .unwrap();
        assert_eq!(format_date(&SaleTimestamp::Local(at)), "07/03/2026 08:05");
    }

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(dec("2.00")), "2");
        assert_eq!(format_number(dec("1.50")), "1.5");
        assert_eq!(format_number(dec("10")), "10");
    }
}
