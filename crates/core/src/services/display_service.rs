use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};

/// Currency assumed when a record carries none. Applied only when
/// formatting; stored records keep `currency_code: None`.
pub const DISPLAY_FALLBACK_CURRENCY: &str = "BRL";

const NOT_AVAILABLE: &str = "N/A";

/// Brazilian-style money: `R$ 1.234,56`, `-US$ 10,00`.
pub fn format_money(amount: Decimal, currency: Option<&str>) -> String {
    let code = currency
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .unwrap_or(DISPLAY_FALLBACK_CURRENCY)
        .to_uppercase();

    let symbol = match code.as_str() {
        "BRL" => "R$".to_string(),
        "USD" => "US$".to_string(),
        "EUR" => "€".to_string(),
        "GBP" => "£".to_string(),
        other => other.to_string(),
    };

    let sign = if amount.is_sign_negative() && !amount.is_zero() {
        "-"
    } else {
        ""
    };
    format!("{sign}{symbol} {}", group_pt_br(amount.abs(), 2))
}

/// `dd/mm/yyyy`, or `N/A` when absent.
pub fn format_date(date: Option<DateTime<Utc>>) -> String {
    date.map(|d| d.format("%d/%m/%Y").to_string())
        .unwrap_or_else(|| NOT_AVAILABLE.to_string())
}

/// `CHECKING_ACCOUNT` → `CHECKING ACCOUNT`. Empty when absent.
pub fn format_label(label: Option<&str>) -> String {
    label.map(|l| l.replace('_', " ")).unwrap_or_default()
}

/// Like `format_label`, with a fallback for absent labels.
pub fn format_label_or(label: Option<&str>, fallback: &str) -> String {
    match label.filter(|l| !l.trim().is_empty()) {
        Some(l) => format_label(Some(l)),
        None => fallback.to_string(),
    }
}

/// `12.50%`, or `N/A` when absent.
pub fn format_percentage(value: Option<Decimal>) -> String {
    match value {
        Some(v) => {
            let mut rounded = v.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
            rounded.rescale(2);
            format!("{rounded}%")
        }
        None => NOT_AVAILABLE.to_string(),
    }
}

/// Round to `places` and render with `.` thousands and `,` decimals.
fn group_pt_br(value: Decimal, places: u32) -> String {
    let mut rounded = value.round_dp_with_strategy(places, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(places);
    let text = rounded.to_string();
    let (int_part, frac_part) = text.split_once('.').unwrap_or((text.as_str(), ""));

    let digits: Vec<char> = int_part.chars().collect();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.iter().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(*c);
    }

    if frac_part.is_empty() {
        grouped
    } else {
        format!("{grouped},{frac_part}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal::Decimal;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_format_money_defaults_to_brl() {
        assert_eq!(format_money(dec("1234.5"), None), "R$ 1.234,50");
        assert_eq!(format_money(dec("1234.5"), Some("")), "R$ 1.234,50");
    }

    #[test]
    fn test_format_money_negative_and_foreign() {
        assert_eq!(format_money(dec("-10"), Some("usd")), "-US$ 10,00");
        assert_eq!(format_money(dec("1000000.005"), Some("CHF")), "CHF 1.000.000,01");
        assert_eq!(format_money(dec("0.4"), Some("EUR")), "€ 0,40");
    }

    #[test]
    fn test_format_date() {
        let d = Utc.with_ymd_and_hms(2024, 3, 5, 12, 0, 0).unwrap();
        assert_eq!(format_date(Some(d)), "05/03/2024");
        assert_eq!(format_date(None), "N/A");
    }

    #[test]
    fn test_format_label_and_percentage() {
        assert_eq!(format_label(Some("CHECKING_ACCOUNT")), "CHECKING ACCOUNT");
        assert_eq!(format_label(None), "");
        assert_eq!(format_label_or(None, "Investment"), "Investment");
        assert_eq!(format_label_or(Some("  "), "Investment"), "Investment");
        assert_eq!(format_label_or(Some("FIXED_INCOME"), "Investment"), "FIXED INCOME");
        assert_eq!(format_percentage(Some(dec("12.5"))), "12.50%");
        assert_eq!(format_percentage(None), "N/A");
    }
}
