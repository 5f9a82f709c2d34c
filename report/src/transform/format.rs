//! Display formatting for summed measures.
//!
//! Numbers are rounded to the requested number of decimals using the exact
//! binary value with ties to even (`2.5 → "2"`, `3.5 → "4"`), then the integer
//! part gets `,` thousands separators. Formatting is display-only: sums are
//! never rounded in place.

use serde::{Deserialize, Serialize};

/// Decimals used for the two formatted measure columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormatPolicy {
    pub quantity_decimals: usize,
    pub value_decimals: usize,
}

impl Default for FormatPolicy {
    fn default() -> Self {
        Self {
            quantity_decimals: 1,
            value_decimals: 0,
        }
    }
}

impl FormatPolicy {
    pub fn quantity(&self, quantity: f64) -> String {
        format_grouped(quantity, self.quantity_decimals)
    }

    pub fn value(&self, value: f64) -> String {
        format_grouped(value, self.value_decimals)
    }
}

/// `1234.56 → "1,234.6"`
pub fn format_quantity(quantity: f64) -> String {
    format_grouped(quantity, 1)
}

/// `1234.56 → "1,235"`
pub fn format_value(value: f64) -> String {
    format_grouped(value, 0)
}

/// Format with a fixed number of decimals and thousands separators.
pub fn format_grouped(number: f64, decimals: usize) -> String {
    let plain = format!("{:.*}", decimals, number);
    if !number.is_finite() {
        return plain;
    }

    let (sign, unsigned) = match plain.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", plain.as_str()),
    };
    let (integer, fraction) = match unsigned.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (unsigned, None),
    };

    let mut grouped = String::with_capacity(plain.len() + integer.len() / 3);
    grouped.push_str(sign);
    for (i, digit) in integer.chars().enumerate() {
        if i > 0 && (integer.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }
    if let Some(fraction) = fraction {
        grouped.push('.');
        grouped.push_str(fraction);
    }
    grouped
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_grouped(s: &str) -> f64 {
        s.replace(',', "").parse().unwrap()
    }

    #[test]
    fn test_quantity_has_one_decimal() {
        assert_eq!(format_quantity(0.0), "0.0");
        assert_eq!(format_quantity(2.0), "2.0");
        assert_eq!(format_quantity(1234.5), "1,234.5");
        assert_eq!(format_quantity(1234567.25), "1,234,567.2");
        assert_eq!(format_quantity(999.96), "1,000.0");
    }

    #[test]
    fn test_value_has_no_decimals() {
        assert_eq!(format_value(1234.4), "1,234");
        assert_eq!(format_value(1234.6), "1,235");
        assert_eq!(format_value(100.0), "100");
        assert_eq!(format_value(1000.0), "1,000");
        assert_eq!(format_value(123456789.0), "123,456,789");
    }

    #[test]
    fn test_ties_round_to_even() {
        assert_eq!(format_value(0.5), "0");
        assert_eq!(format_value(1.5), "2");
        assert_eq!(format_value(2.5), "2");
        assert_eq!(format_value(3.5), "4");
        assert_eq!(format_value(1234.5), "1,234");
        assert_eq!(format_quantity(0.25), "0.2");
        assert_eq!(format_quantity(0.75), "0.8");
    }

    #[test]
    fn test_negative_numbers() {
        assert_eq!(format_quantity(-1234.5), "-1,234.5");
        assert_eq!(format_value(-999.0), "-999");
        assert_eq!(format_value(-1000.0), "-1,000");
    }

    #[test]
    fn test_formatted_quantity_parses_back() {
        for quantity in [0.1, 12.3, 1234.5, 98765.4, 1_000_000.0] {
            let parsed = parse_grouped(&format_quantity(quantity));
            assert!((parsed - quantity).abs() < 0.05 + f64::EPSILON, "{quantity}");
        }
    }

    #[test]
    fn test_policy_uses_configured_decimals() {
        let policy = FormatPolicy { quantity_decimals: 2, value_decimals: 1 };
        assert_eq!(policy.quantity(1234.567), "1,234.57");
        assert_eq!(policy.value(1234.56), "1,234.6");
        assert_eq!(FormatPolicy::default().value(1234.56), "1,235");
    }
}
