use std::fmt;

/// Money is represented as integer cents so sums stay exact.
/// 1 unit = 100 cents, so $10.00 = 1000 cents.
pub type Cents = i64;

/// Format cents as a plain decimal string.
/// Example: 1000 -> "10.00", -1234 -> "-12.34"
pub fn format_cents(cents: Cents) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let abs_cents = cents.abs();
    let units = abs_cents / 100;
    let remainder = abs_cents % 100;
    format!("{}{}.{:02}", sign, units, remainder)
}

/// Format cents as a dollar amount for display.
/// Example: 1000 -> "$10.00", -500 -> "-$5.00"
pub fn format_dollars(cents: Cents) -> String {
    if cents < 0 {
        format!("-${}", format_cents(-cents))
    } else {
        format!("${}", format_cents(cents))
    }
}

/// Parse a decimal string into cents.
/// Example: "10.00" -> 1000, "12.5" -> 1250, "100" -> 10000
pub fn parse_cents(input: &str) -> Result<Cents, ParseCentsError> {
    let input = input.trim();
    let negative = input.starts_with('-');
    let input = input.strip_prefix('-').unwrap_or(input);

    if input.is_empty() {
        return Err(ParseCentsError::InvalidFormat);
    }

    let (units_str, decimal_str) = match input.split_once('.') {
        Some((units, decimals)) => (units, decimals),
        None => (input, ""),
    };

    if !units_str.chars().all(|c| c.is_ascii_digit())
        || !decimal_str.chars().all(|c| c.is_ascii_digit())
        || (units_str.is_empty() && decimal_str.is_empty())
    {
        return Err(ParseCentsError::InvalidFormat);
    }

    let units: i64 = if units_str.is_empty() {
        0
    } else {
        units_str
            .parse()
            .map_err(|_| ParseCentsError::OutOfRange)?
    };

    // Anything past the second decimal place is truncated
    let decimal_cents: i64 = match decimal_str.len() {
        0 => 0,
        1 => decimal_str.parse::<i64>().map_err(|_| ParseCentsError::InvalidFormat)? * 10,
        _ => decimal_str[..2]
            .parse()
            .map_err(|_| ParseCentsError::InvalidFormat)?,
    };

    let cents = units
        .checked_mul(100)
        .and_then(|c| c.checked_add(decimal_cents))
        .ok_or(ParseCentsError::OutOfRange)?;

    Ok(if negative { -cents } else { cents })
}

/// Parse a transaction amount: like [`parse_cents`] but negative values are refused.
pub fn parse_amount(input: &str) -> Result<Cents, ParseCentsError> {
    let cents = parse_cents(input)?;
    if cents < 0 {
        return Err(ParseCentsError::Negative);
    }
    Ok(cents)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseCentsError {
    InvalidFormat,
    OutOfRange,
    Negative,
}

impl fmt::Display for ParseCentsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseCentsError::InvalidFormat => write!(f, "invalid money format"),
            ParseCentsError::OutOfRange => write!(f, "amount is too large"),
            ParseCentsError::Negative => write!(f, "amount must not be negative"),
        }
    }
}

impl std::error::Error for ParseCentsError {}

/// Serde adapter writing cents as a two-decimal string ("10.00").
pub mod cents_as_decimal {
    use serde::{Deserialize, Deserializer, Serializer, de::Error};

    use super::{Cents, format_cents, parse_amount};

    pub fn serialize<S: Serializer>(cents: &Cents, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format_cents(*cents))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Cents, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse_amount(&raw).map_err(|e| D::Error::custom(format!("amount '{}': {}", raw, e)))
    }
}
