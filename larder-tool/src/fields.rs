//! Parsing of user-entered item fields, shared by the CLI and the dashboard.

use std::str::FromStr;

use rust_decimal::Decimal;

pub fn parse_name(input: &str) -> Result<String, String> {
    let name = input.trim();
    if name.is_empty() {
        return Err("Name is required".to_string());
    }
    Ok(name.to_string())
}

pub fn parse_quantity(input: &str) -> Result<u32, String> {
    let input = input.trim();
    if input.is_empty() {
        return Err("Quantity is required".to_string());
    }
    input
        .parse::<u32>()
        .map_err(|_| format!("Quantity must be a non-negative whole number, got '{}'", input))
}

pub fn parse_price(input: &str) -> Result<Decimal, String> {
    let input = input.trim();
    let price = Decimal::from_str(input).map_err(|_| format!("'{}' is not a valid price", input))?;
    if price.is_sign_negative() && !price.is_zero() {
        return Err("Price cannot be negative".to_string());
    }
    Ok(price)
}

/// Blank input means "not set".
pub fn optional<T>(
    input: &str,
    parse: impl Fn(&str) -> Result<T, String>,
) -> Result<Option<T>, String> {
    if input.trim().is_empty() {
        return Ok(None);
    }
    parse(input).map(Some)
}

pub fn optional_text(input: &str) -> Option<String> {
    let text = input.trim();
    (!text.is_empty()).then(|| text.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quantity() {
        assert_eq!(parse_quantity(" 50 "), Ok(50));
        assert_eq!(parse_quantity("0"), Ok(0));
        assert!(parse_quantity("-1").is_err());
        assert!(parse_quantity("1.5").is_err());
        assert!(parse_quantity("").is_err());
    }

    #[test]
    fn test_price() {
        assert_eq!(parse_price("120.5"), Ok(Decimal::new(1205, 1)));
        assert_eq!(parse_price("0"), Ok(Decimal::ZERO));
        assert_eq!(
            parse_price("-2").unwrap_err(),
            "Price cannot be negative"
        );
        assert!(parse_price("cheap").is_err());
    }

    #[test]
    fn test_optional_fields() {
        assert_eq!(optional("", parse_price), Ok(None));
        assert_eq!(optional("3.25", parse_price), Ok(Some(Decimal::new(325, 2))));
        assert!(optional("x", parse_price).is_err());
        assert_eq!(optional_text("  "), None);
        assert_eq!(optional_text(" kg "), Some("kg".to_string()));
    }

    #[test]
    fn test_name() {
        assert_eq!(parse_name("  Chicken "), Ok("Chicken".to_string()));
        assert!(parse_name("   ").is_err());
    }
}
