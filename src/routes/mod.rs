pub(crate) mod companies;
pub(crate) mod forecast;
pub(crate) mod health;

use crate::errors::AppError;

/// Trim and upper-case a ticker, rejecting anything that isn't ticker-shaped
pub(crate) fn normalize_symbol(raw: &str) -> Result<String, AppError> {
    let symbol = raw.trim().to_ascii_uppercase();
    if symbol.is_empty() {
        return Err(AppError::Validation("Please enter a ticker symbol".to_string()));
    }
    if symbol.len() > 15
        || !symbol.chars().any(|c| c.is_ascii_alphanumeric())
        || !symbol
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '^'))
    {
        return Err(AppError::Validation(format!("Invalid ticker symbol '{}'", raw)));
    }
    Ok(symbol)
}

/// Comma-separated symbol list; blanks and invalid entries are dropped
pub(crate) fn parse_symbol_list(raw: Option<&str>) -> Vec<String> {
    raw.unwrap_or_default()
        .split(',')
        .filter_map(|s| normalize_symbol(s).ok())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_symbol() {
        assert_eq!(normalize_symbol("  aapl ").unwrap(), "AAPL");
        assert_eq!(normalize_symbol("brk.b").unwrap(), "BRK.B");
        assert!(normalize_symbol("   ").is_err());
        assert!(normalize_symbol("AAPL/../x").is_err());
        assert_eq!(normalize_symbol("^gspc").unwrap(), "^GSPC");
    }

    #[test]
    fn test_symbol_needs_a_letter_or_digit() {
        for raw in [".", "..", "-", "^.-"] {
            assert!(normalize_symbol(raw).is_err(), "{}", raw);
        }
        assert!(parse_symbol_list(Some("..,msft")) == vec!["MSFT"]);
    }

    #[test]
    fn test_parse_symbol_list() {
        assert_eq!(parse_symbol_list(Some("msft, ,googl")), vec!["MSFT", "GOOGL"]);
        assert!(parse_symbol_list(None).is_empty());
    }
}
