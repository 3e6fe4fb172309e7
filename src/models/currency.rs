//! Currency code handling
//!
//! Codes are stored upper-cased. Besides ISO 4217 codes the app accepts short
//! custom codes (e.g. "BTC", "USDT"), so validation is purely syntactic.

use crate::error::WalletError;

/// Normalize and validate a currency code
pub fn normalize(code: &str) -> Result<String, WalletError> {
    let trimmed = code.trim();
    if !(3..=5).contains(&trimmed.len()) || !trimmed.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(WalletError::Validation(format!(
            "Invalid currency code '{}': expected 3-5 letters or digits",
            code
        )));
    }
    Ok(trimmed.to_ascii_uppercase())
}

/// Normalize an optional currency; empty strings mean "base currency"
pub fn normalize_opt(code: Option<&str>) -> Result<Option<String>, WalletError> {
    match code.map(str::trim) {
        None | Some("") => Ok(None),
        Some(code) => normalize(code).map(Some),
    }
}

/// Resolve an account's currency against the base currency
pub fn effective<'a>(currency: Option<&'a str>, base_currency: &'a str) -> &'a str {
    currency.unwrap_or(base_currency)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize() {
        assert_eq!(normalize("usd").unwrap(), "USD");
        assert_eq!(normalize(" bgn ").unwrap(), "BGN");
        assert_eq!(normalize("usdt").unwrap(), "USDT");
        assert!(normalize("us").is_err());
        assert!(normalize("dollars").is_err());
        assert!(normalize("U$D").is_err());
    }

    #[test]
    fn test_normalize_opt() {
        assert_eq!(normalize_opt(None).unwrap(), None);
        assert_eq!(normalize_opt(Some("  ")).unwrap(), None);
        assert_eq!(normalize_opt(Some("eur")).unwrap(), Some("EUR".to_string()));
    }

    #[test]
    fn test_effective() {
        assert_eq!(effective(None, "USD"), "USD");
        assert_eq!(effective(Some("EUR"), "USD"), "EUR");
    }
}
