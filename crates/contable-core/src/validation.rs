//! # Validation Module
//!
//! Checks run before a request leaves the client.
//!
//! ```text
//! Layer 1: Terminal command (THIS MODULE)  ── cheap, no network
//! Layer 2: ERP server                     ── authoritative
//! ```
//!
//! The offline queue does not call into here: whatever the register hands
//! it gets stored. Commands validate before they enqueue.

use crate::error::ValidationError;
use crate::sale::SaleLine;
use crate::{
    MAX_LINE_QUANTITY, MAX_SALE_LINES, MAX_TAX_RATE_BPS, MAX_UNIT_PRICE_CENTS, TOTP_CODE_LENGTH,
};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Validates an email address well enough to start a login.
///
/// ```rust
/// use contable_core::validation::validate_email;
///
/// assert!(validate_email("ana@empresa.mx").is_ok());
/// assert!(validate_email("ana@").is_err());
/// ```
pub fn validate_email(email: &str) -> ValidationResult<()> {
    let email = email.trim();

    if email.is_empty() {
        return Err(ValidationError::required("email"));
    }

    if email.len() > 254 {
        return Err(ValidationError::TooLong {
            field: "email".to_string(),
            max: 254,
        });
    }

    let (local, domain) = email
        .split_once('@')
        .ok_or_else(|| ValidationError::invalid_format("email", "missing '@'"))?;

    if local.is_empty() || domain.is_empty() || !domain.contains('.') || domain.starts_with('.') {
        return Err(ValidationError::invalid_format("email", "not an address"));
    }

    if email.chars().any(char::is_whitespace) {
        return Err(ValidationError::invalid_format("email", "contains whitespace"));
    }

    Ok(())
}

/// Validates a time-based one-time code: exactly six ASCII digits.
///
/// ```rust
/// use contable_core::validation::validate_totp_code;
///
/// assert!(validate_totp_code("042913").is_ok());
/// assert!(validate_totp_code("42913").is_err());
/// assert!(validate_totp_code("04291a").is_err());
/// ```
pub fn validate_totp_code(code: &str) -> ValidationResult<()> {
    let code = code.trim();

    if code.is_empty() {
        return Err(ValidationError::required("code"));
    }

    if code.len() != TOTP_CODE_LENGTH || !code.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ValidationError::invalid_format(
            "code",
            format!("expected {} digits", TOTP_CODE_LENGTH),
        ));
    }

    Ok(())
}

/// Validates the lines of a ticket.
pub fn validate_sale_lines(lines: &[SaleLine]) -> ValidationResult<()> {
    if lines.is_empty() {
        return Err(ValidationError::required("items"));
    }

    if lines.len() > MAX_SALE_LINES {
        return Err(ValidationError::OutOfRange {
            field: "items".to_string(),
            min: 1,
            max: MAX_SALE_LINES as i64,
        });
    }

    for line in lines {
        if line.product_id.trim().is_empty() {
            return Err(ValidationError::required("product_id"));
        }
        if line.quantity <= 0 {
            return Err(ValidationError::MustBePositive {
                field: "quantity".to_string(),
            });
        }
        if line.quantity > MAX_LINE_QUANTITY {
            return Err(ValidationError::OutOfRange {
                field: "quantity".to_string(),
                min: 1,
                max: MAX_LINE_QUANTITY,
            });
        }
        if line.unit_price.is_negative() {
            return Err(ValidationError::MustBePositive {
                field: "unit_price".to_string(),
            });
        }
        if line.unit_price.cents() > MAX_UNIT_PRICE_CENTS {
            return Err(ValidationError::OutOfRange {
                field: "unit_price".to_string(),
                min: 0,
                max: MAX_UNIT_PRICE_CENTS,
            });
        }
    }

    Ok(())
}

pub fn validate_tax_rate(bps: u32) -> ValidationResult<()> {
    if bps > MAX_TAX_RATE_BPS {
        return Err(ValidationError::OutOfRange {
            field: "tax_rate_bps".to_string(),
            min: 0,
            max: i64::from(MAX_TAX_RATE_BPS),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::money::Money;

    #[test]
    fn test_email() {
        assert!(validate_email("  contador@empresa.com.mx ").is_ok());
        assert_eq!(validate_email(""), Err(ValidationError::required("email")));
        assert!(validate_email("no-at-sign").is_err());
        assert!(validate_email("a@localhost").is_err());
        assert!(validate_email("a b@x.com").is_err());
    }

    #[test]
    fn test_totp_code() {
        assert!(validate_totp_code("000000").is_ok());
        assert!(validate_totp_code(" 123456 ").is_ok());
        assert!(validate_totp_code("1234567").is_err());
        assert!(validate_totp_code("12 456").is_err());
        assert!(validate_totp_code("١٢٣٤٥٦").is_err());
    }

    #[test]
    fn test_sale_lines() {
        let ok = SaleLine::new("P-1", "Tea", 1, Money::from_cents(100));
        assert!(validate_sale_lines(&[ok.clone()]).is_ok());
        assert!(validate_sale_lines(&[]).is_err());

        let mut zero_qty = ok.clone();
        zero_qty.quantity = 0;
        assert!(matches!(
            validate_sale_lines(&[zero_qty]),
            Err(ValidationError::MustBePositive { .. })
        ));

        let mut negative = ok.clone();
        negative.unit_price = Money::from_cents(-1);
        assert!(validate_sale_lines(&[negative]).is_err());

        let mut priciest = ok;
        priciest.unit_price = Money::from_cents(MAX_UNIT_PRICE_CENTS);
        assert!(validate_sale_lines(&[priciest.clone()]).is_ok());
        priciest.unit_price = Money::from_cents(MAX_UNIT_PRICE_CENTS + 1);
        assert!(matches!(
            validate_sale_lines(&[priciest]),
            Err(ValidationError::OutOfRange { .. })
        ));
    }

    #[test]
    fn test_tax_rate() {
        assert!(validate_tax_rate(0).is_ok());
        assert!(validate_tax_rate(1600).is_ok());
        assert!(validate_tax_rate(MAX_TAX_RATE_BPS + 1).is_err());
    }
}
