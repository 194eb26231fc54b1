//! # Validation Module
//!
//! Field-level validation rules per entity, executed before any persistence
//! call. Each validator trims its input and returns the normalized value on
//! success, so handlers store exactly what was validated.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Serde (deserialization)                                      │
//! │  └── Type errors (string vs number) rejected before handlers run       │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE                                                  │
//! │  └── Format, required-ness, length bounds per entity field             │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database                                                     │
//! │  └── NOT NULL, UNIQUE(users.email), foreign keys                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use crate::error::ValidationError;
use crate::NA_PLACEHOLDER;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// Customer Fields
// =============================================================================

/// Customer name: required, non-empty after trimming, at most 200 chars.
pub fn validate_customer_name(name: &str) -> ValidationResult<String> {
    required_text("Customer name", name, 200)
}

/// Customer contact: exactly 10 ASCII digits (a phone number).
pub fn validate_customer_contact(contact: &str) -> ValidationResult<String> {
    let contact = contact.trim();

    if contact.is_empty() {
        return Err(ValidationError::Required {
            field: "Customer contact".to_string(),
        });
    }

    if contact.len() != 10 || !contact.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ValidationError::InvalidFormat {
            field: "Customer contact".to_string(),
            reason: "Customer contact must be a 10-digit number".to_string(),
        });
    }

    Ok(contact.to_string())
}

/// Optional email: blank or "NA" collapses to the placeholder, anything else
/// must look like an address.
pub fn validate_optional_email(field: &str, email: &str) -> ValidationResult<String> {
    let email = email.trim();

    if email.is_empty() || email == NA_PLACEHOLDER {
        return Ok(NA_PLACEHOLDER.to_string());
    }

    validate_email(field, email)
}

/// Optional free text (address, description): blank collapses to "NA".
pub fn normalize_optional_text(text: &str) -> String {
    let text = text.trim();
    if text.is_empty() {
        NA_PLACEHOLDER.to_string()
    } else {
        text.to_string()
    }
}

// =============================================================================
// Product Fields
// =============================================================================

/// Product name: required, non-empty after trimming, at most 200 chars.
pub fn validate_product_name(name: &str) -> ValidationResult<String> {
    required_text("Product name", name, 200)
}

/// Catalog price: zero allowed (unpriced placeholder), negatives are not.
pub fn validate_product_price_cents(cents: i64) -> ValidationResult<i64> {
    if cents < 0 {
        return Err(ValidationError::Negative {
            field: "Product price".to_string(),
        });
    }
    Ok(cents)
}

// =============================================================================
// User Fields
// =============================================================================

/// Username: 3-50 characters.
pub fn validate_username(username: &str) -> ValidationResult<String> {
    let username = username.trim();

    if username.is_empty() {
        return Err(ValidationError::Required {
            field: "Username".to_string(),
        });
    }
    if username.len() < 3 {
        return Err(ValidationError::TooShort {
            field: "Username".to_string(),
            min: 3,
        });
    }
    if username.len() > 50 {
        return Err(ValidationError::TooLong {
            field: "Username".to_string(),
            max: 50,
        });
    }

    Ok(username.to_string())
}

/// User email: required and well-formed; stored lowercased so logins are
/// case-insensitive.
pub fn validate_user_email(email: &str) -> ValidationResult<String> {
    let email = validate_email("Email", email.trim())?;
    Ok(email.to_lowercase())
}

/// Password: 3-20 characters (bounds inherited from the admin UI contract).
pub fn validate_password(password: &str) -> ValidationResult<String> {
    let password = password.trim();

    if password.is_empty() {
        return Err(ValidationError::Required {
            field: "Password".to_string(),
        });
    }
    if password.len() < 3 {
        return Err(ValidationError::TooShort {
            field: "Password".to_string(),
            min: 3,
        });
    }
    if password.len() > 20 {
        return Err(ValidationError::TooLong {
            field: "Password".to_string(),
            max: 20,
        });
    }

    Ok(password.to_string())
}

// =============================================================================
// Shared Helpers
// =============================================================================

fn required_text(field: &str, value: &str, max: usize) -> ValidationResult<String> {
    let value = value.trim();

    if value.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }
    if value.len() > max {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max,
        });
    }

    Ok(value.to_string())
}

/// Minimal structural email check: one '@' with non-empty local part and a
/// dotted domain, no whitespace. Deliverability is the mail server's problem.
fn validate_email(field: &str, email: &str) -> ValidationResult<String> {
    let well_formed = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !email.contains(char::is_whitespace)
        }
        None => false,
    };

    if !well_formed {
        return Err(ValidationError::InvalidFormat {
            field: field.to_string(),
            reason: "Invalid email format".to_string(),
        });
    }

    Ok(email.to_string())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_customer_contact() {
        assert_eq!(
            validate_customer_contact("0301234567").unwrap(),
            "0301234567"
        );
        assert_eq!(
            validate_customer_contact(" 0301234567 ").unwrap(),
            "0301234567"
        );

        assert!(validate_customer_contact("").is_err());
        assert!(validate_customer_contact("12345").is_err());
        assert!(validate_customer_contact("03012345678").is_err());
        assert!(validate_customer_contact("03O1234567").is_err()); // letter O
    }

    #[test]
    fn test_validate_customer_name() {
        assert_eq!(validate_customer_name("  Ali Traders ").unwrap(), "Ali Traders");
        assert!(validate_customer_name("").is_err());
        assert!(validate_customer_name("   ").is_err());
        assert!(validate_customer_name(&"A".repeat(300)).is_err());
    }

    #[test]
    fn test_optional_email_collapses_to_placeholder() {
        assert_eq!(validate_optional_email("Email", "").unwrap(), "NA");
        assert_eq!(validate_optional_email("Email", "  ").unwrap(), "NA");
        assert_eq!(validate_optional_email("Email", "NA").unwrap(), "NA");
        assert_eq!(
            validate_optional_email("Email", "a@b.com").unwrap(),
            "a@b.com"
        );
        assert!(validate_optional_email("Email", "not-an-email").is_err());
    }

    #[test]
    fn test_normalize_optional_text() {
        assert_eq!(normalize_optional_text(""), "NA");
        assert_eq!(normalize_optional_text("  Lahore  "), "Lahore");
    }

    #[test]
    fn test_validate_user_email_lowercases() {
        assert_eq!(
            validate_user_email("Admin@Example.COM").unwrap(),
            "admin@example.com"
        );
        assert!(validate_user_email("admin@nodomain").is_err());
        assert!(validate_user_email("has space@x.com").is_err());
        assert!(validate_user_email("").is_err());
    }

    #[test]
    fn test_validate_username_bounds() {
        assert!(validate_username("ab").is_err());
        assert!(validate_username("abc").is_ok());
        assert!(validate_username(&"a".repeat(50)).is_ok());
        assert!(validate_username(&"a".repeat(51)).is_err());
    }

    #[test]
    fn test_validate_password_bounds() {
        assert!(validate_password("ab").is_err());
        assert!(validate_password("abc").is_ok());
        assert!(validate_password(&"p".repeat(20)).is_ok());
        assert!(validate_password(&"p".repeat(21)).is_err());
    }

    #[test]
    fn test_validate_product_price() {
        assert_eq!(validate_product_price_cents(0).unwrap(), 0);
        assert_eq!(validate_product_price_cents(1099).unwrap(), 1099);
        assert!(validate_product_price_cents(-1).is_err());
    }
}
