//! Phone number normalization, formatting and validation
//!
//! Lead records hold whatever the user typed (`098765 43210`, `+91-98765-43210`)
//! while the call provider returns E.164. Matching compares the trailing
//! subscriber digits only; formatting and validation run at data-entry time.

use serde::{Deserialize, Serialize};

/// Subscriber number length for the deployment's numbering plan
pub const SUBSCRIBER_DIGITS: usize = 10;

/// Country calling code prepended by [`format`]
pub const COUNTRY_CODE: &str = "91";

/// Result of [`validate_indian_mobile`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhoneValidation {
    pub is_valid: bool,
    pub message: String,
}

impl PhoneValidation {
    fn valid() -> Self {
        Self {
            is_valid: true,
            message: "Valid phone number".to_string(),
        }
    }

    fn invalid(message: &str) -> Self {
        Self {
            is_valid: false,
            message: message.to_string(),
        }
    }
}

/// Reduce a phone number to its comparable suffix
///
/// Drops every non-digit, then keeps the last [`SUBSCRIBER_DIGITS`] digits.
/// Country code and trunk prefix fall away, so `+91 98765-43210`,
/// `09876543210` and `919876543210` all become `9876543210`. Shorter inputs
/// come back as their bare digits.
pub fn normalize(phone: &str) -> String {
    let digits: Vec<char> = phone.chars().filter(char::is_ascii_digit).collect();
    let start = digits.len().saturating_sub(SUBSCRIBER_DIGITS);
    digits[start..].iter().collect()
}

/// Best-effort conversion of user input to `+<digits>` form
///
/// Never rejects; pair with [`validate_indian_mobile`]. Input without a
/// single digit (`""`, `"+"`) formats to `""` so it reads as missing.
pub fn format(raw: &str) -> String {
    let trimmed = raw.trim();
    let has_plus = trimmed.starts_with('+');
    let digits: String = trimmed.chars().filter(char::is_ascii_digit).collect();

    if digits.is_empty() {
        return String::new();
    }

    if !has_plus {
        if digits.len() == SUBSCRIBER_DIGITS && starts_with_mobile_digit(&digits) {
            return format!("+{}{}", COUNTRY_CODE, digits);
        }
        if digits.len() == SUBSCRIBER_DIGITS + COUNTRY_CODE.len()
            && digits.starts_with(COUNTRY_CODE)
            && starts_with_mobile_digit(&digits[COUNTRY_CODE.len()..])
        {
            return format!("+{}", digits);
        }
    }

    format!("+{}", digits)
}

/// Strict allow-list check for `+91` followed by a 10-digit mobile number
/// starting with 6, 7, 8 or 9
pub fn validate_indian_mobile(phone: &str) -> PhoneValidation {
    let phone = phone.trim();
    if phone.is_empty() {
        return PhoneValidation::invalid("Phone number is required");
    }

    let Some(subscriber) = phone.strip_prefix("+91") else {
        return PhoneValidation::invalid("Phone number must start with +91 country code");
    };

    if subscriber.len() != SUBSCRIBER_DIGITS || !subscriber.chars().all(|c| c.is_ascii_digit()) {
        return PhoneValidation::invalid("Phone number must have exactly 10 digits after +91");
    }

    if !starts_with_mobile_digit(subscriber) {
        return PhoneValidation::invalid("Mobile number must start with 6, 7, 8, or 9");
    }

    PhoneValidation::valid()
}

fn starts_with_mobile_digit(digits: &str) -> bool {
    matches!(digits.chars().next(), Some('6'..='9'))
}
