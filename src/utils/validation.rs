// Validation utilities for string fields and Brazilian documents

use lazy_static::lazy_static;
use regex::Regex;
use validator::ValidationError;

lazy_static! {
    /// Accepts "8-12", "10", "12,10,8", "AMRAP", "30s"
    pub static ref REPS_PATTERN: Regex =
        Regex::new(r"^(?i:amrap|\d{1,3}(s|-\d{1,3}|(,\d{1,3})*))$").unwrap();
    static ref PHONE_PATTERN: Regex = Regex::new(r"^[0-9 ()+\-]{8,30}$").unwrap();
}

/// Trim and validate string fields
///
/// # Returns
/// * `Ok(String)` - The trimmed string if valid
/// * `Err(String)` - Error message if a required field is blank
pub fn trim_and_validate_field(field: &str, required: bool) -> Result<String, String> {
    let trimmed = field.trim().to_string();
    if trimmed.is_empty() && required {
        Err("Field cannot be empty".to_string())
    } else {
        Ok(trimmed)
    }
}

/// Trim an optional field, mapping blank values to `None`
pub fn trim_optional_field(field: Option<&String>) -> Option<String> {
    field.and_then(|s| {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}

/// Partial-update form: `None` leaves the column alone, blank clears it
pub fn trim_clearable_field(field: Option<&String>) -> Option<Option<String>> {
    field.map(|value| trim_optional_field(Some(value)))
}

/// Lowercased, trimmed email
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Strip punctuation from a CPF ("123.456.789-09" -> "12345678909")
pub fn normalize_cpf(cpf: &str) -> String {
    cpf.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// Checks the two CPF verification digits
pub fn is_valid_cpf(cpf: &str) -> bool {
    let digits: Vec<u32> = normalize_cpf(cpf)
        .chars()
        .filter_map(|c| c.to_digit(10))
        .collect();

    if digits.len() != 11 || digits.iter().all(|d| *d == digits[0]) {
        return false;
    }

    let check = |len: usize| -> u32 {
        let sum: u32 = digits[..len]
            .iter()
            .enumerate()
            .map(|(i, d)| d * (len as u32 + 1 - i as u32))
            .sum();
        let rest = (sum * 10) % 11;
        if rest == 10 {
            0
        } else {
            rest
        }
    };

    check(9) == digits[9] && check(10) == digits[10]
}

/// `validator` hook for CPF fields
pub fn validate_cpf(cpf: &str) -> Result<(), ValidationError> {
    if is_valid_cpf(cpf) {
        Ok(())
    } else {
        let mut error = ValidationError::new("cpf");
        error.message = Some("CPF must have 11 digits with valid check digits".into());
        Err(error)
    }
}

/// `validator` hook for phone fields
pub fn validate_phone(phone: &str) -> Result<(), ValidationError> {
    if PHONE_PATTERN.is_match(phone.trim()) {
        Ok(())
    } else {
        let mut error = ValidationError::new("phone");
        error.message = Some("Phone may contain only digits, spaces, parentheses, + and -".into());
        Err(error)
    }
}

/// Phone check for partial updates, where a blank value clears the column
pub fn validate_clearable_phone(phone: &str) -> Result<(), ValidationError> {
    if phone.trim().is_empty() {
        return Ok(());
    }
    validate_phone(phone)
}

/// `validator` hook rejecting whitespace-only text
pub fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut error = ValidationError::new("blank");
        error.message = Some("Field cannot be empty".into());
        Err(error)
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clearable_phone() {
        assert!(validate_clearable_phone("").is_ok());
        assert!(validate_clearable_phone("   ").is_ok());
        assert!(validate_clearable_phone("(11) 98765-4321").is_ok());
        assert!(validate_clearable_phone("call me").is_err());
    }

    #[test]
    fn test_trim_clearable_field() {
        assert_eq!(trim_clearable_field(None), None);
        assert_eq!(trim_clearable_field(Some(&"  ".to_string())), Some(None));
        assert_eq!(
            trim_clearable_field(Some(&" força ".to_string())),
            Some(Some("força".to_string()))
        );
    }

    #[test]
    fn test_trim_fields() {
        assert_eq!(trim_and_validate_field("  Ana  ", true).unwrap(), "Ana");
        assert!(trim_and_validate_field("   ", true).is_err());
        assert_eq!(trim_and_validate_field("   ", false).unwrap(), "");
        assert_eq!(trim_optional_field(Some(&"  ".to_string())), None);
        assert_eq!(
            trim_optional_field(Some(&" x ".to_string())),
            Some("x".to_string())
        );
    }

    #[test]
    fn test_normalize_email() {
        assert_eq!(normalize_email("  Maria@Gym.COM "), "maria@gym.com");
    }

    #[test]
    fn test_cpf_validation() {
        assert!(is_valid_cpf("529.982.247-25"));
        assert!(is_valid_cpf("52998224725"));
        assert!(!is_valid_cpf("529.982.247-26"));
        assert!(!is_valid_cpf("111.111.111-11"));
        assert!(!is_valid_cpf("1234"));
        assert_eq!(normalize_cpf("529.982.247-25"), "52998224725");
    }

    #[test]
    fn test_reps_pattern() {
        for ok in ["8-12", "10", "12,10,8", "AMRAP", "30s"] {
            assert!(REPS_PATTERN.is_match(ok), "{ok} should match");
        }
        for bad in ["", "ten", "8--12", "-5"] {
            assert!(!REPS_PATTERN.is_match(bad), "{bad} should not match");
        }
    }

    #[test]
    fn test_phone_validation() {
        assert!(validate_phone("(11) 98765-4321").is_ok());
        assert!(validate_phone("+55 11 987654321").is_ok());
        assert!(validate_phone("call me").is_err());
    }
}
