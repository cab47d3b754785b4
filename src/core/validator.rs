use regex::Regex;
use std::sync::OnceLock;

pub const FIRST_NAME_ERROR: &str = "First name must be at least 2 characters.";
pub const EMAIL_ERROR: &str = "A valid email address is required.";
pub const MESSAGE_TOO_SHORT_ERROR: &str = "Message must be at least 10 characters.";
pub const MESSAGE_TOO_LONG_ERROR: &str = "Message must not exceed 5,000 characters.";

const MIN_FIRST_NAME_CHARS: usize = 2;
const MIN_MESSAGE_CHARS: usize = 10;
const MAX_MESSAGE_CHARS: usize = 5000;

fn email_pattern() -> &'static Regex {
    static EMAIL_RE: OnceLock<Regex> = OnceLock::new();
    // local@domain.tld, no whitespace or '@' in either part, tld >= 2 chars
    EMAIL_RE.get_or_init(|| {
        Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]{2,}$").expect("email pattern compiles")
    })
}

pub fn is_valid_email(email: &str) -> bool {
    let email = email.trim();
    !email.is_empty() && email_pattern().is_match(email)
}

/// Checks the three required form fields. Every rule runs, so the result lists
/// all problems at once in a fixed order; an empty result means valid.
pub fn validate(first_name: &str, email: &str, message: &str) -> Vec<String> {
    let mut errors = Vec::new();

    if first_name.trim().chars().count() < MIN_FIRST_NAME_CHARS {
        errors.push(FIRST_NAME_ERROR.to_string());
    }

    if !is_valid_email(email) {
        errors.push(EMAIL_ERROR.to_string());
    }

    let message_chars = message.trim().chars().count();
    if message_chars < MIN_MESSAGE_CHARS {
        errors.push(MESSAGE_TOO_SHORT_ERROR.to_string());
    }
    if message_chars > MAX_MESSAGE_CHARS {
        errors.push(MESSAGE_TOO_LONG_ERROR.to_string());
    }

    errors
}

#[cfg(test)]
mod tests {
    use super::*;

    const GOOD_MESSAGE: &str = "Hello, I am interested in your platform.";

    #[test]
    fn test_valid_submission_has_no_errors() {
        assert!(validate("Jane", "jane@example.com", GOOD_MESSAGE).is_empty());
    }

    #[test]
    fn test_first_name_is_trimmed_before_length_check() {
        assert_eq!(
            validate(" J ", "jane@example.com", GOOD_MESSAGE),
            vec![FIRST_NAME_ERROR]
        );
        assert_eq!(validate("", "jane@example.com", GOOD_MESSAGE), vec![FIRST_NAME_ERROR]);
        assert!(validate("Jo", "jane@example.com", GOOD_MESSAGE).is_empty());
    }

    #[test]
    fn test_email_pattern() {
        assert!(is_valid_email("a@b.co"));
        assert!(is_valid_email("  jane.doe+web@farm.example.org "));
        assert!(!is_valid_email("a@b"));
        assert!(!is_valid_email("a@@b.co"));
        assert!(!is_valid_email("ab.co"));
        assert!(!is_valid_email(""));
        assert!(!is_valid_email("a b@c.co"));
        assert!(!is_valid_email("a@b.c"));
    }

    #[test]
    fn test_message_length_boundaries() {
        let at_min = "a".repeat(10);
        let below_min = "a".repeat(9);
        let at_max = "a".repeat(5000);
        let above_max = "a".repeat(5001);

        assert!(validate("Jane", "jane@example.com", &at_min).is_empty());
        assert_eq!(
            validate("Jane", "jane@example.com", &below_min),
            vec![MESSAGE_TOO_SHORT_ERROR]
        );
        assert!(validate("Jane", "jane@example.com", &at_max).is_empty());
        assert_eq!(
            validate("Jane", "jane@example.com", &above_max),
            vec![MESSAGE_TOO_LONG_ERROR]
        );
    }

    #[test]
    fn test_message_is_trimmed_before_length_check() {
        let padded = format!("   {}   ", "a".repeat(9));
        assert_eq!(
            validate("Jane", "jane@example.com", &padded),
            vec![MESSAGE_TOO_SHORT_ERROR]
        );
    }

    #[test]
    fn test_all_errors_reported_in_order() {
        assert_eq!(
            validate("J", "not-an-email", "short"),
            vec![FIRST_NAME_ERROR, EMAIL_ERROR, MESSAGE_TOO_SHORT_ERROR]
        );
    }
}
