use crate::error::ApiError;

pub const MIN_PASSWORD_CHARS: usize = 6;

pub fn require_filled(fields: &[&str]) -> Result<(), ApiError> {
    if fields.iter().any(|f| f.trim().is_empty()) {
        return Err(ApiError::BadRequest("Please fill in all fields"));
    }
    Ok(())
}

/// Checks a new password against its confirmation, then its length.
pub fn new_password(password: &str, confirm: &str) -> Result<(), ApiError> {
    if password != confirm {
        return Err(ApiError::BadRequest("Passwords don't match"));
    }
    if password.chars().count() < MIN_PASSWORD_CHARS {
        return Err(ApiError::BadRequest("Password must be at least 6 characters"));
    }
    Ok(())
}

/// Trimmed, lowercased address with one `@` and a dotted domain.
pub fn normalize_email(raw: &str) -> Result<String, ApiError> {
    let email = raw.trim().to_lowercase();
    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !email.contains(char::is_whitespace)
        }
        None => false,
    };
    if !valid {
        return Err(ApiError::BadRequest("Invalid email"));
    }
    Ok(email)
}

/// Trimmed entry text, rejecting blanks.
pub fn entry_text(raw: &str) -> Result<&str, ApiError> {
    let text = raw.trim();
    if text.is_empty() {
        return Err(ApiError::BadRequest("Nothing to save"));
    }
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(r: Result<impl std::fmt::Debug, ApiError>) -> String {
        r.unwrap_err().to_string()
    }

    #[test]
    fn blank_fields_are_reported_first() {
        assert_eq!(message(require_filled(&["a@b.co", "  "])), "Please fill in all fields");
        assert!(require_filled(&["a", "b"]).is_ok());
    }

    #[test]
    fn password_rules() {
        assert_eq!(message(new_password("secret1", "secret2")), "Passwords don't match");
        assert_eq!(message(new_password("abc", "abc")), "Password must be at least 6 characters");
        assert!(new_password("abcdef", "abcdef").is_ok());
    }

    #[test]
    fn emails_are_normalized() {
        assert_eq!(normalize_email("  Ana@Example.COM ").unwrap(), "ana@example.com");
        for bad in ["ana", "ana@", "@example.com", "ana@example", "a b@example.com", "a@b@c.com"] {
            assert_eq!(message(normalize_email(bad)), "Invalid email", "{bad}");
        }
    }

    #[test]
    fn entries_must_have_text() {
        assert_eq!(entry_text("  hi \n").unwrap(), "hi");
        assert_eq!(message(entry_text("   ")), "Nothing to save");
    }
}
