/// Validates an email address for sign-in/sign-up forms.
///
/// Returns `Some(email)` (trimmed) if the address is plausible, `None`
/// otherwise. This is a client-side sanity check, not RFC validation; the
/// identity provider has the final say.
pub fn validate_email(email: &str) -> Option<&str> {
    let email = email.trim();
    if email.is_empty() || email.chars().any(|c| c.is_whitespace() || c.is_control()) {
        return None;
    }

    let (local, domain) = email.split_once('@')?;
    if local.is_empty() || domain.is_empty() {
        return None;
    }

    // A second '@' or a dotless domain is never deliverable
    if domain.contains('@') || !domain.contains('.') {
        return None;
    }

    if domain.starts_with('.') || domain.ends_with('.') {
        return None;
    }

    Some(email)
}

/// Minimum accepted password length for new accounts.
pub const MIN_PASSWORD_LEN: usize = 8;

/// Validates a new-account password.
///
/// Returns `Some(password)` if acceptable, `None` otherwise. Only applied at
/// sign-up; sign-in accepts whatever the account was created with.
pub fn validate_password(password: &str) -> Option<&str> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return None;
    }
    if password.chars().any(char::is_control) {
        return None;
    }
    Some(password)
}
