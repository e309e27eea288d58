//! Input checks shared by registration and account updates.

use crate::error::ApiError;

pub const MIN_PASSWORD_LEN: usize = 6;

pub fn validate_name(name: &str) -> Result<(), ApiError> {
    if name.trim().is_empty() {
        return Err(ApiError::Validation("Name is required".to_string()));
    }
    Ok(())
}

/// Loose `local@domain.tld` shape check. Deliverability is not our concern.
pub fn validate_email(email: &str) -> Result<(), ApiError> {
    let invalid = || ApiError::Validation("A valid email address is required".to_string());

    if email.is_empty() || email.chars().any(char::is_whitespace) {
        return Err(invalid());
    }
    let (local, domain) = email.split_once('@').ok_or_else(invalid)?;
    if local.is_empty() || domain.contains('@') {
        return Err(invalid());
    }
    let (host, tld) = domain.rsplit_once('.').ok_or_else(invalid)?;
    if host.is_empty() || tld.is_empty() {
        return Err(invalid());
    }
    Ok(())
}

pub fn validate_password(password: &str) -> Result<(), ApiError> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ApiError::Validation(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }
    Ok(())
}
