//! Request body checks applied before the account service is called.

pub const MIN_PASSWORD_LEN: usize = 8;

pub fn validate_name(name: &str) -> Result<(), String> {
    if name.trim().is_empty() {
        return Err("name must not be empty".to_string());
    }
    Ok(())
}

/// Accepts `local@domain.tld` with no whitespace and a dotted domain.
pub fn validate_email(email: &str) -> Result<(), String> {
    let invalid = || Err(format!("`{}` is not a valid email address", email));

    if email.is_empty() || email.chars().any(char::is_whitespace) {
        return invalid();
    }
    let Some((local, domain)) = email.split_once('@') else {
        return invalid();
    };
    if local.is_empty() || domain.contains('@') {
        return invalid();
    }
    let labels: Vec<&str> = domain.split('.').collect();
    if labels.len() < 2 || labels.iter().any(|label| label.is_empty()) {
        return invalid();
    }
    Ok(())
}

/// At least eight characters with a lowercase letter, an uppercase letter,
/// a digit and a symbol.
pub fn validate_strong_password(password: &str) -> Result<(), String> {
    let mut missing = Vec::new();
    if password.chars().count() < MIN_PASSWORD_LEN {
        missing.push(format!("at least {} characters", MIN_PASSWORD_LEN));
    }
    if !password.chars().any(|c| c.is_lowercase()) {
        missing.push("a lowercase letter".to_string());
    }
    if !password.chars().any(|c| c.is_uppercase()) {
        missing.push("an uppercase letter".to_string());
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        missing.push("a digit".to_string());
    }
    if !password
        .chars()
        .any(|c| !c.is_alphanumeric() && !c.is_whitespace())
    {
        missing.push("a symbol".to_string());
    }

    if missing.is_empty() {
        Ok(())
    } else {
        Err(format!("password is not strong enough: needs {}", missing.join(", ")))
    }
}

pub fn validate_present(field: &str, value: &str) -> Result<(), String> {
    if value.is_empty() {
        return Err(format!("{} must not be empty", field));
    }
    Ok(())
}
