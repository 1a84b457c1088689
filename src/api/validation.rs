use super::ApiError;

const MIN_PASSWORD_LEN: usize = 6;
const MIN_CONTENT_LEN: usize = 10;

pub fn validate_id(resource: &str, id: i32) -> Result<i32, ApiError> {
    if id <= 0 {
        return Err(ApiError::validation(format!(
            "Invalid {resource} ID: {id}. ID must be a positive integer"
        )));
    }
    Ok(id)
}

pub fn validate_name(name: &str) -> Result<&str, ApiError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(ApiError::validation("Name is required"));
    }
    Ok(trimmed)
}

pub fn validate_email(email: &str) -> Result<&str, ApiError> {
    let trimmed = email.trim();
    if trimmed.is_empty() {
        return Err(ApiError::validation("Email is required"));
    }

    match trimmed.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() => Ok(trimmed),
        _ => Err(ApiError::validation("Email must be a valid email address")),
    }
}

pub fn validate_password(password: &str) -> Result<&str, ApiError> {
    if password.is_empty() {
        return Err(ApiError::validation("Password is required"));
    }
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ApiError::validation(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    Ok(password)
}

pub fn validate_title(title: &str) -> Result<&str, ApiError> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        return Err(ApiError::validation("Title is required"));
    }
    Ok(trimmed)
}

pub fn validate_content(content: &str) -> Result<&str, ApiError> {
    if content.trim().is_empty() {
        return Err(ApiError::validation("Content is required"));
    }
    if content.chars().count() < MIN_CONTENT_LEN {
        return Err(ApiError::validation(format!(
            "Content must be at least {MIN_CONTENT_LEN} characters"
        )));
    }
    Ok(content)
}

/// Applies `validate` to a patch field only when it was provided.
pub fn validate_optional<'a>(
    value: Option<&'a str>,
    validate: impl Fn(&'a str) -> Result<&'a str, ApiError>,
) -> Result<Option<String>, ApiError> {
    value.map(|v| validate(v).map(str::to_string)).transpose()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_id() {
        assert!(validate_id("article", 1).is_ok());
        assert!(validate_id("article", 0).is_err());
        assert!(validate_id("user", -3).is_err());
    }

    #[test]
    fn test_validate_email() {
        assert_eq!(validate_email("  a@x.com ").unwrap(), "a@x.com");
        assert!(validate_email("").is_err());
        assert!(validate_email("no-at-sign").is_err());
        assert!(validate_email("@x.com").is_err());
        assert!(validate_email("a@").is_err());
    }

    #[test]
    fn test_validate_password() {
        assert!(validate_password("123456").is_ok());
        assert!(validate_password("12345").is_err());
        assert!(validate_password("").is_err());
    }

    #[test]
    fn test_validate_article_fields() {
        assert!(validate_title("Hello").is_ok());
        assert!(validate_title("   ").is_err());
        assert!(validate_content("ten chars!").is_ok());
        assert!(validate_content("too short").is_err());
        assert!(validate_content("          ").is_err());
    }

    #[test]
    fn test_validate_optional_skips_absent_fields() {
        assert_eq!(validate_optional(None, validate_title).unwrap(), None);
        assert_eq!(
            validate_optional(Some(" New "), validate_title).unwrap(),
            Some("New".to_string())
        );
        assert!(validate_optional(Some(""), validate_title).is_err());
    }
}
