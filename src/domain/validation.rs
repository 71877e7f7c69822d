/// Input that failed validation at the API boundary.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// A required field is missing or blank.
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    /// A list that must have at least one entry is empty.
    #[error("At least one value is required for {0}")]
    EmptyList(&'static str),

    /// A value is present but malformed.
    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },

    /// A field exceeds its maximum length.
    #[error("{field} exceeds the maximum length of {max} characters")]
    TooLong { field: &'static str, max: usize },
}

impl ValidationError {
    pub fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            field,
            reason: reason.into(),
        }
    }
}

/// Trim a required text field, rejecting blanks and overlong values.
pub fn required_text(
    field: &'static str,
    value: &str,
    max: usize,
) -> Result<String, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::MissingField(field));
    }
    if trimmed.chars().count() > max {
        return Err(ValidationError::TooLong { field, max });
    }
    Ok(trimmed.to_string())
}

/// Trim an optional text field. Blank becomes `None`.
pub fn optional_text(
    field: &'static str,
    value: Option<&str>,
    max: usize,
) -> Result<Option<String>, ValidationError> {
    match value.map(str::trim) {
        None | Some("") => Ok(None),
        Some(v) if v.chars().count() > max => Err(ValidationError::TooLong { field, max }),
        Some(v) => Ok(Some(v.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_required_text() {
        assert_eq!(required_text("name", "  Asha ", 10).unwrap(), "Asha");
        assert_eq!(
            required_text("name", "   ", 10),
            Err(ValidationError::MissingField("name"))
        );
        assert_eq!(
            required_text("name", "abcdefghijk", 10),
            Err(ValidationError::TooLong {
                field: "name",
                max: 10
            })
        );
    }

    #[test]
    fn test_optional_text() {
        assert_eq!(optional_text("company", Some(" "), 10).unwrap(), None);
        assert_eq!(optional_text("company", None, 10).unwrap(), None);
        assert_eq!(
            optional_text("company", Some("Acme"), 10).unwrap(),
            Some("Acme".to_string())
        );
    }

    #[test]
    fn test_error_messages() {
        let err = ValidationError::invalid("email", "must contain '@'");
        assert_eq!(err.to_string(), "Invalid value for email: must contain '@'");
        assert_eq!(
            ValidationError::EmptyList("categoriesNeeded").to_string(),
            "At least one value is required for categoriesNeeded"
        );
    }
}
