use super::ApiError;

pub fn validate_document_id(id: i32) -> Result<i32, ApiError> {
    if id <= 0 {
        return Err(ApiError::validation(format!(
            "Invalid document ID: {}. ID must be a positive integer",
            id
        )));
    }
    Ok(id)
}

pub fn validate_document_title(title: &str) -> Result<&str, ApiError> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        return Err(ApiError::validation("Document title cannot be empty"));
    }

    if trimmed.chars().count() > 200 {
        return Err(ApiError::validation(
            "Document title must be 200 characters or less",
        ));
    }

    Ok(trimmed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_document_id() {
        assert!(validate_document_id(1).is_ok());
        assert!(validate_document_id(0).is_err());
        assert!(validate_document_id(-7).is_err());
    }

    #[test]
    fn test_validate_document_title() {
        assert_eq!(validate_document_title("  Press kit ").unwrap(), "Press kit");
        assert!(validate_document_title("   ").is_err());
        assert!(validate_document_title(&"x".repeat(201)).is_err());
        assert!(validate_document_title(&"x".repeat(200)).is_ok());
    }
}
