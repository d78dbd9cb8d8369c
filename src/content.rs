use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContentError {
    #[error("content is empty")]
    Empty,

    #[error("content exceeds {max} characters")]
    TooLong { max: usize },
}

impl ContentError {
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Empty => "empty_content",
            Self::TooLong { .. } => "content_too_long",
        }
    }
}

/// Trims `content` and checks it against `max` characters.
pub fn normalize(content: &str, max: usize) -> Result<String, ContentError> {
    let content = content.trim();
    if content.is_empty() {
        return Err(ContentError::Empty);
    }
    if content.chars().count() > max {
        return Err(ContentError::TooLong { max });
    }
    Ok(content.to_owned())
}
