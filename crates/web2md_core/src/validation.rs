use url::Url;

/// Rejection reasons for user-supplied URLs.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("URL cannot be empty")]
    Empty,
    #[error("Invalid URL format")]
    InvalidFormat,
    #[error("Only HTTP and HTTPS protocols are allowed")]
    UnsupportedProtocol { scheme: String },
}

/// Normalize a user-supplied URL and allow only `http`/`https`.
///
/// A missing `scheme://` prefix defaults to `https://`. The returned string is the
/// parser's canonical form (lowercase host, trailing slash on empty paths), so it
/// is not necessarily byte-identical to the input.
pub fn validate_url(input: &str) -> Result<String, ValidationError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::Empty);
    }

    let candidate = if has_scheme_prefix(trimmed) {
        trimmed.to_string()
    } else {
        format!("https://{trimmed}")
    };

    let parsed = Url::parse(&candidate).map_err(|_| ValidationError::InvalidFormat)?;
    match parsed.scheme() {
        "http" | "https" => Ok(parsed.into()),
        other => Err(ValidationError::UnsupportedProtocol {
            scheme: other.to_string(),
        }),
    }
}

/// Matches `^[a-zA-Z][a-zA-Z0-9+.-]*://`.
fn has_scheme_prefix(input: &str) -> bool {
    let Some((scheme, _)) = input.split_once("://") else {
        return false;
    };
    let mut chars = scheme.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '.' | '-'))
}
