use pretty_assertions::assert_eq;
use web2md_core::{validate_url, ValidationError};

#[test]
fn missing_scheme_defaults_to_https() {
    for input in ["example.com", "  example.com/path  ", "sub.example.org?q=1"] {
        let url = validate_url(input).unwrap();
        assert!(url.starts_with("https://"), "unexpected: {url}");
    }
}

#[test]
fn result_is_canonical_serialization() {
    assert_eq!(validate_url("HTTP://Example.COM").unwrap(), "http://example.com/");
    assert_eq!(
        validate_url("example.com/a b").unwrap(),
        "https://example.com/a%20b"
    );
}

#[test]
fn rejections_are_distinct() {
    assert_eq!(validate_url(""), Err(ValidationError::Empty));
    assert_eq!(validate_url("   "), Err(ValidationError::Empty));
    assert_eq!(
        validate_url("javascript:alert(1)"),
        Err(ValidationError::InvalidFormat)
    );
    assert_eq!(
        validate_url("ftp://x"),
        Err(ValidationError::UnsupportedProtocol {
            scheme: "ftp".to_string()
        })
    );
    assert!(matches!(
        validate_url("file:///etc/passwd"),
        Err(ValidationError::UnsupportedProtocol { .. })
    ));
}

#[test]
fn error_messages_are_human_readable() {
    assert_eq!(ValidationError::Empty.to_string(), "URL cannot be empty");
    assert_eq!(
        ValidationError::InvalidFormat.to_string(),
        "Invalid URL format"
    );
    assert_eq!(
        validate_url("ftp://x").unwrap_err().to_string(),
        "Only HTTP and HTTPS protocols are allowed"
    );
}
