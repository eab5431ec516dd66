use crate::http::CapturedResponse;

pub fn assert_status(response: &CapturedResponse, expected: u16) {
    assert_eq!(
        expected,
        response.status_code(),
        "unexpected status code; body: {}",
        response.text()
    );
}

/// Assert a header is present and, when `expected` is given, that its first
/// value matches ignoring case.
pub fn assert_header(response: &CapturedResponse, name: &str, expected: Option<&str>) {
    let actual = response.header(name);
    assert!(actual.is_some(), "Header {} is missing", name);

    if let (Some(expected), Some(actual)) = (expected, actual) {
        assert_eq!(
            expected.to_lowercase(),
            actual.to_lowercase(),
            "Header {} value does not match",
            name
        );
    }
}
