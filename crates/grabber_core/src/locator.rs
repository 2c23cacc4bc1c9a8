use url::Url;

use crate::ValidationError;

const WATCH_HOSTS: &[&str] = &["youtube.com", "www.youtube.com"];
const SHORT_HOSTS: &[&str] = &["youtu.be", "www.youtu.be"];

/// Syntactic check for the locator shapes the backend recognizes:
/// `youtube.com/watch?v=ID`, `youtu.be/ID`, `youtube.com/shorts/ID`, `youtube.com/embed/ID`.
pub fn is_acceptable_locator(input: &str) -> bool {
    validate_locator(input).is_ok()
}

/// Validates `input` and returns the locator to submit (scheme added when missing).
pub fn validate_locator(input: &str) -> Result<String, ValidationError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::Empty);
    }
    let parsed = parse_with_default_scheme(trimmed).ok_or(ValidationError::Unrecognized)?;
    if !matches!(parsed.scheme(), "http" | "https") || !has_recognized_shape(&parsed) {
        return Err(ValidationError::Unrecognized);
    }
    Ok(parsed.to_string())
}

fn parse_with_default_scheme(input: &str) -> Option<Url> {
    if input.chars().any(char::is_whitespace) {
        return None;
    }
    if input.contains("://") {
        Url::parse(input).ok()
    } else {
        Url::parse(&format!("https://{input}")).ok()
    }
}

fn has_recognized_shape(url: &Url) -> bool {
    // The backend matches the raw authority, so any port or credentials disqualify.
    if url.port().is_some() || !url.username().is_empty() || url.password().is_some() {
        return false;
    }
    let Some(host) = url.host_str() else {
        return false;
    };
    let mut segments = url.path_segments().into_iter().flatten();
    let first = segments.next().unwrap_or_default();

    if SHORT_HOSTS.contains(&host) {
        return is_identifier(first);
    }
    if !WATCH_HOSTS.contains(&host) {
        return false;
    }
    match first {
        "watch" => url
            .query_pairs()
            .find(|(key, _)| key == "v")
            .is_some_and(|(_, value)| is_identifier(&value)),
        "shorts" | "embed" => is_identifier(segments.next().unwrap_or_default()),
        _ => false,
    }
}

fn is_identifier(candidate: &str) -> bool {
    !candidate.is_empty()
        && candidate
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}
