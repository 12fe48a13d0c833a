//! Best-effort extraction of structured text from model responses
//!
//! Model output formatting is not guaranteed, so these helpers only look for
//! markdown code fences and never parse markdown in general.

const FENCE: &str = "```";
const JSON_FENCE: &str = "```json";
const MARKDOWN_FENCE: &str = "```markdown";

/// Pull the JSON payload out of a response
///
/// Takes the body of the first ```` ```json ```` fence, else the first bare
/// fence, else the whole response. An unterminated fence runs to the end.
pub fn extract_json_block(response: &str) -> &str {
    let body = if let Some(start) = response.find(JSON_FENCE) {
        fenced_body(response, start + JSON_FENCE.len())
    } else if let Some(start) = response.find(FENCE) {
        fenced_body(response, start + FENCE.len())
    } else {
        response
    };
    body.trim()
}

fn fenced_body(response: &str, body_start: usize) -> &str {
    let rest = &response[body_start..];
    match rest.find(FENCE) {
        Some(end) => &rest[..end],
        None => rest,
    }
}

/// Remove one wrapping code fence around a whole document
///
/// Recognizes a leading ```` ```markdown ```` or bare ```` ``` ```` and drops
/// a matching trailing fence, then trims surrounding whitespace.
pub fn strip_markdown_fence(response: &str) -> String {
    let text = response.trim();
    let inner = if let Some(rest) = text.strip_prefix(MARKDOWN_FENCE) {
        rest.strip_suffix(FENCE).unwrap_or(rest)
    } else if let Some(rest) = text.strip_prefix(FENCE) {
        rest.strip_suffix(FENCE).unwrap_or(rest)
    } else {
        text
    };
    inner.trim().to_string()
}
