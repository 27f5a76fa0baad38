//! Parse the JSON error body returned with non-2xx responses.

use serde::Deserialize;

use super::ErrorCode;

#[derive(Deserialize)]
struct Wrapped {
    error: Option<Detail>,
}

#[derive(Deserialize)]
struct Detail {
    code: Option<String>,
    message: Option<String>,
}

/// Returns `(code, message)` from either the wrapped or the flat form.
pub(super) fn parse(body: &str) -> Option<(ErrorCode, String)> {
    if let Ok(Wrapped { error: Some(d) }) = serde_json::from_str::<Wrapped>(body) {
        return detail(d);
    }
    serde_json::from_str::<Detail>(body).ok().and_then(detail)
}

fn detail(d: Detail) -> Option<(ErrorCode, String)> {
    if d.code.is_none() && d.message.is_none() {
        return None;
    }
    let code = d.code.as_deref().map(ErrorCode::parse).unwrap_or(ErrorCode::Unknown);
    Some((code, d.message.unwrap_or_default()))
}
