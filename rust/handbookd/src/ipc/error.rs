use serde_json::json;

use crate::view::PageError;

pub fn ok(id: &str, result: serde_json::Value) -> serde_json::Value {
    json!({
        "id": id,
        "ok": true,
        "result": result
    })
}

pub fn err(
    id: &str,
    code: &str,
    message: impl Into<String>,
    details: Option<serde_json::Value>,
) -> serde_json::Value {
    let mut error = json!({
        "code": code,
        "message": message.into(),
    });
    if let Some(d) = details {
        error["details"] = d;
    }
    json!({
        "id": id,
        "ok": false,
        "error": error,
    })
}

pub fn page_err(id: &str, e: &PageError) -> serde_json::Value {
    let details = match e {
        PageError::SectionOutOfRange(n) => Some(json!({ "section": n, "min": 1, "max": 20 })),
        PageError::NotReady => None,
    };
    err(id, e.code(), e.to_string(), details)
}
