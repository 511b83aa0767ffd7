use rusqlite::Connection;
use serde_json::Value;

use crate::ipc::error::err;
use crate::ipc::types::Request;
use crate::view::Page;

pub fn require_db<'a>(db: Option<&'a Connection>, req: &Request) -> Result<&'a Connection, Value> {
    db.ok_or_else(|| err(&req.id, "no_workspace", "select a workspace first", None))
}

pub fn str_param<'a>(req: &'a Request, key: &str) -> Result<&'a str, Value> {
    req.params
        .get(key)
        .and_then(|v| v.as_str())
        .ok_or_else(|| err(&req.id, "bad_params", format!("missing params.{key}"), None))
}

pub fn bool_param(req: &Request, key: &str) -> Result<bool, Value> {
    req.params
        .get(key)
        .and_then(|v| v.as_bool())
        .ok_or_else(|| err(&req.id, "bad_params", format!("params.{key} must be boolean"), None))
}

pub fn opt_bool_param(req: &Request, key: &str) -> Result<Option<bool>, Value> {
    match req.params.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(v) => v.as_bool().map(Some).ok_or_else(|| {
            err(&req.id, "bad_params", format!("params.{key} must be boolean"), None)
        }),
    }
}

pub fn i64_param(req: &Request, key: &str) -> Result<i64, Value> {
    req.params
        .get(key)
        .and_then(|v| v.as_i64())
        .ok_or_else(|| err(&req.id, "bad_params", format!("params.{key} must be integer"), None))
}

/// Checks that a page is mounted and, when the caller names a mount, that it
/// is the current one.
pub fn check_mount(page: Option<&Page>, req: &Request) -> Result<(), Value> {
    let Some(page) = page else {
        return Err(err(&req.id, "not_mounted", "mount the page first", None));
    };
    match req.params.get("mountId").and_then(|v| v.as_str()) {
        Some(wanted) if wanted != page.mount_id() => Err(err(
            &req.id,
            "stale_mount",
            "page was remounted",
            Some(serde_json::json!({ "mountId": page.mount_id() })),
        )),
        _ => Ok(()),
    }
}
