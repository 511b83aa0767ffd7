//! Raw access to the workspace's local store, for the shell's login flow,
//! settings screen and logout.

use crate::db;
use crate::ipc::error::{err, ok};
use crate::ipc::helpers::{require_db, str_param};
use crate::ipc::types::{AppState, Request};
use serde_json::json;

fn handle_store_get(state: &mut AppState, req: &Request) -> serde_json::Value {
    let conn = match require_db(state.db.as_ref(), req) {
        Ok(c) => c,
        Err(resp) => return resp,
    };
    let key = match str_param(req, "key") {
        Ok(k) => k,
        Err(resp) => return resp,
    };
    match db::store_get(conn, key) {
        Ok(value) => ok(&req.id, json!({ "key": key, "value": value })),
        Err(e) => err(&req.id, "db_query_failed", e.to_string(), None),
    }
}

fn handle_store_set(state: &mut AppState, req: &Request) -> serde_json::Value {
    let conn = match require_db(state.db.as_ref(), req) {
        Ok(c) => c,
        Err(resp) => return resp,
    };
    let key = match str_param(req, "key") {
        Ok(k) => k,
        Err(resp) => return resp,
    };
    let value = match str_param(req, "value") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    if key.is_empty() {
        return err(&req.id, "bad_params", "key must not be empty", None);
    }
    match db::store_set(conn, key, value) {
        Ok(()) => ok(&req.id, json!({ "key": key })),
        Err(e) => err(&req.id, "db_update_failed", e.to_string(), None),
    }
}

fn handle_store_remove(state: &mut AppState, req: &Request) -> serde_json::Value {
    let conn = match require_db(state.db.as_ref(), req) {
        Ok(c) => c,
        Err(resp) => return resp,
    };
    let key = match str_param(req, "key") {
        Ok(k) => k,
        Err(resp) => return resp,
    };
    match db::store_remove(conn, key) {
        Ok(removed) => ok(&req.id, json!({ "key": key, "removed": removed })),
        Err(e) => err(&req.id, "db_update_failed", e.to_string(), None),
    }
}

fn handle_store_keys(state: &mut AppState, req: &Request) -> serde_json::Value {
    let conn = match require_db(state.db.as_ref(), req) {
        Ok(c) => c,
        Err(resp) => return resp,
    };
    match db::store_keys(conn) {
        Ok(keys) => ok(&req.id, json!({ "keys": keys })),
        Err(e) => err(&req.id, "db_query_failed", e.to_string(), None),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "store.get" => Some(handle_store_get(state, req)),
        "store.set" => Some(handle_store_set(state, req)),
        "store.remove" => Some(handle_store_remove(state, req)),
        "store.keys" => Some(handle_store_keys(state, req)),
        _ => None,
    }
}
