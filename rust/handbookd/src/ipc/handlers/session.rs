use crate::db;
use crate::department::classify;
use crate::ipc::error::{err, ok};
use crate::ipc::handlers::setup::load_config;
use crate::ipc::helpers::{bool_param, require_db};
use crate::ipc::types::{AppState, Request};
use crate::session::{resolve, StoreSessionProvider};
use serde_json::json;

fn handle_login(state: &mut AppState, req: &Request) -> serde_json::Value {
    let conn = match require_db(state.db.as_ref(), req) {
        Ok(c) => c,
        Err(resp) => return resp,
    };
    let Some(user) = req.params.get("user").filter(|v| v.is_object()) else {
        return err(&req.id, "bad_params", "params.user must be an object", None);
    };
    let config = match load_config(conn) {
        Ok(c) => c,
        Err(e) => return err(&req.id, "db_query_failed", e.to_string(), None),
    };
    let raw = user.to_string();
    if let Err(e) = db::store_set(conn, &config.keys.user, &raw) {
        return err(&req.id, "db_update_failed", e.to_string(), None);
    }
    tracing::info!(key = %config.keys.user, "user record stored");
    ok(&req.id, json!({ "key": config.keys.user }))
}

fn handle_logout(state: &mut AppState, req: &Request) -> serde_json::Value {
    let conn = match require_db(state.db.as_ref(), req) {
        Ok(c) => c,
        Err(resp) => return resp,
    };
    let config = match load_config(conn) {
        Ok(c) => c,
        Err(e) => return err(&req.id, "db_query_failed", e.to_string(), None),
    };
    match db::store_remove(conn, &config.keys.user) {
        Ok(removed) => ok(&req.id, json!({ "removed": removed })),
        Err(e) => err(&req.id, "db_update_failed", e.to_string(), None),
    }
}

fn handle_anonymous_mode_set(state: &mut AppState, req: &Request) -> serde_json::Value {
    let conn = match require_db(state.db.as_ref(), req) {
        Ok(c) => c,
        Err(resp) => return resp,
    };
    let enabled = match bool_param(req, "enabled") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let config = match load_config(conn) {
        Ok(c) => c,
        Err(e) => return err(&req.id, "db_query_failed", e.to_string(), None),
    };
    let key = &config.keys.anonymous_mode;
    let res = if enabled {
        db::store_set(conn, key, "true")
    } else {
        db::store_remove(conn, key).map(|_| ())
    };
    match res {
        Ok(()) => ok(&req.id, json!({ "enabled": enabled })),
        Err(e) => err(&req.id, "db_update_failed", e.to_string(), None),
    }
}

/// Runs the session check without mounting a page.
fn handle_check(state: &mut AppState, req: &Request) -> serde_json::Value {
    let conn = match require_db(state.db.as_ref(), req) {
        Ok(c) => c,
        Err(resp) => return resp,
    };
    let online = match bool_param(req, "online") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let config = match load_config(conn) {
        Ok(c) => c,
        Err(e) => return err(&req.id, "db_query_failed", e.to_string(), None),
    };

    let provider = StoreSessionProvider::new(conn, &config.keys, online);
    let resolution = resolve(&provider);
    let classification = classify(resolution.user.as_ref());

    let mut result = json!({
        "access": resolution.access,
        "anonymous": resolution.anonymous,
        "user": resolution.user,
        "department": classification.department().map(|d| d.label()),
        "category": classification.content_category(),
        "recognized": classification.is_recognized(),
    });
    if let Some(w) = &resolution.recovered {
        result["warning"] = json!({ "code": w.code(), "message": w.to_string() });
    }
    ok(&req.id, result)
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "session.login" => Some(handle_login(state, req)),
        "session.logout" => Some(handle_logout(state, req)),
        "session.anonymousMode.set" => Some(handle_anonymous_mode_set(state, req)),
        "session.check" => Some(handle_check(state, req)),
        _ => None,
    }
}
