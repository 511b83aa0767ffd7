use crate::db;
use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, Request};
use crate::session::StoreKeys;
use crate::view::PageOptions;
use serde_json::{json, Map, Value};

#[derive(Clone, Copy)]
enum SetupSection {
    Session,
    Page,
}

impl SetupSection {
    fn parse(s: &str) -> Option<Self> {
        match s {
            "session" => Some(Self::Session),
            "page" => Some(Self::Page),
            _ => None,
        }
    }

    fn key(self) -> &'static str {
        match self {
            Self::Session => "setup.session",
            Self::Page => "setup.page",
        }
    }
}

fn default_section(section: SetupSection) -> Value {
    match section {
        SetupSection::Session => {
            let keys = StoreKeys::default();
            json!({
                "loginRoute": PageOptions::default().login_route,
                "userKey": keys.user,
                "anonymousModeKey": keys.anonymous_mode
            })
        }
        SetupSection::Page => json!({
            "reselectResetsScroll": PageOptions::default().reset_on_reselect
        }),
    }
}

fn as_object_mut(value: &mut Value) -> Result<&mut Map<String, Value>, String> {
    value
        .as_object_mut()
        .ok_or_else(|| "internal setup object must be a JSON object".to_string())
}

fn parse_bool(v: &Value, key: &str) -> Result<bool, String> {
    v.as_bool().ok_or_else(|| format!("{} must be boolean", key))
}

fn parse_string_range(v: &Value, key: &str, min_len: usize, max_len: usize) -> Result<String, String> {
    let s = v.as_str().ok_or_else(|| format!("{} must be string", key))?;
    let s = s.trim();
    if s.len() < min_len || s.len() > max_len {
        return Err(format!("{} length must be in {}..={}", key, min_len, max_len));
    }
    Ok(s.to_string())
}

fn merge_section_patch(
    section: SetupSection,
    current: &mut Value,
    patch: &Map<String, Value>,
) -> Result<(), String> {
    let obj = as_object_mut(current)?;
    for (k, v) in patch {
        match section {
            SetupSection::Session => match k.as_str() {
                "loginRoute" => {
                    let s = parse_string_range(v, k, 1, 200)?;
                    if !s.starts_with('/') {
                        return Err("loginRoute must start with /".into());
                    }
                    obj.insert(k.clone(), Value::String(s));
                }
                "userKey" | "anonymousModeKey" => {
                    obj.insert(k.clone(), Value::String(parse_string_range(v, k, 1, 64)?));
                }
                _ => return Err(format!("unknown session field: {}", k)),
            },
            SetupSection::Page => match k.as_str() {
                "reselectResetsScroll" => {
                    obj.insert(k.clone(), Value::Bool(parse_bool(v, k)?));
                }
                _ => return Err(format!("unknown page field: {}", k)),
            },
        }
    }
    if let SetupSection::Session = section {
        if obj.get("userKey") == obj.get("anonymousModeKey") {
            return Err("userKey and anonymousModeKey must differ".into());
        }
    }
    Ok(())
}

fn load_section(conn: &rusqlite::Connection, section: SetupSection) -> anyhow::Result<Value> {
    let mut current = default_section(section);
    if let Some(saved) = db::settings_get_json(conn, section.key())? {
        if let Some(saved_obj) = saved.as_object() {
            // Malformed saved values fall back to defaults rather than block the page.
            let mut merged = current.clone();
            if merge_section_patch(section, &mut merged, saved_obj).is_ok() {
                current = merged;
            } else {
                tracing::warn!(key = section.key(), "ignoring invalid saved settings");
            }
        }
    }
    Ok(current)
}

#[derive(Debug, Clone, Default)]
pub struct HandbookConfig {
    pub keys: StoreKeys,
    pub page: PageOptions,
}

pub fn load_config(conn: &rusqlite::Connection) -> anyhow::Result<HandbookConfig> {
    let session = load_section(conn, SetupSection::Session)?;
    let page = load_section(conn, SetupSection::Page)?;
    let defaults = HandbookConfig::default();

    let text = |v: &Value, key: &str, fallback: &str| -> String {
        v.get(key)
            .and_then(|s| s.as_str())
            .unwrap_or(fallback)
            .to_string()
    };

    Ok(HandbookConfig {
        keys: StoreKeys {
            user: text(&session, "userKey", &defaults.keys.user),
            anonymous_mode: text(&session, "anonymousModeKey", &defaults.keys.anonymous_mode),
        },
        page: PageOptions {
            login_route: text(&session, "loginRoute", &defaults.page.login_route),
            reset_on_reselect: page
                .get("reselectResetsScroll")
                .and_then(|v| v.as_bool())
                .unwrap_or(defaults.page.reset_on_reselect),
        },
    })
}

fn handle_setup_get(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let session = match load_section(conn, SetupSection::Session) {
        Ok(v) => v,
        Err(e) => return err(&req.id, "db_query_failed", e.to_string(), None),
    };
    let page = match load_section(conn, SetupSection::Page) {
        Ok(v) => v,
        Err(e) => return err(&req.id, "db_query_failed", e.to_string(), None),
    };

    ok(&req.id, json!({ "session": session, "page": page }))
}

fn handle_setup_update(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let Some(section_raw) = req.params.get("section").and_then(|v| v.as_str()) else {
        return err(&req.id, "bad_params", "missing section", None);
    };
    let Some(section) = SetupSection::parse(section_raw) else {
        return err(&req.id, "bad_params", "unknown section", None);
    };
    let Some(patch_obj) = req.params.get("patch").and_then(|v| v.as_object()) else {
        return err(&req.id, "bad_params", "patch must be an object", None);
    };

    let mut current = match load_section(conn, section) {
        Ok(v) => v,
        Err(e) => return err(&req.id, "db_query_failed", e.to_string(), None),
    };
    if let Err(msg) = merge_section_patch(section, &mut current, patch_obj) {
        return err(&req.id, "bad_params", msg, None);
    }
    if let Err(e) = db::settings_set_json(conn, section.key(), &current) {
        return err(&req.id, "db_update_failed", e.to_string(), None);
    }
    tracing::info!(section = section_raw, "settings updated");
    ok(&req.id, json!({ "section": section_raw, "value": current }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "setup.get" => Some(handle_setup_get(state, req)),
        "setup.update" => Some(handle_setup_update(state, req)),
        _ => None,
    }
}
