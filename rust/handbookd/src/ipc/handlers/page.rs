use crate::content::ContentTable;
use crate::ipc::error::{err, ok, page_err};
use crate::ipc::handlers::setup::load_config;
use crate::ipc::helpers::{bool_param, check_mount, i64_param, opt_bool_param, require_db};
use crate::ipc::types::{AppState, Request};
use crate::session::StoreSessionProvider;
use crate::view::{Page, Router};
use serde_json::{json, Value};

/// Side effects the shell must carry out, in order.
#[derive(Default)]
struct Effects(Vec<Value>);

impl Router for Effects {
    fn navigate_to_login(&mut self, route: &str) {
        self.0.push(json!({ "kind": "navigate", "to": route }));
    }
}

impl Effects {
    fn scroll_to_top(&mut self) {
        self.0.push(json!({ "kind": "scrollToTop" }));
    }
}

fn view_json(page: &Page, content: &ContentTable) -> Value {
    json!(page.compose(content))
}

fn resolve_mounted(
    state: &mut AppState,
    req: &Request,
    online: bool,
    effects: &mut Effects,
) -> Result<bool, Value> {
    let conn = require_db(state.db.as_ref(), req)?;
    let config = load_config(conn)
        .map_err(|e| err(&req.id, "db_query_failed", e.to_string(), None))?;
    let Some(page) = state.page.as_mut() else {
        return Err(err(&req.id, "not_mounted", "mount the page first", None));
    };
    let provider = StoreSessionProvider::new(conn, &config.keys, online);
    Ok(page.resolve(&provider, effects))
}

fn handle_mount(state: &mut AppState, req: &Request) -> Value {
    let conn = match require_db(state.db.as_ref(), req) {
        Ok(c) => c,
        Err(resp) => return resp,
    };
    let online = match opt_bool_param(req, "online") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let config = match load_config(conn) {
        Ok(c) => c,
        Err(e) => return err(&req.id, "db_query_failed", e.to_string(), None),
    };

    let page = Page::mount(config.page);
    tracing::info!(mount_id = page.mount_id(), "page mounted");
    state.page = Some(page);

    let mut effects = Effects::default();
    if let Some(online) = online {
        if let Err(resp) = resolve_mounted(state, req, online, &mut effects) {
            return resp;
        }
    }

    let Some(page) = state.page.as_ref() else {
        return err(&req.id, "not_mounted", "mount the page first", None);
    };
    ok(
        &req.id,
        json!({
            "mountId": page.mount_id(),
            "view": view_json(page, &state.content),
            "effects": effects.0,
        }),
    )
}

fn handle_resolve(state: &mut AppState, req: &Request) -> Value {
    if let Err(resp) = check_mount(state.page.as_ref(), req) {
        return resp;
    }
    let online = match bool_param(req, "online") {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    let mut effects = Effects::default();
    let ran = match resolve_mounted(state, req, online, &mut effects) {
        Ok(ran) => ran,
        Err(resp) => return resp,
    };

    let Some(page) = state.page.as_ref() else {
        return err(&req.id, "not_mounted", "mount the page first", None);
    };
    let mut result = json!({
        "mountId": page.mount_id(),
        "alreadyResolved": !ran,
        "view": view_json(page, &state.content),
        "effects": effects.0,
    });
    if let Some(w) = page.resolution().and_then(|r| r.recovered.as_ref()) {
        result["warning"] = json!({ "code": w.code(), "message": w.to_string() });
    }
    ok(&req.id, result)
}

fn handle_view(state: &mut AppState, req: &Request) -> Value {
    let Some(page) = state.page.as_ref() else {
        return ok(&req.id, json!({ "mountId": null, "view": { "state": "loading" } }));
    };
    if let Err(resp) = check_mount(Some(page), req) {
        return resp;
    }
    ok(
        &req.id,
        json!({
            "mountId": page.mount_id(),
            "resolved": page.is_resolved(),
            "view": view_json(page, &state.content),
        }),
    )
}

fn handle_select_section(state: &mut AppState, req: &Request) -> Value {
    if let Err(resp) = check_mount(state.page.as_ref(), req) {
        return resp;
    }
    let section = match i64_param(req, "section") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let Some(page) = state.page.as_mut() else {
        return err(&req.id, "not_mounted", "mount the page first", None);
    };

    let transition = match page.select_section(section) {
        Ok(t) => t,
        Err(e) => return page_err(&req.id, &e),
    };
    let mut effects = Effects::default();
    if page.take_scroll_reset() {
        effects.scroll_to_top();
    }

    ok(
        &req.id,
        json!({
            "transition": {
                "from": transition.from,
                "to": transition.to,
                "changed": transition.changed(),
            },
            "view": view_json(page, &state.content),
            "effects": effects.0,
        }),
    )
}

fn handle_toggle_menu(state: &mut AppState, req: &Request) -> Value {
    if let Err(resp) = check_mount(state.page.as_ref(), req) {
        return resp;
    }
    let Some(page) = state.page.as_mut() else {
        return err(&req.id, "not_mounted", "mount the page first", None);
    };
    let open = page.toggle_menu();
    ok(&req.id, json!({ "menuOpen": open }))
}

fn handle_set_menu(state: &mut AppState, req: &Request) -> Value {
    if let Err(resp) = check_mount(state.page.as_ref(), req) {
        return resp;
    }
    let open = match bool_param(req, "open") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let Some(page) = state.page.as_mut() else {
        return err(&req.id, "not_mounted", "mount the page first", None);
    };
    page.set_menu(open);
    ok(&req.id, json!({ "menuOpen": open }))
}

fn handle_scroll(state: &mut AppState, req: &Request) -> Value {
    if let Err(resp) = check_mount(state.page.as_ref(), req) {
        return resp;
    }
    let offset = match i64_param(req, "offset") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let Ok(offset) = u32::try_from(offset) else {
        return err(&req.id, "bad_params", "params.offset must be >= 0", None);
    };
    let Some(page) = state.page.as_mut() else {
        return err(&req.id, "not_mounted", "mount the page first", None);
    };
    match page.scroll_to(offset) {
        Ok(()) => ok(&req.id, json!({ "scrollOffset": offset })),
        Err(e) => page_err(&req.id, &e),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<Value> {
    match req.method.as_str() {
        "page.mount" => Some(handle_mount(state, req)),
        "page.resolve" => Some(handle_resolve(state, req)),
        "page.view" => Some(handle_view(state, req)),
        "page.selectSection" => Some(handle_select_section(state, req)),
        "page.toggleMenu" => Some(handle_toggle_menu(state, req)),
        "page.setMenu" => Some(handle_set_menu(state, req)),
        "page.scroll" => Some(handle_scroll(state, req)),
        _ => None,
    }
}
