//! Read-only access to the static content table, independent of any session.

use crate::department::{Category, Department};
use crate::ipc::error::{err, ok};
use crate::ipc::helpers::{i64_param, str_param};
use crate::ipc::types::{AppState, Request};
use crate::selector::SectionId;
use serde_json::{json, Value};

fn category_param(req: &Request) -> Result<Category, Value> {
    let raw = str_param(req, "category")?;
    Category::parse(raw).ok_or_else(|| {
        err(
            &req.id,
            "bad_params",
            "category must be one of: basicEducation, college",
            None,
        )
    })
}

fn handle_sidebar(state: &mut AppState, req: &Request) -> Value {
    let category = match category_param(req) {
        Ok(c) => c,
        Err(resp) => return resp,
    };
    ok(
        &req.id,
        json!({
            "category": category,
            "entries": state.content.sidebar(category),
        }),
    )
}

fn handle_section(state: &mut AppState, req: &Request) -> Value {
    let category = match category_param(req) {
        Ok(c) => c,
        Err(resp) => return resp,
    };
    let n = match i64_param(req, "section") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let Some(id) = SectionId::new(n) else {
        return err(
            &req.id,
            "bad_params",
            format!("section {n} is outside 1..=20"),
            None,
        );
    };
    ok(
        &req.id,
        json!({
            "category": category,
            "section": state.content.lookup(category, id),
        }),
    )
}

fn handle_departments(_state: &mut AppState, req: &Request) -> Value {
    let departments: Vec<Value> = Department::ALL
        .iter()
        .map(|d| json!({ "department": d.label(), "category": d.category() }))
        .collect();
    ok(
        &req.id,
        json!({ "departments": departments, "categories": Category::ALL }),
    )
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<Value> {
    match req.method.as_str() {
        "handbook.sidebar" => Some(handle_sidebar(state, req)),
        "handbook.section" => Some(handle_section(state, req)),
        "handbook.departments" => Some(handle_departments(state, req)),
        _ => None,
    }
}
