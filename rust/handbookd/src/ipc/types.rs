use std::path::PathBuf;

use rusqlite::Connection;
use serde::Deserialize;

use crate::content::ContentTable;
use crate::view::Page;

#[derive(Debug, Deserialize, Clone)]
pub struct Request {
    pub id: String,
    pub method: String,
    #[serde(default)]
    pub params: serde_json::Value,
}

pub struct AppState {
    pub workspace: Option<PathBuf>,
    pub db: Option<Connection>,
    pub content: ContentTable,
    /// The currently mounted handbook page, if any. Mounting again replaces it.
    pub page: Option<Page>,
}

impl AppState {
    pub fn new(content: ContentTable) -> Self {
        Self {
            workspace: None,
            db: None,
            content,
            page: None,
        }
    }
}
