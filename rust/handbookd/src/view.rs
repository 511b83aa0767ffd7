use serde::Serialize;
use thiserror::Error;

use crate::content::{ContentTable, Section, SidebarEntry};
use crate::department::{classify, Category, Classification};
use crate::selector::{ContentPane, SectionId, SectionSelector, Transition};
use crate::session::{self, Resolution, SessionProvider};

/// Navigation owned by the shell.
pub trait Router {
    fn navigate_to_login(&mut self, route: &str);
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PageError {
    #[error("page is not showing handbook content")]
    NotReady,

    #[error("section {0} is outside 1..=20")]
    SectionOutOfRange(i64),
}

impl PageError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotReady => "not_ready",
            Self::SectionOutOfRange(_) => "bad_params",
        }
    }
}

#[derive(Debug, Clone)]
pub struct PageOptions {
    pub login_route: String,
    pub reset_on_reselect: bool,
}

impl Default for PageOptions {
    fn default() -> Self {
        Self {
            login_route: "/login".to_string(),
            reset_on_reselect: true,
        }
    }
}

#[derive(Debug, Clone)]
struct ResolvedSession {
    resolution: Resolution,
    classification: Classification,
}

/// One page load: loading until the session check has run, then either a
/// redirect or the handbook content.
#[derive(Debug, Clone)]
pub struct Page {
    mount_id: String,
    options: PageOptions,
    session: Option<ResolvedSession>,
    selector: SectionSelector,
    pane: ContentPane,
    menu_open: bool,
}

#[derive(Debug, Serialize)]
#[serde(tag = "state", rename_all = "camelCase")]
pub enum View<'a> {
    Loading,
    Redirect { to: &'a str },
    Content(ContentView<'a>),
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentView<'a> {
    pub category: Category,
    pub department: Option<&'a str>,
    pub recognized_department: bool,
    pub anonymous: bool,
    pub offline: bool,
    pub active_section: SectionId,
    pub sidebar: Vec<SidebarItem<'a>>,
    pub section: &'a Section,
    pub menu_open: bool,
    pub scroll_offset: u32,
    pub scroll_resets: u64,
}

#[derive(Debug, Serialize)]
pub struct SidebarItem<'a> {
    #[serde(flatten)]
    pub entry: &'a SidebarEntry,
    pub active: bool,
}

impl Page {
    pub fn mount(options: PageOptions) -> Self {
        let pane = ContentPane::new(options.reset_on_reselect);
        Self {
            mount_id: uuid::Uuid::new_v4().to_string(),
            options,
            session: None,
            selector: SectionSelector::new(),
            pane,
            menu_open: false,
        }
    }

    pub fn mount_id(&self) -> &str {
        &self.mount_id
    }

    pub fn is_resolved(&self) -> bool {
        self.session.is_some()
    }

    pub fn resolution(&self) -> Option<&Resolution> {
        self.session.as_ref().map(|s| &s.resolution)
    }

    /// Runs the session check once per mount. Returns false when it had
    /// already run, in which case nothing happens.
    pub fn resolve(&mut self, provider: &dyn SessionProvider, router: &mut dyn Router) -> bool {
        if self.session.is_some() {
            return false;
        }
        let resolution = session::resolve(provider);
        if !resolution.is_authorized() {
            router.navigate_to_login(&self.options.login_route);
        }
        let classification = classify(resolution.user.as_ref());
        self.session = Some(ResolvedSession {
            resolution,
            classification,
        });
        true
    }

    fn shows_content(&self) -> bool {
        self.session
            .as_ref()
            .is_some_and(|s| s.resolution.is_authorized())
    }

    pub fn active_section(&self) -> SectionId {
        self.selector.current()
    }

    pub fn select_section(&mut self, section: i64) -> Result<Transition, PageError> {
        let id = SectionId::new(section).ok_or(PageError::SectionOutOfRange(section))?;
        if !self.shows_content() {
            return Err(PageError::NotReady);
        }
        Ok(self.selector.select(id, &mut self.pane))
    }

    pub fn take_scroll_reset(&mut self) -> bool {
        self.pane.take_pending_reset()
    }

    pub fn scroll_to(&mut self, offset: u32) -> Result<(), PageError> {
        if !self.shows_content() {
            return Err(PageError::NotReady);
        }
        self.pane.scroll_to(offset);
        Ok(())
    }

    pub fn toggle_menu(&mut self) -> bool {
        self.menu_open = !self.menu_open;
        self.menu_open
    }

    pub fn set_menu(&mut self, open: bool) {
        self.menu_open = open;
    }

    pub fn compose<'a>(&'a self, content: &'a ContentTable) -> View<'a> {
        let Some(session) = self.session.as_ref() else {
            return View::Loading;
        };
        let resolution = &session.resolution;
        if !resolution.is_authorized() {
            return View::Redirect {
                to: &self.options.login_route,
            };
        }

        let category = session.classification.content_category();
        let active = self.active_section();
        let sidebar = content
            .sidebar(category)
            .iter()
            .map(|entry| SidebarItem {
                entry,
                active: entry.section == active,
            })
            .collect();

        View::Content(ContentView {
            category,
            department: resolution
                .user
                .as_ref()
                .and_then(|u| u.department.as_deref()),
            recognized_department: session.classification.is_recognized(),
            anonymous: resolution.anonymous,
            offline: !resolution.online,
            active_section: active,
            sidebar,
            section: content.lookup(category, active),
            menu_open: self.menu_open,
            scroll_offset: self.pane.offset(),
            scroll_resets: self.pane.resets(),
        })
    }
}
