//! Static handbook content keyed by (section, category).
//!
//! The text lives in `data/handbook.json` and is checked once at startup:
//! every category must define all twenty sections, so a lookup by a valid
//! [`SectionId`] cannot miss.

use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};

use crate::department::Category;
use crate::selector::{SectionId, SECTION_COUNT};

const HANDBOOK_JSON: &str = include_str!("../data/handbook.json");

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Block {
    Heading {
        text: String,
    },
    Paragraph {
        text: String,
    },
    List {
        #[serde(default)]
        ordered: bool,
        items: Vec<String>,
    },
    Table {
        columns: Vec<String>,
        rows: Vec<Vec<String>>,
    },
}

#[derive(Debug, Clone, Serialize)]
pub struct Section {
    pub id: SectionId,
    pub number: &'static str,
    pub heading: String,
    pub blocks: Vec<Block>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SidebarEntry {
    pub section: SectionId,
    pub number: &'static str,
    pub title: String,
    pub subtitle: String,
}

#[derive(Debug)]
struct CategoryContent {
    sidebar: Vec<SidebarEntry>,
    // Indexed by SectionId::index().
    sections: Vec<Section>,
}

#[derive(Debug)]
pub struct ContentTable {
    categories: [CategoryContent; 2],
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawTable {
    basic_education: RawCategory,
    college: RawCategory,
}

#[derive(Deserialize)]
struct RawCategory {
    sidebar: Vec<RawSidebarEntry>,
    sections: Vec<RawSection>,
}

#[derive(Deserialize)]
struct RawSidebarEntry {
    section: i64,
    title: String,
    #[serde(default)]
    subtitle: String,
}

#[derive(Deserialize)]
struct RawSection {
    section: i64,
    heading: String,
    #[serde(default)]
    blocks: Vec<Block>,
}

impl ContentTable {
    pub fn builtin() -> anyhow::Result<Self> {
        Self::from_json(HANDBOOK_JSON).context("built-in handbook content")
    }

    pub fn from_json(raw: &str) -> anyhow::Result<Self> {
        let table: RawTable = serde_json::from_str(raw).context("parse handbook json")?;
        let basic = build_category(table.basic_education)
            .with_context(|| format!("category {}", Category::BasicEducation.key()))?;
        let college = build_category(table.college)
            .with_context(|| format!("category {}", Category::College.key()))?;
        Ok(Self {
            categories: [basic, college],
        })
    }

    pub fn lookup(&self, category: Category, id: SectionId) -> &Section {
        &self.categories[category.index()].sections[id.index()]
    }

    pub fn sidebar(&self, category: Category) -> &[SidebarEntry] {
        &self.categories[category.index()].sidebar
    }
}

fn build_category(raw: RawCategory) -> anyhow::Result<CategoryContent> {
    let mut slots: Vec<Option<Section>> = (0..SECTION_COUNT).map(|_| None).collect();
    for s in raw.sections {
        let Some(id) = SectionId::new(s.section) else {
            bail!("section {} is outside 1..={}", s.section, SECTION_COUNT);
        };
        if s.heading.trim().is_empty() {
            bail!("section {} has an empty heading", s.section);
        }
        for block in &s.blocks {
            check_block(block).with_context(|| format!("section {}", s.section))?;
        }
        let slot = &mut slots[id.index()];
        if slot.is_some() {
            bail!("section {} is defined twice", s.section);
        }
        *slot = Some(Section {
            id,
            number: id.roman(),
            heading: s.heading,
            blocks: s.blocks,
        });
    }

    let mut sections = Vec::with_capacity(SECTION_COUNT as usize);
    for (id, slot) in SectionId::all().zip(slots) {
        match slot {
            Some(section) => sections.push(section),
            None => bail!("section {} is missing", id.get()),
        }
    }

    let mut sidebar = Vec::with_capacity(raw.sidebar.len());
    for e in raw.sidebar {
        let Some(id) = SectionId::new(e.section) else {
            bail!("sidebar entry {} is outside 1..={}", e.section, SECTION_COUNT);
        };
        if sidebar.iter().any(|s: &SidebarEntry| s.section == id) {
            bail!("sidebar lists section {} twice", e.section);
        }
        if e.title.trim().is_empty() {
            bail!("sidebar entry {} has an empty title", e.section);
        }
        sidebar.push(SidebarEntry {
            section: id,
            number: id.roman(),
            title: e.title,
            subtitle: e.subtitle,
        });
    }
    if sidebar.is_empty() {
        bail!("sidebar is empty");
    }

    Ok(CategoryContent { sidebar, sections })
}

fn check_block(block: &Block) -> anyhow::Result<()> {
    match block {
        Block::Table { columns, rows } => {
            if columns.is_empty() {
                bail!("table without columns");
            }
            for (i, row) in rows.iter().enumerate() {
                if row.len() != columns.len() {
                    bail!(
                        "table row {} has {} cells, expected {}",
                        i,
                        row.len(),
                        columns.len()
                    );
                }
            }
        }
        Block::List { items, .. } if items.is_empty() => bail!("empty list"),
        _ => {}
    }
    Ok(())
}
