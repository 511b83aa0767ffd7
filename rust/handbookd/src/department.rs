use serde::{Deserialize, Serialize};

use crate::session::UserRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Department {
    Elementary,
    JuniorHighSchool,
    SeniorHighSchool,
    College,
}

impl Department {
    pub const ALL: [Department; 4] = [
        Department::Elementary,
        Department::JuniorHighSchool,
        Department::SeniorHighSchool,
        Department::College,
    ];

    /// Matches the exact strings the login flow stores.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "Elementary" => Some(Self::Elementary),
            "Junior High School" => Some(Self::JuniorHighSchool),
            "Senior High School" => Some(Self::SeniorHighSchool),
            "College" => Some(Self::College),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Elementary => "Elementary",
            Self::JuniorHighSchool => "Junior High School",
            Self::SeniorHighSchool => "Senior High School",
            Self::College => "College",
        }
    }

    pub fn category(self) -> Category {
        match self {
            Self::Elementary | Self::JuniorHighSchool | Self::SeniorHighSchool => {
                Category::BasicEducation
            }
            Self::College => Category::College,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Category {
    BasicEducation,
    College,
}

impl Category {
    pub const ALL: [Category; 2] = [Category::BasicEducation, Category::College];

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "basicEducation" => Some(Self::BasicEducation),
            "college" => Some(Self::College),
            _ => None,
        }
    }

    pub fn key(self) -> &'static str {
        match self {
            Self::BasicEducation => "basicEducation",
            Self::College => "college",
        }
    }

    pub(crate) fn index(self) -> usize {
        match self {
            Self::BasicEducation => 0,
            Self::College => 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    Known {
        department: Department,
        category: Category,
    },
    /// No user, no department field, or a value outside the known set.
    Unknown { raw: Option<String> },
}

impl Classification {
    /// Unknown departments read the College pathway.
    pub fn content_category(&self) -> Category {
        match self {
            Self::Known { category, .. } => *category,
            Self::Unknown { .. } => Category::College,
        }
    }

    pub fn is_recognized(&self) -> bool {
        matches!(self, Self::Known { .. })
    }

    pub fn department(&self) -> Option<Department> {
        match self {
            Self::Known { department, .. } => Some(*department),
            Self::Unknown { .. } => None,
        }
    }
}

pub fn classify(user: Option<&UserRecord>) -> Classification {
    let raw = user.and_then(|u| u.department.as_deref());
    match raw.and_then(Department::parse) {
        Some(department) => Classification::Known {
            department,
            category: department.category(),
        },
        None => {
            if user.is_some() {
                tracing::warn!(
                    department = raw.unwrap_or("<absent>"),
                    "unrecognized department, using college content"
                );
            }
            Classification::Unknown {
                raw: raw.map(str::to_string),
            }
        }
    }
}
