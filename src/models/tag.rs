//! Tag models: languages, frameworks, tools and fundamentals topics.

use serde::{Deserialize, Serialize};

/// The four kinds of topic a course can be tagged with.
///
/// Each kind lives in its own table and is linked to courses through its own
/// join table; the SQL identifiers below are static and safe to splice into
/// composed queries.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum TagKind {
    Language,
    Framework,
    Tool,
    Fundamentals,
}

impl TagKind {
    pub const ALL: [TagKind; 4] = [
        TagKind::Language,
        TagKind::Framework,
        TagKind::Tool,
        TagKind::Fundamentals,
    ];

    /// Entity table.
    pub fn table(&self) -> &'static str {
        match self {
            TagKind::Language => "languages",
            TagKind::Framework => "frameworks",
            TagKind::Tool => "tools",
            TagKind::Fundamentals => "fundamentals",
        }
    }

    /// Join table linking courses to this kind.
    pub fn join_table(&self) -> &'static str {
        match self {
            TagKind::Language => "course_languages",
            TagKind::Framework => "course_frameworks",
            TagKind::Tool => "course_tools",
            TagKind::Fundamentals => "course_fundamentals",
        }
    }

    /// Foreign key column in the join table.
    pub fn foreign_key(&self) -> &'static str {
        match self {
            TagKind::Language => "language_id",
            TagKind::Framework => "framework_id",
            TagKind::Tool => "tool_id",
            TagKind::Fundamentals => "fundamental_id",
        }
    }

    /// Short alias used for the entity table in composed queries.
    pub fn alias(&self) -> &'static str {
        match self {
            TagKind::Language => "lang",
            TagKind::Framework => "fw",
            TagKind::Tool => "tool",
            TagKind::Fundamentals => "fund",
        }
    }

    /// Parse the plural path segment used by the REST API.
    pub fn from_path(segment: &str) -> Option<Self> {
        match segment {
            "languages" => Some(TagKind::Language),
            "frameworks" => Some(TagKind::Framework),
            "tools" => Some(TagKind::Tool),
            "fundamentals" => Some(TagKind::Fundamentals),
            _ => None,
        }
    }
}

/// A named topic entity.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Tag {
    pub id: String,
    pub kind: TagKind,
    pub name: String,
}

/// Request body for creating a tag.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTagRequest {
    pub name: String,
}
