//! Learner profile types: the loose input shape and the canonical profile.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

use crate::error::ValidationError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LearningStyle {
    Visual,
    Auditory,
    Kinesthetic,
    ReadWrite,
}

impl LearningStyle {
    pub fn as_str(&self) -> &'static str {
        match self {
            LearningStyle::Visual => "visual",
            LearningStyle::Auditory => "auditory",
            LearningStyle::Kinesthetic => "kinesthetic",
            LearningStyle::ReadWrite => "read_write",
        }
    }

    pub fn all() -> [LearningStyle; 4] {
        [
            LearningStyle::Visual,
            LearningStyle::Auditory,
            LearningStyle::Kinesthetic,
            LearningStyle::ReadWrite,
        ]
    }

    /// Only visual learners get a supplementary resource link.
    pub fn wants_resource_link(&self) -> bool {
        matches!(self, LearningStyle::Visual)
    }
}

impl fmt::Display for LearningStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LearningStyle {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key: String = s
            .trim()
            .to_lowercase()
            .chars()
            .map(|c| if matches!(c, '-' | '/' | ' ') { '_' } else { c })
            .collect();
        match key.as_str() {
            "visual" => Ok(LearningStyle::Visual),
            "auditory" => Ok(LearningStyle::Auditory),
            "kinesthetic" => Ok(LearningStyle::Kinesthetic),
            "read_write" | "readwrite" => Ok(LearningStyle::ReadWrite),
            _ => Err(ValidationError::new(
                "learning_style",
                format!(
                    "unknown learning style '{}' (expected one of: visual, auditory, kinesthetic, read_write)",
                    s.trim()
                ),
            )),
        }
    }
}

/// An integer that may arrive as a JSON number or a numeric string.
///
/// Anything else lands in `Other` so the normalizer can reject it by field name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LooseInt {
    Int(i64),
    Float(f64),
    Text(String),
    Other(Value),
}

impl From<i64> for LooseInt {
    fn from(v: i64) -> Self {
        LooseInt::Int(v)
    }
}

/// A topic list that may arrive as an array or a comma-separated string.
///
/// `null` and unsupported shapes land in `Other`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LooseList {
    List(Vec<String>),
    Csv(String),
    Other(Value),
}

impl Default for LooseList {
    fn default() -> Self {
        LooseList::List(Vec::new())
    }
}

impl LooseList {
    /// Raw entries, or `None` when the value is not text at all. `null` counts as empty.
    pub fn items(&self) -> Option<Vec<&str>> {
        match self {
            LooseList::List(items) => Some(items.iter().map(String::as_str).collect()),
            LooseList::Csv(s) => Some(s.split(',').collect()),
            LooseList::Other(Value::Null) => Some(Vec::new()),
            LooseList::Other(_) => None,
        }
    }
}

impl From<Vec<String>> for LooseList {
    fn from(items: Vec<String>) -> Self {
        LooseList::List(items)
    }
}

/// Profile exactly as supplied by a caller, before normalization.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawProfile {
    #[serde(default)]
    pub age: Option<LooseInt>,
    #[serde(default)]
    pub grade_level: Option<LooseInt>,
    #[serde(default)]
    pub learning_style: Option<String>,
    #[serde(default)]
    pub known_topics: LooseList,
    #[serde(default)]
    pub struggles: LooseList,
    #[serde(default)]
    pub goal: Option<String>,
}

/// Canonical, validated learner profile.
///
/// Built only by [`crate::pipeline::normalizer::normalize`]; read-only afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LearnerProfile {
    age: u8,
    grade_level: u8,
    learning_style: LearningStyle,
    known_topics: Vec<String>,
    struggles: Vec<String>,
    goal: String,
}

impl LearnerProfile {
    pub(crate) fn from_parts(
        age: u8,
        grade_level: u8,
        learning_style: LearningStyle,
        known_topics: Vec<String>,
        struggles: Vec<String>,
        goal: String,
    ) -> Self {
        Self {
            age,
            grade_level,
            learning_style,
            known_topics,
            struggles,
            goal,
        }
    }

    pub fn age(&self) -> u8 {
        self.age
    }

    pub fn grade_level(&self) -> u8 {
        self.grade_level
    }

    pub fn learning_style(&self) -> LearningStyle {
        self.learning_style
    }

    pub fn known_topics(&self) -> &[String] {
        &self.known_topics
    }

    pub fn struggles(&self) -> &[String] {
        &self.struggles
    }

    pub fn goal(&self) -> &str {
        &self.goal
    }
}
