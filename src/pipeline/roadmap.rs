//! Roadmap generation: an ordered run of micro-lessons toward the learner's goal.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

use super::schema::{decode, require_text, take_list, ResponseSchema, SchemaViolation};
use crate::error::GenerationError;
use crate::llm::generation::GenerationClient;
use crate::llm::prompts;
use crate::profile::LearnerProfile;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MicroLesson {
    pub order: u32,
    pub title: String,
    pub description: String,
    pub duration: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

/// Lessons sorted by `order`, which runs exactly `1..=len`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Roadmap(Vec<MicroLesson>);

impl Roadmap {
    pub fn lessons(&self) -> &[MicroLesson] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[derive(Debug, Deserialize)]
struct WireLesson {
    order: u32,
    #[serde(default)]
    title: String,
    #[serde(default)]
    description: String,
    #[serde(default, alias = "estimated_time_minutes")]
    duration: Option<Value>,
    #[serde(default)]
    content: Option<String>,
}

/// Validation rules for one roadmap request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoadmapSchema {
    pub min_lessons: usize,
    pub max_lessons: usize,
}

impl ResponseSchema for RoadmapSchema {
    type Output = Roadmap;

    fn name(&self) -> &'static str {
        "roadmap"
    }

    fn system_prompt(&self) -> Option<&'static str> {
        Some(prompts::ROADMAP_SYSTEM)
    }

    fn validate(&self, value: Value) -> Result<Roadmap, SchemaViolation> {
        let wire: Vec<WireLesson> = decode(take_list(value, "lessons")?, "lessons")?;

        if wire.len() < self.min_lessons || wire.len() > self.max_lessons {
            return Err(SchemaViolation::new(format!(
                "expected {}-{} lessons, got {}",
                self.min_lessons,
                self.max_lessons,
                wire.len()
            )));
        }

        let mut lessons = Vec::with_capacity(wire.len());
        for lesson in wire {
            let at = format!("lesson {}", lesson.order);
            lessons.push(MicroLesson {
                order: lesson.order,
                title: require_text(&lesson.title, &format!("{} title", at))?,
                description: require_text(&lesson.description, &format!("{} description", at))?,
                duration: duration_text(lesson.duration.as_ref(), &at)?,
                content: lesson
                    .content
                    .map(|c| c.trim().to_string())
                    .filter(|c| !c.is_empty()),
            });
        }

        lessons.sort_by_key(|l| l.order);
        for (expected, lesson) in (1u32..).zip(&lessons) {
            if lesson.order != expected {
                let orders: Vec<u32> = lessons.iter().map(|l| l.order).collect();
                return Err(SchemaViolation::new(format!(
                    "lesson orders must be exactly 1..={} with no gaps or repeats, got {:?}",
                    lessons.len(),
                    orders
                )));
            }
        }

        Ok(Roadmap(lessons))
    }
}

/// Durations may come back as text ("10 minutes") or a bare number of minutes.
fn duration_text(value: Option<&Value>, at: &str) -> Result<String, SchemaViolation> {
    match value {
        Some(Value::String(s)) => require_text(s, &format!("{} duration", at)),
        Some(Value::Number(n)) if n.as_f64().is_some_and(|m| m > 0.0) => {
            Ok(format!("{} minutes", n))
        }
        _ => Err(SchemaViolation::new(format!(
            "{} duration must be a non-empty string such as \"10 minutes\"",
            at
        ))),
    }
}

pub struct RoadmapGenerator<'a> {
    client: &'a GenerationClient,
    schema: RoadmapSchema,
    max_attempts: usize,
}

impl<'a> RoadmapGenerator<'a> {
    pub fn new(client: &'a GenerationClient, schema: RoadmapSchema, max_attempts: usize) -> Self {
        Self {
            client,
            schema,
            max_attempts,
        }
    }

    pub async fn generate(&self, profile: &LearnerProfile) -> Result<Roadmap, GenerationError> {
        info!("Generating roadmap for goal: {}", profile.goal());
        let prompt =
            prompts::roadmap_prompt(profile, self.schema.min_lessons, self.schema.max_lessons);
        let roadmap = self
            .client
            .generate(&prompt, &self.schema, self.max_attempts)
            .await?;
        info!("Roadmap ready with {} lessons", roadmap.len());
        Ok(roadmap)
    }
}
