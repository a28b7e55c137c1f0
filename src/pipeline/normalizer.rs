//! Profile normalization: validate every field, canonicalize the lists.
//! Either the whole profile comes out clean or nothing does.

use std::collections::HashSet;
use std::str::FromStr;
use tracing::debug;

use crate::error::ValidationError;
use crate::profile::{LearnerProfile, LearningStyle, LooseInt, LooseList, RawProfile};

pub const MIN_AGE: i64 = 4;
pub const MAX_AGE: i64 = 19;
pub const MIN_GRADE: i64 = 1;
pub const MAX_GRADE: i64 = 12;
/// Longest accepted topic or goal, in characters.
pub const MAX_TEXT_CHARS: usize = 200;

/// Validate and canonicalize a raw profile.
///
/// Fields are checked in declaration order and the first offender is reported.
pub fn normalize(raw: &RawProfile) -> Result<LearnerProfile, ValidationError> {
    let age = bounded_int("age", raw.age.as_ref(), MIN_AGE, MAX_AGE)?;
    let grade_level = bounded_int("grade_level", raw.grade_level.as_ref(), MIN_GRADE, MAX_GRADE)?;

    let learning_style = match raw.learning_style.as_deref() {
        Some(s) if !s.trim().is_empty() => LearningStyle::from_str(s)?,
        _ => return Err(ValidationError::new("learning_style", "is required")),
    };

    let known_topics = dedupe_topics("known_topics", &raw.known_topics)?;
    let struggles = dedupe_topics("struggles", &raw.struggles)?;

    let goal = raw.goal.as_deref().map(str::trim).unwrap_or_default();
    if goal.is_empty() {
        return Err(ValidationError::new("goal", "must not be empty"));
    }
    if goal.chars().count() > MAX_TEXT_CHARS {
        return Err(ValidationError::new(
            "goal",
            format!("must be at most {} characters", MAX_TEXT_CHARS),
        ));
    }

    debug!(
        age,
        grade_level,
        style = %learning_style,
        known = known_topics.len(),
        struggles = struggles.len(),
        "Normalized learner profile"
    );

    Ok(LearnerProfile::from_parts(
        age,
        grade_level,
        learning_style,
        known_topics,
        struggles,
        goal.to_string(),
    ))
}

fn bounded_int(
    field: &'static str,
    value: Option<&LooseInt>,
    min: i64,
    max: i64,
) -> Result<u8, ValidationError> {
    let n = match value {
        None => return Err(ValidationError::new(field, "is required")),
        Some(LooseInt::Int(n)) => *n,
        Some(LooseInt::Float(f)) if f.is_finite() && f.fract() == 0.0 => *f as i64,
        Some(LooseInt::Float(f)) => {
            return Err(ValidationError::new(field, format!("{} is not an integer", f)))
        }
        Some(LooseInt::Text(s)) => s
            .trim()
            .parse::<i64>()
            .map_err(|_| ValidationError::new(field, format!("'{}' is not an integer", s)))?,
        Some(LooseInt::Other(v)) => {
            return Err(ValidationError::new(
                field,
                format!("must be an integer, got {}", v),
            ))
        }
    };

    if n <= 0 {
        return Err(ValidationError::new(
            field,
            format!("must be positive, got {}", n),
        ));
    }
    if n < min || n > max {
        return Err(ValidationError::new(
            field,
            format!("{} is outside the plausible range {}..={}", n, min, max),
        ));
    }

    // Bounds above are well inside u8.
    u8::try_from(n).map_err(|_| ValidationError::new(field, format!("{} is out of range", n)))
}

/// Trim entries, drop blanks, and drop case-insensitive duplicates keeping the first.
fn dedupe_topics(field: &'static str, list: &LooseList) -> Result<Vec<String>, ValidationError> {
    let items = list.items().ok_or_else(|| {
        ValidationError::new(
            field,
            "must be a list of strings or a comma-separated string",
        )
    })?;
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for item in items {
        let trimmed = item.trim();
        if trimmed.is_empty() {
            continue;
        }
        if trimmed.chars().count() > MAX_TEXT_CHARS {
            return Err(ValidationError::new(
                field,
                format!("entry exceeds {} characters", MAX_TEXT_CHARS),
            ));
        }
        if seen.insert(trimmed.to_lowercase()) {
            out.push(trimmed.to_string());
        }
    }
    Ok(out)
}
