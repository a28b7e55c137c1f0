// Prompt builders for the three generation stages.
//
// Every prompt starts with a task marker line so fakes and the dry-run client
// can tell the stages apart without parsing prose.

use crate::profile::{LearnerProfile, LearningStyle};

pub const ROADMAP_MARKER: &str = "TASK: personalized learning roadmap";
pub const QUIZ_MARKER: &str = "TASK: personalized multiple-choice quiz";
pub const EXPLANATION_MARKER: &str = "TASK: personalized concept explanation";
pub const LINK_REQUIRED: &str = "RESOURCE LINK: REQUIRED";
pub const LINK_FORBIDDEN: &str = "RESOURCE LINK: NOT ALLOWED";
pub const CORRECTION_HEADER: &str = "YOUR PREVIOUS RESPONSE WAS REJECTED";

pub const ROADMAP_SYSTEM: &str = "You are an expert educational content creator specializing in \
personalized learning paths. Create engaging, age-appropriate micro-lessons that match the \
student's learning style and build toward their specific goal. Always respond with valid JSON only.";

pub const QUIZ_SYSTEM: &str = "You are an expert educational assessment creator. Write clear, \
age-appropriate multiple-choice questions that test understanding rather than memorization. \
Always respond with valid JSON only.";

pub const EXPLANATION_SYSTEM: &str = "You are an expert educator who writes personalized \
explanations that match a student's learning style and build on what they already know. \
Always respond with valid JSON only.";

fn list_or_none(items: &[String]) -> String {
    if items.is_empty() {
        "(none listed)".to_string()
    } else {
        items.join(", ")
    }
}

fn student_block(profile: &LearnerProfile) -> String {
    format!(
        "STUDENT INFORMATION:\n\
         - Age: {}\n\
         - Grade level: {}\n\
         - Learning style: {}\n\
         - Topics they already know (prerequisites to build on): {}\n\
         - Topics they struggle with (need extra scaffolding): {}\n\
         - Learning goal: {}",
        profile.age(),
        profile.grade_level(),
        profile.learning_style(),
        list_or_none(profile.known_topics()),
        list_or_none(profile.struggles()),
        profile.goal()
    )
}

/// Style-specific phrasing guidance shared by all three stages.
pub fn style_guidance(style: LearningStyle) -> &'static str {
    match style {
        LearningStyle::Visual => {
            "- Use visual language and metaphors\n\
             - Describe diagrams, charts and images the student could draw\n\
             - Use spatial relationships and visual organization\n\
             - Reference colors, shapes and patterns when relevant"
        }
        LearningStyle::Auditory => {
            "- Use rhythmic language and mnemonics\n\
             - Include dialogue and discussion elements\n\
             - Suggest saying concepts aloud or explaining them to someone\n\
             - Emphasize listening and verbal repetition"
        }
        LearningStyle::Kinesthetic => {
            "- Include hands-on activities and physical metaphors\n\
             - Suggest physical actions to practice each concept\n\
             - Use examples involving movement or manipulating objects\n\
             - Encourage learning by doing"
        }
        LearningStyle::ReadWrite => {
            "- Use clear, concise written explanations\n\
             - Suggest note-taking strategies and written exercises\n\
             - Include lists, definitions and key terms\n\
             - Encourage summarizing concepts in writing"
        }
    }
}

pub fn roadmap_prompt(profile: &LearnerProfile, min_lessons: usize, max_lessons: usize) -> String {
    format!(
        r#"{marker}

Create a roadmap of {min}-{max} micro-lessons that moves this student toward their goal.

{student}

LEARNING STYLE GUIDANCE (apply to lesson titles and descriptions):
{guidance}

REQUIREMENTS:
- Between {min} and {max} lessons, sequenced so each builds on the previous one
- Start from the topics the student already knows; give each struggle its own scaffolded step
- "order" starts at 1 and increases by exactly 1 per lesson
- Every lesson has a non-empty title, description and duration (5-15 minutes each)
- "content" is optional: a short body teaching the concept at the student's level

Respond with a JSON object of exactly this shape:
{{
  "lessons": [
    {{"order": 1, "title": "Lesson title", "description": "What will be learned", "duration": "10 minutes", "content": "Lesson body"}}
  ]
}}"#,
        marker = ROADMAP_MARKER,
        min = min_lessons,
        max = max_lessons,
        student = student_block(profile),
        guidance = style_guidance(profile.learning_style()),
    )
}

pub fn quiz_prompt(
    profile: &LearnerProfile,
    min_questions: usize,
    max_questions: usize,
    options_per_question: usize,
) -> String {
    format!(
        r#"{marker}

Write {min}-{max} multiple-choice questions that check the student's understanding of their goal,
with extra attention to the topics they struggle with.

{student}

REQUIREMENTS:
- Between {min} and {max} questions, varying in difficulty
- Each question has exactly {options} answer options and exactly one correct option
- "correct_index" is the 0-based position of the correct option
- The options within a question must all be different
- No two questions may ask the same thing
- Use age-appropriate language and examples
- "explanation" is optional: one sentence on why the correct answer is right

Respond with a JSON object of exactly this shape:
{{
  "questions": [
    {{"prompt": "Question text?", "options": [{option_list}], "correct_index": 0, "explanation": "Why"}}
  ]
}}"#,
        marker = QUIZ_MARKER,
        min = min_questions,
        max = max_questions,
        options = options_per_question,
        student = student_block(profile),
        option_list = (1..=options_per_question)
            .map(|i| format!("\"Option {}\"", i))
            .collect::<Vec<_>>()
            .join(", "),
    )
}

pub fn explanation_prompt(profile: &LearnerProfile) -> String {
    let style = profile.learning_style();
    let (link_rule, link_shape) = if style.wants_resource_link() {
        let rule = format!(
            "{}\n- \"resource_link\" MUST be an absolute https URL to a reputable, free visual resource \
             (diagrams, videos or interactive visualizations) on this topic",
            LINK_REQUIRED
        );
        (rule, "\"https://...\"")
    } else {
        let rule = format!("{}\n- \"resource_link\" MUST be null", LINK_FORBIDDEN);
        (rule, "null")
    };

    format!(
        r#"{marker}

Explain the concept behind the student's learning goal directly to the student.

{student}

GUIDELINES FOR THE EXPLANATION:
{guidance}
- Use language suited to a {age}-year-old in grade {grade}
- Connect to topics the student already knows when possible
- Address the specific struggles listed above
- Roughly 300-500 words, friendly and clear

{link_rule}

Respond with a JSON object of exactly this shape:
{{
  "concept": "The concept being explained",
  "explanation": "The personalized explanation",
  "resource_link": {link_shape}
}}"#,
        marker = EXPLANATION_MARKER,
        student = student_block(profile),
        guidance = style_guidance(style),
        age = profile.age(),
        grade = profile.grade_level(),
        link_rule = link_rule,
        link_shape = link_shape,
    )
}

/// Append a correction block after a rejected response.
pub fn with_correction(prompt: &str, violation: &str) -> String {
    format!(
        "{}\n\n{}:\n- {}\n\nRespond again with ONLY a JSON object that satisfies every requirement above. \
         Do not include commentary or markdown fences.",
        prompt, CORRECTION_HEADER, violation
    )
}
