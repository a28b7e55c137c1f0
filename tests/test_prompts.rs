use seek::llm::prompts::{
    explanation_prompt, quiz_prompt, roadmap_prompt, style_guidance, with_correction,
    CORRECTION_HEADER, EXPLANATION_MARKER, LINK_FORBIDDEN, LINK_REQUIRED, QUIZ_MARKER,
    ROADMAP_MARKER,
};
use seek::pipeline::normalizer::normalize;
use seek::profile::{LearnerProfile, LearningStyle, RawProfile};

fn learner(style: &str) -> LearnerProfile {
    normalize(&RawProfile {
        age: Some(10.into()),
        grade_level: Some(5.into()),
        learning_style: Some(style.to_string()),
        known_topics: vec!["multiplication".to_string(), "division".to_string()].into(),
        struggles: vec!["long division".to_string()].into(),
        goal: Some("understand fractions of a set".to_string()),
    })
    .unwrap()
}

#[test]
fn test_every_stage_prompt_starts_with_its_marker() {
    let p = learner("visual");
    assert!(roadmap_prompt(&p, 3, 5).starts_with(ROADMAP_MARKER));
    assert!(quiz_prompt(&p, 3, 5, 4).starts_with(QUIZ_MARKER));
    assert!(explanation_prompt(&p).starts_with(EXPLANATION_MARKER));
}

#[test]
fn test_markers_are_distinct_across_stages() {
    let p = learner("visual");
    let roadmap = roadmap_prompt(&p, 3, 5);
    let quiz = quiz_prompt(&p, 3, 5, 4);
    let explanation = explanation_prompt(&p);

    assert!(!roadmap.contains(QUIZ_MARKER) && !roadmap.contains(EXPLANATION_MARKER));
    assert!(!quiz.contains(ROADMAP_MARKER) && !quiz.contains(EXPLANATION_MARKER));
    assert!(!explanation.contains(ROADMAP_MARKER) && !explanation.contains(QUIZ_MARKER));
}

#[test]
fn test_prompts_embed_the_whole_profile() {
    let p = learner("auditory");
    for prompt in [
        roadmap_prompt(&p, 3, 5),
        quiz_prompt(&p, 3, 5, 4),
        explanation_prompt(&p),
    ] {
        assert!(prompt.contains("Age: 10"));
        assert!(prompt.contains("Grade level: 5"));
        assert!(prompt.contains("auditory"));
        assert!(prompt.contains("multiplication, division"));
        assert!(prompt.contains("long division"));
        assert!(prompt.contains("understand fractions of a set"));
    }
}

#[test]
fn test_roadmap_prompt_respects_configured_bounds() {
    let prompt = roadmap_prompt(&learner("visual"), 2, 7);
    assert!(prompt.contains("Create a roadmap of 2-7 micro-lessons"));
    assert!(prompt.contains("Between 2 and 7 lessons"));
}

#[test]
fn test_quiz_prompt_requests_single_correct_option() {
    let prompt = quiz_prompt(&learner("kinesthetic"), 4, 4, 5);
    assert!(prompt.contains("Between 4 and 4 questions"));
    assert!(prompt.contains("exactly 5 answer options and exactly one correct option"));
    assert!(prompt.contains("correct_index"));
    assert!(prompt.contains("options within a question must all be different"));
}

#[test]
fn test_explanation_link_rule_by_style() {
    for style in LearningStyle::all() {
        let prompt = explanation_prompt(&learner(style.as_str()));
        if style == LearningStyle::Visual {
            assert!(prompt.contains(LINK_REQUIRED), "{} should require a link", style);
            assert!(
                !prompt.contains("\"resource_link\": null"),
                "{} shape must not show a null link",
                style
            );
        } else {
            assert!(prompt.contains(LINK_FORBIDDEN), "{} should forbid a link", style);
            assert!(prompt.contains("\"resource_link\": null"));
        }
    }
}

#[test]
fn test_style_guidance_differs_per_style() {
    let all: Vec<&str> = LearningStyle::all()
        .into_iter()
        .map(style_guidance)
        .collect();
    for (i, a) in all.iter().enumerate() {
        for b in &all[i + 1..] {
            assert_ne!(a, b);
        }
    }
}

#[test]
fn test_correction_keeps_base_prompt_and_quotes_violation() {
    let base = roadmap_prompt(&learner("visual"), 3, 5);
    let corrected = with_correction(&base, "expected 3-5 lessons, got 9");
    assert!(corrected.starts_with(&base));
    assert!(corrected.contains(CORRECTION_HEADER));
    assert!(corrected.contains("expected 3-5 lessons, got 9"));
    assert!(corrected.starts_with(ROADMAP_MARKER));
}
