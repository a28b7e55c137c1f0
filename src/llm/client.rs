use anyhow::Result;
use async_trait::async_trait;

use super::prompts;

/// Generation parameters sent along with every prompt.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionParams {
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub system_prompt: Option<String>,
    /// Ask the provider for a JSON-only response where it supports that.
    pub json_response: bool,
}

/// The single capability consumed from a language-model service:
/// given a prompt and generation parameters, return text.
#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn complete(&self, prompt: &str, params: &CompletionParams) -> Result<String>;
}

/// Deterministic offline client used by `--dry-run`.
pub struct MockLlmClient;

impl Default for MockLlmClient {
    fn default() -> Self {
        Self::new()
    }
}

impl MockLlmClient {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl LlmClient for MockLlmClient {
    async fn complete(&self, prompt: &str, _params: &CompletionParams) -> Result<String> {
        // Route on the task marker each prompt builder emits
        if prompt.contains(prompts::ROADMAP_MARKER) {
            Ok(r#"{
  "lessons": [
    {
      "order": 1,
      "title": "What a Decimal Really Means",
      "description": "Read decimals as tenths and hundredths using place value.",
      "duration": "10 minutes",
      "content": "Draw a place-value chart and shade 0.3 as three tenths."
    },
    {
      "order": 2,
      "title": "From Decimals to Fractions",
      "description": "Write any terminating decimal as a fraction over a power of ten.",
      "duration": "12 minutes"
    },
    {
      "order": 3,
      "title": "Simplifying the Result",
      "description": "Reduce fractions using the greatest common factor.",
      "duration": "10 minutes"
    },
    {
      "order": 4,
      "title": "Percentages as Hundredths",
      "description": "Connect percentages to decimals and fractions.",
      "duration": "15 minutes"
    }
  ]
}"#
            .to_string())
        } else if prompt.contains(prompts::QUIZ_MARKER) {
            Ok(r#"{
  "questions": [
    {
      "prompt": "Which fraction equals 0.5?",
      "options": ["1/5", "1/2", "5/1", "2/5"],
      "correct_index": 1,
      "explanation": "Five tenths simplifies to one half."
    },
    {
      "prompt": "What is 0.25 written as a fraction in simplest form?",
      "options": ["25/10", "1/25", "1/4", "2/5"],
      "correct_index": 2,
      "explanation": "25/100 reduces to 1/4."
    },
    {
      "prompt": "Which decimal equals 3/4?",
      "options": ["0.34", "0.75", "0.43", "3.4"],
      "correct_index": 1
    },
    {
      "prompt": "What percentage is the same as 0.2?",
      "options": ["2%", "20%", "0.2%", "200%"],
      "correct_index": 1
    }
  ]
}"#
            .to_string())
        } else if prompt.contains(prompts::EXPLANATION_MARKER) {
            let link = if prompt.contains(prompts::LINK_REQUIRED) {
                r#""https://www.khanacademy.org/math/arithmetic/fraction-arithmetic""#
            } else {
                "null"
            };
            Ok(format!(
                r#"{{
  "concept": "Converting between decimals and fractions",
  "explanation": "Every decimal is a fraction in disguise. The digits after the point count tenths, hundredths and thousandths, so 0.75 is 75 hundredths, or 75/100, which simplifies to 3/4.",
  "resource_link": {}
}}"#,
                link
            ))
        } else {
            Ok(r#"{"status": "mock"}"#.to_string())
        }
    }
}
