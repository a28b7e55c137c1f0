use anyhow::{Context, Result};
use std::fs;
use tracing::info;

use crate::config::Config;
use crate::llm::factory;
use crate::pipeline::PlanOrchestrator;
use crate::profile::{LooseInt, LooseList, RawProfile};

/// Profile fields as given on the command line, optionally layered over a JSON file.
#[derive(Debug, Default, Clone)]
pub struct ProfileInput {
    pub profile_file: Option<String>,
    pub age: Option<String>,
    pub grade_level: Option<String>,
    pub learning_style: Option<String>,
    pub known_topics: Option<String>,
    pub struggles: Option<String>,
    pub goal: Option<String>,
}

impl ProfileInput {
    /// Flags override fields read from `--profile`.
    pub fn into_raw(self) -> Result<RawProfile> {
        let mut raw = match &self.profile_file {
            Some(path) => {
                let content = fs::read_to_string(path)
                    .with_context(|| format!("failed to read profile file {}", path))?;
                serde_json::from_str::<RawProfile>(&content)
                    .with_context(|| format!("failed to parse profile file {}", path))?
            }
            None => RawProfile::default(),
        };

        if let Some(age) = self.age {
            raw.age = Some(LooseInt::Text(age));
        }
        if let Some(grade) = self.grade_level {
            raw.grade_level = Some(LooseInt::Text(grade));
        }
        if let Some(style) = self.learning_style {
            raw.learning_style = Some(style);
        }
        if let Some(topics) = self.known_topics {
            raw.known_topics = LooseList::Csv(topics);
        }
        if let Some(struggles) = self.struggles {
            raw.struggles = LooseList::Csv(struggles);
        }
        if let Some(goal) = self.goal {
            raw.goal = Some(goal);
        }
        Ok(raw)
    }
}

#[allow(clippy::too_many_arguments)]
pub async fn run(
    mut config: Config,
    profile: ProfileInput,
    output: Option<String>,
    pretty: bool,
    model_override: Option<String>,
    max_attempts_override: Option<usize>,
    timeout_override: Option<u64>,
    dry_run: bool,
) -> Result<()> {
    // Apply CLI overrides
    if let Some(ref model) = model_override {
        info!("CLI override: model = {}", model);
        config.llm.model = model.clone();
    }
    if let Some(attempts) = max_attempts_override {
        info!("CLI override: max_attempts = {}", attempts);
        config.generation.max_attempts = attempts;
    }
    if let Some(timeout) = timeout_override {
        info!("CLI override: request_timeout = {}s", timeout);
        config.generation.request_timeout_secs = timeout;
    }
    let raw = profile.into_raw()?;
    info!("Provider: {} (model: {})", config.llm.provider, config.llm.model);
    info!("Dry run: {}", dry_run);

    let client = factory::create_client(&config, dry_run)?;
    let orchestrator = PlanOrchestrator::try_new(client, &config)?;
    let plan = orchestrator.generate_plan(&raw).await?;

    let response = plan.response();
    let json = if pretty {
        serde_json::to_string_pretty(&response)?
    } else {
        serde_json::to_string(&response)?
    };

    match output {
        Some(path) => {
            fs::write(&path, format!("{}\n", json))
                .with_context(|| format!("failed to write {}", path))?;
            info!("✓ Learning plan written to {}", path);
        }
        None => println!("{}", json),
    }

    Ok(())
}
