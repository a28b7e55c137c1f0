use anyhow::Result;
use std::env;

use crate::config::Config;

struct CheckResult {
    passed: Vec<String>,
    warnings: Vec<String>,
    errors: Vec<String>,
}

impl CheckResult {
    fn new() -> Self {
        Self {
            passed: Vec::new(),
            warnings: Vec::new(),
            errors: Vec::new(),
        }
    }

    fn pass(&mut self, msg: impl Into<String>) {
        self.passed.push(msg.into());
    }

    fn warn(&mut self, msg: impl Into<String>) {
        self.warnings.push(msg.into());
    }

    fn error(&mut self, msg: impl Into<String>) {
        self.errors.push(msg.into());
    }
}

/// Print the effective configuration and report whether it is usable.
pub fn run(config_path: Option<String>) -> Result<()> {
    let mut results = CheckResult::new();

    let mut config = match Config::load_with_path(config_path.clone()) {
        Ok(config) => {
            let source = config_path.as_deref().unwrap_or("default search path");
            results.pass(format!("Config loaded from {}", source));
            config
        }
        Err(e) => {
            // Reported, not propagated: this is a diagnostic command
            results.error(format!("Failed to load config: {:#}", e));
            print_results(&results);
            return Ok(());
        }
    };

    if let Err(e) = config.apply_env_overrides() {
        results.error(format!("Environment override rejected: {}", e));
    }

    println!("{}", toml::to_string_pretty(&config)?);

    check_config(&config, &mut results);
    print_results(&results);
    Ok(())
}

fn check_config(config: &Config, results: &mut CheckResult) {
    match config.llm.provider.as_str() {
        "openai" | "anthropic" => results.pass(format!(
            "LLM provider: {} (model: {})",
            config.llm.provider, config.llm.model
        )),
        "openai-compatible" => {
            results.pass(format!(
                "LLM provider: {} (model: {})",
                config.llm.provider, config.llm.model
            ));
            if config.llm.base_url.is_none() {
                results.warn(
                    "openai-compatible provider without base_url, will use http://localhost:11434/v1",
                );
            }
        }
        other => results.error(format!(
            "Unknown LLM provider '{}' (expected openai, openai-compatible or anthropic)",
            other
        )),
    }

    check_api_key(config, results);

    match config.validate() {
        Ok(()) => {
            let g = &config.generation;
            results.pass(format!(
                "Generation: max_attempts={}, lessons {}..={}, questions {}..={} x{} options, timeout {}s",
                g.max_attempts,
                g.min_lessons,
                g.max_lessons,
                g.min_quiz_questions,
                g.max_quiz_questions,
                g.options_per_question,
                g.request_timeout_secs
            ));
        }
        Err(e) => results.error(format!("Invalid settings: {}", e)),
    }
}

fn check_api_key(config: &Config, results: &mut CheckResult) {
    let is_oai_compat = config.llm.provider == "openai-compatible";
    match &config.llm.api_key_env {
        Some(env_var) if env_var.to_lowercase() == "none" => {
            results.pass("API key: not needed");
        }
        Some(env_var) => match env::var(env_var) {
            Ok(v) if !v.trim().is_empty() => {
                results.pass(format!("API key: {} is set", env_var));
            }
            Ok(_) | Err(_) if is_oai_compat => {
                results.warn(format!(
                    "API key: {} is not set (OK for local models, needed for gateways)",
                    env_var
                ));
            }
            Ok(_) => results.error(format!("API key: {} is set but empty", env_var)),
            Err(_) => results.error(format!("API key: {} is not set", env_var)),
        },
        None => results.pass("API key: not configured"),
    }
}

fn print_results(results: &CheckResult) {
    println!();
    for msg in &results.passed {
        println!("  \u{2713} {}", msg);
    }
    for msg in &results.warnings {
        println!("  ! {}", msg);
    }
    for msg in &results.errors {
        println!("  \u{2717} {}", msg);
    }
    println!();
    println!(
        "{} passed, {} warnings, {} errors",
        results.passed.len(),
        results.warnings.len(),
        results.errors.len()
    );
}
