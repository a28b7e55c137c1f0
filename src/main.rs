use anyhow::Result;
use clap::{Parser, Subcommand};

use seek::cli;
use seek::cli::generate::ProfileInput;

#[derive(Parser)]
#[command(name = "seek", version)]
#[command(about = "Generate personalized learning plans for young learners", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a roadmap, quiz and explanation for one learner
    Generate {
        /// Learner age in years
        #[arg(long)]
        age: Option<String>,

        /// School grade level
        #[arg(long)]
        grade_level: Option<String>,

        /// visual, auditory, kinesthetic or read_write
        #[arg(long)]
        learning_style: Option<String>,

        /// Comma-separated topics the learner already knows
        #[arg(long)]
        known_topics: Option<String>,

        /// Comma-separated topics the learner struggles with
        #[arg(long)]
        struggles: Option<String>,

        /// What the learner wants to understand
        #[arg(long)]
        goal: Option<String>,

        /// JSON file with the learner profile (flags override its fields)
        #[arg(long)]
        profile: Option<String>,

        /// Write the plan here instead of stdout
        #[arg(short = 'o', long)]
        output: Option<String>,

        /// Pretty-print the JSON output
        #[arg(long)]
        pretty: bool,

        /// Path to config file (defaults to ./seek.toml or ~/.config/seek/config.toml)
        #[arg(long)]
        config: Option<String>,

        /// Override LLM model (e.g., "gpt-4o-mini", "claude-sonnet-4-5")
        #[arg(long)]
        model: Option<String>,

        /// Override attempts per generation call (default: from config)
        #[arg(long)]
        max_attempts: Option<usize>,

        /// Override the whole-request timeout in seconds
        #[arg(long)]
        timeout: Option<u64>,

        /// Use mock LLM client for testing
        #[arg(long)]
        dry_run: bool,
    },

    /// Show the effective configuration and check it
    Config {
        /// Path to config file
        #[arg(long)]
        config: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Generate {
            age,
            grade_level,
            learning_style,
            known_topics,
            struggles,
            goal,
            profile,
            output,
            pretty,
            config,
            model,
            max_attempts,
            timeout,
            dry_run,
        } => {
            let config = cli::load_config(config)?;
            cli::init_logging(&config.logging.level);

            let profile = ProfileInput {
                profile_file: profile,
                age,
                grade_level,
                learning_style,
                known_topics,
                struggles,
                goal,
            };
            cli::generate::run(
                config,
                profile,
                output,
                pretty,
                model,
                max_attempts,
                timeout,
                dry_run,
            )
            .await?;
        }
        Commands::Config { config } => {
            cli::init_logging("warn");
            cli::config_check::run(config)?;
        }
    }

    Ok(())
}
