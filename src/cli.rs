use crate::challenge::fetch::PuzzleClient;
use crate::challenge::generate::{write_solution_file, ModelProvider};
use crate::challenge::store::{challenge_name, write_input_file, ChallengeStore, INPUT_FILE};
use crate::config::settings::AocgenConfig;
use crate::config::types::{EvalError, EvaluationRequest};
use crate::core::Evaluator;
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Cache directory holding challenges.json and config.json
    #[arg(long, global = true)]
    cache_dir: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List cached challenges and their solution languages
    List,
    /// Download a puzzle description and input into the cache
    Download {
        #[arg(long)]
        day: u32,
        #[arg(long)]
        year: u32,
        #[arg(long, default_value_t = 1)]
        part: u32,
        /// Session cookie of a logged-in account
        #[arg(long, env = "AOC_SESSION")]
        session: String,
    },
    /// Generate a solution with a model and write it next to input.txt
    Generate {
        #[arg(long)]
        day: u32,
        #[arg(long)]
        part: u32,
        #[arg(long)]
        year: u32,
        #[arg(long)]
        lang: String,
        /// gpt-*, ollama/<model> or test
        #[arg(long)]
        model: String,
        /// Chat-completion endpoint overriding the provider default
        #[arg(long)]
        model_api: Option<String>,
        /// Directory for input.txt and the solution file
        #[arg(long, default_value = ".")]
        dir: PathBuf,
    },
    /// Run a solution and compare its output with the cached answer
    Eval {
        #[arg(long)]
        day: u32,
        #[arg(long)]
        part: u32,
        #[arg(long)]
        year: u32,
        #[arg(long)]
        lang: String,
        /// Wall-clock budget in seconds
        #[arg(long)]
        timeout: Option<u64>,
        /// Directory holding the solution; also its working directory
        #[arg(long, default_value = ".")]
        dir: PathBuf,
    },
}

pub fn run() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let config = AocgenConfig::load(cli.cache_dir).context("failed to load configuration")?;
    let store = ChallengeStore::new(&config.cache_dir);

    match cli.command {
        Commands::List => {
            let listing = store.listing().context("error loading challenges")?;
            if listing.is_empty() {
                println!("No challenges found in {}", store.path().display());
            }
            for (name, lang) in listing {
                println!("{} {}", name, lang);
            }
        }
        Commands::Download {
            day,
            year,
            part,
            session,
        } => {
            let client = PuzzleClient::new(&config.puzzle_base_url, session)?;
            let challenge = client
                .download(day, part, year)
                .with_context(|| format!("failed to download day {} of {}", day, year))?;
            store.upsert(challenge).context("error saving challenge")?;
            println!("Challenge downloaded and saved successfully!");
        }
        Commands::Generate {
            day,
            part,
            year,
            lang,
            model,
            model_api,
            dir,
        } => {
            let name = challenge_name(day, part, year);
            let challenge = store
                .find(&name)
                .with_context(|| format!("error finding challenge {}", name))?;
            let evaluator = Evaluator::from_config(&config);
            let extension = evaluator.registry().extension_for(&lang)?.to_string();

            let api_url = model_api.or_else(|| config.model_api.clone());
            let provider = ModelProvider::from_model(&model, api_url.as_deref())?;

            write_input_file(&dir, &challenge).context("error creating input file")?;
            let code = provider
                .generate(&challenge, &lang)
                .context("error generating code with model")?;
            let path = write_solution_file(&dir, &challenge, &extension, &code)
                .context("failed to write solution file")?;
            println!("Challenge files created successfully! ({})", path.display());
        }
        Commands::Eval {
            day,
            part,
            year,
            lang,
            timeout,
            dir,
        } => {
            let name = challenge_name(day, part, year);
            let challenge = store
                .find(&name)
                .with_context(|| format!("error finding challenge {}", name))?;
            let evaluator = Evaluator::from_config(&config);
            let extension = evaluator.registry().extension_for(&lang)?;
            let source = dir.join(format!("{}.{}", name, extension));

            if !dir.join(INPUT_FILE).exists() {
                write_input_file(&dir, &challenge).context("error creating input file")?;
            }

            let timeout = timeout.map(Duration::from_secs).unwrap_or(config.timeout());
            let request = EvaluationRequest::new(source, lang, challenge.answer, timeout)
                .with_working_dir(&dir);

            match evaluator.evaluate(&request) {
                Ok(verdict) if verdict.matched => {
                    println!("Solution is correct!\nOutput: {}", verdict.raw_output)
                }
                Ok(verdict) => println!("Solution is incorrect.\nOutput: {}", verdict.raw_output),
                Err(e @ (EvalError::Timeout { .. } | EvalError::Execution { .. })) => {
                    if let Some(output) = e.raw_output().filter(|o| !o.is_empty()) {
                        println!("Output: {}", output);
                    }
                    return Err(e).context("error evaluating solution");
                }
                Err(e) => return Err(e).context("error evaluating solution"),
            }
        }
    }

    Ok(())
}
