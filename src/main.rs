use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use tracing::info;

use biorank::config::{Config, EmbedderBackend};
use biorank::embeddings::traits::EmbeddingProvider;
use biorank::taxonomy::RunConfig;

/// biorank: rank biographical records against topic taxonomies.
///
/// Scores each record's free text against rewarded ("target") and penalized
/// ("avoid") categories using fuzzy phrase matching and sentence embeddings.
#[derive(Parser)]
#[command(name = "biorank", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Score and rank every record in one or more group files
    Score {
        /// Group files (default: faculty_data_*.json in the current directory)
        inputs: Vec<PathBuf>,

        /// Group id for a single input (default: derived from the file name)
        #[arg(long)]
        group: Option<String>,

        /// Run config JSON (default: built-in history taxonomy)
        #[arg(long)]
        taxonomy: Option<PathBuf>,

        /// Directory for result files (default: BIORANK_OUTPUT_DIR or ./output)
        #[arg(long)]
        output_dir: Option<PathBuf>,

        /// Number of records to embed in parallel (default: 8)
        #[arg(long, default_value = "8")]
        concurrency: u32,

        /// How many records to show at each end of the ranking (default: 10)
        #[arg(long, default_value = "10")]
        top: u32,
    },

    /// Score a single piece of text and show the per-category breakdown
    Explain {
        /// Text to score (or use --file)
        text: Option<String>,

        /// Read the text from a file instead
        #[arg(long, conflicts_with = "text")]
        file: Option<PathBuf>,

        /// Run config JSON (default: built-in history taxonomy)
        #[arg(long)]
        taxonomy: Option<PathBuf>,
    },

    /// Merge group files into one JSON array tagged with each record's group
    Combine {
        /// Group files (default: faculty_data_*.json in the current directory)
        inputs: Vec<PathBuf>,

        /// Destination file
        #[arg(long, default_value = "combined_faculty_data.json")]
        output: PathBuf,
    },

    /// Show the active taxonomy and weights
    Taxonomy {
        /// Run config JSON (default: built-in history taxonomy)
        #[arg(long)]
        taxonomy: Option<PathBuf>,

        /// Print the resolved config as JSON instead
        #[arg(long)]
        json: bool,
    },

    /// Download the local sentence embedding model (~90 MB)
    DownloadModel,

    /// Show embedder, model, input, and taxonomy status
    Status {
        /// Run config JSON to validate (default: built-in history taxonomy)
        #[arg(long)]
        taxonomy: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if missing)
    let _ = dotenvy::dotenv();

    // Set up structured logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("biorank=info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Score {
            inputs,
            group,
            taxonomy,
            output_dir,
            concurrency,
            top,
        } => {
            let config = Config::load()?;
            config.require_embedder()?;
            let run_config = load_run_config(taxonomy.as_deref())?;

            let inputs = resolve_inputs(inputs)?;
            if group.is_some() && inputs.len() > 1 {
                anyhow::bail!("--group can only be used with a single input file");
            }

            let groups = inputs
                .iter()
                .map(|path| biorank::records::group::load_group(path, group.as_deref()))
                .collect::<Result<Vec<_>>>()?;
            biorank::records::group::ensure_unique_groups(&groups)?;
            let record_count: usize = groups.iter().map(|g| g.records.len()).sum();

            let embedder = create_embedder(&config)?;
            println!(
                "Scoring {record_count} records in {} group(s) with {} ({concurrency} concurrent)...",
                groups.len(),
                embedder.model_name(),
            );

            let options = biorank::pipeline::BatchOptions {
                concurrency: concurrency.max(1) as usize,
                show_progress: true,
            };
            let outcome =
                biorank::pipeline::run(&groups, &run_config, embedder.as_ref(), options).await?;

            let output_dir = output_dir.unwrap_or_else(|| config.output_dir.clone());
            let written = biorank::output::report::write_outcome(&outcome, &output_dir)?;

            let all = outcome.all_scores();
            let n = top as usize;
            biorank::output::terminal::display_summary(&outcome);
            biorank::output::terminal::display_ranked(
                "Highest Scores",
                &biorank::pipeline::top(&all, n),
            );
            biorank::output::terminal::display_ranked(
                "Lowest Scores",
                &biorank::pipeline::bottom(&all, n),
            );

            println!("{}", "Results written:".bold());
            for path in written {
                println!("  {}", path.display());
            }
        }

        Commands::Explain {
            text,
            file,
            taxonomy,
        } => {
            let config = Config::load()?;
            config.require_embedder()?;
            let run_config = load_run_config(taxonomy.as_deref())?;

            let text = match (text, file) {
                (Some(text), _) => text,
                (None, Some(path)) => std::fs::read_to_string(&path)
                    .with_context(|| format!("Failed to read {}", path.display()))?,
                (None, None) => anyhow::bail!("Provide the text to score or --file <path>"),
            };

            let embedder = create_embedder(&config)?;
            let prepared = biorank::pipeline::prepare(&run_config, embedder.as_ref()).await?;
            let record = biorank::records::Record::new("").with_field("text", text);
            let mut explain_config = run_config.clone();
            explain_config.text_fields = vec!["text".to_string()];
            explain_config.group_fields.clear();

            let score = biorank::pipeline::score_record(
                &record,
                "",
                &prepared,
                &explain_config,
                embedder.as_ref(),
            )
            .await;
            biorank::output::terminal::display_record_detail(&score);
        }

        Commands::Combine { inputs, output } => {
            let inputs = resolve_inputs(inputs)?;
            let combined = biorank::records::group::combine(&inputs)?;
            biorank::output::report::write_json(&output, &combined)?;
            println!(
                "Combined {} records from {} file(s) into {}",
                combined.len(),
                inputs.len(),
                output.display()
            );
        }

        Commands::Taxonomy { taxonomy, json } => {
            let run_config = load_run_config(taxonomy.as_deref())?;
            if json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&run_config)
                        .context("Failed to serialize run config")?
                );
            } else {
                run_config.display();
            }
        }

        Commands::DownloadModel => {
            let config = Config::load()?;
            let model_dir = &config.model_dir;

            println!("Downloading embedding model...");
            println!("  Destination: {}", model_dir.display());

            biorank::embeddings::download::download_embedding_model(model_dir).await?;

            println!("\n{}", "Model downloaded successfully.".bold());
            println!("You can now run `biorank score`.");
        }

        Commands::Status { taxonomy } => {
            let config = Config::load()?;
            biorank::status::show(&config, taxonomy.as_deref(), Path::new("."))?;
        }
    }

    Ok(())
}

/// Load the run config from a file, or the built-in taxonomy.
fn load_run_config(path: Option<&Path>) -> Result<RunConfig> {
    match path {
        Some(path) => {
            info!(path = %path.display(), "Loading taxonomy config");
            RunConfig::from_file(path)
        }
        None => RunConfig::builtin(),
    }
}

/// Use the given inputs, or discover group files in the current directory.
fn resolve_inputs(inputs: Vec<PathBuf>) -> Result<Vec<PathBuf>> {
    if !inputs.is_empty() {
        return Ok(inputs);
    }
    let found = biorank::records::group::discover_inputs(Path::new("."))?;
    if found.is_empty() {
        anyhow::bail!(
            "No input files given and no faculty_data_*.json files found in the current directory"
        );
    }
    Ok(found)
}

/// Create the embedding provider for the configured backend.
fn create_embedder(config: &Config) -> Result<Box<dyn EmbeddingProvider>> {
    match config.embedder {
        EmbedderBackend::Onnx => {
            info!("Using local ONNX embedding model");
            let dir = biorank::embeddings::download::embedding_model_dir(&config.model_dir);
            let mut embedder = biorank::embeddings::onnx::OnnxEmbedder::load(&dir)?;
            if let Some(chars) = config.chunk_chars {
                embedder = embedder.with_chunk_chars(chars);
            }
            Ok(Box::new(embedder))
        }
        EmbedderBackend::OpenAi => {
            info!(model = %config.openai_model, "Using OpenAI embeddings API");
            let mut settings =
                biorank::embeddings::openai::OpenAiSettings::new(config.openai_api_key.clone());
            settings.base_url = config.openai_base_url.clone();
            settings.model = config.openai_model.clone();
            settings.dimension = config.embedding_dim;
            settings.requests_per_second = config.openai_rps;
            settings.chunk_chars = config.openai_chunk_chars();
            Ok(Box::new(biorank::embeddings::openai::OpenAiEmbedder::new(
                settings,
            )?))
        }
        EmbedderBackend::Hashing => {
            info!("Using offline feature-hashing embedder");
            let mut embedder = biorank::embeddings::hashing::HashingEmbedder::default();
            if let Some(chars) = config.chunk_chars {
                embedder = embedder.with_chunk_chars(chars);
            }
            Ok(Box::new(embedder))
        }
    }
}
