// System status display: embedder backend, model files, inputs, taxonomy.

use std::path::Path;

use anyhow::Result;
use colored::Colorize;

use crate::config::{Config, EmbedderBackend};
use crate::embeddings::download::{embedding_files_present, embedding_model_dir};
use crate::records::group::discover_inputs;
use crate::taxonomy::RunConfig;

/// Display system status to the terminal.
///
/// `taxonomy_path` is the run config that `score` would use; `None` means
/// the built-in taxonomy.
pub fn show(config: &Config, taxonomy_path: Option<&Path>, input_dir: &Path) -> Result<()> {
    println!("Embedder: {}", config.embedder.as_str());
    match config.embedder {
        EmbedderBackend::Onnx => {
            let dir = embedding_model_dir(&config.model_dir);
            if embedding_files_present(&config.model_dir) {
                println!("  Model: {} ({})", dir.display(), "present".green());
            } else {
                println!("  Model: {} ({})", dir.display(), "missing".red());
                println!("  Run `biorank download-model` to fetch it");
            }
        }
        EmbedderBackend::OpenAi => {
            let key = if config.openai_api_key.is_empty() {
                "not set".red()
            } else {
                "set".green()
            };
            println!("  Endpoint: {}", config.openai_base_url);
            println!(
                "  Model: {} ({} dims, {} req/s)",
                config.openai_model, config.embedding_dim, config.openai_rps
            );
            println!("  OPENAI_API_KEY: {key}");
        }
        EmbedderBackend::Hashing => {
            println!("  {}", "Offline feature hashing; cosine scores are lexical only".dimmed());
        }
    }

    let run_config = match taxonomy_path {
        Some(path) => {
            print!("Taxonomy: {}", path.display());
            RunConfig::from_file(path)
        }
        None => {
            print!("Taxonomy: built-in (history)");
            RunConfig::builtin()
        }
    };
    match run_config {
        Ok(rc) => println!(
            " ({} target, {} avoid categories)",
            rc.target.categories.len(),
            rc.avoid.categories.len()
        ),
        Err(e) => println!(" ({})", format!("invalid: {e:#}").red()),
    }

    let inputs = discover_inputs(input_dir)?;
    if inputs.is_empty() {
        println!("Inputs: none found in {}", input_dir.display());
    } else {
        println!("Inputs: {} file(s) in {}", inputs.len(), input_dir.display());
        for path in &inputs {
            let size = std::fs::metadata(path)
                .map(|m| format_bytes(m.len()))
                .unwrap_or_else(|_| "unknown".to_string());
            println!("  {} ({})", path.display(), size);
        }
    }

    println!("Output directory: {}", config.output_dir.display());
    Ok(())
}

fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} B", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    }
}
