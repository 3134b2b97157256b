// Colored terminal output for rankings, score breakdowns, and statistics.
//
// This module handles all terminal-specific formatting. The main.rs command
// handlers delegate here.

use colored::Colorize;

use crate::pipeline::batch::BatchOutcome;
use crate::scoring::record::{RecordScore, ScoreFlag};
use crate::summary::Describe;
use crate::taxonomy::Polarity;

/// Display a ranked list of records.
pub fn display_ranked(title: &str, ranked: &[&RecordScore]) {
    if ranked.is_empty() {
        println!("No records scored.");
        return;
    }

    println!("\n{}", format!("=== {title} ({} records) ===", ranked.len()).bold());
    println!();

    println!(
        "  {:>4}  {:<32} {:<12} {:>8}  {:>8}  {:>8}",
        "Rank".dimmed(),
        "Name".dimmed(),
        "Group".dimmed(),
        "Total".dimmed(),
        "Target".dimmed(),
        "Avoid".dimmed(),
    );
    println!("  {}", "-".repeat(82).dimmed());

    for (i, score) in ranked.iter().enumerate() {
        let marker = if score.has_flag(ScoreFlag::ProviderFailure) {
            " !".yellow().to_string()
        } else {
            String::new()
        };
        println!(
            "  {:>4}. {:<32} {:<12} {}  {:>8.3}  {:>8.3}{}",
            i + 1,
            super::truncate_chars(&score.name, 29),
            super::truncate_chars(&score.group, 12),
            colorize_total(score.total_score),
            score.target_score,
            score.avoid_score,
            marker,
        );
    }
    println!();
}

/// Display one record's full per-category breakdown.
pub fn display_record_detail(score: &RecordScore) {
    let label = if score.name.is_empty() {
        "(unnamed)".to_string()
    } else {
        score.name.clone()
    };
    println!("\n{}", format!("=== Score for {label} ===").bold());
    println!("  Total:  {}", colorize_total(score.total_score));
    println!("  Target: {:.3}", score.target_score);
    println!("  Avoid:  {:.3}", score.avoid_score);

    for polarity in [Polarity::Target, Polarity::Avoid] {
        let header = match polarity {
            Polarity::Target => "Target categories".green().bold(),
            Polarity::Avoid => "Avoid categories".red().bold(),
        };
        println!("\n  {header}");
        println!(
            "    {:<20} {:>7}  {:>7}  {:>8}",
            "Category".dimmed(),
            "Cosine".dimmed(),
            "N-gram".dimmed(),
            "Score".dimmed(),
        );
        for category in score.categories.iter().filter(|c| c.polarity == polarity) {
            let line = format!(
                "    {:<20} {:>7.3}  {:>7.3}  {:>8.3}",
                category.name, category.cosine, category.ngram, category.score
            );
            if category.score == 0.0 {
                println!("{}", line.dimmed());
            } else {
                println!("{line}");
            }
        }
    }

    if !score.flags.is_empty() {
        let flags: Vec<&str> = score.flags.iter().map(|f| f.as_str()).collect();
        println!("\n  Flags: {}", flags.join(", ").yellow());
    }
    if let Some(error) = &score.provider_error {
        println!("  Provider error: {}", error.dimmed());
    }
    println!();
}

/// Display per-group and overall statistics of total scores.
pub fn display_summary(outcome: &BatchOutcome) {
    println!("\n{}", "=== Total Score Statistics ===".bold());
    println!(
        "  {:<14} {:>6} {:>8} {:>8} {:>8} {:>8} {:>8} {:>8} {:>8}",
        "Group".dimmed(),
        "Count".dimmed(),
        "Mean".dimmed(),
        "Std".dimmed(),
        "Min".dimmed(),
        "25%".dimmed(),
        "50%".dimmed(),
        "75%".dimmed(),
        "Max".dimmed(),
    );

    for group in &outcome.groups {
        print_stats_row(&group.group, group.summary.as_ref());
    }
    if outcome.groups.len() > 1 {
        print_stats_row("overall", outcome.overall.as_ref());
    }

    let meta = &outcome.metadata;
    println!(
        "\n  Model: {} ({} dims)  Records: {}",
        meta.model, meta.dimension, meta.records
    );
    if meta.provider_failures > 0 {
        println!(
            "  {} {} records scored without embeddings",
            "!".yellow().bold(),
            meta.provider_failures
        );
    }
}

fn print_stats_row(label: &str, stats: Option<&Describe>) {
    let label = super::truncate_chars(label, 14);
    match stats {
        Some(d) => println!(
            "  {:<14} {:>6} {:>8.3} {:>8} {:>8.3} {:>8.3} {:>8.3} {:>8.3} {:>8.3}",
            label,
            d.count,
            d.mean,
            d.std.map(|s| format!("{s:.3}")).unwrap_or_else(|| "-".to_string()),
            d.min,
            d.p25,
            d.p50,
            d.p75,
            d.max,
        ),
        None => println!("  {:<14} {:>6}", label, 0),
    }
}

/// Green for positive totals, red for negative.
fn colorize_total(total: f64) -> colored::ColoredString {
    let text = format!("{total:>8.3}");
    if total > 0.0 {
        text.green().bold()
    } else if total < 0.0 {
        text.red()
    } else {
        text.dimmed()
    }
}
