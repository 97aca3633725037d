//! Plain-text rendering of research progress and results for terminals.

use std::fmt::Write as _;

use owo_colors::OwoColorize;
use sleuth_core::{
    ArticleAnalysis, FetchStatus, Iteration, Phase, ResearchResult, Snapshot,
};

/// The gutter drawn in front of rendered blocks.
pub const BAR_CHAR: &str = "▎";

/// Returns a one-line description of what the engine is doing.
pub fn phase_message(snapshot: &Snapshot) -> String {
    let current = snapshot.iterations.last();
    let sources = current.map_or(0, |it| it.sources.len());
    match snapshot.phase {
        Phase::Planning => "🤔 Planning the search...".to_owned(),
        Phase::Searching => match current {
            Some(it) => format!("🔎 Searching for \"{}\"...", it.query),
            None => "🔎 Searching...".to_owned(),
        },
        Phase::Scraping => format!("📄 Reading {sources} sources..."),
        Phase::Summarizing => {
            let fetched = current.map_or(0, |it| {
                it.sources.iter().filter(|s| s.is_fetched()).count()
            });
            format!("📝 Extracting findings from {fetched}/{sources} sources...")
        }
        Phase::Assessing => "⚖️  Assessing confidence...".to_owned(),
        Phase::IterationDone => "🤔 Thinking...".to_owned(),
        Phase::Done => "✅ Done".to_owned(),
    }
}

/// Renders a completed iteration. `index` starts at zero.
pub fn iteration(index: usize, iteration: &Iteration) -> String {
    let bar = BAR_CHAR.bright_cyan();
    let mut out = String::new();
    writeln!(
        out,
        "{bar}{} {}  {}",
        format!("Iteration {}:", index + 1).bold(),
        iteration.query.bright_white(),
        format!("(confidence {}%)", iteration.confidence).dimmed()
    )
    .ok();
    for source in &iteration.sources {
        let mark = match source.status() {
            FetchStatus::Fetched => "✓".green().to_string(),
            FetchStatus::Failed => "✗".red().to_string(),
            FetchStatus::Pending => "·".dimmed().to_string(),
        };
        writeln!(out, "{bar}  {mark} {}", source.title()).ok();
    }
    for finding in &iteration.findings {
        writeln!(out, "{bar}  • {finding}").ok();
    }
    if !iteration.reasoning.is_empty() {
        writeln!(out, "{bar}  {}", iteration.reasoning.dimmed()).ok();
    }
    out
}

/// Renders the final answer followed by its provenance.
pub fn result(result: &ResearchResult) -> String {
    let bar = if result.answered {
        BAR_CHAR.bright_green().to_string()
    } else {
        BAR_CHAR.bright_yellow().to_string()
    };
    let mut out = String::new();
    for line in result.final_summary.lines() {
        writeln!(out, "{bar}{}", line.bright_white()).ok();
    }
    writeln!(out, "{bar}").ok();
    writeln!(out, "{bar}{}", result.provenance().dimmed()).ok();
    out
}

/// Renders an article analysis.
pub fn article(analysis: &ArticleAnalysis) -> String {
    let bar = BAR_CHAR.bright_magenta();
    let mut out = String::new();
    writeln!(out, "{bar}{}", analysis.title.bold()).ok();

    let mut byline = vec![analysis.url.clone()];
    byline.extend(analysis.author.iter().map(|a| format!("by {a}")));
    byline.extend(analysis.published.iter().cloned());
    byline.push(format!(
        "{} words, {} min read",
        analysis.word_count, analysis.reading_minutes
    ));
    writeln!(out, "{bar}{}", byline.join(" · ").dimmed()).ok();
    writeln!(out, "{bar}").ok();

    for line in analysis.summary.lines() {
        writeln!(out, "{bar}{line}").ok();
    }
    if !analysis.key_points.is_empty() {
        writeln!(out, "{bar}").ok();
        for point in &analysis.key_points {
            writeln!(out, "{bar}• {point}").ok();
        }
    }
    out
}
