// Colored terminal output for analyses, batch summaries and incident lists.
//
// This module handles all terminal-specific formatting. The main.rs command
// handlers delegate here.

use colored::Colorize;

use crate::db::models::StoredIncident;
use crate::moderation::{MetricsSnapshot, ModerationDecision};
use crate::pipeline::MessageOutcome;
use crate::scoring::{AnalysisResult, Severity};

/// Display one analysis with its moderation decision.
pub fn display_analysis(text: &str, analysis: &AnalysisResult, decision: &ModerationDecision) {
    println!("\n{}", "=== Analysis ===".bold());
    println!("  Text: {}", super::truncate_chars(text, 120).dimmed());
    println!();

    let language = analysis.language();
    let mix = if language.mixed_languages.len() > 1 {
        let tags: Vec<&str> = language.mixed_languages.iter().map(|l| l.as_str()).collect();
        format!(" [{}]", tags.join("+"))
    } else {
        String::new()
    };
    println!(
        "  Language: {}{} (confidence {:.1})",
        analysis.detected_language, mix, language.confidence
    );

    println!("  Severity: {}", colorize_severity(analysis.severity));
    let threat = if analysis.is_threat {
        "yes".red().bold().to_string()
    } else {
        "no".green().to_string()
    };
    println!(
        "  Threat: {}  ({:?})",
        threat, analysis.details.threat_analysis.reason
    );
    println!(
        "  Toxicity: {:.2}  |  Sentiment: {:+.2}  |  Confidence: {:.2}",
        analysis.toxicity_score, analysis.sentiment_score, analysis.confidence
    );

    let breakdown = &analysis.details.toxicity_breakdown;
    let source = match breakdown.fusion_weights {
        Some(w) => format!("neural {:.1} / lexical {:.1}", w.neural, w.lexical),
        None => "keyword only".yellow().to_string(),
    };
    println!("  Fusion: {}", source);
    if !breakdown.matched_terms.is_empty() {
        println!("  Matched terms: {}", breakdown.matched_terms.join(", "));
    }

    println!("\n  Labels:");
    for (label, probability) in analysis.label_breakdown().iter() {
        println!("    {:<14} {:.2}", label.as_str(), probability);
    }

    println!("\n  Decision:");
    println!(
        "    save: {}  delete: {}  warn: {}  alert: {}",
        yes_no(decision.should_save),
        yes_no(decision.should_delete),
        yes_no(decision.should_warn),
        yes_no(decision.should_alert),
    );
}

/// Summarize a moderated batch: severity tally and counters.
pub fn display_batch_summary(outcomes: &[MessageOutcome], snapshot: &MetricsSnapshot) {
    println!(
        "\n{}",
        format!("=== Batch Summary ({} messages) ===", outcomes.len()).bold()
    );
    println!();

    let skipped = outcomes.iter().filter(|o| o.moderated().is_none()).count();
    let moderated: Vec<_> = outcomes.iter().filter_map(MessageOutcome::moderated).collect();

    for severity in [Severity::Critical, Severity::High, Severity::Medium, Severity::Low] {
        let count = moderated
            .iter()
            .filter(|o| o.analysis.severity == severity)
            .count();
        println!("  {:<10} {}", colorize_severity(severity), count);
    }
    let threats = moderated.iter().filter(|o| o.analysis.is_threat).count();
    if threats > 0 {
        println!("  {} {} threats", "!!".red().bold(), threats);
    }
    if skipped > 0 {
        println!("  {} skipped (empty or bot-authored)", skipped);
    }

    println!();
    println!(
        "  Analyzed: {}  |  Incidents: {}  |  Deleted: {}",
        snapshot.messages_analyzed, snapshot.incidents_detected, snapshot.messages_deleted
    );
}

/// Display stored incidents, newest first.
pub fn display_incidents(incidents: &[StoredIncident]) {
    if incidents.is_empty() {
        println!("No incidents recorded yet. Run `safeguard batch <file>` first.");
        return;
    }

    println!(
        "\n{}",
        format!("=== Incidents ({}) ===", incidents.len()).bold()
    );
    println!();

    println!(
        "  {:>5}  {:<10} {:>5}  {:<7}  {:<16}  {}",
        "ID".dimmed(),
        "Severity".dimmed(),
        "Tox".dimmed(),
        "Lang".dimmed(),
        "Author".dimmed(),
        "Message".dimmed(),
    );
    println!("  {}", "-".repeat(78).dimmed());

    for incident in incidents {
        let marker = if incident.is_threat { "!" } else { " " };
        println!(
            "  {:>5}  {:<10} {:>5.2}  {:<7}  {:<16}  {}{}",
            incident.id,
            colorize_severity(incident.severity),
            incident.toxicity_score,
            incident.detected_language,
            super::truncate_chars(&incident.author_name, 16),
            marker.red().bold(),
            super::truncate_chars(&incident.content, 60).dimmed(),
        );
    }
    println!();
}

fn yes_no(value: bool) -> colored::ColoredString {
    if value {
        "yes".bold()
    } else {
        "no".dimmed()
    }
}

/// Colorize a severity level.
pub fn colorize_severity(severity: Severity) -> colored::ColoredString {
    let label = severity.as_str();
    match severity {
        Severity::Critical => label.red().bold(),
        Severity::High => label.bright_red(),
        Severity::Medium => label.yellow(),
        Severity::Low => label.green(),
    }
}
