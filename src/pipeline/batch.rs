// Batch pipeline: analyze or moderate many texts concurrently.
//
// Each item runs independently. A stalled provider call only degrades its
// own item to keyword-only scoring. Results come back in input order.

use futures::stream::{self, StreamExt};
use indicatif::{ProgressBar, ProgressStyle};

use super::message::{MessageOutcome, Moderator};
use crate::moderation::ChatMessage;
use crate::scoring::{AnalysisError, AnalysisResult, Analyzer};

fn progress_bar(len: usize, label: &str, show: bool) -> ProgressBar {
    if !show {
        return ProgressBar::hidden();
    }
    let pb = ProgressBar::new(len as u64);
    let template = format!("  {label} [{{bar:30}}] {{pos}}/{{len}} ({{eta}})");
    if let Ok(style) = ProgressStyle::default_bar().template(&template) {
        pb.set_style(style);
    }
    pb
}

/// Analyze every text with at most `concurrency` analyses in flight.
pub async fn analyze_batch(
    analyzer: &Analyzer,
    texts: &[String],
    platform: &str,
    concurrency: usize,
    show_progress: bool,
) -> Vec<Result<AnalysisResult, AnalysisError>> {
    let pb = progress_bar(texts.len(), "Analyzing", show_progress);

    let results = stream::iter(texts.iter().map(|text| {
        let pb = &pb;
        async move {
            let result = analyzer.analyze(text, platform).await;
            pb.inc(1);
            result
        }
    }))
    .buffered(concurrency.max(1))
    .collect()
    .await;

    pb.finish_and_clear();
    results
}

/// Run every message through the moderator with at most `concurrency` in flight.
pub async fn moderate_batch(
    moderator: &Moderator,
    messages: &[ChatMessage],
    concurrency: usize,
    show_progress: bool,
) -> Vec<MessageOutcome> {
    let pb = progress_bar(messages.len(), "Moderating", show_progress);

    let outcomes = stream::iter(messages.iter().map(|message| {
        let pb = &pb;
        async move {
            let outcome = moderator.handle_message(message).await;
            pb.inc(1);
            outcome
        }
    }))
    .buffered(concurrency.max(1))
    .collect()
    .await;

    pb.finish_and_clear();
    outcomes
}
