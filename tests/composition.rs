// Composition tests: verifying that the pipeline stages chain together.
//
// These tests exercise the data flow between modules:
//   Language -> Lexicon + Neural adapter -> Fusion -> Threat/Severity
//   -> Policy -> Incident store + Platform gateway
// with fake providers, a recording gateway and an in-memory SQLite store.
// No network access.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;

use safeguard::db::models::{BotStatus, SeverityCounts, StoredIncident};
use safeguard::db::{IncidentStore, SqliteStore};
use safeguard::language::{Language, LanguageIdentifier, StatisticalDetector};
use safeguard::moderation::{
    ChatMessage, IncidentRecord, ModerationThresholds, ModeratorAlert, NoticeHandle,
    PlatformGateway,
};
use safeguard::pipeline::batch::{analyze_batch, moderate_batch};
use safeguard::pipeline::{MessageOutcome, Moderator, SkipReason};
use safeguard::scoring::threat::ThreatReason;
use safeguard::scoring::{AnalysisError, Analyzer, Severity};
use safeguard::signals::{
    Lexicon, NeuralScorer, NeuralSignalAdapter, ScoreProvider, SentimentDistribution,
    ToxicityLabel, ToxicityLabelSet,
};

const EPS: f64 = 1e-9;

// ============================================================
// Fakes
// ============================================================

struct FixedLanguage(Language);

impl StatisticalDetector for FixedLanguage {
    fn detect(&self, _text: &str) -> Option<Language> {
        Some(self.0)
    }
}

/// Returns the same scores for every text.
struct FixedScorer {
    toxicity: ToxicityLabelSet,
    sentiment: SentimentDistribution,
}

#[async_trait]
impl NeuralScorer for FixedScorer {
    async fn score_toxicity(&self, _text: &str) -> Result<ToxicityLabelSet> {
        Ok(self.toxicity.clone())
    }

    async fn score_sentiment(&self, _text: &str) -> Result<SentimentDistribution> {
        Ok(self.sentiment)
    }
}

/// Every call fails, like a provider returning 503.
struct FailingScorer;

#[async_trait]
impl NeuralScorer for FailingScorer {
    async fn score_toxicity(&self, _text: &str) -> Result<ToxicityLabelSet> {
        anyhow::bail!("503 Service Unavailable")
    }

    async fn score_sentiment(&self, _text: &str) -> Result<SentimentDistribution> {
        anyhow::bail!("503 Service Unavailable")
    }
}

/// Never answers within any reasonable timeout.
struct StalledScorer;

#[async_trait]
impl NeuralScorer for StalledScorer {
    async fn score_toxicity(&self, _text: &str) -> Result<ToxicityLabelSet> {
        tokio::time::sleep(Duration::from_secs(60)).await;
        Ok(ToxicityLabelSet::new())
    }

    async fn score_sentiment(&self, _text: &str) -> Result<SentimentDistribution> {
        tokio::time::sleep(Duration::from_secs(60)).await;
        Ok(SentimentDistribution::default())
    }
}

fn analyzer(language: Language, provider: ScoreProvider, timeout: Duration) -> Analyzer {
    Analyzer::new(
        LanguageIdentifier::new(Box::new(FixedLanguage(language))),
        Lexicon::builtin(),
        NeuralSignalAdapter::new(provider, timeout),
    )
}

fn fixed(toxic: f64, sentiment: SentimentDistribution) -> ScoreProvider {
    ScoreProvider::Neural(Arc::new(FixedScorer {
        toxicity: ToxicityLabelSet::new().with(ToxicityLabel::Toxic, toxic),
        sentiment,
    }))
}

fn neutral() -> SentimentDistribution {
    SentimentDistribution {
        negative: 0.1,
        neutral: 0.8,
        positive: 0.1,
    }
}

/// Records every gateway call in order.
#[derive(Default)]
struct RecordingGateway {
    events: Mutex<Vec<String>>,
    fail_delete: bool,
    fail_remove: bool,
}

impl RecordingGateway {
    fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }

    fn record(&self, event: String) {
        self.events.lock().unwrap().push(event);
    }
}

#[async_trait]
impl PlatformGateway for RecordingGateway {
    async fn send_alert(&self, alert: &ModeratorAlert) -> Result<()> {
        self.record(format!("alert:{}:{:?}", alert.severity, alert.incident_id.is_some()));
        Ok(())
    }

    async fn delete_message(&self, message: &ChatMessage) -> Result<()> {
        if self.fail_delete {
            anyhow::bail!("Missing Permissions");
        }
        self.record(format!("delete:{}", message.message_id));
        Ok(())
    }

    async fn post_notice(&self, message: &ChatMessage, text: &str) -> Result<NoticeHandle> {
        self.record(format!("notice:{text}"));
        Ok(NoticeHandle {
            channel_id: message.channel_id.clone(),
            notice_id: "n1".to_string(),
        })
    }

    async fn remove_notice(&self, notice: &NoticeHandle) -> Result<()> {
        if self.fail_remove {
            anyhow::bail!("Unknown Message");
        }
        self.record(format!("remove:{}", notice.notice_id));
        Ok(())
    }
}

/// Rejects every write.
struct BrokenStore;

#[async_trait]
impl IncidentStore for BrokenStore {
    async fn table_count(&self) -> Result<i64> {
        anyhow::bail!("disk I/O error")
    }
    async fn save_incident(&self, _record: &IncidentRecord) -> Result<i64> {
        anyhow::bail!("disk I/O error")
    }
    async fn get_recent_incidents(
        &self,
        _limit: u32,
        _min_severity: Option<Severity>,
    ) -> Result<Vec<StoredIncident>> {
        anyhow::bail!("disk I/O error")
    }
    async fn count_by_severity(&self) -> Result<SeverityCounts> {
        anyhow::bail!("disk I/O error")
    }
    async fn upsert_bot_status(&self, _status: &BotStatus) -> Result<()> {
        anyhow::bail!("disk I/O error")
    }
    async fn get_bot_status(&self, _platform: &str) -> Result<Option<BotStatus>> {
        anyhow::bail!("disk I/O error")
    }
    async fn get_all_bot_status(&self) -> Result<Vec<BotStatus>> {
        anyhow::bail!("disk I/O error")
    }
}

fn memory_store() -> Arc<dyn IncidentStore> {
    let conn = rusqlite::Connection::open_in_memory().unwrap();
    safeguard::db::schema::create_tables(&conn).unwrap();
    Arc::new(SqliteStore::new(conn))
}

fn message(id: &str, content: &str) -> ChatMessage {
    ChatMessage::new("discord", id, "mallory", "general", content)
}

// ============================================================
// Analysis scenarios
// ============================================================

#[tokio::test]
async fn kill_threat_keyword_only_is_critical() {
    let a = analyzer(Language::En, ScoreProvider::Null, Duration::from_secs(10));
    let result = a.analyze("I'm going to kill you!", "discord").await.unwrap();

    assert!((result.toxicity_score - 0.6).abs() < EPS);
    assert!((result.details.threat_analysis.threat_probability - 0.75).abs() < EPS);
    assert!(result.is_threat);
    assert_eq!(result.severity, Severity::Critical);
    assert_eq!(result.detected_language, "en");
    assert_eq!(result.details.toxicity_breakdown.matched_terms, vec!["kill"]);
}

#[tokio::test]
async fn two_matches_keyword_only_is_point_seven() {
    let a = analyzer(Language::En, ScoreProvider::Null, Duration::from_secs(10));
    let result = a.analyze("I will hurt and attack", "discord").await.unwrap();
    assert!((result.toxicity_score - 0.7).abs() < EPS);
    assert_eq!(result.details.toxicity_breakdown.matched_terms.len(), 2);
}

#[tokio::test]
async fn benign_text_keyword_only_is_zero() {
    let a = analyzer(Language::En, ScoreProvider::Null, Duration::from_secs(10));
    let result = a.analyze("Have a wonderful day, friend!", "discord").await.unwrap();
    assert_eq!(result.toxicity_score, 0.0);
    assert!(!result.is_threat);
    assert_eq!(result.severity, Severity::Low);
    assert_eq!(result.confidence, 0.0);
}

#[tokio::test]
async fn same_model_score_weighs_differently_by_language() {
    let text = "you are such an idiot";
    let en = analyzer(Language::En, fixed(0.9, neutral()), Duration::from_secs(10))
        .analyze(text, "discord")
        .await
        .unwrap();
    let hi = analyzer(Language::Hi, fixed(0.9, neutral()), Duration::from_secs(10))
        .analyze(text, "discord")
        .await
        .unwrap();

    // 0.7 * 0.9 and 0.4 * 0.9, no lexicon matches
    assert!((en.toxicity_score - 0.63).abs() < EPS);
    assert_eq!(en.severity, Severity::High);
    assert!((hi.toxicity_score - 0.36).abs() < EPS);
    assert_eq!(hi.severity, Severity::Low);
}

#[tokio::test]
async fn provider_failure_degrades_to_keywords() {
    let a = analyzer(
        Language::En,
        ScoreProvider::Neural(Arc::new(FailingScorer)),
        Duration::from_secs(10),
    );
    let result = a.analyze("I will hurt and attack", "discord").await.unwrap();
    assert!((result.toxicity_score - 0.7).abs() < EPS);
    assert_eq!(result.sentiment_score, 0.0);
    assert!(!result.details.toxicity_breakdown.neural_available);
    assert!(!result.details.sentiment_breakdown.available);
    assert!(result.is_threat);
}

#[tokio::test]
async fn stalled_provider_times_out_and_analysis_completes() {
    let a = analyzer(
        Language::En,
        ScoreProvider::Neural(Arc::new(StalledScorer)),
        Duration::from_millis(50),
    );
    let started = std::time::Instant::now();
    let result = a.analyze("Have a wonderful day, friend!", "discord").await.unwrap();
    assert!(started.elapsed() < Duration::from_secs(5));
    assert_eq!(result.toxicity_score, 0.0);
    assert!(!result.details.toxicity_breakdown.neural_available);
}

#[tokio::test]
async fn empty_input_is_rejected() {
    let a = analyzer(Language::En, fixed(0.9, neutral()), Duration::from_secs(10));
    assert_eq!(a.analyze("   ", "discord").await, Err(AnalysisError::EmptyInput));
}

#[tokio::test]
async fn analysis_is_idempotent() {
    let a = analyzer(Language::Kn, fixed(0.55, neutral()), Duration::from_secs(10));
    let text = "nee nayi thara idiya";
    let first = serde_json::to_string(&a.analyze(text, "discord").await.unwrap()).unwrap();
    let second = serde_json::to_string(&a.analyze(text, "discord").await.unwrap()).unwrap();
    assert_eq!(first, second);
}

#[tokio::test]
async fn response_schema_field_names() {
    let a = analyzer(Language::En, fixed(0.2, neutral()), Duration::from_secs(10));
    let result = a.analyze("hello there", "discord").await.unwrap();
    let json = serde_json::to_value(&result).unwrap();
    for field in [
        "toxicity_score",
        "sentiment_score",
        "severity",
        "is_threat",
        "confidence",
        "detected_language",
        "details",
    ] {
        assert!(json.get(field).is_some(), "missing {field}");
    }
    assert_eq!(json["severity"], "low");
    assert!(json["details"]["language_detection"]["mixed_languages"].is_array());
    assert!(json["details"]["toxicity_breakdown"]["labels"]["toxic"].is_number());
}

#[tokio::test]
async fn model_threat_label_drives_threat_without_keywords() {
    let provider = ScoreProvider::Neural(Arc::new(FixedScorer {
        toxicity: ToxicityLabelSet::new()
            .with(ToxicityLabel::Toxic, 0.3)
            .with(ToxicityLabel::Threat, 0.7),
        sentiment: neutral(),
    }));
    let a = analyzer(Language::En, provider, Duration::from_secs(10));
    let result = a.analyze("you'd better watch yourself", "discord").await.unwrap();
    assert!(result.is_threat);
    assert_eq!(result.severity, Severity::Critical);
    assert_eq!(result.details.threat_analysis.reason, ThreatReason::ThreatProbability);
    assert_eq!(result.details.threat_analysis.model_probability, Some(0.7));
}

#[tokio::test]
async fn model_threat_label_counts_toward_toxicity() {
    let provider = ScoreProvider::Neural(Arc::new(FixedScorer {
        toxicity: ToxicityLabelSet::new()
            .with(ToxicityLabel::Toxic, 0.1)
            .with(ToxicityLabel::Threat, 0.45),
        sentiment: neutral(),
    }));
    let a = analyzer(Language::En, provider, Duration::from_secs(10));
    let result = a.analyze("watch yourself", "discord").await.unwrap();

    // The threat label is the strongest final label, ahead of 0.7 * 0.45
    assert!((result.toxicity_score - 0.45).abs() < EPS);
    assert!(!result.is_threat);
    assert_eq!(result.severity, Severity::Medium);
}

#[tokio::test]
async fn batch_analysis_isolates_failures() {
    let a = analyzer(
        Language::En,
        ScoreProvider::Neural(Arc::new(StalledScorer)),
        Duration::from_millis(30),
    );
    let texts: Vec<String> = (0..6)
        .map(|i| format!("message number {i} about attack plans"))
        .collect();
    let results = analyze_batch(&a, &texts, "discord", 6, false).await;
    assert_eq!(results.len(), 6);
    for r in results {
        let r = r.unwrap();
        assert!((r.toxicity_score - 0.6).abs() < EPS);
    }
}

// ============================================================
// Moderation flow
// ============================================================

fn alerting() -> ModerationThresholds {
    ModerationThresholds {
        alert_enabled: true,
        ..ModerationThresholds::default()
    }
}

#[tokio::test]
async fn threat_is_saved_alerted_deleted_and_warned() {
    let store = memory_store();
    let gateway = Arc::new(RecordingGateway::default());
    let moderator = Moderator::new(
        Arc::new(analyzer(Language::En, ScoreProvider::Null, Duration::from_secs(10))),
        alerting(),
    )
    .with_store(Arc::clone(&store))
    .with_gateway(gateway.clone())
    .with_warning_ttl(Duration::from_millis(20));

    let outcome = moderator
        .handle_message(&message("m1", "I'm going to kill you!"))
        .await;
    let outcome = outcome.moderated().unwrap();

    assert!(outcome.decision.should_save && outcome.decision.should_delete);
    assert!(outcome.actions.alerted && outcome.actions.deleted && outcome.actions.warned);
    assert!(outcome.incident_id.is_some());

    let events = gateway.events();
    assert_eq!(events[0], "alert:critical:true");
    assert_eq!(events[1], "delete:m1");
    assert_eq!(
        events[2],
        "notice:mallory, your message was removed due to policy violations. Severity: CRITICAL"
    );

    // Deferred notice removal fires after the TTL
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(gateway.events().last().map(String::as_str), Some("remove:n1"));

    let snapshot = moderator.metrics().snapshot();
    assert_eq!(snapshot.messages_analyzed, 1);
    assert_eq!(snapshot.incidents_detected, 1);
    assert_eq!(snapshot.messages_deleted, 1);

    let stored = store.get_recent_incidents(10, None).await.unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(Some(stored[0].id), outcome.incident_id);
    assert_eq!(stored[0].severity, Severity::Critical);
}

#[tokio::test]
async fn medium_is_saved_but_not_deleted() {
    let store = memory_store();
    let gateway = Arc::new(RecordingGateway::default());
    let moderator = Moderator::new(
        Arc::new(analyzer(Language::En, fixed(0.6, neutral()), Duration::from_secs(10))),
        ModerationThresholds::default(),
    )
    .with_store(Arc::clone(&store))
    .with_gateway(gateway.clone());

    // 0.7 * 0.6 = 0.42, no keywords
    let outcome = moderator.handle_message(&message("m2", "you are a clown")).await;
    let outcome = outcome.moderated().unwrap();
    assert_eq!(outcome.analysis.severity, Severity::Medium);
    assert!(!outcome.analysis.is_threat);
    assert!(outcome.decision.should_save);
    assert!(!outcome.decision.should_delete);
    assert!(gateway.events().is_empty());
    assert_eq!(store.get_recent_incidents(10, None).await.unwrap().len(), 1);
}

#[tokio::test]
async fn failed_delete_skips_warning_but_keeps_decision() {
    let gateway = Arc::new(RecordingGateway {
        fail_delete: true,
        ..RecordingGateway::default()
    });
    let moderator = Moderator::new(
        Arc::new(analyzer(Language::En, ScoreProvider::Null, Duration::from_secs(10))),
        ModerationThresholds::default(),
    )
    .with_gateway(gateway.clone());

    let outcome = moderator
        .handle_message(&message("m3", "I'm going to kill you!"))
        .await;
    let outcome = outcome.moderated().unwrap();
    assert!(outcome.decision.should_delete && outcome.decision.should_warn);
    assert!(!outcome.actions.deleted);
    assert!(!outcome.actions.warned);
    assert!(gateway.events().is_empty());
    assert_eq!(moderator.metrics().snapshot().messages_deleted, 0);
}

#[tokio::test]
async fn failed_notice_removal_is_swallowed() {
    let gateway = Arc::new(RecordingGateway {
        fail_remove: true,
        ..RecordingGateway::default()
    });
    let moderator = Moderator::new(
        Arc::new(analyzer(Language::En, ScoreProvider::Null, Duration::from_secs(10))),
        ModerationThresholds::default(),
    )
    .with_gateway(gateway.clone())
    .with_warning_ttl(Duration::from_millis(10));

    let outcome = moderator
        .handle_message(&message("m4", "I'm going to kill you!"))
        .await;
    assert!(outcome.moderated().unwrap().actions.warned);
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(gateway.events().len(), 2);
}

#[tokio::test]
async fn store_failure_does_not_change_decision() {
    let gateway = Arc::new(RecordingGateway::default());
    let moderator = Moderator::new(
        Arc::new(analyzer(Language::En, ScoreProvider::Null, Duration::from_secs(10))),
        alerting(),
    )
    .with_store(Arc::new(BrokenStore))
    .with_gateway(gateway.clone())
    .with_warning_ttl(Duration::from_secs(60));

    let outcome = moderator
        .handle_message(&message("m5", "I'm going to kill you!"))
        .await;
    let outcome = outcome.moderated().unwrap();
    assert!(outcome.decision.should_save);
    assert_eq!(outcome.incident_id, None);
    assert!(outcome.actions.deleted);
    assert_eq!(gateway.events()[0], "alert:critical:false");
    assert_eq!(moderator.metrics().snapshot().incidents_detected, 1);
}

#[tokio::test]
async fn bot_and_empty_messages_are_skipped() {
    let moderator = Moderator::new(
        Arc::new(analyzer(Language::En, ScoreProvider::Null, Duration::from_secs(10))),
        ModerationThresholds::default(),
    );

    let mut from_bot = message("m6", "I'm going to kill you!");
    from_bot.author_is_bot = true;
    assert!(matches!(
        moderator.handle_message(&from_bot).await,
        MessageOutcome::Skipped(SkipReason::BotAuthor)
    ));
    assert!(matches!(
        moderator.handle_message(&message("m7", "  ")).await,
        MessageOutcome::Skipped(SkipReason::Empty)
    ));
    assert_eq!(moderator.metrics().snapshot().messages_analyzed, 0);
}

#[tokio::test]
async fn benign_message_takes_no_action() {
    let store = memory_store();
    let gateway = Arc::new(RecordingGateway::default());
    let moderator = Moderator::new(
        Arc::new(analyzer(Language::En, ScoreProvider::Null, Duration::from_secs(10))),
        alerting(),
    )
    .with_store(Arc::clone(&store))
    .with_gateway(gateway.clone());

    let outcome = moderator
        .handle_message(&message("m8", "Have a wonderful day, friend!"))
        .await;
    assert!(!outcome.moderated().unwrap().decision.is_actionable());
    assert!(gateway.events().is_empty());
    assert!(store.get_recent_incidents(10, None).await.unwrap().is_empty());
    assert_eq!(moderator.metrics().snapshot().messages_analyzed, 1);
}

#[tokio::test]
async fn batch_moderation_counts_and_reports_status() {
    let store = memory_store();
    let moderator = Moderator::new(
        Arc::new(analyzer(Language::En, ScoreProvider::Null, Duration::from_secs(10))),
        ModerationThresholds::default(),
    )
    .with_store(Arc::clone(&store));

    let messages = vec![
        message("b1", "Have a wonderful day, friend!"),
        message("b2", "I'm going to kill you!"),
        message("b3", "I will hurt and attack"),
        message("b4", ""),
    ];
    let outcomes = moderate_batch(&moderator, &messages, 4, false).await;
    assert_eq!(outcomes.len(), 4);
    assert!(outcomes[3].moderated().is_none());

    let snapshot = moderator.metrics().snapshot();
    assert_eq!(snapshot.messages_analyzed, 3);
    assert_eq!(snapshot.incidents_detected, 2);

    let counts = store.count_by_severity().await.unwrap();
    assert_eq!(counts.last(), Some(&(Severity::Critical, 2)));

    moderator.report_status("discord", "online").await.unwrap();
    let status = store.get_bot_status("discord").await.unwrap().unwrap();
    assert_eq!(status.message_count, 3);
    assert_eq!(status.incidents_detected, 2);
    assert_eq!(status.status, "online");
}
