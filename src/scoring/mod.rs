// Scoring: fusion, threat detection, severity, and the analyzer that ties them together.

pub mod analyzer;
pub mod fusion;
pub mod severity;
pub mod threat;

pub use analyzer::{AnalysisError, AnalysisResult, Analyzer};
pub use severity::Severity;
