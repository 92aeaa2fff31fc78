// Safeguard: multilingual toxicity, threat and severity moderation
//
// This is the library root. Each module corresponds to a major subsystem
// of the moderation pipeline, leaf-first: language -> signals -> scoring ->
// moderation -> pipeline.

pub mod config;
pub mod db;
pub mod language;
pub mod moderation;
pub mod output;
pub mod pipeline;
pub mod scoring;
pub mod signals;
pub mod status;
