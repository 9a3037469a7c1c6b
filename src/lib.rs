//! # Label Scan
//!
//! Turns the noisy text recognized from a packaged-food label into structured
//! data: nutrition facts, ingredients, allergens, package metadata, a safety
//! score and advisory recommendations.
//!
//! The entry point is [`pipeline::LabelAnalyzer`]; image decoding and the
//! recognition seams live in [`ocr`].

pub mod allergens;
pub mod candidate_selector;
pub mod config;
pub mod errors;
pub mod ingredients;
pub mod metadata;
pub mod model;
pub mod numeric;
pub mod nutrition;
pub mod ocr;
pub mod pipeline;
pub mod recommendations;
pub mod scoring;

pub use config::{AnalyzerConfig, Profile};
pub use errors::AnalysisError;
pub use model::LabelReport;
pub use pipeline::LabelAnalyzer;
