//! Core functionality for the Synheart ECG Bridge.
//!
//! This module contains:
//! - The capacity-bounded sample buffer
//! - Throttled analysis scheduling
//! - The HRV feature extractor and its adapter
//! - The pipeline object tying them together

pub mod buffer;
pub mod ecg;
pub mod extractor;
pub mod pipeline;
pub mod scheduler;

// Re-export commonly used types
pub use buffer::{Sample, SampleBuffer};
pub use ecg::ExtractionError;
pub use extractor::{extract, EcgHrvExtractor, Extraction, FeatureExtractor};
pub use pipeline::{EcgPipeline, IngestOutcome};
pub use scheduler::{AnalysisScheduler, ScheduleDecision};
