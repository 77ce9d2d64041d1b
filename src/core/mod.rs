//! Core pipeline components
//!
//! This module contains the SmartGPT orchestration logic, usage accounting
//! and transcript persistence.

mod pipeline;
mod transcript;
mod usage;

pub use pipeline::{PipelineEvent, Reporter, RunReport, SmartGpt, Stage};
pub use usage::{format_cost, TokenCounts};
