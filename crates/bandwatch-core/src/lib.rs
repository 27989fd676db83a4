//! # Bandwatch Core
//!
//! Fetch–analyze–merge pipeline behind the bandwatch chart service.
//!
//! ## Overview
//!
//! One request produces one pipeline run:
//!
//! 1. the **fetch step** (an external command) writes a CSV of OHLCV rows
//! 2. the **Tabular Record Parser** turns that file into [`PriceRecord`]s
//! 3. the **analysis step** (another external command) prints support ranges
//! 4. the **Range Text Parser** turns those lines into [`SupportRange`]s
//! 5. the **Aligner/Merger** zips both into [`EnrichedDataPoint`]s
//!
//! ## Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`align`] | Positional merge of records and ranges |
//! | [`domain`] | Instrument, interval, window, request and record types |
//! | [`error`] | Validation errors and the pipeline failure taxonomy |
//! | [`parse`] | Lenient CSV and range-text parsers with diagnostics |
//! | [`pipeline`] | Orchestrator, configuration and fetch artifact handling |
//! | [`runner`] | External step contract and the process-backed runner |
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────┐
//! │ Request Handler │  (bandwatch-web)
//! └────────┬────────┘
//!          ▼
//! ┌─────────────────┐     ┌──────────────────┐
//! │    Pipeline     │────▶│   StepRunner     │── fetch step ──▶ CSV artifact
//! │                 │     │ (process / fake) │── analysis step ▶ stdout
//! └────────┬────────┘     └──────────────────┘
//!          ▼
//! ┌─────────────────┐     ┌──────────────────┐
//! │ parse::records  │     │  parse::ranges   │
//! └────────┬────────┘     └────────┬─────────┘
//!          └──────────┬────────────┘
//!                     ▼
//!            align::merge_positional
//! ```
//!
//! ## Error Handling
//!
//! A run either succeeds with a complete series or fails with exactly one
//! [`PipelineError`]. Malformed rows inside successful output never fail a
//! run; they surface as [`parse::Diagnostic`]s on the outcome.
//!
//! ```rust
//! use bandwatch_core::{PipelineError, PipelineErrorKind};
//!
//! fn status_for(error: &PipelineError) -> u16 {
//!     match error.kind() {
//!         PipelineErrorKind::StepTimedOut => 504,
//!         _ => 500,
//!     }
//! }
//! ```

pub mod align;
pub mod domain;
pub mod error;
pub mod parse;
pub mod pipeline;
pub mod runner;

// Domain models
pub use domain::{
    format_date, parse_date, today_utc, DateWindow, EnrichedDataPoint, Instrument, Interval,
    PipelineRequest, PriceRecord, SupportRange, WindowPolicy, PRICE_COLUMNS,
};

// Error types
pub use error::{PipelineError, PipelineErrorKind, ValidationError};

// Parsers and merge
pub use align::merge_positional;
pub use parse::{parse_price_records, parse_support_ranges, Diagnostic, ParsedRanges, ParsedRecords};

// Orchestration
pub use pipeline::{FetchArtifact, Pipeline, PipelineConfig, PipelineOutcome};
pub use runner::{
    ProcessStepRunner, Step, StepCommand, StepError, StepInvocation, StepOutput, StepRunner,
};
