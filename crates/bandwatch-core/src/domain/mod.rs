//! # Domain Models
//!
//! Typed values that flow through one fetch–analyze–merge run.
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Instrument`] | Validated ticker passed to the fetch step |
//! | [`Interval`] | Sampling granularity (1h, 1d) |
//! | [`WindowPolicy`] / [`DateWindow`] | Date range derived from the interval |
//! | [`PipelineRequest`] | Validated input for one run |
//! | [`PriceRecord`] | One raw row of the fetch artifact |
//! | [`SupportRange`] | One band reported by the analysis step |
//! | [`EnrichedDataPoint`] | Price record plus optional support band |
//!
//! Construction validates invariants where the value is produced by this
//! crate. Price rows are the exception: they carry upstream text verbatim and
//! leave numeric interpretation to the consumer.

mod instrument;
mod interval;
mod models;
mod request;
mod window;

pub use instrument::Instrument;
pub use interval::Interval;
pub use models::{EnrichedDataPoint, PriceRecord, SupportRange, PRICE_COLUMNS};
pub use request::PipelineRequest;
pub use window::{format_date, parse_date, today_utc, DateWindow, WindowPolicy};
