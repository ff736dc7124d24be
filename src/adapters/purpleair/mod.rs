//! PurpleAir sensor API adapter
//!
//! - [`source`] - the [`ReadingSource`] seam the export orchestrator fetches through
//! - [`client`] - [`PurpleAirClient`], the HTTP implementation
//! - [`models`] - response shapes

pub mod client;
pub mod models;
pub mod source;

pub use client::PurpleAirClient;
pub use models::{ColumnarResponse, ErrorBody};
pub use source::{ReadingQuery, ReadingSource, StaticReadingSource};
