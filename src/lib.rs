//! # chart-ab: Chart Readability A/B Testing
//!
//! **Version**: 0.1.0
//!
//! chart-ab shows a participant one of two randomly chosen renderings of a
//! fixed penguin dataset, times how long they take to answer a question
//! about it, and appends that measurement to a tabular store. The
//! accumulated log is summarized per condition and compared with Welch's
//! t-test.
//!
//! ## Design Principles
//!
//! - **Exactly-once logging**: a trial produces at most one record, however
//!   often its completion is triggered
//! - **Explicit trial state**: `Idle -> Running -> AwaitingLog -> Idle`,
//!   threaded through a [`experiment::TrialStateMachine`] value
//! - **Degrade, don't crash**: unreadable data serves cached or empty data
//!   with a visible message
//! - **Swappable collaborators**: storage ([`store::DataStore`]), condition
//!   draws ([`experiment::ConditionSelector`]), rendering
//!   ([`chart::ChartRenderer`]) and time ([`clock::Clock`]) are traits
//!
//! ## Example Usage
//!
//! ```rust
//! use std::sync::Arc;
//! use chart_ab::config::AppConfig;
//! use chart_ab::session::ExperimentSession;
//! use chart_ab::store::{DataStore, MemoryStore, Row};
//!
//! # async fn example() -> chart_ab::Result<()> {
//! let store = Arc::new(MemoryStore::new());
//! store
//!     .append_row(
//!         "penguins",
//!         Row::new()
//!             .with("species", "Adelie")
//!             .with("bill_length_mm", "39.1")
//!             .with("bill_depth_mm", "18.7"),
//!     )
//!     .await?;
//!
//! let mut session = ExperimentSession::new(store, &AppConfig::default());
//! let shown = session.show_chart().await?;
//! println!("showing {}", shown.chart.title());
//!
//! let answer = session.answered().await?;
//! println!("{}", answer.message().unwrap_or_default());
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

pub mod chart;
pub mod clock;
pub mod config;
pub mod csv;
pub mod dataset;
pub mod error;
pub mod experiment;
pub mod export;
pub mod session;
pub mod stats;
pub mod store;
pub mod telemetry;

pub use error::{Error, Result};
