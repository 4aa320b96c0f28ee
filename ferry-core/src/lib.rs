//! # Ferry Core
//!
//! Core library for Ferry, a small import service that periodically sweeps an
//! inbox directory and relocates every file it finds into a processed
//! directory.
//!
//! ## Overview
//!
//! - **Transfer pipeline**: scheduled scan cycles, a drainable work queue and a
//!   bounded pool of movers ([`transfer`])
//! - **Errors**: cycle and per-file failure types ([`error`])
//! - **Seeding**: fake CSV drops for local runs ([`demo`])
//!
//! ## Examples
//!
//! ```no_run
//! use ferry_core::transfer::{CycleScheduler, ScanCycle, TransferConfig};
//! use tokio_util::sync::CancellationToken;
//!
//! async fn sweep_forever() {
//!     let config = TransferConfig::default();
//!     let cycle = ScanCycle::for_directories("./data/inbox", "./data/processed", &config);
//!     let scheduler = CycleScheduler::new(cycle, config.scan_interval());
//!     scheduler.run(CancellationToken::new()).await;
//! }
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]
#![allow(missing_docs)]

/// Error types for cycles and individual moves
pub mod error;

/// Scan, queue and move pipeline
pub mod transfer;

/// Inbox seeding helpers for local runs
pub mod demo;

pub use error::{MoveError, Result, TransferError};
