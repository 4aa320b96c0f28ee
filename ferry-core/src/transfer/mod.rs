//! Inbox transfer pipeline.
//!
//! A [`CycleScheduler`] fires a [`ScanCycle`] on a fixed interval. Each cycle
//! lists the inbox, pushes every file onto a fresh [`WorkQueue`] and drains it
//! through a [`WorkerPool`] whose workers hand each item to a [`Mover`].

pub mod config;
pub mod cycle;
pub mod mover;
pub mod pool;
pub mod queue;
pub mod scheduler;

pub use config::*;
pub use cycle::*;
pub use mover::*;
pub use pool::*;
pub use queue::*;
pub use scheduler::*;
