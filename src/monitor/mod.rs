//! Feed monitor for rss-notify.
//!
//! This module provides the poll cycle (new-item detection under either
//! policy) and the scheduler that drives it.

pub mod cycle;
pub mod filter;
pub mod scheduler;

pub use cycle::{CycleReport, LatestDelivery, Policy, PollCycle, DEFAULT_COURTESY_DELAY};
pub use filter::KeywordFilter;
pub use scheduler::Scheduler;
