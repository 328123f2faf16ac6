//! Derived financial report engine for colporter fundraising programs
//!
//! Pure computations over read-only snapshots of program records:
//! revenue distribution, weekly/monthly bucketing, individual earnings,
//! bonification tiers, budget checks, incentive allocation, projections
//! and the summaries built from them. Nothing here performs network I/O;
//! exports write into caller-supplied writers.

pub mod bonification;
pub mod bucketing;
pub mod budget;
pub mod constants;
pub mod distribution;
pub mod error;
pub mod export;
pub mod incentive;
pub mod individual;
pub mod model;
pub mod projection;
pub mod summary;

pub use error::{ReportError, Result};
