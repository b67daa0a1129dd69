//! Lobby tracking
//!
//! This module contains the poll-filter-dedup loop together with its pieces:
//! the bounded seen-set, the admission filter and the publish pacing policy.

pub mod filter;
pub mod pacing;
pub mod poller;
pub mod seen;

pub use filter::{Admission, AdmissionFilter, KeywordMatcher};
pub use pacing::{FixedDelayPacer, NoDelayPacer, PublishPacer};
pub use poller::{LobbyTracker, TickOutcome, TickReport, TrackerOptions, TrackerStats};
pub use seen::SeenSet;
