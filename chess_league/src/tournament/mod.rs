//! Tournament lifecycle management.

pub mod lifecycle;

pub use lifecycle::{RoundReport, TournamentLifecycle};
