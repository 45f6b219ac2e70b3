//! Service objects holding the application state, shared with routes through
//! Rocket managed state.

use rocket::tokio::sync::Mutex;

use crate::analysis::AnalysisSession;

mod election;
mod reconcile;
mod theme;

pub use election::{ElectionState, VoteOutcome};
pub use theme::ThemeState;

pub type SharedElection = Mutex<ElectionState>;
pub type SharedTheme = Mutex<ThemeState>;
pub type SharedAnalysis = Mutex<AnalysisSession>;
