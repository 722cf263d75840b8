//! Geo-fence Authoring Sessions
//!
//! Replays a recorded authoring session (pointer clicks on the display
//! surface plus builder and registry commands) against the geo-fence core
//! and produces a report with the resulting fences, statistics and
//! render-ready paths.
//!
//! # Session File
//!
//! ```json
//! {
//!   "surface": { "width": 800, "height": 600 },
//!   "actions": [
//!     { "action": "click", "x": 120, "y": 80 },
//!     { "action": "click", "x": 220, "y": 80 },
//!     { "action": "click", "x": 170, "y": 160 },
//!     { "action": "finish" },
//!     { "action": "metadata", "name": "Red Fort", "category": "Restricted" },
//!     { "action": "commit" },
//!     { "action": "hide", "fence": "Red Fort" }
//!   ]
//! }
//! ```
//!
//! Rejected actions are logged and recorded in the report; replay always
//! runs to the end of the session.

use geofence_core::FenceError;
use thiserror::Error;

pub mod config;
pub mod replay;
pub mod session;

pub use config::AuthorConfig;
pub use replay::{replay_session, RejectedAction, Replayer, SessionReport};
pub use session::{load_session, Action, FenceEdit, Session};

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Invalid configuration: {0}")]
    Config(#[from] FenceError),
}

pub type Result<T> = std::result::Result<T, SessionError>;

/// Why a single session action was rejected
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ActionError {
    #[error(transparent)]
    Fence(#[from] FenceError),
    #[error("no fence named '{0}'")]
    UnknownFence(String),
    #[error("a fence named '{0}' already exists")]
    DuplicateName(String),
}
