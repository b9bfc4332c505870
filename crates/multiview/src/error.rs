//! Routing errors
//!
//! None of these are fatal. Callers log them and keep the session running;
//! a surface that fails to route stays wherever it last was, or nowhere.

use thiserror::Error;

use crate::ids::{OutputIndex, ViewId};

/// Errors raised by the registry, router and orchestrator
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RoutingError {
    /// An event referenced a view that is no longer registered
    #[error("no live view {0} (stale reference)")]
    StaleReference(ViewId),

    /// Content asked for a display that was not discovered at startup
    #[error("display {index} out of range ({available} secondary outputs)")]
    OutOfRangeDisplay { index: OutputIndex, available: usize },

    /// A view id was registered twice
    #[error("view {0} is already registered")]
    DuplicateIdentity(ViewId),

    /// The content engine could not build a surface
    #[error("content engine error: {0}")]
    Engine(String),
}
