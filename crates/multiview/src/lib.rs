//! Multiview display router
//!
//! Tracks every live web content surface, lets the content pick which
//! display it renders on, and moves surfaces between the main window,
//! pop-up windows, fullscreen and secondary outputs without recreating them.

pub mod bridge;
pub mod config;
pub mod error;
pub mod events;
pub mod factory;
pub mod host;
pub mod ids;
pub mod orchestrator;
pub mod outputs;
pub mod registry;
pub mod router;
pub mod snapshot;

pub mod backend;

pub use error::RoutingError;
pub use ids::{ContainerHandle, OutputIndex, SurfaceId, ViewId, ViewKind};
pub use orchestrator::{Collaborators, Orchestrator};
