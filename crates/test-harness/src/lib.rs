//! Test harness for multiview
//!
//! Drives a real orchestrator over the headless platform and a real calloop
//! event loop, so tests exercise the same event ordering as the host.
//!
//! # Modules
//!
//! - `headless`: [`TestRouter`], the orchestrator plus platform plus loop
//! - `assertions`: Common routing assertions
//! - `fixtures`: Test fixture helpers

pub mod assertions;
pub mod fixtures;
pub mod headless;

pub use headless::{TestError, TestRouter, TestRouterBuilder};
