//! Platform backends
//!
//! - **HeadlessPlatform** (feature: `headless-backend`): in-memory container
//!   tree, scripted content engine and named outputs. No display or web
//!   engine required; used by tests and the `multiview` simulator.

#[cfg(feature = "headless-backend")]
pub mod headless;
