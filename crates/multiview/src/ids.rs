//! Identity types for surfaces, views, outputs and containers
//!
//! A surface owns exactly one primary view and at most one fullscreen view.
//! Both live in the same registry, so the view id carries an explicit kind
//! tag instead of overloading the numeric space.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Unique identifier for a content surface
///
/// INVARIANT: no two concurrently live surfaces share an id. Ids come from
/// [`SurfaceIdAllocator`] and are never handed out twice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SurfaceId(pub u64);

impl fmt::Display for SurfaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Which presentation of a surface a view refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewKind {
    /// The surface's own (windowed or main-container) presentation
    Primary,
    /// The fullscreen presentation requested by the surface's content
    Fullscreen,
}

/// Registry key: a surface id tagged with the presentation it names
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ViewId {
    pub base: SurfaceId,
    pub kind: ViewKind,
}

impl ViewId {
    /// The primary view of a surface
    pub fn primary(base: SurfaceId) -> Self {
        Self { kind: ViewKind::Primary, base }
    }

    /// The fullscreen view derived from a surface
    pub fn fullscreen(base: SurfaceId) -> Self {
        Self { kind: ViewKind::Fullscreen, base }
    }

    /// Surface that owns this view
    pub fn owner(&self) -> SurfaceId {
        self.base
    }

    pub fn is_fullscreen(&self) -> bool {
        self.kind == ViewKind::Fullscreen
    }
}

impl fmt::Display for ViewId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            ViewKind::Primary => write!(f, "{}", self.base),
            ViewKind::Fullscreen => write!(f, "{}:fullscreen", self.base),
        }
    }
}

/// Ordinal of an output display
///
/// Index 0 is always the main application window. Indices 1..=N are the
/// secondary outputs in discovery order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct OutputIndex(pub usize);

impl OutputIndex {
    /// The main application window
    pub const MAIN: OutputIndex = OutputIndex(0);

    /// Stands in for a requested index no output can have (negative or
    /// beyond `usize`); always out of range
    pub const UNADDRESSABLE: OutputIndex = OutputIndex(usize::MAX);

    pub fn is_main(&self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for OutputIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque reference to a native layout container owned by the host platform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ContainerHandle(pub u64);

impl fmt::Display for ContainerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "container#{}", self.0)
    }
}

/// Monotonic surface id source
#[derive(Debug, Clone)]
pub struct SurfaceIdAllocator {
    next: u64,
}

impl SurfaceIdAllocator {
    pub fn new() -> Self {
        Self::starting_at(1)
    }

    pub fn starting_at(first: u64) -> Self {
        Self { next: first }
    }

    /// Hand out the next id
    pub fn allocate(&mut self) -> SurfaceId {
        let id = SurfaceId(self.next);
        self.next = self.next.wrapping_add(1);
        id
    }
}

impl Default for SurfaceIdAllocator {
    fn default() -> Self {
        Self::new()
    }
}
