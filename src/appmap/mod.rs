//! Transaction map core: graph building, layout stepping and walker animation.
//!
//! Nothing here touches the browser. The canvas component reads node, walker and trail
//! positions out of an [`AppmapScene`] once per frame.

/// Graph and trace errors.
pub mod error;
/// Deduplicated node and edge store.
pub mod graph;
/// Hop sequences to graph.
pub mod ingest;
/// Layout engines and their driver.
pub mod layout;
/// Per-frame coordination.
pub mod scene;
/// Trace documents.
pub mod trace;
/// Walker particle trails.
pub mod trail;
/// Input records and configuration.
pub mod types;
/// Looping walker timelines.
pub mod walker;

pub use error::{GraphError, TraceError};
pub use graph::{Edge, GraphModel, Node};
pub use ingest::{PathIngestor, Shape, TypeLookup, TypeTable, VisualMetadata};
pub use layout::{ForceDirectedLayout, LayoutDriver, LayoutEngine, LayoutOptions, LayoutState};
pub use scene::{AppmapScene, FrameReport, SceneInfo, Walker};
pub use trace::parse_traces;
pub use trail::TrailBuffer;
pub use types::{AppmapConfig, HopRecord, HopSequence, LayoutMode, NodeId, Vec3};
pub use walker::{Timeline, TimelineSegment, WalkerScheduler, WalkerState};

/// The two recorded transactions shown on the home page.
pub const DEMO_TRACES: &str = include_str!("../../assets/transactions.json");
