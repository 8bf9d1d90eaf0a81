//! # CopperLink Rats
//!
//! Connectivity analysis and rat-line synthesis for a PCB editor.
//! Copper is crawled from each terminal of a net to find the groups of
//! terminals already joined (subnets); the closest pairs between subnets
//! are then bridged by rat lines, Prim-style, and crawls that reach a
//! terminal of another net are reported as shorts.

pub mod config;
pub mod connect;
pub mod crawl;
pub mod distance;
pub mod error;
pub mod hooks;
pub mod orchestrator;
pub mod outcome;
pub mod short;
pub mod subnet;

pub use config::{RatConfig, RatPolicy};
pub use connect::{connect_subnets, ConnectResult};
pub use crawl::{crawl, ConnIndex, ConnectionKind, CrawlContext, Discovery};
pub use distance::{obj_distance, shape_distance, ObjDistance, TOUCHING, UNREACHABLE};
pub use error::{RatEnd, RatError};
pub use hooks::{BackAnnotation, EditorHooks, MessageLevel, RecordingHooks, ShortIndication};
pub use orchestrator::{AllNetsReport, ManualRat, NetOrchestrator};
pub use outcome::{NetRats, RatOutcome, RatTotals};
pub use short::{ShortSummary, ShortTracker};
pub use subnet::{extract_subnets, Extraction, Subnet};
