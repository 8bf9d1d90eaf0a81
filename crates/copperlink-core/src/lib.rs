//! # CopperLink Core
//!
//! Board model for the connectivity engine: copper geometry primitives with
//! nearest-point helpers, layer groups, placed objects and subcircuits, the
//! netlist, an undo journal of reversible commands, and an R-tree spatial
//! index over copper.

pub mod geometry;
pub mod layer;
pub mod object;
pub mod netlist;
pub mod board;
pub mod commands;
pub mod spatial;
pub mod error;

pub use board::{Board, ObjectStore};
pub use error::BoardError;
pub use geometry::{Arc, BBox, Line, PadShape, Padstack, Point, Polygon};
pub use layer::{LayerGroup, LayerGroupId, LayerGroupKind, LayerStack};
pub use netlist::{Net, NetList, Terminal};
pub use object::{BoardObject, ObjectFlags, ObjectId, RatLine, Shape, Subcircuit, SubcircuitId};
