use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::geometry::{Arc, BBox, Line, Padstack, Point, Polygon};
use crate::layer::LayerGroupId;

/// Board object identifier, allocated in increasing order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ObjectId(pub u64);

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Unique subcircuit identifier.
pub type SubcircuitId = Uuid;

/// Transient per-object flag bits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ObjectFlags(u32);

impl ObjectFlags {
    pub const NONE: Self = Self(0);
    /// Marked by a connectivity crawl.
    pub const FOUND: Self = Self(1 << 0);
    /// Highlighted as part of a short circuit.
    pub const WARN: Self = Self(1 << 1);
    pub const SELECTED: Self = Self(1 << 2);

    pub fn bits(&self) -> u32 {
        self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn contains(&self, other: Self) -> bool {
        other.0 != 0 && self.0 & other.0 == other.0
    }

    pub fn insert(&mut self, other: Self) {
        self.0 |= other.0;
    }

    pub fn remove(&mut self, other: Self) {
        self.0 &= !other.0;
    }

    pub fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }
}

/// A rat line: an unrouted connection between two objects of one net.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatLine {
    pub p1: Point,
    pub p2: Point,
    pub group1: LayerGroupId,
    pub group2: LayerGroupId,
    pub anchor1: ObjectId,
    pub anchor2: ObjectId,
    /// Both ends already overlap in plan view; only a layer change is missing.
    pub via_equivalent: bool,
}

impl RatLine {
    pub fn length(&self) -> f64 {
        self.p1.distance_to(&self.p2)
    }

    pub fn bbox(&self) -> BBox {
        BBox::new(
            Point::new(self.p1.x.min(self.p2.x), self.p1.y.min(self.p2.y)),
            Point::new(self.p1.x.max(self.p2.x), self.p1.y.max(self.p2.y)),
        )
    }

    pub fn other_anchor(&self, id: ObjectId) -> Option<ObjectId> {
        if self.anchor1 == id {
            Some(self.anchor2)
        } else if self.anchor2 == id {
            Some(self.anchor1)
        } else {
            None
        }
    }
}

/// The geometry of a board object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Shape {
    Line(Line),
    Arc(Arc),
    Polygon(Polygon),
    Padstack(Padstack),
    Rat(RatLine),
}

impl Shape {
    pub fn bbox(&self) -> Option<BBox> {
        match self {
            Shape::Line(l) => Some(l.bbox()),
            Shape::Arc(a) => Some(a.bbox()),
            Shape::Polygon(p) => p.bbox(),
            Shape::Padstack(ps) => Some(ps.bbox()),
            Shape::Rat(r) => Some(r.bbox()),
        }
    }

    /// Copper layer groups the shape occupies; empty for rat lines.
    pub fn groups(&self) -> &[LayerGroupId] {
        match self {
            Shape::Line(l) => std::slice::from_ref(&l.group),
            Shape::Arc(a) => std::slice::from_ref(&a.group),
            Shape::Polygon(p) => std::slice::from_ref(&p.group),
            Shape::Padstack(ps) => &ps.groups,
            Shape::Rat(_) => &[],
        }
    }

    pub fn clearance(&self) -> f64 {
        match self {
            Shape::Line(l) => l.clearance,
            Shape::Arc(a) => a.clearance,
            Shape::Padstack(ps) => ps.clearance,
            Shape::Polygon(_) | Shape::Rat(_) => 0.0,
        }
    }

    pub fn is_rat(&self) -> bool {
        matches!(self, Shape::Rat(_))
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            Shape::Line(_) => "line",
            Shape::Arc(_) => "arc",
            Shape::Polygon(_) => "polygon",
            Shape::Padstack(_) => "padstack",
            Shape::Rat(_) => "rat",
        }
    }
}

/// An object placed on the board.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoardObject {
    pub id: ObjectId,
    pub shape: Shape,
    /// Owning subcircuit; supplies the refdes of the terminal.
    pub parent: Option<SubcircuitId>,
    /// Terminal (pin) name within the parent subcircuit.
    pub term: Option<String>,
    #[serde(default)]
    pub flags: ObjectFlags,
}

impl BoardObject {
    pub fn new(id: ObjectId, shape: Shape) -> Self {
        Self {
            id,
            shape,
            parent: None,
            term: None,
            flags: ObjectFlags::NONE,
        }
    }

    pub fn is_rat(&self) -> bool {
        self.shape.is_rat()
    }

    pub fn has_flag(&self, flag: ObjectFlags) -> bool {
        self.flags.contains(flag)
    }
}

/// A placed component; owns the pads that carry its terminals.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subcircuit {
    pub id: SubcircuitId,
    pub refdes: String,
}

impl Subcircuit {
    pub fn new(refdes: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            refdes: refdes.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::PadShape;

    #[test]
    fn test_flags() {
        let mut f = ObjectFlags::NONE;
        assert!(f.is_empty());
        f.insert(ObjectFlags::FOUND);
        f.insert(ObjectFlags::WARN);
        assert!(f.contains(ObjectFlags::FOUND));
        assert!(f.contains(ObjectFlags::FOUND.union(ObjectFlags::WARN)));
        f.remove(ObjectFlags::FOUND);
        assert!(!f.contains(ObjectFlags::FOUND));
        assert!(!f.contains(ObjectFlags::NONE));
    }

    #[test]
    fn test_shape_groups() {
        let line = Shape::Line(Line::new(1, Point::new(0.0, 0.0), Point::new(5.0, 0.0), 1.0));
        assert_eq!(line.groups(), &[1]);
        let via = Shape::Padstack(Padstack::new(
            Point::new(0.0, 0.0),
            PadShape::Circle { radius: 2.0 },
            vec![0, 1],
        ));
        assert_eq!(via.groups(), &[0, 1]);
    }

    #[test]
    fn test_rat_other_anchor() {
        let rat = RatLine {
            p1: Point::new(0.0, 0.0),
            p2: Point::new(3.0, 4.0),
            group1: 0,
            group2: 0,
            anchor1: ObjectId(1),
            anchor2: ObjectId(2),
            via_equivalent: false,
        };
        assert_eq!(rat.other_anchor(ObjectId(1)), Some(ObjectId(2)));
        assert_eq!(rat.other_anchor(ObjectId(9)), None);
        assert!((rat.length() - 5.0).abs() < 1e-10);
    }
}
