use std::borrow::Cow;

use copperlink_core::geometry::{
    closest_arc_arc, closest_segment_arc, closest_segment_segment, outline_edges,
    point_in_outline, ClosestPair,
};
use copperlink_core::{Arc, BoardObject, LayerGroupId, PadShape, Point, Shape};

use crate::config::RatPolicy;

/// Squared distance of a pair that cannot be connected under the active policy.
pub const UNREACHABLE: f64 = f64::INFINITY;

/// Squared distance of copper that already overlaps.
pub const TOUCHING: f64 = 0.0;

/// Result of a distance query between two objects.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ObjDistance {
    /// Point on the copper of the first object.
    pub point_a: Point,
    /// Point on the copper of the second object.
    pub point_b: Point,
    pub group_a: LayerGroupId,
    pub group_b: LayerGroupId,
    /// Squared gap between the two points.
    pub d2: f64,
}

impl ObjDistance {
    pub fn unreachable() -> Self {
        Self {
            point_a: Point::new(0.0, 0.0),
            point_b: Point::new(0.0, 0.0),
            group_a: 0,
            group_b: 0,
            d2: UNREACHABLE,
        }
    }

    pub fn is_reachable(&self) -> bool {
        self.d2.is_finite()
    }

    pub fn is_touching(&self) -> bool {
        self.d2 == TOUCHING
    }

    pub fn distance(&self) -> f64 {
        self.d2.sqrt()
    }

    pub fn swapped(&self) -> Self {
        Self {
            point_a: self.point_b,
            point_b: self.point_a,
            group_a: self.group_b,
            group_b: self.group_a,
            d2: self.d2,
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Curve<'a> {
    Segment(Point, Point),
    Arc(&'a Arc),
}

impl Curve<'_> {
    fn start(&self) -> Point {
        match self {
            Curve::Segment(p, _) => *p,
            Curve::Arc(a) => a.start_point(),
        }
    }
}

// Every object kind reduces to a stroke (a centerline swept by a disc:
// lines, arcs, round pads) or an area (a filled outline: polygons,
// rectangular pads), so the sixteen kind pairs share four cases.
#[derive(Debug, Clone)]
enum Copper<'a> {
    Stroke { curve: Curve<'a>, radius: f64 },
    Area(Cow<'a, [Point]>),
}

impl Copper<'_> {
    fn radius(&self) -> f64 {
        match self {
            Copper::Stroke { radius, .. } => *radius,
            Copper::Area(_) => 0.0,
        }
    }
}

fn copper_of(shape: &Shape) -> Option<Copper<'_>> {
    match shape {
        Shape::Line(l) => Some(Copper::Stroke {
            curve: Curve::Segment(l.p1, l.p2),
            radius: l.thickness / 2.0,
        }),
        Shape::Arc(a) => Some(Copper::Stroke {
            curve: Curve::Arc(a),
            radius: a.thickness / 2.0,
        }),
        Shape::Polygon(p) => Some(Copper::Area(Cow::Borrowed(&p.points))),
        Shape::Padstack(ps) => match ps.shape {
            PadShape::Circle { radius } => Some(Copper::Stroke {
                curve: Curve::Segment(ps.center, ps.center),
                radius,
            }),
            PadShape::Rect { .. } => Some(Copper::Area(Cow::Owned(
                ps.outline().unwrap_or_default(),
            ))),
        },
        Shape::Rat(_) => None,
    }
}

fn curve_pair(a: Curve<'_>, b: Curve<'_>) -> ClosestPair {
    match (a, b) {
        (Curve::Segment(a1, a2), Curve::Segment(b1, b2)) => closest_segment_segment(a1, a2, b1, b2),
        (Curve::Segment(a1, a2), Curve::Arc(arc)) => closest_segment_arc(a1, a2, arc),
        (Curve::Arc(arc), Curve::Segment(b1, b2)) => closest_segment_arc(b1, b2, arc).swapped(),
        (Curve::Arc(x), Curve::Arc(y)) => closest_arc_arc(x, y),
    }
}

fn curve_area_pair(curve: Curve<'_>, outline: &[Point]) -> ClosestPair {
    let mut best = ClosestPair::empty();
    let start = curve.start();
    if point_in_outline(&start, outline) {
        best.offer(start, start);
        return best;
    }
    for (e1, e2) in outline_edges(outline) {
        let pair = curve_pair(curve, Curve::Segment(e1, e2));
        if pair.d2 < best.d2 {
            best = pair;
        }
        if best.d2 == TOUCHING {
            break;
        }
    }
    best
}

fn area_area_pair(a: &[Point], b: &[Point]) -> ClosestPair {
    let mut best = ClosestPair::empty();
    if let Some(v) = a.iter().find(|v| point_in_outline(v, b)) {
        best.offer(*v, *v);
        return best;
    }
    if let Some(v) = b.iter().find(|v| point_in_outline(v, a)) {
        best.offer(*v, *v);
        return best;
    }
    for (a1, a2) in outline_edges(a) {
        for (b1, b2) in outline_edges(b) {
            let pair = closest_segment_segment(a1, a2, b1, b2);
            if pair.d2 < best.d2 {
                best = pair;
            }
        }
    }
    best
}

/// Closest centerline/outline points, before stroke radii are applied.
fn copper_pair(a: &Copper<'_>, b: &Copper<'_>) -> ClosestPair {
    match (a, b) {
        (Copper::Stroke { curve: ca, .. }, Copper::Stroke { curve: cb, .. }) => curve_pair(*ca, *cb),
        (Copper::Stroke { curve, .. }, Copper::Area(outline)) => curve_area_pair(*curve, outline),
        (Copper::Area(outline), Copper::Stroke { curve, .. }) => {
            curve_area_pair(*curve, outline).swapped()
        }
        (Copper::Area(oa), Copper::Area(ob)) => area_area_pair(oa, ob),
    }
}

/// Nearest copper points of two forms; `TOUCHING` when they overlap.
fn copper_gap(a: &Copper<'_>, b: &Copper<'_>) -> (Point, Point, f64) {
    let pair = copper_pair(a, b);
    if !pair.d2.is_finite() {
        return (pair.a, pair.b, UNREACHABLE);
    }
    let (ra, rb) = (a.radius(), b.radius());
    let reach = ra + rb;
    if pair.d2 <= reach * reach {
        let contact = if pair.d2 > 0.0 {
            pair.a + (pair.b - pair.a) * (ra / reach)
        } else {
            pair.a
        };
        return (contact, contact, TOUCHING);
    }
    let d = pair.d2.sqrt();
    let dir = (pair.b - pair.a) * (1.0 / d);
    let pa = pair.a + dir * ra;
    let pb = pair.b - dir * rb;
    (pa, pb, pa.distance2_to(&pb))
}

fn manhattan_ok(shape: &Shape) -> bool {
    match shape {
        Shape::Line(l) => l.is_axis_aligned(),
        Shape::Arc(_) => false,
        _ => true,
    }
}

/// Layer group each end lands on: a shared group when there is one.
fn pick_groups(a: &Shape, b: &Shape) -> (LayerGroupId, LayerGroupId) {
    let (ga, gb) = (a.groups(), b.groups());
    if let Some(common) = ga.iter().find(|g| gb.contains(g)) {
        return (*common, *common);
    }
    (
        ga.first().copied().unwrap_or_default(),
        gb.first().copied().unwrap_or_default(),
    )
}

/// Distance between the copper of two shapes.
pub fn shape_distance(a: &Shape, b: &Shape, policy: &RatPolicy) -> ObjDistance {
    if policy.manhattan_only && !(manhattan_ok(a) && manhattan_ok(b)) {
        return ObjDistance::unreachable();
    }
    let (Some(ca), Some(cb)) = (copper_of(a), copper_of(b)) else {
        return ObjDistance::unreachable();
    };
    let (point_a, point_b, d2) = copper_gap(&ca, &cb);
    if !d2.is_finite() {
        return ObjDistance::unreachable();
    }
    let (group_a, group_b) = pick_groups(a, b);
    ObjDistance {
        point_a,
        point_b,
        group_a,
        group_b,
        d2,
    }
}

/// Distance between the copper of two board objects.
pub fn obj_distance(a: &BoardObject, b: &BoardObject, policy: &RatPolicy) -> ObjDistance {
    shape_distance(&a.shape, &b.shape, policy)
}

/// Squared distance from `p` to the copper of `shape`; `TOUCHING` inside it.
pub fn point_distance2(shape: &Shape, p: Point) -> f64 {
    let Some(copper) = copper_of(shape) else {
        return UNREACHABLE;
    };
    let probe = Copper::Stroke {
        curve: Curve::Segment(p, p),
        radius: 0.0,
    };
    copper_gap(&copper, &probe).2
}
