use std::ops::{Add, Mul, Sub};

use serde::{Deserialize, Serialize};

use crate::layer::LayerGroupId;

/// A 2D point in board coordinates (nanometers).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance_to(&self, other: &Point) -> f64 {
        self.distance2_to(other).sqrt()
    }

    /// Squared Euclidean distance; preferred for comparisons.
    pub fn distance2_to(&self, other: &Point) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx * dx + dy * dy
    }

    pub fn translate(&self, dx: f64, dy: f64) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }

    pub fn dot(&self, other: &Point) -> f64 {
        self.x * other.x + self.y * other.y
    }

    pub fn cross(&self, other: &Point) -> f64 {
        self.x * other.y - self.y * other.x
    }

    pub fn length(&self) -> f64 {
        self.dot(self).sqrt()
    }
}

impl Add for Point {
    type Output = Point;

    fn add(self, rhs: Point) -> Point {
        Point::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Point {
    type Output = Point;

    fn sub(self, rhs: Point) -> Point {
        Point::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f64> for Point {
    type Output = Point;

    fn mul(self, k: f64) -> Point {
        Point::new(self.x * k, self.y * k)
    }
}

/// An axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BBox {
    pub min: Point,
    pub max: Point,
}

impl BBox {
    pub fn new(min: Point, max: Point) -> Self {
        Self { min, max }
    }

    pub fn from_points(points: &[Point]) -> Option<Self> {
        if points.is_empty() {
            return None;
        }
        let mut min_x = f64::MAX;
        let mut min_y = f64::MAX;
        let mut max_x = f64::MIN;
        let mut max_y = f64::MIN;
        for p in points {
            min_x = min_x.min(p.x);
            min_y = min_y.min(p.y);
            max_x = max_x.max(p.x);
            max_y = max_y.max(p.y);
        }
        Some(Self {
            min: Point::new(min_x, min_y),
            max: Point::new(max_x, max_y),
        })
    }

    pub fn width(&self) -> f64 {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> f64 {
        self.max.y - self.min.y
    }

    pub fn center(&self) -> Point {
        Point::new(
            (self.min.x + self.max.x) / 2.0,
            (self.min.y + self.max.y) / 2.0,
        )
    }

    /// Grow the box by `d` on every side.
    pub fn inflate(&self, d: f64) -> Self {
        Self {
            min: self.min.translate(-d, -d),
            max: self.max.translate(d, d),
        }
    }

    pub fn contains_point(&self, p: &Point) -> bool {
        p.x >= self.min.x && p.x <= self.max.x && p.y >= self.min.y && p.y <= self.max.y
    }

    pub fn intersects(&self, other: &BBox) -> bool {
        self.min.x <= other.max.x
            && self.max.x >= other.min.x
            && self.min.y <= other.max.y
            && self.max.y >= other.min.y
    }

    pub fn union(&self, other: &BBox) -> Self {
        Self {
            min: Point::new(self.min.x.min(other.min.x), self.min.y.min(other.min.y)),
            max: Point::new(self.max.x.max(other.max.x), self.max.y.max(other.max.y)),
        }
    }
}

/// A straight copper trace with round caps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Line {
    pub group: LayerGroupId,
    pub p1: Point,
    pub p2: Point,
    pub thickness: f64,
    /// Keep-away distance a clearing polygon must respect around this line.
    pub clearance: f64,
}

impl Line {
    pub fn new(group: LayerGroupId, p1: Point, p2: Point, thickness: f64) -> Self {
        Self {
            group,
            p1,
            p2,
            thickness,
            clearance: 0.0,
        }
    }

    pub fn with_clearance(mut self, clearance: f64) -> Self {
        self.clearance = clearance;
        self
    }

    pub fn bbox(&self) -> BBox {
        BBox::new(
            Point::new(self.p1.x.min(self.p2.x), self.p1.y.min(self.p2.y)),
            Point::new(self.p1.x.max(self.p2.x), self.p1.y.max(self.p2.y)),
        )
        .inflate(self.thickness / 2.0)
    }

    pub fn length(&self) -> f64 {
        self.p1.distance_to(&self.p2)
    }

    /// Horizontal, vertical or zero-length.
    pub fn is_axis_aligned(&self) -> bool {
        self.p1.x == self.p2.x || self.p1.y == self.p2.y
    }
}

/// A circular copper arc. Angles are in degrees, counter-clockwise from +X;
/// a negative `delta` sweeps clockwise.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Arc {
    pub group: LayerGroupId,
    pub center: Point,
    pub radius: f64,
    pub start_angle: f64,
    pub delta: f64,
    pub thickness: f64,
    pub clearance: f64,
}

impl Arc {
    pub fn new(
        group: LayerGroupId,
        center: Point,
        radius: f64,
        start_angle: f64,
        delta: f64,
        thickness: f64,
    ) -> Self {
        Self {
            group,
            center,
            radius,
            start_angle,
            delta,
            thickness,
            clearance: 0.0,
        }
    }

    pub fn point_at(&self, angle_deg: f64) -> Point {
        let rad = angle_deg.to_radians();
        Point::new(
            self.center.x + self.radius * rad.cos(),
            self.center.y + self.radius * rad.sin(),
        )
    }

    pub fn start_point(&self) -> Point {
        self.point_at(self.start_angle)
    }

    pub fn end_point(&self) -> Point {
        self.point_at(self.start_angle + self.delta)
    }

    /// Whether the sweep covers `angle_deg`.
    pub fn contains_angle(&self, angle_deg: f64) -> bool {
        if self.delta.abs() >= 360.0 {
            return true;
        }
        let (from, sweep) = if self.delta < 0.0 {
            (self.start_angle + self.delta, -self.delta)
        } else {
            (self.start_angle, self.delta)
        };
        (angle_deg - from).rem_euclid(360.0) <= sweep
    }

    /// Closest point of the arc centerline to `p`.
    pub fn closest_point(&self, p: Point) -> Point {
        let v = p - self.center;
        if v.x == 0.0 && v.y == 0.0 {
            return self.start_point();
        }
        let angle = v.y.atan2(v.x).to_degrees();
        if self.contains_angle(angle) {
            return self.center + v * (self.radius / v.length());
        }
        let (s, e) = (self.start_point(), self.end_point());
        if p.distance2_to(&s) <= p.distance2_to(&e) {
            s
        } else {
            e
        }
    }

    pub fn bbox(&self) -> BBox {
        let mut pts = vec![self.start_point(), self.end_point()];
        for cardinal in [0.0, 90.0, 180.0, 270.0] {
            if self.contains_angle(cardinal) {
                pts.push(self.point_at(cardinal));
            }
        }
        // from_points is only None for an empty slice
        BBox::from_points(&pts)
            .unwrap_or_else(|| BBox::new(self.center, self.center))
            .inflate(self.thickness / 2.0)
    }
}

/// A filled copper region.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Polygon {
    pub group: LayerGroupId,
    pub points: Vec<Point>,
    /// Clearing polygons keep away from objects that carry a clearance.
    pub clears: bool,
}

impl Polygon {
    pub fn new(group: LayerGroupId, points: Vec<Point>) -> Self {
        Self {
            group,
            points,
            clears: false,
        }
    }

    pub fn clearing(mut self) -> Self {
        self.clears = true;
        self
    }

    pub fn bbox(&self) -> Option<BBox> {
        BBox::from_points(&self.points)
    }

    pub fn vertex_count(&self) -> usize {
        self.points.len()
    }

    /// Closed edge list, last vertex back to the first.
    pub fn edges(&self) -> impl Iterator<Item = (Point, Point)> + '_ {
        outline_edges(&self.points)
    }

    pub fn contains_point(&self, p: &Point) -> bool {
        point_in_outline(p, &self.points)
    }
}

/// Copper shape of a padstack on each of its layer groups.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum PadShape {
    Circle { radius: f64 },
    Rect { width: f64, height: f64 },
}

/// A pad or via spanning one or more copper layer groups.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Padstack {
    pub center: Point,
    pub shape: PadShape,
    pub groups: Vec<LayerGroupId>,
    pub clearance: f64,
    /// Groups on which a thermal joins the padstack to a clearing polygon.
    pub thermals: Vec<LayerGroupId>,
}

impl Padstack {
    pub fn new(center: Point, shape: PadShape, groups: Vec<LayerGroupId>) -> Self {
        Self {
            center,
            shape,
            groups,
            clearance: 0.0,
            thermals: Vec::new(),
        }
    }

    pub fn with_clearance(mut self, clearance: f64) -> Self {
        self.clearance = clearance;
        self
    }

    pub fn with_thermal(mut self, group: LayerGroupId) -> Self {
        self.thermals.push(group);
        self
    }

    /// Corner outline of a rectangular pad, `None` for round pads.
    pub fn outline(&self) -> Option<Vec<Point>> {
        match self.shape {
            PadShape::Circle { .. } => None,
            PadShape::Rect { width, height } => {
                let (hw, hh) = (width / 2.0, height / 2.0);
                let c = self.center;
                Some(vec![
                    c.translate(-hw, -hh),
                    c.translate(hw, -hh),
                    c.translate(hw, hh),
                    c.translate(-hw, hh),
                ])
            }
        }
    }

    pub fn bbox(&self) -> BBox {
        let (hw, hh) = match self.shape {
            PadShape::Circle { radius } => (radius, radius),
            PadShape::Rect { width, height } => (width / 2.0, height / 2.0),
        };
        BBox::new(self.center.translate(-hw, -hh), self.center.translate(hw, hh))
    }
}

// ── Nearest-point helpers ────────────────────────────────────────────

pub fn outline_edges(points: &[Point]) -> impl Iterator<Item = (Point, Point)> + '_ {
    let n = points.len();
    (0..n).map(move |i| (points[i], points[(i + 1) % n]))
}

/// Even-odd point-in-polygon test; points on the outline count as inside.
pub fn point_in_outline(p: &Point, outline: &[Point]) -> bool {
    if outline.len() < 3 {
        return false;
    }
    let mut inside = false;
    for (a, b) in outline_edges(outline) {
        if closest_on_segment(*p, a, b) == *p {
            return true;
        }
        if (a.y > p.y) != (b.y > p.y) {
            let x_cross = a.x + (p.y - a.y) / (b.y - a.y) * (b.x - a.x);
            if p.x < x_cross {
                inside = !inside;
            }
        }
    }
    inside
}

/// Closest point to `p` on segment `a`-`b`; a zero-length segment yields `a`.
pub fn closest_on_segment(p: Point, a: Point, b: Point) -> Point {
    let ab = b - a;
    let len2 = ab.dot(&ab);
    if len2 == 0.0 {
        return a;
    }
    let t = ((p - a).dot(&ab) / len2).clamp(0.0, 1.0);
    a + ab * t
}

/// Crossing point of two non-parallel segments, if any.
///
/// Collinear overlaps are not reported here; an endpoint of one segment then
/// lies on the other, which the endpoint projections in
/// [`closest_segment_segment`] pick up at zero distance.
pub fn segment_intersection(a1: Point, a2: Point, b1: Point, b2: Point) -> Option<Point> {
    let r = a2 - a1;
    let s = b2 - b1;
    let denom = r.cross(&s);
    if denom == 0.0 {
        return None;
    }
    let qp = b1 - a1;
    let t = qp.cross(&s) / denom;
    let u = qp.cross(&r) / denom;
    if (0.0..=1.0).contains(&t) && (0.0..=1.0).contains(&u) {
        Some(a1 + r * t)
    } else {
        None
    }
}

/// Keeps the first strictly-closest pair offered.
#[derive(Debug, Clone, Copy)]
pub struct ClosestPair {
    pub a: Point,
    pub b: Point,
    pub d2: f64,
}

impl ClosestPair {
    pub fn empty() -> Self {
        Self {
            a: Point::new(0.0, 0.0),
            b: Point::new(0.0, 0.0),
            d2: f64::INFINITY,
        }
    }

    pub fn offer(&mut self, a: Point, b: Point) {
        let d2 = a.distance2_to(&b);
        if d2 < self.d2 {
            *self = Self { a, b, d2 };
        }
    }

    pub fn swapped(self) -> Self {
        Self {
            a: self.b,
            b: self.a,
            d2: self.d2,
        }
    }
}

pub fn closest_segment_segment(a1: Point, a2: Point, b1: Point, b2: Point) -> ClosestPair {
    let mut best = ClosestPair::empty();
    if let Some(x) = segment_intersection(a1, a2, b1, b2) {
        best.offer(x, x);
        return best;
    }
    best.offer(a1, closest_on_segment(a1, b1, b2));
    best.offer(a2, closest_on_segment(a2, b1, b2));
    best.offer(closest_on_segment(b1, a1, a2), b1);
    best.offer(closest_on_segment(b2, a1, a2), b2);
    best
}

/// Parameters `t` in [0, 1] where segment `a`-`b` crosses the circle.
fn segment_circle_params(a: Point, b: Point, center: Point, radius: f64) -> Vec<f64> {
    let d = b - a;
    let f = a - center;
    let qa = d.dot(&d);
    if qa == 0.0 {
        return Vec::new();
    }
    let qb = 2.0 * f.dot(&d);
    let qc = f.dot(&f) - radius * radius;
    let disc = qb * qb - 4.0 * qa * qc;
    if disc < 0.0 {
        return Vec::new();
    }
    let root = disc.sqrt();
    [(-qb - root) / (2.0 * qa), (-qb + root) / (2.0 * qa)]
        .into_iter()
        .filter(|t| (0.0..=1.0).contains(t))
        .collect()
}

fn angle_of(center: Point, p: Point) -> f64 {
    let v = p - center;
    v.y.atan2(v.x).to_degrees()
}

pub fn closest_segment_arc(a: Point, b: Point, arc: &Arc) -> ClosestPair {
    let mut best = ClosestPair::empty();
    for t in segment_circle_params(a, b, arc.center, arc.radius) {
        let x = a + (b - a) * t;
        if arc.contains_angle(angle_of(arc.center, x)) {
            best.offer(x, x);
            return best;
        }
    }
    best.offer(a, arc.closest_point(a));
    best.offer(b, arc.closest_point(b));
    let (s, e) = (arc.start_point(), arc.end_point());
    best.offer(closest_on_segment(s, a, b), s);
    best.offer(closest_on_segment(e, a, b), e);

    // interior critical point: foot of the perpendicular from the center
    let foot = closest_on_segment(arc.center, a, b);
    let v = foot - arc.center;
    if v.length() > 0.0 && arc.contains_angle(angle_of(arc.center, foot)) {
        best.offer(foot, arc.center + v * (arc.radius / v.length()));
    }
    best
}

fn circle_intersections(c1: Point, r1: f64, c2: Point, r2: f64) -> Vec<Point> {
    let d = c1.distance_to(&c2);
    if d == 0.0 || d > r1 + r2 || d < (r1 - r2).abs() {
        return Vec::new();
    }
    let u = (c2 - c1) * (1.0 / d);
    let a = (r1 * r1 - r2 * r2 + d * d) / (2.0 * d);
    let h = (r1 * r1 - a * a).max(0.0).sqrt();
    let base = c1 + u * a;
    let perp = Point::new(-u.y, u.x);
    vec![base + perp * h, base - perp * h]
}

pub fn closest_arc_arc(a: &Arc, b: &Arc) -> ClosestPair {
    let mut best = ClosestPair::empty();
    for x in circle_intersections(a.center, a.radius, b.center, b.radius) {
        if a.contains_angle(angle_of(a.center, x)) && b.contains_angle(angle_of(b.center, x)) {
            best.offer(x, x);
            return best;
        }
    }
    for p in [a.start_point(), a.end_point()] {
        best.offer(p, b.closest_point(p));
    }
    for p in [b.start_point(), b.end_point()] {
        best.offer(a.closest_point(p), p);
    }

    // critical points along the line joining the centers
    let d = a.center.distance_to(&b.center);
    if d > 0.0 {
        let u = (b.center - a.center) * (1.0 / d);
        for sa in [1.0, -1.0] {
            let pa = a.center + u * (a.radius * sa);
            if !a.contains_angle(angle_of(a.center, pa)) {
                continue;
            }
            for sb in [1.0, -1.0] {
                let pb = b.center + u * (b.radius * sb);
                if b.contains_angle(angle_of(b.center, pb)) {
                    best.offer(pa, pb);
                }
            }
        }
    }
    best
}
