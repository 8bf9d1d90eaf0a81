use std::collections::{HashMap, HashSet, VecDeque};

use copperlink_core::spatial::SpatialIndex;
use copperlink_core::{Board, BoardObject, ObjectFlags, ObjectId, ObjectStore, Shape, SubcircuitId};

use crate::config::{RatConfig, RatPolicy};
use crate::distance::shape_distance;

/// How a crawl reached an object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionKind {
    /// The seed of the crawl.
    Start,
    /// Geometric copper contact.
    Copper,
    /// Same terminal of the same subcircuit, joined inside the part.
    Internal,
    /// Through a rat line.
    Rat,
}

/// One newly discovered object, as handed to the found callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Discovery {
    pub object: ObjectId,
    pub arrived_from: Option<ObjectId>,
    pub kind: ConnectionKind,
}

/// Lookup tables shared by every crawl of one pass.
pub struct ConnIndex {
    spatial: SpatialIndex,
    rats_by_anchor: HashMap<ObjectId, Vec<ObjectId>>,
    terminals: HashMap<(SubcircuitId, String), Vec<ObjectId>>,
}

impl ConnIndex {
    pub fn build(board: &Board) -> Self {
        let mut rats_by_anchor: HashMap<ObjectId, Vec<ObjectId>> = HashMap::new();
        let mut terminals: HashMap<(SubcircuitId, String), Vec<ObjectId>> = HashMap::new();
        for obj in board.store.objects() {
            if let Shape::Rat(rat) = &obj.shape {
                rats_by_anchor.entry(rat.anchor1).or_default().push(obj.id);
                rats_by_anchor.entry(rat.anchor2).or_default().push(obj.id);
            } else if board.is_copper(obj) {
                if let (Some(parent), Some(term)) = (obj.parent, obj.term.as_ref()) {
                    terminals
                        .entry((parent, term.clone()))
                        .or_default()
                        .push(obj.id);
                }
            }
        }
        Self {
            spatial: board.copper_index(),
            rats_by_anchor,
            terminals,
        }
    }

    pub fn spatial(&self) -> &SpatialIndex {
        &self.spatial
    }
}

/// Per-pass crawl state; one context may span several crawls so that
/// objects visited by an earlier crawl are skipped by later ones.
#[derive(Debug, Clone)]
pub struct CrawlContext {
    pub bloat: f64,
    pub ignore_clearance: bool,
    /// Follow rat lines to the objects they anchor.
    pub consider_rats: bool,
    /// Apply the flag change to rat lines only.
    pub only_mark_rats: bool,
    pub flag_set: ObjectFlags,
    pub flag_clear: ObjectFlags,
    /// Keep every discovered id in [`CrawlContext::found`].
    pub accumulate: bool,
    found: Vec<ObjectId>,
    visited: HashSet<ObjectId>,
}

impl CrawlContext {
    pub fn new(bloat: f64) -> Self {
        Self {
            bloat,
            ignore_clearance: false,
            consider_rats: false,
            only_mark_rats: false,
            flag_set: ObjectFlags::NONE,
            flag_clear: ObjectFlags::NONE,
            accumulate: false,
            found: Vec::new(),
            visited: HashSet::new(),
        }
    }

    pub fn from_config(config: &RatConfig) -> Self {
        let mut ctx = Self::new(config.bloat);
        ctx.ignore_clearance = config.ignore_clearance;
        ctx
    }

    pub fn with_rats(mut self) -> Self {
        self.consider_rats = true;
        self
    }

    pub fn with_flags(mut self, set: ObjectFlags, clear: ObjectFlags) -> Self {
        self.flag_set = set;
        self.flag_clear = clear;
        self
    }

    pub fn accumulating(mut self) -> Self {
        self.accumulate = true;
        self
    }

    pub fn is_visited(&self, id: ObjectId) -> bool {
        self.visited.contains(&id)
    }

    pub fn visited_count(&self) -> usize {
        self.visited.len()
    }

    pub fn found(&self) -> &[ObjectId] {
        &self.found
    }
}

fn shares_group(a: &BoardObject, b: &BoardObject) -> bool {
    let gb = b.shape.groups();
    a.shape.groups().iter().any(|g| gb.contains(g))
}

/// A clearing polygon keeps away from `other` unless a thermal joins them.
fn clearance_blocks(poly: &BoardObject, other: &BoardObject) -> bool {
    let Shape::Polygon(p) = &poly.shape else {
        return false;
    };
    if !p.clears || other.shape.clearance() <= 0.0 {
        return false;
    }
    match &other.shape {
        Shape::Padstack(ps) => !ps.thermals.contains(&p.group),
        Shape::Polygon(_) => false,
        _ => true,
    }
}

/// Whether the copper of `a` and `b` is electrically joined.
pub fn touches(a: &BoardObject, b: &BoardObject, ctx: &CrawlContext) -> bool {
    if a.is_rat() || b.is_rat() || !shares_group(a, b) {
        return false;
    }
    if !ctx.ignore_clearance && (clearance_blocks(a, b) || clearance_blocks(b, a)) {
        return false;
    }
    let d = shape_distance(&a.shape, &b.shape, &RatPolicy::precise());
    d.is_reachable() && d.d2 <= ctx.bloat * ctx.bloat
}

/// Neighbours of `id` not yet visited in this pass.
fn neighbours(
    store: &ObjectStore,
    index: &ConnIndex,
    ctx: &CrawlContext,
    id: ObjectId,
) -> Vec<(ObjectId, ConnectionKind)> {
    let mut next = Vec::new();
    let Some(obj) = store.get(id) else {
        return next;
    };

    if let Shape::Rat(rat) = &obj.shape {
        if ctx.consider_rats {
            next.push((rat.anchor1, ConnectionKind::Rat));
            next.push((rat.anchor2, ConnectionKind::Rat));
        }
        return next;
    }

    if let Some(bbox) = obj.shape.bbox() {
        for cand in index.spatial.query_bbox(&bbox.inflate(ctx.bloat)) {
            if cand == id || ctx.visited.contains(&cand) {
                continue;
            }
            if let Some(other) = store.get(cand) {
                if touches(obj, other, ctx) {
                    next.push((cand, ConnectionKind::Copper));
                }
            }
        }
    }

    if let (Some(parent), Some(term)) = (obj.parent, obj.term.as_ref()) {
        if let Some(siblings) = index.terminals.get(&(parent, term.clone())) {
            next.extend(
                siblings
                    .iter()
                    .filter(|s| **s != id)
                    .map(|s| (*s, ConnectionKind::Internal)),
            );
        }
    }

    if ctx.consider_rats {
        if let Some(rats) = index.rats_by_anchor.get(&id) {
            next.extend(rats.iter().map(|r| (*r, ConnectionKind::Rat)));
        }
    }
    next
}

fn discover(
    store: &mut ObjectStore,
    ctx: &mut CrawlContext,
    found: &mut dyn FnMut(&ObjectStore, &Discovery),
    discovery: Discovery,
) {
    found(store, &discovery);
    if ctx.accumulate {
        ctx.found.push(discovery.object);
    }
    let is_rat = store.get(discovery.object).is_some_and(BoardObject::is_rat);
    if !ctx.only_mark_rats || is_rat {
        store.set_flags(discovery.object, ctx.flag_set, ctx.flag_clear);
    }
}

/// Discover every object transitively joined to `seed`.
///
/// `found` runs exactly once per newly discovered object, the seed
/// included. Returns the number of objects discovered by this call; zero
/// when the seed was already visited earlier in the same context.
pub fn crawl(
    store: &mut ObjectStore,
    index: &ConnIndex,
    ctx: &mut CrawlContext,
    seed: ObjectId,
    found: &mut dyn FnMut(&ObjectStore, &Discovery),
) -> usize {
    debug_assert!(store.contains(seed), "crawl from void object {}", seed);
    if !store.contains(seed) {
        log::error!("crawl requested from void object {}", seed);
        return 0;
    }
    if !ctx.visited.insert(seed) {
        return 0;
    }

    let mut count = 1;
    discover(
        store,
        ctx,
        found,
        Discovery {
            object: seed,
            arrived_from: None,
            kind: ConnectionKind::Start,
        },
    );

    let mut queue = VecDeque::from([seed]);
    while let Some(id) = queue.pop_front() {
        for (next, kind) in neighbours(store, index, ctx, id) {
            // rats may still name objects removed since the index was built
            if !store.contains(next) || !ctx.visited.insert(next) {
                continue;
            }
            count += 1;
            discover(
                store,
                ctx,
                found,
                Discovery {
                    object: next,
                    arrived_from: Some(id),
                    kind,
                },
            );
            queue.push_back(next);
        }
    }
    log::trace!("crawl from {} discovered {} objects", seed, count);
    count
}

#[cfg(test)]
mod tests {
    use super::*;
    use copperlink_core::{Line, PadShape, Padstack, Point, Polygon, RatLine, Subcircuit};

    fn pad(board: &mut Board, x: f64, y: f64) -> ObjectId {
        board.store.add(Shape::Padstack(Padstack::new(
            Point::new(x, y),
            PadShape::Circle { radius: 5.0 },
            vec![0],
        )))
    }

    fn trace(board: &mut Board, x1: f64, x2: f64, clearance: f64) -> ObjectId {
        board.store.add(Shape::Line(
            Line::new(0, Point::new(x1, 0.0), Point::new(x2, 0.0), 2.0).with_clearance(clearance),
        ))
    }

    fn run(board: &mut Board, ctx: &mut CrawlContext, seed: ObjectId) -> Vec<Discovery> {
        let index = ConnIndex::build(board);
        let mut seen = Vec::new();
        crawl(&mut board.store, &index, ctx, seed, &mut |_, d| seen.push(*d));
        seen
    }

    #[test]
    fn test_chain_is_found_once_each() {
        let mut board = Board::new("t");
        let a = pad(&mut board, 0.0, 0.0);
        let t = trace(&mut board, 0.0, 100.0, 0.0);
        let b = pad(&mut board, 100.0, 0.0);
        let lonely = pad(&mut board, 500.0, 0.0);

        let mut ctx = CrawlContext::new(0.0).with_flags(ObjectFlags::FOUND, ObjectFlags::NONE);
        let seen = run(&mut board, &mut ctx, a);
        let ids: HashSet<ObjectId> = seen.iter().map(|d| d.object).collect();
        assert_eq!(seen.len(), 3);
        assert_eq!(ids, HashSet::from([a, t, b]));
        assert_eq!(seen[0].kind, ConnectionKind::Start);
        assert!(board.store.get(b).unwrap().has_flag(ObjectFlags::FOUND));
        assert!(!board.store.get(lonely).unwrap().has_flag(ObjectFlags::FOUND));
    }

    #[test]
    fn test_visited_seed_yields_nothing() {
        let mut board = Board::new("t");
        let a = pad(&mut board, 0.0, 0.0);
        let b = pad(&mut board, 8.0, 0.0);
        let index = ConnIndex::build(&board);
        let mut ctx = CrawlContext::new(0.0);
        assert_eq!(crawl(&mut board.store, &index, &mut ctx, a, &mut |_, _| {}), 2);
        assert_eq!(crawl(&mut board.store, &index, &mut ctx, b, &mut |_, _| {}), 0);
    }

    #[test]
    fn test_bloat_bridges_small_gaps() {
        let mut board = Board::new("t");
        let a = pad(&mut board, 0.0, 0.0);
        pad(&mut board, 12.0, 0.0);
        assert_eq!(run(&mut board, &mut CrawlContext::new(0.0), a).len(), 1);
        assert_eq!(run(&mut board, &mut CrawlContext::new(2.5), a).len(), 2);
    }

    #[test]
    fn test_rats_followed_only_when_asked() {
        let mut board = Board::new("t");
        let a = pad(&mut board, 0.0, 0.0);
        let b = pad(&mut board, 100.0, 0.0);
        let rat = board.store.add(Shape::Rat(RatLine {
            p1: Point::new(0.0, 0.0),
            p2: Point::new(100.0, 0.0),
            group1: 0,
            group2: 0,
            anchor1: a,
            anchor2: b,
            via_equivalent: false,
        }));
        assert_eq!(run(&mut board, &mut CrawlContext::new(0.0), a).len(), 1);

        let mut ctx = CrawlContext::new(0.0)
            .with_rats()
            .with_flags(ObjectFlags::FOUND, ObjectFlags::NONE);
        ctx.only_mark_rats = true;
        let seen = run(&mut board, &mut ctx, a);
        assert_eq!(seen.len(), 3);
        assert!(seen.iter().any(|d| d.object == rat && d.kind == ConnectionKind::Rat));
        assert!(board.store.get(rat).unwrap().has_flag(ObjectFlags::FOUND));
        assert!(!board.store.get(b).unwrap().has_flag(ObjectFlags::FOUND));
    }

    #[test]
    fn test_internal_terminal_connection() {
        let mut board = Board::new("t");
        let u1 = board.store.add_subcircuit(Subcircuit::new("U1"));
        let shape = |x: f64| {
            Shape::Padstack(Padstack::new(
                Point::new(x, 0.0),
                PadShape::Circle { radius: 5.0 },
                vec![0],
            ))
        };
        let p1 = board.store.add_owned(shape(0.0), u1, Some("GND"));
        let p2 = board.store.add_owned(shape(300.0), u1, Some("GND"));
        board.store.add_owned(shape(600.0), u1, Some("VCC"));
        let seen = run(&mut board, &mut CrawlContext::new(0.0), p1);
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[1].object, p2);
        assert_eq!(seen[1].kind, ConnectionKind::Internal);
    }

    #[test]
    fn test_clearing_polygon_isolates_unless_ignored() {
        let mut board = Board::new("t");
        let poly = board.store.add(Shape::Polygon(
            Polygon::new(
                0,
                vec![
                    Point::new(-50.0, -50.0),
                    Point::new(50.0, -50.0),
                    Point::new(50.0, 50.0),
                    Point::new(-50.0, 50.0),
                ],
            )
            .clearing(),
        ));
        trace(&mut board, -10.0, 10.0, 3.0);
        let thermal = board.store.add(Shape::Padstack(
            Padstack::new(Point::new(30.0, 30.0), PadShape::Circle { radius: 4.0 }, vec![0])
                .with_clearance(3.0)
                .with_thermal(0),
        ));

        let seen = run(&mut board, &mut CrawlContext::new(0.0), poly);
        let ids: Vec<ObjectId> = seen.iter().map(|d| d.object).collect();
        assert_eq!(ids, vec![poly, thermal]);

        let mut ctx = CrawlContext::new(0.0);
        ctx.ignore_clearance = true;
        assert_eq!(run(&mut board, &mut ctx, poly).len(), 3);
    }

    #[test]
    fn test_other_layer_does_not_touch() {
        let mut board = Board::new("t");
        let a = trace(&mut board, 0.0, 100.0, 0.0);
        board.store.add(Shape::Line(Line::new(
            1,
            Point::new(50.0, -50.0),
            Point::new(50.0, 50.0),
            2.0,
        )));
        assert_eq!(run(&mut board, &mut CrawlContext::new(0.0), a).len(), 1);
    }

    #[test]
    fn test_accumulator() {
        let mut board = Board::new("t");
        let a = pad(&mut board, 0.0, 0.0);
        let b = pad(&mut board, 9.0, 0.0);
        let mut ctx = CrawlContext::new(0.0).accumulating();
        run(&mut board, &mut ctx, a);
        let mut found = ctx.found().to_vec();
        found.sort();
        assert_eq!(found, vec![a, b]);
    }
}
