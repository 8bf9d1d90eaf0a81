use copperlink_core::commands::AddObjectCommand;
use copperlink_core::{Board, BoardObject, ObjectFlags, ObjectId, RatLine, Shape};

use crate::config::{RatConfig, RatPolicy};
use crate::distance::{obj_distance, ObjDistance};
use crate::hooks::{EditorHooks, MessageLevel};
use crate::subnet::Subnet;

/// Closest approach between two subnets.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SubnetLink {
    /// Object of the row subnet.
    pub from: ObjectId,
    /// Object of the column subnet.
    pub to: ObjectId,
    pub dist: ObjDistance,
}

impl SubnetLink {
    fn swapped(&self) -> Self {
        Self {
            from: self.to,
            to: self.from,
            dist: self.dist.swapped(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConnectResult {
    pub drawn: usize,
    pub missing: usize,
    pub rats: Vec<ObjectId>,
}

/// Symmetric N x N matrix of subnet links; the diagonal stays empty.
#[derive(Debug, Clone)]
pub struct DistanceMatrix {
    n: usize,
    links: Vec<Option<SubnetLink>>,
}

impl DistanceMatrix {
    pub fn build(board: &Board, subnets: &[Subnet], policy: &RatPolicy) -> Self {
        let n = subnets.len();
        let mut links = vec![None; n * n];
        for i in 0..n {
            for j in (i + 1)..n {
                let link = closest_link(board, &subnets[i], &subnets[j], policy);
                links[i * n + j] = link;
                links[j * n + i] = link.map(|l| l.swapped());
            }
            log::trace!(
                "subnet {} row: {:?}",
                i,
                (0..n)
                    .map(|j| links[i * n + j].map(|l: SubnetLink| l.dist.d2))
                    .collect::<Vec<_>>()
            );
        }
        Self { n, links }
    }

    pub fn len(&self) -> usize {
        self.n
    }

    pub fn is_empty(&self) -> bool {
        self.n == 0
    }

    pub fn get(&self, i: usize, j: usize) -> Option<&SubnetLink> {
        if i == j || i >= self.n || j >= self.n {
            return None;
        }
        self.links[i * self.n + j].as_ref()
    }
}

fn selected(board: &Board, id: ObjectId) -> bool {
    board
        .store
        .get(id)
        .is_some_and(|o| o.has_flag(ObjectFlags::SELECTED))
}

/// Closest reachable object pair between two subnets, if any.
fn closest_link(board: &Board, a: &Subnet, b: &Subnet, policy: &RatPolicy) -> Option<SubnetLink> {
    let mut best: Option<SubnetLink> = None;
    for &ia in &a.objects {
        let Some(oa) = board.store.get(ia) else {
            continue;
        };
        for &ib in &b.objects {
            let Some(ob) = board.store.get(ib) else {
                continue;
            };
            if policy.only_selected && !selected(board, ia) && !selected(board, ib) {
                continue;
            }
            let dist = obj_distance(oa, ob, policy);
            if !dist.is_reachable() {
                continue;
            }
            if best.map_or(true, |l| dist.d2 < l.dist.d2) {
                best = Some(SubnetLink {
                    from: ia,
                    to: ib,
                    dist,
                });
                if dist.is_touching() {
                    return best;
                }
            }
        }
    }
    best
}

/// Draw the rat lines joining `subnets` into one, as a single undo step.
///
/// Prim's algorithm over subnets: each round scans every (not done, done)
/// pair of the distance matrix for the closest one. Ties keep the pair
/// found first, the lowest not-done index, then the lowest done index.
pub fn connect_subnets(
    board: &mut Board,
    subnets: &[Subnet],
    policy: &RatPolicy,
    config: &RatConfig,
    hooks: &mut dyn EditorHooks,
) -> ConnectResult {
    let mut result = ConnectResult::default();
    debug_assert!(!subnets.is_empty(), "connect called with no subnets");
    if subnets.len() < 2 {
        return result;
    }
    if subnets.len() > config.max_subnets {
        log::warn!(
            "{} subnets exceed the limit of {}; not connecting",
            subnets.len(),
            config.max_subnets
        );
        hooks.message(
            MessageLevel::Warning,
            &format!(
                "Net starting at {} is split into {} pieces; too many to connect",
                subnets[0].terminal,
                subnets.len()
            ),
        );
        result.missing += 1;
        return result;
    }

    let matrix = DistanceMatrix::build(board, subnets, policy);
    let n = matrix.len();
    let mut done = vec![false; n];
    done[0] = true;

    board.begin_step("Add rat lines");
    for _ in 1..n {
        let mut best: Option<(usize, SubnetLink)> = None;
        for i in (0..n).filter(|i| !done[*i]) {
            for j in (0..n).filter(|j| done[*j]) {
                let Some(link) = matrix.get(i, j) else {
                    continue;
                };
                if best.map_or(true, |(_, b)| link.dist.d2 < b.dist.d2) {
                    best = Some((i, *link));
                }
            }
        }

        let Some((i, link)) = best else {
            log::warn!(
                "net starting at {}: {} subnets unreachable",
                subnets[0].terminal,
                done.iter().filter(|d| !**d).count()
            );
            result.missing += 1;
            break;
        };
        // the link's row is the not-done subnet; draw from the done side
        let rat = RatLine {
            p1: link.dist.point_b,
            p2: link.dist.point_a,
            group1: link.dist.group_b,
            group2: link.dist.group_a,
            anchor1: link.to,
            anchor2: link.from,
            via_equivalent: link.dist.is_touching(),
        };
        if policy.info {
            hooks.message(
                MessageLevel::Info,
                &format!(
                    "Rat line from ({:.2}, {:.2}) to ({:.2}, {:.2}), length {:.2}",
                    rat.p1.x,
                    rat.p1.y,
                    rat.p2.x,
                    rat.p2.y,
                    rat.length()
                ),
            );
        }
        log::debug!("rat {} -> {} (d2 {})", rat.anchor1, rat.anchor2, link.dist.d2);
        let id = board.store.allocate_id();
        board.execute(Box::new(AddObjectCommand::new(BoardObject::new(id, Shape::Rat(rat)))));
        result.rats.push(id);
        result.drawn += 1;
        done[i] = true;
    }
    board.commit_step();
    result
}
