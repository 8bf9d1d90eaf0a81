use std::collections::HashSet;

use copperlink_core::commands::{AddObjectCommand, AddTerminalCommand, RemoveObjectCommand};
use copperlink_core::{Board, BoardObject, ObjectFlags, ObjectId, Point, RatLine, Shape, Terminal};

use crate::config::{RatConfig, RatPolicy};
use crate::connect::connect_subnets;
use crate::crawl::{crawl, ConnIndex, CrawlContext};
use crate::distance::{obj_distance, point_distance2, TOUCHING};
use crate::error::{RatEnd, RatError};
use crate::hooks::{BackAnnotation, EditorHooks, MessageLevel};
use crate::outcome::{NetRats, RatOutcome, RatTotals};
use crate::short::ShortTracker;
use crate::subnet::extract_subnets;

/// Result of a pass over every net.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AllNetsReport {
    pub totals: RatTotals,
    pub outcome: RatOutcome,
}

/// A rat line drawn by hand between two terminals.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManualRat {
    pub net: String,
    pub rat: ObjectId,
    /// Terminals that joined `net` because of this rat.
    pub added_terminals: Vec<Terminal>,
}

pub struct NetOrchestrator<'a> {
    board: &'a mut Board,
    config: &'a RatConfig,
    hooks: &'a mut dyn EditorHooks,
}

impl<'a> NetOrchestrator<'a> {
    pub fn new(board: &'a mut Board, config: &'a RatConfig, hooks: &'a mut dyn EditorHooks) -> Self {
        Self {
            board,
            config,
            hooks,
        }
    }

    pub fn board(&self) -> &Board {
        &*self.board
    }

    /// Resolve `name` (exact, then case-insensitive, then as a pattern).
    fn net_terminals(&self, name: &str) -> Result<(String, Vec<Terminal>), RatError> {
        let net = self
            .board
            .netlist
            .find(name)
            .ok_or_else(|| RatError::UnknownNet(name.to_string()))?;
        Ok((net.name.clone(), net.terminals().to_vec()))
    }

    fn rats_for_terminals(
        &mut self,
        tracker: &mut ShortTracker,
        terminals: &[Terminal],
        policy: &RatPolicy,
    ) -> NetRats {
        let shorts_before = tracker.shorts();
        let extraction = extract_subnets(self.board, terminals, self.config, tracker, &mut *self.hooks);

        let mut result = NetRats {
            missing: extraction.missing,
            subnets: extraction.subnets.len(),
            ..NetRats::default()
        };
        if !extraction.subnets.is_empty() {
            let connected = connect_subnets(
                self.board,
                &extraction.subnets,
                policy,
                self.config,
                &mut *self.hooks,
            );
            result.drawn = connected.drawn;
            result.missing += connected.missing;
        }
        result.shorts = tracker.shorts() - shorts_before;
        log::info!(
            "net {}: {} subnets, {} rats drawn, {} missing",
            tracker.net(),
            result.subnets,
            result.drawn,
            result.missing
        );
        result
    }

    /// Draw the rat lines still needed to join every terminal of one net.
    pub fn add_rats_for_net(&mut self, name: &str, policy: &RatPolicy) -> Result<NetRats, RatError> {
        let (net, terminals) = self.net_terminals(name)?;
        let mut tracker = ShortTracker::new(&net, &self.board.netlist);
        let result = self.rats_for_terminals(&mut tracker, &terminals, policy);
        tracker.finish(self.board, &mut *self.hooks);
        Ok(result)
    }

    /// Draw rat lines for every net, optionally only nets with a terminal in
    /// `selection`, and emit exactly one summary message.
    pub fn add_rats_for_all_nets(
        &mut self,
        policy: &RatPolicy,
        selection: Option<&HashSet<Terminal>>,
    ) -> AllNetsReport {
        for (terminal, nets) in self.board.netlist.duplicate_terminals() {
            log::warn!("terminal {} is listed by nets {:?}", terminal, nets);
        }

        let nets: Vec<(String, Vec<Terminal>, bool)> = self
            .board
            .netlist
            .nets()
            .map(|n| (n.name.clone(), n.terminals().to_vec(), n.inhibit_rats))
            .collect();

        // one session for the pass, so each shorted pair is reported once
        let mut tracker = ShortTracker::new("", &self.board.netlist);
        let mut totals = RatTotals::default();
        for (name, terminals, inhibited) in nets {
            if inhibited {
                log::debug!("net {}: rats inhibited", name);
                totals.disabled += 1;
                continue;
            }
            if let Some(selected) = selection {
                if !terminals.iter().any(|t| selected.contains(t)) {
                    continue;
                }
            }
            tracker.set_net(&name);
            let net = self.rats_for_terminals(&mut tracker, &terminals, policy);
            totals.add(&net);
        }
        totals.shorts = tracker.finish(self.board, &mut *self.hooks).shorts;

        let outcome = RatOutcome::from_totals(&totals, selection.is_some());
        let level = match outcome {
            RatOutcome::Remaining(_) | RatOutcome::Complete => MessageLevel::Info,
            RatOutcome::NoSelectedTerminal | RatOutcome::Incomplete { .. } => MessageLevel::Warning,
        };
        self.hooks.message(level, &outcome.summary());
        log::info!(
            "rats for all nets: {} nets, {} drawn, {} missing, {} disabled, {} shorts",
            totals.nets,
            totals.drawn,
            totals.missing,
            totals.disabled,
            totals.shorts
        );
        AllNetsReport { totals, outcome }
    }

    /// Terminals of every selected terminal-bearing object.
    pub fn selected_terminals(&self) -> HashSet<Terminal> {
        self.board
            .store
            .objects()
            .filter(|o| o.has_flag(ObjectFlags::SELECTED))
            .filter_map(|o| self.board.store.terminal_of(o.id))
            .collect()
    }

    /// Lowest-id terminal-bearing copper object whose copper covers `p`.
    fn terminal_object_at(&self, p: Point) -> Option<ObjectId> {
        let index = self.board.copper_index();
        index.query_point(&p).into_iter().find(|id| {
            self.board.store.terminal_of(*id).is_some()
                && self
                    .board
                    .store
                    .get(*id)
                    .is_some_and(|o| point_distance2(&o.shape, p) == TOUCHING)
        })
    }

    /// Draw a rat line from the terminal under `a` to the terminal under `b`,
    /// joining both terminals into one net.
    ///
    /// Nothing on the board changes when the connection is rejected.
    pub fn create_rat_by_manual_connection(
        &mut self,
        a: Point,
        b: Point,
        interactive: bool,
    ) -> Result<ManualRat, RatError> {
        let obj_a = self
            .terminal_object_at(a)
            .ok_or(RatError::NoTerminal(RatEnd::First))?;
        let obj_b = self
            .terminal_object_at(b)
            .ok_or(RatError::NoTerminal(RatEnd::Second))?;
        let store = &self.board.store;
        let (Some(term_a), Some(term_b)) = (store.terminal_of(obj_a), store.terminal_of(obj_b)) else {
            return Err(RatError::NoTerminal(RatEnd::First));
        };
        if term_a == term_b {
            return Err(RatError::SameTerminal(term_a));
        }

        let netlist = &self.board.netlist;
        let net_a = netlist.net_of_terminal(&term_a).map(str::to_string);
        let net_b = netlist.net_of_terminal(&term_b).map(str::to_string);
        let net = match (net_a, net_b) {
            (Some(x), Some(y)) if x == y => return Err(RatError::SameNet(x)),
            (Some(x), Some(y)) => return Err(RatError::AmbiguousMerge { a: x, b: y }),
            (Some(x), None) | (None, Some(x)) => x,
            (None, None) => {
                let suggested = netlist.unused_name(&self.config.auto_net_prefix);
                if interactive {
                    match self.hooks.prompt_net_name(&suggested) {
                        Some(name) if !name.trim().is_empty() => name.trim().to_string(),
                        _ => return Err(RatError::NameCancelled),
                    }
                } else {
                    suggested
                }
            }
        };

        let (oa, ob) = (self.board.object(obj_a)?, self.board.object(obj_b)?);
        let dist = obj_distance(oa, ob, &RatPolicy::precise());
        let rat = RatLine {
            p1: a,
            p2: b,
            group1: dist.group_a,
            group2: dist.group_b,
            anchor1: obj_a,
            anchor2: obj_b,
            via_equivalent: dist.is_touching(),
        };

        self.board.begin_step("Add rat line");
        let mut added_terminals = Vec::new();
        for terminal in [term_a, term_b] {
            let member = self
                .board
                .netlist
                .get(&net)
                .is_some_and(|n| n.contains(&terminal));
            if member {
                continue;
            }
            self.board
                .execute(Box::new(AddTerminalCommand::new(&net, terminal.clone())));
            self.hooks.back_annotate(BackAnnotation::AddConnection {
                net: net.clone(),
                terminal: terminal.clone(),
            });
            added_terminals.push(terminal);
        }
        let id = self.board.store.allocate_id();
        self.board
            .execute(Box::new(AddObjectCommand::new(BoardObject::new(id, Shape::Rat(rat)))));
        self.board.commit_step();

        log::info!("manual rat {} on net {} ({} terminals added)", id, net, added_terminals.len());
        Ok(ManualRat {
            net,
            rat: id,
            added_terminals,
        })
    }

    /// Crawl from each locatable terminal, sharing one visited set.
    fn mark_net(&mut self, terminals: &[Terminal], set: ObjectFlags, clear: ObjectFlags) -> usize {
        let index = ConnIndex::build(self.board);
        let mut ctx = CrawlContext::from_config(self.config)
            .with_rats()
            .with_flags(set, clear);
        let mut count = 0;
        for terminal in terminals {
            if let Some(seed) = self.board.store.find_terminal_object(terminal) {
                count += crawl(&mut self.board.store, &index, &mut ctx, seed, &mut |_, _| {});
            }
        }
        count
    }

    /// Crawl a net and apply a flag change to every object found.
    pub fn crawl_flag_net(&mut self, name: &str, set: ObjectFlags, clear: ObjectFlags) -> Result<usize, RatError> {
        let (_, terminals) = self.net_terminals(name)?;
        Ok(self.mark_net(&terminals, set, clear))
    }

    /// Remove every free object, rat lines included, connected to the net.
    /// Subcircuit-owned objects stay.
    pub fn rip_up(&mut self, name: &str) -> Result<usize, RatError> {
        let (net, terminals) = self.net_terminals(name)?;
        self.board.store.clear_flags(ObjectFlags::FOUND);
        self.mark_net(&terminals, ObjectFlags::FOUND, ObjectFlags::NONE);

        self.board.begin_step("Rip up net");
        let mut removed = 0;
        let mut cursor = self.board.store.first_id();
        while let Some(id) = cursor {
            cursor = self.board.store.next_id_after(id);
            let doomed = self
                .board
                .store
                .get(id)
                .is_some_and(|o| o.parent.is_none() && o.has_flag(ObjectFlags::FOUND));
            if doomed {
                self.board.store.set_flags(id, ObjectFlags::NONE, ObjectFlags::FOUND);
                self.board.execute(Box::new(RemoveObjectCommand::new(id)));
                removed += 1;
            }
        }
        self.board.commit_step();
        self.board.store.clear_flags(ObjectFlags::FOUND);

        log::info!("ripped up {} objects of net {}", removed, net);
        Ok(removed)
    }

    /// Remove rat lines, all of them or only selected ones, as one step.
    pub fn delete_rats(&mut self, selected_only: bool) -> usize {
        let doomed: Vec<ObjectId> = self
            .board
            .store
            .rats()
            .filter(|o| !selected_only || o.has_flag(ObjectFlags::SELECTED))
            .map(|o| o.id)
            .collect();
        self.board.begin_step("Delete rat lines");
        for id in &doomed {
            self.board.execute(Box::new(RemoveObjectCommand::new(*id)));
        }
        self.board.commit_step();
        log::debug!("deleted {} rat lines", doomed.len());
        doomed.len()
    }

    pub fn clear_flags(&mut self, flags: ObjectFlags) -> usize {
        self.board.store.clear_flags(flags)
    }
}
