use std::collections::{BTreeSet, HashMap};

use copperlink_core::{Board, NetList, ObjectFlags, ObjectId, ObjectStore, Terminal};

use crate::crawl::Discovery;
use crate::hooks::{EditorHooks, MessageLevel, ShortIndication};

/// What a finished tracker reports back to the pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ShortSummary {
    /// Distinct net pairs reported during the session.
    pub shorts: usize,
}

/// Order-independent key for a net pair: smaller name, `-`, larger name.
pub fn pair_key(a: &str, b: &str) -> String {
    if a <= b {
        format!("{}-{}", a, b)
    } else {
        format!("{}-{}", b, a)
    }
}

/// Watches every object a crawl of the current net discovers and reports
/// foreign terminals, once per net pair for the whole session.
pub struct ShortTracker {
    net: String,
    owners: HashMap<Terminal, String>,
    reported: BTreeSet<String>,
    pending_warn: Vec<ObjectId>,
}

impl ShortTracker {
    pub fn new(net: &str, netlist: &NetList) -> Self {
        Self {
            net: net.to_string(),
            owners: netlist.terminal_index(),
            reported: BTreeSet::new(),
            pending_warn: Vec::new(),
        }
    }

    pub fn net(&self) -> &str {
        &self.net
    }

    /// Switch the net being crawled; pairs already reported stay reported.
    pub fn set_net(&mut self, net: &str) {
        self.net = net.to_string();
    }

    pub fn shorts(&self) -> usize {
        self.reported.len()
    }

    /// Inspect one discovery; returns `true` when it produced a new report.
    pub fn check(
        &mut self,
        store: &ObjectStore,
        discovery: &Discovery,
        hooks: &mut dyn EditorHooks,
    ) -> bool {
        let Some(terminal) = store.terminal_of(discovery.object) else {
            return false;
        };
        let Some(offender_net) = self.owners.get(&terminal) else {
            return false;
        };
        if *offender_net == self.net {
            return false;
        }

        let key = pair_key(&self.net, offender_net);
        if self.reported.contains(&key) {
            return false;
        }
        log::warn!(
            "short {} via terminal {} (object {})",
            key,
            terminal,
            discovery.object
        );
        hooks.message(
            MessageLevel::Warning,
            &format!(
                "Warning! Net \"{}\" is shorted to net \"{}\" at terminal {}",
                self.net, offender_net, terminal
            ),
        );
        let indication = ShortIndication {
            net: self.net.clone(),
            offender_net: offender_net.clone(),
            offender: discovery.object,
            arrived_from: discovery.arrived_from,
        };
        if !hooks.short_indicated(&indication) {
            self.pending_warn.push(discovery.object);
            self.pending_warn.extend(discovery.arrived_from);
        }
        self.reported.insert(key);
        true
    }

    /// Close the session: apply fallback warning marks and, if anything
    /// was shorted, mark the board changed and refresh ratsnest warnings.
    pub fn finish(self, board: &mut Board, hooks: &mut dyn EditorHooks) -> ShortSummary {
        for id in &self.pending_warn {
            board.store.set_flags(*id, ObjectFlags::WARN, ObjectFlags::NONE);
        }
        let shorts = self.reported.len();
        if shorts > 0 {
            board.changed = true;
            hooks.ratsnest_warning_refresh();
        }
        ShortSummary { shorts }
    }
}
