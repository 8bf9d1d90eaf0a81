use serde::{Deserialize, Serialize};

/// Result of rat synthesis for one net.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetRats {
    pub drawn: usize,
    /// Unlocatable terminals plus subnets left unconnected.
    pub missing: usize,
    /// Net pairs found shorted during the pass.
    pub shorts: usize,
    pub subnets: usize,
}

/// Totals of a pass over the whole netlist.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RatTotals {
    pub drawn: usize,
    pub missing: usize,
    /// Nets skipped because rats are inhibited on them.
    pub disabled: usize,
    pub shorts: usize,
    /// Nets actually processed.
    pub nets: usize,
}

impl RatTotals {
    pub fn add(&mut self, net: &NetRats) {
        self.drawn += net.drawn;
        self.missing += net.missing;
        self.shorts += net.shorts;
        self.nets += 1;
    }
}

/// The single summary a whole-netlist pass reports, in priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RatOutcome {
    /// Rat lines were drawn; routing remains.
    Remaining(usize),
    /// A selection filter was given and no net had a selected terminal.
    NoSelectedTerminal,
    Incomplete {
        missing: usize,
        disabled: usize,
        shorts: usize,
    },
    /// Fully connected with no shorts.
    Complete,
}

impl RatOutcome {
    pub fn from_totals(totals: &RatTotals, selection_active: bool) -> Self {
        if totals.drawn > 0 {
            RatOutcome::Remaining(totals.drawn)
        } else if selection_active && totals.nets == 0 {
            RatOutcome::NoSelectedTerminal
        } else if totals.missing > 0 || totals.disabled > 0 || totals.shorts > 0 {
            RatOutcome::Incomplete {
                missing: totals.missing,
                disabled: totals.disabled,
                shorts: totals.shorts,
            }
        } else {
            RatOutcome::Complete
        }
    }

    pub fn is_complete(&self) -> bool {
        matches!(self, RatOutcome::Complete)
    }

    /// Text shown to the user for this outcome.
    pub fn summary(&self) -> String {
        match self {
            RatOutcome::Remaining(n) => format!("{} rat line(s) remaining", n),
            RatOutcome::NoSelectedTerminal => "No selected terminal on any net".to_string(),
            RatOutcome::Incomplete {
                missing,
                disabled,
                shorts,
            } => {
                let mut parts = Vec::new();
                if *missing > 0 {
                    parts.push(format!("{} terminal(s) or subnet(s) could not be connected", missing));
                }
                if *disabled > 0 {
                    parts.push(format!("{} net(s) have rats disabled", disabled));
                }
                if *shorts > 0 {
                    parts.push(format!("{} short(s) between nets", shorts));
                }
                format!("Nothing more to connect, but {}", parts.join("; "))
            }
            RatOutcome::Complete => {
                "Congratulations! The layout is complete and has no shorted nets".to_string()
            }
        }
    }
}
