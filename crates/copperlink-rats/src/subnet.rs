use copperlink_core::{Board, ObjectId, Terminal};

use crate::config::RatConfig;
use crate::crawl::{crawl, ConnIndex, CrawlContext};
use crate::hooks::EditorHooks;
use crate::short::ShortTracker;

/// Terminals of one net already joined through copper or rat lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subnet {
    /// The terminal the subnet was crawled from.
    pub terminal: Terminal,
    /// Copper objects of the subnet, rat lines excluded.
    pub objects: Vec<ObjectId>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Extraction {
    pub subnets: Vec<Subnet>,
    /// Terminals with no object on the board.
    pub missing: usize,
}

/// Crawl the terminals of one net in order, starting a new subnet only at
/// terminals no earlier crawl of this pass reached.
pub fn extract_subnets(
    board: &mut Board,
    terminals: &[Terminal],
    config: &RatConfig,
    tracker: &mut ShortTracker,
    hooks: &mut dyn EditorHooks,
) -> Extraction {
    let index = ConnIndex::build(board);
    let mut ctx = CrawlContext::from_config(config).with_rats();
    let mut out = Extraction::default();

    for terminal in terminals {
        let Some(seed) = board.store.find_terminal_object(terminal) else {
            log::debug!("net {}: terminal {} not on the board", tracker.net(), terminal);
            out.missing += 1;
            continue;
        };
        if ctx.is_visited(seed) {
            continue;
        }

        let mut objects = Vec::new();
        crawl(&mut board.store, &index, &mut ctx, seed, &mut |store, found| {
            if store.get(found.object).is_some_and(|o| !o.is_rat()) {
                objects.push(found.object);
            }
            tracker.check(store, found, &mut *hooks);
        });
        log::trace!(
            "net {}: subnet at {} has {} objects",
            tracker.net(),
            terminal,
            objects.len()
        );
        out.subnets.push(Subnet {
            terminal: terminal.clone(),
            objects,
        });
    }
    out
}
