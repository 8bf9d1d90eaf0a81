use std::fmt;

use thiserror::Error;

use copperlink_core::{BoardError, Terminal};

/// Which end of a manual rat a rejection refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RatEnd {
    First,
    Second,
}

impl fmt::Display for RatEnd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RatEnd::First => write!(f, "first"),
            RatEnd::Second => write!(f, "second"),
        }
    }
}

#[derive(Error, Debug)]
pub enum RatError {
    #[error("No terminal at the {0} end of the rat")]
    NoTerminal(RatEnd),

    #[error("Both ends of the rat are terminal {0}")]
    SameTerminal(Terminal),

    #[error("Both terminals are already on net '{0}'")]
    SameNet(String),

    #[error("Terminals belong to different nets '{a}' and '{b}'; refusing to merge them")]
    AmbiguousMerge { a: String, b: String },

    #[error("Net name entry was cancelled")]
    NameCancelled,

    #[error("Net '{0}' does not exist")]
    UnknownNet(String),

    #[error(transparent)]
    Board(#[from] BoardError),
}
