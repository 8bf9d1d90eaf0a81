use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::hash::{Hash, Hasher};

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::BoardError;

/// One connection point of a net: a pin of a placed component.
///
/// Identity is the `(refdes, pin)` pair; attributes do not take part in
/// comparisons.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Terminal {
    pub refdes: String,
    pub pin: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, String>,
}

impl Terminal {
    pub fn new(refdes: &str, pin: &str) -> Self {
        Self {
            refdes: refdes.to_string(),
            pin: pin.to_string(),
            attributes: BTreeMap::new(),
        }
    }

    /// Parse the `REFDES-PIN` notation, splitting at the first dash.
    pub fn parse(s: &str) -> Result<Self, BoardError> {
        match s.split_once('-') {
            Some((refdes, pin)) if !refdes.is_empty() && !pin.is_empty() => {
                Ok(Self::new(refdes, pin))
            }
            _ => Err(BoardError::InvalidTerminal(s.to_string())),
        }
    }

    fn key(&self) -> (&str, &str) {
        (&self.refdes, &self.pin)
    }
}

impl fmt::Display for Terminal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.refdes, self.pin)
    }
}

impl PartialEq for Terminal {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for Terminal {}

impl Hash for Terminal {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key().hash(state);
    }
}

impl PartialOrd for Terminal {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Terminal {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key().cmp(&other.key())
    }
}

/// A named logical connection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Net {
    pub name: String,
    /// Terminals in insertion order.
    terminals: Vec<Terminal>,
    /// Skip this net when synthesizing rat lines.
    #[serde(default)]
    pub inhibit_rats: bool,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, String>,
}

impl Net {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            terminals: Vec::new(),
            inhibit_rats: false,
            attributes: BTreeMap::new(),
        }
    }

    /// Returns `false` when the terminal was already a member.
    pub fn add_terminal(&mut self, terminal: Terminal) -> bool {
        if self.contains(&terminal) {
            return false;
        }
        self.terminals.push(terminal);
        true
    }

    pub fn remove_terminal(&mut self, terminal: &Terminal) -> Option<Terminal> {
        let idx = self.terminals.iter().position(|t| t == terminal)?;
        Some(self.terminals.remove(idx))
    }

    pub fn contains(&self, terminal: &Terminal) -> bool {
        self.terminals.iter().any(|t| t == terminal)
    }

    pub fn terminals(&self) -> &[Terminal] {
        &self.terminals
    }

    pub fn terminal_count(&self) -> usize {
        self.terminals.len()
    }
}

/// All nets of a board keyed by name.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NetList {
    nets: BTreeMap<String, Net>,
}

impl NetList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&Net> {
        self.nets.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Net> {
        self.nets.get_mut(name)
    }

    pub fn get_icase(&self, name: &str) -> Option<&Net> {
        let lower = name.to_lowercase();
        self.nets.values().find(|n| n.name.to_lowercase() == lower)
    }

    /// First net, in name order, whose name matches `pattern`.
    pub fn get_regex(&self, pattern: &str) -> Result<Option<&Net>, BoardError> {
        let re = Regex::new(pattern).map_err(|source| BoardError::InvalidPattern {
            pattern: pattern.to_string(),
            source,
        })?;
        Ok(self.nets.values().find(|n| re.is_match(&n.name)))
    }

    /// Exact lookup, then case-insensitive, then regex.
    pub fn find(&self, name: &str) -> Option<&Net> {
        if let Some(net) = self.get(name).or_else(|| self.get_icase(name)) {
            return Some(net);
        }
        match self.get_regex(name) {
            Ok(net) => net,
            Err(err) => {
                log::debug!("net lookup '{}' not usable as a pattern: {}", name, err);
                None
            }
        }
    }

    pub fn get_or_create(&mut self, name: &str) -> &mut Net {
        self.nets
            .entry(name.to_string())
            .or_insert_with(|| Net::new(name))
    }

    pub fn remove(&mut self, name: &str) -> Option<Net> {
        self.nets.remove(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.nets.contains_key(name)
    }

    /// Name of the first net, in name order, that lists `terminal`.
    pub fn net_of_terminal(&self, terminal: &Terminal) -> Option<&str> {
        self.nets
            .values()
            .find(|n| n.contains(terminal))
            .map(|n| n.name.as_str())
    }

    /// Reverse map terminal → net name for repeated lookups in one pass.
    pub fn terminal_index(&self) -> HashMap<Terminal, String> {
        let mut index = HashMap::new();
        for net in self.nets.values() {
            for term in net.terminals() {
                index.entry(term.clone()).or_insert_with(|| net.name.clone());
            }
        }
        index
    }

    /// Terminals listed by more than one net, with the nets claiming them.
    pub fn duplicate_terminals(&self) -> Vec<(Terminal, Vec<String>)> {
        let mut owners: BTreeMap<Terminal, Vec<String>> = BTreeMap::new();
        for net in self.nets.values() {
            for term in net.terminals() {
                owners.entry(term.clone()).or_default().push(net.name.clone());
            }
        }
        owners.into_iter().filter(|(_, nets)| nets.len() > 1).collect()
    }

    /// Smallest `prefix<N>` name not yet taken, counting from 1.
    pub fn unused_name(&self, prefix: &str) -> String {
        (1..)
            .map(|n| format!("{}{}", prefix, n))
            .find(|name| !self.nets.contains_key(name))
            .unwrap_or_else(|| prefix.to_string())
    }

    pub fn nets(&self) -> impl Iterator<Item = &Net> {
        self.nets.values()
    }

    pub fn len(&self) -> usize {
        self.nets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nets.is_empty()
    }

    pub fn clear(&mut self) {
        self.nets.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> NetList {
        let mut list = NetList::new();
        list.get_or_create("GND").add_terminal(Terminal::new("U1", "7"));
        list.get_or_create("VCC").add_terminal(Terminal::new("U1", "14"));
        list.get_or_create("clk_main")
            .add_terminal(Terminal::new("X1", "1"));
        list
    }

    #[test]
    fn test_terminal_parse() {
        let t = Terminal::parse("U1-3").unwrap();
        assert_eq!(t, Terminal::new("U1", "3"));
        assert_eq!(t.to_string(), "U1-3");
        assert!(Terminal::parse("U1").is_err());
        assert!(Terminal::parse("-3").is_err());
    }

    #[test]
    fn test_terminal_identity_ignores_attributes() {
        let mut a = Terminal::new("R1", "1");
        a.attributes.insert("note".into(), "x".into());
        assert_eq!(a, Terminal::new("R1", "1"));
    }

    #[test]
    fn test_lookup_fallbacks() {
        let list = sample();
        assert_eq!(list.get("GND").unwrap().name, "GND");
        assert!(list.get("gnd").is_none());
        assert_eq!(list.get_icase("gnd").unwrap().name, "GND");
        assert_eq!(list.find("CLK_MAIN").unwrap().name, "clk_main");
        assert_eq!(list.find("^V.C$").unwrap().name, "VCC");
        assert!(list.find("nope").is_none());
        assert!(list.get_regex("(").is_err());
    }

    #[test]
    fn test_add_terminal_once() {
        let mut net = Net::new("N");
        assert!(net.add_terminal(Terminal::new("R1", "1")));
        assert!(!net.add_terminal(Terminal::new("R1", "1")));
        assert_eq!(net.terminal_count(), 1);
    }

    #[test]
    fn test_net_of_terminal_and_duplicates() {
        let mut list = sample();
        assert_eq!(list.net_of_terminal(&Terminal::new("U1", "7")), Some("GND"));
        assert!(list.duplicate_terminals().is_empty());
        list.get_or_create("AGND").add_terminal(Terminal::new("U1", "7"));
        let dups = list.duplicate_terminals();
        assert_eq!(dups.len(), 1);
        assert_eq!(dups[0].1, vec!["AGND".to_string(), "GND".to_string()]);
    }

    #[test]
    fn test_unused_name() {
        let mut list = NetList::new();
        assert_eq!(list.unused_name("unnamed_net"), "unnamed_net1");
        list.get_or_create("unnamed_net1");
        assert_eq!(list.unused_name("unnamed_net"), "unnamed_net2");
    }
}
