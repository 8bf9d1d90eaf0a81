use serde::{Deserialize, Serialize};

use copperlink_core::{ObjectId, Terminal};

/// Severity of a user-visible message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageLevel {
    Info,
    Warning,
}

/// A crawl of `net` reached a terminal of `offender_net`.
#[derive(Debug, Clone, PartialEq)]
pub struct ShortIndication {
    pub net: String,
    pub offender_net: String,
    /// The object carrying the foreign terminal.
    pub offender: ObjectId,
    /// The object the crawl arrived from, if any.
    pub arrived_from: Option<ObjectId>,
}

/// Record appended to the back-annotation journal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum BackAnnotation {
    AddConnection { net: String, terminal: Terminal },
}

/// Collaborators of the host editor the connectivity core talks to.
///
/// Every method has a no-op default so headless callers implement nothing.
pub trait EditorHooks {
    fn message(&mut self, _level: MessageLevel, _text: &str) {}

    /// Offer a short for highlighting; return `true` when handled. Unhandled
    /// shorts fall back to the WARN flag on both objects.
    fn short_indicated(&mut self, _short: &ShortIndication) -> bool {
        false
    }

    /// The set of shorted nets changed; warnings in the ratsnest view are stale.
    fn ratsnest_warning_refresh(&mut self) {}

    fn back_annotate(&mut self, _entry: BackAnnotation) {}

    /// Ask the user for a net name; `None` cancels.
    fn prompt_net_name(&mut self, suggested: &str) -> Option<String> {
        Some(suggested.to_string())
    }
}

/// Hooks that keep everything they are told; used headless and in tests.
#[derive(Debug, Default)]
pub struct RecordingHooks {
    pub messages: Vec<(MessageLevel, String)>,
    pub shorts: Vec<ShortIndication>,
    /// Answer `short_indicated` with this value.
    pub handle_shorts: bool,
    pub warning_refreshes: usize,
    pub journal: Vec<BackAnnotation>,
    /// Scripted prompt reply; `None` accepts the suggestion.
    pub net_name_reply: Option<Option<String>>,
}

impl RecordingHooks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_message(&self) -> Option<&str> {
        self.messages.last().map(|(_, text)| text.as_str())
    }

    pub fn warnings(&self) -> impl Iterator<Item = &str> {
        self.messages
            .iter()
            .filter(|(level, _)| *level == MessageLevel::Warning)
            .map(|(_, text)| text.as_str())
    }
}

impl EditorHooks for RecordingHooks {
    fn message(&mut self, level: MessageLevel, text: &str) {
        self.messages.push((level, text.to_string()));
    }

    fn short_indicated(&mut self, short: &ShortIndication) -> bool {
        self.shorts.push(short.clone());
        self.handle_shorts
    }

    fn ratsnest_warning_refresh(&mut self) {
        self.warning_refreshes += 1;
    }

    fn back_annotate(&mut self, entry: BackAnnotation) {
        self.journal.push(entry);
    }

    fn prompt_net_name(&mut self, suggested: &str) -> Option<String> {
        match &self.net_name_reply {
            Some(reply) => reply.clone(),
            None => Some(suggested.to_string()),
        }
    }
}
