use crate::board::Board;
use crate::netlist::Terminal;
use crate::object::{BoardObject, ObjectId};

/// A reversible board edit for the undo/redo journal.
pub trait Command: std::fmt::Debug + Send {
    /// Apply the change to the board.
    fn execute(&mut self, board: &mut Board);
    /// Reverse the change.
    fn undo(&mut self, board: &mut Board);
    /// Human-readable description for the undo/redo history.
    fn description(&self) -> &str;
}

// ══════════════════════════════════════════════════════════════════════
// Concrete Commands
// ══════════════════════════════════════════════════════════════════════

/// Place an object; its id is allocated up front so redo reuses it.
#[derive(Debug)]
pub struct AddObjectCommand {
    pub object: BoardObject,
}

impl AddObjectCommand {
    pub fn new(object: BoardObject) -> Self {
        Self { object }
    }
}

impl Command for AddObjectCommand {
    fn execute(&mut self, board: &mut Board) {
        board.store.insert(self.object.clone());
        board.changed = true;
    }

    fn undo(&mut self, board: &mut Board) {
        board.store.remove(self.object.id);
        board.changed = true;
    }

    fn description(&self) -> &str {
        "Add object"
    }
}

/// Remove an object by id.
#[derive(Debug)]
pub struct RemoveObjectCommand {
    pub id: ObjectId,
    /// The removed object (saved for undo).
    removed: Option<BoardObject>,
}

impl RemoveObjectCommand {
    pub fn new(id: ObjectId) -> Self {
        Self { id, removed: None }
    }
}

impl Command for RemoveObjectCommand {
    fn execute(&mut self, board: &mut Board) {
        self.removed = board.store.remove(self.id);
        if self.removed.is_some() {
            board.changed = true;
        }
    }

    fn undo(&mut self, board: &mut Board) {
        if let Some(obj) = self.removed.take() {
            board.store.insert(obj);
            board.changed = true;
        }
    }

    fn description(&self) -> &str {
        "Remove object"
    }
}

/// Add a terminal to a net, creating the net when it does not exist.
#[derive(Debug)]
pub struct AddTerminalCommand {
    pub net: String,
    pub terminal: Terminal,
    created_net: bool,
    added: bool,
}

impl AddTerminalCommand {
    pub fn new(net: &str, terminal: Terminal) -> Self {
        Self {
            net: net.to_string(),
            terminal,
            created_net: false,
            added: false,
        }
    }
}

impl Command for AddTerminalCommand {
    fn execute(&mut self, board: &mut Board) {
        self.created_net = !board.netlist.contains(&self.net);
        self.added = board
            .netlist
            .get_or_create(&self.net)
            .add_terminal(self.terminal.clone());
        board.changed = true;
    }

    fn undo(&mut self, board: &mut Board) {
        if self.added {
            if let Some(net) = board.netlist.get_mut(&self.net) {
                net.remove_terminal(&self.terminal);
            }
        }
        if self.created_net {
            board.netlist.remove(&self.net);
        }
        board.changed = true;
    }

    fn description(&self) -> &str {
        "Add terminal to net"
    }
}

/// One atomic undo step: every command recorded between begin and commit.
#[derive(Debug, Default)]
pub struct UndoStep {
    pub description: String,
    pub commands: Vec<Box<dyn Command>>,
}

/// Undo/redo history grouped into atomic steps.
#[derive(Debug, Default)]
pub struct UndoLog {
    undo_stack: Vec<UndoStep>,
    redo_stack: Vec<UndoStep>,
    open: Option<UndoStep>,
    depth: usize,
}

impl UndoLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a step; nested begins fold into the outermost one.
    pub fn begin(&mut self, description: &str) {
        if self.depth == 0 {
            self.open = Some(UndoStep {
                description: description.to_string(),
                commands: Vec::new(),
            });
        }
        self.depth += 1;
    }

    /// Close the step opened by the matching [`UndoLog::begin`].
    pub fn commit(&mut self) {
        if self.depth == 0 {
            log::warn!("undo commit without a matching begin");
            return;
        }
        self.depth -= 1;
        if self.depth == 0 {
            if let Some(step) = self.open.take() {
                if !step.commands.is_empty() {
                    self.undo_stack.push(step);
                }
            }
        }
    }

    pub fn record(&mut self, command: Box<dyn Command>) {
        // Recording a new edit invalidates the redo history.
        self.redo_stack.clear();
        match self.open.as_mut() {
            Some(step) => step.commands.push(command),
            None => {
                let description = command.description().to_string();
                self.undo_stack.push(UndoStep {
                    description,
                    commands: vec![command],
                });
            }
        }
    }

    pub fn pop_undo(&mut self) -> Option<UndoStep> {
        self.undo_stack.pop()
    }

    pub fn pop_redo(&mut self) -> Option<UndoStep> {
        self.redo_stack.pop()
    }

    pub fn push_undo(&mut self, step: UndoStep) {
        self.undo_stack.push(step);
    }

    pub fn push_redo(&mut self, step: UndoStep) {
        self.redo_stack.push(step);
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn undo_description(&self) -> Option<&str> {
        self.undo_stack.last().map(|s| s.description.as_str())
    }
}
