use std::collections::BTreeMap;
use std::ops::Bound;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::commands::{Command, UndoLog};
use crate::error::BoardError;
use crate::layer::LayerStack;
use crate::netlist::{NetList, Terminal};
use crate::object::{BoardObject, ObjectFlags, ObjectId, Shape, Subcircuit, SubcircuitId};
use crate::spatial::{SpatialEntry, SpatialIndex};

/// Every object and subcircuit placed on the board.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ObjectStore {
    objects: BTreeMap<ObjectId, BoardObject>,
    subcircuits: BTreeMap<SubcircuitId, Subcircuit>,
    next_id: u64,
}

impl ObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    // ── Objects ──────────────────────────────────────────────────────

    pub fn allocate_id(&mut self) -> ObjectId {
        let id = ObjectId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Insert an object under its own id.
    pub fn insert(&mut self, object: BoardObject) {
        self.next_id = self.next_id.max(object.id.0 + 1);
        self.objects.insert(object.id, object);
    }

    /// Place a free (non-subcircuit) object.
    pub fn add(&mut self, shape: Shape) -> ObjectId {
        let id = self.allocate_id();
        self.insert(BoardObject::new(id, shape));
        id
    }

    /// Place an object owned by a subcircuit, optionally carrying a terminal.
    pub fn add_owned(&mut self, shape: Shape, parent: SubcircuitId, term: Option<&str>) -> ObjectId {
        let id = self.allocate_id();
        let mut object = BoardObject::new(id, shape);
        object.parent = Some(parent);
        object.term = term.map(str::to_string);
        self.insert(object);
        id
    }

    pub fn get(&self, id: ObjectId) -> Option<&BoardObject> {
        self.objects.get(&id)
    }

    pub fn get_mut(&mut self, id: ObjectId) -> Option<&mut BoardObject> {
        self.objects.get_mut(&id)
    }

    pub fn remove(&mut self, id: ObjectId) -> Option<BoardObject> {
        self.objects.remove(&id)
    }

    pub fn contains(&self, id: ObjectId) -> bool {
        self.objects.contains_key(&id)
    }

    pub fn objects(&self) -> impl Iterator<Item = &BoardObject> {
        self.objects.values()
    }

    pub fn rats(&self) -> impl Iterator<Item = &BoardObject> {
        self.objects.values().filter(|o| o.is_rat())
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Cursor start for iteration that may remove objects along the way.
    pub fn first_id(&self) -> Option<ObjectId> {
        self.objects.keys().next().copied()
    }

    /// The id following `id` in store order, whether or not `id` still exists.
    pub fn next_id_after(&self, id: ObjectId) -> Option<ObjectId> {
        self.objects
            .range((Bound::Excluded(id), Bound::Unbounded))
            .next()
            .map(|(k, _)| *k)
    }

    pub fn set_flags(&mut self, id: ObjectId, set: ObjectFlags, clear: ObjectFlags) {
        if let Some(obj) = self.objects.get_mut(&id) {
            obj.flags.remove(clear);
            obj.flags.insert(set);
        }
    }

    /// Clear `flags` on every object; returns how many objects changed.
    pub fn clear_flags(&mut self, flags: ObjectFlags) -> usize {
        let mut changed = 0;
        for obj in self.objects.values_mut() {
            if obj.flags.bits() & flags.bits() != 0 {
                obj.flags.remove(flags);
                changed += 1;
            }
        }
        changed
    }

    // ── Subcircuits & terminals ──────────────────────────────────────

    pub fn add_subcircuit(&mut self, subcircuit: Subcircuit) -> SubcircuitId {
        let id = subcircuit.id;
        self.subcircuits.insert(id, subcircuit);
        id
    }

    pub fn subcircuit(&self, id: SubcircuitId) -> Option<&Subcircuit> {
        self.subcircuits.get(&id)
    }

    pub fn subcircuits(&self) -> impl Iterator<Item = &Subcircuit> {
        self.subcircuits.values()
    }

    /// The terminal an object stands for: parent refdes plus term name.
    pub fn terminal_of(&self, id: ObjectId) -> Option<Terminal> {
        let obj = self.objects.get(&id)?;
        let term = obj.term.as_deref()?;
        let parent = self.subcircuits.get(&obj.parent?)?;
        Some(Terminal::new(&parent.refdes, term))
    }

    /// First non-rat object, in id order, carrying `terminal`.
    pub fn find_terminal_object(&self, terminal: &Terminal) -> Option<ObjectId> {
        self.objects
            .values()
            .filter(|o| !o.is_rat() && o.term.as_deref() == Some(terminal.pin.as_str()))
            .find(|o| {
                o.parent
                    .and_then(|p| self.subcircuits.get(&p))
                    .is_some_and(|sc| sc.refdes == terminal.refdes)
            })
            .map(|o| o.id)
    }
}

/// The board: stack-up, placed objects, netlist and edit history.
#[derive(Debug, Serialize, Deserialize)]
pub struct Board {
    pub id: Uuid,
    pub name: String,
    pub layers: LayerStack,
    pub store: ObjectStore,
    pub netlist: NetList,
    /// Set whenever an edit touches the board since the last save.
    #[serde(default)]
    pub changed: bool,
    #[serde(skip)]
    undo: UndoLog,
}

impl Board {
    pub fn new(name: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.to_string(),
            layers: LayerStack::default(),
            store: ObjectStore::new(),
            netlist: NetList::new(),
            changed: false,
            undo: UndoLog::new(),
        }
    }

    pub fn object(&self, id: ObjectId) -> Result<&BoardObject, BoardError> {
        self.store.get(id).ok_or(BoardError::UnknownObject(id))
    }

    /// Non-rat object with at least one copper layer group.
    pub fn is_copper(&self, obj: &BoardObject) -> bool {
        !obj.is_rat() && obj.shape.groups().iter().any(|g| self.layers.is_copper(*g))
    }

    /// R-tree over every copper object's bounding box.
    pub fn copper_index(&self) -> SpatialIndex {
        let entries = self
            .store
            .objects()
            .filter(|o| self.is_copper(o))
            .filter_map(|o| {
                o.shape.bbox().map(|bbox| SpatialEntry {
                    object_id: o.id,
                    bbox,
                })
            })
            .collect();
        SpatialIndex::build(entries)
    }

    // ── Undo / Redo ──────────────────────────────────────────────────

    pub fn begin_step(&mut self, description: &str) {
        self.undo.begin(description);
    }

    pub fn commit_step(&mut self) {
        self.undo.commit();
    }

    pub fn execute(&mut self, mut command: Box<dyn Command>) {
        command.execute(self);
        self.undo.record(command);
    }

    pub fn undo(&mut self) -> bool {
        match self.undo.pop_undo() {
            Some(mut step) => {
                for command in step.commands.iter_mut().rev() {
                    command.undo(self);
                }
                self.undo.push_redo(step);
                true
            }
            None => false,
        }
    }

    pub fn redo(&mut self) -> bool {
        match self.undo.pop_redo() {
            Some(mut step) => {
                for command in step.commands.iter_mut() {
                    command.execute(self);
                }
                self.undo.push_undo(step);
                true
            }
            None => false,
        }
    }

    pub fn can_undo(&self) -> bool {
        self.undo.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.undo.can_redo()
    }

    pub fn undo_description(&self) -> Option<&str> {
        self.undo.undo_description()
    }

    // ── Serialization ────────────────────────────────────────────────

    pub fn to_json(&self) -> Result<String, BoardError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self, BoardError> {
        Ok(serde_json::from_str(json)?)
    }
}
