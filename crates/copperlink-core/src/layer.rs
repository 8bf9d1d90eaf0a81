use serde::{Deserialize, Serialize};

/// A layer group identifier. Layers that are electrically one copper plane
/// share a group.
pub type LayerGroupId = u32;

/// What a layer group is made of.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LayerGroupKind {
    Copper,
    Silk,
    Mask,
    Paste,
    Outline,
}

/// A physical layer group of the board stack-up.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayerGroup {
    pub id: LayerGroupId,
    pub name: String,
    pub kind: LayerGroupKind,
}

impl LayerGroup {
    pub fn new(id: LayerGroupId, name: &str, kind: LayerGroupKind) -> Self {
        Self {
            id,
            name: name.to_string(),
            kind,
        }
    }

    pub fn copper(id: LayerGroupId, name: &str) -> Self {
        Self::new(id, name, LayerGroupKind::Copper)
    }

    pub fn is_copper(&self) -> bool {
        self.kind == LayerGroupKind::Copper
    }
}

/// The ordered stack-up, top to bottom.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayerStack {
    groups: Vec<LayerGroup>,
}

impl LayerStack {
    pub fn new() -> Self {
        Self { groups: Vec::new() }
    }

    /// Two-layer board: top copper (0) and bottom copper (1).
    pub fn two_layer() -> Self {
        let mut stack = Self::new();
        stack.add_group(LayerGroup::copper(0, "top"));
        stack.add_group(LayerGroup::copper(1, "bottom"));
        stack
    }

    pub fn add_group(&mut self, group: LayerGroup) {
        self.groups.push(group);
    }

    pub fn get_group(&self, id: LayerGroupId) -> Option<&LayerGroup> {
        self.groups.iter().find(|g| g.id == id)
    }

    pub fn is_copper(&self, id: LayerGroupId) -> bool {
        self.get_group(id).is_some_and(LayerGroup::is_copper)
    }

    pub fn copper_groups(&self) -> impl Iterator<Item = &LayerGroup> {
        self.groups.iter().filter(|g| g.is_copper())
    }
}

impl Default for LayerStack {
    fn default() -> Self {
        Self::two_layer()
    }
}
