use serde::{Deserialize, Serialize};

/// Accuracy policy for rat synthesis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RatPolicy {
    /// Only axis-aligned lines, polygons and padstacks may anchor a rat;
    /// diagonal lines and arcs are treated as unreachable.
    pub manhattan_only: bool,
    /// Only object pairs with at least one selected side are candidates.
    pub only_selected: bool,
    /// Report every emitted rat through the message hook.
    pub info: bool,
}

impl RatPolicy {
    pub fn precise() -> Self {
        Self::default()
    }

    pub fn manhattan() -> Self {
        Self {
            manhattan_only: true,
            ..Self::default()
        }
    }

    pub fn with_info(mut self) -> Self {
        self.info = true;
        self
    }
}

/// Settings shared by every connectivity pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RatConfig {
    /// Extra distance under which copper counts as touching.
    pub bloat: f64,
    /// Connect objects to clearing polygons regardless of their clearance.
    pub ignore_clearance: bool,
    /// Nets fragmented into more subnets than this are reported missing
    /// instead of running the cubic connector.
    pub max_subnets: usize,
    /// Prefix for nets created by manual rats, numbered from 1.
    pub auto_net_prefix: String,
    pub default_policy: RatPolicy,
}

impl Default for RatConfig {
    fn default() -> Self {
        Self {
            bloat: 0.0,
            ignore_clearance: false,
            max_subnets: 1024,
            auto_net_prefix: "unnamed_net".to_string(),
            default_policy: RatPolicy::precise(),
        }
    }
}

impl RatConfig {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}
