//! Runtime configuration for the simulation engine.

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Engine settings. Every field has a default, so a JSON file only needs
/// the values it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Seed for the engine's random number generator.
    pub seed: u64,
    /// Game seconds per turn. Fuel burn scales with it.
    pub turn_seconds: f64,
    /// Detach structural islands into new vehicles at the end of a turn.
    pub auto_split: bool,
    /// Reactors on freshly spawned vehicles start switched on.
    pub reactor_enabled: bool,
    /// Throttle share an idling engine still burns fuel at.
    pub idle_load: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            turn_seconds: 6.0,
            auto_split: true,
            reactor_enabled: true,
            idle_load: 0.05,
        }
    }
}

impl EngineConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}
