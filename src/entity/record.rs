use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use uuid::Uuid;

use super::effects::EffectSnapshot;
use super::item::ItemRecord;
use super::training::TrainingQueue;

pub const PLAYER_SCHEMA_VERSION: u8 = 1;

pub const DEFAULT_PROMPT: &str = "PHYSICAL: %health_condition || MENTAL: %sanity_condition || ENERGY: %energy_condition\n[";
pub const DEFAULT_COMBAT_PROMPT: &str = "|| YOU: %player_condition |VS.| %target_condition ||\r\n>";
pub const DEFAULT_DESCRIPTION: &str = "A person.";
pub const DEFAULT_BODY_PARTS: [&str; 5] = ["legs", "feet", "torso", "hands", "head"];

/// Player-tunable behaviour settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Preferences {
    /// Preferred hit location when attacking.
    pub target: String,
    /// Health percentage below which the player tries to flee.
    pub wimpy: i64,
    pub stance: String,
    /// `default` = verbose the first time, short afterwards.
    pub roomdescs: String,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            target: "body".to_string(),
            wimpy: 30,
            stance: "normal".to_string(),
            roomdescs: "default".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct KillRecord {
    pub amount: u32,
    pub level: i64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Acquaintance {
    pub reputation: i64,
    #[serde(default)]
    pub topics: BTreeSet<String>,
}

/// Persistable player state. Every field loads as its empty default when
/// absent so older or hand-edited records still open.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PlayerRecord {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub account_name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub location: Option<u32>,
    #[serde(default)]
    pub locale: Option<String>,
    #[serde(default)]
    pub prompt_string: String,
    #[serde(default)]
    pub combat_prompt: String,
    /// Argon2 PHC string.
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub equipment: BTreeMap<String, Uuid>,
    #[serde(default)]
    pub attributes: BTreeMap<String, i64>,
    /// Skill levels keyed by skill id; validated against the catalog on load.
    #[serde(default)]
    pub skills: BTreeMap<String, u32>,
    #[serde(default)]
    pub feats: Vec<String>,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub preferences: Preferences,
    #[serde(default)]
    pub explored: Vec<u32>,
    #[serde(default)]
    pub killed: BTreeMap<String, KillRecord>,
    #[serde(default)]
    pub met: BTreeMap<String, Acquaintance>,
    #[serde(default)]
    pub training: TrainingQueue,
    #[serde(default)]
    pub body_parts: Vec<String>,
    #[serde(default)]
    pub effects: Vec<EffectSnapshot>,
    /// Depth-first item records; nesting is carried by each record's container.
    #[serde(default)]
    pub inventory: Vec<ItemRecord>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub schema_version: u8,
}

impl PlayerRecord {
    pub fn touch(&mut self) {
        self.updated_at = Some(Utc::now());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sparse_json_loads_with_defaults() {
        let record: PlayerRecord = serde_json::from_str(r#"{"name":"Ash"}"#).expect("parse");
        assert_eq!(record.name, "Ash");
        assert!(record.equipment.is_empty());
        assert!(record.inventory.is_empty());
        assert_eq!(record.training, TrainingQueue::default());
        assert_eq!(record.preferences, Preferences::default());
    }

    #[test]
    fn partial_preferences_fill_in_defaults() {
        let record: PlayerRecord =
            serde_json::from_str(r#"{"preferences":{"target":"head"}}"#).expect("parse");
        assert_eq!(record.preferences.target, "head");
        assert_eq!(record.preferences.wimpy, 30);
    }
}
