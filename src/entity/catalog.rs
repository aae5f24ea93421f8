//! Closed catalog of skills and feats.
//!
//! Identifiers arrive as strings from commands and saved records; they are
//! parsed into [`SkillId`] / [`FeatId`] once and carried typed afterwards.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use super::attributes::{CLEVERNESS, MAX_ENERGY, MAX_HEALTH, MAX_SANITY, QUICKNESS, STAMINA};
use super::effects::{Effect, EffectConfig};
use super::errors::EntityError;
use super::events::ACTION_EVENT;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkillId {
    Brawling,
    Blades,
    Dodging,
    DualWielding,
    Lockpicking,
    Perception,
    Stealth,
    Stun,
}

impl SkillId {
    pub const ALL: [SkillId; 8] = [
        SkillId::Brawling,
        SkillId::Blades,
        SkillId::Dodging,
        SkillId::DualWielding,
        SkillId::Lockpicking,
        SkillId::Perception,
        SkillId::Stealth,
        SkillId::Stun,
    ];

    pub fn key(self) -> &'static str {
        match self {
            SkillId::Brawling => "brawling",
            SkillId::Blades => "blades",
            SkillId::Dodging => "dodging",
            SkillId::DualWielding => "dual_wielding",
            SkillId::Lockpicking => "lockpicking",
            SkillId::Perception => "perception",
            SkillId::Stealth => "stealth",
            SkillId::Stun => "stun",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            SkillId::Brawling => "Brawling",
            SkillId::Blades => "Blades",
            SkillId::Dodging => "Dodging",
            SkillId::DualWielding => "Dual Wielding",
            SkillId::Lockpicking => "Lockpicking",
            SkillId::Perception => "Perception",
            SkillId::Stealth => "Stealth",
            SkillId::Stun => "Stun",
        }
    }
}

impl fmt::Display for SkillId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SkillId {
    type Err = EntityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase().replace(' ', "_");
        SkillId::ALL
            .into_iter()
            .find(|id| id.key() == wanted)
            .ok_or_else(|| EntityError::UnknownSkill(s.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeatKind {
    /// Always on once gained.
    Passive,
    /// Spent on demand for a temporary benefit.
    Active,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeatExpiry {
    Permanent,
    Millis(u64),
    UntilEvent(&'static str),
}

/// Typed capability record for a feat.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeatDefinition {
    pub id: FeatId,
    pub name: &'static str,
    pub kind: FeatKind,
    /// Energy spent per use (active feats only).
    pub cost: i64,
    pub expiry: FeatExpiry,
    pub modifiers: &'static [(&'static str, i64)],
}

impl FeatDefinition {
    /// Effect that applies this feat's modifiers and reverts them on expiry.
    pub fn effect(&self) -> Effect {
        let base = match self.expiry {
            FeatExpiry::Permanent => Effect::permanent(),
            FeatExpiry::Millis(ms) => Effect::lasting(Duration::from_millis(ms)),
            FeatExpiry::UntilEvent(event) => Effect::until_event(event),
        };
        let modifiers = self.modifiers;
        base.on_activate(move |attrs, _: &EffectConfig| {
            for (attr, amount) in modifiers {
                attrs.adjust(attr, *amount);
            }
        })
        .on_deactivate(move |attrs, _: &EffectConfig| {
            for (attr, amount) in modifiers {
                attrs.adjust(attr, -*amount);
            }
        })
    }

    /// Registry key used for the feat's effect.
    pub fn effect_name(&self) -> String {
        format!("feat:{}", self.id.key())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeatId {
    Leatherskin,
    Ironskin,
    Serenity,
    Adrenaline,
    Focus,
}

impl FeatId {
    pub const ALL: [FeatId; 5] = [
        FeatId::Leatherskin,
        FeatId::Ironskin,
        FeatId::Serenity,
        FeatId::Adrenaline,
        FeatId::Focus,
    ];

    pub fn key(self) -> &'static str {
        match self {
            FeatId::Leatherskin => "leatherskin",
            FeatId::Ironskin => "ironskin",
            FeatId::Serenity => "serenity",
            FeatId::Adrenaline => "adrenaline",
            FeatId::Focus => "focus",
        }
    }

    pub fn definition(self) -> FeatDefinition {
        match self {
            FeatId::Leatherskin => FeatDefinition {
                id: self,
                name: "Leatherskin",
                kind: FeatKind::Passive,
                cost: 0,
                expiry: FeatExpiry::Permanent,
                modifiers: &[(MAX_HEALTH, 10)],
            },
            FeatId::Ironskin => FeatDefinition {
                id: self,
                name: "Ironskin",
                kind: FeatKind::Passive,
                cost: 0,
                expiry: FeatExpiry::Permanent,
                modifiers: &[(MAX_HEALTH, 25)],
            },
            FeatId::Serenity => FeatDefinition {
                id: self,
                name: "Serenity",
                kind: FeatKind::Passive,
                cost: 0,
                expiry: FeatExpiry::Permanent,
                modifiers: &[(MAX_SANITY, 15), (MAX_ENERGY, 5)],
            },
            FeatId::Adrenaline => FeatDefinition {
                id: self,
                name: "Adrenaline",
                kind: FeatKind::Active,
                cost: 15,
                expiry: FeatExpiry::Millis(30_000),
                modifiers: &[(QUICKNESS, 2), (STAMINA, 1)],
            },
            FeatId::Focus => FeatDefinition {
                id: self,
                name: "Focus",
                kind: FeatKind::Active,
                cost: 10,
                expiry: FeatExpiry::UntilEvent(ACTION_EVENT),
                modifiers: &[(CLEVERNESS, 2)],
            },
        }
    }
}

impl fmt::Display for FeatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.definition().name)
    }
}

impl FromStr for FeatId {
    type Err = EntityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        FeatId::ALL
            .into_iter()
            .find(|id| id.key() == wanted)
            .ok_or_else(|| EntityError::UnknownFeat(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::attributes::Attributes;
    use crate::entity::effects::EffectRegistry;
    use tokio::time::Instant;

    #[test]
    fn skills_parse_from_keys_and_display_names() {
        assert_eq!("dodging".parse::<SkillId>().unwrap(), SkillId::Dodging);
        assert_eq!("Dual Wielding".parse::<SkillId>().unwrap(), SkillId::DualWielding);
        assert!(matches!(
            "juggling".parse::<SkillId>(),
            Err(EntityError::UnknownSkill(s)) if s == "juggling"
        ));
    }

    #[test]
    fn feats_parse_case_insensitively() {
        assert_eq!("IronSkin".parse::<FeatId>().unwrap(), FeatId::Ironskin);
        assert!("flight".parse::<FeatId>().is_err());
    }

    #[test]
    fn passive_feat_effect_is_reversible() {
        let def = FeatId::Serenity.definition();
        let mut reg = EffectRegistry::new();
        let mut attrs = Attributes::default();
        reg.add(&def.effect_name(), def.effect(), EffectConfig::Null, &mut attrs, Instant::now());
        assert_eq!(attrs.get(MAX_SANITY), Some(115));
        assert_eq!(attrs.get(MAX_ENERGY), Some(105));

        reg.remove("feat:serenity", &mut attrs).expect("remove");
        assert_eq!(attrs, Attributes::default());
    }

    #[test]
    fn every_feat_has_consistent_kind() {
        for id in FeatId::ALL {
            let def = id.definition();
            match def.kind {
                FeatKind::Passive => {
                    assert_eq!(def.expiry, FeatExpiry::Permanent);
                    assert_eq!(def.cost, 0);
                }
                FeatKind::Active => assert!(def.cost > 0),
            }
        }
    }
}
