//! Damage resolution and the set of opponents an entity is engaged with.

use std::collections::BTreeSet;

use super::attributes::{Attributes, HEALTH};
use super::equipment::Equipment;
use super::inventory::Inventory;

/// Hit location used when the attacker names none.
pub const DEFAULT_LOCATION: &str = "body";

/// Per-entity combat calculations consumed by damage resolution.
pub trait CombatHelper {
    /// Mitigation subtracted from a hit on `location`.
    fn soak(&self, location: &str) -> i64;
}

/// Soak from whatever armour is equipped on the slots covering a location.
pub struct ArmorSoak<'a> {
    equipment: &'a Equipment,
    inventory: &'a Inventory,
}

impl<'a> ArmorSoak<'a> {
    pub fn new(equipment: &'a Equipment, inventory: &'a Inventory) -> Self {
        Self {
            equipment,
            inventory,
        }
    }

    fn covering_slots(location: &str) -> &[&str] {
        match location {
            DEFAULT_LOCATION | "torso" => &["torso"],
            "head" => &["head"],
            "legs" => &["legs"],
            "feet" => &["feet"],
            "hands" => &["hands"],
            _ => &[],
        }
    }
}

impl CombatHelper for ArmorSoak<'_> {
    fn soak(&self, location: &str) -> i64 {
        Self::covering_slots(location)
            .iter()
            .filter_map(|slot| self.equipment.get(slot))
            .filter_map(|uuid| self.inventory.find(uuid))
            .map(|item| item.soak)
            .sum()
    }
}

/// Apply a hit of `amount` against `soak`. Zero is not a hit and returns
/// `None`; anything else deals at least one point and never takes health
/// below zero.
pub fn resolve_damage(attrs: &mut Attributes, amount: i64, soak: i64) -> Option<i64> {
    if amount == 0 {
        return None;
    }
    let dealt = amount.saturating_sub(soak).max(1);
    let health = attrs.get_or_zero(HEALTH).saturating_sub(dealt).max(0);
    attrs.set(HEALTH, health);
    Some(dealt)
}

/// Opponents currently engaged; membership only.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Combatants {
    ids: BTreeSet<String>,
}

impl Combatants {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, id: &str) -> bool {
        self.ids.insert(id.to_string())
    }

    pub fn remove(&mut self, id: &str) -> bool {
        self.ids.remove(id)
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.ids.iter().map(String::as_str)
    }
}
