//! Slot assignments for worn, wielded and held items.
//!
//! Slot names are free-form (`wield`, `offhand`, `held`, `offhand held`, or
//! any body part). An item uuid occupies at most one slot.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

use super::inventory::Inventory;

pub const WIELD: &str = "wield";
pub const OFFHAND: &str = "offhand";
pub const HELD: &str = "held";
pub const OFFHAND_HELD: &str = "offhand held";

/// Slots that occupy a hand.
pub const GRIP_SLOTS: [&str; 4] = [WIELD, OFFHAND, HELD, OFFHAND_HELD];

/// Free grip slots required before another item can be held.
pub const MIN_FREE_GRIPS_TO_HOLD: usize = 3;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Equipment {
    slots: BTreeMap<String, Uuid>,
}

impl Equipment {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from a loaded mapping, keeping only the first slot seen per item.
    pub fn from_map(slots: BTreeMap<String, Uuid>) -> Self {
        let mut eq = Self::new();
        for (slot, uuid) in slots {
            if eq.slot_of(uuid).is_none() {
                eq.slots.insert(slot, uuid);
            }
        }
        eq
    }

    /// Put `uuid` in `slot`, first clearing any slot that already holds it.
    /// Returns a different item that was displaced from `slot`, if any.
    pub fn equip(&mut self, slot: &str, uuid: Uuid) -> Option<Uuid> {
        self.slots.retain(|_, held| *held != uuid);
        self.slots
            .insert(slot.to_string(), uuid)
            .filter(|displaced| *displaced != uuid)
    }

    /// Clear whichever slot references `uuid` and return its name.
    pub fn remove(&mut self, uuid: Uuid) -> Option<String> {
        let slot = self.slot_of(uuid)?.to_string();
        self.slots.remove(&slot);
        Some(slot)
    }

    pub fn get(&self, slot: &str) -> Option<Uuid> {
        self.slots.get(slot).copied()
    }

    pub fn slot_of(&self, uuid: Uuid) -> Option<&str> {
        self.slots
            .iter()
            .find(|(_, held)| **held == uuid)
            .map(|(slot, _)| slot.as_str())
    }

    pub fn is_free(&self, slot: &str) -> bool {
        !self.slots.contains_key(slot)
    }

    pub fn free_grip_slots(&self) -> usize {
        GRIP_SLOTS.iter().filter(|slot| self.is_free(slot)).count()
    }

    /// Holding one more item would still leave a grip slot open.
    pub fn can_hold(&self) -> bool {
        self.free_grip_slots() >= MIN_FREE_GRIPS_TO_HOLD
    }

    pub fn holding_location(&self) -> &'static str {
        if self.is_free(HELD) {
            HELD
        } else {
            OFFHAND_HELD
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Uuid)> {
        self.slots.iter().map(|(slot, uuid)| (slot.as_str(), *uuid))
    }

    pub fn as_map(&self) -> &BTreeMap<String, Uuid> {
        &self.slots
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

/// Where an item being taken off should go.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relocation {
    /// Into this carried container.
    Container(Uuid),
    /// Into this free grip slot.
    Hold(&'static str),
    /// Nowhere; the unequip must be refused.
    HandsFull,
}

/// Decide where `item` would go if unequipped right now: first container with
/// room for it, else a free hand, else nowhere.
pub fn plan_relocation(equipment: &Equipment, inventory: &Inventory, item: Uuid) -> Relocation {
    let size = inventory.find(item).map(|i| i.size).unwrap_or(0);
    if let Some(container) = inventory
        .containers_with_capacity(size)
        .into_iter()
        .find(|c| c.uuid != item)
    {
        return Relocation::Container(container.uuid);
    }
    if equipment.can_hold() {
        return Relocation::Hold(equipment.holding_location());
    }
    Relocation::HandsFull
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::item::Item;

    #[test]
    fn equip_moves_item_between_slots() {
        let mut eq = Equipment::new();
        let sword = Uuid::new_v4();
        eq.equip(WIELD, sword);
        eq.equip(OFFHAND, sword);

        assert_eq!(eq.len(), 1);
        assert_eq!(eq.slot_of(sword), Some(OFFHAND));
        assert!(eq.is_free(WIELD));
    }

    #[test]
    fn equip_same_slot_is_a_reassignment() {
        let mut eq = Equipment::new();
        let helm = Uuid::new_v4();
        assert_eq!(eq.equip("head", helm), None);
        assert_eq!(eq.equip("head", helm), None);
        assert_eq!(eq.get("head"), Some(helm));
        assert_eq!(eq.len(), 1);
    }

    #[test]
    fn equip_reports_displaced_item() {
        let mut eq = Equipment::new();
        let old = Uuid::new_v4();
        let new = Uuid::new_v4();
        eq.equip("torso", old);
        assert_eq!(eq.equip("torso", new), Some(old));
        assert_eq!(eq.slot_of(old), None);
    }

    #[test]
    fn remove_returns_slot_name() {
        let mut eq = Equipment::new();
        let boots = Uuid::new_v4();
        eq.equip("feet", boots);
        assert_eq!(eq.remove(boots).as_deref(), Some("feet"));
        assert_eq!(eq.remove(boots), None);
    }

    #[test]
    fn can_hold_needs_three_free_grips() {
        let mut eq = Equipment::new();
        assert!(eq.can_hold());
        eq.equip(WIELD, Uuid::new_v4());
        assert!(eq.can_hold());
        eq.equip(HELD, Uuid::new_v4());
        assert!(!eq.can_hold());
        assert_eq!(eq.holding_location(), OFFHAND_HELD);
    }

    #[test]
    fn from_map_drops_duplicate_references() {
        let dagger = Uuid::new_v4();
        let mut raw = BTreeMap::new();
        raw.insert(WIELD.to_string(), dagger);
        raw.insert(OFFHAND.to_string(), dagger);
        let eq = Equipment::from_map(raw);
        assert_eq!(eq.len(), 1);
    }

    #[test]
    fn relocation_prefers_container_then_hand() {
        let mut inv = Inventory::new();
        let mut eq = Equipment::new();
        let shield = Item::new("a buckler", 4, 3);
        let shield_id = shield.uuid;
        inv.add(shield);
        eq.equip(OFFHAND, shield_id);

        assert_eq!(plan_relocation(&eq, &inv, shield_id), Relocation::Hold(HELD));

        let bag = Item::container("a sack", 1, 4, 5);
        let bag_id = bag.uuid;
        inv.add(bag);
        assert_eq!(
            plan_relocation(&eq, &inv, shield_id),
            Relocation::Container(bag_id)
        );
    }

    #[test]
    fn relocation_skips_the_item_itself() {
        let mut inv = Inventory::new();
        let mut eq = Equipment::new();
        let bag = Item::container("a backpack", 2, 4, 10);
        let bag_id = bag.uuid;
        inv.add(bag);
        eq.equip("torso", bag_id);
        eq.equip(WIELD, Uuid::new_v4());
        eq.equip(HELD, Uuid::new_v4());

        assert_eq!(plan_relocation(&eq, &inv, bag_id), Relocation::HandsFull);
    }
}
