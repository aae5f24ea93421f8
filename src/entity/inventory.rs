/// Inventory management for a player entity
use super::attributes::{Attributes, LEVEL, STAMINA, WILLPOWER};
use super::errors::EntityError;
use super::item::{assemble, Item, ItemRecord};
use uuid::Uuid;

/// Carry capacity floor, regardless of stats.
pub const MIN_CARRY_WEIGHT: i64 = 10;

// ============================================================================
// Inventory Operations
// ============================================================================

/// Ordered item collection; insertion order is display order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Inventory {
    items: Vec<Item>,
}

impl Inventory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_items(items: Vec<Item>) -> Self {
        Self { items }
    }

    pub fn add(&mut self, item: Item) {
        self.items.push(item);
    }

    /// Remove a top-level item. Items inside containers stay put.
    pub fn remove(&mut self, uuid: Uuid) -> Option<Item> {
        let idx = self.items.iter().position(|i| i.uuid == uuid)?;
        Some(self.items.remove(idx))
    }

    pub fn set(&mut self, items: Vec<Item>) {
        self.items = items;
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Look an item up anywhere in the tree.
    pub fn find(&self, uuid: Uuid) -> Option<&Item> {
        self.items.iter().find_map(|i| i.find(uuid))
    }

    pub fn find_mut(&mut self, uuid: Uuid) -> Option<&mut Item> {
        self.items.iter_mut().find_map(|i| i.find_mut(uuid))
    }

    /// Sum of direct items' weights; containers already account for their contents.
    pub fn carried_weight(&self) -> u32 {
        self.items
            .iter()
            .fold(0u32, |sum, item| sum.saturating_add(item.total_weight()))
    }

    /// Containers with at least `size` room left, in inventory order.
    pub fn containers_with_capacity(&self, size: u32) -> Vec<&Item> {
        self.items
            .iter()
            .filter(|item| item.is_container() && item.remaining_size_capacity() >= size)
            .collect()
    }

    pub fn container_with_capacity(&self, size: u32) -> Option<&Item> {
        self.containers_with_capacity(size).into_iter().next()
    }

    /// Every item followed by its container contents, one level deep.
    pub fn flattened(&self) -> Vec<&Item> {
        self.items
            .iter()
            .flat_map(|item| std::iter::once(item).chain(item.contents().iter()))
            .collect()
    }

    /// Detach an item from wherever it sits, top level or inside a container.
    pub fn take(&mut self, uuid: Uuid) -> Option<Item> {
        if let Some(item) = self.remove(uuid) {
            return Some(item);
        }
        self.items.iter_mut().find_map(|i| i.take_nested(uuid))
    }

    /// Move a carried item, nested or not, into a top-level container.
    pub fn stow(&mut self, item: Uuid, container: Uuid) -> Result<(), EntityError> {
        if item == container || !self.items.iter().any(|i| i.uuid == container) {
            return Err(EntityError::ItemNotFound(container));
        }
        let moved = self.take(item).ok_or(EntityError::ItemNotFound(item))?;
        match self.items.iter_mut().find(|i| i.uuid == container) {
            Some(bag) => {
                bag.add_item(moved);
                Ok(())
            }
            None => Err(EntityError::ItemNotFound(container)),
        }
    }

    /// Check whether `item` fits under `max_weight` on top of what is already carried.
    pub fn can_carry(&self, item: &Item, max_weight: i64) -> Result<(), String> {
        let current = i64::from(self.carried_weight());
        let additional = i64::from(item.total_weight());
        if current + additional > max_weight {
            return Err(format!(
                "Too heavy! You can only carry {} more weight units.",
                (max_weight - current).max(0)
            ));
        }
        Ok(())
    }

    /// Depth-first records for persistence.
    pub fn to_records(&self) -> Vec<ItemRecord> {
        self.items.iter().flat_map(Item::flatten).collect()
    }

    pub fn from_records(records: Vec<ItemRecord>) -> Self {
        Self {
            items: assemble(records),
        }
    }
}

/// Weight units a character with these attributes can carry.
pub fn max_carry_weight(attrs: &Attributes) -> i64 {
    let stamina_bonus = attrs.get_or_zero(STAMINA) * 15;
    let level_bonus = ceil_div(attrs.get_or_zero(LEVEL), 4);
    let will_bonus = ceil_div(attrs.get_or_zero(WILLPOWER), 2);

    MIN_CARRY_WEIGHT.max(MIN_CARRY_WEIGHT + stamina_bonus + level_bonus + will_bonus)
}

fn ceil_div(value: i64, by: i64) -> i64 {
    (value as f64 / by as f64).ceil() as i64
}

// ============================================================================
// Unit Tests
// ============================================================================
