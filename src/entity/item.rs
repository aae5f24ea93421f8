//! Item model consumed by inventory and equipment.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Item {
    pub uuid: Uuid,
    pub short_desc: String,
    /// Weight of the item itself, excluding anything it contains.
    pub weight: u32,
    pub size: u32,
    /// Mitigation applied to hits on a location this item covers.
    #[serde(default)]
    pub soak: i64,
    #[serde(default)]
    pub equipped: bool,
    /// Total size this item can hold; `None` for non-containers.
    #[serde(default)]
    pub capacity: Option<u32>,
    /// Container this item currently sits in.
    #[serde(default)]
    pub container: Option<Uuid>,
    #[serde(default)]
    contents: Vec<Item>,
}

impl Item {
    pub fn new(short_desc: &str, weight: u32, size: u32) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            short_desc: short_desc.to_string(),
            weight,
            size,
            soak: 0,
            equipped: false,
            capacity: None,
            container: None,
            contents: Vec::new(),
        }
    }

    pub fn container(short_desc: &str, weight: u32, size: u32, capacity: u32) -> Self {
        Self {
            capacity: Some(capacity),
            ..Self::new(short_desc, weight, size)
        }
    }

    pub fn with_soak(mut self, soak: i64) -> Self {
        self.soak = soak;
        self
    }

    pub fn is_container(&self) -> bool {
        self.capacity.is_some()
    }

    /// Own weight plus the weight of everything inside.
    pub fn total_weight(&self) -> u32 {
        self.contents
            .iter()
            .fold(self.weight, |sum, item| sum.saturating_add(item.total_weight()))
    }

    pub fn remaining_size_capacity(&self) -> u32 {
        let used: u32 = self.contents.iter().map(|i| i.size).sum();
        self.capacity.unwrap_or(0).saturating_sub(used)
    }

    pub fn contents(&self) -> &[Item] {
        &self.contents
    }

    /// Place `item` inside this container.
    pub fn add_item(&mut self, mut item: Item) {
        item.container = Some(self.uuid);
        self.contents.push(item);
    }

    pub fn remove_item(&mut self, uuid: Uuid) -> Option<Item> {
        let idx = self.contents.iter().position(|i| i.uuid == uuid)?;
        let mut item = self.contents.remove(idx);
        item.container = None;
        Some(item)
    }

    /// Detach `uuid` from anywhere below this container.
    pub fn take_nested(&mut self, uuid: Uuid) -> Option<Item> {
        if let Some(item) = self.remove_item(uuid) {
            return Some(item);
        }
        self.contents.iter_mut().find_map(|c| c.take_nested(uuid))
    }

    /// Depth-first records for this item and everything it contains.
    pub fn flatten(&self) -> Vec<ItemRecord> {
        let mut out = vec![ItemRecord::from(self)];
        for child in &self.contents {
            out.extend(child.flatten());
        }
        out
    }

    pub(crate) fn find(&self, uuid: Uuid) -> Option<&Item> {
        if self.uuid == uuid {
            return Some(self);
        }
        self.contents.iter().find_map(|i| i.find(uuid))
    }

    pub(crate) fn find_mut(&mut self, uuid: Uuid) -> Option<&mut Item> {
        if self.uuid == uuid {
            return Some(self);
        }
        self.contents.iter_mut().find_map(|i| i.find_mut(uuid))
    }
}

/// One item with its nesting expressed as a parent reference.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ItemRecord {
    pub uuid: Uuid,
    pub short_desc: String,
    pub weight: u32,
    pub size: u32,
    #[serde(default)]
    pub soak: i64,
    #[serde(default)]
    pub equipped: bool,
    #[serde(default)]
    pub capacity: Option<u32>,
    #[serde(default)]
    pub container: Option<Uuid>,
}

impl From<&Item> for ItemRecord {
    fn from(item: &Item) -> Self {
        Self {
            uuid: item.uuid,
            short_desc: item.short_desc.clone(),
            weight: item.weight,
            size: item.size,
            soak: item.soak,
            equipped: item.equipped,
            capacity: item.capacity,
            container: item.container,
        }
    }
}

impl From<ItemRecord> for Item {
    fn from(rec: ItemRecord) -> Self {
        Self {
            uuid: rec.uuid,
            short_desc: rec.short_desc,
            weight: rec.weight,
            size: rec.size,
            soak: rec.soak,
            equipped: rec.equipped,
            capacity: rec.capacity,
            container: rec.container,
            contents: Vec::new(),
        }
    }
}

/// Rebuild nested items from depth-first records. Records whose container
/// is unknown (or appears later in the list) come back as top-level items.
pub fn assemble(records: Vec<ItemRecord>) -> Vec<Item> {
    let index: std::collections::HashMap<Uuid, usize> = records
        .iter()
        .enumerate()
        .map(|(i, r)| (r.uuid, i))
        .collect();
    let parents: Vec<Option<usize>> = records
        .iter()
        .enumerate()
        .map(|(i, r)| {
            r.container
                .and_then(|p| index.get(&p).copied())
                .filter(|&p| p < i)
        })
        .collect();

    let mut slots: Vec<Option<Item>> = records.into_iter().map(|r| Some(Item::from(r))).collect();
    for i in (0..slots.len()).rev() {
        let Some(parent) = parents[i] else { continue };
        if let Some(child) = slots[i].take() {
            if let Some(p) = slots[parent].as_mut() {
                p.contents.insert(0, child);
            }
        }
    }

    slots
        .into_iter()
        .flatten()
        .map(|mut item| {
            if item.container.is_some_and(|p| !index.contains_key(&p)) {
                item.container = None;
            }
            item
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn container_weight_includes_contents() {
        let mut pack = Item::container("a satchel", 2, 4, 10);
        pack.add_item(Item::new("a flask", 3, 2));
        pack.add_item(Item::new("a knife", 1, 1));
        assert_eq!(pack.total_weight(), 6);
        assert_eq!(pack.remaining_size_capacity(), 7);
    }

    #[test]
    fn added_items_point_at_their_container() {
        let mut pack = Item::container("a satchel", 2, 4, 10);
        let flask = Item::new("a flask", 3, 2);
        let id = flask.uuid;
        pack.add_item(flask);
        assert_eq!(pack.contents()[0].container, Some(pack.uuid));

        let back = pack.remove_item(id).expect("flask");
        assert_eq!(back.container, None);
        assert!(pack.contents().is_empty());
    }

    #[test]
    fn non_containers_have_no_room() {
        let rock = Item::new("a rock", 5, 1);
        assert!(!rock.is_container());
        assert_eq!(rock.remaining_size_capacity(), 0);
    }

    #[test]
    fn assemble_restores_nesting_and_order() {
        let mut outer = Item::container("a trunk", 10, 8, 20);
        let mut inner = Item::container("a pouch", 1, 2, 3);
        inner.add_item(Item::new("a coin", 0, 1));
        outer.add_item(inner);
        outer.add_item(Item::new("a map", 0, 1));
        let loose = Item::new("a rope", 2, 2);

        let mut records = outer.flatten();
        records.extend(loose.flatten());
        assert_eq!(records.len(), 5);

        let items = assemble(records);
        assert_eq!(items, vec![outer, loose]);
    }
}
