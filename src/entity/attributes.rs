//! Named numeric stats (health, sanity, energy, physical stats).
//!
//! The store is a plain mapping; the only rule it owns is the paired bound
//! `0 <= current <= max` for health, sanity and energy, which every write
//! through [`Attributes::set`] re-establishes.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const HEALTH: &str = "health";
pub const MAX_HEALTH: &str = "max_health";
pub const SANITY: &str = "sanity";
pub const MAX_SANITY: &str = "max_sanity";
pub const ENERGY: &str = "energy";
pub const MAX_ENERGY: &str = "max_energy";
pub const STAMINA: &str = "stamina";
pub const WILLPOWER: &str = "willpower";
pub const QUICKNESS: &str = "quickness";
pub const CLEVERNESS: &str = "cleverness";
pub const LEVEL: &str = "level";
pub const EXPERIENCE: &str = "experience";
pub const MUTAGENS: &str = "mutagens";
pub const ATTR_POINTS: &str = "attr_points";

/// `(current, max)` attribute pairs.
pub const PAIRED_ATTRIBUTES: [(&str, &str); 3] = [
    (HEALTH, MAX_HEALTH),
    (SANITY, MAX_SANITY),
    (ENERGY, MAX_ENERGY),
];

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct Attributes {
    values: BTreeMap<String, i64>,
}

impl Default for Attributes {
    fn default() -> Self {
        let values = [
            (MAX_HEALTH, 100),
            (HEALTH, 90),
            (MAX_SANITY, 100),
            (SANITY, 90),
            (MAX_ENERGY, 100),
            (ENERGY, 90),
            (STAMINA, 1),
            (WILLPOWER, 1),
            (QUICKNESS, 1),
            (CLEVERNESS, 1),
            (LEVEL, 1),
            (EXPERIENCE, 0),
            (MUTAGENS, 0),
            (ATTR_POINTS, 0),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect();
        Self { values }
    }
}

impl Attributes {
    /// An attribute set with no entries at all.
    pub fn empty() -> Self {
        Self {
            values: BTreeMap::new(),
        }
    }

    /// Build from a loaded mapping, clamping every pair back into bounds.
    pub fn from_map(values: BTreeMap<String, i64>) -> Self {
        let mut attrs = Self { values };
        for (current, max) in PAIRED_ATTRIBUTES {
            if let (Some(cur), Some(cap)) = (attrs.get(current), attrs.get(max)) {
                attrs.values.insert(current.to_string(), cur.clamp(0, cap.max(0)));
            }
        }
        attrs
    }

    /// Value of `name`, or `None` for attributes this entity does not have.
    pub fn get(&self, name: &str) -> Option<i64> {
        self.values.get(name).copied()
    }

    /// Value of `name`, treating a missing attribute as zero.
    pub fn get_or_zero(&self, name: &str) -> i64 {
        self.get(name).unwrap_or(0)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// Write `value`, keeping paired attributes in bounds. Returns the value
    /// actually stored.
    pub fn set(&mut self, name: &str, value: i64) -> i64 {
        let stored = if let Some(max) = Self::max_of(name) {
            match self.get(max) {
                Some(cap) => value.clamp(0, cap.max(0)),
                None => value.max(0),
            }
        } else if let Some(current) = Self::current_of(name) {
            let cap = value.max(0);
            if let Some(cur) = self.get(current) {
                if cur > cap {
                    self.values.insert(current.to_string(), cap);
                }
            }
            cap
        } else {
            value
        };
        self.values.insert(name.to_string(), stored);
        stored
    }

    /// Add `delta` to `name` (missing counts as zero) through [`Attributes::set`].
    pub fn adjust(&mut self, name: &str, delta: i64) -> i64 {
        let next = self.get_or_zero(name).saturating_add(delta);
        self.set(name, next)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, i64)> {
        self.values.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn as_map(&self) -> &BTreeMap<String, i64> {
        &self.values
    }

    fn max_of(current: &str) -> Option<&'static str> {
        PAIRED_ATTRIBUTES
            .iter()
            .find(|(c, _)| *c == current)
            .map(|(_, m)| *m)
    }

    fn current_of(max: &str) -> Option<&'static str> {
        PAIRED_ATTRIBUTES
            .iter()
            .find(|(_, m)| *m == max)
            .map(|(c, _)| *c)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_new_player() {
        let attrs = Attributes::default();
        assert_eq!(attrs.get(HEALTH), Some(90));
        assert_eq!(attrs.get(MAX_HEALTH), Some(100));
        assert_eq!(attrs.get(STAMINA), Some(1));
        assert_eq!(attrs.get("charisma"), None);
    }

    #[test]
    fn current_is_clamped_to_max_and_zero() {
        let mut attrs = Attributes::default();
        assert_eq!(attrs.set(HEALTH, 250), 100);
        assert_eq!(attrs.set(SANITY, -5), 0);
        assert_eq!(attrs.get(HEALTH), Some(100));
    }

    #[test]
    fn lowering_max_pulls_current_down() {
        let mut attrs = Attributes::default();
        attrs.set(MAX_ENERGY, 40);
        assert_eq!(attrs.get(ENERGY), Some(40));
    }

    #[test]
    fn unpaired_values_are_stored_verbatim() {
        let mut attrs = Attributes::default();
        attrs.set(EXPERIENCE, -3);
        assert_eq!(attrs.get(EXPERIENCE), Some(-3));
        assert_eq!(attrs.adjust(LEVEL, 2), 3);
    }

    #[test]
    fn from_map_repairs_out_of_bounds_pairs() {
        let mut raw = BTreeMap::new();
        raw.insert(HEALTH.to_string(), 500);
        raw.insert(MAX_HEALTH.to_string(), 120);
        let attrs = Attributes::from_map(raw);
        assert_eq!(attrs.get(HEALTH), Some(120));
    }
}
