//! The player entity: one owner for attributes, effects, equipment,
//! inventory, training and combat state, exposing the operations command
//! handlers and NPC scripts call.
//!
//! Every mutation is a synchronous, run-to-completion method on
//! `&mut PlayerEntity`. Timers re-enter through [`PlayerEntity::expire_effects`]
//! (see [`crate::entity::driver`]); lifecycle-event deactivation happens
//! inside [`PlayerEntity::emit`].

use argon2::Argon2;
use chrono::{DateTime, Utc};
use log::{debug, error, info, warn};
use password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use rand::Rng;
use std::collections::{BTreeMap, BTreeSet};
use tokio::time::Instant;
use uuid::Uuid;

use super::attributes::{Attributes, CLEVERNESS, ENERGY, PAIRED_ATTRIBUTES};
use super::catalog::{FeatId, FeatKind, SkillId};
use super::combat::{resolve_damage, ArmorSoak, CombatHelper, Combatants, DEFAULT_LOCATION};
use super::effects::{ActiveEffect, Effect, EffectConfig, EffectRegistry};
use super::equipment::{plan_relocation, Equipment, Relocation};
use super::errors::EntityError;
use super::events::{EntityEvent, LifecycleBus, ListenerHandle};
use super::inventory::{max_carry_weight, Inventory};
use super::item::Item;
use super::notice::{Localizer, Notice, NoticeSink, Outbound};
use super::record::{
    Acquaintance, KillRecord, PlayerRecord, Preferences, DEFAULT_BODY_PARTS,
    DEFAULT_COMBAT_PROMPT, DEFAULT_DESCRIPTION, DEFAULT_PROMPT, PLAYER_SCHEMA_VERSION,
};
use super::storage::PlayerStore;
use super::training::{
    TrainingQueue, TrainingReport, TrainingSession, CLOSING_NOTICE, REGIMEN_CHANGED_NOTICE,
};
use crate::logutil::Escaped;

pub const NO_ENERGY_NOTICE: &str = "You need to rest first.";
pub const HANDS_FULL_NOTICE: &str =
    "Your hands are full. You will have to put away or drop something you are holding.";

/// What happened to an item passed to [`PlayerEntity::unequip`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnequipOutcome {
    /// Put away in a carried container.
    Stowed { slot: String, container: Uuid },
    /// Moved to a free hand.
    Held { slot: String, grip: &'static str },
    /// Taken off without relocation (the caller is dropping it).
    Removed { slot: String },
    /// Nowhere to put it; still equipped.
    HandsFull,
    /// It was not in any slot.
    NotEquipped,
}

impl UnequipOutcome {
    /// Slot the item was taken out of, if it left one.
    pub fn slot(&self) -> Option<&str> {
        match self {
            UnequipOutcome::Stowed { slot, .. }
            | UnequipOutcome::Held { slot, .. }
            | UnequipOutcome::Removed { slot } => Some(slot),
            UnequipOutcome::HandsFull | UnequipOutcome::NotEquipped => None,
        }
    }
}

#[derive(Debug)]
pub struct PlayerEntity {
    name: String,
    account_name: String,
    description: String,
    location: Option<u32>,
    locale: Option<String>,
    prompt: String,
    combat_prompt: String,
    password_hash: Option<String>,
    gender: Option<String>,
    body_parts: Vec<String>,
    preferences: Preferences,
    attributes: Attributes,
    effects: EffectRegistry,
    equipment: Equipment,
    inventory: Inventory,
    skills: BTreeMap<SkillId, u32>,
    feats: BTreeSet<FeatId>,
    training: TrainingQueue,
    combatants: Combatants,
    explored: Vec<u32>,
    killed: BTreeMap<String, KillRecord>,
    met: BTreeMap<String, Acquaintance>,
    bus: LifecycleBus,
    outbox: Vec<Outbound>,
}

impl PlayerEntity {
    /// A brand-new character with starting attributes and every skill at level 1.
    pub fn new(name: &str, account_name: &str) -> Self {
        let mut player = Self::blank();
        player.name = name.to_string();
        player.account_name = account_name.to_string();
        player.description = DEFAULT_DESCRIPTION.to_string();
        player.prompt = DEFAULT_PROMPT.to_string();
        player.combat_prompt = DEFAULT_COMBAT_PROMPT.to_string();
        player.body_parts = DEFAULT_BODY_PARTS.iter().map(|s| s.to_string()).collect();
        player.attributes = Attributes::default();
        player.initialize_skills();
        player
    }

    fn blank() -> Self {
        Self {
            name: String::new(),
            account_name: String::new(),
            description: String::new(),
            location: None,
            locale: None,
            prompt: String::new(),
            combat_prompt: String::new(),
            password_hash: None,
            gender: None,
            body_parts: Vec::new(),
            preferences: Preferences::default(),
            attributes: Attributes::empty(),
            effects: EffectRegistry::new(),
            equipment: Equipment::new(),
            inventory: Inventory::new(),
            skills: BTreeMap::new(),
            feats: BTreeSet::new(),
            training: TrainingQueue::new(),
            combatants: Combatants::new(),
            explored: Vec::new(),
            killed: BTreeMap::new(),
            met: BTreeMap::new(),
            bus: LifecycleBus::new(),
            outbox: Vec::new(),
        }
    }

    // ------------------------------------------------------------------
    // Identity
    // ------------------------------------------------------------------

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: &str) {
        self.name = name.to_string();
    }

    pub fn account_name(&self) -> &str {
        &self.account_name
    }

    pub fn set_account_name(&mut self, account_name: &str) {
        self.account_name = account_name.to_string();
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn set_description(&mut self, description: &str) {
        self.description = description.to_string();
    }

    pub fn location(&self) -> Option<u32> {
        self.location
    }

    pub fn set_location(&mut self, vnum: u32) {
        self.location = Some(vnum);
    }

    pub fn locale(&self) -> Option<&str> {
        self.locale.as_deref()
    }

    pub fn set_locale(&mut self, locale: &str) {
        self.locale = Some(locale.to_string());
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    pub fn set_prompt(&mut self, prompt: &str) {
        self.prompt = prompt.to_string();
    }

    pub fn combat_prompt(&self) -> &str {
        &self.combat_prompt
    }

    pub fn set_combat_prompt(&mut self, prompt: &str) {
        self.combat_prompt = prompt.to_string();
    }

    pub fn gender(&self) -> Option<&str> {
        self.gender.as_deref()
    }

    pub fn set_gender(&mut self, gender: &str) {
        self.gender = Some(gender.to_uppercase());
    }

    pub fn body_parts(&self) -> &[String] {
        &self.body_parts
    }

    /// Hash and store a new password.
    pub fn set_password(&mut self, password: &str) -> Result<(), EntityError> {
        self.set_password_with(&Argon2::default(), password)
    }

    pub fn set_password_with(&mut self, argon2: &Argon2<'_>, password: &str) -> Result<(), EntityError> {
        let salt = SaltString::generate(&mut rand::thread_rng());
        let hash = argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| EntityError::Password(e.to_string()))?;
        self.password_hash = Some(hash.to_string());
        Ok(())
    }

    pub fn verify_password(&self, password: &str) -> bool {
        let Some(stored) = &self.password_hash else {
            return false;
        };
        match PasswordHash::new(stored) {
            Ok(parsed) => Argon2::default()
                .verify_password(password.as_bytes(), &parsed)
                .is_ok(),
            Err(e) => {
                error!("corrupt password hash for {}: {}", self.name, e);
                false
            }
        }
    }

    pub fn password_hash(&self) -> Option<&str> {
        self.password_hash.as_deref()
    }

    // ------------------------------------------------------------------
    // Attributes and preferences
    // ------------------------------------------------------------------

    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    /// `None` for attributes this player does not have.
    pub fn attribute(&self, name: &str) -> Option<i64> {
        self.attributes.get(name)
    }

    pub fn set_attribute(&mut self, name: &str, value: i64) -> i64 {
        self.attributes.set(name, value)
    }

    pub fn preferences(&self) -> &Preferences {
        &self.preferences
    }

    pub fn set_preferences(&mut self, preferences: Preferences) {
        self.preferences = preferences;
    }

    pub fn set_stance(&mut self, stance: &str) {
        self.preferences.stance = stance.to_lowercase();
    }

    pub fn check_stance(&self, stance: &str) -> bool {
        self.preferences.stance == stance.to_lowercase()
    }

    /// True (and an `action` event is emitted) when current energy covers `cost`.
    pub fn has_energy(&mut self, cost: i64) -> bool {
        if self.attributes.get_or_zero(ENERGY) >= cost {
            self.emit(EntityEvent::action(cost));
            true
        } else {
            false
        }
    }

    pub fn no_energy(&mut self) {
        self.warn(NO_ENERGY_NOTICE);
    }

    // ------------------------------------------------------------------
    // Lifecycle events
    // ------------------------------------------------------------------

    /// Deliver `event`: effects bound to it expire first, then listeners run.
    /// Returns the names of effects that expired.
    pub fn emit(&mut self, event: EntityEvent) -> Vec<String> {
        let expired = self.effects.fire_event(&event.name, &mut self.attributes);
        self.bus.emit(&event);
        expired
    }

    pub fn subscribe(
        &mut self,
        event: &str,
        listener: impl FnMut(&EntityEvent) + Send + 'static,
    ) -> ListenerHandle {
        self.bus.subscribe(event, listener)
    }

    pub fn unsubscribe(&mut self, handle: ListenerHandle) -> bool {
        self.bus.unsubscribe(handle)
    }

    // ------------------------------------------------------------------
    // Effects
    // ------------------------------------------------------------------

    pub fn add_effect(&mut self, name: &str, effect: Effect, config: EffectConfig) {
        self.add_effect_at(name, effect, config, Instant::now());
    }

    pub fn add_effect_at(&mut self, name: &str, effect: Effect, config: EffectConfig, now: Instant) {
        self.effects
            .add(name, effect, config, &mut self.attributes, now);
    }

    /// Unknown names are logged and reported; nothing changes.
    pub fn remove_effect(&mut self, name: &str) -> Result<(), EntityError> {
        self.effects.remove(name, &mut self.attributes)
    }

    pub fn effect(&self, name: &str) -> Option<&ActiveEffect> {
        self.effects.get(name)
    }

    pub fn effects(&self) -> &EffectRegistry {
        &self.effects
    }

    pub fn next_effect_deadline(&self) -> Option<Instant> {
        self.effects.next_deadline()
    }

    /// Expire every effect whose timer is due at `now`.
    pub fn expire_effects(&mut self, now: Instant) -> Vec<String> {
        self.effects.expire_due(now, &mut self.attributes)
    }

    // ------------------------------------------------------------------
    // Inventory
    // ------------------------------------------------------------------

    pub fn inventory(&self) -> &Inventory {
        &self.inventory
    }

    pub fn add_item(&mut self, item: Item) {
        self.inventory.add(item);
    }

    /// Remove a carried item, clearing any slot that referenced it.
    pub fn remove_item(&mut self, uuid: Uuid) -> Option<Item> {
        let mut item = self.inventory.remove(uuid)?;
        if self.equipment.remove(uuid).is_some() {
            item.equipped = false;
        }
        Some(item)
    }

    /// Replace the whole inventory, dropping slot references to items no longer carried.
    pub fn set_inventory(&mut self, items: Vec<Item>) {
        self.inventory.set(items);
        let stale: Vec<Uuid> = self
            .equipment
            .iter()
            .map(|(_, uuid)| uuid)
            .filter(|uuid| self.inventory.find(*uuid).is_none())
            .collect();
        for uuid in stale {
            self.equipment.remove(uuid);
        }
    }

    pub fn carried_weight(&self) -> u32 {
        self.inventory.carried_weight()
    }

    pub fn max_carry_weight(&self) -> i64 {
        max_carry_weight(&self.attributes)
    }

    pub fn can_carry(&self, item: &Item) -> Result<(), String> {
        self.inventory.can_carry(item, self.max_carry_weight())
    }

    pub fn containers_with_capacity(&self, size: u32) -> Vec<&Item> {
        self.inventory.containers_with_capacity(size)
    }

    pub fn container_with_capacity(&self, size: u32) -> Option<&Item> {
        self.inventory.container_with_capacity(size)
    }

    pub fn flattened_inventory(&self) -> Vec<&Item> {
        self.inventory.flattened()
    }

    // ------------------------------------------------------------------
    // Equipment
    // ------------------------------------------------------------------

    pub fn equipment(&self) -> &Equipment {
        &self.equipment
    }

    /// Uuid of whatever occupies `slot`.
    pub fn equipped_id(&self, slot: &str) -> Option<Uuid> {
        self.equipment.get(slot)
    }

    /// The carried item occupying `slot`.
    pub fn equipped_item(&self, slot: &str) -> Option<&Item> {
        self.equipment
            .get(slot)
            .and_then(|uuid| self.inventory.find(uuid))
    }

    /// Put a carried item in `slot`. The slot name is not validated.
    pub fn equip(&mut self, slot: &str, uuid: Uuid) -> Result<(), EntityError> {
        if self.inventory.find(uuid).is_none() {
            warn!("{} tried to equip uncarried item {}", Escaped(&self.name), uuid);
            return Err(EntityError::ItemNotFound(uuid));
        }
        if let Some(displaced) = self.equipment.equip(slot, uuid) {
            if let Some(old) = self.inventory.find_mut(displaced) {
                old.equipped = false;
            }
        }
        if let Some(item) = self.inventory.find_mut(uuid) {
            item.equipped = true;
        }
        Ok(())
    }

    pub fn can_hold(&self) -> bool {
        self.equipment.can_hold()
    }

    pub fn find_holding_location(&self) -> &'static str {
        self.equipment.holding_location()
    }

    /// Take an item out of its slot. Unless `dropping`, the item is first put
    /// somewhere safe: a container with room, else a free hand. With neither
    /// available the player is warned and nothing changes.
    pub fn unequip(&mut self, uuid: Uuid, dropping: bool) -> Result<UnequipOutcome, EntityError> {
        let Some(slot) = self.equipment.slot_of(uuid).map(str::to_string) else {
            let item = self
                .inventory
                .find_mut(uuid)
                .ok_or(EntityError::ItemNotFound(uuid))?;
            item.equipped = false;
            return Ok(UnequipOutcome::NotEquipped);
        };

        let Some(item_name) = self.inventory.find(uuid).map(|i| i.short_desc.clone()) else {
            warn!(
                "{} had uncarried item {} in slot {}; clearing it",
                Escaped(&self.name),
                uuid,
                slot
            );
            self.equipment.remove(uuid);
            return Ok(UnequipOutcome::Removed { slot });
        };

        if dropping {
            self.take_off(uuid);
            return Ok(UnequipOutcome::Removed { slot });
        }

        match plan_relocation(&self.equipment, &self.inventory, uuid) {
            Relocation::Container(container) => {
                self.inventory.stow(uuid, container)?;
                self.take_off(uuid);
                let container_name = self
                    .inventory
                    .find(container)
                    .map(|c| c.short_desc.clone())
                    .unwrap_or_default();
                self.say(format!(
                    "You remove the {} and place it in your {}.",
                    item_name, container_name
                ));
                self.tell_room(format!(
                    "{} removes their {} and places it in their {}.",
                    self.name, item_name, container_name
                ));
                Ok(UnequipOutcome::Stowed { slot, container })
            }
            Relocation::Hold(grip) => {
                self.equipment.equip(grip, uuid);
                self.say(format!("You remove the {} and hold onto it.", item_name));
                self.tell_room(format!("{} removes their {} and holds it.", self.name, item_name));
                Ok(UnequipOutcome::Held { slot, grip })
            }
            Relocation::HandsFull => {
                self.warn(HANDS_FULL_NOTICE);
                Ok(UnequipOutcome::HandsFull)
            }
        }
    }

    fn take_off(&mut self, uuid: Uuid) {
        self.equipment.remove(uuid);
        if let Some(item) = self.inventory.find_mut(uuid) {
            item.equipped = false;
        }
    }

    // ------------------------------------------------------------------
    // Combat
    // ------------------------------------------------------------------

    /// Combat helper bound to this player's current gear.
    pub fn combat_helper(&self) -> ArmorSoak<'_> {
        ArmorSoak::new(&self.equipment, &self.inventory)
    }

    /// Apply a hit using this player's own armour for mitigation.
    pub fn damage(&mut self, amount: i64, location: Option<&str>) -> Option<i64> {
        let location = location.unwrap_or(DEFAULT_LOCATION);
        let soak = self.combat_helper().soak(location);
        self.apply_damage(amount, location, soak)
    }

    /// Apply a hit using an external mitigation source.
    pub fn damage_with(
        &mut self,
        helper: &dyn CombatHelper,
        amount: i64,
        location: Option<&str>,
    ) -> Option<i64> {
        let location = location.unwrap_or(DEFAULT_LOCATION);
        self.apply_damage(amount, location, helper.soak(location))
    }

    fn apply_damage(&mut self, amount: i64, location: &str, soak: i64) -> Option<i64> {
        let dealt = resolve_damage(&mut self.attributes, amount, soak)?;
        info!(
            "Damage done to {} ({}): {}",
            Escaped(&self.name),
            location,
            dealt
        );
        Some(dealt)
    }

    pub fn is_in_combat(&self) -> bool {
        !self.combatants.is_empty()
    }

    pub fn set_in_combat(&mut self, combatant: &str) {
        self.combatants.add(combatant);
    }

    pub fn remove_from_combat(&mut self, combatant: &str) {
        self.combatants.remove(combatant);
    }

    pub fn flee_from_combat(&mut self) {
        self.combatants.clear();
    }

    pub fn combatants(&self) -> &Combatants {
        &self.combatants
    }

    // ------------------------------------------------------------------
    // Skills and feats
    // ------------------------------------------------------------------

    pub fn skill(&self, id: SkillId) -> Option<u32> {
        self.skills.get(&id).copied()
    }

    pub fn skills(&self) -> &BTreeMap<SkillId, u32> {
        &self.skills
    }

    pub fn set_skill(&mut self, id: SkillId, level: u32) {
        self.skills.insert(id, level);
    }

    pub fn increment_skill(&mut self, id: SkillId) -> u32 {
        let level = self.skills.entry(id).or_insert(0);
        *level += 1;
        *level
    }

    /// Look up a skill level by the name a command supplied.
    pub fn skill_named(&self, name: &str) -> Result<(SkillId, u32), EntityError> {
        let id: SkillId = name.parse().map_err(|e| {
            warn!("skill not found: {}", Escaped(name));
            e
        })?;
        Ok((id, self.skill(id).unwrap_or(0)))
    }

    pub fn feats(&self) -> &BTreeSet<FeatId> {
        &self.feats
    }

    pub fn has_feat(&self, id: FeatId) -> bool {
        self.feats.contains(&id)
    }

    /// Learn a feat. Passive feats take effect immediately.
    pub fn gain_feat(&mut self, id: FeatId) {
        self.feats.insert(id);
        let def = id.definition();
        if def.kind == FeatKind::Passive {
            self.add_effect(&def.effect_name(), def.effect(), EffectConfig::Null);
        }
    }

    /// Use a learned feat. Returns false when the player lacked the energy.
    pub fn use_feat(&mut self, id: FeatId) -> Result<bool, EntityError> {
        if !self.has_feat(id) {
            warn!("{} does not know feat {}", Escaped(&self.name), id.key());
            return Err(EntityError::UnknownFeat(id.key().to_string()));
        }
        let def = id.definition();
        if def.kind == FeatKind::Active {
            if !self.has_energy(def.cost) {
                self.no_energy();
                return Ok(false);
            }
            self.attributes.adjust(ENERGY, -def.cost);
        }
        self.add_effect(&def.effect_name(), def.effect(), EffectConfig::Null);
        Ok(true)
    }

    pub fn use_feat_named(&mut self, name: &str) -> Result<bool, EntityError> {
        let id: FeatId = name.parse().map_err(|e| {
            warn!("feat not found: {}", Escaped(name));
            e
        })?;
        self.use_feat(id)
    }

    fn initialize_skills(&mut self) {
        for id in SkillId::ALL {
            self.skills.entry(id).or_insert_with(|| {
                debug!("Initializing skill {}", id.key());
                1
            });
        }
    }

    // ------------------------------------------------------------------
    // Training
    // ------------------------------------------------------------------

    pub fn training(&self) -> &TrainingQueue {
        &self.training
    }

    pub fn queue_training(&mut self, session: TrainingSession) {
        self.training.set_session(session);
    }

    pub fn set_training_time(&mut self, time: i64) {
        self.training.set_time(time);
    }

    pub fn begin_training(&mut self) {
        self.begin_training_at(Utc::now());
    }

    pub fn begin_training_at(&mut self, now: DateTime<Utc>) {
        self.training.begin(now);
    }

    pub fn check_training(&mut self) -> Option<TrainingReport> {
        self.check_training_at(Utc::now())
    }

    /// Apply whatever queued sessions the elapsed time pays for.
    pub fn check_training_at(&mut self, now: DateTime<Utc>) -> Option<TrainingReport> {
        let report = self.training.check(now)?;
        info!(
            "training check for {}: {} committed, {} abandoned",
            Escaped(&self.name),
            report.committed.len(),
            usize::from(report.abandoned.is_some())
        );

        self.say("");
        for session in &report.committed {
            self.skills.insert(session.id, session.new_level);
            self.say_bold(session.message.clone());
        }
        if let Some(session) = &report.abandoned {
            self.push(Outbound::Player(Notice::warning(session.shortfall_notice())));
        }
        self.say_bold(CLOSING_NOTICE);
        Some(report)
    }

    /// Abandon the current plan, refunding queued levels into banked time.
    pub fn clear_training(&mut self) -> i64 {
        let refunded = self.training.clear();
        self.say(REGIMEN_CHANGED_NOTICE);
        refunded
    }

    // ------------------------------------------------------------------
    // Experiences
    // ------------------------------------------------------------------

    /// Record a room visit. True if the player had been there before.
    pub fn has_explored(&mut self, vnum: u32) -> bool {
        if self.explored.contains(&vnum) {
            info!("{} moves to room #{}", Escaped(&self.name), vnum);
            return true;
        }
        self.explored.push(vnum);
        info!("{} explored room #{} for the first time.", Escaped(&self.name), vnum);
        false
    }

    pub fn explored(&self) -> &[u32] {
        &self.explored
    }

    /// Record a kill. True if this creature had been slain before.
    pub fn has_killed(&mut self, creature: &str, level: i64) -> bool {
        match self.killed.get_mut(creature) {
            Some(record) => {
                record.amount += 1;
                info!(
                    "{} has slain {} for the #{} time",
                    Escaped(&self.name),
                    Escaped(creature),
                    record.amount
                );
                true
            }
            None => {
                self.killed
                    .insert(creature.to_string(), KillRecord { amount: 1, level });
                info!(
                    "{} has slain {} for the first time.",
                    Escaped(&self.name),
                    Escaped(creature)
                );
                false
            }
        }
    }

    pub fn kills(&self) -> &BTreeMap<String, KillRecord> {
        &self.killed
    }

    /// True if the player already knows `entity` (or it cannot be met at all).
    /// When `introducing`, an unknown entity becomes known.
    pub fn has_met(&mut self, entity: Option<&str>, introducing: bool) -> bool {
        let Some(name) = entity.filter(|n| !n.is_empty()) else {
            if introducing {
                self.say("No response.");
            }
            return true;
        };

        if self.met.contains_key(name) {
            if introducing {
                self.say("You already know them quite well.");
            }
            return true;
        }

        if introducing {
            self.met.insert(name.to_string(), Acquaintance::default());
        }
        false
    }

    /// True if `topic` was already discussed with `entity`. When `discussing`
    /// and the entity is known, the topic is recorded.
    pub fn has_discussed(&mut self, entity: &str, topic: &str, discussing: bool) -> bool {
        let Some(acquaintance) = self.met.get_mut(entity) else {
            return false;
        };
        if acquaintance.topics.contains(topic) {
            return true;
        }
        if discussing {
            acquaintance.topics.insert(topic.to_string());
        }
        false
    }

    pub fn acquaintances(&self) -> &BTreeMap<String, Acquaintance> {
        &self.met
    }

    /// Perception check: cleverness plus a random share of `bonus` against `difficulty`.
    pub fn spot<R: Rng + ?Sized>(&self, difficulty: f64, bonus: f64, rng: &mut R) -> bool {
        let chance = rng.gen::<f64>() * bonus;
        let spotted = self.attributes.get_or_zero(CLEVERNESS) as f64 + chance >= difficulty;
        info!("Spot check success: {}", spotted);
        spotted
    }

    // ------------------------------------------------------------------
    // Outbound text
    // ------------------------------------------------------------------

    pub fn say(&mut self, text: impl Into<String>) {
        self.push(Outbound::Player(Notice::plain(text)));
    }

    pub fn say_bold(&mut self, text: impl Into<String>) {
        self.push(Outbound::Player(Notice::bold(text)));
    }

    pub fn warn(&mut self, text: impl Into<String>) {
        self.push(Outbound::Player(Notice::warning(text)));
    }

    /// Say a translated line in the player's locale.
    pub fn say_l10n(&mut self, l10n: &dyn Localizer, key: &str, args: &[&str]) {
        let text = l10n.translate(self.locale.as_deref(), key, args);
        self.say(text);
    }

    /// Queue a line for everyone else in the room.
    pub fn tell_room(&mut self, text: impl Into<String>) {
        self.push(Outbound::Room(text.into()));
    }

    pub fn take_outbox(&mut self) -> Vec<Outbound> {
        std::mem::take(&mut self.outbox)
    }

    pub fn flush(&mut self, sink: &mut dyn NoticeSink) {
        for out in std::mem::take(&mut self.outbox) {
            match out {
                Outbound::Player(notice) => sink.to_player(notice),
                Outbound::Room(text) => sink.to_room(&self.name, self.location, text),
            }
        }
    }

    fn push(&mut self, out: Outbound) {
        self.outbox.push(out);
    }

    // ------------------------------------------------------------------
    // Persistence
    // ------------------------------------------------------------------

    pub fn to_record(&self) -> PlayerRecord {
        PlayerRecord {
            name: self.name.clone(),
            account_name: self.account_name.clone(),
            description: self.description.clone(),
            location: self.location,
            locale: self.locale.clone(),
            prompt_string: self.prompt.clone(),
            combat_prompt: self.combat_prompt.clone(),
            password: self.password_hash.clone(),
            equipment: self.equipment.as_map().clone(),
            attributes: self.base_attributes(),
            skills: self
                .skills
                .iter()
                .map(|(id, level)| (id.key().to_string(), *level))
                .collect(),
            feats: self.feats.iter().map(|id| id.key().to_string()).collect(),
            gender: self.gender.clone(),
            preferences: self.preferences.clone(),
            explored: self.explored.clone(),
            killed: self.killed.clone(),
            met: self.met.clone(),
            training: self.training.clone(),
            body_parts: self.body_parts.clone(),
            effects: self.effects.snapshot(Instant::now()),
            inventory: self.inventory.to_records(),
            updated_at: None,
            schema_version: PLAYER_SCHEMA_VERSION,
        }
    }

    /// Rebuild an entity from a stored record. Unknown skills and feats are
    /// logged and skipped, missing skills start at level 1, and passive feats
    /// are re-applied.
    pub fn from_record(record: PlayerRecord) -> Self {
        let mut player = Self::blank();
        player.name = record.name;
        player.account_name = record.account_name;
        player.description = record.description;
        player.location = record.location;
        player.locale = record.locale;
        player.prompt = record.prompt_string;
        player.combat_prompt = record.combat_prompt;
        player.password_hash = record.password;
        player.gender = record.gender;
        player.preferences = record.preferences;
        let saved_currents: Vec<(&str, i64)> = PAIRED_ATTRIBUTES
            .iter()
            .filter_map(|(current, _)| record.attributes.get(*current).map(|v| (*current, *v)))
            .collect();
        player.attributes = Attributes::from_map(record.attributes);
        player.inventory = Inventory::from_records(record.inventory);
        player.explored = record.explored;
        player.killed = record.killed;
        player.met = record.met;
        player.training = record.training;
        player.body_parts = record.body_parts;

        for (slot, uuid) in Equipment::from_map(record.equipment).iter() {
            if player.equip(slot, uuid).is_err() {
                warn!("dropping slot {} for missing item {}", slot, uuid);
            }
        }

        for (key, level) in record.skills {
            match key.parse::<SkillId>() {
                Ok(id) => {
                    player.skills.insert(id, level);
                }
                Err(e) => warn!("{} on {}", e, Escaped(&player.name)),
            }
        }
        player.initialize_skills();

        for key in record.feats {
            match key.parse::<FeatId>() {
                Ok(id) => player.gain_feat(id),
                Err(e) => warn!("{} on {}", e, Escaped(&player.name)),
            }
        }
        // Passive feats may have raised a maximum the saved current relies on.
        for (current, value) in saved_currents {
            player.attributes.set(current, value);
        }
        player
    }

    /// JSON export of the persistable state.
    pub fn stringify(&self) -> Result<String, EntityError> {
        serde_json::to_string(&self.to_record()).map_err(|e| {
            error!(
                "SAVE ERROR: {} items in inventory, error is: {}",
                self.inventory.len(),
                e
            );
            EntityError::from(e)
        })
    }

    pub fn from_json(json: &str) -> Result<Self, EntityError> {
        let record: PlayerRecord = serde_json::from_str(json)?;
        Ok(Self::from_record(record))
    }

    /// Persist to `store`. Failures are logged with context and returned so
    /// the caller can retry on a later cycle.
    pub fn save(&self, store: &PlayerStore) -> Result<(), EntityError> {
        store.put_player(self.to_record()).map_err(|e| {
            error!(
                "SAVE ERROR for {}: {} ({} items carried)",
                Escaped(&self.name),
                e,
                self.inventory.len()
            );
            e
        })
    }

    pub fn load(store: &PlayerStore, name: &str) -> Result<Self, EntityError> {
        Ok(Self::from_record(store.get_player(name)?))
    }

    /// Attributes with every active effect's contribution backed out, so
    /// saved values do not double-count modifiers re-applied on load.
    /// Current health, sanity and energy are kept as they are; backing out a
    /// raised maximum must not lower them.
    fn base_attributes(&self) -> BTreeMap<String, i64> {
        let mut base = self.attributes.clone();
        let mut scratch = EffectRegistry::new();
        for (name, active) in self.effects.iter() {
            scratch.add(
                name,
                active.effect.clone(),
                active.config.clone(),
                &mut Attributes::empty(),
                Instant::now(),
            );
            if let Err(e) = scratch.remove(name, &mut base) {
                debug!("could not back out effect {} before save: {}", name, e);
            }
        }
        let mut values = base.as_map().clone();
        for (current, _) in PAIRED_ATTRIBUTES {
            if let Some(value) = self.attributes.get(current) {
                values.insert(current.to_string(), value);
            }
        }
        values
    }
}
