//! Active status effects and their expiry triggers.
//!
//! An effect expires in one of three ways: a timer armed for its duration,
//! the next emission of the lifecycle event it is bound to, or an explicit
//! [`EffectRegistry::remove`]. Each armed trigger is a [`TriggerHandle`] the
//! registry owns; removing an effect cancels every handle bound to its name
//! so a late timer or event cannot deactivate it a second time, or reach a
//! later effect added under the same name.
//!
//! Re-adding an effect under an existing name replaces the stored effect but
//! leaves the previous trigger armed. When that orphaned trigger fires it
//! expires whatever effect holds the name at that moment.

use log::{debug, error};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

use super::attributes::Attributes;
use super::errors::EntityError;

/// Free-form configuration handed to activation and deactivation hooks.
pub type EffectConfig = serde_json::Value;

/// Side effect run against the owning entity's attributes.
pub type EffectHook = Arc<dyn Fn(&mut Attributes, &EffectConfig) + Send + Sync>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expiry {
    /// Stays until removed.
    Permanent,
    /// Expires once the duration has elapsed.
    After(Duration),
    /// Expires on the next emission of the named lifecycle event.
    OnEvent(String),
}

#[derive(Clone)]
pub struct Effect {
    pub expiry: Expiry,
    activate: Option<EffectHook>,
    deactivate: Option<EffectHook>,
}

impl fmt::Debug for Effect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Effect")
            .field("expiry", &self.expiry)
            .field("activate", &self.activate.is_some())
            .field("deactivate", &self.deactivate.is_some())
            .finish()
    }
}

impl Default for Effect {
    fn default() -> Self {
        Self::permanent()
    }
}

impl Effect {
    pub fn permanent() -> Self {
        Self {
            expiry: Expiry::Permanent,
            activate: None,
            deactivate: None,
        }
    }

    pub fn lasting(duration: Duration) -> Self {
        Self {
            expiry: Expiry::After(duration),
            ..Self::permanent()
        }
    }

    pub fn until_event(event: &str) -> Self {
        Self {
            expiry: Expiry::OnEvent(event.to_string()),
            ..Self::permanent()
        }
    }

    pub fn on_activate(
        mut self,
        hook: impl Fn(&mut Attributes, &EffectConfig) + Send + Sync + 'static,
    ) -> Self {
        self.activate = Some(Arc::new(hook));
        self
    }

    pub fn on_deactivate(
        mut self,
        hook: impl Fn(&mut Attributes, &EffectConfig) + Send + Sync + 'static,
    ) -> Self {
        self.deactivate = Some(Arc::new(hook));
        self
    }

    pub fn duration(&self) -> Option<Duration> {
        match self.expiry {
            Expiry::After(d) => Some(d),
            _ => None,
        }
    }

    pub fn event(&self) -> Option<&str> {
        match &self.expiry {
            Expiry::OnEvent(e) => Some(e),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TriggerHandle(u64);

#[derive(Debug, Clone)]
enum TriggerKind {
    Timer { deadline: Instant },
    Event { name: String },
}

#[derive(Debug, Clone)]
struct Trigger {
    effect: String,
    kind: TriggerKind,
}

/// An effect applied to an entity together with its armed trigger.
#[derive(Debug, Clone)]
pub struct ActiveEffect {
    pub effect: Effect,
    pub config: EffectConfig,
    pub applied_at: Instant,
    trigger: Option<TriggerHandle>,
}

impl ActiveEffect {
    pub fn trigger(&self) -> Option<TriggerHandle> {
        self.trigger
    }

    /// Time left before the timer fires, for duration effects.
    pub fn remaining(&self, now: Instant) -> Option<Duration> {
        self.effect
            .duration()
            .map(|d| (self.applied_at + d).saturating_duration_since(now))
    }
}

/// Persistable view of an active effect. Hooks are code, so only the
/// expiry bookkeeping survives a save.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EffectSnapshot {
    pub name: String,
    #[serde(default)]
    pub remaining_ms: Option<u64>,
    #[serde(default)]
    pub event: Option<String>,
}

#[derive(Debug, Default)]
pub struct EffectRegistry {
    next_trigger: u64,
    effects: BTreeMap<String, ActiveEffect>,
    triggers: BTreeMap<TriggerHandle, Trigger>,
}

impl EffectRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Activate `effect`, arm its expiry trigger and store it under `name`.
    pub fn add(
        &mut self,
        name: &str,
        effect: Effect,
        config: EffectConfig,
        target: &mut Attributes,
        now: Instant,
    ) {
        if let Some(activate) = &effect.activate {
            activate(target, &config);
        }

        let kind = match &effect.expiry {
            Expiry::Permanent => None,
            Expiry::After(duration) => Some(TriggerKind::Timer {
                deadline: now + *duration,
            }),
            Expiry::OnEvent(event) => Some(TriggerKind::Event {
                name: event.clone(),
            }),
        };
        let trigger = kind.map(|kind| self.arm(name, kind));

        if self.effects.contains_key(name) {
            debug!("effect {} replaced; previous trigger left armed", name);
        }
        self.effects.insert(
            name.to_string(),
            ActiveEffect {
                effect,
                config,
                applied_at: now,
                trigger,
            },
        );
    }

    /// Deactivate and drop the effect stored under `name`, cancelling every
    /// trigger bound to that name.
    pub fn remove(&mut self, name: &str, target: &mut Attributes) -> Result<(), EntityError> {
        let Some(active) = self.effects.remove(name) else {
            error!("effect {} not found", name);
            return Err(EntityError::UnknownEffect(name.to_string()));
        };

        if let Some(deactivate) = &active.effect.deactivate {
            deactivate(target, &active.config);
        }
        // Triggers left armed by an overwrite die with the name.
        self.triggers.retain(|_, t| t.effect != name);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&ActiveEffect> {
        self.effects.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.effects.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ActiveEffect)> {
        self.effects.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.effects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.effects.is_empty()
    }

    /// Earliest pending timer deadline, if any timer is armed.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.triggers
            .values()
            .filter_map(|t| match t.kind {
                TriggerKind::Timer { deadline } => Some(deadline),
                TriggerKind::Event { .. } => None,
            })
            .min()
    }

    /// Fire every timer whose deadline is at or before `now`, earliest first.
    /// Returns the names of the effects that expired.
    pub fn expire_due(&mut self, now: Instant, target: &mut Attributes) -> Vec<String> {
        let mut due: Vec<(Instant, TriggerHandle)> = self
            .triggers
            .iter()
            .filter_map(|(h, t)| match t.kind {
                TriggerKind::Timer { deadline } if deadline <= now => Some((deadline, *h)),
                _ => None,
            })
            .collect();
        due.sort();

        due.into_iter()
            .filter_map(|(_, handle)| self.fire(handle, target))
            .collect()
    }

    /// Fire every trigger bound to `event`. Returns the names of the effects that expired.
    pub fn fire_event(&mut self, event: &str, target: &mut Attributes) -> Vec<String> {
        let bound: Vec<TriggerHandle> = self
            .triggers
            .iter()
            .filter(|(_, t)| matches!(&t.kind, TriggerKind::Event { name } if name == event))
            .map(|(h, _)| *h)
            .collect();

        bound
            .into_iter()
            .filter_map(|handle| self.fire(handle, target))
            .collect()
    }

    pub fn snapshot(&self, now: Instant) -> Vec<EffectSnapshot> {
        self.effects
            .iter()
            .map(|(name, active)| EffectSnapshot {
                name: name.clone(),
                remaining_ms: active
                    .remaining(now)
                    .map(|d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX)),
                event: active.effect.event().map(str::to_string),
            })
            .collect()
    }

    fn arm(&mut self, name: &str, kind: TriggerKind) -> TriggerHandle {
        self.next_trigger += 1;
        let handle = TriggerHandle(self.next_trigger);
        self.triggers.insert(
            handle,
            Trigger {
                effect: name.to_string(),
                kind,
            },
        );
        handle
    }

    fn fire(&mut self, handle: TriggerHandle, target: &mut Attributes) -> Option<String> {
        let trigger = self.triggers.remove(&handle)?;
        match self.remove(&trigger.effect, target) {
            Ok(()) => Some(trigger.effect),
            Err(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::attributes::{HEALTH, QUICKNESS};
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counting_effect(effect: Effect, counter: Arc<AtomicUsize>) -> Effect {
        effect.on_deactivate(move |_, _| {
            counter.fetch_add(1, Ordering::SeqCst);
        })
    }

    #[test]
    fn activate_runs_with_config() {
        let mut reg = EffectRegistry::new();
        let mut attrs = Attributes::default();
        let haste = Effect::permanent()
            .on_activate(|a, cfg| {
                let bonus = cfg["bonus"].as_i64().unwrap_or(0);
                a.adjust(QUICKNESS, bonus);
            })
            .on_deactivate(|a, cfg| {
                let bonus = cfg["bonus"].as_i64().unwrap_or(0);
                a.adjust(QUICKNESS, -bonus);
            });

        reg.add("haste", haste, json!({"bonus": 2}), &mut attrs, Instant::now());
        assert_eq!(attrs.get(QUICKNESS), Some(3));

        reg.remove("haste", &mut attrs).expect("remove");
        assert_eq!(attrs.get(QUICKNESS), Some(1));
        assert!(reg.get("haste").is_none());
    }

    #[test]
    fn duration_effect_expires_once() {
        let mut reg = EffectRegistry::new();
        let mut attrs = Attributes::default();
        let hits = Arc::new(AtomicUsize::new(0));
        let start = Instant::now();
        reg.add(
            "stun",
            counting_effect(Effect::lasting(Duration::from_millis(100)), hits.clone()),
            EffectConfig::Null,
            &mut attrs,
            start,
        );

        assert!(reg.expire_due(start + Duration::from_millis(99), &mut attrs).is_empty());
        assert_eq!(
            reg.expire_due(start + Duration::from_millis(100), &mut attrs),
            vec!["stun".to_string()]
        );
        assert!(reg.expire_due(start + Duration::from_secs(5), &mut attrs).is_empty());
        assert!(!reg.contains("stun"));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn removal_cancels_pending_timer() {
        let mut reg = EffectRegistry::new();
        let mut attrs = Attributes::default();
        let hits = Arc::new(AtomicUsize::new(0));
        let start = Instant::now();
        reg.add(
            "bleed",
            counting_effect(Effect::lasting(Duration::from_millis(50)), hits.clone()),
            EffectConfig::Null,
            &mut attrs,
            start,
        );
        reg.remove("bleed", &mut attrs).expect("remove");

        assert_eq!(reg.next_deadline(), None);
        assert!(reg.expire_due(start + Duration::from_secs(1), &mut attrs).is_empty());
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn event_bound_effect_expires_on_event() {
        let mut reg = EffectRegistry::new();
        let mut attrs = Attributes::default();
        let hits = Arc::new(AtomicUsize::new(0));
        reg.add(
            "focus",
            counting_effect(Effect::until_event("action"), hits.clone()),
            EffectConfig::Null,
            &mut attrs,
            Instant::now(),
        );

        assert!(reg.fire_event("death", &mut attrs).is_empty());
        assert_eq!(reg.fire_event("action", &mut attrs), vec!["focus".to_string()]);
        assert!(reg.fire_event("action", &mut attrs).is_empty());
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn unknown_removal_changes_nothing() {
        let mut reg = EffectRegistry::new();
        let mut attrs = Attributes::default();
        reg.add("aura", Effect::permanent(), EffectConfig::Null, &mut attrs, Instant::now());

        let err = reg.remove("ghost", &mut attrs).unwrap_err();
        assert!(matches!(err, EntityError::UnknownEffect(name) if name == "ghost"));
        assert_eq!(reg.len(), 1);
        assert_eq!(attrs, Attributes::default());
    }

    #[test]
    fn overwrite_leaves_previous_trigger_armed() {
        let mut reg = EffectRegistry::new();
        let mut attrs = Attributes::default();
        let first = Arc::new(AtomicUsize::new(0));
        let second = Arc::new(AtomicUsize::new(0));
        let start = Instant::now();

        reg.add(
            "poison",
            counting_effect(Effect::lasting(Duration::from_millis(100)), first.clone()),
            EffectConfig::Null,
            &mut attrs,
            start,
        );
        reg.add(
            "poison",
            counting_effect(Effect::lasting(Duration::from_millis(500)), second.clone()),
            EffectConfig::Null,
            &mut attrs,
            start,
        );

        // The first timer still fires and expires the replacement.
        let expired = reg.expire_due(start + Duration::from_millis(100), &mut attrs);
        assert_eq!(expired, vec!["poison".to_string()]);
        assert_eq!(first.load(Ordering::SeqCst), 0);
        assert_eq!(second.load(Ordering::SeqCst), 1);

        // The replacement's own timer was cancelled with it.
        assert!(reg.expire_due(start + Duration::from_secs(1), &mut attrs).is_empty());
        assert_eq!(second.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn readding_after_removal_is_a_fresh_lifecycle() {
        let mut reg = EffectRegistry::new();
        let mut attrs = Attributes::default();
        let hits = Arc::new(AtomicUsize::new(0));
        let start = Instant::now();

        for _ in 0..2 {
            reg.add(
                "ward",
                counting_effect(Effect::lasting(Duration::from_millis(10)), hits.clone())
                    .on_activate(|a, _| {
                        a.adjust(HEALTH, -1);
                    }),
                EffectConfig::Null,
                &mut attrs,
                start,
            );
            reg.expire_due(start + Duration::from_millis(10), &mut attrs);
        }
        assert_eq!(hits.load(Ordering::SeqCst), 2);
        assert_eq!(attrs.get(HEALTH), Some(88));
    }

    #[test]
    fn removal_after_overwrite_disarms_orphaned_timer() {
        let mut reg = EffectRegistry::new();
        let mut attrs = Attributes::default();
        let hits = Arc::new(AtomicUsize::new(0));
        let start = Instant::now();

        for ms in [100u64, 500] {
            reg.add(
                "poison",
                Effect::lasting(Duration::from_millis(ms)),
                EffectConfig::Null,
                &mut attrs,
                start,
            );
        }
        reg.remove("poison", &mut attrs).expect("remove");
        assert_eq!(reg.next_deadline(), None);

        reg.add(
            "poison",
            counting_effect(Effect::lasting(Duration::from_secs(10)), hits.clone()),
            EffectConfig::Null,
            &mut attrs,
            start,
        );
        assert!(reg
            .expire_due(start + Duration::from_millis(500), &mut attrs)
            .is_empty());
        assert!(reg.contains("poison"));
        assert_eq!(hits.load(Ordering::SeqCst), 0);

        assert_eq!(
            reg.expire_due(start + Duration::from_secs(10), &mut attrs),
            vec!["poison".to_string()]
        );
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn snapshot_reports_remaining_time_and_event() {
        let mut reg = EffectRegistry::new();
        let mut attrs = Attributes::default();
        let start = Instant::now();
        reg.add(
            "slow",
            Effect::lasting(Duration::from_millis(300)),
            EffectConfig::Null,
            &mut attrs,
            start,
        );
        reg.add("mark", Effect::until_event("death"), EffectConfig::Null, &mut attrs, start);

        let snap = reg.snapshot(start + Duration::from_millis(100));
        assert_eq!(snap.len(), 2);
        assert_eq!(snap[0].name, "mark");
        assert_eq!(snap[0].event.as_deref(), Some("death"));
        assert_eq!(snap[1].remaining_ms, Some(200));
    }
}
