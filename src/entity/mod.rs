//! Player entity state engine.
//!
//! A [`PlayerEntity`] owns a character's attributes, timed and event-bound
//! effects, equipment slots, nested inventory, training queue and combat
//! membership. Records persist through [`PlayerStore`] (sled + bincode) or
//! plain JSON via [`PlayerEntity::stringify`].
//!
//! Layout mirrors the data:
//! - [`attributes`]: bounded current/max pairs and open-ended stats
//! - [`effects`] and [`events`]: effect registry, triggers, lifecycle bus
//! - [`item`], [`inventory`], [`equipment`]: carried goods and slots
//! - [`catalog`], [`training`]: skill/feat definitions and time-based training
//! - [`combat`]: damage resolution and opponent tracking
//! - [`record`], [`storage`]: persistence
//! - [`driver`]: tokio task firing effect timers

pub mod attributes;
pub mod catalog;
pub mod combat;
pub mod driver;
pub mod effects;
pub mod equipment;
pub mod errors;
pub mod events;
pub mod inventory;
pub mod item;
pub mod notice;
pub mod player;
pub mod record;
pub mod storage;
pub mod training;

pub use attributes::Attributes;
pub use catalog::{FeatId, FeatKind, SkillId};
pub use driver::{EffectDriver, SharedPlayer};
pub use effects::{Effect, EffectConfig, EffectRegistry, Expiry};
pub use equipment::Equipment;
pub use errors::EntityError;
pub use events::{EntityEvent, LifecycleBus};
pub use inventory::Inventory;
pub use item::Item;
pub use notice::{Notice, NoticeSink, Outbound};
pub use player::{PlayerEntity, UnequipOutcome};
pub use record::PlayerRecord;
pub use storage::{PlayerStore, PlayerStoreBuilder};
pub use training::{TrainingQueue, TrainingReport, TrainingSession};
