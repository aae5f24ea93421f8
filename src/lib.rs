//! # Ranvale - player state engine for a text-based multiplayer world
//!
//! The [`entity`] module holds everything a connected character is made of:
//! bounded attributes, status effects with timed or event-bound expiry,
//! equipment slots, nested container inventory, skill training and combat
//! bookkeeping. Command handlers mutate a [`entity::PlayerEntity`] through
//! its methods and drain the notices it queues; persistence goes through
//! [`entity::PlayerStore`].
//!
//! ```rust,no_run
//! use ranvale::config::Config;
//! use ranvale::entity::{PlayerEntity, PlayerStore};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load("config.toml").await?;
//!     let store = PlayerStore::open(config.storage.players_path())?;
//!
//!     let mut player = PlayerEntity::new("Ash", "ash");
//!     player.damage(12, Some("head"));
//!     player.save(&store)?;
//!     Ok(())
//! }
//! ```
//!
//! ## Module Organization
//!
//! - [`entity`] - player entity, its components and persistence
//! - [`config`] - TOML configuration
//! - [`logutil`] - log-safe rendering of player text

pub mod config;
pub mod entity;
pub mod logutil;
