//! Salvage: a 2D space-salvage game core.
//!
//! A single rocket flies through a field of drifting asteroids, burning fuel
//! for thrust and collecting loot crystals.  Rapier does the rigid-body work;
//! this crate owns outlines, placement, thruster and fuel rules, impact damage,
//! pickup, exhaust particles and the level lifecycle.

pub mod asteroid;
pub mod collision;
pub mod config;
pub mod constants;
pub mod error;
pub mod gameplay;
pub mod geometry;
pub mod input;
pub mod loot;
pub mod outline;
pub mod particles;
pub mod placement;
pub mod rendering;
pub mod rocket;
