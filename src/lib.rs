//! Orbit gallery library
//!
//! A ring of cubes orbiting a black hole under a live star field.  Cubes come
//! from a particle feed; some open content when clicked or shot, the rest are
//! decoys that shake apart when held.  A draggable turret fires projectiles
//! that curve toward the black hole.

pub mod backdrop;
pub mod collision;
pub mod config;
pub mod constants;
pub mod content;
pub mod error;
pub mod explosion;
pub mod gallery;
pub mod hud;
pub mod orbit;
pub mod particle_source;
pub mod pointer;
pub mod prefs;
pub mod projectile;
pub mod starfield;
pub mod turret;
