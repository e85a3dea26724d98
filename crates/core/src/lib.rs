//! Functional core of playerbound: the entity model, composite keys, store
//! and cache collaborator traits, and the player records.
//!
//! Nothing here performs I/O; backends live in the `playerbound` crate.

pub mod cache;
pub mod entity;
pub mod player;
pub mod storage;
