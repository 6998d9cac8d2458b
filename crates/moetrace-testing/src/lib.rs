//! Shared fixtures and helpers for moetrace tests.

pub mod fixtures;
pub mod world;

pub use world::TestWorld;
