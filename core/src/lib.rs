//! Core library for the juicy juice planner: data models, the persisted
//! state store, and the derivation engines (shopping aggregation, pantry
//! matching, completion journal, exports). No I/O beyond local storage.

pub mod aggregate;
pub mod export;
pub mod journal;
pub mod models;
pub mod pantry;
pub mod service;
pub mod store;
