//! Core data types: transitions and trajectory storage.

pub mod rollout;
pub mod transition;
