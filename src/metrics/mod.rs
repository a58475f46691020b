//! Training metrics and logging backends.

pub mod logger;
