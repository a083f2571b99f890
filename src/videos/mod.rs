//! Video records. Declared for the data model; no route exposes them yet.

pub mod model;
pub mod repo;
