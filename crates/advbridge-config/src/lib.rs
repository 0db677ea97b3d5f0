//! Process-wide observability setup shared by the advbridge crates.

pub mod tracing;
