//! Domain model for the assessment taxonomy and its output document.
//!
//! # Responsibility
//! - Define taxonomy coordinates, raw table rows, canonical facts and the
//!   nested output document.
//!
//! # Invariants
//! - Every type here is immutable data; transformations live in `transform`.

pub mod coordinate;
pub mod document;
pub mod fact;
pub mod table;
