//! Wide row to document transformation engine.
//!
//! # Responsibility
//! - `label`: decode column labels into taxonomy coordinates.
//! - `normalize`: melt one wide row into canonical facts.
//! - `assemble`: group canonical facts into the nested document.
//!
//! # Invariants
//! - Every function here is pure; nothing touches I/O or shared state.

pub mod assemble;
pub mod label;
pub mod normalize;
