//! Request routing boundary.
//!
//! # Responsibility
//! - Map request paths onto lookup calls and lookup outcomes onto status codes
//!   and JSON bodies.
//!
//! # Invariants
//! - Routing is pure and synchronous; transport concerns live in the caller.

pub mod router;
