//! Core use-case services.
//!
//! # Responsibility
//! - Drive normalization and assembly over the loaded table.
//! - Keep routing and CLI layers decoupled from table sources.

pub mod lookup_service;
pub mod startup;
