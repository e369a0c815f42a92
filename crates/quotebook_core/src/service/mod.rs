//! Catalog use-case services.
//!
//! # Responsibility
//! - Orchestrate validation and storage calls into caller-facing operations.
//! - Keep outer layers decoupled from storage and validation details.

pub mod catalog_service;
