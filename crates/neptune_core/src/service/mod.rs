//! Use-case services.
//!
//! # Responsibility
//! - Orchestrate readers, lookup and persistence into import/export runs.
//! - Keep the CLI decoupled from storage and provider details.

pub mod export_service;
pub mod import_service;
pub mod reconcile;
