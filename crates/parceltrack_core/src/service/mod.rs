//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into use-case level APIs.
//! - Keep outer layers (CLI, HTTP, notifications) decoupled from storage
//!   details.

pub mod parcel_service;
