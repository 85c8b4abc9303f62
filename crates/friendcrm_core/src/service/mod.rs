//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate storage calls and derived reports into use-case APIs.
//! - Keep request handlers and the CLI decoupled from backend details.

pub mod friend_service;
