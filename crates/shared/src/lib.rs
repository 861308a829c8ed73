//! Shared utilities and common types for the Community Hub backend.
//!
//! This crate provides common functionality used across all other crates:
//! - Cryptographic utilities (hashing, HMAC signatures, constant-time compare)
//! - Common validation logic (email addresses, slugs, money amounts)

pub mod crypto;
pub mod validation;
