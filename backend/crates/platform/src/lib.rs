//! Platform Crate - Technical Infrastructure
//!
//! This crate provides the primitive services the domain treats as black boxes:
//! - Cryptographic utilities and the client-secret cipher (AES-256-GCM)
//! - Password hashing (Argon2id) and the login password policy
//! - Bearer token signing (HS512 JWT)
//! - The cache adapter (Redis, plus an in-process implementation)

pub mod cache;
pub mod crypto;
pub mod password;
pub mod token;
