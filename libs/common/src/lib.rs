//! Common library for the CampusHub platform
//!
//! This crate provides shared functionality used across the CampusHub
//! services: database connectivity, the Redis cache, error types, and the
//! single authentication/authorization interface consumed by every service.

pub mod auth;
pub mod cache;
pub mod database;
pub mod error;
