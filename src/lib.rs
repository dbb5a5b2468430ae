//! Business-Data Marketplace API Library
//!
//! This library provides the core functionality for the business-data
//! marketplace API: admins upload organization records, users filter and
//! preview a blurred subset, then pay per record to unlock a permanent
//! snapshot of the matching records.
//!
//! # Modules
//!
//! - `auth`: Authenticated principal extraction and role/ownership guards.
//! - `circuit_breaker`: Circuit breaker for payment provider calls.
//! - `config`: Configuration management.
//! - `db`: Database connection and pool management.
//! - `errors`: Error handling types.
//! - `filters`: Filter evaluator (predicates, preview, distinct values).
//! - `handlers`: HTTP request handlers.
//! - `models`: Core data models.
//! - `payment_gateway`: Payment provider client and signature verification.
//! - `purchases`: Purchase ledger and completion workflow.
//! - `record_store`: Admin record persistence and validation.

pub mod auth;
pub mod circuit_breaker;
pub mod config;
pub mod db;
pub mod errors;
pub mod filters;
pub mod handlers;
pub mod models;
pub mod payment_gateway;
pub mod purchases;
pub mod record_store;
