//! Infrastructure Database Layer
//!
//! This crate provides the storage adapters behind the billing store port:
//!
//! - [`PgStore`]: the production PostgreSQL implementation on SQLx, where
//!   each transaction scope is a real database transaction;
//! - [`MemoryStore`]: an in-process implementation with the same
//!   transactional semantics, used by tests and local development.
//!
//! # Example
//!
//! ```rust,ignore
//! use infra_db::{DatabaseConfig, PgStore, create_pool};
//!
//! let pool = create_pool(DatabaseConfig::new("postgres://localhost/hospital")).await?;
//! let store = PgStore::new(pool);
//! ```

pub mod error;
pub mod memory;
pub mod pool;
pub mod postgres;

pub use error::DatabaseError;
pub use memory::MemoryStore;
pub use pool::{create_pool, create_pool_from_url, DatabaseConfig, DatabasePool};
pub use postgres::PgStore;
