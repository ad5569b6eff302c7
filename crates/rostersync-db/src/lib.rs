//! rostersync Database Layer
//!
//! PostgreSQL persistence for rostersync using `SQLx`.
//!
//! # Modules
//!
//! - [`pool`] - Connection pool ([`DbPool`])
//! - [`migrations`] - Embedded schema migrations
//! - [`models`] - Table models and their queries
//! - [`backend`] - [`PgBackend`], implementing every store trait
//! - [`error`] - Error type ([`DbError`])
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use rostersync_core::{ReconciliationEngine, Stores, TemplateCatalog};
//! use rostersync_db::{run_migrations, DbPool, PgBackend};
//!
//! let pool = DbPool::connect("postgres://localhost/rostersync").await?;
//! run_migrations(&pool).await?;
//! let backend = Arc::new(PgBackend::new(pool));
//! let engine = ReconciliationEngine::new(
//!     Stores::from_backend(backend),
//!     Arc::new(TemplateCatalog::english()),
//! );
//! ```

pub mod backend;
pub mod error;
pub mod migrations;
pub mod models;
pub mod pool;

pub use backend::PgBackend;
pub use error::DbError;
pub use migrations::run_migrations;
pub use pool::{DbPool, DEFAULT_MAX_CONNECTIONS};
