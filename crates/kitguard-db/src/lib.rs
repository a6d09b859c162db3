//! # kitguard-db: Database Layer for Kitguard
//!
//! This crate provides the catalog, BOM and stock storage that kit
//! validation reads from. It uses SQLite with sqlx for async operations.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Kitguard Data Flow                               │
//! │                                                                         │
//! │  LineValidator / OrderValidator (kitguard-core)                         │
//! │       │  CatalogSource, StockSource, InventoryLedger                    │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐    │
//! │  │                   kitguard-db (THIS CRATE)                      │    │
//! │  │                                                                 │    │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐    │    │
//! │  │   │   Database    │    │  Repositories │    │  Migrations  │    │    │
//! │  │   │   (pool.rs)   │    │               │    │  (embedded)  │    │    │
//! │  │   │               │    │ ProductRepo   │    │ 001_kit_     │    │    │
//! │  │   │ SqlitePool    │◄───│ BomRepo       │    │  catalog.sql │    │    │
//! │  │   │               │    │ StockRepo     │    │              │    │    │
//! │  │   └───────────────┘    └───────▲───────┘    └──────────────┘    │    │
//! │  │                                │                                │    │
//! │  │                     SqliteSources (source.rs)                   │    │
//! │  └─────────────────────────────────────────────────────────────────┘    │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite Database (kitguard.db)                                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Product, BOM and stock repositories
//! - [`source`] - Port trait implementations for kitguard-core
//!
//! ## Usage
//!
//! ```rust,ignore
//! use kitguard_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("kitguard.db")).await?;
//!
//! db.products().insert("GIFT-BOX", "Gift Box", true).await?;
//! let sources = Arc::new(db.sources());
//! let validator = LineValidator::new(cache, sources.clone(), sources, policy);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;
pub mod source;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use migrations::MigrationStatus;
pub use pool::{Database, DbConfig};
pub use source::SqliteSources;

// Repository re-exports for convenience
pub use repository::bom::BomRepository;
pub use repository::product::{ProductRepository, ProductRow};
pub use repository::stock::{ConsumeOutcome, StockRepository};
