//! # kitguard-pos: Cart and Payment Workflow
//!
//! Puts the kit gates from `kitguard-core` in front of a register's cart.
//!
//! ## Session Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  ValidatorConfig::load_or_default()     (defaults ─► TOML ─► env)       │
//! │            │                                                            │
//! │            ▼                                                            │
//! │  PosSession::open(config, &db)  ── or ──  PosSession::new(config, src)  │
//! │            │                                                            │
//! │            ▼                                                            │
//! │  preload()  ──►  add_to_cart / update_quantity  (line gate)             │
//! │                          │                                              │
//! │                          ▼                                              │
//! │                  begin_payment()  (order gate)                          │
//! │                          │                                              │
//! │                          ▼                                              │
//! │                  complete_payment(clearance)  (consume components)      │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`session`] - The register session and its gates
//! - [`cart`] - Lock-guarded current order
//! - [`config`] - Validator configuration
//! - [`remote`] - HTTP client for remote validation mode
//! - [`error`] - Serializable session errors

pub mod cart;
pub mod config;
pub mod error;
pub mod remote;
pub mod session;

pub use cart::{CartState, PaymentInProgress, PaymentLock};
pub use config::ValidatorConfig;
pub use error::{ConfigError, ErrorCode, PosError, PosResult};
pub use remote::HttpStockValidator;
pub use session::{PaymentClearance, PosSession, SessionSources};
