//! # Repository Module
//!
//! Database repository implementations for Kitguard.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Layout                                    │
//! │                                                                         │
//! │  SqliteSources (port adapter)                                           │
//! │       │                                                                 │
//! │       │  db.boms().get_components("GIFT-BOX")                           │
//! │       ▼                                                                 │
//! │  ProductRepository                                                      │
//! │  ├── get_meta(&self, id)            kit_enabled + derived has_bom       │
//! │  ├── list_catalog(&self)                                                │
//! │  └── insert / set_kit_enabled / deactivate                              │
//! │  BomRepository                                                          │
//! │  ├── get_components(&self, kit_id)  BOM order                           │
//! │  └── replace_components(&self, kit_id, components)                      │
//! │  StockRepository                                                        │
//! │  ├── get_available(&self, id)       missing row = 0                     │
//! │  ├── set_available / adjust                                             │
//! │  └── consume_kits(&self, lines)     one transaction                     │
//! │       │                                                                 │
//! │       │  SQL Query                                                      │
//! │       ▼                                                                 │
//! │  SQLite Database                                                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`ProductRepository`](product::ProductRepository) - Products and kit flags
//! - [`BomRepository`](bom::BomRepository) - Bills of materials
//! - [`StockRepository`](stock::StockRepository) - Stock levels and consumption

pub mod bom;
pub mod product;
pub mod stock;
