//! # inventa-db: Database Layer for Inventa
//!
//! SQLite persistence for the inventory console, built on sqlx.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Inventa Data Flow                               │
//! │                                                                         │
//! │  Menu action (register sale)                                           │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    inventa-db (THIS CRATE)                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌────────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories  │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │                │    │  (embedded)  │  │   │
//! │  │   │               │    │ TableRepository│    │              │  │   │
//! │  │   │ SqlitePool    │◄───│ SaleRepository │    │ 001_schema   │  │   │
//! │  │   │ handle        │    │ PlanRepository │    │ 002_refdata  │  │   │
//! │  │   └───────────────┘    └────────────────┘    └──────────────┘  │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │   SQLite file (path from the [database] config section)        │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - The repository contract and its implementations
//!
//! ## Usage
//!
//! ```rust,ignore
//! use inventa_db::{Database, DbConfig, Repository};
//!
//! let db = Database::new(DbConfig::new("inventa.db")).await?;
//!
//! let product = db.products().get_by_id(&"P1".to_string()).await?;
//! let low = db.products().low_stock().await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};
pub use repository::{Repository, TableMapping, TableRepository};

// Repository re-exports for convenience
pub use repository::cash_flow::CashFlowRepository;
pub use repository::people::{
    CustomerRepository, EmployeeRepository, PersonRepository, PhoneRepository,
    SupplierRepository, UserRepository,
};
pub use repository::plan::PlanRepository;
pub use repository::product::ProductRepository;
pub use repository::purchase::PurchaseRepository;
pub use repository::reference::{
    ArlRepository, CityRepository, CountryRepository, DocumentTypeRepository, EpsRepository,
    MovementTypeRepository, PersonTypeRepository, RegionRepository,
};
pub use repository::sale::SaleRepository;
