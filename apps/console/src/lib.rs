//! # Inventa Console Library
//!
//! Interactive inventory console: products, sales, purchases, cash flow,
//! promotional plans and the people/setup catalogs behind them.
//!
//! ## Module Organization
//! ```text
//! inventa_console/
//! ├── lib.rs          ◄─── You are here (startup & run)
//! ├── config.rs       ◄─── config.toml + INVENTA_* overrides
//! ├── console.rs      ◄─── Prompts, typed reads, message lines
//! ├── table.rs        ◄─── Fixed-width listings, pagination
//! ├── error.rs        ◄─── AppError printed by the menus
//! └── menu/
//!     ├── mod.rs      ◄─── Main menu, shared helpers, CrudScreen
//!     ├── products.rs
//!     ├── sales.rs
//!     ├── purchases.rs
//!     ├── cash_flow.rs
//!     ├── plans.rs
//!     ├── people.rs   ◄─── Persons, customers, employees, suppliers
//!     ├── contacts.rs ◄─── Phones, users
//!     └── setup.rs    ◄─── Locations, EPS, ARL
//! ```

pub mod config;
pub mod console;
pub mod error;
pub mod menu;
pub mod table;

use std::io;

use tracing::info;
use tracing_subscriber::EnvFilter;

use config::AppConfig;
use console::Console;
use error::AppResult;
use inventa_db::{Database, DbConfig};

/// Runs the console application.
///
/// ## Startup Sequence
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │                       Application Startup                               │
/// │                                                                         │
/// │  1. Load Configuration ───────────────────────────────────────────────► │
/// │     • INVENTA_CONFIG or <config dir>/config.toml (optional)             │
/// │     • INVENTA_* environment overrides                                   │
/// │                                                                         │
/// │  2. Initialize Logging ───────────────────────────────────────────────► │
/// │     • RUST_LOG, else [logging] filter, else warn,inventa=info           │
/// │     • Written to stderr so menus stay readable                          │
/// │                                                                         │
/// │  3. Connect to Database ──────────────────────────────────────────────► │
/// │     • Create the data directory                                         │
/// │     • SQLite with WAL mode, run pending migrations                      │
/// │                                                                         │
/// │  4. Low-stock alert ──────────────────────────────────────────────────► │
/// │                                                                         │
/// │  5. Main menu until Exit or end of input                                │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
pub async fn run() -> AppResult<()> {
    let config = AppConfig::load()?;
    init_tracing(&config);

    info!("Starting Inventa console");

    let db_path = &config.database.path;
    if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    info!(?db_path, "Database path determined");

    let db = Database::new(
        DbConfig::new(db_path.clone())
            .max_connections(config.database.max_connections)
            .busy_timeout(config.database.query_timeout()),
    )
    .await?;
    info!("Database connected and migrations applied");

    let stdin = io::stdin();
    let mut console = Console::new(stdin.lock(), io::stdout()).with_display(&config.display);

    let result = async {
        menu::products::startup_alert(&mut console, &db).await?;
        menu::run(&mut console, &db).await
    }
    .await;

    db.close().await;
    info!("Inventa console stopped");

    match result {
        Err(e) if e.is_input_closed() => Ok(()),
        other => other,
    }
}

/// Initializes the tracing subscriber.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - Show debug messages
/// - `[logging] filter = "inventa=trace"` in config.toml
/// - Default: warnings, plus INFO for inventa crates
fn init_tracing(config: &AppConfig) {
    let filter = EnvFilter::try_from_default_env()
        .ok()
        .or_else(|| {
            config
                .logging
                .filter
                .as_deref()
                .and_then(|f| EnvFilter::try_new(f).ok())
        })
        .unwrap_or_else(|| EnvFilter::new("warn,inventa=info,sqlx=warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}
