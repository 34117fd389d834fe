//! # Inventa Console Entry Point
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  stdin ──► Console ──► menu tree ──► inventa-db ──► inventa.db (SQLite) │
//! │  stdout ◄── tables, "OK: ...", "Error: ..."                             │
//! │  stderr ◄── tracing                                                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Exit status is 0 when the user leaves the menu or input ends, 1 when
//! startup fails (bad config, database unreachable).

#[tokio::main]
async fn main() {
    // The actual setup is in lib.rs for better testability
    if let Err(e) = inventa_console::run().await {
        eprintln!("inventa: {}", e.display_message(true));
        std::process::exit(1);
    }
}
