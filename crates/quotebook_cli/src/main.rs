//! CLI smoke entry point.
//!
//! # Responsibility
//! - Provide a minimal executable to verify `quotebook_core` linkage.
//! - Keep output deterministic for quick local sanity checks.

use quotebook_core::db::{migrations, open_db_in_memory};

fn main() {
    println!("quotebook_core version={}", quotebook_core::core_version());
    match open_db_in_memory() {
        Ok(_conn) => println!("schema_version={}", migrations::latest_version()),
        Err(err) => {
            eprintln!("database bootstrap failed: {err}");
            std::process::exit(1);
        }
    }
}
