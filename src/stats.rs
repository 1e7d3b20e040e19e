//! Database summary.
//!
//! Connects, counts users and notes, and prints the (credential-free)
//! connection target. Used by `biblot stats` to confirm that the database is
//! reachable and the schema is in place.

use anyhow::Result;

use crate::config::Config;
use crate::db::Connect;
use crate::notes::NoteStore;

/// Run the stats command: query the database and print a summary.
pub async fn run_stats(config: &Config) -> Result<()> {
    let mut store = NoteStore::connect(&config.db).await?;
    let target = store.manager().connector().describe();
    let stats = store.stats().await?;
    store.close().await;

    println!("Biblot Database Stats");
    println!("=====================");
    println!();
    println!("  Database:  {}", target);
    println!("  Users:     {}", stats.users);
    println!("  Notes:     {}", stats.notes);
    println!(
        "  Per user:  {}",
        format_ratio(stats.notes, stats.users)
    );

    Ok(())
}

fn format_ratio(notes: i64, users: i64) -> String {
    if users == 0 {
        return "-".to_string();
    }
    format!("{:.1}", notes as f64 / users as f64)
}
