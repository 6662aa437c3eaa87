use clap::Args;
use studytimer_core::Database;

#[derive(Args)]
pub struct StatsArgs {
    /// Also list the N most recent sessions
    #[arg(long, value_name = "N")]
    recent: Option<usize>,
}

pub fn run(args: StatsArgs) -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open_default()?;
    let stats = db.stats()?;

    let output = match args.recent {
        Some(limit) => serde_json::json!({
            "stats": stats,
            "recent": db.recent(limit)?,
        }),
        None => serde_json::to_value(&stats)?,
    };
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
