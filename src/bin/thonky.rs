//! CLI binary for thonky.
//!
//! Drives the schedule cache against a document stored as a JSON file, the
//! same way a chat bot would drive it against a hosted spreadsheet.

use anyhow::{Context, bail};
use chrono::Utc;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thonky::schedule::{BLOCKS, Week, role_availability};
use thonky::{
    EditOutcome, JsonFileStore, ScheduleCache, SnapshotStore, ThonkyConfig, next_reminder,
};
use thonky_sheets::MemoryProvider;
use thonky_sheets::template::sample_document;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Thonky: team availability schedule cache.
#[derive(Parser)]
#[command(name = "thonky", version, about)]
struct Cli {
    /// Path to TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Spreadsheet document stored as JSON.
    #[arg(short, long, default_value = "thonky-document.json")]
    document: PathBuf,

    /// Directory for cached snapshots, overriding the config.
    #[arg(long)]
    cache_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Write a sample document.
    Init {
        /// Document id.
        #[arg(long, default_value = "sample")]
        id: String,
    },

    /// Refresh the cache if the document changed.
    Refresh,

    /// Show the week, starting today.
    Week,

    /// Show today's activities.
    Today,

    /// List blocks planned as an activity that have no note yet.
    Unscheduled { activity: String },

    /// Show the roster and today's availability per role.
    Players,

    /// Set activities, e.g. `set monday 4-6 Scrim, Free, Off`.
    Set {
        /// Set a player's responses instead of the week.
        #[arg(long)]
        player: Option<String>,
        day: String,
        #[arg(required = true, num_args = 1..)]
        tokens: Vec<String>,
    },

    /// Set notes, e.g. `schedule friday 5 vs Inked`.
    Schedule {
        day: String,
        #[arg(required = true, num_args = 1..)]
        tokens: Vec<String>,
    },

    /// Save the current week as the default week.
    SaveDefault,

    /// Reset the week to the saved default week.
    Reset,

    /// Show the reminder due now for any of the given activities.
    Remind {
        #[arg(required = true, num_args = 1..)]
        activities: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("thonky=info")),
        )
        .init();

    let cli = Cli::parse();
    let mut config = load_config(cli.config.as_deref())?;
    if let Some(dir) = cli.cache_dir {
        config.cache.dir = dir;
    }

    if let Command::Init { id } = &cli.command {
        return init_document(&cli.document, id);
    }

    let provider = Arc::new(
        MemoryProvider::from_json_file(&cli.document)
            .with_context(|| format!("cannot open {}", cli.document.display()))?,
    );
    let Some(doc_id) = provider.document_ids().into_iter().next() else {
        bail!("{} holds no document", cli.document.display());
    };
    let store: Arc<dyn SnapshotStore> = Arc::new(JsonFileStore::new(&config.cache.dir));
    let cache = ScheduleCache::open(Arc::clone(&provider), &doc_id, config, Some(store)).await?;

    match cli.command {
        Command::Init { .. } => {}
        Command::Refresh => {
            if cache.refresh_if_stale().await? {
                println!("refreshed {doc_id}");
            } else {
                println!("{doc_id} is up to date");
            }
        }
        Command::Week => print_week(&cache.week()?),
        Command::Today => print_today(&cache.week()?),
        Command::Unscheduled { activity } => {
            let week = cache.week()?;
            let open = week.unscheduled(&activity);
            if open.is_empty() {
                println!("no unscheduled {activity}");
            }
            for (day, block) in open {
                println!("{} {}", week.days[day], week.hour_of(block));
            }
        }
        Command::Players => print_players(&cache)?,
        Command::Set { player, day, tokens } => {
            let outcome = match player {
                Some(name) => cache.set_player(&name, &day, &tokens).await?,
                None => cache.set_week(&day, &tokens).await?,
            };
            report(&outcome);
        }
        Command::Schedule { day, tokens } => {
            let outcome = cache.schedule_note(&day, &tokens).await?;
            report(&outcome);
        }
        Command::SaveDefault => {
            cache.save_default_week()?;
            println!("saved default week for {doc_id}");
        }
        Command::Reset => {
            let outcome = cache.reset_to_default().await?;
            report(&outcome);
        }
        Command::Remind { activities } => {
            let week = cache.week()?;
            let lead = chrono::Duration::minutes(i64::from(cache.config().reminders.lead_minutes));
            match next_reminder(&week, &activities, Utc::now(), lead) {
                Some(reminder) => println!(
                    "{} starts in {} minute(s) at {}",
                    reminder.activity,
                    reminder.minutes_until,
                    week.hour_of(reminder.block)
                ),
                None => println!("nothing due"),
            }
        }
    }

    provider
        .save_json_file(&doc_id, &cli.document)
        .with_context(|| format!("cannot write {}", cli.document.display()))?;
    Ok(())
}

fn load_config(path: Option<&Path>) -> anyhow::Result<ThonkyConfig> {
    if let Some(path) = path {
        return Ok(ThonkyConfig::from_file(path)?);
    }
    let default_path = ThonkyConfig::default_config_path();
    if default_path.exists() {
        info!(path = %default_path.display(), "using default config");
        return Ok(ThonkyConfig::from_file(&default_path)?);
    }
    Ok(ThonkyConfig::default())
}

fn init_document(path: &Path, id: &str) -> anyhow::Result<()> {
    if path.exists() {
        bail!("{} already exists", path.display());
    }
    let provider = MemoryProvider::new().with_document(sample_document(id, Utc::now()));
    provider.save_json_file(id, path)?;
    println!("wrote sample document {id} to {}", path.display());
    Ok(())
}

fn report(outcome: &EditOutcome) {
    if outcome.changed == 0 {
        println!("{}: nothing changed", outcome.sheet);
    } else {
        println!("{}: updated {} cell(s)", outcome.sheet, outcome.changed);
    }
}

fn header(week: &Week) -> String {
    (0..BLOCKS)
        .map(|b| format!("{:>10}", week.hour_of(b)))
        .collect()
}

fn day_line(week: &Week, day: usize) -> String {
    let activities = week.activities_on(day).unwrap_or_default();
    let cells: String = activities.iter().map(|a| format!("{a:>10}")).collect();
    format!("{:<10}{cells}", week.days[day])
}

fn print_week(week: &Week) {
    println!("week of {}", week.date);
    println!("{:<10}{}", "", header(week));
    for day in Week::display_order(week.today(Utc::now())) {
        println!("{}", day_line(week, day));
    }
}

fn print_today(week: &Week) {
    let today = week.today(Utc::now());
    println!("{:<10}{}", "", header(week));
    println!("{}", day_line(week, today));
}

fn print_players(cache: &ScheduleCache<MemoryProvider>) -> anyhow::Result<()> {
    let week = cache.week()?;
    let mut players = cache.players()?;
    players.sort_by(|a, b| a.role.cmp(&b.role).then_with(|| a.name.cmp(&b.name)));
    for player in &players {
        println!("{:<10}{}", player.role, player.name);
    }

    let today = week.today(Utc::now());
    println!();
    println!("available today ({}):", week.days[today]);
    println!("{:<10}{}", "", header(&week));
    for (role, counts) in role_availability(&players, today) {
        let cells: String = counts.iter().map(|c| format!("{c:>10}")).collect();
        println!("{role:<10}{cells}");
    }
    Ok(())
}
