use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use weekend_roster::config::Settings;
use weekend_roster::display::{render, write_report_to_file, Layout};
use weekend_roster::parser::load_students;
use weekend_roster::roster::{house_overview, location_choices, search_students, Day};
use weekend_roster::schedule::SlotKind;
use weekend_roster::store::{restore_backup, write_backup};
use weekend_roster::web::{start_server, AppState};

/// Roster, chores and fire lists for a boarding-school weekend
#[derive(Parser)]
#[command(name = "weekend", version)]
struct Cli {
    /// Snapshot file holding the roster between runs
    #[arg(long, global = true, env = "WEEKEND_STATE")]
    state: Option<PathBuf>,

    /// JSON file replacing the built-in task and cleaning slots
    #[arg(long, global = true, env = "WEEKEND_CATALOG")]
    catalog: Option<PathBuf>,

    /// Seed for reproducible distribution
    #[arg(long, global = true)]
    seed: Option<u64>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Replace the roster with students from a CSV export
    Import { file: PathBuf },
    /// List students, present ones unless --all
    Students {
        #[arg(default_value = "")]
        search: String,
        #[arg(long)]
        all: bool,
    },
    /// Toggle whether a student is here
    Presence { id: String },
    /// Toggle kitchen duty (excluded from distribution)
    Kitchen { id: String },
    /// Tick a student off (or back on) for the evening head count
    Mark { id: String },
    /// Present students per house with their head-count marks
    Houses,
    /// Randomly fill all unlocked task or cleaning slots
    Distribute { kind: SlotKind },
    /// Lock or unlock a slot
    Lock { kind: SlotKind, slot: String },
    /// Put a student on a slot by hand
    Add { kind: SlotKind, slot: String, id: String },
    /// Take a student off a slot
    Remove { kind: SlotKind, slot: String, id: String },
    /// Set where a student sleeps on a day
    Sleep { id: String, day: Day, location: String },
    /// Show where a student could sleep
    Rooms {
        id: String,
        #[arg(default_value = "")]
        search: String,
    },
    /// Set the weekend (week) number
    Week { number: u32 },
    /// Print a report: duties, fire[:day] or rollcall
    Print {
        layout: Layout,
        #[arg(long)]
        out: Option<String>,
    },
    /// Write a backup file into a directory
    Backup {
        #[arg(default_value = ".")]
        dir: PathBuf,
    },
    /// Restore from a backup file
    Restore { file: PathBuf },
    /// Forget the saved roster
    Reset,
    /// Serve the roster API on localhost
    Web {
        #[arg(default_value_t = 8080)]
        port: u16,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logging, RUST_LOG overrides the default level
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // Parse command line arguments
    let cli = Cli::parse();
    let settings = Settings { state_path: cli.state, catalog_path: cli.catalog, seed: cli.seed };
    let store = settings.store();
    let catalog = settings.catalog()?;
    let mut roster = store.load();

    // Read-only commands return early; everything else falls through to the save
    match cli.command {
        Command::Import { file } => {
            let students = load_students(&file).with_context(|| format!("Failed to import {}", file.display()))?;
            roster.import_students(students);
            println!("Imported {} students ({} present)", roster.students.len(), roster.present_count());
        }
        Command::Students { search, all } => {
            for s in search_students(&roster.students, &search, all) {
                let kitchen = if s.is_kitchen_duty { " [kitchen]" } else { "" };
                let away = if s.is_present { "" } else { " (away)" };
                println!("{:<28} {:<30} {} - {}{}{}", s.id, s.full_name(), s.house, s.room, kitchen, away);
            }
            return Ok(());
        }
        Command::Presence { id } => {
            let present = roster.toggle_presence(&id)?;
            println!("{} is {}", roster.display_name(&id), if present { "present" } else { "away" });
        }
        Command::Kitchen { id } => {
            let on = roster.toggle_kitchen_duty(&id)?;
            println!("{} kitchen duty: {}", roster.display_name(&id), if on { "on" } else { "off" });
        }
        Command::Mark { id } => {
            let marked = roster.toggle_marked(&id)?;
            println!("{} {}", roster.display_name(&id), if marked { "checked" } else { "unchecked" });
        }
        Command::Houses => {
            for (house, members) in house_overview(&roster.students) {
                let checked = members.iter().filter(|s| s.is_marked).count();
                println!("{} ({}/{})", house, checked, members.len());
                for s in members {
                    let mark = if s.is_marked { "x" } else { " " };
                    println!("  [{}] {:<6} {}", mark, s.room, s.full_name());
                }
            }
            return Ok(());
        }
        Command::Distribute { kind } => {
            let mut rng = settings.rng();
            roster.distribute(&catalog, kind, &mut rng);
            // Show the result slot by slot
            for slot in catalog.slots(kind) {
                let names: Vec<String> = roster.assignments(kind)
                    .get(&slot.id)
                    .map(|ids| ids.iter().map(|id| roster.display_name(id)).collect())
                    .unwrap_or_default();
                let lock = if roster.is_locked(&slot.id) { " [locked]" } else { "" };
                println!("{:<34} {}{}", slot.label, names.join(", "), lock);
            }
        }
        Command::Lock { kind, slot } => {
            let locked = roster.toggle_lock(&catalog, kind, &slot)?;
            println!("{} {}", slot, if locked { "locked" } else { "unlocked" });
        }
        Command::Add { kind, slot, id } => {
            if !roster.add_to_slot(&catalog, kind, &slot, &id)? {
                println!("{} is already on {}", roster.display_name(&id), slot);
            }
        }
        Command::Remove { kind, slot, id } => {
            if !roster.remove_from_slot(&catalog, kind, &slot, &id)? {
                println!("{} is not on {}", roster.display_name(&id), slot);
            }
        }
        Command::Sleep { id, day, location } => {
            roster.set_sleeping_location(&id, day, &location)?;
        }
        Command::Rooms { id, search } => {
            let student = roster.student(&id)?;
            let choices = location_choices(&roster.students, student, &search);
            println!("Own room:      {}", choices.own_room);
            println!("In the house:  {}", choices.house_rooms.join(", "));
            println!("Common areas:  {}", choices.common_areas.join(", "));
            for room in &choices.all_rooms {
                println!("  {}", room.label());
            }
            return Ok(());
        }
        Command::Week { number } => roster.set_weekend_num(number),
        Command::Print { layout, out } => {
            let report = render(layout, &roster, &catalog);
            match out {
                Some(path) => {
                    write_report_to_file(&report, &path)?;
                    println!("Report saved to {}", path);
                }
                None => print!("{}", report),
            }
            return Ok(());
        }
        Command::Backup { dir } => {
            let path = write_backup(&roster, &dir)?;
            println!("Backup saved to {}", path.display());
            return Ok(());
        }
        Command::Restore { file } => {
            let blob = std::fs::read_to_string(&file).with_context(|| format!("Failed to read {}", file.display()))?;
            restore_backup(&mut roster, &blob)?;
            println!("Backup restored ({} students)", roster.students.len());
        }
        Command::Reset => {
            store.reset()?;
            println!("Saved roster removed");
            return Ok(());
        }
        Command::Web { port } => {
            println!("Access the roster at http://localhost:{}", port);
            start_server(port, AppState::new(roster, catalog, store, settings.rng())).await?;
            return Ok(());
        }
    }

    // Snapshot after every mutation
    store.save(&roster);
    Ok(())
}
