// Only compile UI module when TUI feature is enabled
#[cfg(feature = "tui")]
mod ui;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;

use parkwatch::{
    format_timestamp, now_string, Config, ExitOutcome, NewEntry, ParkingLot, VehicleRecord,
};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    #[default]
    Table,
    Json,
}

#[derive(Parser)]
#[command(name = "parkwatch", version, about = "Parking lot occupancy ledger and dashboard")]
struct Cli {
    /// Configuration file (default: ./parkwatch.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Directory holding vehicles.csv, rent_rates.csv and parking_layout.csv
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Table)]
    format: OutputFormat,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Interactive dashboard (default)
    Ui,
    /// Find vehicles by token or license number
    Search { query: String },
    /// Record a vehicle entering the lot
    Enter {
        #[arg(long)]
        token: String,
        #[arg(long)]
        license: String,
        #[arg(long = "type")]
        vehicle_type: String,
        #[arg(long)]
        slot: String,
        /// Entry time (YYYY-MM-DD HH:MM), defaults to now
        #[arg(long)]
        time: Option<String>,
    },
    /// Record a vehicle leaving the lot and print the rent
    Exit {
        token: String,
        /// Exit time (YYYY-MM-DD HH:MM), defaults to now
        #[arg(long)]
        time: Option<String>,
    },
    /// Show the parking layout
    Layout {
        /// Only list slots whose status disagrees with parked vehicles
        #[arg(long)]
        drift: bool,
    },
    /// Vehicle and slot totals
    Analytics,
    /// Rate table
    Rates,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();

    let mut config = Config::load(cli.config.as_deref()).context("Failed to load configuration")?;
    if let Some(dir) = cli.data_dir.clone() {
        config = config.with_data_dir(dir);
    }

    let mut lot = ParkingLot::open(&config)
        .with_context(|| format!("Failed to open parking data in {}", config.data_dir.display()))?;

    match cli.command.unwrap_or(Command::Ui) {
        Command::Ui => run_ui_mode(lot, &config),
        Command::Search { query } => run_search(&lot, &query, cli.format),
        Command::Enter {
            token,
            license,
            vehicle_type,
            slot,
            time,
        } => {
            let entry = NewEntry {
                token,
                license,
                vehicle_type,
                entry_time: time.unwrap_or_else(now_string),
                slot,
            };
            run_enter(&mut lot, entry, cli.format)
        }
        Command::Exit { token, time } => {
            let exit_time = time.unwrap_or_else(now_string);
            run_exit(&mut lot, &token, &exit_time, &config, cli.format)
        }
        Command::Layout { drift } => run_layout(&lot, drift, cli.format),
        Command::Analytics => run_analytics(&lot, cli.format),
        Command::Rates => run_rates(&lot, &config, cli.format),
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_vehicles(records: &[VehicleRecord]) {
    println!(
        "{:<10} {:<14} {:<8} {:<17} {:<17} {:<6}",
        "Token", "License", "Type", "Entry", "Exit", "Slot"
    );
    println!("{}", "─".repeat(76));
    for r in records {
        println!(
            "{:<10} {:<14} {:<8} {:<17} {:<17} {:<6}",
            r.token,
            r.license,
            r.vehicle_type,
            format_timestamp(&r.entry_time),
            r.exit_time.as_ref().map(format_timestamp).unwrap_or_default(),
            r.slot
        );
    }
}

fn run_search(lot: &ParkingLot, query: &str, format: OutputFormat) -> Result<()> {
    let results = lot.search(query);

    if format == OutputFormat::Json {
        return print_json(&results);
    }

    if results.is_empty() {
        println!("⚠️  No vehicle found for '{}'", query);
    } else {
        println!("🔍 Vehicle Details\n");
        print_vehicles(&results);
    }
    Ok(())
}

fn run_enter(lot: &mut ParkingLot, entry: NewEntry, format: OutputFormat) -> Result<()> {
    let record = lot.record_entry(entry).context("Vehicle entry rejected")?;

    if format == OutputFormat::Json {
        return print_json(&record);
    }

    println!(
        "✅ Vehicle {} ({}) added to slot {} at {}",
        record.token,
        record.license,
        record.slot,
        format_timestamp(&record.entry_time)
    );
    Ok(())
}

fn run_exit(
    lot: &mut ParkingLot,
    token: &str,
    exit_time: &str,
    config: &Config,
    format: OutputFormat,
) -> Result<()> {
    let outcome = lot.record_exit(token, exit_time).context("Vehicle exit failed")?;

    if format == OutputFormat::Json {
        return print_json(&outcome);
    }

    match outcome {
        ExitOutcome::NoVehicle { token } => {
            println!("⚠️  No vehicle found for token '{}'", token);
        }
        ExitOutcome::AlreadyExited { record } => {
            println!(
                "⚠️  Vehicle {} already exited at {}",
                record.token,
                record.exit_time.as_ref().map(format_timestamp).unwrap_or_default()
            );
        }
        ExitOutcome::Charged(receipt) => {
            println!("🚦 Vehicle Exit\n");
            print_vehicles(std::slice::from_ref(&receipt.record));
            println!(
                "\n   {} h × {}{} / h ({})",
                receipt.quote.billable_hours,
                config.currency,
                receipt.quote.rate_per_hour,
                receipt.quote.vehicle_type
            );
            println!("💰 Total Rent: {}{}", config.currency, receipt.quote.amount);
        }
    }
    Ok(())
}

fn run_layout(lot: &ParkingLot, drift: bool, format: OutputFormat) -> Result<()> {
    if drift {
        let drift = lot.layout_drift();
        if format == OutputFormat::Json {
            return print_json(&drift);
        }
        if drift.is_empty() {
            println!("✓ Layout agrees with parked vehicles");
        } else {
            println!("{:<8} {:<10} {:<10}", "Slot", "Layout", "Ledger");
            println!("{}", "─".repeat(30));
            for d in &drift {
                println!("{:<8} {:<10} {:<10}", d.slot_id, d.snapshot, d.ledger);
            }
        }
        return Ok(());
    }

    if format == OutputFormat::Json {
        return print_json(lot.layout_rows());
    }

    println!("🗺️  Parking Lot Layout\n");
    println!("{:<8} {:<10}", "Slot", "Status");
    println!("{}", "─".repeat(20));
    for slot in lot.layout_rows() {
        println!("{:<8} {:<10}", slot.slot_id, slot.status);
    }
    Ok(())
}

fn run_analytics(lot: &ParkingLot, format: OutputFormat) -> Result<()> {
    let analytics = lot.analytics();

    if format == OutputFormat::Json {
        return print_json(&analytics);
    }

    println!("📊 Analytics");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("Total Vehicles:  {}", analytics.total_vehicles);
    println!("Parked Now:      {}", analytics.parked_vehicles);
    println!("Occupied Slots:  {}", analytics.occupied_slots);
    println!("Vacant Slots:    {}", analytics.vacant_slots);
    Ok(())
}

fn run_rates(lot: &ParkingLot, config: &Config, format: OutputFormat) -> Result<()> {
    if format == OutputFormat::Json {
        return print_json(lot.rates().entries());
    }

    println!("{:<12} {:>10}", "Type", "Per Hour");
    println!("{}", "─".repeat(23));
    for rate in lot.rates().entries() {
        println!(
            "{:<12} {:>10}",
            rate.vehicle_type,
            format!("{}{}", config.currency, rate.rate_per_hour)
        );
    }
    Ok(())
}

#[cfg(feature = "tui")]
fn run_ui_mode(lot: ParkingLot, config: &Config) -> Result<()> {
    println!("🖥️  Loading Parkwatch dashboard...\n");

    let mut app = ui::App::new(lot, config.currency.clone());
    ui::run_ui(&mut app)?;

    println!("\n✅ Dashboard closed");
    Ok(())
}

#[cfg(not(feature = "tui"))]
fn run_ui_mode(_lot: ParkingLot, _config: &Config) -> Result<()> {
    eprintln!("❌ Dashboard not available!");
    eprintln!("   Rebuild with: cargo build --features tui");
    eprintln!("   Or use the web dashboard: cargo run --bin parkwatch-server --features server");
    std::process::exit(1);
}
