use chrono::{DateTime, NaiveDate, Utc};
use clap::{Parser, Subcommand};
use clinic_core::{
    config::{clinic_time_from_env_value, resolve_access_level_map},
    derive_invoice, parse_fuzzy_date, resolve_level, ExaminationSnapshot, PermissionSet,
};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "clinic")]
#[command(about = "Clinic back-office CLI")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve the access level on one resource
    Access {
        /// Resource key (e.g. medicine)
        resource: String,
        /// Granted permission (repeatable)
        #[arg(short = 'p', long = "permission")]
        permissions: Vec<String>,
        /// YAML access-level map (optional, defaults to the built-in map)
        #[arg(long)]
        map: Option<PathBuf>,
    },
    /// Resolve the access level on every configured resource
    Levels {
        /// Granted permission (repeatable)
        #[arg(short = 'p', long = "permission")]
        permissions: Vec<String>,
        /// YAML access-level map (optional, defaults to the built-in map)
        #[arg(long)]
        map: Option<PathBuf>,
    },
    /// Derive the invoice of an examination snapshot file
    Invoice {
        /// Examination snapshot (YAML)
        snapshot: PathBuf,
        /// Current time for the age display (RFC 3339, defaults to now)
        #[arg(long)]
        now: Option<String>,
        /// Clinic UTC offset in hours (defaults to +7)
        #[arg(long)]
        utc_offset: Option<String>,
    },
    /// Parse a free-text date (e.g. "12/3/24", "hôm qua", "3 tháng trước")
    ParseDate {
        /// Text as typed into the date picker
        text: String,
        /// Reference day (YYYY-MM-DD, defaults to today in clinic time)
        #[arg(long)]
        today: Option<String>,
    },
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Some(Commands::Access {
            resource,
            permissions,
            map,
        }) => {
            let map = resolve_access_level_map(map)?;
            let granted: PermissionSet = permissions.into_iter().collect();
            match resolve_level(&map, &resource, &granted) {
                Some(tier) => println!("{resource}: {tier}"),
                None => println!("{resource}: no access"),
            }
        }
        Some(Commands::Levels { permissions, map }) => {
            let map = resolve_access_level_map(map)?;
            let granted: PermissionSet = permissions.into_iter().collect();
            for resource in map.resources() {
                match resolve_level(&map, resource, &granted) {
                    Some(tier) => println!("{resource}: {tier}"),
                    None => println!("{resource}: no access"),
                }
            }
        }
        Some(Commands::Invoice {
            snapshot,
            now,
            utc_offset,
        }) => {
            let clinic_time = clinic_time_from_env_value(utc_offset)?;
            let now = match now {
                Some(s) => s.parse::<DateTime<Utc>>()?,
                None => Utc::now(),
            };
            let text = std::fs::read_to_string(&snapshot)?;
            let invoice = ExaminationSnapshot::parse_yaml(&text)
                .and_then(|s| derive_invoice(&s, now, &clinic_time))
                .map_err(|e| format!("Error deriving invoice: {e}"))?;
            println!("{}", invoice.to_json_pretty()?);
        }
        Some(Commands::ParseDate { text, today }) => {
            let today = match today {
                Some(s) => s.parse::<NaiveDate>()?,
                None => clinic_time_from_env_value(None)?.date_of(Utc::now()),
            };
            let date = parse_fuzzy_date(&text, today)
                .ok_or_else(|| format!("Could not understand date: {text}"))?;
            println!("{}", date.format("%d/%m/%Y"));
        }
        None => {
            println!("Use 'clinic --help' for commands");
        }
    }

    Ok(())
}
