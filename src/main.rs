use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use swift_registry::{
    insert_batch, is_empty, load_csv, load_env_file, open_database, verify_count, Config,
    Country, InvalidRowPolicy,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "swift-registry")]
#[command(about = "Load SWIFT/BIC code spreadsheets into the bank registry")]
#[command(version = swift_registry::VERSION)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Parse a CSV file and load it into an empty database
    Import {
        #[command(flatten)]
        source: SourceArgs,

        /// Database file (overrides SWIFT_DB_PATH)
        #[arg(long)]
        db: Option<PathBuf>,

        /// Also fill the country reference table
        #[arg(long)]
        with_countries: bool,
    },

    /// Parse and resolve a CSV file without touching a database
    Check {
        #[command(flatten)]
        source: SourceArgs,
    },
}

#[derive(Args, Debug)]
struct SourceArgs {
    /// SWIFT code CSV file
    #[arg(value_name = "CSV")]
    csv: PathBuf,

    /// What to do with invalid rows
    #[arg(long, value_enum, default_value_t = InvalidRowPolicy::Abort)]
    on_invalid_row: InvalidRowPolicy,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Import {
            source,
            db,
            with_countries,
        } => run_import(source, db, with_countries),
        Command::Check { source } => run_check(source),
    }
}

fn run_import(source: SourceArgs, db: Option<PathBuf>, with_countries: bool) -> Result<()> {
    println!("🗄️  SWIFT code import: CSV → SQLite");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    let db_path = match db {
        Some(path) => path,
        None => {
            load_env_file(Path::new(".")).context("Failed to load env file")?;
            Config::from_env().context("Failed to read configuration")?.db_path
        }
    };

    // 1. Parse + resolve
    println!("\n📂 Parsing {}...", source.csv.display());
    let batch = load_csv(&source.csv, source.on_invalid_row)
        .with_context(|| format!("Failed to parse {}", source.csv.display()))?;
    let banks = batch.resolve();
    println!(
        "✓ Parsed {} banks, {} countries ({} rows skipped)",
        banks.len(),
        batch.countries.len(),
        batch.skipped
    );

    // 2. Setup database
    println!("\n🔧 Opening database {}...", db_path.display());
    let mut conn = open_database(&db_path)
        .with_context(|| format!("Failed to open database {}", db_path.display()))?;
    if !is_empty(&conn)? {
        bail!(
            "Database {} already contains data; imports only run against an empty database",
            db_path.display()
        );
    }

    // 3. Insert (countries and banks share one transaction)
    println!("\n💾 Inserting...");
    let countries: &[Country] = if with_countries { &batch.countries[..] } else { &[] };
    let (country_count, _) =
        insert_batch(&mut conn, countries, &banks).context("Failed to insert batch")?;
    if with_countries {
        println!("✓ Inserted {} countries", country_count);
    }

    // 4. Verify
    let count = verify_count(&conn)?;
    println!("✓ Database contains {} banks", count);

    Ok(())
}

fn run_check(source: SourceArgs) -> Result<()> {
    let batch = load_csv(&source.csv, source.on_invalid_row)
        .with_context(|| format!("Failed to parse {}", source.csv.display()))?;
    let banks = batch.resolve();

    let headquarters = banks.iter().filter(|b| b.is_headquarter()).count();
    let linked = banks.iter().filter(|b| b.hq_swift_code.is_some()).count();
    let branches = banks.len() - headquarters;

    println!("📊 {}", source.csv.display());
    println!("   Banks:                  {}", banks.len());
    println!("   Headquarters:           {}", headquarters);
    println!("   Branches:               {}", branches);
    println!("   Branches without HQ:    {}", branches - linked);
    println!("   Countries:              {}", batch.countries.len());
    println!("   Skipped rows:           {}", batch.skipped);

    Ok(())
}
