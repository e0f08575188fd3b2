use std::fmt;

use storage::json::load_question_bank;
use storage::repository::Storage;

// `mode=rwc` creates the database file on first import.
const DEFAULT_DB_URL: &str = "sqlite://hygiene.sqlite3?mode=rwc";

#[derive(Debug, Clone)]
struct Args {
    db_url: String,
    bank_path: String,
    only: Option<String>,
}

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidDbUrl { raw: String },
    InvalidBankPath { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
            ArgsError::InvalidBankPath { raw } => write!(f, "invalid --bank value: {raw}"),
        }
    }
}

impl std::error::Error for ArgsError {}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

impl Args {
    fn parse() -> Result<Self, ArgsError> {
        let mut db_url =
            std::env::var("HYGIENE_DB_URL").unwrap_or_else(|_| DEFAULT_DB_URL.into());
        let mut bank_path =
            std::env::var("HYGIENE_BANK_PATH").unwrap_or_else(|_| "data/questions.json".into());
        let mut only = None;

        let mut args = std::env::args().skip(1);
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(&mut args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    db_url = value;
                }
                "--bank" => {
                    let value = require_value(&mut args, "--bank")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidBankPath { raw: value });
                    }
                    bank_path = value;
                }
                "--only" => {
                    only = Some(require_value(&mut args, "--only")?);
                }
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(Self {
            db_url,
            bank_path,
            only,
        })
    }
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p storage --bin seed -- [options]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --db <sqlite_url>         SQLite URL (default: sqlite://hygiene.sqlite3?mode=rwc)");
    eprintln!("  --bank <path>             Question bank JSON (default: data/questions.json)");
    eprintln!("  --only <category>         Import a single category");
    eprintln!("  -h, --help                Show this help");
    eprintln!();
    eprintln!("Environment (same as flags):");
    eprintln!("  HYGIENE_DB_URL, HYGIENE_BANK_PATH");
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse().map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    let bank = load_question_bank(&args.bank_path)?;
    let storage = Storage::sqlite(&args.db_url).await?;

    let mut categories = 0;
    let mut questions = 0;
    for category in bank.categories() {
        if args.only.as_deref().is_some_and(|only| only != category.name()) {
            continue;
        }
        storage.questions.upsert_category(category).await?;
        log::info!("imported {} ({} questions)", category.name(), category.len());
        categories += 1;
        questions += category.len();
    }

    println!(
        "Seeded {categories} categories with {questions} questions from {} into {}",
        args.bank_path, args.db_url
    );

    Ok(())
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}
