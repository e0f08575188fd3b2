use std::fmt;
use std::io::{self, Write};
use std::path::PathBuf;

use hygiene_core::model::{DifficultyFilter, UserId};
use services::artifacts::report_json;
use services::{Clock, QuizService, SessionError, TextRenderer};
use storage::json::load_tips;
use storage::repository::Storage;

mod console;

use console::Outcome;

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    MissingCategory,
    UnknownArg(String),
    InvalidDbUrl { raw: String },
    InvalidUserId { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::MissingCategory => write!(f, "quiz requires a category name"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
            ArgsError::InvalidUserId { raw } => write!(f, "invalid --user value: {raw:?}"),
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

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  hygiene categories [options]");
    eprintln!("  hygiene quiz <category> [--difficulty <label>] [--json] [options]");
    eprintln!("  hygiene stats [options]");
    eprintln!("  hygiene tips  [--tips <path>]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --db <sqlite_url>   default sqlite://hygiene.sqlite3");
    eprintln!("  --user <id>         default default_user");
    eprintln!("  --name <name>       default User");
    eprintln!("  --out <dir>         where certificates and reports go, default out");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  HYGIENE_DB_URL, HYGIENE_USER_ID, HYGIENE_USER_NAME, HYGIENE_OUT_DIR,");
    eprintln!("  HYGIENE_TIPS_PATH, RUST_LOG");
    eprintln!();
    eprintln!("Import questions first with the seed binary of the storage crate.");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Categories,
    Quiz,
    Stats,
    Tips,
}

impl Command {
    fn from_arg(arg: &str) -> Option<Self> {
        match arg {
            "categories" => Some(Self::Categories),
            "quiz" => Some(Self::Quiz),
            "stats" => Some(Self::Stats),
            "tips" => Some(Self::Tips),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
struct Args {
    db_url: String,
    user_id: UserId,
    user_name: String,
    out_dir: PathBuf,
    tips_path: PathBuf,
    category: Option<String>,
    difficulty: DifficultyFilter,
    json: bool,
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key)
        .ok()
        .filter(|value| !value.trim().is_empty())
        .unwrap_or_else(|| default.to_owned())
}

fn parse_user_id(raw: String) -> Result<UserId, ArgsError> {
    UserId::new(raw.clone()).map_err(|_| ArgsError::InvalidUserId { raw })
}

impl Args {
    fn parse(args: &mut impl Iterator<Item = String>) -> Result<Self, ArgsError> {
        let mut db_url =
            normalize_sqlite_url(env_or("HYGIENE_DB_URL", "sqlite://hygiene.sqlite3"));
        let mut user_id = parse_user_id(env_or("HYGIENE_USER_ID", "default_user"))?;
        let mut user_name = env_or("HYGIENE_USER_NAME", "User");
        let mut out_dir = PathBuf::from(env_or("HYGIENE_OUT_DIR", "out"));
        let mut tips_path = PathBuf::from(env_or("HYGIENE_TIPS_PATH", "data/tips.json"));
        let mut category = None;
        let mut difficulty = DifficultyFilter::All;
        let mut json = false;

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    db_url = normalize_sqlite_url(value);
                }
                "--user" => user_id = parse_user_id(require_value(args, "--user")?)?,
                "--name" => user_name = require_value(args, "--name")?,
                "--out" => out_dir = PathBuf::from(require_value(args, "--out")?),
                "--tips" => tips_path = PathBuf::from(require_value(args, "--tips")?),
                "--difficulty" => {
                    let value = require_value(args, "--difficulty")?;
                    difficulty = DifficultyFilter::from_label(&value);
                }
                "--json" => json = true,
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ if !arg.starts_with('-') && category.is_none() => {
                    category = Some(arg);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(Self {
            db_url,
            user_id,
            user_name,
            out_dir,
            tips_path,
            category,
            difficulty,
            json,
        })
    }
}

fn normalize_sqlite_url(raw: String) -> String {
    if raw == "sqlite::memory:" || raw.starts_with("sqlite://") {
        return raw;
    }

    let trimmed = raw.trim().to_string();
    let path_str = trimmed
        .strip_prefix("sqlite:")
        .unwrap_or(trimmed.as_str())
        .to_string();
    let path = std::path::Path::new(&path_str);
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| PathBuf::from("."))
            .join(path)
    };
    format!("sqlite://{}", absolute.display())
}

fn prepare_sqlite_file(db_url: &str) -> Result<(), Box<dyn std::error::Error>> {
    if db_url == "sqlite::memory:" {
        return Ok(());
    }

    let path = db_url
        .strip_prefix("sqlite://")
        .ok_or_else(|| ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        })?;
    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() {
        return Err(ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        }
        .into());
    }

    let path = std::path::Path::new(path);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    if !path.exists() {
        std::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(path)?;
    }

    Ok(())
}

async fn list_categories(service: &QuizService) -> Result<(), SessionError> {
    let names = service.categories().await?;
    if names.is_empty() {
        println!("No categories yet. Import a question bank with the seed binary.");
        return Ok(());
    }
    for name in names {
        let description = service.category_description(&name).await?;
        let count = service
            .questions_for(&name, &DifficultyFilter::All)
            .await?
            .len();
        println!("{name} ({count} questions)");
        if !description.is_empty() {
            println!("    {description}");
        }
    }
    Ok(())
}

async fn take_quiz(service: &QuizService, args: Args) -> Result<(), Box<dyn std::error::Error>> {
    let category = args.category.ok_or(ArgsError::MissingCategory)?;
    let mut manager = service.open_session(args.user_id, &args.user_name).await?;
    service
        .start_quiz(&mut manager, &category, args.difficulty)
        .await?;
    println!("{category}: {}", service.category_description(&category).await?);

    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let outcome = console::run_quiz(&mut manager, &mut stdin.lock(), &mut stdout)?;
    if outcome == Outcome::Quit {
        manager.discard();
        println!();
        println!("Quiz abandoned. Nothing was recorded.");
        return Ok(());
    }

    let summary = service.complete_quiz(&mut manager).await?;
    if args.json {
        println!("{}", report_json(&summary)?);
    } else {
        console::print_summary(&summary, &mut stdout)?;
    }

    let renderer = TextRenderer::new(&args.out_dir);
    let report = service.write_report(&manager, &renderer)?;
    println!();
    println!("Report written to {}", report.display());

    match service.issue_certificate(&manager, &renderer).await {
        Ok(certificate) => match certificate.artifact_path() {
            Some(path) => println!("Certificate written to {}", path.display()),
            None => println!("Certificate {} recorded but not written.", certificate.id()),
        },
        Err(SessionError::NotPassing(score)) => {
            println!("Score {score:.1}% is below the passing mark; no certificate this time.");
        }
        Err(e) => return Err(e.into()),
    }
    stdout.flush()?;
    Ok(())
}

async fn show_stats(service: &QuizService, args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    let Some(stats) = service.stats_for(&args.user_id).await? else {
        println!("No quizzes completed by {} yet.", args.user_id);
        return Ok(());
    };
    let mut stdout = io::stdout();
    console::print_stats(&stats, &mut stdout)?;

    let names = service.categories().await?;
    if !names.is_empty() && stats.has_completed_all_categories(names.iter().map(String::as_str)) {
        println!();
        println!("Every category has been attempted at least once.");
    }

    let certificates = service.certificates(&args.user_id, 10).await?;
    if !certificates.is_empty() {
        println!();
        println!("Certificates:");
        for certificate in certificates {
            println!(
                "  {}  {:<24} {:>6}  {}",
                certificate.completion_date(),
                certificate.course_name(),
                certificate.formatted_score(),
                certificate.grade()
            );
        }
    }
    Ok(())
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let mut argv = std::env::args().skip(1);

    let cmd = match argv.next() {
        None => {
            print_usage();
            return Ok(());
        }
        Some(first) if first == "--help" || first == "-h" => {
            print_usage();
            return Ok(());
        }
        Some(first) => Command::from_arg(&first).ok_or_else(|| {
            eprintln!("unknown subcommand: {first}");
            print_usage();
            io::Error::new(io::ErrorKind::InvalidInput, "unknown subcommand")
        })?,
    };

    let args = Args::parse(&mut argv).map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    if cmd == Command::Tips {
        let tips = load_tips(&args.tips_path)?;
        console::print_tips(&tips, &mut io::stdout())?;
        return Ok(());
    }

    // Open + migrate SQLite here so core and services stay free of I/O setup.
    prepare_sqlite_file(&args.db_url)?;
    log::debug!("opening {}", args.db_url);
    let storage = Storage::sqlite(&args.db_url).await?;
    let service = QuizService::from_storage(Clock::system(), &storage);

    match cmd {
        Command::Categories => list_categories(&service).await?,
        Command::Quiz => take_quiz(&service, args).await?,
        Command::Stats => show_stats(&service, &args).await?,
        Command::Tips => {}
    }
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
