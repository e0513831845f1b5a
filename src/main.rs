//! Command-line front-end for the wordcard library.
//!
//! Shows random flashcards from a dictionary file, counts its entries and
//! imports new entries from tab-separated text.

use clap::{Parser, Subcommand};
use colored::*;
use log::{LevelFilter, error, info};
use std::io::Write;
use std::path::{Path, PathBuf};
use wordcard::{
    Listener, LoadOptions, Notification, ResolveOptions, WordCardError, WordLookupService, db,
    error::Result,
    import::parse_entries_tsv, resolve_database_path,
};

#[derive(Parser, Debug)]
#[command(author, version, about = "Random-word flashcards from an SQLite dictionary", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to a dictionary database file (optional)
    #[arg(long, global = true)]
    db_path: Option<PathBuf>,

    /// Set verbosity level (use -v, -vv, or -vvv for increasing verbosity)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Show random entries
    Random {
        /// How many cards to draw
        #[arg(short, long, default_value_t = 1)]
        count: usize,
        /// Print each card as a JSON object
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Print the number of entries in the dictionary
    Count,
    /// Insert entries from a word<TAB>wordtype<TAB>definition file
    Import {
        /// Tab-separated input file
        file: PathBuf,
        /// Create the entries table if it is missing
        #[arg(long, default_value_t = false)]
        create: bool,
    },
    /// Print the dictionary path that would be opened
    Where,
}

/// Sets up logging based on verbosity level.
fn setup_logging(verbose: u8) {
    let log_level = match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };

    env_logger::Builder::new()
        .filter(None, log_level)
        .format(|buf, record| writeln!(buf, "[{}] {}", record.level(), record.args()))
        .init();
}

/// Prints error notifications as they happen.
fn report_notification(notification: &Notification) {
    match notification {
        Notification::ErrorOccurred(text) => {
            error!("{}", text);
            eprintln!("{}", format!("Error: {}", text).red());
        }
        Notification::DatabaseOpened(ok) => info!("Database opened: {}", ok),
        other => log::trace!("{:?}", other),
    }
}

fn target_path(cli_path: Option<PathBuf>) -> Result<PathBuf> {
    match cli_path {
        Some(path) => Ok(path),
        None => resolve_database_path(&ResolveOptions::from_environment()?),
    }
}

fn main() {
    let cli = Cli::parse();

    setup_logging(cli.verbose);

    let outcome = match cli.command {
        Commands::Random { count, json } => {
            handle_random(cli.db_path, count, json);
            Ok(())
        }
        Commands::Count => {
            let service = load_service(cli.db_path);
            println!("{}", service.total_words());
            Ok(())
        }
        Commands::Import { file, create } => handle_import(cli.db_path, &file, create),
        Commands::Where => target_path(cli.db_path).map(|path| println!("{}", path.display())),
    };

    if let Err(e) = outcome {
        error!("{}", e);
        eprintln!("{}", format!("Error: {}", e).red());
        std::process::exit(1);
    }
}

fn load_service(db_path: Option<PathBuf>) -> WordLookupService {
    let options = LoadOptions {
        db_path,
        resolve: None,
    };
    let listener: Listener = Box::new(report_notification);
    WordLookupService::load(&options, Some(listener))
}

fn handle_random(db_path: Option<PathBuf>, count: usize, json: bool) {
    let mut service = load_service(db_path);
    info!(
        "Drawing {} card(s) from {} entries",
        count,
        service.total_words()
    );

    for _ in 0..count {
        service.send_random_record();
        if json {
            match serde_json::to_string(service.selection()) {
                Ok(line) => println!("{}", line),
                Err(e) => error!("Failed to serialize card: {}", e),
            }
        } else if service.word_type().is_empty() {
            println!("{}\n  {}\n", service.word().bold().cyan(), service.definition());
        } else {
            println!(
                "{} ~ {}\n  {}\n",
                service.word().bold().cyan(),
                service.word_type().italic(),
                service.definition()
            );
        }
    }
}

fn handle_import(db_path: Option<PathBuf>, file: &Path, create: bool) -> Result<()> {
    let path = target_path(db_path)?;
    info!("Importing {:?} into {:?}", file, path);

    let content = std::fs::read_to_string(file)?;
    let entries = parse_entries_tsv(&content)?;

    let mut conn = db::open_connection(&path)?;
    if create {
        db::create_entries_table(&conn)?;
    } else if !db::has_entries_table(&conn)? {
        return Err(WordCardError::SchemaMissing);
    }
    let inserted = db::insert_entries(&mut conn, &entries)?;

    println!(
        "{}",
        format!("Imported {} entries into {}", inserted, path.display()).green()
    );
    Ok(())
}
