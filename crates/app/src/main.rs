use std::fmt;
use std::io;

use quiz_core::Clock;
use quiz_core::model::{ConfigId, Difficulty, QuestionType};
use quiz_core::validate_questions_json;
use services::{AppServices, NewSessionConfig, QuizStore};

mod play;

const SAMPLE_QUESTIONS: &str = include_str!("sample_questions.json");

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    MissingArgument { what: &'static str },
    UnknownArg(String),
    InvalidDbUrl { raw: String },
    InvalidCount { raw: String },
    InvalidDifficulty { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::MissingArgument { what } => write!(f, "missing {what}"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
            ArgsError::InvalidCount { raw } => {
                write!(f, "invalid --count value: {raw} (must be a positive integer)")
            }
            ArgsError::InvalidDifficulty { raw } => {
                write!(f, "invalid --difficulty value: {raw} (must be: easy, medium, hard)")
            }
        }
    }
}

impl std::error::Error for ArgsError {}

/// A rejected question file; the messages were already printed.
#[derive(Debug)]
struct InvalidQuestionSet {
    errors: usize,
}

impl fmt::Display for InvalidQuestionSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "question set rejected with {} error(s)", self.errors)
    }
}

impl std::error::Error for InvalidQuestionSet {}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  quiz validate <file.json>           check a question set without importing");
    eprintln!("  quiz import <file.json>             validate and add questions to the pool");
    eprintln!("  quiz seed                           add the bundled sample questions");
    eprintln!("  quiz stats                          summarise the question pool");
    eprintln!("  quiz configs                        list saved session configs");
    eprintln!(
        "  quiz config-add --name <name> [--category <c>] [--difficulty <d>] [--count <n>] [--random]"
    );
    eprintln!("  quiz config-rm <config-id>          delete a saved session config");
    eprintln!("  quiz play [<config-id>]             run a session in the terminal");
    eprintln!("  quiz clear                          remove every question from the pool");
    eprintln!();
    eprintln!("Every command accepts --db <sqlite_url> (default sqlite://quiz.sqlite3).");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  QUIZ_DB_URL, RUST_LOG");
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Command {
    Validate { file: String },
    Import { file: String },
    Seed,
    Stats,
    Configs,
    ConfigAdd(NewSessionConfig),
    ConfigRm { id: ConfigId },
    Play { config: Option<ConfigId> },
    Clear,
}

struct Args {
    db_url: String,
    command: Command,
}

impl Args {
    fn parse(argv: Vec<String>) -> Result<Option<Self>, ArgsError> {
        let mut db_url = std::env::var("QUIZ_DB_URL")
            .ok()
            .map_or_else(|| "sqlite://quiz.sqlite3".into(), normalize_sqlite_url);

        let mut iter = argv.into_iter();
        let Some(name) = iter.next() else {
            return Ok(None);
        };
        if matches!(name.as_str(), "--help" | "-h" | "help") {
            return Ok(None);
        }

        let mut positional: Vec<String> = Vec::new();
        let mut config_name: Option<String> = None;
        let mut category: Option<String> = None;
        let mut difficulty: Option<Difficulty> = None;
        let mut count: u32 = 10;
        let mut randomize = false;

        while let Some(arg) = iter.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(&mut iter, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    db_url = normalize_sqlite_url(value);
                }
                "--name" => config_name = Some(require_value(&mut iter, "--name")?),
                "--category" => category = Some(require_value(&mut iter, "--category")?),
                "--difficulty" => {
                    let value = require_value(&mut iter, "--difficulty")?;
                    difficulty = Some(
                        Difficulty::parse(&value)
                            .ok_or(ArgsError::InvalidDifficulty { raw: value })?,
                    );
                }
                "--count" => {
                    let value = require_value(&mut iter, "--count")?;
                    count = value
                        .parse()
                        .ok()
                        .filter(|n| *n > 0)
                        .ok_or(ArgsError::InvalidCount { raw: value })?;
                }
                "--random" => randomize = true,
                "--help" | "-h" => return Ok(None),
                _ if arg.starts_with("--") => return Err(ArgsError::UnknownArg(arg)),
                _ => positional.push(arg),
            }
        }

        let mut positional = positional.into_iter();
        let command = match name.as_str() {
            "validate" => Command::Validate {
                file: positional.next().ok_or(ArgsError::MissingArgument {
                    what: "question file",
                })?,
            },
            "import" => Command::Import {
                file: positional.next().ok_or(ArgsError::MissingArgument {
                    what: "question file",
                })?,
            },
            "seed" => Command::Seed,
            "stats" => Command::Stats,
            "configs" => Command::Configs,
            "config-add" => Command::ConfigAdd(NewSessionConfig {
                name: config_name.ok_or(ArgsError::MissingValue { flag: "--name" })?,
                category_filter: category,
                difficulty_filter: difficulty,
                questions_per_session: count,
                randomize_questions: randomize,
            }),
            "config-rm" => Command::ConfigRm {
                id: positional
                    .next()
                    .map(ConfigId::new)
                    .ok_or(ArgsError::MissingArgument { what: "config id" })?,
            },
            "play" => Command::Play {
                config: positional.next().map(ConfigId::new),
            },
            "clear" => Command::Clear,
            _ => return Err(ArgsError::UnknownArg(name)),
        };
        if let Some(extra) = positional.next() {
            return Err(ArgsError::UnknownArg(extra));
        }

        Ok(Some(Self { db_url, command }))
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
            .unwrap_or_else(|_| std::path::PathBuf::from("."))
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

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn print_validation_errors(errors: &[String]) {
    for error in errors {
        eprintln!("  {error}");
    }
}

async fn import_text(store: &mut QuizStore, text: &str) -> Result<(), Box<dyn std::error::Error>> {
    match store.import_json(text).await {
        Ok(summary) => {
            println!(
                "imported {} question(s): {} new, {} replaced",
                summary.added + summary.replaced,
                summary.added,
                summary.replaced
            );
            Ok(())
        }
        Err(err) => {
            print_validation_errors(err.errors());
            Err(InvalidQuestionSet {
                errors: err.errors().len(),
            }
            .into())
        }
    }
}

fn print_stats(store: &QuizStore) {
    let questions = store.questions();
    println!("questions: {}", questions.len());
    for category in store.categories() {
        let n = questions.iter().filter(|q| q.category() == category).count();
        println!("  {category}: {n}");
    }
    for difficulty in Difficulty::ALL {
        let n = questions
            .iter()
            .filter(|q| q.difficulty() == difficulty)
            .count();
        println!("  {difficulty}: {n}");
    }
    for kind in QuestionType::ALL {
        let n = questions
            .iter()
            .filter(|q| q.question_type() == kind)
            .count();
        if n > 0 {
            println!("  {kind}: {n}");
        }
    }
    println!("saved configs: {}", store.available_sessions().len());
}

fn print_configs(store: &QuizStore) {
    if store.available_sessions().is_empty() {
        println!("no saved session configs");
        return;
    }
    for config in store.available_sessions() {
        println!(
            "{}  {}  category={} difficulty={} size={} random={} available={}",
            config.id(),
            config.name(),
            config.category_filter().unwrap_or("all"),
            config.difficulty_filter().map_or("all", Difficulty::as_str),
            config.questions_per_session(),
            config.randomize_questions(),
            store.available_count(config)
        );
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let argv: Vec<String> = std::env::args().skip(1).collect();
    let parsed = match Args::parse(argv) {
        Ok(Some(parsed)) => parsed,
        Ok(None) => {
            print_usage();
            return Ok(());
        }
        Err(e) => {
            eprintln!("{e}");
            print_usage();
            return Err(e.into());
        }
    };

    init_tracing();

    // Validation is pure; it never opens the database.
    if let Command::Validate { file } = &parsed.command {
        let text = std::fs::read_to_string(file)?;
        let report = validate_questions_json(&text, Clock::system().now());
        if report.is_valid() {
            println!(
                "{file}: {} valid question(s)",
                report.questions().map_or(0, <[_]>::len)
            );
            return Ok(());
        }
        eprintln!("{file}: invalid");
        print_validation_errors(report.errors());
        return Err(InvalidQuestionSet {
            errors: report.errors().len(),
        }
        .into());
    }

    tracing::debug!(db_url = %parsed.db_url, "opening database");
    prepare_sqlite_file(&parsed.db_url)?;
    let services = AppServices::new_sqlite(&parsed.db_url, Clock::system()).await?;
    let mut store = services.into_store();

    match parsed.command {
        Command::Validate { .. } => Ok(()),
        Command::Import { file } => {
            let text = std::fs::read_to_string(&file)?;
            import_text(&mut store, &text).await
        }
        Command::Seed => import_text(&mut store, SAMPLE_QUESTIONS).await,
        Command::Stats => {
            print_stats(&store);
            Ok(())
        }
        Command::Configs => {
            print_configs(&store);
            Ok(())
        }
        Command::ConfigAdd(draft) => {
            let config = store.create_session_config(draft).await?;
            println!(
                "saved config {} ({} question(s) available)",
                config.id(),
                store.available_count(&config)
            );
            Ok(())
        }
        Command::ConfigRm { id } => {
            if store.delete_session_config(&id).await {
                println!("removed config {id}");
            } else {
                println!("no config with id {id}");
            }
            Ok(())
        }
        Command::Play { config } => {
            let config = match config {
                Some(id) => store.load_session_config(&id)?.clone(),
                None => store
                    .available_sessions()
                    .first()
                    .cloned()
                    .ok_or("no saved session configs; create one with config-add")?,
            };
            if store.start_session(config, None).is_empty() {
                println!("no questions match this config");
                return Ok(());
            }
            play::run(&mut store, io::stdin().lock(), io::stdout().lock())
        }
        Command::Clear => {
            store.clear_questions().await;
            println!("question pool cleared");
            Ok(())
        }
    }
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        // At this layer (binary glue), printing once is fine.
        eprintln!("{err}");
        std::process::exit(2);
    }
}
