use std::fmt;
use std::path::PathBuf;

use academy_core::model::CourseDraft;
use storage::repository::Storage;

#[derive(Debug, Clone)]
struct Args {
    db_url: String,
    file: Option<PathBuf>,
    times: u32,
}

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidDbUrl { raw: String },
    InvalidTimes { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
            ArgsError::InvalidTimes { raw } => write!(f, "invalid --times value: {raw}"),
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
            std::env::var("LEARN_DB_URL").unwrap_or_else(|_| "sqlite:dev.sqlite3".into());
        let mut file = std::env::var("LEARN_SEED_FILE").ok().map(PathBuf::from);
        let mut times = 1;

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
                "--file" => {
                    file = Some(PathBuf::from(require_value(&mut args, "--file")?));
                }
                "--times" => {
                    let value = require_value(&mut args, "--times")?;
                    times = value
                        .parse::<u32>()
                        .map_err(|_| ArgsError::InvalidTimes { raw: value.clone() })?;
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
            file,
            times,
        })
    }
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p storage --bin seed -- [options]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --db <sqlite_url>         SQLite URL (default: sqlite:dev.sqlite3)");
    eprintln!("  --file <path>             Course draft as JSON (default: built-in sample)");
    eprintln!("  --times <n>               Import the draft n times (default: 1)");
    eprintln!("  -h, --help                Show this help");
    eprintln!();
    eprintln!("Environment (same as flags):");
    eprintln!("  LEARN_DB_URL, LEARN_SEED_FILE");
}

const SAMPLE_COURSE: &str = r#"{
    "title": "Rust Basics",
    "description": "Ownership, borrowing and error handling in small steps.",
    "quiz": {
        "title": "Rust Basics final quiz",
        "questions": [
            {
                "text": "Which keyword makes a binding mutable?",
                "answers": [
                    { "text": "mut", "is_correct": true },
                    { "text": "var" },
                    { "text": "let" }
                ]
            }
        ]
    },
    "chapters": [
        {
            "title": "Ownership",
            "quiz": {
                "title": "Ownership check",
                "questions": [
                    {
                        "text": "How many owners can a value have at a time?",
                        "answers": [
                            { "text": "One", "is_correct": true },
                            { "text": "Any number" }
                        ]
                    }
                ]
            },
            "topics": [
                {
                    "title": "Moves",
                    "video_url": "https://example.com/videos/moves",
                    "article_content": "Assigning a non-Copy value moves it.",
                    "quiz": {
                        "title": "Moves quiz",
                        "questions": [
                            {
                                "text": "Is String Copy?",
                                "answers": [
                                    { "text": "No", "is_correct": true },
                                    { "text": "Yes" }
                                ]
                            }
                        ]
                    }
                },
                {
                    "title": "Borrowing",
                    "article_content": "Shared references are read-only; one mutable reference at a time.",
                    "game": {
                        "title": "Match the reference",
                        "pairs": [
                            { "item_a": "&T", "item_b": "shared borrow" },
                            { "item_a": "&mut T", "item_b": "exclusive borrow" }
                        ]
                    }
                }
            ]
        },
        {
            "title": "Errors",
            "topics": [
                { "title": "Result and ?" },
                { "title": "Panics" }
            ]
        }
    ]
}"#;

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse().map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    let raw = match &args.file {
        Some(path) => std::fs::read_to_string(path)?,
        None => SAMPLE_COURSE.to_owned(),
    };
    let draft: CourseDraft = serde_json::from_str(&raw)?;
    draft.validate()?;

    let storage = Storage::sqlite(&args.db_url).await?;

    for _ in 0..args.times {
        let course_id = storage.catalog.import_course(&draft).await?;
        println!(
            "Imported course {} ({}) into {}",
            course_id.value(),
            draft.title,
            args.db_url
        );
    }

    Ok(())
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}
