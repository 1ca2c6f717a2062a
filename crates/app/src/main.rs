use std::fmt;
use std::net::SocketAddr;

use api::{AppState, CorsConfig};
use chrono::Duration;
use services::{AppServices, Clock, TokenConfig};
use storage::sqlite::SqliteRepository;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

const DEFAULT_DB_URL: &str = "sqlite://dev.sqlite3";
const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8001";

#[derive(Debug, PartialEq, Eq)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidDbUrl { raw: String },
    InvalidBindAddr { raw: String },
    InvalidSecret,
    InvalidNumber { name: &'static str, raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
            ArgsError::InvalidBindAddr { raw } => write!(f, "invalid --bind value: {raw}"),
            ArgsError::InvalidSecret => write!(f, "--jwt-secret cannot be empty"),
            ArgsError::InvalidNumber { name, raw } => {
                write!(f, "{name} must be a positive integer, got {raw}")
            }
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
    eprintln!("  cargo run -p app -- [serve]  [--db <sqlite_url>] [--bind <addr>] [--jwt-secret <s>]");
    eprintln!("                               [--cors-origins <origin,origin>]");
    eprintln!("  cargo run -p app -- migrate  [--db <sqlite_url>]");
    eprintln!();
    eprintln!("Defaults:");
    eprintln!("  --db {DEFAULT_DB_URL}");
    eprintln!("  --bind {DEFAULT_BIND_ADDR}");
    eprintln!("  --jwt-secret random per process");
    eprintln!("  --cors-origins {}", api::cors::DEFAULT_ALLOWED_ORIGIN);
    eprintln!();
    eprintln!("Environment (flags win, .env is read if present):");
    eprintln!("  LEARN_DB_URL, LEARN_BIND_ADDR, LEARN_JWT_SECRET, LEARN_CORS_ORIGINS,");
    eprintln!("  LEARN_ACCESS_TOKEN_MINUTES (30), LEARN_REFRESH_TOKEN_DAYS (1), RUST_LOG (info)");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Serve,
    Migrate,
}

impl Command {
    fn from_arg(arg: &str) -> Option<Self> {
        match arg {
            "serve" => Some(Self::Serve),
            "migrate" => Some(Self::Migrate),
            _ => None,
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
struct Args {
    db_url: String,
    bind: SocketAddr,
    jwt_secret: Option<String>,
    access_minutes: i64,
    refresh_days: i64,
    cors: CorsConfig,
}

fn positive(name: &'static str, raw: String) -> Result<i64, ArgsError> {
    match raw.trim().parse::<i64>() {
        Ok(value) if value > 0 => Ok(value),
        _ => Err(ArgsError::InvalidNumber { name, raw }),
    }
}

fn parse_bind(raw: String) -> Result<SocketAddr, ArgsError> {
    raw.trim()
        .parse()
        .map_err(|_| ArgsError::InvalidBindAddr { raw })
}

impl Args {
    /// Flags from `args` override values looked up through `env`.
    fn parse(
        args: &mut impl Iterator<Item = String>,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ArgsError> {
        let mut db_url = env("LEARN_DB_URL")
            .map_or_else(|| DEFAULT_DB_URL.into(), normalize_sqlite_url);
        let mut bind = parse_bind(env("LEARN_BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.into()))?;
        let mut jwt_secret = env("LEARN_JWT_SECRET").filter(|s| !s.trim().is_empty());
        let access_minutes = env("LEARN_ACCESS_TOKEN_MINUTES")
            .map(|raw| positive("LEARN_ACCESS_TOKEN_MINUTES", raw))
            .transpose()?
            .unwrap_or(services::tokens::DEFAULT_ACCESS_TTL_MINUTES);
        let refresh_days = env("LEARN_REFRESH_TOKEN_DAYS")
            .map(|raw| positive("LEARN_REFRESH_TOKEN_DAYS", raw))
            .transpose()?
            .unwrap_or(services::tokens::DEFAULT_REFRESH_TTL_DAYS);
        let mut cors = CorsConfig::from_config_value(env("LEARN_CORS_ORIGINS").as_deref());

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    db_url = normalize_sqlite_url(value);
                }
                "--bind" => {
                    bind = parse_bind(require_value(args, "--bind")?)?;
                }
                "--jwt-secret" => {
                    let value = require_value(args, "--jwt-secret")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidSecret);
                    }
                    jwt_secret = Some(value);
                }
                "--cors-origins" => {
                    let value = require_value(args, "--cors-origins")?;
                    cors = CorsConfig::from_config_value(Some(&value));
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
            bind,
            jwt_secret,
            access_minutes,
            refresh_days,
            cors,
        })
    }

    fn token_config(&self) -> TokenConfig {
        let secret = self.jwt_secret.clone().unwrap_or_else(|| {
            warn!("LEARN_JWT_SECRET is not set; using a random secret, tokens will not survive a restart");
            format!("{}{}", Uuid::new_v4().simple(), Uuid::new_v4().simple())
        });
        TokenConfig::new(secret).with_ttls(
            Duration::minutes(self.access_minutes),
            Duration::days(self.refresh_days),
        )
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
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(error = %err, "could not listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutting down");
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let mut argv: Vec<String> = std::env::args().skip(1).collect();

    let cmd = match argv.first().map(String::as_str) {
        None => Command::Serve,
        Some("--help" | "-h") => {
            print_usage();
            return Ok(());
        }
        Some(first) if first.starts_with("--") => Command::Serve,
        Some(first) => Command::from_arg(first).ok_or_else(|| {
            eprintln!("unknown subcommand: {first}");
            print_usage();
            std::io::Error::new(std::io::ErrorKind::InvalidInput, "unknown subcommand")
        })?,
    };
    if !argv.is_empty() && !argv[0].starts_with("--") {
        argv.remove(0);
    }

    let parsed = Args::parse(&mut argv.into_iter(), |name| std::env::var(name).ok()).map_err(
        |e| {
            eprintln!("{e}");
            print_usage();
            e
        },
    )?;

    prepare_sqlite_file(&parsed.db_url)?;

    match cmd {
        Command::Migrate => {
            let repo = SqliteRepository::connect(&parsed.db_url).await?;
            repo.migrate().await?;
            info!(db = %parsed.db_url, "database migrated");
            Ok(())
        }
        Command::Serve => {
            let services =
                AppServices::new_sqlite(&parsed.db_url, Clock::system(), parsed.token_config())
                    .await?;
            let app = api::router(AppState::new(services).with_cors(parsed.cors.clone()));

            let listener = TcpListener::bind(parsed.bind).await?;
            info!(addr = %listener.local_addr()?, db = %parsed.db_url, "listening");
            axum::serve(listener, app)
                .with_graceful_shutdown(shutdown_signal())
                .await?;
            Ok(())
        }
    }
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    init_tracing();

    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str], env: &[(&str, &str)]) -> Result<Args, ArgsError> {
        let mut iter = args.iter().map(|s| (*s).to_string());
        let env: Vec<(String, String)> = env
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        Args::parse(&mut iter, |name| {
            env.iter().find(|(k, _)| k == name).map(|(_, v)| v.clone())
        })
    }

    #[test]
    fn defaults_apply_without_env_or_flags() {
        let args = parse(&[], &[]).unwrap();
        assert_eq!(args.db_url, DEFAULT_DB_URL);
        assert_eq!(args.bind, DEFAULT_BIND_ADDR.parse().unwrap());
        assert_eq!(args.jwt_secret, None);
        assert_eq!(args.access_minutes, 30);
        assert_eq!(args.refresh_days, 1);
        assert_eq!(args.cors, CorsConfig::default());
    }

    #[test]
    fn cors_origins_come_from_env_or_flag() {
        let args = parse(&[], &[("LEARN_CORS_ORIGINS", "https://a.example, https://b.example")])
            .unwrap();
        assert_eq!(
            args.cors.allowed_origins,
            ["https://a.example", "https://b.example"]
        );

        let args = parse(
            &["--cors-origins", "https://flag.example"],
            &[("LEARN_CORS_ORIGINS", "https://env.example")],
        )
        .unwrap();
        assert_eq!(args.cors.allowed_origins, ["https://flag.example"]);
    }

    #[test]
    fn flags_override_env() {
        let args = parse(
            &["--bind", "0.0.0.0:9000", "--jwt-secret", "flag"],
            &[
                ("LEARN_BIND_ADDR", "127.0.0.1:1234"),
                ("LEARN_JWT_SECRET", "env"),
                ("LEARN_ACCESS_TOKEN_MINUTES", "5"),
            ],
        )
        .unwrap();
        assert_eq!(args.bind, "0.0.0.0:9000".parse().unwrap());
        assert_eq!(args.jwt_secret.as_deref(), Some("flag"));
        assert_eq!(args.access_minutes, 5);
    }

    #[test]
    fn rejects_bad_values() {
        assert_eq!(
            parse(&["--bind", "nowhere"], &[]),
            Err(ArgsError::InvalidBindAddr {
                raw: "nowhere".into()
            })
        );
        assert_eq!(
            parse(&["--db"], &[]),
            Err(ArgsError::MissingValue { flag: "--db" })
        );
        assert!(matches!(
            parse(&[], &[("LEARN_REFRESH_TOKEN_DAYS", "0")]),
            Err(ArgsError::InvalidNumber { .. })
        ));
        assert_eq!(
            parse(&["--verbose"], &[]),
            Err(ArgsError::UnknownArg("--verbose".into()))
        );
    }

    #[test]
    fn relative_sqlite_paths_become_absolute() {
        let url = normalize_sqlite_url("sqlite:data/app.sqlite3".into());
        assert!(url.starts_with("sqlite:///"));
        assert!(url.ends_with("data/app.sqlite3"));
        assert_eq!(normalize_sqlite_url("sqlite::memory:".into()), "sqlite::memory:");
    }
}
