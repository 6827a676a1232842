use std::{path::PathBuf, sync::Arc};

use chrono::{DateTime, Utc};
use clap::Parser;
use huddle_lifecycle::{cleanup, config::LifecycleConfig, db::DbPool, observability};

#[derive(Parser, Debug)]
#[command(version, about = "Huddle lifecycle and cleanup service", long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Option<Command>,

    /// Path to config file (defaults to ./huddle-lifecycle.toml if it exists,
    /// otherwise built-in defaults are used)
    #[arg(short, long, global = true)]
    config: Option<String>,
}

#[derive(clap::Subcommand, Debug)]
enum Command {
    /// Start the scheduled cleanup worker (default)
    Run,
    /// Run database migrations and exit
    ///
    /// Useful for init containers or CI/CD pipelines. Connects to the
    /// database, runs any pending migrations, and exits.
    Migrate,
    /// Show counts of withdrawn and erasable accounts and exit
    Status,
    /// Erase every account whose deletion deadline is before a cutoff
    Purge {
        /// Cutoff as an RFC 3339 timestamp (defaults to now)
        #[arg(long)]
        before: Option<String>,
    },
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    match args.command {
        Some(Command::Migrate) => {
            run_migrate(args.config.as_deref()).await;
        }
        Some(Command::Status) => {
            run_status(args.config.as_deref()).await;
        }
        Some(Command::Purge { before }) => {
            run_purge(args.config.as_deref(), before).await;
        }
        Some(Command::Run) | None => {
            run_worker(args.config.as_deref()).await;
        }
    }
}

/// Load configuration from the explicit path, or from ./huddle-lifecycle.toml
/// when present, or fall back to built-in defaults.
fn load_config(explicit_path: Option<&str>) -> LifecycleConfig {
    let path = explicit_path
        .map(PathBuf::from)
        .or_else(|| {
            let default = PathBuf::from("huddle-lifecycle.toml");
            default.exists().then_some(default)
        });

    match path {
        Some(path) => match LifecycleConfig::from_file(&path) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("Failed to load config from {}: {}", path.display(), e);
                std::process::exit(1);
            }
        },
        None => LifecycleConfig::default(),
    }
}

async fn connect(config: &LifecycleConfig) -> Arc<DbPool> {
    let pool = match DbPool::from_config(&config.database).await {
        Ok(pool) => pool,
        Err(e) => {
            eprintln!("Failed to connect to database: {}", e);
            std::process::exit(1);
        }
    };
    if let Err(e) = pool.run_migrations().await {
        eprintln!("Failed to run migrations: {}", e);
        std::process::exit(1);
    }
    Arc::new(pool)
}

/// Run the scheduled cleanup worker until interrupted.
async fn run_worker(explicit_config_path: Option<&str>) {
    let config = load_config(explicit_config_path);

    observability::init_tracing(&config.logging);
    if let Err(e) = observability::metrics::init_metrics() {
        tracing::warn!(error = %e, "Failed to initialize metrics");
    }

    tracing::info!(
        database = %config.database.path,
        "Starting Huddle lifecycle service"
    );

    let db = connect(&config).await;

    let worker = tokio::spawn(cleanup::start_cleanup_worker(db, config.cleanup));

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Shutdown signal received, stopping");
        }
        _ = worker => {
            tracing::info!("Cleanup worker exited");
        }
    }
}

async fn run_migrate(explicit_config_path: Option<&str>) {
    let config = load_config(explicit_config_path);
    observability::init_tracing(&config.logging);

    let _db = connect(&config).await;
    tracing::info!("Migrations complete");
}

async fn run_status(explicit_config_path: Option<&str>) {
    let config = load_config(explicit_config_path);
    observability::init_tracing(&config.logging);

    let db = connect(&config).await;
    match cleanup::pending_counts(&db, Utc::now()).await {
        Ok(counts) => {
            println!("withdrawn (inside grace period): {}", counts.withdrawn);
            println!("erasable (grace period elapsed): {}", counts.erasable);
        }
        Err(e) => {
            eprintln!("Failed to query account counts: {}", e);
            std::process::exit(1);
        }
    }
}

async fn run_purge(explicit_config_path: Option<&str>, before: Option<String>) {
    let config = load_config(explicit_config_path);
    observability::init_tracing(&config.logging);

    let cutoff = match before {
        Some(raw) => match DateTime::parse_from_rfc3339(&raw) {
            Ok(ts) => ts.with_timezone(&Utc),
            Err(e) => {
                eprintln!("Invalid --before timestamp {:?}: {}", raw, e);
                std::process::exit(1);
            }
        },
        None => Utc::now(),
    };

    let db = connect(&config).await;
    match cleanup::purge_before(&db, &config.cleanup, cutoff).await {
        Ok(result) => {
            if config.cleanup.safety.dry_run {
                println!("dry run: {} account(s) would be erased", result.accounts_erased);
            } else {
                println!(
                    "erased {} account(s), {} failure(s), {} related row(s) removed",
                    result.accounts_erased,
                    result.accounts_failed,
                    result.related_rows()
                );
            }
        }
        Err(e) => {
            eprintln!("Purge failed: {}", e);
            std::process::exit(1);
        }
    }
}
