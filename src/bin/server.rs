use std::{env, fs::OpenOptions, net::SocketAddr, path::PathBuf, process::ExitCode, sync::Arc};

use axum::{
    Router,
    extract::{MatchedPath, Request},
    middleware,
};
use axum_server::Handle;
use clap::{Parser, ValueEnum};
use rusqlite::Connection;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{Layer, filter, layer::SubscriberExt, util::SubscriberInitExt};

use ledger_rs::{
    AppState, DEFAULT_REPORT_FONT_FAMILY, MemoryStorage, ReportFonts, SQLiteStorage, Storage,
    build_router, graceful_shutdown, logging_middleware,
};

/// Where the server keeps users and expenses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum StorageKind {
    /// Keep everything in memory. Data is lost when the server stops.
    Memory,
    /// Keep everything in the SQLite database at `--db-path`.
    Sqlite,
}

/// The REST API server for ledger_rs.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// The storage backend to use.
    #[arg(long, value_enum, default_value_t = StorageKind::Sqlite)]
    storage: StorageKind,

    /// File path to the application SQLite database. Required for SQLite storage.
    #[arg(long, required_if_eq("storage", "sqlite"))]
    db_path: Option<PathBuf>,

    /// The port to serve the API from.
    #[arg(short, long, default_value_t = 3000)]
    port: u16,

    /// Directory with the TTF files used to render PDF reports.
    #[arg(long)]
    report_fonts_dir: Option<PathBuf>,

    /// The font family in `--report-fonts-dir`, i.e. the files are named
    /// `{family}-Regular.ttf`, `{family}-Bold.ttf` and so on.
    #[arg(long, default_value = DEFAULT_REPORT_FONT_FAMILY)]
    report_font_family: String,
}

#[tokio::main]
async fn main() -> ExitCode {
    if let Err(error) = setup_logging() {
        eprintln!("Could not set up logging: {error}");
        return ExitCode::FAILURE;
    }

    let args = Args::parse();

    let Ok(secret) = env::var("SECRET") else {
        tracing::error!("The environment variable 'SECRET' must be set");
        return ExitCode::FAILURE;
    };

    let result = match args.storage {
        StorageKind::Memory => {
            tracing::info!("Using in-memory storage, data will be lost on shutdown");
            serve(MemoryStorage::new(), &secret, &args).await
        }
        StorageKind::Sqlite => match open_sqlite_storage(args.db_path.as_deref()) {
            Ok(storage) => serve(storage, &secret, &args).await,
            Err(error) => Err(error),
        },
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            tracing::error!("{error}");
            ExitCode::FAILURE
        }
    }
}

fn open_sqlite_storage(db_path: Option<&std::path::Path>) -> Result<SQLiteStorage, String> {
    let db_path = db_path.ok_or("--db-path is required for SQLite storage")?;

    let connection = Connection::open(db_path)
        .map_err(|error| format!("Could not open database {}: {error}", db_path.display()))?;

    SQLiteStorage::new(connection)
        .map_err(|error| format!("Could not initialize database {}: {error}", db_path.display()))
}

async fn serve<S>(storage: S, secret: &str, args: &Args) -> Result<(), String>
where
    S: Storage,
{
    let mut state = AppState::new(storage, secret);
    match &args.report_fonts_dir {
        Some(fonts_dir) => {
            state = state.with_report_fonts(ReportFonts::new(fonts_dir, &args.report_font_family))
        }
        None => tracing::warn!("No --report-fonts-dir given, PDF reports are disabled"),
    }

    let addr = SocketAddr::from(([127, 0, 0, 1], args.port));
    let handle = Handle::new();
    tokio::spawn(graceful_shutdown(handle.clone()));

    let router = build_router(state).layer(middleware::from_fn(logging_middleware));
    let router = add_tracing_layer(router);

    tracing::info!("HTTP server listening on {}", addr);
    axum_server::bind(addr)
        .handle(handle)
        .serve(router.into_make_service())
        .await
        .map_err(|error| format!("Server error: {error}"))
}

fn setup_logging() -> std::io::Result<()> {
    let stdout_log = tracing_subscriber::fmt::layer().pretty();

    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open("debug.log")?;

    let debug_log = tracing_subscriber::fmt::layer()
        .pretty()
        .with_writer(Arc::new(log_file));

    tracing_subscriber::registry()
        .with(
            stdout_log
                .with_filter(filter::LevelFilter::INFO)
                .and_then(debug_log)
                .with_filter(filter::LevelFilter::DEBUG),
        )
        .init();

    Ok(())
}

fn add_tracing_layer(router: Router) -> Router {
    let tracing_layer = TraceLayer::new_for_http()
        .make_span_with(|req: &Request| {
            let method = req.method();
            let uri = req.uri();

            let matched_path = req
                .extensions()
                .get::<MatchedPath>()
                .map(|matched_path| matched_path.as_str());

            tracing::debug_span!("request", %method, %uri, matched_path)
        })
        // Errors are logged where they are turned into responses.
        .on_failure(());

    router.layer(tracing_layer)
}
