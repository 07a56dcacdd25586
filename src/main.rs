use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use paydrift::api::{ApiError, DatasetType, HttpDriftApi, UploadFile};
use paydrift::config::{ClientConfig, ConfigError};
use paydrift::error::{ErrorCode, SessionError};
use paydrift::model::CategoryKey;
use paydrift::render::render;
use paydrift::session::Session;
use tracing::{error, info, warn};

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ErrorCode for CliError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Config(_) => "E_CONFIG",
            Self::Api(e) => e.error_code(),
            Self::Session(e) => e.error_code(),
            Self::Read { .. } => "E_READ",
        }
    }

    fn retryable(&self) -> bool {
        match self {
            Self::Api(e) => e.retryable(),
            Self::Session(e) => e.retryable(),
            _ => false,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "paydrift", about = "Spend drift dashboard and AI analyst")]
struct Cli {
    /// Overrides `PAYDRIFT_API_URL`.
    #[arg(long)]
    base_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Backend liveness and loaded datasets.
    Health,
    /// Restore the backend's demo datasets.
    Reset,
    /// Load data and print the dashboard.
    Dashboard(DashboardArgs),
}

#[derive(Args, Debug)]
struct DashboardArgs {
    /// Use the backend's demo data instead of uploading files.
    #[arg(long, conflicts_with_all = ["payroll", "ai_costs", "saas_cloud"])]
    demo: bool,

    #[arg(long, required_unless_present = "demo")]
    payroll: Option<PathBuf>,

    #[arg(long, required_unless_present = "demo")]
    ai_costs: Option<PathBuf>,

    #[arg(long, required_unless_present = "demo")]
    saas_cloud: Option<PathBuf>,

    /// people, ai_llm or saas_cloud.
    #[arg(long)]
    tab: Option<CategoryKey>,

    /// Request the narrative analysis (seeds the chat).
    #[arg(long, default_value_t = false)]
    analyze: bool,

    /// Chat message; repeat to send several in order.
    #[arg(long)]
    ask: Vec<String>,

    /// Compare a month (YYYY-MM) with the one before it.
    #[arg(long)]
    compare: Option<String>,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(code = e.error_code(), retryable = e.retryable(), "{e}");
            eprintln!("{}: {e}", e.error_code());
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let mut config = ClientConfig::from_env()?;
    if let Some(base_url) = &cli.base_url {
        config = config.with_base_url(base_url);
    }
    info!(base_url = %config.base_url, environment = ?config.environment, "client configured");
    let session = Session::new(Arc::new(HttpDriftApi::new(&config)?));

    match cli.command {
        Command::Health => {
            let health = session.health().await?;
            println!("{} (datasets: {})", health.status, health.datasets_loaded.join(", "));
            Ok(())
        }
        Command::Reset => {
            session.reset().await?;
            println!("demo data restored");
            Ok(())
        }
        Command::Dashboard(args) => run_dashboard(&session, args).await,
    }
}

async fn run_dashboard(session: &Session, args: DashboardArgs) -> Result<(), CliError> {
    let loaded = if args.demo {
        session.load_demo().await
    } else {
        let files = [
            (DatasetType::Payroll, args.payroll),
            (DatasetType::AiCosts, args.ai_costs),
            (DatasetType::SaasCloud, args.saas_cloud),
        ];
        for (dataset_type, path) in files {
            let Some(path) = path else { continue };
            session.select_file(dataset_type, read_upload(&path).await?)?;
        }
        session.upload_and_load().await
    };
    if let Err(e) = loaded {
        println!("{}", session.read(render));
        return Err(e.into());
    }

    if let Some(tab) = args.tab {
        session.select_tab(tab)?;
    }
    if args.analyze {
        if let Err(e) = session.analyze().await {
            warn!(error = %e, "analysis unavailable");
        }
    }
    for message in &args.ask {
        session.send_chat(message).await?;
    }
    if let Some(month) = &args.compare {
        if let Err(e) = session.compare_month(month).await {
            warn!(error = %e, code = e.error_code(), "comparison unavailable");
        }
    }

    println!("{}", session.read(render));
    Ok(())
}

async fn read_upload(path: &Path) -> Result<UploadFile, CliError> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|source| CliError::Read { path: path.to_path_buf(), source })?;
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    Ok(UploadFile::new(file_name, bytes))
}
