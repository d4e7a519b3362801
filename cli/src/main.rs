use agentbox_cli::commands::{cli, task};
use agentbox_cli::http;
use agentbox_core::api::{AppConfig, CliError, LoggingConfig};
use clap::Parser;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

static LOG_GUARD: std::sync::OnceLock<tracing_appender::non_blocking::WorkerGuard> =
    std::sync::OnceLock::new();

#[tokio::main]
async fn main() {
    let exit = match real_main().await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{e}");
            exit_code_for_error(&e)
        }
    };

    std::process::exit(exit);
}

async fn real_main() -> Result<i32, CliError> {
    let args = cli::Args::parse();
    let cfg = load_config(&args)?;
    init_tracing(&cfg.logging).map_err(CliError::Command)?;
    tracing::debug!(tasks_dir = %cfg.tasks_root().display(), "configuration loaded");

    match args.command {
        cli::Commands::Serve(serve_args) => {
            http::handle_serve(serve_args, &cfg).await?;
            Ok(0)
        }
        cli::Commands::Run(run_args) => task::handle_run(run_args, &cfg).await,
        cli::Commands::Status(id_args) => task::handle_status(id_args, &cfg).await,
        cli::Commands::Logs(id_args) => task::handle_logs(id_args, &cfg).await,
        cli::Commands::List(list_args) => task::handle_list(list_args, &cfg).await,
    }
}

fn load_config(args: &cli::Args) -> Result<AppConfig, CliError> {
    let mut cfg = match &args.config {
        Some(path) => agentbox_core::api::load_from_path(path),
        None => agentbox_core::api::load_default(),
    }
    .map_err(|e| CliError::Config(e.to_string()))?;

    if let Some(dir) = &args.tasks_dir {
        cfg.tasks_dir = Some(dir.to_string_lossy().to_string());
    }
    Ok(cfg)
}

fn exit_code_for_error(e: &CliError) -> i32 {
    // 0: success (run: 1 = steps failed, 2 = task failed)
    // 11: config error
    // 12: rejected task definition
    // 13: task not found
    // 20: storage / IO error
    // 50: internal/uncategorized
    match e {
        CliError::Config(_) => 11,
        CliError::Submit(se) if se.is_validation() => 12,
        CliError::Submit(_) => 20,
        CliError::NotFound(_) => 13,
        CliError::Store(_) => 20,
        CliError::Io(_) => 20,
        CliError::Command(_) => 20,
        CliError::Anyhow(_) => 50,
    }
}

fn init_tracing(logging: &LoggingConfig) -> Result<(), String> {
    if !logging.enabled {
        return Ok(());
    }

    let filter = match std::env::var("RUST_LOG") {
        Ok(v) if !v.trim().is_empty() => EnvFilter::from_default_env(),
        _ => EnvFilter::try_new(logging.level.clone()).map_err(|e| e.to_string())?,
    };

    let mut maybe_writer = None;

    if logging.file {
        let dir = match logging
            .directory
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
        {
            Some(d) => std::path::PathBuf::from(d),
            None => std::env::temp_dir().join("agentbox"),
        };

        std::fs::create_dir_all(&dir).map_err(|e| format!("create log dir failed: {e}"))?;
        let file_name = format!("agentbox.{}.log", std::process::id());
        let appender = tracing_appender::rolling::never(dir, file_name);
        let (non_blocking, guard) = tracing_appender::non_blocking(appender);
        let _ = LOG_GUARD.set(guard);
        maybe_writer = Some(non_blocking);
    }

    if !logging.console && maybe_writer.is_none() {
        return Err("logging disabled for both console and file".to_string());
    }

    let console_layer = logging.console.then(|| {
        tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_ansi(atty::is(atty::Stream::Stderr))
    });

    let file_layer = maybe_writer.map(|w| {
        tracing_subscriber::fmt::layer()
            .with_writer(w)
            .with_ansi(false)
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .with(file_layer)
        .init();

    Ok(())
}
