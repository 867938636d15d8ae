//! `punishtrack` command-line entry point.

use clap::Parser;
use tokio_util::sync::CancellationToken;

use punishtrack::cli::args::Cli;
use punishtrack::cli::commands;
use punishtrack::error::{ConfigError, ExitCode, PunishTrackError};
use punishtrack::observability::init_logging;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.log_format.into(), cli.verbose, cli.quiet, cli.color);

    let cancel = CancellationToken::new();
    tokio::spawn(shutdown_on_signal(cancel.clone()));

    match commands::dispatch(cli, cancel).await {
        Ok(()) => std::process::exit(ExitCode::SUCCESS),
        Err(e) => {
            eprintln!("error: {e}");
            if let PunishTrackError::Config(ConfigError::ValidationError { errors, .. }) = &e {
                for issue in errors {
                    eprintln!("  {issue}");
                }
            }
            std::process::exit(e.exit_code());
        }
    }
}

/// First Ctrl-C/SIGTERM stops the tracker gracefully; a second one exits.
async fn shutdown_on_signal(cancel: CancellationToken) {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        let Ok(mut sigterm) = signal(SignalKind::terminate()) else {
            tracing::warn!("failed to register SIGTERM handler");
            let _ = tokio::signal::ctrl_c().await;
            cancel.cancel();
            return;
        };

        tokio::select! {
            _ = tokio::signal::ctrl_c() => {}
            _ = sigterm.recv() => {}
        }
        tracing::info!("shutting down (signal again to force)");
        cancel.cancel();

        tokio::select! {
            _ = tokio::signal::ctrl_c() => std::process::exit(ExitCode::INTERRUPTED),
            _ = sigterm.recv() => std::process::exit(ExitCode::TERMINATED),
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
        cancel.cancel();
        let _ = tokio::signal::ctrl_c().await;
        std::process::exit(ExitCode::INTERRUPTED);
    }
}
