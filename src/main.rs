use anyhow::Result;
use clap::Parser;
use std::io::Write;
use std::process::ExitCode;

mod cli;
mod config;
mod error;
mod indexer;
mod launcher;
mod picker;
mod selector;
mod target;
mod tmux;

#[cfg(test)]
mod testing;

use cli::Cli;
use config::Config;
use indexer::FsIndexer;
use launcher::LaunchContext;
use picker::ConfiguredPicker;
use selector::{InvocationMode, Selection, Selector};
use tmux::{SessionController, TmuxClient};

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging; stderr keeps list output on stdout clean
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(cli.log_level().into()),
        )
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("muxpick: {:#}", e);
            ExitCode::from(error::exit_code_for(&e))
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = Config::load(cli.config.as_deref())?;

    let mode = if cli.list {
        InvocationMode::List
    } else {
        InvocationMode::from_env(!cli.args.is_empty())
    };

    let tmux_client = TmuxClient::with_binary(config.tmux.0.as_str());
    let indexer = FsIndexer::new(&config.index);
    let picker = ConfiguredPicker::from_config(&config.picker);
    let selector =
        Selector::new(mode, &tmux_client, &indexer, &picker).with_ambiguity(config.ambiguity);

    let target = match selector.select(&cli.args).await? {
        Selection::Candidates(lines) => return print_candidates(&lines),
        Selection::Target(target) => target,
    };

    if target.is_cancelled() {
        tracing::info!("Selection cancelled");
        return Ok(());
    }

    tracing::info!(
        session = %target.name,
        existing = target.is_session_only(),
        "Resolved target"
    );

    let ctx = LaunchContext::detect(mode);
    let controller = SessionController::new(&tmux_client, &config.bootstrap);
    let command = controller.prepare(&target, ctx.inside_client).await?;
    tracing::info!(
        session = %command.session,
        created = command.created,
        kind = ?command.kind,
        "Session ready"
    );

    let dispatch = launcher::plan(ctx, &command, &config.launcher);
    launcher::dispatch(&dispatch).await
}

fn print_candidates(lines: &[String]) -> Result<()> {
    let mut out = std::io::stdout().lock();
    for line in lines {
        if let Err(e) = writeln!(out, "{}", line) {
            // Reader went away (e.g. `muxpick --list | head`)
            if e.kind() == std::io::ErrorKind::BrokenPipe {
                return Ok(());
            }
            return Err(e.into());
        }
    }
    out.flush()?;
    Ok(())
}
