mod dry_run;

use anyhow::Context;
use clap::Parser;
use maestro_core::{EngineConfig, EngineHandles, Orchestrator, StatusEvent};
use std::io::BufRead;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "maestro", about = "Drive the target DAW from plain-text commands")]
struct Args {
    /// Command text, e.g. "set tempo 128". Omit when using --stdin.
    command: Option<String>,

    /// Read commands line by line from stdin; each one runs to
    /// completion before the next is read. "quit" or "exit" stops.
    #[arg(long)]
    stdin: bool,

    /// Launch the target application when it is not already running.
    #[arg(long)]
    launch: bool,

    /// JSON file overriding the default timing configuration.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Run against an in-memory fake target instead of the live one.
    #[arg(long)]
    dry_run: bool,

    /// Bundle id used to launch and activate the target.
    #[arg(long, default_value = "com.apple.logic10")]
    bundle_id: String,

    /// Process name used to find the running target.
    #[arg(long, default_value = "Logic Pro X")]
    process_name: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let config = match args.config.as_deref() {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read config {}", path.display()))?;
            serde_json::from_str(&text)
                .with_context(|| format!("invalid config {}", path.display()))?
        }
        None => EngineConfig::default(),
    };

    let (mut orchestrator, mut handles) = build_engine(&args, config)?;

    let printer = tokio::spawn(async move {
        while let Some(event) = handles.events.recv().await {
            match event {
                StatusEvent::Step { label, progress } => {
                    println!("[{:3.0}%] {label}", progress * 100.0);
                }
                StatusEvent::Finished { message } | StatusEvent::Failed { message } => {
                    println!("[100%] {message}");
                }
            }
        }
    });

    let mut failed = false;
    if args.stdin {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            let line = line?;
            let text = line.trim();
            if text.is_empty() {
                continue;
            }
            if text == "quit" || text == "exit" {
                break;
            }
            let status = orchestrator.run_command(text, args.launch).await;
            failed = status.starts_with("Error:");
        }
    } else {
        let Some(text) = args.command.as_deref() else {
            anyhow::bail!("no command given (pass text, or --stdin)");
        };
        let status = orchestrator.run_command(text, args.launch).await;
        failed = status.starts_with("Error:");
    }

    // Dropping the engine closes the event channel and lets the
    // printer drain whatever is still queued.
    drop(orchestrator);
    let _ = printer.await;

    if failed {
        std::process::exit(1);
    }
    Ok(())
}

fn build_engine(args: &Args, config: EngineConfig) -> anyhow::Result<(Orchestrator, EngineHandles)> {
    if args.dry_run {
        return Ok(dry_run::engine(config));
    }

    #[cfg(target_os = "macos")]
    {
        use std::sync::Arc;
        let tree = Arc::new(maestro_ax::AxTree::new(args.process_name.clone()));
        let target = Arc::new(maestro_ax::MacTarget::new(
            args.bundle_id.clone(),
            args.process_name.clone(),
        ));
        Ok(Orchestrator::new(tree, target, Arc::new(maestro_ax::CgInput), config))
    }

    #[cfg(not(target_os = "macos"))]
    {
        let _ = config;
        anyhow::bail!("live mode needs macOS; use --dry-run on other platforms")
    }
}
