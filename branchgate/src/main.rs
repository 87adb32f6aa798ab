mod config;
mod observability;

use clap::{Args, Parser, ValueEnum};
use config::{Config, ConfigError};
use edge_router::errors::EdgeRouterError;
use edge_router::event::CloudFrontEvent;
use edge_router::hook_service::{Hook, HookService};
use observability::ObservabilityError;
use registry::Registry;
use std::io::Read;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "branchgate", about = "Routes CDN requests to feature branch deployments")]
enum CliCommand {
    /// Serve both request hooks and the admin endpoints
    Serve(ServeArgs),
    /// Run one hook over a single event and print its result
    Invoke(InvokeArgs),
}

#[derive(Args)]
struct ServeArgs {
    #[arg(long, short)]
    config: PathBuf,
}

#[derive(Args)]
struct InvokeArgs {
    #[arg(value_enum)]
    hook: HookArg,
    #[arg(long, short)]
    config: PathBuf,
    /// Event file, read from stdin when omitted
    #[arg(long, short)]
    event: Option<PathBuf>,
}

#[derive(Clone, Copy, ValueEnum)]
enum HookArg {
    Viewer,
    Origin,
}

impl From<HookArg> for Hook {
    fn from(arg: HookArg) -> Self {
        match arg {
            HookArg::Viewer => Hook::ViewerRequest,
            HookArg::Origin => Hook::OriginRequest,
        }
    }
}

#[derive(thiserror::Error, Debug)]
enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Observability(#[from] ObservabilityError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    EdgeRouter(#[from] EdgeRouterError),
    #[error("could not encode hook result: {0}")]
    Encode(#[from] serde_json::Error),
}

fn main() -> ExitCode {
    let cli = CliCommand::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("branchgate: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: CliCommand) -> Result<(), CliError> {
    let config_path = match &cli {
        CliCommand::Serve(args) => &args.config,
        CliCommand::Invoke(args) => &args.config,
    };
    let config = Config::from_file(config_path)?;
    let _guard = observability::init(&config.common)?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    match cli {
        CliCommand::Serve(_) => {
            let listener = &config.edge_router.listener;
            tracing::info!(host = %listener.host, port = listener.port, "Starting edge router");
            runtime.block_on(edge_router::run(config.edge_router))?;
        }
        CliCommand::Invoke(args) => {
            let event = read_event(args.event.as_ref())?;
            let registry = Registry::new(config.edge_router.registry.clone())
                .map_err(EdgeRouterError::from)?;
            let service = HookService::from_config(&config.edge_router, Arc::new(registry));
            let result = runtime.block_on(service.invoke(args.hook.into(), event))?;
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
    }

    Ok(())
}

fn read_event(path: Option<&PathBuf>) -> Result<CloudFrontEvent, CliError> {
    let data = match path {
        Some(path) => std::fs::read(path)?,
        None => {
            let mut data = Vec::new();
            std::io::stdin().read_to_end(&mut data)?;
            data
        }
    };

    Ok(CloudFrontEvent::from_slice(&data)?)
}
