//! drawstack CLI - declarative provisioning for the diagram rendering backend
//!
//! Usage: drawstack <COMMAND>
//!
//! Commands:
//!   validate  Check parameters and declarations offline
//!   graph     Print the build order
//!   plan      Show what apply would change
//!   apply     Converge the backend
//!   outputs   Print recorded outputs

mod commands;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use drawstack::application::CancellationToken;
use drawstack::config::Config;
use drawstack::error::{exit_code, ProvisionError};
use drawstack::presentation::{json, Cli, Commands, TextRenderer};

use commands::CommandContext;

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn run(cli: Cli, cancel: CancellationToken) -> Result<i32> {
    let command = cli.command.name();
    let (config, warnings) = Config::load_or_default(cli.config.as_deref())?;

    let ctx = CommandContext {
        config,
        json: cli.json,
        renderer: TextRenderer {
            verbose: cli.verbose,
            ..TextRenderer::default()
        },
        cancel,
    };
    ctx.warn(command, &warnings)?;

    match cli.command {
        Commands::Validate { params } => commands::cmd_validate(&ctx, &params),
        Commands::Graph { params } => commands::cmd_graph(&ctx, &params),
        Commands::Plan { params } => commands::cmd_plan(&ctx, &params),
        Commands::Apply {
            params,
            parallelism,
        } => commands::cmd_apply(&ctx, &params, parallelism),
        Commands::Outputs => commands::cmd_outputs(&ctx),
    }
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let cancel = CancellationToken::new();
    let handle = cancel.clone();
    if let Err(e) = ctrlc::set_handler(move || {
        eprintln!("\nCancellation requested; finishing in-flight steps...");
        handle.cancel();
    }) {
        tracing::warn!("could not install Ctrl-C handler: {}", e);
    }

    let json_mode = cli.json;
    let command = cli.command.name();

    let code = match run(cli, cancel) {
        Ok(code) => code,
        Err(err) => match err.downcast_ref::<ProvisionError>() {
            Some(provision) => {
                if json_mode {
                    let _ = json::emit(json::error(command, provision));
                } else {
                    print_provision_error(provision);
                }
                provision.exit_code()
            }
            None => {
                if json_mode {
                    let _ = json::emit(serde_json::json!({
                        "event": "error",
                        "command": command,
                        "message": format!("{:#}", err),
                        "exit_code": exit_code::FAILURE,
                    }));
                } else {
                    eprintln!("Error: {:#}", err);
                }
                exit_code::FAILURE
            }
        },
    };
    std::process::exit(code);
}

fn print_provision_error(err: &ProvisionError) {
    match err {
        ProvisionError::Validation { issues } => {
            eprintln!("Error: validation failed");
            for issue in issues {
                eprintln!("  - {}", issue);
            }
        }
        other => eprintln!("Error: {}", other),
    }
}
