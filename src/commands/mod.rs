//! Command handlers for the drawstack binary
//!
//! Each handler returns the process exit code. Library errors travel up as
//! `anyhow` errors wrapping a [`ProvisionError`], which `main` maps to an
//! exit code.

mod apply;
mod inspect;
mod outputs;
mod plan;

use std::path::Path;

use anyhow::Result;
use drawstack::application::{Blueprint, CancellationToken, DeclarationSet, Parameters};
use drawstack::config::{Config, ConfigWarning};
use drawstack::presentation::{json, output, TextRenderer};

pub use apply::cmd_apply;
pub use inspect::{cmd_graph, cmd_validate};
pub use outputs::cmd_outputs;
pub use plan::cmd_plan;

/// Everything a handler needs besides its own arguments
pub struct CommandContext {
    pub config: Config,
    pub json: bool,
    pub renderer: TextRenderer,
    pub cancel: CancellationToken,
}

impl CommandContext {
    /// Print `text` unless running in `--json` mode
    pub fn print(&self, text: &str) {
        if !self.json {
            print!("{}", text);
        }
    }

    pub fn warn(&self, command: &str, warnings: &[ConfigWarning]) -> Result<()> {
        if self.json {
            for w in warnings {
                json::emit(json::warning(command, w))?;
            }
        } else if !warnings.is_empty() {
            eprint!("{}", output::render_config_warnings(warnings));
        }
        Ok(())
    }
}

/// Load parameters and build the draw backend declaration set
pub fn load_blueprint(ctx: &CommandContext, command: &str, params: &Path) -> Result<DeclarationSet> {
    tracing::debug!(file = %params.display(), "loading parameters");
    let (parameters, warnings) = Parameters::load(params)?;
    ctx.warn(command, &warnings)?;
    Ok(Blueprint::draw_backend(&parameters)?)
}
