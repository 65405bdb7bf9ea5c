use std::path::Path;

use anyhow::Result;
use drawstack::error::exit_code;
use drawstack::presentation::{json, ConcreteConvergeUseCase};

use super::{load_blueprint, CommandContext};

pub fn cmd_validate(ctx: &CommandContext, params: &Path) -> Result<i32> {
    let set = load_blueprint(ctx, "validate", params)?;
    let order = ConcreteConvergeUseCase::validate(&set)?;

    if ctx.json {
        json::emit(json::validation("validate", &set, &order))?;
    } else {
        ctx.print(&ctx.renderer.validation(&set, &order));
    }
    Ok(exit_code::SUCCESS)
}

pub fn cmd_graph(ctx: &CommandContext, params: &Path) -> Result<i32> {
    let set = load_blueprint(ctx, "graph", params)?;
    let order = ConcreteConvergeUseCase::validate(&set)?;

    if ctx.json {
        json::emit(json::graph("graph", &order))?;
    } else {
        ctx.print(&ctx.renderer.graph(&order));
    }
    Ok(exit_code::SUCCESS)
}
