use std::path::Path;

use anyhow::Result;
use drawstack::error::exit_code;
use drawstack::presentation::{create_converge_use_case, create_event_sink, json};

use super::{load_blueprint, CommandContext};

pub fn cmd_plan(ctx: &CommandContext, params: &Path) -> Result<i32> {
    let set = load_blueprint(ctx, "plan", params)?;
    let options = ctx.config.converge_options()?;
    let use_case = create_converge_use_case(
        &ctx.config,
        create_event_sink("plan", ctx.json),
        ctx.cancel.clone(),
    );

    let plan = use_case.plan(&set, &options)?;
    if ctx.json {
        json::emit(json::plan("plan", &plan))?;
    } else {
        ctx.print(&ctx.renderer.plan(&plan));
    }

    // A conflict means apply cannot converge; say so before anything is written
    if plan.has_conflicts() {
        Ok(exit_code::PARTIAL_APPLY)
    } else {
        Ok(exit_code::SUCCESS)
    }
}
