use std::path::Path;

use anyhow::Result;
use drawstack::presentation::{create_converge_use_case, create_event_sink, json};

use super::{load_blueprint, CommandContext};

pub fn cmd_apply(ctx: &CommandContext, params: &Path, parallelism: Option<usize>) -> Result<i32> {
    let set = load_blueprint(ctx, "apply", params)?;
    let mut options = ctx.config.converge_options()?;
    if let Some(parallelism) = parallelism {
        options = options.with_parallelism(parallelism);
    }

    let use_case = create_converge_use_case(
        &ctx.config,
        create_event_sink("apply", ctx.json),
        ctx.cancel.clone(),
    );

    let report = use_case.execute(&set, &options)?;
    if ctx.json {
        json::emit(json::report("apply", &report))?;
    } else {
        ctx.print(&ctx.renderer.report(&report));
    }
    Ok(report.exit_code())
}
