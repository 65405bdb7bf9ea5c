use anyhow::Result;
use drawstack::error::exit_code;
use drawstack::presentation::{create_converge_use_case, create_event_sink, json};

use super::CommandContext;

pub fn cmd_outputs(ctx: &CommandContext) -> Result<i32> {
    let use_case = create_converge_use_case(
        &ctx.config,
        create_event_sink("outputs", ctx.json),
        ctx.cancel.clone(),
    );

    let outputs = use_case.recorded_outputs(&ctx.config.state.path)?;
    if ctx.json {
        json::emit(json::outputs("outputs", &outputs))?;
    } else {
        ctx.print(&ctx.renderer.outputs(&outputs));
    }
    Ok(exit_code::SUCCESS)
}
