//! `/dice` commands.

use underhive_economy::roll_formula;

use crate::data::{CommandResult, Context};
use crate::render;

/// Dice rolling commands
#[poise::command(slash_command, subcommands("roll"), subcommand_required)]
pub async fn dice(_ctx: Context<'_>) -> CommandResult {
    Ok(())
}

/// Roll dice using standard notation (e.g., 2d6+3)
#[poise::command(slash_command)]
async fn roll(
    ctx: Context<'_>,
    #[description = "Formula such as 2d6+3 or (D3+1)x10 (x is multiplication)"]
    #[max_length = 200]
    formula: String,
) -> CommandResult {
    let outcome = roll_formula(&formula)?;
    tracing::debug!(formula = %formula, total = outcome.total, "Rolled dice");
    ctx.say(render::roll_message(&outcome)).await?;
    Ok(())
}
