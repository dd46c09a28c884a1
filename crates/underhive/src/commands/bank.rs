//! `/bank` commands on the caller's current gang.

use poise::serenity_prelude as serenity;
use tracing::info;
use underhive_economy::PageRequest;
use underhive_shared::constants::DEFAULT_PAGE_SIZE;
use underhive_shared::types::GangId;

use crate::data::{author_id, CommandResult, Context};
use crate::render;

/// Gang credit management
#[poise::command(
    slash_command,
    subcommands("adjust", "view", "history"),
    subcommand_required
)]
pub async fn bank(_ctx: Context<'_>) -> CommandResult {
    Ok(())
}

/// Add or subtract credits for your current gang
#[poise::command(slash_command)]
async fn adjust(
    ctx: Context<'_>,
    #[description = "Credits (positive to add, negative to subtract)"] amount: i64,
    #[description = "Reason for the change"] reason: Option<String>,
) -> CommandResult {
    let user = author_id(ctx);
    let (_, gang) = ctx.data().current_gang(user.clone()).await?;
    let reason = reason.unwrap_or_else(|| default_reason(amount).to_string());

    let gang_id = gang.id;
    let (_, balance) = ctx
        .data()
        .run(move |store| store.adjust_credits(gang_id, amount, &reason, &user))
        .await?;
    info!(gang_id, amount, balance, "Credits adjusted");

    ctx.say(adjustment_message(amount, &gang.name, balance)).await?;
    Ok(())
}

/// View your current gang's credits
#[poise::command(slash_command)]
async fn view(ctx: Context<'_>) -> CommandResult {
    let (_, gang) = ctx.data().current_gang(author_id(ctx)).await?;
    let gang_id = gang.id;
    let balance = ctx.data().run(move |store| store.balance(gang_id)).await?;
    let embed = super::embed(
        format!("{} Total Credits", gang.name),
        format!("**{balance}**"),
        serenity::Colour::BLUE,
        Vec::new(),
    );
    ctx.send(poise::CreateReply::default().embed(embed)).await?;
    Ok(())
}

/// View your current gang's credit history
#[poise::command(slash_command)]
async fn history(
    ctx: Context<'_>,
    #[description = "Page to view (starting at 1)"] page: Option<i64>,
    #[description = "Entries per page (1-50)"] limit: Option<i64>,
) -> CommandResult {
    let (_, gang) = ctx.data().current_gang(author_id(ctx)).await?;
    send_history(ctx, gang.id, &gang.name, page, limit, false).await
}

/// Replies with one page of a gang's ledger.
pub(crate) async fn send_history(
    ctx: Context<'_>,
    gang_id: GangId,
    gang_name: &str,
    page: Option<i64>,
    limit: Option<i64>,
    ephemeral: bool,
) -> CommandResult {
    let request = PageRequest::new(
        page.unwrap_or(1),
        limit.unwrap_or(i64::from(DEFAULT_PAGE_SIZE)),
    );
    let history = ctx
        .data()
        .run(move |store| store.credit_history(gang_id, request))
        .await?;

    let description = render::history_description(&history);
    let footer = render::history_footer(&history);
    let reserved = gang_name.chars().count()
        + "Transaction History (cont.)".len()
        + description.chars().count()
        + footer.chars().count();
    let chunks = render::chunk_embed_fields(render::history_fields(&history), reserved);
    let last = chunks.len() - 1;
    for (index, chunk) in chunks.into_iter().enumerate() {
        let mut embed = if index == 0 {
            super::embed(
                format!("{gang_name} Transaction History"),
                description.clone(),
                serenity::Colour::DARK_GREEN,
                chunk,
            )
        } else {
            super::embed(
                format!("{gang_name} Transaction History (cont.)"),
                "",
                serenity::Colour::DARK_GREEN,
                chunk,
            )
        };
        if index == last {
            embed = embed.footer(serenity::CreateEmbedFooter::new(footer.clone()));
        }
        ctx.send(
            poise::CreateReply::default()
                .embed(embed)
                .ephemeral(ephemeral),
        )
        .await?;
    }
    Ok(())
}

fn default_reason(amount: i64) -> &'static str {
    if amount >= 0 {
        "manual addition"
    } else {
        "manual subtraction"
    }
}

/// `Added 50 credits to X. New balance: 120 credits.`
pub(crate) fn adjustment_message(amount: i64, gang_name: &str, balance: i64) -> String {
    let (verb, preposition) = if amount >= 0 {
        ("Added", "to")
    } else {
        ("Subtracted", "from")
    };
    format!(
        "{verb} {} credits {preposition} **{gang_name}**. New balance: **{balance}** credits.",
        amount.unsigned_abs()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_adjustment_message() {
        assert_eq!(
            adjustment_message(50, "Rats", 120),
            "Added 50 credits to **Rats**. New balance: **120** credits."
        );
        assert_eq!(
            adjustment_message(-20, "Rats", 100),
            "Subtracted 20 credits from **Rats**. New balance: **100** credits."
        );
        assert_eq!(default_reason(-1), "manual subtraction");
    }
}
