//! Shared bot state and the preference lookups most commands start with.

use std::sync::Arc;

use poise::serenity_prelude as serenity;
use underhive_economy::{MarketCatalog, MarketConfig};
use underhive_store::{Campaign, Gang, Store, StoreResult};

use crate::error::BotError;

/// Poise context for every command.
pub type Context<'a> = poise::Context<'a, Data, BotError>;

/// Command result.
pub type CommandResult = Result<(), BotError>;

/// State shared by every command invocation.
pub struct Data {
    /// Database handle.
    pub store: Arc<Store>,
    /// Trading post catalog, loaded once at startup.
    pub catalog: Arc<MarketCatalog>,
    /// Market generator tuning.
    pub market: MarketConfig,
}

impl Data {
    /// Builds the shared state.
    #[must_use]
    pub fn new(store: Store, catalog: MarketCatalog, market: MarketConfig) -> Self {
        Self {
            store: Arc::new(store),
            catalog: Arc::new(catalog),
            market,
        }
    }

    /// Runs a store call on the blocking pool.
    ///
    /// # Errors
    ///
    /// Returns the store error, or [`BotError::Join`] if the task died.
    pub async fn run<F, T>(&self, f: F) -> Result<T, BotError>
    where
        F: FnOnce(&Store) -> StoreResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let store = Arc::clone(&self.store);
        let value = tokio::task::spawn_blocking(move || f(&store)).await??;
        Ok(value)
    }

    /// The caller's current campaign.
    ///
    /// # Errors
    ///
    /// [`BotError::MissingPreference`] when none is selected.
    pub async fn current_campaign(&self, user_id: String) -> Result<Campaign, BotError> {
        let campaign = self
            .run(move |store| {
                let prefs = store.preferences(&user_id)?;
                match prefs.current_campaign_id {
                    Some(id) => store.campaign(id),
                    None => Ok(None),
                }
            })
            .await?;
        campaign.ok_or_else(BotError::no_campaign)
    }

    /// The caller's current campaign and gang.
    ///
    /// The gang must belong to the current campaign.
    ///
    /// # Errors
    ///
    /// [`BotError::MissingPreference`] when either is missing or they do not
    /// match.
    pub async fn current_gang(&self, user_id: String) -> Result<(Campaign, Gang), BotError> {
        let campaign = self.current_campaign(user_id.clone()).await?;
        let gang = self
            .run(move |store| {
                let prefs = store.preferences(&user_id)?;
                match prefs.current_gang_id {
                    Some(id) => store.gang(id),
                    None => Ok(None),
                }
            })
            .await?
            .ok_or_else(BotError::no_gang)?;

        if gang.campaign_id != campaign.id {
            return Err(BotError::MissingPreference(format!(
                "Your current gang '{}' is not part of campaign '{}'. Use /profile set_gang first.",
                gang.name, campaign.name
            )));
        }
        Ok((campaign, gang))
    }

    /// Loads `gang_id` and checks it belongs to `campaign`.
    ///
    /// # Errors
    ///
    /// [`BotError::Invalid`] for an unknown gang or one from another campaign.
    pub async fn gang_in_campaign(&self, gang_id: i64, campaign: &Campaign) -> Result<Gang, BotError> {
        let gang = self.run(move |store| store.gang(gang_id)).await?;
        match gang {
            Some(gang) if gang.campaign_id == campaign.id => Ok(gang),
            _ => Err(BotError::Invalid(format!(
                "Gang {gang_id} is not part of campaign '{}'.",
                campaign.name
            ))),
        }
    }
}

/// Invoking user's id as stored in the database.
#[must_use]
pub fn author_id(ctx: Context<'_>) -> String {
    ctx.author().id.to_string()
}

/// Guild the command was used in, as stored in the database.
///
/// # Errors
///
/// [`BotError::Invalid`] in direct messages.
pub fn guild_id(ctx: Context<'_>) -> Result<String, BotError> {
    ctx.guild_id()
        .map(|id: serenity::GuildId| id.to_string())
        .ok_or_else(|| BotError::Invalid("This command can only be used in a server.".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use underhive_store::NewGang;

    fn data() -> Data {
        Data::new(
            Store::open_in_memory().unwrap(),
            MarketCatalog::from_items(Vec::new()),
            MarketConfig::default(),
        )
    }

    #[tokio::test]
    async fn test_missing_preferences() {
        let data = data();
        let err = data.current_campaign("1".to_string()).await.unwrap_err();
        assert_eq!(err.user_message(), BotError::no_campaign().user_message());

        let campaign = data
            .run(|store| store.create_campaign("Dust", "1", "g"))
            .await
            .unwrap();
        let id = campaign.id;
        data.run(move |store| store.set_current_campaign("1", id))
            .await
            .unwrap();
        let err = data.current_gang("1".to_string()).await.unwrap_err();
        assert_eq!(err.user_message(), BotError::no_gang().user_message());
    }

    #[tokio::test]
    async fn test_gang_must_match_campaign() {
        let data = data();
        let (first, second) = data
            .run(|store| {
                let first = store.create_campaign("One", "1", "g")?;
                let second = store.create_campaign("Two", "1", "g")?;
                let gang = store.register_gang(NewGang {
                    user_id: "1".to_string(),
                    campaign_id: first.id,
                    name: "Rats".to_string(),
                    gang_type: "Goliath".to_string(),
                    ..NewGang::default()
                })?;
                store.set_current_gang("1", gang.id)?;
                store.set_current_campaign("1", second.id)?;
                Ok((first, second))
            })
            .await
            .unwrap();

        let err = data.current_gang("1".to_string()).await.unwrap_err();
        assert!(err.user_message().contains("not part of campaign 'Two'"));

        let first_id = first.id;
        data.run(move |store| store.set_current_campaign("1", first_id))
            .await
            .unwrap();
        let (campaign, gang) = data.current_gang("1".to_string()).await.unwrap();
        assert_eq!(campaign.id, first_id);
        assert_eq!(gang.name, "Rats");

        assert!(data.gang_in_campaign(gang.id, &second).await.is_err());
    }
}
