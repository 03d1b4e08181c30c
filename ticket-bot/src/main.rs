use std::sync::Arc;

use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use twilight_gateway::{EventTypeFlags, Intents, Shard, ShardId, StreamExt as _};
use twilight_http::Client;
use twilight_model::gateway::event::Event;

use rustls::crypto::ring::default_provider;

use ticket_commands::{handle_interaction, handle_message};
use ticket_core::{Context, HttpPlatform, Services, Settings};
use ticket_store::ConfigStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load the .env file before the log filter reads RUST_LOG
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    default_provider()
        .install_default()
        .map_err(|_| anyhow::anyhow!("failed to install rustls ring provider"))?;

    let settings = Settings::from_env()?;

    // Create a single shared HTTP Client
    let http = Arc::new(Client::new(settings.discord_token.clone()));
    let store = ConfigStore::new(settings.config_path.clone());
    let platform = Arc::new(HttpPlatform::new(Arc::clone(&http)));
    let services = Services::new(platform, store, settings.tickets);
    let ctx = Context::new(Arc::clone(&http), services);

    info!(
        config_path = %settings.config_path.display(),
        close_delay_secs = settings.tickets.close_delay.as_secs(),
        "settings loaded"
    );

    let intents = Intents::GUILDS | Intents::GUILD_MESSAGES | Intents::MESSAGE_CONTENT;
    let mut shard = Shard::new(ShardId::ONE, settings.discord_token, intents);
    let wanted = EventTypeFlags::READY
        | EventTypeFlags::MESSAGE_CREATE
        | EventTypeFlags::INTERACTION_CREATE;

    info!("ticket bot is connecting...");

    while let Some(item) = shard.next_event(wanted).await {
        let event = match item {
            Ok(event) => event,
            Err(source) => {
                error!(?source, "gateway event stream error");
                continue;
            }
        };

        // Each handler runs on its own task so a closing ticket's delay
        // never stalls the event loop.
        match event {
            Event::Ready(ready) => {
                info!(user = %ready.user.name, guilds = ready.guilds.len(), "ticket bot is ready");
            }
            Event::MessageCreate(msg) => {
                let ctx = ctx.clone();
                tokio::spawn(async move {
                    if let Err(source) = handle_message(ctx, msg).await {
                        error!(?source, "message command failed");
                    }
                });
            }
            Event::InteractionCreate(interaction) => {
                let ctx = ctx.clone();
                tokio::spawn(async move {
                    if let Err(source) = handle_interaction(ctx, interaction).await {
                        error!(?source, "interaction handler failed");
                    }
                });
            }
            _ => {}
        }
    }

    Ok(())
}
