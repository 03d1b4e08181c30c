use std::sync::Arc;

use twilight_http::Client;

use ticket_store::ConfigStore;

/// Platform-neutral views of Discord objects.
pub mod model;
/// Capability traits over Discord and their implementations.
pub mod platform;
mod reservation;
/// Environment-driven runtime settings.
pub mod settings;

pub use platform::{HttpPlatform, Platform, PlatformError, PlatformResult};
pub use reservation::{Reservation, Reservations};
pub use settings::{Settings, TicketSettings};

/// Shared application context passed into command handlers.
///
/// Cheap to clone because it only stores reference-counted shared state.
#[derive(Clone)]
pub struct Context {
    /// Raw client, used for interaction responses and message replies.
    pub http: Arc<Client>,
    pub services: Services,
}

impl Context {
    /// Create a new application context.
    pub fn new(http: Arc<Client>, services: Services) -> Self {
        Self { http, services }
    }
}

/// Everything the ticket lifecycle needs, independent of the gateway client.
#[derive(Clone)]
pub struct Services {
    pub platform: Arc<dyn Platform>,
    pub store: ConfigStore,
    pub settings: TicketSettings,
    pub reservations: Reservations,
}

impl Services {
    pub fn new(platform: Arc<dyn Platform>, store: ConfigStore, settings: TicketSettings) -> Self {
        Self {
            platform,
            store,
            settings,
            reservations: Reservations::new(),
        }
    }
}
