pub mod backend;
pub mod config;
pub mod error;
pub mod events;
pub mod favorites;
pub mod lobby;
pub mod moderation;
pub mod onboarding;
pub mod permissions;
pub mod resolver;
pub mod roles;
pub mod session;
pub mod timeline;
pub mod unread;
pub mod validation;

use tracing_subscriber::{fmt, EnvFilter};

pub use config::ChatConfig;
pub use error::ChatError;
pub use session::ChatSession;

/// Install the global tracing subscriber. `RUST_LOG` overrides the default
/// filter. Calling it twice is a no-op.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("scout_chat=debug,scout_store=info,warn"));

    let _ = fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .try_init();
}
