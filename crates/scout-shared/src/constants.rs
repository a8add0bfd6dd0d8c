/// Application name
pub const APP_NAME: &str = "Scout2Retire";

/// Author id used for system and assistant messages
pub const SCOUT_USER_ID: &str = "scout";

/// Window during which an author may delete their own message
pub const DELETE_WINDOW_MINUTES: i64 = 15;

/// Maximum chat message length in characters
pub const MAX_MESSAGE_CHARS: usize = 2000;

/// Maximum group chat name length in characters
pub const MAX_GROUP_NAME_CHARS: usize = 100;

/// Canonical key of the general retirement lounge
pub const GENERAL_LOUNGE_KEY: &str = "lounge";

/// Default page size when fetching a thread
pub const DEFAULT_MESSAGE_LIMIT: u32 = 200;
