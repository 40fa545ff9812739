// Defaults loaded from the environment (after dotenvy has read `.env`).

use std::env;
use std::time::Duration;

/// System instruction sent ahead of every user message by the gateway server.
pub const SYSTEM_PROMPT: &str = "You are a helpful assistant.";

/// Assistant reply appended whenever a gateway call fails.
pub const FALLBACK_REPLY: &str =
    "Sorry, I encountered an error while processing your request. Please try again later.";

/// Error text returned by the gateway server when the upstream gives no detail.
pub const GENERIC_GATEWAY_ERROR: &str = "Something went wrong";

/// Storage key for the serialized conversation.
pub const HISTORY_KEY: &str = "chat-history";
/// Storage key for the theme preference.
pub const THEME_KEY: &str = "chat-theme";

pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_SERVER_PORT: u16 = 3000;

lazy_static::lazy_static! {
    pub static ref GATEWAY_URL: String = env::var("PARLEY_GATEWAY_URL")
        .unwrap_or_else(|_| format!("http://127.0.0.1:{}/api/chat", DEFAULT_SERVER_PORT));
    pub static ref API_BASE: String = env::var("PARLEY_API_BASE")
        .unwrap_or_else(|_| "https://api.openai.com/v1".to_string());
    pub static ref CHAT_MODEL: String = env::var("PARLEY_MODEL").unwrap_or_else(|_| "gpt-4o-mini".to_string());
    pub static ref OPENAI_API_KEY: String = env::var("OPENAI_API_KEY").unwrap_or_default();
    pub static ref HISTORY_DIR: String = env::var("PARLEY_HISTORY_DIR").unwrap_or_else(|_| ".parley".to_string());
}
