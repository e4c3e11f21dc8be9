pub mod chat;
pub mod client;
pub mod config;
pub mod locale;
pub mod state;

// Re-export main types for convenience
pub use chat::{ChatView, RequestState, ScrollAnchor};
pub use client::{ChatClient, DEFAULT_ENDPOINT};
pub use config::{Config, Overrides, Settings};
pub use locale::{Language, Strings, STACK_BADGES};
pub use state::{ChatMessage, ChatRole, Conversation};
