pub mod chat;
pub mod constants;
pub mod controller;
pub mod formatter;
pub mod gateway;
pub mod llm_interaction;
pub mod message;
pub mod session;
pub mod storage;
pub mod store;
pub mod web_server;

pub use controller::{ControllerConfig, ConversationController, SendOutcome};
pub use formatter::format_response;
pub use gateway::{CompletionGateway, GatewayError, HttpGateway};
pub use message::{Message, Role};
pub use session::{Rejection, Session, Theme};
pub use storage::{FileStorage, HistoryStorage, MemoryStorage, StorageError};
pub use store::ConversationStore;
