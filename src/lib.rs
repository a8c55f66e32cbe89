// Public modules
pub mod chat;
pub mod client;
pub mod client_logger;
pub mod error;
pub mod observability;
pub mod render;
pub mod retry;
pub mod session;
pub mod storage;
pub mod types;
pub mod utils;

// Re-exports
pub use client::FinChat;
pub use client_logger::ClientLogger;
pub use error::{Error, Result};
pub use observability::register_biometrics;
pub use retry::RetryPolicy;
pub use session::{Session, SessionState, SessionStore};
pub use storage::{FileStore, KeyValueStore, MemoryStore};
pub use types::*;
