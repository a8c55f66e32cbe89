// Public modules
pub mod api_result;
pub mod auth;
pub mod categorize;
pub mod chat;
pub mod health;
pub mod settings;
pub mod user;

// Re-exports
pub use api_result::ApiResult;
pub use auth::{AuthOutcome, AuthResponse, LoginRequest, SignupRequest};
pub use categorize::CategorizeStatus;
pub use chat::{ChatReply, ChatRequest};
pub use health::{HealthReport, HealthStatus};
pub use settings::{SettingChange, Settings};
pub use user::User;
