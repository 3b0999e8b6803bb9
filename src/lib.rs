pub mod config;
pub mod modules;
pub mod utils;

pub use config::AppProfile;
pub use modules::brain::{AssistantApi, AssistantSession, DispatchLoop, OpenAiClient, RunOutcome, ToolExecutor};
pub use modules::perception::{Article, NewsBatch, NewsSentinel};
pub use utils::HttpClientFactory;
