// Configuration module
// Public interface for configuration loading

pub mod constants;
mod loader;
mod settings;

pub use loader::{default_config_path, load_config, load_dotenv};
pub use settings::{Config, ConversationSettings, ProviderConfig, RetryConfig, SearchConfig};
