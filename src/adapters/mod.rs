// Adapters layer: concrete implementations of the domain ports (Notion, JSON files, Anthropic, terminal).

pub mod anthropic;
pub mod display;
pub mod json_file;
pub mod notion;
pub mod offline;

pub use anthropic::AnthropicModel;
pub use display::TerminalDisplay;
pub use json_file::JsonFileSource;
pub use notion::NotionSource;
pub use offline::OfflineModel;
