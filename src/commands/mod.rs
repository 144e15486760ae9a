mod config_cmd;
mod settings_cmd;
mod status;
mod sync_cmd;
mod tree;
mod watch;

pub use config_cmd::ConfigCommand;
pub use settings_cmd::SettingsCommand;
pub use status::StatusCommand;
pub use sync_cmd::{print_outcome, SyncCommand};
pub use tree::TreeCommand;
pub use watch::WatchCommand;
