//! CLI commands

mod changelog;
mod completions;
mod init;
mod status;
mod submit;

pub use changelog::ChangelogCommand;
pub use completions::CompletionsCommand;
pub use init::InitCommand;
pub use status::StatusCommand;
pub use submit::SubmitCommand;
