//! Command handlers for the docqa CLI.

pub mod ask;
pub mod documents;
pub mod serve;
pub mod upload;

pub use ask::{AskCommand, SearchCommand};
pub use documents::{ClearCommand, DocumentsCommand, StatusCommand};
pub use serve::ServeCommand;
pub use upload::UploadCommand;
