//! External process execution, streaming and cancellation.

pub mod cancel;
pub mod command;
pub mod platform;
pub mod stream;

pub use cancel::{CancelToken, POLL_INTERVAL};
pub use command::{execute, CommandOptions, CommandResult, CommandSpec};
pub use platform::is_ci;
pub use stream::{LogLineSource, LogLines, LINE_BUFFER};
