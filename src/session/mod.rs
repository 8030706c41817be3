/// Session module
///
/// The interactive prompt and batch runner, plus the clipboard and the
/// startup recommendations they use.

pub mod clipboard;
pub mod recommendations;
pub mod session_loop;

pub use clipboard::{Clipboard, SystemClipboard};
pub use session_loop::{split_batch, BatchReport, Decision, Outcome, Session};
