/// Shell integration module
///
/// Knows which shells exist on this machine and how to run a confirmed
/// command in each of them.

pub mod dispatcher;
pub mod handlers;
pub mod shell_detector;

pub use dispatcher::{Dispatcher, ExecutionOutcome, ShellHandler};
pub use handlers::{PowerShellHandler, PythonHandler, PythonInvocation};
pub use shell_detector::{Shell, ShellDetector};
