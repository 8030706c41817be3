/// Pattern module
///
/// The static trigger table and the offline matcher that reads it.

pub mod matcher;
pub mod table;

pub use matcher::FallbackMatcher;
pub use table::{PatternEntry, PatternTable};
