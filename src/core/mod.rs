/// Core functionality modules
///
/// The suggestion model, the provider abstraction, risk scanning and the
/// resolver that ties them together.

pub mod provider;
pub mod resolver;
pub mod risk;
pub mod suggestion;

pub use provider::{ProviderError, ProviderKind, SuggestionProvider};
pub use resolver::Resolver;
pub use risk::RiskScanner;
pub use suggestion::{Source, Suggestion};
