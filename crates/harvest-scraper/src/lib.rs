pub mod backend;
pub mod browser;
pub mod client;
pub mod error;
pub mod gateway;
pub mod rate_limit;
pub mod selector;

pub use backend::ProfileBackend;
pub use browser::FirefoxCookieSource;
pub use client::VoyagerClient;
pub use error::{FetchFailure, FetchOperation, ScraperError};
pub use gateway::FetchGateway;
pub use rate_limit::Pacer;
pub use selector::{AutoConsent, CredentialSelector, ImportConsent, SelectorState};
