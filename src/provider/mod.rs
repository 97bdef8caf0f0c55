//! Client side of project loading: a page source and the paginated provider
//! the dashboard renders from.

mod data_provider;
mod source;

pub use data_provider::{ProjectDataProvider, ProviderState};
pub use source::{LocalSource, ProjectSource, RemoteSource};
