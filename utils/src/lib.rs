pub mod surf_logging;
pub mod url_builder;

pub use surf_logging::SurfLogging;
pub use url_builder::{build_url, query_pairs, UrlError};
