mod http;

pub use http::HttpUsageBackend;
