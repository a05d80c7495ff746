//! REST collaborator: trait seam, wire types, and the reqwest client.

pub mod backend;
pub mod http;
pub mod types;

pub use backend::Backend;
pub use http::HttpBackend;
