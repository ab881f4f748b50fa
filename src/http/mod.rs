//! HTTP server module: the admission middleware and the wrapped service.

mod admission;
mod server;

pub use admission::{admit, AdmissionState};
pub use server::HttpServer;
