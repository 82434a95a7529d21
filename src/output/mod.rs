//! Clients for downstream services.

mod translation_client;

pub use translation_client::HttpTranslator;
