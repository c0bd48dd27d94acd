pub mod catalog;
pub mod classifier;
pub mod config;
pub mod error;
pub mod model_service;
pub mod ort_loader;
pub mod prediction;
pub mod preprocess;
pub mod registry;
pub mod routes;
pub mod server;

mod app;

pub use app::start_app;
