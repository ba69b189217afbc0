//! JSON REST surface for Rackmap: config contexts, devices,
//! organisational entities, feature lookups, and global search.

pub mod facade;
mod http;
pub mod models;
mod state;

pub use facade::InventoryFacade;
pub use http::router::ApiServer;
