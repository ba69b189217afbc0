//! HTTP surface: handlers, errors, and router assembly.

pub(crate) mod constants;
pub(crate) mod contexts;
pub(crate) mod devices;
pub(crate) mod entities;
pub(crate) mod errors;
pub(crate) mod features;
pub(crate) mod health;
pub(crate) mod router;
pub(crate) mod search;
pub(crate) mod telemetry;
