//! Wire DTOs, re-exported from `rackmap-api-models` so handlers and
//! clients share one contract.

pub use rackmap_api_models::*;
