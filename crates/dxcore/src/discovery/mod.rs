//! The discovery pipeline.
//!
//! Enumerate candidates, then qualify each one (WDDM version gate and driver
//! store path). Failures here are per candidate; the session decides what to
//! keep.

mod driver_store;
mod enumerate;
mod qualify;

pub use driver_store::{resolve_driver_store_path, MAX_PATH_BYTES};
pub use enumerate::enumerate_adapters;
pub use qualify::{qualify, query_wddm_version};
