//! dxcore - WDDM adapter discovery for GPU-enabled containers on WSL.
//!
//! This crate answers one question for container tooling: which driver store
//! directories hold the GPU driver components that must be mounted into a
//! sandbox. It loads the platform enumeration library (`libdxcore.so`) at
//! runtime, enumerates display adapters, keeps those running WDDM 2.7 or
//! newer, and resolves each one's driver store path.
//!
//! Nothing is cached: every discovery pass loads the library, queries the
//! platform, and unloads it again. Deciding which files to mount is left to
//! the caller; [`REQUIRED_DRIVER_STORE_FILES`] lists the usual candidates.
//!
//! # Example
//!
//! ```rust,no_run
//! use dxcore::{discover, DiscoveryOptions};
//!
//! fn main() -> dxcore::Result<()> {
//!     let session = discover(&DiscoveryOptions::default())?;
//!     for path in session.mount_search_paths() {
//!         println!("{}", path.display());
//!     }
//!     Ok(())
//! }
//! ```

pub mod adapter;
pub mod config;
pub mod discovery;
pub mod error;
pub mod ffi;
pub mod library;
pub mod session;
pub mod wide;

mod buffer;

#[cfg(test)]
mod testing;

// Re-export commonly used types
pub use adapter::{Adapter, AdapterHandle, AdapterSummary, WddmVersion};
pub use config::{DiscoveryOptions, DxcoreConfig, REQUIRED_DRIVER_STORE_FILES};
pub use error::{DxcoreError, Result};
pub use ffi::{AdapterInfo, DxcoreApi, Luid, NtStatus, QueryKind, RegistryQuery, WideChar};
pub use library::DxcoreLibrary;
pub use session::{deinit_context, discover, init_context, DiscoverySession};
pub use wide::{encode_wide, wide_to_narrow};
