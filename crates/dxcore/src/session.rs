//! Discovery session: the adapter registry and its lifecycle.
//!
//! A session is either uninitialized or initialized. [`DiscoverySession::init_context`]
//! resolves libdxcore, enumerates and qualifies adapters, and unloads the
//! library again before returning. Only library resolution can fail the
//! pass; candidates that do not qualify are logged and skipped, so an
//! initialized session may hold zero adapters.
//!
//! # Example
//!
//! ```rust,no_run
//! use dxcore::DiscoverySession;
//!
//! let mut session = DiscoverySession::new();
//! session.init_context()?;
//! for adapter in session.adapters() {
//!     println!("{} -> {}", adapter.handle(), adapter.driver_store_path_lossy());
//! }
//! session.deinit_context();
//! # Ok::<(), dxcore::DxcoreError>(())
//! ```

use crate::adapter::{Adapter, WddmVersion};
use crate::config::{DiscoveryOptions, DxcoreConfig};
use crate::discovery::{enumerate_adapters, qualify};
use crate::error::{DxcoreError, Result};
use crate::ffi::DxcoreApi;
use crate::library::DxcoreLibrary;
use std::collections::HashSet;
use std::ffi::CStr;
use std::path::PathBuf;
use tracing::{info, warn};

/// Root context for one discovery pass. Owns every adapter it holds.
#[derive(Debug, Default)]
pub struct DiscoverySession {
    initialized: bool,
    adapters: Vec<Adapter>,
}

impl DiscoverySession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Discover adapters through the system libdxcore.
    pub fn init_context(&mut self) -> Result<()> {
        self.init_context_with(&DiscoveryOptions::default())
    }

    /// Discover adapters with explicit options.
    ///
    /// Any previous contents are released first. On failure the session is
    /// left torn down and empty.
    pub fn init_context_with(&mut self, options: &DiscoveryOptions) -> Result<()> {
        self.deinit_context();

        let library = match DxcoreLibrary::open(&options.library) {
            Ok(library) => library,
            Err(e) => {
                warn!("dxcore initialization failed: {}", e);
                self.deinit_context();
                return Err(e);
            }
        };

        self.populate(&library, WddmVersion(options.min_wddm_version));
        self.initialized = true;
        info!(
            "dxcore layer initialized successfully ({} adapters)",
            self.adapters.len()
        );

        // No adapter depends on the library staying mapped.
        drop(library);
        Ok(())
    }

    /// Discover adapters through caller-provided entry points.
    ///
    /// `options.library` is ignored since there is nothing to resolve. Never
    /// fails: per-adapter failures only skip that adapter.
    pub fn init_with_api<A: DxcoreApi + ?Sized>(&mut self, api: &A, options: &DiscoveryOptions) {
        self.deinit_context();
        self.populate(api, WddmVersion(options.min_wddm_version));
        self.initialized = true;
    }

    fn populate<A: DxcoreApi + ?Sized>(&mut self, api: &A, minimum: WddmVersion) {
        for candidate in enumerate_adapters(api) {
            let admitted = qualify(api, &candidate, minimum).and_then(|adapter| self.admit(adapter));
            if let Err(e) = admitted {
                warn!(
                    "Skipping WDDM adapter hAdapter:{:#x} luid:{}: {}",
                    candidate.handle, candidate.luid, e
                );
            }
        }
    }

    /// Append a qualified adapter, or leave the registry untouched.
    ///
    /// On failure the adapter (and its path) is dropped.
    fn admit(&mut self, adapter: Adapter) -> Result<()> {
        self.adapters
            .try_reserve(1)
            .map_err(|_| DxcoreError::OutOfMemory {
                what: "adapter registry",
            })?;

        info!(
            "Adding new adapter via dxcore hAdapter:{} luid:{} wddm version:{}",
            adapter.handle(),
            adapter.luid(),
            adapter.wddm_version()
        );
        self.adapters.push(adapter);
        Ok(())
    }

    /// Release every adapter and return to the uninitialized state.
    ///
    /// Safe to call at any time, any number of times.
    pub fn deinit_context(&mut self) {
        self.adapters = Vec::new();
        self.initialized = false;
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn adapter_count(&self) -> usize {
        self.adapters.len()
    }

    pub fn adapter(&self, index: usize) -> Option<&Adapter> {
        self.adapters.get(index)
    }

    pub fn adapters(&self) -> &[Adapter] {
        &self.adapters
    }

    /// Distinct driver store paths, in discovery order.
    pub fn driver_store_paths(&self) -> Vec<&CStr> {
        let mut seen = HashSet::new();
        self.adapters
            .iter()
            .map(Adapter::driver_store_path)
            .filter(|path| seen.insert(*path))
            .collect()
    }

    /// Directories to search for driver components: the distinct driver
    /// store paths followed by the WSL library directory.
    pub fn mount_search_paths(&self) -> Vec<PathBuf> {
        self.driver_store_paths()
            .into_iter()
            .map(path_from_cstr)
            .chain(std::iter::once(PathBuf::from(DxcoreConfig::WSL_LIB_DIR)))
            .collect()
    }
}

#[cfg(unix)]
fn path_from_cstr(path: &CStr) -> PathBuf {
    use std::ffi::OsStr;
    use std::os::unix::ffi::OsStrExt;

    PathBuf::from(OsStr::from_bytes(path.to_bytes()))
}

#[cfg(not(unix))]
fn path_from_cstr(path: &CStr) -> PathBuf {
    PathBuf::from(path.to_string_lossy().into_owned())
}

/// Populate `session` through the system libdxcore.
pub fn init_context(session: &mut DiscoverySession) -> Result<()> {
    session.init_context()
}

/// Tear down `session`, if there is one.
pub fn deinit_context(session: Option<&mut DiscoverySession>) {
    if let Some(session) = session {
        session.deinit_context();
    }
}

/// Run one discovery pass and return the populated session.
pub fn discover(options: &DiscoveryOptions) -> Result<DiscoverySession> {
    let mut session = DiscoverySession::new();
    session.init_context_with(options)?;
    Ok(session)
}
