//! Centralized configuration for dxcore discovery.
//!
//! This module provides the well-known names and limits of the libdxcore
//! interface, plus the per-pass options callers may override.

/// Well-known names and limits of the enumeration library.
pub struct DxcoreConfig;

impl DxcoreConfig {
    pub const LIBRARY_NAME: &'static str = "libdxcore.so";
    pub const ENUM_ADAPTERS_SYMBOL: &'static str = "D3DKMTEnumAdapters2";
    pub const QUERY_ADAPTER_INFO_SYMBOL: &'static str = "D3DKMTQueryAdapterInfo";

    /// WDDM 2.7, the first driver model that publishes a driver store to WSL.
    pub const MIN_WDDM_VERSION: u32 = 2700;

    /// Maximum driver store path length, in wide characters.
    pub const MAX_PATH: usize = 260;

    /// Directory holding the WSL-provided user mode libraries.
    pub const WSL_LIB_DIR: &'static str = "/usr/lib/wsl/lib";
}

/// Components a mounting collaborator expects to find in the driver store.
///
/// Discovery never interprets this table; it is published for callers that
/// resolve files under [`DiscoverySession::mount_search_paths`].
///
/// [`DiscoverySession::mount_search_paths`]: crate::DiscoverySession::mount_search_paths
pub const REQUIRED_DRIVER_STORE_FILES: &[&str] = &[
    "libcuda.so.1.1",                // Core library for cuda support
    "libcuda_loader.so",             // Core library for cuda support on WSL
    "libnvidia-ptxjitcompiler.so.1", // Core library for PTX Jit support
    "libnvidia-ml.so.1",             // Core library for nvml
    "libnvidia-ml_loader.so",        // Core library for nvml on WSL
    "libdxcore.so",                  // Core library for dxcore support
    "libnvdxgdmal.so.1",             // dxgdmal library for cuda
    "nvcubins.bin",                  // Binary containing GPU code for cuda
    "nvidia-smi",                    // nvidia-smi binary
];

/// Options for a single discovery pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveryOptions {
    /// Library name or path handed to the dynamic loader.
    pub library: String,
    /// Adapters reporting a lower WDDM version are skipped.
    pub min_wddm_version: u32,
}

impl DiscoveryOptions {
    /// Load a different enumeration library (name or path).
    pub fn with_library(mut self, library: impl Into<String>) -> Self {
        self.library = library.into();
        self
    }

    /// Override the minimum WDDM version code (2700 = WDDM 2.7).
    pub fn with_min_wddm_version(mut self, version: u32) -> Self {
        self.min_wddm_version = version;
        self
    }
}

impl Default for DiscoveryOptions {
    fn default() -> Self {
        Self {
            library: DxcoreConfig::LIBRARY_NAME.to_string(),
            min_wddm_version: DxcoreConfig::MIN_WDDM_VERSION,
        }
    }
}
