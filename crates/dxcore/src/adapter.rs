//! Qualified adapter types.

use crate::ffi::Luid;
use serde::Serialize;
use std::borrow::Cow;
use std::ffi::{CStr, CString};
use std::fmt;

/// Opaque adapter handle issued by libdxcore.
///
/// Only meaningful within the process and library instance that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct AdapterHandle(pub u32);

impl fmt::Display for AdapterHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

/// WDDM driver model version code (2700 = WDDM 2.7).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct WddmVersion(pub u32);

impl WddmVersion {
    pub fn major(&self) -> u32 {
        self.0 / 1000
    }

    pub fn minor(&self) -> u32 {
        (self.0 % 1000) / 100
    }
}

impl fmt::Display for WddmVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major(), self.minor())
    }
}

/// A GPU adapter that passed qualification.
///
/// Immutable once created. The driver store path is the platform string
/// converted to UTF-8 and is never absent, though it may be empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Adapter {
    handle: AdapterHandle,
    luid: Luid,
    wddm_version: WddmVersion,
    driver_store_path: CString,
}

impl Adapter {
    pub(crate) fn new(
        handle: AdapterHandle,
        luid: Luid,
        wddm_version: WddmVersion,
        driver_store_path: CString,
    ) -> Self {
        Self {
            handle,
            luid,
            wddm_version,
            driver_store_path,
        }
    }

    pub fn handle(&self) -> AdapterHandle {
        self.handle
    }

    pub fn luid(&self) -> Luid {
        self.luid
    }

    pub fn wddm_version(&self) -> WddmVersion {
        self.wddm_version
    }

    /// The driver store path as a NUL-terminated string.
    pub fn driver_store_path(&self) -> &CStr {
        &self.driver_store_path
    }

    pub fn driver_store_path_lossy(&self) -> Cow<'_, str> {
        self.driver_store_path.to_string_lossy()
    }

    /// Plain-data copy for callers that serialize discovery results.
    pub fn summary(&self) -> AdapterSummary {
        AdapterSummary {
            handle: self.handle,
            luid: self.luid,
            wddm_version: self.wddm_version.to_string(),
            driver_store_path: self.driver_store_path_lossy().into_owned(),
        }
    }
}

/// Serializable view of an [`Adapter`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AdapterSummary {
    pub handle: AdapterHandle,
    pub luid: Luid,
    pub wddm_version: String,
    pub driver_store_path: String,
}
