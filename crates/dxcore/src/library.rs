//! Dynamic resolution of libdxcore.
//!
//! The library is opened with lazy binding and both entry points are resolved
//! up front. A missing entry point fails the whole resolution with every
//! missing name listed, and the library is unloaded before returning. The
//! resolved handle is meant to live for one discovery pass only.

#![allow(unsafe_code)]

use crate::config::DxcoreConfig;
use crate::error::{DxcoreError, Result};
use crate::ffi::{
    AdapterInfo, DxcoreApi, NtStatus, QueryKind, RawEnumAdapters2, RawQueryAdapterInfo,
    STATUS_INVALID_PARAMETER,
};
use libc::c_uint;
use libloading::Library;
use std::ptr;
use tracing::debug;

type PfnEnumAdapters2 = unsafe extern "C" fn(params: *mut RawEnumAdapters2) -> NtStatus;
type PfnQueryAdapterInfo = unsafe extern "C" fn(params: *mut RawQueryAdapterInfo) -> NtStatus;

/// Function pointers resolved from the library, immutable once populated.
struct EntryPoints {
    enum_adapters2: PfnEnumAdapters2,
    query_adapter_info: PfnQueryAdapterInfo,
}

impl EntryPoints {
    fn resolve(library: &Library, name: &str) -> Result<Self> {
        Self::from_parts(
            name,
            lookup(library, DxcoreConfig::ENUM_ADAPTERS_SYMBOL),
            lookup(library, DxcoreConfig::QUERY_ADAPTER_INFO_SYMBOL),
        )
    }

    /// Accept the entry points only if every one was found.
    fn from_parts(
        name: &str,
        enum_adapters2: Option<PfnEnumAdapters2>,
        query_adapter_info: Option<PfnQueryAdapterInfo>,
    ) -> Result<Self> {
        match (enum_adapters2, query_adapter_info) {
            (Some(enum_adapters2), Some(query_adapter_info)) => Ok(Self {
                enum_adapters2,
                query_adapter_info,
            }),
            (enum_adapters2, query_adapter_info) => {
                let symbols = [
                    (enum_adapters2.is_none(), DxcoreConfig::ENUM_ADAPTERS_SYMBOL),
                    (query_adapter_info.is_none(), DxcoreConfig::QUERY_ADAPTER_INFO_SYMBOL),
                ]
                .into_iter()
                .filter_map(|(missing, symbol)| missing.then_some(symbol))
                .collect();
                Err(DxcoreError::FunctionNotFound {
                    library: name.to_string(),
                    symbols,
                })
            }
        }
    }
}

fn lookup<T: Copy>(library: &Library, symbol: &'static str) -> Option<T> {
    // SAFETY: `T` is the documented D3DKMT prototype for `symbol`, and the
    // copied pointer is only called while `DxcoreLibrary` keeps `library` loaded.
    match unsafe { library.get::<T>(symbol.as_bytes()) } {
        Ok(function) => Some(*function),
        Err(e) => {
            debug!("Symbol {} not found: {}", symbol, e);
            None
        }
    }
}

#[cfg(unix)]
fn open_lazy(name: &str) -> std::result::Result<Library, libloading::Error> {
    use libloading::os::unix::{Library as UnixLibrary, RTLD_LAZY, RTLD_LOCAL};

    // SAFETY: libdxcore's initializers have no preconditions on the caller.
    let library = unsafe { UnixLibrary::open(Some(name), RTLD_LAZY | RTLD_LOCAL) }?;
    Ok(library.into())
}

#[cfg(not(unix))]
fn open_lazy(name: &str) -> std::result::Result<Library, libloading::Error> {
    // SAFETY: as above.
    unsafe { Library::new(name) }
}

/// A loaded libdxcore with both entry points resolved.
///
/// Dropping it unloads the library.
pub struct DxcoreLibrary {
    name: String,
    entry_points: EntryPoints,
    // Keeps the entry points mapped.
    _library: Library,
}

impl DxcoreLibrary {
    /// Load the enumeration library by name or path and resolve its entry points.
    pub fn open(name: &str) -> Result<Self> {
        debug!("Loading enumeration library {}", name);

        let library = open_lazy(name).map_err(|e| DxcoreError::LibraryLoad {
            library: name.to_string(),
            message: e.to_string(),
        })?;

        // On failure `library` is dropped here, unloading it.
        let entry_points = EntryPoints::resolve(&library, name)?;

        Ok(Self {
            name: name.to_string(),
            entry_points,
            _library: library,
        })
    }

    /// Load the library under its well-known name.
    pub fn open_default() -> Result<Self> {
        Self::open(DxcoreConfig::LIBRARY_NAME)
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl std::fmt::Debug for DxcoreLibrary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DxcoreLibrary")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

impl DxcoreApi for DxcoreLibrary {
    fn enum_adapters(&self, adapters: &mut [AdapterInfo], num_adapters: &mut u32) -> NtStatus {
        let Ok(capacity) = c_uint::try_from(adapters.len()) else {
            return STATUS_INVALID_PARAMETER;
        };
        let mut params = RawEnumAdapters2 {
            num_adapters: capacity,
            adapters: if adapters.is_empty() {
                ptr::null_mut()
            } else {
                adapters.as_mut_ptr()
            },
        };

        // SAFETY: `params` is a live, correctly laid out struct whose buffer
        // (if any) has room for `capacity` records, and the entry point was
        // resolved from the library this value keeps loaded.
        let status = unsafe { (self.entry_points.enum_adapters2)(&mut params) };
        *num_adapters = params.num_adapters;
        status
    }

    fn query_adapter_info(&self, adapter: u32, kind: QueryKind, data: &mut [u8]) -> NtStatus {
        let Ok(size) = c_uint::try_from(data.len()) else {
            return STATUS_INVALID_PARAMETER;
        };
        let mut params = RawQueryAdapterInfo {
            adapter,
            kind: kind as c_uint,
            private_driver_data: data.as_mut_ptr().cast(),
            private_driver_data_size: size,
        };

        // SAFETY: the private data pointer and size describe `data` exactly,
        // which stays borrowed for the duration of the call.
        unsafe { (self.entry_points.query_adapter_info)(&mut params) }
    }
}
