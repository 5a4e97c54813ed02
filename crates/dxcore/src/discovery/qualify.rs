//! Adapter qualification.
//!
//! A candidate becomes an [`Adapter`] only if its WDDM version can be read
//! and meets the minimum, and its driver store path resolves.

use super::driver_store::resolve_driver_store_path;
use crate::adapter::{Adapter, AdapterHandle, WddmVersion};
use crate::buffer::QueryBuffer;
use crate::error::{DxcoreError, Result};
use crate::ffi::{AdapterInfo, DxcoreApi, QueryKind, STATUS_SUCCESS};
use tracing::debug;

/// Read the driver model version of `adapter`.
pub fn query_wddm_version<A: DxcoreApi + ?Sized>(
    api: &A,
    adapter: AdapterHandle,
) -> Result<WddmVersion> {
    let mut buffer = QueryBuffer::zeroed(std::mem::size_of::<u32>(), "WDDM version query")?;

    let status = api.query_adapter_info(adapter.0, QueryKind::DriverVersion, buffer.as_mut_bytes());
    if status != STATUS_SUCCESS {
        return Err(DxcoreError::NativeCall {
            operation: "D3DKMTQueryAdapterInfo(driver version)",
            status,
        });
    }

    let mut raw = [0u8; 4];
    raw.copy_from_slice(buffer.as_bytes());
    Ok(WddmVersion(u32::from_ne_bytes(raw)))
}

/// Qualify one enumerated candidate.
///
/// Errors mean the candidate should be skipped; none of them are fatal to
/// the discovery pass.
pub fn qualify<A: DxcoreApi + ?Sized>(
    api: &A,
    candidate: &AdapterInfo,
    minimum: WddmVersion,
) -> Result<Adapter> {
    let handle = AdapterHandle(candidate.handle);
    debug!(
        "Creating a new WDDM adapter for hAdapter:{} luid:{}",
        handle, candidate.luid
    );

    let version = query_wddm_version(api, handle)?;
    if version < minimum {
        return Err(DxcoreError::UnsupportedDriverModel { version, minimum });
    }

    let driver_store_path = resolve_driver_store_path(api, handle)?;

    Ok(Adapter::new(handle, candidate.luid, version, driver_store_path))
}
