//! Driver store path resolution.
//!
//! The driver store path comes back from a registry query whose output length
//! is not known in advance. The size is negotiated with
//! [`size_then_fill`](crate::buffer::size_then_fill): a probe with no output
//! space returns the required byte count, which is bounded by
//! [`DxcoreConfig::MAX_PATH`] wide characters before anything is allocated.
//! The fill buffer reserves one extra wide character so the string can be
//! terminated regardless of what the platform wrote.

use crate::adapter::AdapterHandle;
use crate::buffer::{size_then_fill, QueryBuffer};
use crate::config::DxcoreConfig;
use crate::error::{DxcoreError, Result};
use crate::ffi::{
    registry_status, DxcoreApi, QueryKind, RegistryQuery, RegistryQueryType, STATUS_SUCCESS,
    WIDE_CHAR_SIZE,
};
use crate::wide::wide_to_narrow;
use std::ffi::CString;
use tracing::debug;

/// Largest driver store path the platform may report, in bytes.
pub const MAX_PATH_BYTES: usize = DxcoreConfig::MAX_PATH * WIDE_CHAR_SIZE;

/// Query the driver store path of `adapter` and convert it to a narrow string.
pub fn resolve_driver_store_path<A: DxcoreApi + ?Sized>(
    api: &A,
    adapter: AdapterHandle,
) -> Result<CString> {
    let negotiated = size_then_fill(
        || probe_output_size(api, adapter),
        allocate_query,
        |size, buffer| fill_query(api, adapter, size, buffer),
    )?;

    let output_size = negotiated.size;
    let char_count = output_size / WIDE_CHAR_SIZE;
    let mut buffer = negotiated.buffer;
    let mut query = RegistryQuery::new(buffer.as_mut_bytes())?;

    // Never trust the platform's own termination.
    query.set_wide_at(char_count, 0);
    let units = query.wide_output(char_count);

    let path = wide_to_narrow(&units)?;
    debug!(
        "Resolved driver store path for hAdapter:{} ({} bytes): {}",
        adapter,
        output_size,
        path.to_string_lossy()
    );
    Ok(path)
}

/// First phase: ask for the output size with no room for output.
fn probe_output_size<A: DxcoreApi + ?Sized>(api: &A, adapter: AdapterHandle) -> Result<usize> {
    let mut buffer = QueryBuffer::zeroed(RegistryQuery::HEADER_SIZE, "driver store size query")?;
    RegistryQuery::new(buffer.as_mut_bytes())?.set_query_type(RegistryQueryType::DriverStorePath);

    let status = api.query_adapter_info(adapter.0, QueryKind::Registry, buffer.as_mut_bytes());
    if status != STATUS_SUCCESS {
        return Err(DxcoreError::NativeCall {
            operation: "D3DKMTQueryAdapterInfo(driver store path size)",
            status,
        });
    }

    let size = RegistryQuery::new(buffer.as_mut_bytes())?.output_value_size() as usize;
    if size > MAX_PATH_BYTES {
        return Err(DxcoreError::PathTooLarge {
            size,
            max: MAX_PATH_BYTES,
        });
    }
    Ok(size)
}

/// Header, the negotiated output, and one wide character for the terminator.
fn allocate_query(size: usize) -> Result<QueryBuffer> {
    QueryBuffer::zeroed(
        RegistryQuery::HEADER_SIZE + size + WIDE_CHAR_SIZE,
        "driver store path query",
    )
}

/// Second phase: issue the query with room for `size` output bytes.
fn fill_query<A: DxcoreApi + ?Sized>(
    api: &A,
    adapter: AdapterHandle,
    size: usize,
    buffer: &mut QueryBuffer,
) -> Result<()> {
    // Bounded by MAX_PATH_BYTES in the probe.
    let output_value_size = u32::try_from(size).map_err(|_| DxcoreError::PathTooLarge {
        size,
        max: MAX_PATH_BYTES,
    })?;

    let bytes = buffer.as_mut_bytes();
    {
        let mut query = RegistryQuery::new(bytes)?;
        query.set_query_type(RegistryQueryType::DriverStorePath);
        query.set_output_value_size(output_value_size);
    }

    // The terminator slot is ours; the platform only sees header plus output.
    let visible = RegistryQuery::HEADER_SIZE + size;
    let status = api.query_adapter_info(adapter.0, QueryKind::Registry, &mut bytes[..visible]);
    if status != STATUS_SUCCESS {
        return Err(DxcoreError::NativeCall {
            operation: "D3DKMTQueryAdapterInfo(driver store path)",
            status,
        });
    }

    let registry = RegistryQuery::new(bytes)?.status();
    if registry != registry_status::SUCCESS {
        return Err(DxcoreError::RegistryQueryFailed {
            status: registry,
            name: registry_status::name(registry),
        });
    }
    Ok(())
}
