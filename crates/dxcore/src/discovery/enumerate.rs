//! Adapter enumeration.

use crate::buffer::{size_then_fill, try_zeroed};
use crate::error::{DxcoreError, Result};
use crate::ffi::{AdapterInfo, DxcoreApi, NtStatus, STATUS_SUCCESS};
use tracing::{debug, warn};

/// List the candidate adapters known to the platform.
///
/// Never fails: any platform error is logged and yields an empty list.
pub fn enumerate_adapters<A: DxcoreApi + ?Sized>(api: &A) -> Vec<AdapterInfo> {
    match try_enumerate_adapters(api) {
        Ok(adapters) => {
            debug!("dxcore reported {} candidate adapters", adapters.len());
            adapters
        }
        Err(e) => {
            warn!("Failed to enumerate adapters via dxcore: {}", e);
            Vec::new()
        }
    }
}

fn try_enumerate_adapters<A: DxcoreApi + ?Sized>(api: &A) -> Result<Vec<AdapterInfo>> {
    let negotiated = size_then_fill(
        || {
            let mut count = 0;
            check(api.enum_adapters(&mut [], &mut count))?;
            Ok(count as usize)
        },
        |count| try_zeroed::<AdapterInfo>(count, "adapter list"),
        |_, adapters: &mut Vec<AdapterInfo>| {
            let mut count = 0;
            check(api.enum_adapters(adapters.as_mut_slice(), &mut count))?;
            // The platform may report fewer adapters than it sized for.
            adapters.truncate(count as usize);
            Ok(())
        },
    )?;
    Ok(negotiated.buffer)
}

fn check(status: NtStatus) -> Result<()> {
    if status == STATUS_SUCCESS {
        Ok(())
    } else {
        Err(DxcoreError::NativeCall {
            operation: "D3DKMTEnumAdapters2",
            status,
        })
    }
}
