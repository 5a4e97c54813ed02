//! Native layout of the libdxcore interface.
//!
//! These types mirror the `D3DKMT_*` structures libdxcore expects (see the
//! d3dkmthk documentation). The registry query is variable-length, so instead
//! of a Rust struct it is accessed through [`RegistryQuery`], a view over a
//! caller-owned byte buffer that reads and writes fields at their native
//! offsets.
//!
//! [`DxcoreApi`] is the seam between the discovery pipeline and the loaded
//! library: the pipeline only ever talks to the two entry points through it.

use crate::config::DxcoreConfig;
use crate::error::{DxcoreError, Result};
use libc::{c_int, c_uint, c_void};
use serde::Serialize;
use std::fmt;
use std::mem::{offset_of, size_of};

/// Status returned by the D3DKMT entry points. Zero is success.
pub type NtStatus = c_int;

pub const STATUS_SUCCESS: NtStatus = 0;
/// Returned without calling into the library when a buffer cannot be described natively.
pub const STATUS_INVALID_PARAMETER: NtStatus = 0xC000_000D_u32 as NtStatus;

/// Platform wide character, as used by the driver store query.
pub type WideChar = libc::wchar_t;

/// Size in bytes of one [`WideChar`].
pub const WIDE_CHAR_SIZE: usize = size_of::<WideChar>();

/// Locally unique identifier of an adapter (`LUID`).
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Luid {
    pub low_part: c_uint,
    pub high_part: c_int,
}

impl Luid {
    /// The LUID as a single 64-bit value (high part in the upper half).
    pub fn as_u64(&self) -> u64 {
        (u64::from(self.high_part as u32) << 32) | u64::from(self.low_part)
    }
}

impl From<u64> for Luid {
    fn from(value: u64) -> Self {
        Self {
            low_part: value as c_uint,
            high_part: (value >> 32) as u32 as c_int,
        }
    }
}

impl fmt::Display for Luid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.as_u64())
    }
}

impl Serialize for Luid {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_u64(self.as_u64())
    }
}

/// One candidate adapter as reported by `D3DKMTEnumAdapters2`.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AdapterInfo {
    /// Opaque adapter handle, only meaningful to this library instance.
    pub handle: c_uint,
    pub luid: Luid,
    pub num_of_sources: c_uint,
    pub present_move_regions_preferred: c_uint,
}

/// `KMTQUERYADAPTERINFOTYPE` values used by discovery.
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryKind {
    /// Fixed-size query returning the WDDM version as one `u32`.
    DriverVersion = 13,
    /// Variable-size registry query, see [`RegistryQuery`].
    Registry = 48,
}

/// `D3DDDI_QUERYREGISTRY_TYPE` values.
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistryQueryType {
    DriverStorePath = 2,
    // Not queried by discovery.
    DriverImagePath = 3,
}

/// `D3DDDI_QUERYREGISTRY_STATUS` values.
pub mod registry_status {
    pub const SUCCESS: u32 = 0;
    pub const BUFFER_OVERFLOW: u32 = 1;
    pub const FAIL: u32 = 2;

    pub fn name(status: u32) -> &'static str {
        match status {
            SUCCESS => "SUCCESS",
            BUFFER_OVERFLOW => "BUFFER_OVERFLOW",
            FAIL => "FAIL",
            _ => "UNKNOWN",
        }
    }
}

#[repr(C)]
pub(crate) struct RawEnumAdapters2 {
    pub num_adapters: c_uint,
    pub adapters: *mut AdapterInfo,
}

#[repr(C)]
pub(crate) struct RawQueryAdapterInfo {
    pub adapter: c_uint,
    pub kind: c_uint,
    pub private_driver_data: *mut c_void,
    pub private_driver_data_size: c_uint,
}

/// `D3DDDI_QUERYREGISTRY_INFO`. Used for its layout only; the output union
/// continues past the end of the struct for string values.
#[repr(C)]
#[allow(dead_code)]
struct RawQueryRegistryInfo {
    query_type: c_uint,
    query_flags: c_uint,
    value_name: [WideChar; DxcoreConfig::MAX_PATH],
    value_type: c_uint,
    physical_adapter_index: c_uint,
    output_value_size: c_uint,
    status: c_uint,
    output: u64,
}

/// The two libdxcore entry points discovery depends on.
///
/// Implemented by [`DxcoreLibrary`](crate::DxcoreLibrary) for the real
/// library. Buffers are passed as slices; implementations describe them to
/// the native side by pointer and length.
pub trait DxcoreApi {
    /// `D3DKMTEnumAdapters2`.
    ///
    /// The slice length is the caller's capacity (zero to ask for the count).
    /// On return `num_adapters` holds the count reported by the platform.
    fn enum_adapters(&self, adapters: &mut [AdapterInfo], num_adapters: &mut u32) -> NtStatus;

    /// `D3DKMTQueryAdapterInfo` with `data` as the private driver data buffer.
    fn query_adapter_info(&self, adapter: u32, kind: QueryKind, data: &mut [u8]) -> NtStatus;
}

/// View over a registry query buffer: a `D3DDDI_QUERYREGISTRY_INFO` header
/// followed by the variable-length output.
pub struct RegistryQuery<'a> {
    bytes: &'a mut [u8],
}

impl<'a> RegistryQuery<'a> {
    /// Size of the fixed structure, including the 8-byte output union.
    pub const HEADER_SIZE: usize = size_of::<RawQueryRegistryInfo>();
    /// Byte offset at which the output value starts.
    pub const OUTPUT_OFFSET: usize = offset_of!(RawQueryRegistryInfo, output);

    const QUERY_TYPE: usize = offset_of!(RawQueryRegistryInfo, query_type);
    const OUTPUT_VALUE_SIZE: usize = offset_of!(RawQueryRegistryInfo, output_value_size);
    const STATUS: usize = offset_of!(RawQueryRegistryInfo, status);

    /// Wrap a buffer, which must hold at least the fixed structure.
    pub fn new(bytes: &'a mut [u8]) -> Result<Self> {
        if bytes.len() < Self::HEADER_SIZE {
            return Err(DxcoreError::BufferTooSmall {
                needed: Self::HEADER_SIZE,
                actual: bytes.len(),
            });
        }
        Ok(Self { bytes })
    }

    pub fn query_type(&self) -> u32 {
        self.read_u32(Self::QUERY_TYPE)
    }

    pub fn set_query_type(&mut self, query_type: RegistryQueryType) {
        self.write_u32(Self::QUERY_TYPE, query_type as u32);
    }

    /// Output size in bytes: the caller's capacity on input, the required or
    /// written size on output.
    pub fn output_value_size(&self) -> u32 {
        self.read_u32(Self::OUTPUT_VALUE_SIZE)
    }

    pub fn set_output_value_size(&mut self, size: u32) {
        self.write_u32(Self::OUTPUT_VALUE_SIZE, size);
    }

    pub fn status(&self) -> u32 {
        self.read_u32(Self::STATUS)
    }

    pub fn set_status(&mut self, status: u32) {
        self.write_u32(Self::STATUS, status);
    }

    /// Number of output bytes this buffer can hold.
    pub fn output_capacity(&self) -> usize {
        self.bytes.len() - Self::OUTPUT_OFFSET
    }

    /// Number of wide characters that fit in the output area.
    pub fn wide_capacity(&self) -> usize {
        self.output_capacity() / WIDE_CHAR_SIZE
    }

    /// Read the wide character at `index` of the output area.
    pub fn wide_at(&self, index: usize) -> Option<WideChar> {
        let start = Self::OUTPUT_OFFSET + index * WIDE_CHAR_SIZE;
        let raw = self.bytes.get(start..start + WIDE_CHAR_SIZE)?;
        let mut unit = [0u8; WIDE_CHAR_SIZE];
        unit.copy_from_slice(raw);
        Some(WideChar::from_ne_bytes(unit))
    }

    /// Write a wide character at `index` of the output area.
    ///
    /// Returns `false` when the index lies outside the buffer.
    pub fn set_wide_at(&mut self, index: usize, unit: WideChar) -> bool {
        let start = Self::OUTPUT_OFFSET + index * WIDE_CHAR_SIZE;
        match self.bytes.get_mut(start..start + WIDE_CHAR_SIZE) {
            Some(slot) => {
                slot.copy_from_slice(&unit.to_ne_bytes());
                true
            }
            None => false,
        }
    }

    /// Copy the first `count` wide characters of the output area.
    pub fn wide_output(&self, count: usize) -> Vec<WideChar> {
        (0..count).map_while(|i| self.wide_at(i)).collect()
    }

    fn read_u32(&self, offset: usize) -> u32 {
        let mut raw = [0u8; 4];
        raw.copy_from_slice(&self.bytes[offset..offset + 4]);
        u32::from_ne_bytes(raw)
    }

    fn write_u32(&mut self, offset: usize, value: u32) {
        self.bytes[offset..offset + 4].copy_from_slice(&value.to_ne_bytes());
    }
}
