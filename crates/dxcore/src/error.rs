//! Error types for dxcore adapter discovery.
//!
//! Errors fall into two tiers. Failing to resolve the enumeration library is
//! fatal to the whole discovery pass; everything else is local to a single
//! candidate adapter, which is logged and skipped.

use crate::adapter::WddmVersion;
use thiserror::Error;

/// Main error type for the dxcore library.
#[derive(Debug, Error)]
pub enum DxcoreError {
    // Library resolution errors
    #[error("Failed to load {library}: {message}")]
    LibraryLoad { library: String, message: String },

    #[error("{library} is present but missing required symbols: {}", .symbols.join(", "))]
    FunctionNotFound {
        library: String,
        symbols: Vec<&'static str>,
    },

    // Native call errors
    #[error("{operation} failed with status {status:#x}")]
    NativeCall {
        operation: &'static str,
        /// Raw status returned by the entry point
        status: i32,
    },

    #[error("Driver store query reported registry status {name} ({status})")]
    RegistryQueryFailed { status: u32, name: &'static str },

    // Qualification errors
    #[error("WDDM version {version} is below the supported minimum {minimum}")]
    UnsupportedDriverModel {
        version: WddmVersion,
        minimum: WddmVersion,
    },

    #[error("Driver store path size {size} exceeds the maximum of {max} bytes")]
    PathTooLarge { size: usize, max: usize },

    // Buffer errors
    #[error("Out of memory while allocating {what}")]
    OutOfMemory { what: &'static str },

    #[error("Query buffer too small: need {needed} bytes, got {actual}")]
    BufferTooSmall { needed: usize, actual: usize },

    // Encoding errors
    #[error("Invalid wide character {unit:#x} at offset {offset}")]
    InvalidWideChar { offset: usize, unit: u32 },
}

/// Result type alias for dxcore operations.
pub type Result<T> = std::result::Result<T, DxcoreError>;

impl DxcoreError {
    /// Whether this error aborts the whole discovery pass.
    ///
    /// Only library resolution failures are fatal. Every other error skips a
    /// single candidate adapter.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            DxcoreError::LibraryLoad { .. } | DxcoreError::FunctionNotFound { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = DxcoreError::FunctionNotFound {
            library: "libdxcore.so".into(),
            symbols: vec!["D3DKMTEnumAdapters2", "D3DKMTQueryAdapterInfo"],
        };
        assert_eq!(
            err.to_string(),
            "libdxcore.so is present but missing required symbols: D3DKMTEnumAdapters2, D3DKMTQueryAdapterInfo"
        );

        let err = DxcoreError::UnsupportedDriverModel {
            version: WddmVersion(2600),
            minimum: WddmVersion(2700),
        };
        assert_eq!(
            err.to_string(),
            "WDDM version 2.6 is below the supported minimum 2.7"
        );
    }

    #[test]
    fn test_native_call_status_is_hex() {
        let err = DxcoreError::NativeCall {
            operation: "D3DKMTEnumAdapters2",
            status: 0x10,
        };
        assert_eq!(err.to_string(), "D3DKMTEnumAdapters2 failed with status 0x10");
    }

    #[test]
    fn test_registry_failure_names_status() {
        let err = DxcoreError::RegistryQueryFailed {
            status: 1,
            name: "BUFFER_OVERFLOW",
        };
        assert_eq!(
            err.to_string(),
            "Driver store query reported registry status BUFFER_OVERFLOW (1)"
        );
    }

    #[test]
    fn test_fatal_errors() {
        assert!(DxcoreError::LibraryLoad {
            library: "libdxcore.so".into(),
            message: "not found".into()
        }
        .is_fatal());
        assert!(!DxcoreError::PathTooLarge { size: 4096, max: 1040 }.is_fatal());
        assert!(!DxcoreError::OutOfMemory {
            what: "driver store path"
        }
        .is_fatal());
    }
}
