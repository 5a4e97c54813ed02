//! Scripted libdxcore stand-in for unit tests.
//!
//! Writes into the caller's buffers through the same layout accessors the
//! real query path reads from.

use crate::ffi::{
    registry_status, AdapterInfo, DxcoreApi, Luid, NtStatus, QueryKind, RegistryQuery,
    RegistryQueryType, WideChar, STATUS_INVALID_PARAMETER, STATUS_SUCCESS, WIDE_CHAR_SIZE,
};
use crate::wide::encode_wide;
use std::cell::Cell;

const STATUS_FAILED: NtStatus = 1;

/// How the fake answers the driver store path query for one adapter.
#[derive(Debug, Clone)]
pub(crate) enum FakePath {
    /// Report this path, without a terminator.
    Path(String),
    /// Always report this output size and never fill.
    ReportSize(u32),
    /// Fail the size probe.
    FailProbe,
    /// Answer the probe, fail the fill.
    FailFill,
    /// Answer the probe, then complete the fill with this registry status.
    FillStatus(u32),
}

#[derive(Debug, Clone)]
pub(crate) struct FakeAdapter {
    pub info: AdapterInfo,
    /// `None` fails the version query.
    pub version: Option<u32>,
    pub path: FakePath,
}

impl FakeAdapter {
    pub fn new(handle: u32, version: u32, path: &str) -> Self {
        Self {
            info: AdapterInfo {
                handle,
                luid: Luid::from(0x1000 + u64::from(handle)),
                num_of_sources: 1,
                present_move_regions_preferred: 0,
            },
            version: Some(version),
            path: FakePath::Path(path.to_string()),
        }
    }

    pub fn with_version(mut self, version: Option<u32>) -> Self {
        self.version = version;
        self
    }

    pub fn with_path(mut self, path: FakePath) -> Self {
        self.path = path;
        self
    }
}

#[derive(Debug, Default)]
pub(crate) struct FakeDxcore {
    pub adapters: Vec<FakeAdapter>,
    pub fail_enum_probe: bool,
    pub fail_enum_fill: bool,
    /// Count to report on the fill call instead of the full list.
    pub shrink_on_fill: Option<u32>,
    pub enum_calls: Cell<u32>,
    pub registry_calls: Cell<u32>,
}

impl FakeDxcore {
    pub fn with_adapters(adapters: Vec<FakeAdapter>) -> Self {
        Self {
            adapters,
            ..Self::default()
        }
    }

    fn answer_registry(fake: &FakeAdapter, query: &mut RegistryQuery<'_>) -> NtStatus {
        // The caller's output size is zero on the probe and the negotiated size on the fill.
        let requested = query.output_value_size() as usize;
        match &fake.path {
            FakePath::Path(path) => {
                let wide: Vec<WideChar> = encode_wide(path);
                let needed = wide.len() * WIDE_CHAR_SIZE;
                if requested >= needed {
                    for (i, unit) in wide.iter().enumerate() {
                        query.set_wide_at(i, *unit);
                    }
                    query.set_status(registry_status::SUCCESS);
                } else {
                    query.set_status(registry_status::BUFFER_OVERFLOW);
                }
                query.set_output_value_size(needed as u32);
                STATUS_SUCCESS
            }
            FakePath::ReportSize(size) => {
                query.set_output_value_size(*size);
                query.set_status(registry_status::BUFFER_OVERFLOW);
                STATUS_SUCCESS
            }
            FakePath::FailProbe => STATUS_FAILED,
            FakePath::FailFill => {
                if requested > 0 {
                    return STATUS_FAILED;
                }
                query.set_output_value_size(16);
                STATUS_SUCCESS
            }
            FakePath::FillStatus(status) => {
                if requested > 0 {
                    query.set_status(*status);
                } else {
                    query.set_output_value_size(16);
                    query.set_status(registry_status::BUFFER_OVERFLOW);
                }
                STATUS_SUCCESS
            }
        }
    }
}

impl DxcoreApi for FakeDxcore {
    fn enum_adapters(&self, adapters: &mut [AdapterInfo], num_adapters: &mut u32) -> NtStatus {
        self.enum_calls.set(self.enum_calls.get() + 1);

        if adapters.is_empty() {
            if self.fail_enum_probe {
                return STATUS_FAILED;
            }
            *num_adapters = self.adapters.len() as u32;
            return STATUS_SUCCESS;
        }

        if self.fail_enum_fill {
            return STATUS_FAILED;
        }
        for (slot, fake) in adapters.iter_mut().zip(&self.adapters) {
            *slot = fake.info;
        }
        let written = adapters.len().min(self.adapters.len()) as u32;
        *num_adapters = self.shrink_on_fill.map_or(written, |count| count.min(written));
        STATUS_SUCCESS
    }

    fn query_adapter_info(&self, adapter: u32, kind: QueryKind, data: &mut [u8]) -> NtStatus {
        let Some(fake) = self.adapters.iter().find(|a| a.info.handle == adapter) else {
            return STATUS_INVALID_PARAMETER;
        };

        match kind {
            QueryKind::DriverVersion => match fake.version {
                Some(version) if data.len() == 4 => {
                    data.copy_from_slice(&version.to_ne_bytes());
                    STATUS_SUCCESS
                }
                _ => STATUS_FAILED,
            },
            QueryKind::Registry => {
                self.registry_calls.set(self.registry_calls.get() + 1);
                let Ok(mut query) = RegistryQuery::new(data) else {
                    return STATUS_INVALID_PARAMETER;
                };
                if query.query_type() != RegistryQueryType::DriverStorePath as u32 {
                    return STATUS_INVALID_PARAMETER;
                }
                Self::answer_registry(fake, &mut query)
            }
        }
    }
}
