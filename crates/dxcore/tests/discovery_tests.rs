//! Integration tests for the public discovery interface.
//!
//! These drive a full discovery pass through a stand-in for libdxcore
//! implemented on the public `DxcoreApi` trait, plus the real dynamic loader
//! for the library-missing case.

use dxcore::ffi::{registry_status, RegistryQueryType, STATUS_SUCCESS, WIDE_CHAR_SIZE};
use dxcore::{
    deinit_context, encode_wide, AdapterHandle, AdapterInfo, DiscoveryOptions, DiscoverySession,
    DxcoreApi, DxcoreError, Luid, NtStatus, QueryKind, RegistryQuery, WddmVersion,
    WideChar,
};

/// One scripted adapter: handle, WDDM version, driver store path.
struct Scripted {
    handle: u32,
    version: u32,
    path: &'static str,
}

struct StubDxcore {
    adapters: Vec<Scripted>,
}

impl StubDxcore {
    fn new(adapters: Vec<Scripted>) -> Self {
        Self { adapters }
    }
}

impl DxcoreApi for StubDxcore {
    fn enum_adapters(&self, adapters: &mut [AdapterInfo], num_adapters: &mut u32) -> NtStatus {
        for (slot, scripted) in adapters.iter_mut().zip(&self.adapters) {
            *slot = AdapterInfo {
                handle: scripted.handle,
                luid: Luid::from(u64::from(scripted.handle) << 8),
                ..AdapterInfo::default()
            };
        }
        *num_adapters = self.adapters.len() as u32;
        STATUS_SUCCESS
    }

    fn query_adapter_info(&self, adapter: u32, kind: QueryKind, data: &mut [u8]) -> NtStatus {
        let Some(scripted) = self.adapters.iter().find(|a| a.handle == adapter) else {
            return -1;
        };

        match kind {
            QueryKind::DriverVersion => {
                data.copy_from_slice(&scripted.version.to_ne_bytes());
                STATUS_SUCCESS
            }
            QueryKind::Registry => {
                let mut query = RegistryQuery::new(data).expect("registry query buffer");
                assert_eq!(query.query_type(), RegistryQueryType::DriverStorePath as u32);

                let wide: Vec<WideChar> = encode_wide(scripted.path);
                let needed = wide.len() * WIDE_CHAR_SIZE;
                if query.output_value_size() as usize >= needed {
                    for (i, unit) in wide.iter().enumerate() {
                        assert!(query.set_wide_at(i, *unit));
                    }
                    query.set_status(registry_status::SUCCESS);
                } else {
                    query.set_status(registry_status::BUFFER_OVERFLOW);
                }
                query.set_output_value_size(needed as u32);
                STATUS_SUCCESS
            }
        }
    }
}

#[test]
fn test_discovery_admits_only_qualified_adapters() {
    let api = StubDxcore::new(vec![
        Scripted { handle: 0x10, version: 2500, path: "/wsl/drivers/legacy" },
        Scripted { handle: 0x20, version: 2700, path: "/wsl/drivers/nv_dispi.inf_amd64_1" },
        Scripted { handle: 0x30, version: 3100, path: "/wsl/drivers/iigd_dch.inf_amd64_2" },
    ]);

    let mut session = DiscoverySession::new();
    session.init_with_api(&api, &DiscoveryOptions::default());

    assert!(session.is_initialized());
    assert_eq!(session.adapter_count(), 2);

    let first = session.adapter(0).unwrap();
    assert_eq!(first.handle(), AdapterHandle(0x20));
    assert_eq!(first.luid(), Luid::from(0x2000));
    assert_eq!(first.wddm_version(), WddmVersion(2700));
    assert_eq!(first.driver_store_path_lossy(), "/wsl/drivers/nv_dispi.inf_amd64_1");

    let second = session.adapter(1).unwrap();
    assert_eq!(second.wddm_version().to_string(), "3.1");
}

#[test]
fn test_discovery_with_raised_minimum() {
    let api = StubDxcore::new(vec![
        Scripted { handle: 1, version: 2700, path: "/a" },
        Scripted { handle: 2, version: 3000, path: "/b" },
    ]);

    let mut session = DiscoverySession::new();
    session.init_with_api(&api, &DiscoveryOptions::default().with_min_wddm_version(3000));

    assert_eq!(session.adapter_count(), 1);
    assert_eq!(session.adapters()[0].handle(), AdapterHandle(2));
}

#[test]
fn test_duplicate_driver_stores_collapse() {
    let api = StubDxcore::new(vec![
        Scripted { handle: 1, version: 2700, path: "/wsl/drivers/nv" },
        Scripted { handle: 2, version: 2700, path: "/wsl/drivers/nv" },
        Scripted { handle: 3, version: 2700, path: "" },
    ]);

    let mut session = DiscoverySession::new();
    session.init_with_api(&api, &DiscoveryOptions::default());

    assert_eq!(session.adapter_count(), 3);
    let paths: Vec<_> = session
        .driver_store_paths()
        .into_iter()
        .map(|p| p.to_string_lossy().into_owned())
        .collect();
    assert_eq!(paths, vec!["/wsl/drivers/nv".to_string(), String::new()]);
}

#[test]
fn test_summaries_serialize() {
    let api = StubDxcore::new(vec![Scripted { handle: 5, version: 2900, path: "/wsl/drivers/x" }]);

    let mut session = DiscoverySession::new();
    session.init_with_api(&api, &DiscoveryOptions::default());

    let summaries: Vec<_> = session.adapters().iter().map(|a| a.summary()).collect();
    let json = serde_json::to_value(&summaries).unwrap();
    assert_eq!(json[0]["handle"], 5);
    assert_eq!(json[0]["luid"], 0x500);
    assert_eq!(json[0]["wddm_version"], "2.9");
    assert_eq!(json[0]["driver_store_path"], "/wsl/drivers/x");
}

#[test]
fn test_missing_library_fails_the_pass() {
    let options = DiscoveryOptions::default().with_library("libdxcore-absent-in-tests.so");

    let mut session = DiscoverySession::new();
    let err = session.init_context_with(&options).unwrap_err();

    assert!(matches!(err, DxcoreError::LibraryLoad { .. }));
    assert!(!session.is_initialized());
    assert_eq!(session.adapter_count(), 0);

    // Teardown stays safe on a never-initialized session.
    deinit_context(Some(&mut session));
    deinit_context(Some(&mut session));
    assert_eq!(session.adapter_count(), 0);
}

#[test]
fn test_discover_helper_propagates_fatal_errors() {
    let options = DiscoveryOptions::default().with_library("libdxcore-absent-in-tests.so");
    let err = dxcore::discover(&options).unwrap_err();
    assert!(err.is_fatal());
}
