//! Owned buffers for the native size-then-fill protocol.
//!
//! Every variable-length libdxcore query follows the same shape: ask for the
//! required size, allocate, ask again with the buffer. [`size_then_fill`]
//! captures that sequence so callers never juggle capacities themselves, and
//! allocation failures surface as [`DxcoreError::OutOfMemory`] instead of
//! aborting the process.

#![allow(unsafe_code)]

use crate::error::{DxcoreError, Result};

/// Allocate `len` default-initialized elements, reporting allocation failure.
pub(crate) fn try_zeroed<T: Clone + Default>(len: usize, what: &'static str) -> Result<Vec<T>> {
    let mut items = Vec::new();
    items
        .try_reserve_exact(len)
        .map_err(|_| DxcoreError::OutOfMemory { what })?;
    items.resize(len, T::default());
    Ok(items)
}

/// Zeroed byte buffer aligned for the native query structures.
///
/// Backed by `u64` words so the `D3DDDI_QUERYREGISTRY_INFO` output union and
/// every `u32` field are naturally aligned when libdxcore writes through it.
#[derive(Debug)]
pub(crate) struct QueryBuffer {
    words: Vec<u64>,
    len: usize,
}

impl QueryBuffer {
    pub fn zeroed(len: usize, what: &'static str) -> Result<Self> {
        let words = try_zeroed::<u64>(len.div_ceil(8), what)?;
        Ok(Self { words, len })
    }

    pub fn as_bytes(&self) -> &[u8] {
        // SAFETY: `words` holds at least `len` initialized bytes, u8 has no
        // alignment or validity requirements, and the returned borrow keeps
        // `self` alive and unmodified.
        unsafe { std::slice::from_raw_parts(self.words.as_ptr().cast::<u8>(), self.len) }
    }

    pub fn as_mut_bytes(&mut self) -> &mut [u8] {
        // SAFETY: as in `as_bytes`; the exclusive borrow of `self` guarantees
        // no other view of `words` exists.
        unsafe { std::slice::from_raw_parts_mut(self.words.as_mut_ptr().cast::<u8>(), self.len) }
    }
}

/// Result of a two-phase query: the size the platform asked for and the
/// buffer that was filled.
#[derive(Debug)]
pub(crate) struct Negotiated<B> {
    pub size: usize,
    pub buffer: B,
}

/// Run the "ask size, allocate, ask again" sequence.
///
/// `probe` asks the platform for the required size, `allocate` validates it
/// and builds a buffer, `fill` issues the second call. Each native call is
/// made at most once; any failure ends the sequence and drops the buffer.
pub(crate) fn size_then_fill<B>(
    probe: impl FnOnce() -> Result<usize>,
    allocate: impl FnOnce(usize) -> Result<B>,
    fill: impl FnOnce(usize, &mut B) -> Result<()>,
) -> Result<Negotiated<B>> {
    let size = probe()?;
    let mut buffer = allocate(size)?;
    fill(size, &mut buffer)?;
    Ok(Negotiated { size, buffer })
}
