//! Shared helpers for installer behaviour tests.

use outfitter_installer::artefact::download::{ArtefactFetcher, FetchError};
use std::cell::Cell;
use std::path::Path;

/// Serves a fixed byte buffer for every request, counting the fetches so
/// tests can assert the idempotent path never touches the network.
pub struct CountingFetcher {
    bytes: Vec<u8>,
    calls: Cell<usize>,
}

impl CountingFetcher {
    /// Build a fetcher that writes `bytes` to every destination.
    pub fn serving(bytes: Vec<u8>) -> Self {
        Self {
            bytes,
            calls: Cell::new(0),
        }
    }

    /// How many fetches have been performed.
    pub fn calls(&self) -> usize {
        self.calls.get()
    }
}

impl ArtefactFetcher for CountingFetcher {
    fn fetch(&self, _url: &str, dest: &Path) -> Result<(), FetchError> {
        self.calls.set(self.calls.get() + 1);
        std::fs::write(dest, &self.bytes).map_err(FetchError::Io)
    }
}

/// Flip the first character of a hex digest so it no longer matches.
pub fn corrupt_digest(hex: &str) -> String {
    let mut corrupted = String::with_capacity(hex.len());
    let mut chars = hex.chars();
    if let Some(first) = chars.next() {
        corrupted.push(if first == 'a' { 'b' } else { 'a' });
    }
    corrupted.extend(chars);
    corrupted
}
