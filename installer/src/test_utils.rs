//! Shared test utilities for the installer crate.
//!
//! Available to integration tests through the `test-support` feature.
//! Nothing here is covered by semver guarantees.

use outfitter_common::digest;
use outfitter_common::exec::{CommandExecutor, ExecError, Invocation};
use outfitter_common::probe::CommandProbe;
use std::cell::RefCell;
use std::collections::VecDeque;
use std::process::{ExitStatus, Output};

/// Creates an `ExitStatus` from an exit code (Unix implementation).
#[cfg(unix)]
#[must_use]
pub fn exit_status(code: i32) -> ExitStatus {
    use std::os::unix::process::ExitStatusExt;

    ExitStatus::from_raw(code << 8)
}

/// Creates an `ExitStatus` from an exit code (Windows implementation).
#[cfg(windows)]
#[must_use]
pub fn exit_status(code: i32) -> ExitStatus {
    use std::os::windows::process::ExitStatusExt;

    ExitStatus::from_raw(code as u32)
}

/// Creates a successful command `Output` with empty stdout and stderr.
#[must_use]
pub fn success_output() -> Output {
    Output {
        status: exit_status(0),
        stdout: Vec::new(),
        stderr: Vec::new(),
    }
}

/// Creates a failed command `Output` with the given stderr message.
#[must_use]
pub fn failure_output(stderr: &str) -> Output {
    Output {
        status: exit_status(1),
        stdout: Vec::new(),
        stderr: stderr.as_bytes().to_vec(),
    }
}

/// Represents an expected command invocation for testing.
#[derive(Debug)]
pub struct ExpectedCall {
    /// The program expected to be executed.
    pub program: &'static str,
    /// The arguments expected to be passed.
    pub args: Vec<String>,
    /// The result to return when this invocation arrives.
    pub result: Result<Output, ExecError>,
}

impl ExpectedCall {
    /// Build an expectation from borrowed argument strings.
    #[must_use]
    pub fn new(program: &'static str, args: &[&str], result: Result<Output, ExecError>) -> Self {
        Self {
            program,
            args: args.iter().map(|a| (*a).to_owned()).collect(),
            result,
        }
    }
}

/// A stub implementation of `CommandExecutor` for testing.
///
/// Pops expected invocations in order, asserting the program and
/// arguments match, and returns the predefined results. Panics on an
/// unexpected invocation; [`StubExecutor::remaining`] lets tests assert
/// every expectation was consumed.
#[derive(Debug, Default)]
pub struct StubExecutor {
    expected: RefCell<VecDeque<ExpectedCall>>,
}

impl StubExecutor {
    /// Build a stub expecting the given invocations, in order.
    #[must_use]
    pub fn new(calls: Vec<ExpectedCall>) -> Self {
        Self {
            expected: RefCell::new(calls.into()),
        }
    }

    /// Number of expected invocations not yet consumed.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.expected.borrow().len()
    }
}

impl CommandExecutor for StubExecutor {
    fn run(&self, invocation: &Invocation) -> Result<Output, ExecError> {
        let expected = self
            .expected
            .borrow_mut()
            .pop_front()
            .unwrap_or_else(|| {
                panic!(
                    "unexpected command: {} {:?}",
                    invocation.program(),
                    invocation.args()
                )
            });
        assert_eq!(invocation.program(), expected.program, "program mismatch");
        assert_eq!(invocation.args(), expected.args, "argument mismatch");
        expected.result
    }
}

/// A probe answering from a fixed set of present executables.
#[derive(Debug, Default)]
pub struct StaticProbe {
    present: Vec<String>,
}

impl StaticProbe {
    /// Build a probe reporting exactly the given names as present.
    #[must_use]
    pub fn with_present(names: &[&str]) -> Self {
        Self {
            present: names.iter().map(|n| (*n).to_owned()).collect(),
        }
    }
}

impl CommandProbe for StaticProbe {
    fn resolves(&self, name: &str) -> bool {
        self.present.iter().any(|p| p == name)
    }
}

/// Build a gzip-compressed tar archive from `(path, contents, mode)`
/// entries, in memory.
#[must_use]
pub fn targz_archive(entries: &[(&str, &[u8], u32)]) -> Vec<u8> {
    let encoder = flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::default());
    let mut builder = tar::Builder::new(encoder);
    for (path, contents, mode) in entries {
        let mut header = tar::Header::new_gnu();
        header.set_size(contents.len() as u64);
        header.set_mode(*mode);
        header.set_cksum();
        builder
            .append_data(&mut header, path, *contents)
            .expect("append archive entry");
    }
    let encoder = builder.into_inner().expect("finish tar");
    encoder.finish().expect("finish gzip")
}

/// Hex SHA-256 of a byte slice, for building descriptors around fixtures.
#[must_use]
pub fn sha256_hex(bytes: &[u8]) -> String {
    digest::hash_bytes(bytes).into_inner()
}
