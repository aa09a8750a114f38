//! Shared test utilities for the installer crate.
//!
//! Enabled for unit tests and, through the `test-support` feature, for the
//! behaviour suites under `tests/`.

use crate::command::CommandExecutor;
use crate::error::{InstallerError, Result};
use sha2::{Digest, Sha256};
use std::cell::RefCell;
use std::collections::VecDeque;
use std::io::{Cursor, Write};
use std::process::{ExitStatus, Output};

/// Creates an `ExitStatus` from an exit code (Unix implementation).
#[cfg(unix)]
pub fn exit_status(code: i32) -> ExitStatus {
    use std::os::unix::process::ExitStatusExt;

    ExitStatus::from_raw(code << 8)
}

/// Creates an `ExitStatus` from an exit code (Windows implementation).
#[cfg(windows)]
pub fn exit_status(code: i32) -> ExitStatus {
    use std::os::windows::process::ExitStatusExt;

    ExitStatus::from_raw(code as u32)
}

/// Creates a successful command `Output` with empty stdout and stderr.
pub fn success_output() -> Output {
    stdout_output("")
}

/// Creates a successful command `Output` printing `stdout`.
pub fn stdout_output(stdout: &str) -> Output {
    Output {
        status: exit_status(0),
        stdout: stdout.as_bytes().to_vec(),
        stderr: Vec::new(),
    }
}

/// Creates a failed command `Output` with the given stderr message.
pub fn failure_output(stderr: &str) -> Output {
    Output {
        status: exit_status(1),
        stdout: Vec::new(),
        stderr: stderr.as_bytes().to_vec(),
    }
}

/// Lowercase hex SHA-256 of `bytes`.
pub fn sha256_hex(bytes: &[u8]) -> String {
    format!("{:x}", Sha256::digest(bytes))
}

/// Represents an expected command invocation for testing.
#[derive(Debug)]
pub struct ExpectedCall {
    /// The command to execute (e.g., "powershell").
    pub cmd: &'static str,
    /// The arguments to pass to the command.
    pub args: Vec<&'static str>,
    /// The result to return when this command is invoked.
    pub result: Result<Output>,
}

/// A stub implementation of `CommandExecutor` for testing.
///
/// Records expected command invocations and returns predefined results.
/// An unexpected or mismatched call returns
/// [`InstallerError::StubMismatch`].
#[derive(Debug)]
pub struct StubExecutor {
    expected: RefCell<VecDeque<ExpectedCall>>,
}

impl StubExecutor {
    /// Creates a new `StubExecutor` with the given expected calls.
    pub fn new(expected: Vec<ExpectedCall>) -> Self {
        Self {
            expected: RefCell::new(expected.into()),
        }
    }

    /// Asserts that all expected command invocations have been consumed.
    ///
    /// # Panics
    ///
    /// Panics if there are remaining expected calls that were not invoked.
    pub fn assert_finished(&self) {
        assert!(
            self.expected.borrow().is_empty(),
            "expected no further command invocations"
        );
    }
}

impl CommandExecutor for StubExecutor {
    fn run(&self, cmd: &str, args: &[&str]) -> Result<Output> {
        let Some(call) = self.expected.borrow_mut().pop_front() else {
            return Err(InstallerError::StubMismatch {
                message: format!("unexpected invocation: {cmd} {}", args.join(" ")),
            });
        };
        if call.cmd != cmd || call.args.as_slice() != args {
            return Err(InstallerError::StubMismatch {
                message: format!(
                    "expected `{} {}`, got `{cmd} {}`",
                    call.cmd,
                    call.args.join(" "),
                    args.join(" ")
                ),
            });
        }
        call.result
    }
}

/// Builder for a single `UpdateInfo` catalog entry.
///
/// Unset fields get plausible defaults derived from the id: version
/// `1.0.0`, a scheme-less `ftp.hp.com` URL and a bare `<id>.exe` silent
/// command.
#[derive(Debug, Clone, Default)]
pub struct EntryXml {
    id: Option<String>,
    name: Option<String>,
    category: Option<String>,
    version: Option<String>,
    url: Option<String>,
    sha256: Option<String>,
    size: Option<String>,
    date_released: Option<String>,
    silent_install: Option<String>,
    omitted: Vec<String>,
}

impl EntryXml {
    /// Set `Id`.
    #[must_use]
    pub fn id(mut self, value: &str) -> Self {
        self.id = Some(value.to_owned());
        self
    }

    /// Set `Name`.
    #[must_use]
    pub fn name(mut self, value: &str) -> Self {
        self.name = Some(value.to_owned());
        self
    }

    /// Set `Category`.
    #[must_use]
    pub fn category(mut self, value: &str) -> Self {
        self.category = Some(value.to_owned());
        self
    }

    /// Set `Version`.
    #[must_use]
    pub fn version(mut self, value: &str) -> Self {
        self.version = Some(value.to_owned());
        self
    }

    /// Set `Url`.
    #[must_use]
    pub fn url(mut self, value: &str) -> Self {
        self.url = Some(value.to_owned());
        self
    }

    /// Set `Sha256`.
    #[must_use]
    pub fn sha256(mut self, value: &str) -> Self {
        self.sha256 = Some(value.to_owned());
        self
    }

    /// Set `Size`.
    #[must_use]
    pub fn size(mut self, value: &str) -> Self {
        self.size = Some(value.to_owned());
        self
    }

    /// Set `DateReleased`.
    #[must_use]
    pub fn date_released(mut self, value: &str) -> Self {
        self.date_released = Some(value.to_owned());
        self
    }

    /// Set `SilentInstall`.
    #[must_use]
    pub fn silent_install(mut self, value: &str) -> Self {
        self.silent_install = Some(value.to_owned());
        self
    }

    /// Leave the named element out entirely.
    #[must_use]
    pub fn omit(mut self, element: &str) -> Self {
        self.omitted.push(element.to_owned());
        self
    }

    fn render(&self) -> String {
        let id = self.id.clone().unwrap_or_else(|| "sp00000".to_owned());
        let fields = [
            ("Id", Some(id.clone())),
            ("Name", self.name.clone()),
            (
                "Category",
                Some(self.category.clone().unwrap_or_else(|| "Driver".to_owned())),
            ),
            (
                "Version",
                Some(self.version.clone().unwrap_or_else(|| "1.0.0".to_owned())),
            ),
            (
                "Url",
                Some(
                    self.url
                        .clone()
                        .unwrap_or_else(|| format!("ftp.hp.com/pub/softpaq/{id}.exe")),
                ),
            ),
            ("Sha256", self.sha256.clone()),
            ("Size", self.size.clone()),
            ("DateReleased", self.date_released.clone()),
            (
                "SilentInstall",
                Some(
                    self.silent_install
                        .clone()
                        .unwrap_or_else(|| format!("{id}.exe")),
                ),
            ),
        ];
        let mut xml = String::from("<UpdateInfo>");
        for (element, value) in fields {
            if self.omitted.iter().any(|o| o == element) {
                continue;
            }
            if let Some(value) = value {
                xml.push_str(&format!("<{element}>{}</{element}>", escape(&value)));
            }
        }
        xml.push_str("</UpdateInfo>");
        xml
    }
}

/// Builder for `ImagePal` catalog documents.
#[derive(Debug, Clone, Default)]
pub struct CatalogXml {
    entries: Vec<EntryXml>,
}

impl CatalogXml {
    /// An empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an entry configured by `configure`.
    #[must_use]
    pub fn entry_with(mut self, configure: impl FnOnce(EntryXml) -> EntryXml) -> Self {
        self.entries.push(configure(EntryXml::default()));
        self
    }

    /// Add an entry with the given category text.
    #[must_use]
    pub fn entry(self, category: &str, id: &str, version: &str) -> Self {
        self.entry_with(|e| e.id(id).category(category).version(version))
    }

    /// Add a driver entry.
    #[must_use]
    pub fn driver(self, id: &str, version: &str) -> Self {
        self.entry("Driver - Chipset", id, version)
    }

    /// Render the catalog as XML text.
    #[must_use]
    pub fn render(&self) -> String {
        let mut xml =
            String::from("<?xml version=\"1.0\" encoding=\"utf-8\"?><ImagePal><Solutions>");
        for entry in &self.entries {
            xml.push_str(&entry.render());
        }
        xml.push_str("</Solutions></ImagePal>");
        xml
    }
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Pack `members` into an uncompressed in-memory cabinet.
///
/// # Panics
///
/// Panics if the cabinet cannot be written.
pub fn cabinet_bytes(members: &[(&str, &[u8])]) -> Vec<u8> {
    let mut builder = cab::CabinetBuilder::new();
    let folder = builder.add_folder(cab::CompressionType::None);
    for (name, _) in members {
        folder.add_file(*name);
    }
    let mut writer = builder
        .build(Cursor::new(Vec::new()))
        .expect("start cabinet");
    let mut contents = members.iter().map(|(_, bytes)| *bytes);
    while let Some(mut file) = writer.next_file().expect("next cabinet member") {
        let bytes = contents.next().expect("member contents");
        file.write_all(bytes).expect("write cabinet member");
    }
    writer.finish().expect("finish cabinet").into_inner()
}
