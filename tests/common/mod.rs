#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::{TempDir, tempdir};

/// Scratch directory helper that cleans up files automatically on drop.
pub struct TestWorkspace {
    temp_dir: TempDir,
}

impl TestWorkspace {
    /// Creates a fresh scratch directory for the current test case.
    pub fn new() -> Self {
        Self {
            temp_dir: tempdir().expect("temp dir"),
        }
    }

    /// Returns the root path for all files owned by this workspace.
    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Writes UTF-8 `contents` into a file under the workspace and returns the path.
    pub fn write(&self, name: &str, contents: &str) -> PathBuf {
        self.write_bytes(name, contents.as_bytes())
    }

    /// Writes raw bytes, for inputs in encodings other than UTF-8.
    pub fn write_bytes(&self, name: &str, contents: &[u8]) -> PathBuf {
        let path = self.temp_dir.path().join(name);
        fs::write(&path, contents).expect("write temp file contents");
        path
    }

    /// Reads a generated file back as UTF-8.
    pub fn read(&self, name: &str) -> String {
        fs::read_to_string(self.temp_dir.path().join(name)).expect("read generated file")
    }
}

/// Encodes `text` as Latin-1; panics on characters above U+00FF.
pub fn latin1(text: &str) -> Vec<u8> {
    text.chars()
        .map(|ch| u8::try_from(u32::from(ch)).expect("latin-1 character"))
        .collect()
}

/// Encodes `text` as UTF-16LE with a leading byte-order mark.
pub fn utf16le_with_bom(text: &str) -> Vec<u8> {
    let mut bytes = vec![0xFF, 0xFE];
    for unit in text.encode_utf16() {
        bytes.extend_from_slice(&unit.to_le_bytes());
    }
    bytes
}

/// CSV with `rows` data rows, including quotes and empty fields.
pub fn sample_csv(rows: usize) -> String {
    let mut csv = String::from("id,nome,città,note\n");
    for i in 0..rows {
        let note = match i % 4 {
            0 => String::new(),
            1 => format!("l'ordine {i}"),
            2 => "\"quoted, with comma\"".to_string(),
            _ => "NULL".to_string(),
        };
        csv.push_str(&format!("{i},Nome{i},Città{},{note}\n", i % 7));
    }
    csv
}
