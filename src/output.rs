//! Output routing.
//!
//! The generator never opens files itself. For every class it emits it asks
//! an [`OutputResolver`] for a sink identified by a [`TargetFile`].

use std::collections::BTreeMap;
use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;

use tracing::debug;

/// Identity of one generated file.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TargetFile {
    /// Base directory from the generation options.
    pub base_directory: String,
    /// Directory segments derived from the package.
    pub directories: Vec<String>,
    /// File base name, without suffix.
    pub name: String,
    /// File suffix, without the dot.
    pub suffix: String,
}

impl TargetFile {
    /// `name.suffix`.
    pub fn file_name(&self) -> String {
        format!("{}.{}", self.name, self.suffix)
    }

    /// Path relative to the working directory.
    pub fn path(&self) -> PathBuf {
        let mut path = PathBuf::from(&self.base_directory);
        path.extend(&self.directories);
        path.push(self.file_name());
        path
    }
}

/// Supplies a writable sink for each generated file.
pub trait OutputResolver {
    fn resolve<'a>(&'a mut self, target: &TargetFile) -> io::Result<Box<dyn Write + 'a>>;
}

impl<F> OutputResolver for F
where
    F: FnMut(&TargetFile) -> io::Result<Box<dyn Write>>,
{
    fn resolve<'a>(&'a mut self, target: &TargetFile) -> io::Result<Box<dyn Write + 'a>> {
        self(target)
    }
}

/// Captures generated files in memory.
#[derive(Debug, Default)]
pub struct MemoryOutput {
    files: BTreeMap<TargetFile, Vec<u8>>,
}

impl MemoryOutput {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every captured file, ordered by identity.
    pub fn files(&self) -> &BTreeMap<TargetFile, Vec<u8>> {
        &self.files
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Text of the file whose base name is `name`, if one was written.
    pub fn get(&self, name: &str) -> Option<String> {
        self.files
            .iter()
            .find(|(target, _)| target.name == name)
            .map(|(_, bytes)| String::from_utf8_lossy(bytes).into_owned())
    }
}

impl OutputResolver for MemoryOutput {
    fn resolve<'a>(&'a mut self, target: &TargetFile) -> io::Result<Box<dyn Write + 'a>> {
        let buffer = self.files.entry(target.clone()).or_default();
        buffer.clear();
        Ok(Box::new(buffer))
    }
}

/// Writes files below their base directory, creating directories as
/// needed. Existing files are overwritten.
#[derive(Debug, Clone, Copy, Default)]
pub struct DirectoryOutput;

impl OutputResolver for DirectoryOutput {
    fn resolve<'a>(&'a mut self, target: &TargetFile) -> io::Result<Box<dyn Write + 'a>> {
        let path = target.path();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        debug!(path = %path.display(), "writing file");
        Ok(Box::new(io::BufWriter::new(fs::File::create(path)?)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn target(base: &str, name: &str) -> TargetFile {
        TargetFile {
            base_directory: base.to_string(),
            directories: vec!["com".to_string(), "example".to_string()],
            name: name.to_string(),
            suffix: "kt".to_string(),
        }
    }

    #[test]
    fn target_path() {
        let t = target("out", "Person");
        assert_eq!(t.file_name(), "Person.kt");
        assert_eq!(t.path(), PathBuf::from("out/com/example/Person.kt"));
    }

    #[test]
    fn memory_output_replaces_content() {
        let mut output = MemoryOutput::new();
        let t = target(".", "Person");
        output.resolve(&t).unwrap().write_all(b"first").unwrap();
        output.resolve(&t).unwrap().write_all(b"second").unwrap();
        assert_eq!(output.len(), 1);
        assert_eq!(output.get("Person").as_deref(), Some("second"));
        assert_eq!(output.get("Missing"), None);
    }

    #[test]
    fn directory_output_creates_directories() {
        let dir = TempDir::new().unwrap();
        let base = dir.path().to_string_lossy().into_owned();
        let mut output = DirectoryOutput;
        {
            let mut sink = output.resolve(&target(&base, "Person")).unwrap();
            sink.write_all(b"class Person\n").unwrap();
            sink.flush().unwrap();
        }
        let written = fs::read_to_string(dir.path().join("com/example/Person.kt")).unwrap();
        assert_eq!(written, "class Person\n");
    }

    #[test]
    fn closures_resolve_sinks() {
        let mut seen = Vec::new();
        {
            let mut resolver = |t: &TargetFile| -> io::Result<Box<dyn Write>> {
                seen.push(t.file_name());
                Ok(Box::new(io::sink()))
            };
            resolver.resolve(&target(".", "Order")).unwrap();
        }
        assert_eq!(seen, vec!["Order.kt"]);
    }
}
