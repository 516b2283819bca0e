//! In-memory storage implementation for testing and tooling.

use std::io::{Cursor, Read, Seek, SeekFrom, Write};
use std::sync::Arc;

use ahash::AHashMap;
use parking_lot::RwLock;

use crate::error::Result;
use crate::storage::{Storage, StorageConfig, StorageError, StorageInput, StorageOutput};

type FileMap = Arc<RwLock<AHashMap<String, Arc<[u8]>>>>;

/// An in-memory storage implementation.
///
/// Clones share the same file map, so a writer and a reader can be handed separate
/// handles to one logical directory.
#[derive(Debug, Clone)]
pub struct MemoryStorage {
    files: FileMap,
    #[allow(dead_code)]
    config: StorageConfig,
}

impl MemoryStorage {
    /// Create a new memory storage.
    pub fn new(config: StorageConfig) -> Self {
        MemoryStorage {
            files: Arc::new(RwLock::new(AHashMap::new())),
            config,
        }
    }

    /// Create a new memory storage with default configuration.
    pub fn new_default() -> Self {
        Self::new(StorageConfig::default())
    }

    fn get(&self, name: &str) -> Result<Arc<[u8]>> {
        self.files
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| StorageError::FileNotFound(name.to_string()).into())
    }

    /// Get the number of files stored.
    pub fn file_count(&self) -> usize {
        self.files.read().len()
    }

    /// Get the total size of all files.
    pub fn total_size(&self) -> u64 {
        self.files
            .read()
            .values()
            .map(|data| data.len() as u64)
            .sum()
    }
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self::new_default()
    }
}

impl Storage for MemoryStorage {
    fn open_input(&self, name: &str) -> Result<Box<dyn StorageInput>> {
        Ok(Box::new(MemoryInput::new(self.get(name)?)))
    }

    fn create_output(&self, name: &str) -> Result<Box<dyn StorageOutput>> {
        Ok(Box::new(MemoryOutput::new(
            name.to_string(),
            Arc::clone(&self.files),
        )))
    }

    fn file_exists(&self, name: &str) -> bool {
        self.files.read().contains_key(name)
    }

    fn delete_file(&self, name: &str) -> Result<()> {
        self.files.write().remove(name);
        Ok(())
    }

    fn list_files(&self) -> Result<Vec<String>> {
        let mut names: Vec<String> = self.files.read().keys().cloned().collect();
        names.sort();
        Ok(names)
    }

    fn file_size(&self, name: &str) -> Result<u64> {
        Ok(self.get(name)?.len() as u64)
    }

    fn rename_file(&self, old_name: &str, new_name: &str) -> Result<()> {
        let mut files = self.files.write();
        let file = files
            .remove(old_name)
            .ok_or_else(|| StorageError::FileNotFound(old_name.to_string()))?;
        files.insert(new_name.to_string(), file);
        Ok(())
    }

    fn sync(&self) -> Result<()> {
        Ok(())
    }
}

/// A memory-based input implementation.
#[derive(Debug)]
pub struct MemoryInput {
    cursor: Cursor<Arc<[u8]>>,
}

impl MemoryInput {
    fn new(data: Arc<[u8]>) -> Self {
        MemoryInput {
            cursor: Cursor::new(data),
        }
    }
}

impl Read for MemoryInput {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        self.cursor.read(buf)
    }
}

impl Seek for MemoryInput {
    fn seek(&mut self, pos: SeekFrom) -> std::io::Result<u64> {
        self.cursor.seek(pos)
    }
}

impl StorageInput for MemoryInput {
    fn size(&self) -> Result<u64> {
        Ok(self.cursor.get_ref().len() as u64)
    }

    fn close(&mut self) -> Result<()> {
        Ok(())
    }
}

/// A memory-based output implementation. Content becomes visible on close.
#[derive(Debug)]
pub struct MemoryOutput {
    name: String,
    cursor: Cursor<Vec<u8>>,
    files: FileMap,
    closed: bool,
}

impl MemoryOutput {
    fn new(name: String, files: FileMap) -> Self {
        MemoryOutput {
            name,
            cursor: Cursor::new(Vec::new()),
            files,
            closed: false,
        }
    }
}

fn closed_output() -> std::io::Error {
    std::io::Error::other("Output is closed")
}

impl Write for MemoryOutput {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        if self.closed {
            return Err(closed_output());
        }
        self.cursor.write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl Seek for MemoryOutput {
    fn seek(&mut self, pos: SeekFrom) -> std::io::Result<u64> {
        if self.closed {
            return Err(closed_output());
        }
        self.cursor.seek(pos)
    }
}

impl StorageOutput for MemoryOutput {
    fn flush_and_sync(&mut self) -> Result<()> {
        Ok(())
    }

    fn position(&self) -> Result<u64> {
        Ok(self.cursor.position())
    }

    fn close(&mut self) -> Result<()> {
        if !self.closed {
            let data: Arc<[u8]> = Arc::from(std::mem::take(self.cursor.get_mut()));
            self.files.write().insert(self.name.clone(), data);
            self.closed = true;
        }
        Ok(())
    }
}

impl Drop for MemoryOutput {
    fn drop(&mut self) {
        // Ensure the file is stored when the output is dropped
        let _ = self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_and_read() {
        let storage = MemoryStorage::new_default();

        let mut output = storage.create_output("_0.pst").unwrap();
        output.write_all(b"postings").unwrap();
        assert_eq!(output.position().unwrap(), 8);
        output.close().unwrap();

        assert!(storage.file_exists("_0.pst"));
        assert_eq!(storage.file_size("_0.pst").unwrap(), 8);
        assert_eq!(storage.read_file("_0.pst").unwrap(), b"postings");
    }

    #[test]
    fn test_content_visible_only_after_close() {
        let storage = MemoryStorage::new_default();
        let mut output = storage.create_output("_0.dvd").unwrap();
        output.write_all(b"abc").unwrap();
        assert!(!storage.file_exists("_0.dvd"));
        drop(output);
        assert!(storage.file_exists("_0.dvd"));
    }

    #[test]
    fn test_list_rename_delete() {
        let storage = MemoryStorage::new_default();
        storage.write_file("b", b"1").unwrap();
        storage.write_file("a", b"2").unwrap();
        assert_eq!(storage.list_files().unwrap(), vec!["a", "b"]);

        storage.rename_file("a", "c").unwrap();
        assert!(!storage.file_exists("a"));
        assert_eq!(storage.read_file("c").unwrap(), b"2");

        storage.delete_file("c").unwrap();
        assert_eq!(storage.list_files().unwrap(), vec!["b"]);
        assert!(storage.rename_file("missing", "x").is_err());
    }

    #[test]
    fn test_clones_share_files() {
        let storage = MemoryStorage::new_default();
        let other = storage.clone();
        storage.write_file("_0.si", b"{}").unwrap();
        assert!(other.file_exists("_0.si"));
        assert_eq!(other.total_size(), 2);
        assert_eq!(other.file_count(), 1);
    }
}
