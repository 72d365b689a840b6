use crate::domain::errors::KVStoreError;
use crate::ports::outbound::{BatchOperation, KeyValueStore, ScanResult};
use std::collections::BTreeMap;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

type Data = BTreeMap<Vec<u8>, Vec<u8>>;

fn io_err(e: std::io::Error) -> KVStoreError {
    KVStoreError::IOError {
        message: e.to_string(),
    }
}

/// File-backed key-value store.
///
/// Keeps the full map in memory and rewrites the file on every write. Each
/// rewrite goes to a temp file which is synced and then renamed over the
/// original, so a crash leaves either the old file or the new one.
///
/// File format: `[key_len:u32 LE][key][value_len:u32 LE][value]...`
#[derive(Debug)]
pub struct FileBackedKVStore {
    data: Data,
    path: PathBuf,
}

impl FileBackedKVStore {
    /// Open the store at `path`, loading existing contents.
    ///
    /// A missing file is an empty store. A truncated file is a
    /// `CorruptionError`, never silently dropped.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, KVStoreError> {
        let path = path.as_ref().to_path_buf();

        let data = match std::fs::File::open(&path) {
            Ok(mut file) => {
                let mut bytes = Vec::new();
                file.read_to_end(&mut bytes).map_err(io_err)?;
                let data = decode(&bytes)?;
                info!(
                    "[custody] Loaded {} keys ({} bytes) from {}",
                    data.len(),
                    bytes.len(),
                    path.display()
                );
                data
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!("[custody] No existing storage file at {}", path.display());
                Data::new()
            }
            Err(e) => return Err(io_err(e)),
        };

        Ok(Self { data, path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// `<file name>.tmp` next to the data file. Distinct from the data file
    /// for any extension, including `.tmp`.
    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    fn save(&self, data: &Data) -> Result<(), KVStoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(io_err)?;
            }
        }

        let bytes = encode(data);
        let temp_path = self.temp_path();
        let mut file = std::fs::File::create(&temp_path).map_err(io_err)?;
        file.write_all(&bytes).map_err(io_err)?;
        file.sync_all().map_err(io_err)?;
        std::fs::rename(&temp_path, &self.path).map_err(io_err)?;

        debug!("[custody] Wrote {} bytes to {}", bytes.len(), self.path.display());
        Ok(())
    }

    /// Persist a modified copy, then adopt it. A failed write leaves the
    /// in-memory view untouched.
    fn commit(&mut self, staged: Data) -> Result<(), KVStoreError> {
        self.save(&staged)?;
        self.data = staged;
        Ok(())
    }
}

fn encode(data: &Data) -> Vec<u8> {
    let mut bytes = Vec::new();
    for (key, value) in data {
        bytes.extend_from_slice(&(key.len() as u32).to_le_bytes());
        bytes.extend_from_slice(key);
        bytes.extend_from_slice(&(value.len() as u32).to_le_bytes());
        bytes.extend_from_slice(value);
    }
    bytes
}

fn decode(bytes: &[u8]) -> Result<Data, KVStoreError> {
    let truncated = |at: usize| KVStoreError::CorruptionError {
        message: format!("storage file truncated at byte {}", at),
    };

    let mut data = Data::new();
    let mut cursor = 0;

    let read_chunk = |cursor: &mut usize| -> Result<Vec<u8>, KVStoreError> {
        let len_end = *cursor + 4;
        let len_bytes: [u8; 4] = bytes
            .get(*cursor..len_end)
            .and_then(|s| s.try_into().ok())
            .ok_or_else(|| truncated(*cursor))?;
        let len = u32::from_le_bytes(len_bytes) as usize;
        let chunk = bytes
            .get(len_end..len_end + len)
            .ok_or_else(|| truncated(len_end))?
            .to_vec();
        *cursor = len_end + len;
        Ok(chunk)
    };

    while cursor < bytes.len() {
        let key = read_chunk(&mut cursor)?;
        let value = read_chunk(&mut cursor)?;
        data.insert(key, value);
    }

    Ok(data)
}

impl KeyValueStore for FileBackedKVStore {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, KVStoreError> {
        Ok(self.data.get(key).cloned())
    }

    fn put(&mut self, key: &[u8], value: &[u8]) -> Result<(), KVStoreError> {
        let mut staged = self.data.clone();
        staged.insert(key.to_vec(), value.to_vec());
        self.commit(staged)
    }

    fn atomic_batch_write(&mut self, operations: Vec<BatchOperation>) -> Result<(), KVStoreError> {
        let mut staged = self.data.clone();
        for op in operations {
            staged.insert(op.key, op.value);
        }
        self.commit(staged)
    }

    fn exists(&self, key: &[u8]) -> Result<bool, KVStoreError> {
        Ok(self.data.contains_key(key))
    }

    fn prefix_scan(&self, prefix: &[u8]) -> Result<ScanResult, KVStoreError> {
        Ok(self
            .data
            .range(prefix.to_vec()..)
            .take_while(|(k, _)| k.starts_with(prefix))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect())
    }
}
