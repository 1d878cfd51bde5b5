use super::backend::{check_quota, StorageBackend};
use super::feed::{ChangeFeed, ChangeHub, ContextId, SlotChange};
use crate::error::{DexError, Result};
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use uuid::Uuid;

const SLOT_EXT: &str = ".slot";

/// Filesystem storage backend: one file per slot under `root`.
///
/// Contexts opened from the same handle share a hub and notify each other.
/// Writers in other processes are not observed until the next read.
pub struct FsBackend {
    root: PathBuf,
    hub: Rc<ChangeHub>,
    context: ContextId,
    quota: Option<usize>,
}

impl FsBackend {
    pub fn new(root: PathBuf) -> Self {
        let hub = Rc::new(ChangeHub::new());
        let context = hub.new_context();
        Self {
            root,
            hub,
            context,
            quota: None,
        }
    }

    pub fn with_quota(mut self, bytes: usize) -> Self {
        self.quota = Some(bytes);
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn open_context(&self) -> Self {
        Self {
            root: self.root.clone(),
            hub: Rc::clone(&self.hub),
            context: self.hub.new_context(),
            quota: self.quota,
        }
    }

    fn slot_path(&self, key: &str) -> PathBuf {
        self.root.join(format!("{}{}", encode_key(key), SLOT_EXT))
    }

    fn ensure_dir(&self) -> Result<()> {
        if !self.root.exists() {
            fs::create_dir_all(&self.root).map_err(DexError::Io)?;
        }
        Ok(())
    }

    fn footprint_without(&self, key: &str) -> Result<usize> {
        let mut total = 0;
        for other in self.keys()? {
            if other == key {
                continue;
            }
            let len = fs::metadata(self.slot_path(&other))
                .map_err(DexError::Io)?
                .len() as usize;
            total += other.len() + len;
        }
        Ok(total)
    }
}

impl StorageBackend for FsBackend {
    fn read_slot(&self, key: &str) -> Result<Option<String>> {
        let path = self.slot_path(key);
        if !path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(path).map_err(DexError::Io)?;
        Ok(Some(content))
    }

    fn write_slot(&self, key: &str, value: &str) -> Result<()> {
        self.ensure_dir()?;
        check_quota(key, value, self.footprint_without(key)?, self.quota)?;

        // Atomic write
        let tmp_path = self.root.join(format!(".slot-{}.tmp", Uuid::new_v4()));
        let written = fs::write(&tmp_path, value)
            .and_then(|()| fs::rename(&tmp_path, self.slot_path(key)));
        if let Err(e) = written {
            let _ = fs::remove_file(&tmp_path);
            return Err(DexError::Io(e));
        }

        self.hub.publish(
            self.context,
            SlotChange {
                key: key.to_string(),
                new_value: Some(value.to_string()),
            },
        );
        Ok(())
    }

    fn remove_slot(&self, key: &str) -> Result<()> {
        let path = self.slot_path(key);
        if path.exists() {
            fs::remove_file(path).map_err(DexError::Io)?;
            self.hub.publish(
                self.context,
                SlotChange {
                    key: key.to_string(),
                    new_value: None,
                },
            );
        }
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>> {
        if !self.root.exists() {
            return Ok(Vec::new());
        }

        let mut keys = Vec::new();
        for entry in fs::read_dir(&self.root).map_err(DexError::Io)? {
            let path = entry.map_err(DexError::Io)?.path();
            if !path.is_file() {
                continue;
            }
            let Some(name) = path.file_name().and_then(|s| s.to_str()) else {
                continue;
            };
            if let Some(key) = name.strip_suffix(SLOT_EXT).and_then(decode_key) {
                keys.push(key);
            }
        }
        keys.sort();
        Ok(keys)
    }

    fn subscribe(&self) -> ChangeFeed {
        self.hub.subscribe(self.context)
    }

    fn slot_len(&self, key: &str) -> Result<usize> {
        let path = self.slot_path(key);
        if !path.exists() {
            return Ok(0);
        }
        Ok(fs::metadata(path).map_err(DexError::Io)?.len() as usize)
    }
}

/// Percent-encode a slot key into a portable file stem.
fn encode_key(key: &str) -> String {
    urlencoding::encode(key).into_owned()
}

fn decode_key(stem: &str) -> Option<String> {
    urlencoding::decode(stem).ok().map(|key| key.into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_encoding_round_trips_awkward_keys() {
        for key in ["pokemonApp_favorites", "viewMode_type/fire", "a b%c", "ポケモン"] {
            assert_eq!(decode_key(&encode_key(key)).as_deref(), Some(key));
        }
        assert_eq!(encode_key("a/b"), "a%2Fb");
    }

    #[test]
    fn test_decode_rejects_non_utf8_stems() {
        assert_eq!(decode_key("abc%FF"), None);
    }

    #[test]
    fn test_failed_rename_removes_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let backend = FsBackend::new(dir.path().to_path_buf());
        let blocker = dir.path().join("k.slot");
        fs::create_dir_all(blocker.join("inner")).unwrap();

        assert!(backend.write_slot("k", "v").is_err());

        let leftovers: Vec<String> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .filter(|name| name.ends_with(".tmp"))
            .collect();
        assert!(leftovers.is_empty(), "temp files left behind: {:?}", leftovers);
    }
}
