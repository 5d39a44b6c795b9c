use async_trait::async_trait;
use nix::fcntl::{Flock, FlockArg};
use std::{
    fs::OpenOptions,
    io::{ErrorKind, Write},
    path::{Path, PathBuf},
};

use crate::{ensure_valid_key, KvError, KvNamespace};

/// Namespace persisting each key as a file under a directory.
#[derive(Debug, Clone)]
pub struct FileNamespace {
    dirpath: PathBuf,
}

impl FileNamespace {
    /// Bind to `dirpath`, creating it if needed.
    pub fn new(dirpath: impl Into<PathBuf>) -> Result<Self, KvError> {
        let dirpath = dirpath.into();
        std::fs::create_dir_all(&dirpath)?;

        Ok(Self { dirpath })
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, KvError> {
        ensure_valid_key(key)?;
        Ok(self.dirpath.join(key))
    }
}

#[async_trait]
impl KvNamespace for FileNamespace {
    async fn get(&self, key: &str) -> Result<Option<String>, KvError> {
        let path = self.path_for(key)?;

        match tokio::fs::read_to_string(&path).await {
            Ok(content) => Ok(Some(content)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    async fn put(&self, key: &str, value: String) -> Result<(), KvError> {
        ensure_valid_key(key)?;
        let dirpath = self.dirpath.clone();
        let key = key.to_owned();

        tokio::task::spawn_blocking(move || write_atomically(&dirpath, &key, &value))
            .await
            .map_err(|err| KvError::Unavailable(err.to_string()))?
    }
}

/// Replace the file of `key` by renaming a fully written sibling over it,
/// so readers see either the old or the new document.
///
/// Writers are serialized by an exclusive lock on a side file. Keys never
/// start with a dot, so the side files cannot collide with stored keys.
fn write_atomically(dirpath: &Path, key: &str, content: &str) -> Result<(), KvError> {
    let lock = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(false)
        .open(dirpath.join(format!(".{key}.lock")))?;

    let _lock = Flock::lock(lock, FlockArg::LockExclusive)
        .map_err(|(_, errno)| KvError::Io(errno.into()))?;

    let staging = dirpath.join(format!(".{key}.tmp"));
    let mut file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(&staging)?;
    file.write_all(content.as_bytes())?;
    file.sync_data()?;
    drop(file);

    let path = dirpath.join(key);
    std::fs::rename(&staging, &path)?;

    tracing::trace!("wrote {} bytes to {}", content.len(), path.display());

    // Lock is released on drop
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempdir::TempDir;

    #[tokio::test]
    async fn missing_key_reads_as_none() {
        let dir = TempDir::new("kv-store").unwrap();
        let namespace = FileNamespace::new(dir.path()).unwrap();

        assert_eq!(namespace.get("identity-state").await.unwrap(), None);
    }

    #[tokio::test]
    async fn shorter_value_fully_replaces_longer_one() {
        let dir = TempDir::new("kv-store").unwrap();
        let namespace = FileNamespace::new(dir.path()).unwrap();

        namespace
            .put("identity-state", r#"{"dids":{"did:key:z6Mk":{}}}"#.to_owned())
            .await
            .unwrap();
        namespace
            .put("identity-state", "{}".to_owned())
            .await
            .unwrap();

        assert_eq!(
            namespace.get("identity-state").await.unwrap().as_deref(),
            Some("{}")
        );
    }

    #[tokio::test]
    async fn values_survive_a_new_handle() {
        let dir = TempDir::new("kv-store").unwrap();

        FileNamespace::new(dir.path())
            .unwrap()
            .put("identity-state", "persisted".to_owned())
            .await
            .unwrap();

        let reopened = FileNamespace::new(dir.path()).unwrap();
        assert_eq!(
            reopened.get("identity-state").await.unwrap().as_deref(),
            Some("persisted")
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn readers_never_see_a_partial_document() {
        let dir = TempDir::new("kv-store").unwrap();
        let namespace = FileNamespace::new(dir.path()).unwrap();

        let small = format!("{{\"v\":\"{}\"}}", "a".repeat(10));
        let large = format!("{{\"v\":\"{}\"}}", "b".repeat(200_000));
        namespace.put("identity-state", small.clone()).await.unwrap();

        let writer = {
            let namespace = namespace.clone();
            let (small, large) = (small.clone(), large.clone());
            tokio::spawn(async move {
                for round in 0..200 {
                    let value = if round % 2 == 0 { &large } else { &small };
                    namespace.put("identity-state", value.clone()).await.unwrap();
                }
            })
        };

        while !writer.is_finished() {
            let value = namespace.get("identity-state").await.unwrap().unwrap();
            assert!(value == small || value == large, "read {} bytes", value.len());
        }
        writer.await.unwrap();
    }

    #[tokio::test]
    async fn rejects_traversal_keys() {
        let dir = TempDir::new("kv-store").unwrap();
        let namespace = FileNamespace::new(dir.path()).unwrap();

        assert!(matches!(
            namespace.put("../escape", String::new()).await,
            Err(KvError::InvalidKey(_))
        ));
    }
}
