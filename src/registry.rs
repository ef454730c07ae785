//! Title registry — the durable set of every title ever assigned.
//!
//! Backed by an append-only text file, one title per line. The whole file is
//! read at startup; each reservation appends exactly one line. The check, the
//! append, and the in-memory insert all happen under one async lock, so two
//! sessions can never both reserve the same title.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use crate::error::RegistryError;

struct Inner {
    titles: HashSet<String>,
    file: File,
    /// Length of the store up to and including its last complete line.
    committed: u64,
}

/// Set of retired titles, shared by all sessions.
pub struct TitleRegistry {
    path: PathBuf,
    inner: Arc<Mutex<Inner>>,
}

impl TitleRegistry {
    /// Open (or create) the title store at `path` and load every retired title.
    ///
    /// A trailing line without a newline is the remains of an interrupted
    /// append; it is truncated away and not counted.
    pub async fn load(path: &Path) -> Result<Self, RegistryError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        let content = match tokio::fs::read_to_string(path).await {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => String::new(),
            Err(e) => return Err(e.into()),
        };

        let complete = match content.rfind('\n') {
            Some(idx) => &content[..=idx],
            None => "",
        };
        if complete.len() < content.len() {
            warn!(
                path = %path.display(),
                partial = %&content[complete.len()..],
                "Discarding incomplete trailing title entry"
            );
            let file = OpenOptions::new().write(true).open(path).await?;
            file.set_len(complete.len() as u64).await?;
            file.sync_all().await?;
        }

        let titles: HashSet<String> = complete
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(String::from)
            .collect();

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .await?;

        info!(path = %path.display(), count = titles.len(), "Title registry loaded");

        Ok(Self {
            path: path.to_path_buf(),
            inner: Arc::new(Mutex::new(Inner {
                titles,
                file,
                committed: complete.len() as u64,
            })),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether `title` has ever been retired.
    pub async fn contains(&self, title: &str) -> bool {
        self.inner.lock().await.titles.contains(title)
    }

    /// Number of retired titles.
    pub async fn len(&self) -> usize {
        self.inner.lock().await.titles.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Atomically retire `title`.
    ///
    /// The line is flushed to disk before the in-memory set is updated; if the
    /// write fails the title stays available. Once the lock is held the
    /// append and the insert run on their own task, so dropping the caller
    /// mid-write cannot leave a title on disk but missing from memory.
    pub async fn reserve(&self, title: &str) -> Result<(), RegistryError> {
        let mut inner = Arc::clone(&self.inner).lock_owned().await;

        if inner.titles.contains(title) {
            debug!(title, "Title already reserved");
            return Err(RegistryError::AlreadyReserved {
                title: title.to_string(),
            });
        }

        let title = title.to_string();
        let path = self.path.clone();
        let commit = tokio::spawn(async move {
            if let Err(e) = inner.append(&title).await {
                error!(
                    title = %title,
                    path = %path.display(),
                    error = %e,
                    "Failed to append title"
                );
                return Err(RegistryError::Io(e));
            }
            inner.titles.insert(title.clone());
            info!(title = %title, "Title reserved");
            Ok(())
        });

        commit
            .await
            .map_err(|e| RegistryError::Io(std::io::Error::other(e)))?
    }
}

impl Inner {
    /// Append one line and sync it. A failed or partial write is cut back to
    /// the last complete line so the next append starts on a fresh line.
    async fn append(&mut self, title: &str) -> std::io::Result<()> {
        let on_disk = self.file.metadata().await?.len();
        if on_disk > self.committed {
            warn!(
                expected = self.committed,
                found = on_disk,
                "Trailing partial title entry; truncating to last complete line"
            );
            self.file.set_len(self.committed).await?;
        }

        let line = format!("{title}\n");
        let written = async {
            self.file.write_all(line.as_bytes()).await?;
            self.file.flush().await?;
            self.file.sync_data().await
        }
        .await;

        match written {
            Ok(()) => {
                self.committed += line.len() as u64;
                Ok(())
            }
            Err(e) => {
                if let Err(rollback) = self.file.set_len(self.committed).await {
                    warn!(error = %rollback, "Failed to roll back partial title entry");
                }
                Err(e)
            }
        }
    }
}
