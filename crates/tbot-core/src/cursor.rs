use std::{
    fs, io,
    path::{Path, PathBuf},
    sync::atomic::{AtomicI64, Ordering},
};

use crate::Result;

/// Default location used by bots that opt into a persisted cursor.
pub const DEFAULT_CURSOR_FILE: &str = "telegrambot_data/last_offset";

/// Next update id to request from `getUpdates` (the platform's `offset`).
#[derive(Debug, Default)]
pub struct Cursor(AtomicI64);

impl Cursor {
    pub fn new(offset: i64) -> Self {
        Self(AtomicI64::new(offset))
    }

    pub fn get(&self) -> i64 {
        self.0.load(Ordering::SeqCst)
    }

    /// Bootstrap only; the running poller goes through [`Cursor::advance_to`].
    pub(crate) fn reset(&self, offset: i64) {
        self.0.store(offset, Ordering::SeqCst);
    }

    /// Move forward to `offset`; never moves backwards. Returns whether the
    /// cursor changed.
    pub fn advance_to(&self, offset: i64) -> bool {
        self.0.fetch_max(offset, Ordering::SeqCst) < offset
    }
}

/// Plain-text file holding the last acknowledged update id.
#[derive(Clone, Debug)]
pub struct CursorFile {
    path: PathBuf,
}

impl CursorFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// `None` when the file is missing or does not hold an integer.
    pub fn load(&self) -> Result<Option<i64>> {
        match fs::read_to_string(&self.path) {
            Ok(txt) => Ok(txt.trim().parse::<i64>().ok()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub fn save(&self, offset: i64) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(&self.path, offset.to_string())?;
        Ok(())
    }
}
