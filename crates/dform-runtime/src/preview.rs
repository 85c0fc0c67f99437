#![forbid(unsafe_code)]

//! File previews.
//!
//! Selecting files for a `file` field with `preview: true` yields a
//! [`PreviewJob`]. Running the job reads every file concurrently through a
//! host-supplied [`FileSource`] and writes each result into its own slot of a
//! shared [`PreviewStore`], keyed by field name.
//!
//! Each selection bumps the field's generation. A job only writes while its
//! generation is current and the store is open, so results from a replaced
//! selection, a reset form, or a dropped engine are discarded. One failed
//! read is recorded in its slot and never affects the other slots.

use std::collections::BTreeMap;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};

use base64::{Engine as _, engine::general_purpose::STANDARD};
use dform_core::FileHandle;
use futures::future::join_all;
use tracing::{debug, warn};

use crate::error::FileReadError;

const FALLBACK_MIME: &str = "application/octet-stream";

// ---------------------------------------------------------------------------
// FileSource
// ---------------------------------------------------------------------------

/// Reads file contents on behalf of the engine.
pub trait FileSource {
    fn read(
        &self,
        file: &FileHandle,
    ) -> impl Future<Output = Result<Vec<u8>, FileReadError>> + Send;
}

/// In-memory source keyed by file name. Unknown names fail to read.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    files: BTreeMap<String, Vec<u8>>,
}

impl MemorySource {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_file(mut self, name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        self.insert(name, bytes);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, bytes: impl Into<Vec<u8>>) {
        self.files.insert(name.into(), bytes.into());
    }
}

impl FileSource for MemorySource {
    fn read(
        &self,
        file: &FileHandle,
    ) -> impl Future<Output = Result<Vec<u8>, FileReadError>> + Send {
        let result = self
            .files
            .get(&file.name)
            .cloned()
            .ok_or_else(|| FileReadError::new(&file.name, "not found"));
        std::future::ready(result)
    }
}

/// `data:{mime};base64,{payload}` for a file's bytes.
#[must_use]
pub fn data_url(file: &FileHandle, bytes: &[u8]) -> String {
    let mime = if file.mime.is_empty() {
        FALLBACK_MIME
    } else {
        file.mime.as_str()
    };
    format!("data:{mime};base64,{}", STANDARD.encode(bytes))
}

// ---------------------------------------------------------------------------
// PreviewStore
// ---------------------------------------------------------------------------

/// State of one file's preview.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PreviewState {
    Pending,
    Ready(String),
    Failed(FileReadError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreviewSlot {
    pub file: String,
    pub state: PreviewState,
}

impl PreviewSlot {
    /// The data URL, once ready.
    #[must_use]
    pub fn url(&self) -> Option<&str> {
        match &self.state {
            PreviewState::Ready(url) => Some(url),
            _ => None,
        }
    }
}

#[derive(Debug, Default)]
struct StoreState {
    closed: bool,
    generations: BTreeMap<String, u64>,
    slots: BTreeMap<String, Vec<PreviewSlot>>,
}

impl StoreState {
    fn bump(&mut self, field: &str) -> u64 {
        let generation = self.generations.entry(field.to_string()).or_insert(0);
        *generation += 1;
        *generation
    }
}

/// What happened to one write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WriteOutcome {
    Written,
    Failed,
    Discarded,
}

/// Shared side-channel map of previews. Cloning shares the same store.
#[derive(Debug, Clone, Default)]
pub struct PreviewStore {
    inner: Arc<Mutex<StoreState>>,
}

impl PreviewStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, StoreState> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Start a new selection for `field`, replacing its slots.
    ///
    /// With `images_only`, files whose MIME type is not `image/*` get no slot.
    pub fn begin(&self, field: &str, files: &[FileHandle], images_only: bool) -> PreviewJob {
        let mut state = self.lock();
        let generation = state.bump(field);
        let files: Vec<(usize, FileHandle)> = files
            .iter()
            .filter(|f| !images_only || f.is_image())
            .cloned()
            .enumerate()
            .collect();
        let slots = files
            .iter()
            .map(|(_, f)| PreviewSlot {
                file: f.name.clone(),
                state: PreviewState::Pending,
            })
            .collect();
        if state.closed {
            debug!(field, "preview store closed; selection ignored");
        } else {
            state.slots.insert(field.to_string(), slots);
        }
        PreviewJob {
            store: self.clone(),
            field: field.to_string(),
            generation,
            files,
        }
    }

    fn write(
        &self,
        field: &str,
        generation: u64,
        slot: usize,
        result: Result<String, FileReadError>,
    ) -> WriteOutcome {
        let mut state = self.lock();
        if state.closed || state.generations.get(field) != Some(&generation) {
            return WriteOutcome::Discarded;
        }
        let Some(target) = state.slots.get_mut(field).and_then(|s| s.get_mut(slot)) else {
            return WriteOutcome::Discarded;
        };
        match result {
            Ok(url) => {
                target.state = PreviewState::Ready(url);
                WriteOutcome::Written
            }
            Err(error) => {
                warn!(field, file = %error.file, reason = %error.reason, "preview read failed");
                target.state = PreviewState::Failed(error);
                WriteOutcome::Failed
            }
        }
    }

    /// Drop `field`'s previews and invalidate its running job.
    pub fn clear_field(&self, field: &str) {
        let mut state = self.lock();
        state.bump(field);
        state.slots.remove(field);
    }

    /// Drop every preview and invalidate every running job.
    pub fn clear(&self) {
        let mut state = self.lock();
        let fields: Vec<String> = state.generations.keys().cloned().collect();
        for field in &fields {
            state.bump(field);
        }
        state.slots.clear();
    }

    /// Permanently stop accepting writes.
    pub fn close(&self) {
        let mut state = self.lock();
        state.closed = true;
        state.slots.clear();
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    /// Snapshot of `field`'s slots in selection order.
    #[must_use]
    pub fn previews(&self, field: &str) -> Vec<PreviewSlot> {
        self.lock().slots.get(field).cloned().unwrap_or_default()
    }

    /// The data URLs of `field`'s finished previews.
    #[must_use]
    pub fn ready_urls(&self, field: &str) -> Vec<String> {
        self.lock()
            .slots
            .get(field)
            .map(|slots| {
                slots
                    .iter()
                    .filter_map(|s| s.url().map(str::to_string))
                    .collect()
            })
            .unwrap_or_default()
    }
}

// ---------------------------------------------------------------------------
// PreviewJob
// ---------------------------------------------------------------------------

/// Counts from one [`PreviewJob::run`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PreviewReport {
    pub written: usize,
    pub failed: usize,
    /// Results dropped because the selection was replaced or the store closed.
    pub discarded: usize,
}

/// Pending reads for one selection.
#[derive(Debug)]
#[must_use = "a preview job does nothing until run"]
pub struct PreviewJob {
    store: PreviewStore,
    field: String,
    generation: u64,
    files: Vec<(usize, FileHandle)>,
}

impl PreviewJob {
    #[must_use]
    pub fn field(&self) -> &str {
        &self.field
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.files.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Read every file concurrently, writing each result as it completes.
    pub async fn run<S: FileSource>(self, source: &S) -> PreviewReport {
        let store = &self.store;
        let field = self.field.as_str();
        let generation = self.generation;
        let reads = self.files.iter().map(|(slot, file)| async move {
            let result = source
                .read(file)
                .await
                .map(|bytes| data_url(file, &bytes));
            store.write(field, generation, *slot, result)
        });

        let mut report = PreviewReport::default();
        for outcome in join_all(reads).await {
            match outcome {
                WriteOutcome::Written => report.written += 1,
                WriteOutcome::Failed => report.failed += 1,
                WriteOutcome::Discarded => report.discarded += 1,
            }
        }
        debug!(
            field,
            written = report.written,
            failed = report.failed,
            discarded = report.discarded,
            "preview job finished"
        );
        report
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
