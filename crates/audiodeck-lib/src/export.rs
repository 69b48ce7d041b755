//! Archive export — "download all" as a single ZIP.
//!
//! ```text
//! export() → capability check → busy guard
//!     → for id in catalog: fetch <id>.txt, fetch <id>.wav   (strictly in order)
//!         success → builder.add_file("audio/<name>")   failure → warn + skip
//!         progress: round(done / 2n * 100)
//!     → builder.finish() → ExportArtifact("audio_files.zip")
//! ```
//!
//! A partial archive is a normal outcome. The control's busy flag rejects a
//! second export while one is running; dropping the guard restores the label.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use audiodeck_core::progress::Progress;
use audiodeck_core::types::{
    ARCHIVE_FILE_NAME, ARCHIVE_FOLDER, Catalog, ExportStatus, ResourceKind,
};

use crate::error::ExportError;
use crate::fetch::SharedFetcher;

// ─── Archive capability ────────────────────────────────────────────────────

/// Accumulates named payloads for one export.
pub trait ArchiveBuilder: Send {
    fn add_file(&mut self, entry: String, bytes: Vec<u8>);
    /// Serialize everything added so far into one blob.
    fn finish(self: Box<Self>) -> Result<Vec<u8>, String>;
}

/// Creates a fresh builder per export.
pub trait ArchiveFactory: Send + Sync {
    fn create(&self) -> Box<dyn ArchiveBuilder>;
}

pub type SharedArchive = Arc<dyn ArchiveFactory>;

/// The archive capability compiled into this build, if any.
pub fn default_archive() -> Option<SharedArchive> {
    #[cfg(feature = "zip")]
    {
        Some(Arc::new(zip_archive::ZipArchiveFactory))
    }
    #[cfg(not(feature = "zip"))]
    {
        None
    }
}

#[cfg(feature = "zip")]
pub mod zip_archive {
    use std::io::{Cursor, Write};

    use zip::CompressionMethod;
    use zip::ZipWriter;
    use zip::write::SimpleFileOptions;

    use super::{ArchiveBuilder, ArchiveFactory};

    pub struct ZipArchiveFactory;

    impl ArchiveFactory for ZipArchiveFactory {
        fn create(&self) -> Box<dyn ArchiveBuilder> {
            Box::new(ZipBuilder::default())
        }
    }

    /// Entries are held in memory and only compressed in `finish`.
    #[derive(Default)]
    pub struct ZipBuilder {
        entries: Vec<(String, Vec<u8>)>,
    }

    impl ArchiveBuilder for ZipBuilder {
        fn add_file(&mut self, entry: String, bytes: Vec<u8>) {
            self.entries.push((entry, bytes));
        }

        fn finish(self: Box<Self>) -> Result<Vec<u8>, String> {
            let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
            let options =
                SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

            for (name, bytes) in self.entries {
                writer
                    .start_file(name, options)
                    .map_err(|e| e.to_string())?;
                writer.write_all(&bytes).map_err(|e| e.to_string())?;
            }

            let cursor = writer.finish().map_err(|e| e.to_string())?;
            Ok(cursor.into_inner())
        }
    }
}

// ─── Export control ────────────────────────────────────────────────────────

/// The "download all" button: busy flag plus an observable status.
#[derive(Clone)]
pub struct ExportControl {
    busy: Arc<AtomicBool>,
    hidden: bool,
    status_tx: Arc<watch::Sender<ExportStatus>>,
}

impl ExportControl {
    pub fn new(hidden: bool) -> Self {
        let initial = if hidden {
            ExportStatus::hidden()
        } else {
            ExportStatus::idle()
        };
        let (status_tx, _) = watch::channel(initial);
        Self {
            busy: Arc::new(AtomicBool::new(false)),
            hidden,
            status_tx: Arc::new(status_tx),
        }
    }

    /// Hidden exactly when there is nothing to export.
    pub fn for_catalog(catalog: &Catalog) -> Self {
        Self::new(catalog.is_empty())
    }

    pub fn status(&self) -> ExportStatus {
        self.status_tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<ExportStatus> {
        self.status_tx.subscribe()
    }

    pub fn is_hidden(&self) -> bool {
        self.hidden
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::SeqCst)
    }

    /// Disable the control for one export. Fails if hidden or already busy.
    pub fn begin(&self) -> Result<BusyGuard, ExportError> {
        if self.hidden {
            return Err(ExportError::Hidden);
        }
        if self
            .busy
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(ExportError::Busy);
        }
        let guard = BusyGuard {
            control: self.clone(),
        };
        guard.report(0);
        Ok(guard)
    }
}

/// Held for the duration of one export; re-enables the control on drop.
pub struct BusyGuard {
    control: ExportControl,
}

impl BusyGuard {
    pub fn report(&self, percent: u8) {
        self.control.status_tx.send_replace(ExportStatus::packing(percent));
    }

    pub fn generating(&self) {
        self.control.status_tx.send_replace(ExportStatus::generating());
    }
}

impl Drop for BusyGuard {
    fn drop(&mut self) {
        self.control.status_tx.send_replace(ExportStatus::idle());
        self.control.busy.store(false, Ordering::SeqCst);
    }
}

// ─── Orchestrator ──────────────────────────────────────────────────────────

/// Result of one export, ready to hand to a download sink.
#[derive(Debug, Clone)]
pub struct ExportArtifact {
    pub file_name: String,
    pub bytes: Vec<u8>,
    /// Entry names in insertion order, e.g. `audio/001.txt`.
    pub entries: Vec<String>,
    /// File names that could not be fetched.
    pub skipped: Vec<String>,
}

impl ExportArtifact {
    /// Write the archive into `dir` under its file name.
    pub async fn save(&self, dir: &Path) -> std::io::Result<PathBuf> {
        tokio::fs::create_dir_all(dir).await?;
        let dest = dir.join(&self.file_name);
        tokio::fs::write(&dest, &self.bytes).await?;
        Ok(dest)
    }
}

pub struct Exporter {
    catalog: Catalog,
    fetcher: SharedFetcher,
    archive: Option<SharedArchive>,
    control: ExportControl,
    file_name: String,
    folder: String,
}

impl Exporter {
    pub fn new(catalog: Catalog, fetcher: SharedFetcher, archive: Option<SharedArchive>) -> Self {
        let control = ExportControl::for_catalog(&catalog);
        Self {
            catalog,
            fetcher,
            archive,
            control,
            file_name: ARCHIVE_FILE_NAME.into(),
            folder: ARCHIVE_FOLDER.into(),
        }
    }

    pub fn with_names(mut self, file_name: &str, folder: &str) -> Self {
        self.file_name = file_name.to_string();
        self.folder = folder.trim_matches('/').to_string();
        self
    }

    pub fn control(&self) -> &ExportControl {
        &self.control
    }

    pub async fn export(&self) -> Result<ExportArtifact, ExportError> {
        self.export_with_progress(|_| {}).await
    }

    /// Run one export, calling `on_progress` after every fetch attempt.
    pub async fn export_with_progress(
        &self,
        on_progress: impl Fn(u8) + Send + Sync,
    ) -> Result<ExportArtifact, ExportError> {
        if self.control.is_hidden() {
            return Err(ExportError::Hidden);
        }
        let Some(factory) = self.archive.as_ref() else {
            error!("export: archive library not available");
            return Err(ExportError::MissingCapability);
        };
        let guard = self.control.begin()?;

        let mut builder = factory.create();
        let mut progress = Progress::new(self.catalog.total_resources());
        let mut entries = Vec::new();
        let mut skipped = Vec::new();

        for id in self.catalog.identifiers() {
            for kind in ResourceKind::PAIR {
                let path = self.catalog.resource(id, kind);
                match self.fetcher.fetch(&path).await {
                    Ok(bytes) => {
                        let entry = format!("{}/{}", self.folder, path.file_name());
                        debug!("export: add {entry} ({} bytes)", bytes.len());
                        builder.add_file(entry.clone(), bytes);
                        entries.push(entry);
                    }
                    Err(e) => {
                        warn!("Skipping {path} due to fetch error: {e}");
                        skipped.push(path.file_name().to_string());
                    }
                }
                let percent = progress.advance();
                guard.report(percent);
                on_progress(percent);
            }
        }

        guard.generating();
        let bytes = builder.finish().map_err(|e| {
            error!("Error generating ZIP file: {e}");
            ExportError::Serialize(e)
        })?;

        info!(
            "export: {} ({} entries, {} skipped, {} bytes)",
            self.file_name,
            entries.len(),
            skipped.len(),
            bytes.len()
        );

        Ok(ExportArtifact {
            file_name: self.file_name.clone(),
            bytes,
            entries,
            skipped,
        })
    }
}
