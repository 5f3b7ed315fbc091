//! Per-file change subscriptions.
//!
//! Each [`crate::cem::reader::ManifestReader`] tracks exactly one manifest
//! file. The subscription wraps a platform watcher on that file and forwards
//! coarse change/delete events into a tokio channel; dropping the
//! subscription releases the underlying watch.

use std::path::Path;

use notify::{Config as NotifyConfig, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tracing::warn;

/// A change observed on a watched file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileEvent {
    /// The file was created or its content changed.
    Changed,
    /// The file was removed.
    Deleted,
}

/// Keeps a file watch alive; dropping it disposes the watch.
pub struct FileSubscription {
    _watcher: RecommendedWatcher,
}

/// Watches a single file, delivering events on the returned channel.
///
/// Events are mapped down to [`FileEvent`]; access-only notifications are
/// dropped. The notify callback runs on the watcher's own thread, so it
/// feeds the channel with a blocking send.
///
/// # Errors
///
/// Returns an error if the platform watcher cannot be created or the path
/// cannot be watched (typically because the file does not exist yet).
pub fn subscribe(path: &Path) -> notify::Result<(FileSubscription, mpsc::Receiver<FileEvent>)> {
    let (tx, rx) = mpsc::channel(16);

    let mut watcher = RecommendedWatcher::new(
        move |result: notify::Result<Event>| {
            let event = match result {
                Ok(event) => event,
                Err(error) => {
                    warn!(%error, "file watcher error");
                    return;
                }
            };

            let mapped = match event.kind {
                EventKind::Remove(_) => FileEvent::Deleted,
                EventKind::Access(_) => return,
                EventKind::Create(_) | EventKind::Modify(_) | EventKind::Any | EventKind::Other => {
                    FileEvent::Changed
                }
            };

            // Receiver dropped means the reader is gone; nothing to do.
            let _ = tx.blocking_send(mapped);
        },
        NotifyConfig::default(),
    )?;

    watcher.watch(path, RecursiveMode::NonRecursive)?;

    Ok((FileSubscription { _watcher: watcher }, rx))
}
