//! The application controller.
//!
//! [`Controller`] owns every piece of application state and is the only
//! thing that mutates it. Each user action maps to one method. Failures
//! never escape: they become notifications, or nothing at all when the
//! outcome no longer matters (an export finishing after shutdown).

use std::path::{Path, PathBuf};
use std::sync::Arc;

use futures::future::{BoxFuture, FutureExt};
use qrgen_core::{
    AddOutcome, ColorChannel, ColorHex, EntryId, FileStore, HistoryEntry, HistoryError,
    HistoryStore, KeyValueStore, Notification, NotificationId, NotificationKind,
    NotificationQueue, PanelPreferences, QrConfig, QrConfigState, ResolvedTheme,
    SignalSubscription, StorageResult, ThemePreference, ThemeResolver, ThemeSignal,
};
use qrgen_renderer::{ExportFormat, ExportPipeline, RenderError};

use crate::config::AppConfig;

/// Shown when saving with no text.
pub const EMPTY_SAVE_MESSAGE: &str = "Please enter text or URL before saving";
/// Shown when exporting with no text.
pub const EMPTY_EXPORT_MESSAGE: &str = "Please enter text or URL to generate QR code";
/// Shown after a save, including one that matched an existing entry.
pub const SAVED_MESSAGE: &str = "QR code saved to history!";
/// Shown after clearing history.
pub const CLEARED_MESSAGE: &str = "History cleared";

/// Owns the editor state, history, notifications, theme, panel layout, and
/// export pipeline.
#[derive(Debug)]
pub struct Controller {
    config: QrConfigState,
    history: HistoryStore,
    notifications: NotificationQueue,
    theme: ThemeResolver,
    panel: PanelPreferences,
    exporter: ExportPipeline,
    signal: Option<SignalSubscription>,
}

impl Controller {
    /// Build a controller over `store`, loading history and preferences.
    ///
    /// A history load failure is reported as a warning notification; the
    /// controller still starts.
    #[must_use]
    pub fn new(store: Arc<dyn KeyValueStore>, exporter: ExportPipeline, prefers_dark: bool) -> Self {
        let notifications = NotificationQueue::new();

        let mut history = HistoryStore::new(store.clone());
        if let Err(e) = history.load() {
            report_history_failure(&notifications, &e);
        }

        let theme = ThemeResolver::new(store.clone(), prefers_dark);
        let panel = PanelPreferences::load(store);

        tracing::debug!(
            "Controller ready: {} history entries, theme {}",
            history.len(),
            theme.resolved()
        );

        Self {
            config: QrConfigState::new(),
            history,
            notifications,
            theme,
            panel,
            exporter,
            signal: None,
        }
    }

    /// Open the file-backed store described by `config`.
    ///
    /// An unreadable storage file is moved aside and reported as a warning
    /// notification; the controller starts from defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the data directory cannot be created or the
    /// existing storage file cannot be read.
    pub fn open(config: &AppConfig) -> StorageResult<Self> {
        let store = FileStore::open_with_capacity(&config.data_dir, config.storage_quota)?;
        tracing::info!("Using storage at {}", store.path().display());
        let quarantined = store.quarantined().map(Path::to_path_buf);

        let controller = Self::new(
            Arc::new(store),
            ExportPipeline::with_defaults(),
            config.prefers_dark,
        );
        if let Some(aside) = quarantined {
            controller.notifications.enqueue(
                format!("Saved data was unreadable and has been reset (kept at {})", aside.display()),
                NotificationKind::Warning,
            );
        }
        Ok(controller)
    }

    // ---------------------------------------------------------------------
    // Editor
    // ---------------------------------------------------------------------

    /// The configuration being edited.
    #[must_use]
    pub fn config(&self) -> &QrConfig {
        self.config.config()
    }

    /// Replace the text.
    pub fn set_text(&mut self, text: impl Into<String>) {
        self.config.set_text(text);
    }

    /// Replace one color.
    pub fn set_color(&mut self, channel: ColorChannel, color: impl Into<ColorHex>) {
        self.config.set_color(channel, color);
    }

    /// Empty the text, keeping colors.
    pub fn clear_text(&mut self) {
        self.config.clear_text();
    }

    // ---------------------------------------------------------------------
    // History
    // ---------------------------------------------------------------------

    /// Save the current configuration.
    ///
    /// Blank text is refused with an error notification. A configuration
    /// already in history is reported as saved without adding anything.
    pub fn save_to_history(&mut self) -> AddOutcome {
        if !self.config.has_renderable_text() {
            self.notifications
                .enqueue(EMPTY_SAVE_MESSAGE, NotificationKind::Error);
            return AddOutcome::EmptyIgnored;
        }

        let snapshot = self.config.snapshot();
        let outcome = match self.history.add(&snapshot) {
            Ok(outcome) => outcome,
            Err(e) => {
                report_history_failure(&self.notifications, &e);
                // The entry is in memory even though it was not persisted.
                match self.history.entries().first() {
                    Some(front) if front.config.same_design(&snapshot) => AddOutcome::Added(front.id),
                    _ => AddOutcome::DuplicateIgnored,
                }
            }
        };

        self.notifications
            .enqueue(SAVED_MESSAGE, NotificationKind::Success);
        outcome
    }

    /// Copy a history entry into the editor.
    ///
    /// Returns `false` if no entry has that ID.
    pub fn load_from_history(&mut self, id: EntryId) -> bool {
        let Some(entry) = self.history.get(id) else {
            tracing::debug!("No history entry {id}");
            return false;
        };
        self.config.load(entry.config.clone());
        true
    }

    /// Remove every history entry.
    pub fn clear_history(&mut self) {
        match self.history.clear() {
            Ok(()) => {
                self.notifications
                    .enqueue(CLEARED_MESSAGE, NotificationKind::Success);
            }
            Err(e) => report_history_failure(&self.notifications, &e),
        }
    }

    /// Entries whose text contains `query`, case-insensitively.
    #[must_use]
    pub fn search_history(&self, query: &str) -> Vec<&HistoryEntry> {
        self.history.search(query)
    }

    /// All entries, newest first.
    #[must_use]
    pub fn history(&self) -> &[HistoryEntry] {
        self.history.entries()
    }

    // ---------------------------------------------------------------------
    // Export
    // ---------------------------------------------------------------------

    /// Export the current configuration into `out_dir`.
    ///
    /// The returned future owns a snapshot of the configuration, so the
    /// controller stays usable while a PNG decode is pending, and later edits
    /// do not affect the output. Resolves to the written path, or `None` if
    /// the export failed or was abandoned.
    pub fn export(
        &self,
        format: ExportFormat,
        out_dir: impl Into<PathBuf>,
    ) -> BoxFuture<'static, Option<PathBuf>> {
        let snapshot = self.config.snapshot();
        let exporter = self.exporter.clone();
        let notifications = self.notifications.clone();
        let out_dir = out_dir.into();

        async move {
            if !snapshot.has_renderable_text() {
                notifications.enqueue(EMPTY_EXPORT_MESSAGE, NotificationKind::Error);
                return None;
            }

            let file = match exporter.export(&snapshot, format).await {
                Ok(file) => file,
                Err(RenderError::Invalidated) => {
                    tracing::debug!("Export abandoned after shutdown");
                    return None;
                }
                Err(e) => {
                    tracing::warn!("Export failed: {e}");
                    notifications.enqueue(export_failure_message(&e), NotificationKind::Error);
                    return None;
                }
            };

            match file.write_to(&out_dir) {
                Ok(path) => {
                    notifications.enqueue(
                        format!(
                            "QR code downloaded as {}!",
                            format.extension().to_ascii_uppercase()
                        ),
                        NotificationKind::Success,
                    );
                    Some(path)
                }
                Err(e) => {
                    tracing::warn!("Failed to write {}: {e}", file.file_name);
                    notifications.enqueue("Failed to save QR code file", NotificationKind::Error);
                    None
                }
            }
        }
        .boxed()
    }

    // ---------------------------------------------------------------------
    // Theme and layout
    // ---------------------------------------------------------------------

    /// Change the theme preference.
    pub fn set_theme(&self, preference: ThemePreference) -> ResolvedTheme {
        match self.theme.set_preference(preference) {
            Ok(resolved) => resolved,
            Err(e) => {
                tracing::warn!("Failed to persist theme: {e}");
                self.notifications.enqueue(
                    "Theme changed but could not be saved",
                    NotificationKind::Warning,
                );
                self.theme.resolved()
            }
        }
    }

    /// The theme resolver.
    #[must_use]
    pub fn theme(&self) -> &ThemeResolver {
        &self.theme
    }

    /// Follow an environment signal until [`Controller::shutdown`].
    ///
    /// Replaces any previous subscription.
    pub fn attach_theme_signal(&mut self, signal: &ThemeSignal) {
        match self.theme.attach(signal) {
            Ok(subscription) => self.signal = Some(subscription),
            Err(e) => tracing::warn!("Not following environment theme: {e}"),
        }
    }

    /// Collapse or expand the history panel, returning the new state.
    pub fn toggle_history_panel(&mut self) -> bool {
        if let Err(e) = self.panel.toggle_collapsed() {
            tracing::warn!("Failed to persist panel state: {e}");
            self.notifications.enqueue(
                "Panel layout could not be saved",
                NotificationKind::Warning,
            );
        }
        self.panel.is_collapsed()
    }

    /// Whether the history panel is collapsed.
    #[must_use]
    pub fn is_history_collapsed(&self) -> bool {
        self.panel.is_collapsed()
    }

    // ---------------------------------------------------------------------
    // Notifications
    // ---------------------------------------------------------------------

    /// Visible notifications, oldest first.
    #[must_use]
    pub fn notifications(&self) -> Vec<Notification> {
        self.notifications.notifications()
    }

    /// Dismiss a notification early.
    pub fn dismiss_notification(&self, id: NotificationId) -> bool {
        self.notifications.dismiss(id)
    }

    /// Stop the export pipeline and release the environment subscription.
    ///
    /// Exports still decoding resolve to `None` without a notification.
    pub fn shutdown(&mut self) {
        self.exporter.invalidate();
        if let Some(subscription) = self.signal.take() {
            subscription.unsubscribe();
        }
        tracing::info!("Controller shut down");
    }
}

fn report_history_failure(notifications: &NotificationQueue, error: &HistoryError) {
    tracing::warn!("History persistence failed: {error}");
    let message = match error {
        HistoryError::PersistenceRead(_) => "Saved history could not be loaded",
        HistoryError::PersistenceWrite(_) => "History could not be saved to storage",
    };
    notifications.enqueue(message, NotificationKind::Warning);
}

fn export_failure_message(error: &RenderError) -> &'static str {
    match error {
        RenderError::RasterDecode(_) | RenderError::RasterEncode(_) => "Failed to generate PNG image",
        _ => "Failed to generate QR code",
    }
}
