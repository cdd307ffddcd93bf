//! Sequencing of the resolve and download operations.
//!
//! The orchestrator is driven through `&mut self`, one event at a time.
//! It is the only component that talks to the [`ShareBackend`], and it owns
//! the single user-visible message slot and the loading flag.

use std::path::{Path, PathBuf};

use tokio::sync::mpsc;

use crate::backend::{
    DirectoryPicker, DownloadItem, ProgressReceiver, ProgressSender, ShareBackend,
};
use crate::config::AppConfig;
use crate::error::{Error, ValidationError};
use crate::password::{PasswordPrompt, PendingAction};
use crate::progress::{OverallProgress, ProgressRecord};
use crate::session::SessionState;
use crate::tree::{FileNode, ShareTree, TreeRow};

/// Message shown after a batch download succeeds.
pub const DOWNLOAD_COMPLETE_MESSAGE: &str = "Download complete";

/// How an operation ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Completed,
    /// A local precondition failed; the backend was not contacted.
    Invalid(ValidationError),
    /// The password prompt is open and the operation will be replayed.
    NeedsPassword,
    /// An unclassified failure ended the attempt.
    Failed,
    /// Nothing happened (e.g. confirming with no prompt open).
    Ignored,
}

pub struct Orchestrator<B: ShareBackend> {
    backend: B,
    session: SessionState,
    prompt: PasswordPrompt,
    share_link: String,
    save_dir: Option<PathBuf>,
    message: Option<String>,
    loading: bool,
    progress_tx: ProgressSender,
    progress_rx: ProgressReceiver,
}

impl<B: ShareBackend> Orchestrator<B> {
    /// Creates an orchestrator and subscribes to the progress stream.
    pub fn new(backend: B, config: &AppConfig) -> Self {
        let (progress_tx, progress_rx) = mpsc::unbounded_channel();
        Self {
            backend,
            session: SessionState::new(),
            prompt: PasswordPrompt::new(),
            share_link: String::new(),
            save_dir: config.paths.download_dir.clone(),
            message: None,
            loading: false,
            progress_tx,
            progress_rx,
        }
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    pub const fn backend(&self) -> &B {
        &self.backend
    }

    pub const fn session(&self) -> &SessionState {
        &self.session
    }

    pub const fn prompt(&self) -> &PasswordPrompt {
        &self.prompt
    }

    /// Mutable access to the prompt for editing the typed credential.
    pub fn prompt_mut(&mut self) -> &mut PasswordPrompt {
        &mut self.prompt
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub const fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn share_link(&self) -> &str {
        &self.share_link
    }

    pub fn set_share_link(&mut self, link: impl Into<String>) {
        self.share_link = link.into();
    }

    pub fn save_dir(&self) -> Option<&Path> {
        self.save_dir.as_deref()
    }

    pub fn set_save_dir(&mut self, dir: impl Into<PathBuf>) {
        self.save_dir = Some(dir.into());
    }

    /// A sender backends or event bridges can use to publish progress.
    pub fn progress_sender(&self) -> ProgressSender {
        self.progress_tx.clone()
    }

    // ------------------------------------------------------------------
    // Derived values, recomputed on every call
    // ------------------------------------------------------------------

    pub fn rows(&self) -> Vec<TreeRow<'_>> {
        self.session.tree.rows()
    }

    pub fn selected_files(&self) -> Vec<&FileNode> {
        self.session.selection.selected_files(&self.session.tree)
    }

    pub fn overall(&self) -> OverallProgress {
        self.session
            .progress
            .overall(&self.session.tree, self.selected_files())
    }

    pub fn is_checked(&self, id: &str) -> bool {
        self.session.selection.is_checked(id)
    }

    // ------------------------------------------------------------------
    // User input
    // ------------------------------------------------------------------

    /// Toggles the checkbox of `id`. Returns the new value, or `None` for an
    /// unknown id.
    pub fn toggle(&mut self, id: &str) -> Option<bool> {
        let node = self.session.tree.get(id)?;
        Some(self.session.selection.toggle(&self.session.tree, node))
    }

    /// Asks `picker` for a destination directory.
    pub fn pick_directory(&mut self, picker: &impl DirectoryPicker) {
        self.message = None;
        match picker.pick_directory() {
            Ok(Some(dir)) => {
                log::info!("Download directory set to {}", dir.display());
                self.save_dir = Some(dir);
            }
            Ok(None) => {}
            Err(e) => self.message = Some(format!("Failed to open directory picker: {e}")),
        }
    }

    // ------------------------------------------------------------------
    // Progress stream
    // ------------------------------------------------------------------

    /// Applies one progress event.
    pub fn apply_progress(&mut self, record: ProgressRecord) {
        self.session.progress.apply(record);
    }

    /// Applies every event already waiting on the stream. Returns how many
    /// were applied.
    pub fn pump_progress(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(record) = self.progress_rx.try_recv() {
            self.session.progress.apply(record);
            applied += 1;
        }
        applied
    }

    fn discard_progress(&mut self) -> usize {
        let mut discarded = 0;
        while self.progress_rx.try_recv().is_ok() {
            discarded += 1;
        }
        discarded
    }

    /// Waits for the next progress event and applies it.
    pub async fn next_progress(&mut self) -> bool {
        match self.progress_rx.recv().await {
            Some(record) => {
                self.session.progress.apply(record);
                true
            }
            None => false,
        }
    }

    // ------------------------------------------------------------------
    // Resolve
    // ------------------------------------------------------------------

    /// Resolves the current share link from scratch, forgetting any
    /// previously accepted password.
    pub async fn resolve(&mut self) -> Outcome {
        self.session.share_password = None;
        self.resolve_with(None).await
    }

    async fn resolve_with(&mut self, password: Option<String>) -> Outcome {
        // Events buffered before the reset belong to the previous share.
        let stale = self.discard_progress();
        if stale > 0 {
            log::debug!("Discarded {stale} progress event(s) from the previous share");
        }
        self.session.reset();
        self.message = None;
        self.loading = true;
        let outcome = self.run_resolve(password).await;
        self.loading = false;
        outcome
    }

    async fn run_resolve(&mut self, password: Option<String>) -> Outcome {
        let link = self.share_link.trim().to_string();
        if link.is_empty() {
            return self.reject(ValidationError::EmptyLink);
        }

        let Some(share_key) = self.backend.resolve_share_key(&link).await else {
            return self.reject(ValidationError::MalformedLink);
        };
        log::info!("Resolving share {share_key}");

        match self.backend.fetch_tree(&share_key, password.as_deref()).await {
            Ok(nodes) => {
                log::info!("Share {share_key} lists {} nodes", nodes.len());
                self.session.share_key = Some(share_key);
                self.session.install_tree(ShareTree::new(nodes));
                Outcome::Completed
            }
            Err(e) => self.fail(PendingAction::Resolve, &e, "Failed to resolve share"),
        }
    }

    // ------------------------------------------------------------------
    // Download
    // ------------------------------------------------------------------

    /// Downloads the selected files using the session password, if any.
    pub async fn download(&mut self) -> Outcome {
        self.download_with(None).await
    }

    async fn download_with(&mut self, password_override: Option<String>) -> Outcome {
        let Some(share_key) = self.session.share_key.clone() else {
            return self.reject(ValidationError::NotResolved);
        };
        let Some(save_dir) = self.save_dir.clone().filter(|d| !d.as_os_str().is_empty()) else {
            return self.reject(ValidationError::NoSaveDir);
        };
        let selected: Vec<FileNode> = self.selected_files().into_iter().cloned().collect();
        if selected.is_empty() {
            return self.reject(ValidationError::NothingSelected);
        }

        self.message = None;
        self.loading = true;
        let password = password_override.or_else(|| self.session.share_password.clone());
        let outcome = self
            .run_download(&share_key, &save_dir, &selected, password)
            .await;
        self.loading = false;
        outcome
    }

    async fn run_download(
        &mut self,
        share_key: &str,
        save_dir: &Path,
        selected: &[FileNode],
        password: Option<String>,
    ) -> Outcome {
        self.session.progress.seed_queued(selected);
        let items: Vec<DownloadItem> = selected
            .iter()
            .map(|node| DownloadItem::new(node, save_dir))
            .collect();
        log::info!(
            "Downloading {} file(s) from share {share_key} into {}",
            items.len(),
            save_dir.display()
        );

        let result = {
            let call = self.backend.download_files(
                share_key,
                &items,
                password.as_deref(),
                &self.progress_tx,
            );
            tokio::pin!(call);

            loop {
                tokio::select! {
                    result = &mut call => break result,
                    Some(record) = self.progress_rx.recv() => self.session.progress.apply(record),
                }
            }
        };
        // Events sent right before the call returned.
        self.pump_progress();

        match result {
            Ok(()) => {
                log::info!("Download of {} file(s) finished", items.len());
                self.message = Some(DOWNLOAD_COMPLETE_MESSAGE.to_string());
                Outcome::Completed
            }
            Err(e) => self.fail(PendingAction::Download, &e, "Download failed"),
        }
    }

    // ------------------------------------------------------------------
    // Password prompt
    // ------------------------------------------------------------------

    /// Confirms the typed password and replays the pending operation with
    /// it.
    pub async fn confirm_password(&mut self) -> Outcome {
        let retry = match self.prompt.confirm() {
            Ok(retry) => retry,
            Err(e) => {
                return match e.validation() {
                    Some(validation) => self.reject(validation),
                    None => Outcome::Ignored,
                };
            }
        };

        self.session.share_password = Some(retry.password.clone());
        match retry.action {
            PendingAction::Resolve => self.resolve_with(Some(retry.password)).await,
            PendingAction::Download => self.download_with(Some(retry.password)).await,
        }
    }

    /// Closes the prompt without replaying anything.
    pub fn cancel_password(&mut self) {
        if let Some(action) = self.prompt.cancel() {
            log::info!("Password prompt for {action:?} cancelled");
        }
    }

    // ------------------------------------------------------------------
    // Failure handling
    // ------------------------------------------------------------------

    fn reject(&mut self, error: ValidationError) -> Outcome {
        log::warn!("Rejected: {error}");
        self.message = Some(error.to_string());
        Outcome::Invalid(error)
    }

    fn fail(&mut self, action: PendingAction, error: &Error, context: &str) -> Outcome {
        if let Some(failure) = error.password_failure() {
            if let Some(message) = self.prompt.intercept(action, failure) {
                self.message = Some(message.to_string());
            }
            return Outcome::NeedsPassword;
        }

        log::error!("{context}: {error}");
        if action == PendingAction::Resolve {
            self.session.share_key = None;
        }
        self.message = Some(format!("{context}: {error}"));
        Outcome::Failed
    }
}
