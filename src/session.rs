//! Session state shared by the resolve and download operations.

use crate::progress::ProgressTracker;
use crate::selection::Selection;
use crate::tree::ShareTree;

/// Everything a resolve produces and a download consumes.
///
/// [`SessionState::reset`] is the single point where a new resolve
/// invalidates downstream state.
#[derive(Debug, Clone, Default)]
pub struct SessionState {
    /// Key derived from the last resolved link.
    pub share_key: Option<String>,
    pub tree: ShareTree,
    pub selection: Selection,
    pub progress: ProgressTracker,
    /// Last accepted credential, reused unless an operation overrides it.
    pub share_password: Option<String>,
}

impl SessionState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Clears the share key, nodes, selection and progress.
    ///
    /// The password survives so a password retry can re-resolve with it.
    pub fn reset(&mut self) {
        self.share_key = None;
        self.tree = ShareTree::default();
        self.selection.clear();
        self.progress.clear();
    }

    /// Installs a freshly fetched tree with nothing selected.
    pub fn install_tree(&mut self, tree: ShareTree) {
        self.selection = Selection::seeded(&tree);
        self.tree = tree;
    }
}
