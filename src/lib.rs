//! share-dl - Client-side coordination for browsing and downloading shares.
//!
//! This library rebuilds a share's file tree from a flat node list, tracks
//! which files are selected, retries operations behind a password prompt and
//! folds per-file progress events into an overall percentage. The transport
//! is left to a [`ShareBackend`] implementation.
//!
//! # Example
//!
//! ```no_run
//! use share_dl::{AppConfig, Orchestrator, Outcome, ShareBackend};
//!
//! # async fn example(backend: impl ShareBackend) -> share_dl::Result<()> {
//! let config = AppConfig::load()?;
//! let mut orchestrator = Orchestrator::new(backend, &config);
//!
//! orchestrator.set_share_link("https://cloud.tsinghua.edu.cn/d/abc123/");
//! if orchestrator.resolve().await == Outcome::NeedsPassword {
//!     orchestrator.prompt_mut().set_input("secret");
//!     orchestrator.confirm_password().await;
//! }
//!
//! orchestrator.toggle("/");
//! orchestrator.download().await;
//! println!("{}", orchestrator.overall().label());
//! # Ok(())
//! # }
//! ```

#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

pub mod backend;
pub mod config;
pub mod error;
pub mod format;
pub mod orchestrator;
pub mod password;
pub mod progress;
pub mod selection;
pub mod session;
pub mod tree;

// Re-export main types for convenience
pub use backend::{DirectoryPicker, DownloadItem, ProgressSender, ShareBackend, ShareLinkParser};
pub use config::AppConfig;
pub use error::{Error, Result, ValidationError};
pub use format::format_bytes;
pub use orchestrator::{Orchestrator, Outcome};
pub use password::{PasswordPrompt, PendingAction, PromptState};
pub use progress::{OverallProgress, ProgressRecord, ProgressTracker};
pub use selection::Selection;
pub use session::SessionState;
pub use tree::{FileNode, ShareTree};
