//! Seams to the collaborators that do the actual network and disk work.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::config::ShareConfig;
use crate::error::Result;
use crate::progress::ProgressRecord;
use crate::tree::FileNode;

/// Sending half of the `download-progress` event stream.
pub type ProgressSender = mpsc::UnboundedSender<ProgressRecord>;

/// Receiving half of the `download-progress` event stream.
pub type ProgressReceiver = mpsc::UnboundedReceiver<ProgressRecord>;

/// One file of a batch download with its local destination.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadItem {
    pub file_path: String,
    pub save_path: PathBuf,
}

impl DownloadItem {
    #[must_use]
    pub fn new(node: &FileNode, base: &Path) -> Self {
        Self {
            file_path: node.id.clone(),
            save_path: save_path_for(base, &node.id),
        }
    }
}

/// Joins the chosen base directory with a node id stripped of one leading
/// separator.
#[must_use]
pub fn save_path_for(base: &Path, id: &str) -> PathBuf {
    base.join(id.strip_prefix('/').unwrap_or(id))
}

/// Remote share service.
///
/// Password problems must be reported as [`crate::Error::PasswordRequired`]
/// or [`crate::Error::PasswordInvalid`] (or as backend text containing the
/// matching marker); every other error is treated as terminal.
#[async_trait]
pub trait ShareBackend: Send + Sync {
    /// Derives the share key from a link, `None` if the link is malformed.
    async fn resolve_share_key(&self, share_link: &str) -> Option<String>;

    /// Fetches the flat node list of the share.
    async fn fetch_tree(&self, share_key: &str, password: Option<&str>) -> Result<Vec<FileNode>>;

    /// Downloads a batch, reporting progress on `progress` while it runs.
    async fn download_files(
        &self,
        share_key: &str,
        items: &[DownloadItem],
        password: Option<&str>,
        progress: &ProgressSender,
    ) -> Result<()>;
}

/// Native directory chooser.
pub trait DirectoryPicker {
    /// Returns the chosen directory, or `None` if the user cancelled.
    ///
    /// # Errors
    ///
    /// Returns an error if the picker could not be shown.
    fn pick_directory(&self) -> Result<Option<PathBuf>>;
}

/// Extracts share keys from links of the form `{base_url}/d/{key}/...`.
#[derive(Debug, Clone)]
pub struct ShareLinkParser {
    pattern: Regex,
}

impl ShareLinkParser {
    /// Builds a parser for the configured share host.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL yields an invalid pattern.
    pub fn new(config: &ShareConfig) -> Result<Self> {
        let base = regex::escape(config.base_url.trim_end_matches('/'));
        let pattern = Regex::new(&format!(r"{base}/d/([^/\s?#]+)/"))?;
        Ok(Self { pattern })
    }

    /// Returns the share key, or `None` for a malformed link.
    #[must_use]
    pub fn parse(&self, share_link: &str) -> Option<String> {
        self.pattern
            .captures(share_link.trim())
            .and_then(|caps| caps.get(1))
            .map(|key| key.as_str().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parser() -> ShareLinkParser {
        ShareLinkParser::new(&ShareConfig::default()).unwrap()
    }

    #[test]
    fn parses_share_key() {
        assert_eq!(
            parser().parse("https://cloud.tsinghua.edu.cn/d/a50b389352f0408b9c1b/"),
            Some("a50b389352f0408b9c1b".to_string())
        );
    }

    #[test]
    fn parses_key_with_trailing_path_and_whitespace() {
        assert_eq!(
            parser().parse("  https://cloud.tsinghua.edu.cn/d/abc123/files/?p=%2Fx  "),
            Some("abc123".to_string())
        );
    }

    #[test]
    fn rejects_malformed_links() {
        let parser = parser();
        assert_eq!(parser.parse("https://cloud.tsinghua.edu.cn/d/abc123"), None);
        assert_eq!(parser.parse("https://example.com/d/abc123/"), None);
        assert_eq!(parser.parse("https://cloud.tsinghua.edu.cn/f/abc123/"), None);
        assert_eq!(parser.parse(""), None);
    }

    #[test]
    fn base_url_is_matched_literally() {
        let config = ShareConfig {
            base_url: "https://files.example.org/".to_string(),
        };
        let parser = ShareLinkParser::new(&config).unwrap();
        assert_eq!(
            parser.parse("https://files.example.org/d/k1/"),
            Some("k1".to_string())
        );
        assert_eq!(parser.parse("https://filesXexample.org/d/k1/"), None);
    }

    #[test]
    fn save_path_strips_one_leading_separator() {
        let base = Path::new("/downloads");
        assert_eq!(
            save_path_for(base, "/a/f.txt"),
            PathBuf::from("/downloads/a/f.txt")
        );
        assert_eq!(save_path_for(base, "rel.txt"), PathBuf::from("/downloads/rel.txt"));
    }

    #[test]
    fn download_item_from_node() {
        let node = FileNode::file("/a/f.txt", "f.txt", "/a", 2048);
        let item = DownloadItem::new(&node, Path::new("/out"));
        assert_eq!(item.file_path, "/a/f.txt");
        assert_eq!(item.save_path, PathBuf::from("/out/a/f.txt"));
    }
}
