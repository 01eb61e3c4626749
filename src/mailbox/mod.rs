//! Mail store access: folder listing, selection, envelope fetch, and the
//! copy / mark-deleted / expunge primitives relocation is built from.

pub mod mbox_folders;
pub mod relocate;

pub use mbox_folders::MboxFolders;
pub use relocate::{move_to_trash, RelocationReport};

use crate::error::Result;
use crate::model::envelope::{MessageEnvelope, MessageUid};

/// One folder as reported by [`MailStore::list_folders`].
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct FolderInfo {
    pub name: String,
    pub messages: u64,
    /// Size on disk in bytes.
    pub size: u64,
}

/// Result of selecting or inspecting a folder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FolderStatus {
    pub name: String,
    pub messages: u64,
}

/// A mailbox session.
///
/// Message ids are assigned at selection time and stay valid until the
/// next [`expunge`](MailStore::expunge) or reselection.
pub trait MailStore {
    fn list_folders(&self) -> Result<Vec<FolderInfo>>;

    /// Message count of a folder without changing the selection.
    fn status(&self, folder: &str) -> Result<FolderStatus>;

    /// Make `folder` the current folder.
    fn select(&mut self, folder: &str) -> Result<FolderStatus>;

    /// Stream the envelopes of the selected folder in store order.
    ///
    /// `visit` returns `false` to stop early. Returns the number visited.
    fn fetch_envelopes(
        &mut self,
        visit: &mut dyn FnMut(MessageEnvelope) -> bool,
        progress: Option<&dyn Fn(u64, u64)>,
    ) -> Result<u64>;

    /// Copy messages of the selected folder into `folder`. Returns how many
    /// were copied.
    fn copy(&mut self, uids: &[MessageUid], folder: &str) -> Result<usize>;

    /// Flag messages of the selected folder for removal.
    fn mark_deleted(&mut self, uids: &[MessageUid]) -> Result<usize>;

    /// Remove flagged messages from the selected folder. Returns how many
    /// were removed.
    fn expunge(&mut self) -> Result<usize>;
}
