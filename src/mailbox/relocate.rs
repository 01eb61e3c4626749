//! Move-to-trash: copy matched messages to the trash folder, then delete
//! them from the selected folder.

use tracing::{info, warn};

use crate::error::Result;
use crate::model::envelope::MessageUid;

use super::MailStore;

/// What a relocation actually did.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
pub struct RelocationReport {
    pub requested: usize,
    pub copied: usize,
    pub expunged: usize,
    /// Trash message count after copying.
    pub trash_messages: u64,
    /// Selected folder message count after expunging.
    pub remaining: u64,
}

impl RelocationReport {
    /// Every requested message reached the trash and left the source.
    pub fn is_complete(&self) -> bool {
        self.copied == self.requested && self.expunged == self.requested
    }
}

/// Relocate `uids` from `folder` to `trash`.
///
/// `folder` is reselected first so ids refer to its current state. If the
/// copy fails nothing is deleted. Folder counts before and after are
/// checked and logged.
pub fn move_to_trash(
    store: &mut dyn MailStore,
    folder: &str,
    uids: &[MessageUid],
    trash: &str,
) -> Result<RelocationReport> {
    let mut report = RelocationReport {
        requested: uids.len(),
        ..Default::default()
    };
    if uids.is_empty() {
        info!("No messages to move to trash");
        return Ok(report);
    }

    let before = store.select(folder)?;
    let trash_before = store.status(trash)?.messages;
    info!(
        folder,
        messages = before.messages,
        trash,
        trash_messages = trash_before,
        requested = uids.len(),
        "Moving messages to trash"
    );

    report.copied = store.copy(uids, trash)?;
    report.trash_messages = store.status(trash)?.messages;
    let grew_by = report.trash_messages.saturating_sub(trash_before);
    if grew_by != report.copied as u64 {
        warn!(
            trash,
            expected = report.copied,
            actual = grew_by,
            "Trash message count did not grow as expected"
        );
    }

    store.mark_deleted(uids)?;
    report.expunged = store.expunge()?;
    report.remaining = store.status(folder)?.messages;

    info!(
        folder,
        remaining = report.remaining,
        moved = report.expunged,
        "Moved messages to trash"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SpamError;
    use crate::mailbox::{FolderInfo, FolderStatus};
    use crate::model::envelope::MessageEnvelope;

    /// Records calls; copy can be made to fail.
    #[derive(Default)]
    struct Recorder {
        calls: Vec<String>,
        fail_copy: bool,
        inbox: u64,
        trash: u64,
    }

    impl MailStore for Recorder {
        fn list_folders(&self) -> Result<Vec<FolderInfo>> {
            Ok(Vec::new())
        }

        fn status(&self, folder: &str) -> Result<FolderStatus> {
            let messages = if folder == "Trash" { self.trash } else { self.inbox };
            Ok(FolderStatus {
                name: folder.to_string(),
                messages,
            })
        }

        fn select(&mut self, folder: &str) -> Result<FolderStatus> {
            self.calls.push(format!("select {folder}"));
            self.status(folder)
        }

        fn fetch_envelopes(
            &mut self,
            _visit: &mut dyn FnMut(MessageEnvelope) -> bool,
            _progress: Option<&dyn Fn(u64, u64)>,
        ) -> Result<u64> {
            Ok(0)
        }

        fn copy(&mut self, uids: &[MessageUid], folder: &str) -> Result<usize> {
            self.calls.push(format!("copy {} {folder}", uids.len()));
            if self.fail_copy {
                return Err(SpamError::FolderNotFound(folder.to_string()));
            }
            self.trash += uids.len() as u64;
            Ok(uids.len())
        }

        fn mark_deleted(&mut self, uids: &[MessageUid]) -> Result<usize> {
            self.calls.push(format!("mark {}", uids.len()));
            Ok(uids.len())
        }

        fn expunge(&mut self) -> Result<usize> {
            self.calls.push("expunge".to_string());
            self.inbox -= 2;
            Ok(2)
        }
    }

    #[test]
    fn test_copy_then_mark_then_expunge() {
        let mut store = Recorder {
            inbox: 5,
            ..Default::default()
        };
        let report =
            move_to_trash(&mut store, "INBOX", &[MessageUid(1), MessageUid(4)], "Trash").unwrap();
        assert_eq!(
            store.calls,
            ["select INBOX", "copy 2 Trash", "mark 2", "expunge"]
        );
        assert!(report.is_complete());
        assert_eq!(report.trash_messages, 2);
        assert_eq!(report.remaining, 3);
    }

    #[test]
    fn test_failed_copy_deletes_nothing() {
        let mut store = Recorder {
            inbox: 5,
            fail_copy: true,
            ..Default::default()
        };
        assert!(move_to_trash(&mut store, "INBOX", &[MessageUid(1)], "Trash").is_err());
        assert_eq!(store.calls, ["select INBOX", "copy 1 Trash"]);
    }

    #[test]
    fn test_nothing_to_move() {
        let mut store = Recorder::default();
        let report = move_to_trash(&mut store, "INBOX", &[], "Trash").unwrap();
        assert_eq!(report, RelocationReport::default());
        assert!(store.calls.is_empty());
    }
}
