//! [`MailStore`] over a directory of mbox files, one file per folder.

use std::collections::BTreeSet;
use std::fs::File;
use std::io::{BufWriter, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::error::{Result, SpamError};
use crate::model::envelope::{MessageEnvelope, MessageUid};
use crate::parser::header;
use crate::parser::mbox::{self, MboxParser, MessageSpan};

use super::{FolderInfo, FolderStatus, MailStore};

/// Files next to mbox folders that are not folders themselves.
const IGNORED_EXTENSIONS: [&str; 4] = ["msf", "lock", "tmp", "dat"];

/// The currently selected folder.
#[derive(Debug)]
struct Selected {
    name: String,
    path: PathBuf,
    /// Message `uid` lives at `spans[uid - 1]`.
    spans: Vec<MessageSpan>,
    deleted: BTreeSet<MessageUid>,
}

impl Selected {
    fn span(&self, uid: MessageUid) -> Result<MessageSpan> {
        uid.0
            .checked_sub(1)
            .and_then(|i| self.spans.get(i as usize))
            .copied()
            .ok_or_else(|| SpamError::UnknownMessage(uid.0, self.name.clone()))
    }
}

/// Local mail folders: `root/INBOX`, `root/Trash`, ...
///
/// Ids are 1-based positions in the selected folder.
#[derive(Debug)]
pub struct MboxFolders {
    root: PathBuf,
    selected: Option<Selected>,
}

impl MboxFolders {
    /// Open a folder directory. The directory must exist.
    pub fn open(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        let meta = std::fs::metadata(&root).map_err(|e| SpamError::open(&root, e))?;
        if !meta.is_dir() {
            return Err(SpamError::FolderNotFound(root.display().to_string()));
        }
        debug!(root = %root.display(), "Opened mbox folder directory");
        Ok(Self {
            root,
            selected: None,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Name of the selected folder, if any.
    pub fn selected(&self) -> Option<&str> {
        self.selected.as_ref().map(|s| s.name.as_str())
    }

    /// Resolve a folder name to its mbox file, which must exist.
    fn folder_path(&self, folder: &str) -> Result<PathBuf> {
        if folder.is_empty() || folder.starts_with('.') || folder.contains(['/', '\\']) {
            return Err(SpamError::FolderNotFound(folder.to_string()));
        }
        let path = self.root.join(folder);
        if path.is_file() {
            Ok(path)
        } else {
            Err(SpamError::FolderNotFound(folder.to_string()))
        }
    }

    fn selected_mut(&mut self) -> Result<&mut Selected> {
        self.selected.as_mut().ok_or(SpamError::NoFolderSelected)
    }

    /// Record message spans of a folder file.
    fn scan_spans(path: &Path) -> Result<Vec<MessageSpan>> {
        let parser = MboxParser::new(path)?;
        let mut spans = Vec::new();
        parser.scan_headers(
            &mut |span, _| {
                spans.push(span);
                true
            },
            None,
        )?;
        Ok(spans)
    }
}

fn is_folder_file(path: &Path) -> bool {
    let hidden = path
        .file_name()
        .and_then(|n| n.to_str())
        .is_none_or(|n| n.starts_with('.'));
    let ignored = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| IGNORED_EXTENSIONS.iter().any(|i| e.eq_ignore_ascii_case(i)));
    path.is_file() && !hidden && !ignored
}

impl MailStore for MboxFolders {
    fn list_folders(&self) -> Result<Vec<FolderInfo>> {
        let entries = std::fs::read_dir(&self.root).map_err(|e| SpamError::io(&self.root, e))?;
        let mut folders = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| SpamError::io(&self.root, e))?;
            let path = entry.path();
            if !is_folder_file(&path) {
                continue;
            }
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            let parser = MboxParser::new(&path)?;
            let messages = parser.scan_headers(&mut |_, _| true, None)?;
            folders.push(FolderInfo {
                name: name.to_string(),
                messages,
                size: parser.file_size(),
            });
        }
        folders.sort_by(|a, b| a.name.cmp(&b.name));
        debug!(count = folders.len(), "Listed folders");
        Ok(folders)
    }

    fn status(&self, folder: &str) -> Result<FolderStatus> {
        let path = self.folder_path(folder)?;
        let messages = MboxParser::new(&path)?.scan_headers(&mut |_, _| true, None)?;
        Ok(FolderStatus {
            name: folder.to_string(),
            messages,
        })
    }

    fn select(&mut self, folder: &str) -> Result<FolderStatus> {
        let path = self.folder_path(folder)?;
        let spans = Self::scan_spans(&path)?;
        let messages = spans.len() as u64;
        info!(folder, messages, "Selected folder");
        self.selected = Some(Selected {
            name: folder.to_string(),
            path,
            spans,
            deleted: BTreeSet::new(),
        });
        Ok(FolderStatus {
            name: folder.to_string(),
            messages,
        })
    }

    fn fetch_envelopes(
        &mut self,
        visit: &mut dyn FnMut(MessageEnvelope) -> bool,
        progress: Option<&dyn Fn(u64, u64)>,
    ) -> Result<u64> {
        let selected = self.selected_mut()?;
        let parser = MboxParser::new(&selected.path)?;
        let mut spans = Vec::with_capacity(selected.spans.len());
        let count = parser.scan_headers(
            &mut |span, headers| {
                spans.push(span);
                let uid = MessageUid(spans.len() as u64);
                visit(header::parse_envelope(headers, uid))
            },
            progress,
        )?;
        // The folder may have grown since selection; a full pass refreshes
        // the id table, a partial one only extends it.
        if spans.len() >= selected.spans.len() {
            selected.spans = spans;
        }
        Ok(count)
    }

    fn copy(&mut self, uids: &[MessageUid], folder: &str) -> Result<usize> {
        let dest = self.folder_path(folder)?;
        let selected = self.selected.as_ref().ok_or(SpamError::NoFolderSelected)?;
        if dest == selected.path {
            warn!(folder, "Copying messages into the selected folder");
        }

        let mut raw = Vec::with_capacity(uids.len());
        for &uid in uids {
            let span = selected.span(uid)?;
            raw.push(mbox::read_message_at(&selected.path, span)?);
        }
        let copied = mbox::append_messages(&dest, raw.iter().map(Vec::as_slice))?;
        info!(from = %selected.name, to = folder, copied, "Copied messages");
        Ok(copied)
    }

    fn mark_deleted(&mut self, uids: &[MessageUid]) -> Result<usize> {
        let selected = self.selected_mut()?;
        for &uid in uids {
            selected.span(uid)?;
        }
        let marked = uids
            .iter()
            .filter(|&&uid| selected.deleted.insert(uid))
            .count();
        debug!(folder = %selected.name, marked, "Marked messages deleted");
        Ok(marked)
    }

    fn expunge(&mut self) -> Result<usize> {
        let selected = self.selected_mut()?;
        if selected.deleted.is_empty() {
            return Ok(0);
        }

        let path = selected.path.clone();
        let tmp = temp_path(&path);
        let mut src = File::open(&path).map_err(|e| SpamError::io(&path, e))?;
        let out = File::create(&tmp).map_err(|e| SpamError::io(&tmp, e))?;
        let mut out = BufWriter::new(out);

        let mut removed = 0;
        for (i, span) in selected.spans.iter().enumerate() {
            if selected.deleted.contains(&MessageUid(i as u64 + 1)) {
                removed += 1;
                continue;
            }
            src.seek(SeekFrom::Start(span.offset))
                .map_err(|e| SpamError::io(&path, e))?;
            std::io::copy(&mut (&mut src).take(span.length), &mut out)
                .map_err(|e| SpamError::io(&tmp, e))?;
        }
        out.flush().map_err(|e| SpamError::io(&tmp, e))?;
        drop(out);

        std::fs::rename(&tmp, &path).map_err(|e| SpamError::io(&path, e))?;
        selected.spans = Self::scan_spans(&path)?;
        selected.deleted.clear();
        info!(
            folder = %selected.name,
            removed,
            remaining = selected.spans.len(),
            "Expunged folder"
        );
        Ok(removed)
    }
}

/// `<folder>.tmp` beside the folder file; dots in the folder name are kept.
fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(".tmp");
    PathBuf::from(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(from: &str, subject: &str) -> String {
        format!(
            "From {from} Thu Jan 04 10:00:00 2024\nFrom: {from}\nSubject: {subject}\n\nbody\n\n"
        )
    }

    fn store_with(inbox: &[(&str, &str)]) -> (tempfile::TempDir, MboxFolders) {
        let dir = tempfile::tempdir().unwrap();
        let text: String = inbox.iter().map(|(f, s)| message(f, s)).collect();
        std::fs::write(dir.path().join("INBOX"), text).unwrap();
        std::fs::write(dir.path().join("Trash"), "").unwrap();
        std::fs::write(dir.path().join("INBOX.msf"), "index").unwrap();
        let store = MboxFolders::open(dir.path()).unwrap();
        (dir, store)
    }

    fn subjects(store: &mut MboxFolders) -> Vec<String> {
        let mut out = Vec::new();
        store
            .fetch_envelopes(
                &mut |env| {
                    out.push(env.subject);
                    true
                },
                None,
            )
            .unwrap();
        out
    }

    #[test]
    fn test_list_folders_skips_index_files() {
        let (_dir, store) = store_with(&[("a@x.com", "one"), ("b@x.com", "two")]);
        let folders = store.list_folders().unwrap();
        let names: Vec<&str> = folders.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, ["INBOX", "Trash"]);
        assert_eq!(folders[0].messages, 2);
        assert_eq!(folders[1].messages, 0);
    }

    #[test]
    fn test_select_unknown_folder() {
        let (_dir, mut store) = store_with(&[]);
        assert!(matches!(store.select("Spam"), Err(SpamError::FolderNotFound(_))));
        assert!(matches!(store.select("../INBOX"), Err(SpamError::FolderNotFound(_))));
    }

    #[test]
    fn test_operations_need_selection() {
        let (_dir, mut store) = store_with(&[("a@x.com", "one")]);
        assert!(matches!(store.expunge(), Err(SpamError::NoFolderSelected)));
        assert!(matches!(
            store.copy(&[MessageUid(1)], "Trash"),
            Err(SpamError::NoFolderSelected)
        ));
    }

    #[test]
    fn test_fetch_assigns_sequential_ids() {
        let (_dir, mut store) = store_with(&[("a@x.com", "one"), ("b@x.com", "two")]);
        store.select("INBOX").unwrap();
        let mut uids = Vec::new();
        store
            .fetch_envelopes(
                &mut |env| {
                    uids.push(env.uid.0);
                    true
                },
                None,
            )
            .unwrap();
        assert_eq!(uids, [1, 2]);
    }

    #[test]
    fn test_copy_mark_expunge() {
        let (dir, mut store) =
            store_with(&[("a@x.com", "one"), ("b@x.com", "two"), ("c@x.com", "three")]);
        store.select("INBOX").unwrap();

        let moved = [MessageUid(1), MessageUid(3)];
        assert_eq!(store.copy(&moved, "Trash").unwrap(), 2);
        assert_eq!(store.mark_deleted(&moved).unwrap(), 2);
        assert_eq!(store.mark_deleted(&moved).unwrap(), 0);
        assert_eq!(store.expunge().unwrap(), 2);

        assert_eq!(subjects(&mut store), ["two"]);
        store.select("Trash").unwrap();
        assert_eq!(subjects(&mut store), ["one", "three"]);
        assert!(!dir.path().join("INBOX.tmp").exists());
    }

    #[test]
    fn test_unknown_uid_is_rejected() {
        let (_dir, mut store) = store_with(&[("a@x.com", "one")]);
        store.select("INBOX").unwrap();
        assert!(matches!(
            store.mark_deleted(&[MessageUid(9)]),
            Err(SpamError::UnknownMessage(9, _))
        ));
        assert!(matches!(
            store.mark_deleted(&[MessageUid(0)]),
            Err(SpamError::UnknownMessage(0, _))
        ));
        assert_eq!(store.expunge().unwrap(), 0);
    }

    #[test]
    fn test_dotted_folder_expunge_uses_own_temp_file() {
        let (dir, mut store) = store_with(&[]);
        let root = dir.path();
        let archive = message("a@x.com", "old") + &message("b@x.com", "keep");
        std::fs::write(root.join("Archive.2024"), archive).unwrap();
        std::fs::write(root.join("Archive.tmp"), "unrelated").unwrap();
        assert_eq!(temp_path(&root.join("Archive.2024")), root.join("Archive.2024.tmp"));

        store.select("Archive.2024").unwrap();
        store.mark_deleted(&[MessageUid(1)]).unwrap();
        assert_eq!(store.expunge().unwrap(), 1);

        assert_eq!(subjects(&mut store), ["keep"]);
        assert!(!root.join("Archive.2024.tmp").exists());
        assert_eq!(std::fs::read_to_string(root.join("Archive.tmp")).unwrap(), "unrelated");
    }
}
