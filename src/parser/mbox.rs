//! Streaming MBOX reader and writer helpers.
//!
//! Folders are scanned line-by-line through a large buffer; only header
//! blocks are kept in memory. Message bodies are read back on demand by
//! offset when they have to be copied or rewritten.

use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use tracing::{trace, warn};

use crate::error::{Result, SpamError};

/// Size of the internal read buffer.
const READ_BUFFER_SIZE: usize = 1024 * 1024;

/// Progress is reported every 4 MB.
const PROGRESS_INTERVAL: u64 = 4 * 1024 * 1024;

/// Byte range of one message inside an MBOX file, separator line included.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MessageSpan {
    pub offset: u64,
    pub length: u64,
}

/// Streaming MBOX parser.
///
/// Tolerant of:
///
/// - Mixed `\n` and `\r\n` line endings
/// - `From ` lines not preceded by a blank line (logs a warning)
/// - Truncated messages at EOF
/// - UTF-8 BOM at the start of the file
pub struct MboxParser {
    path: PathBuf,
    file_size: u64,
}

impl MboxParser {
    /// Create a parser for the given MBOX file.
    ///
    /// Verifies that the file exists, but does NOT validate that it is
    /// actually an MBOX.
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let metadata = std::fs::metadata(&path).map_err(|e| SpamError::open(&path, e))?;
        Ok(Self {
            path,
            file_size: metadata.len(),
        })
    }

    /// Total size of the underlying file in bytes.
    pub fn file_size(&self) -> u64 {
        self.file_size
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Walk every message, handing its span and raw header block to `visit`.
    ///
    /// The header block starts with the `From ` separator line and stops
    /// before the first blank line. `visit` returns `false` to stop early.
    /// Returns the number of messages visited.
    pub fn scan_headers(
        &self,
        visit: &mut dyn FnMut(MessageSpan, &[u8]) -> bool,
        progress: Option<&dyn Fn(u64, u64)>,
    ) -> Result<u64> {
        if self.file_size == 0 {
            return Ok(0);
        }

        let file = File::open(&self.path).map_err(|e| SpamError::io(&self.path, e))?;
        let mut reader = BufReader::with_capacity(READ_BUFFER_SIZE, file);

        let mut count: u64 = 0;
        let mut offset: u64 = 0;
        let mut last_progress: u64 = 0;
        let mut prev_blank = true;
        let mut in_headers = false;
        let mut header_buf: Vec<u8> = Vec::with_capacity(16 * 1024);
        let mut current: Option<(u64, Vec<u8>)> = None;
        let mut line: Vec<u8> = Vec::with_capacity(4096);

        loop {
            line.clear();
            let len = read_line(&mut reader, &mut line).map_err(|e| SpamError::io(&self.path, e))?;
            if len == 0 {
                break;
            }

            if is_mbox_separator(&line) {
                if offset > 0 && !prev_blank {
                    warn!(offset, "Found 'From ' separator without preceding blank line");
                }
                if let Some((start, headers)) = current.take() {
                    let headers = if in_headers { header_buf.clone() } else { headers };
                    let span = MessageSpan {
                        offset: start,
                        length: offset - start,
                    };
                    count += 1;
                    if !visit(span, &headers) {
                        return Ok(count);
                    }
                }
                header_buf.clear();
                header_buf.extend_from_slice(strip_bom(&line));
                in_headers = true;
                current = Some((offset, Vec::new()));
            } else if in_headers {
                if is_blank_line(&line) {
                    in_headers = false;
                    if let Some((_, headers)) = current.as_mut() {
                        std::mem::swap(headers, &mut header_buf);
                    }
                } else {
                    header_buf.extend_from_slice(&line);
                }
            }

            prev_blank = is_blank_line(&line);
            offset += len as u64;

            if let Some(cb) = progress {
                if offset - last_progress >= PROGRESS_INTERVAL {
                    cb(offset, self.file_size);
                    last_progress = offset;
                }
            }
        }

        if let Some((start, headers)) = current {
            let headers = if in_headers { header_buf } else { headers };
            let span = MessageSpan {
                offset: start,
                length: offset - start,
            };
            count += 1;
            visit(span, &headers);
        }

        if let Some(cb) = progress {
            cb(self.file_size, self.file_size);
        }

        trace!(path = %self.path.display(), count, "Scanned MBOX headers");
        Ok(count)
    }

    /// Read the raw bytes of one message.
    pub fn read_span(&self, span: MessageSpan) -> Result<Vec<u8>> {
        read_message_at(&self.path, span)
    }
}

/// Read a single message by seeking straight to it.
pub fn read_message_at(path: &Path, span: MessageSpan) -> Result<Vec<u8>> {
    let mut file = File::open(path).map_err(|e| SpamError::io(path, e))?;
    file.seek(SeekFrom::Start(span.offset))
        .map_err(|e| SpamError::io(path, e))?;
    let mut buffer = vec![0u8; span.length as usize];
    file.read_exact(&mut buffer)
        .map_err(|e| SpamError::io(path, e))?;
    Ok(buffer)
}

/// Append raw messages to an MBOX file, creating it if needed.
///
/// Each message is separated from what precedes it by a blank line.
pub fn append_messages<'a>(
    path: &Path,
    messages: impl IntoIterator<Item = &'a [u8]>,
) -> Result<usize> {
    let mut needs_blank = ends_without_blank_line(path)?;
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| SpamError::io(path, e))?;
    let mut out = std::io::BufWriter::new(file);

    let mut written = 0;
    for raw in messages {
        write_message(&mut out, raw, needs_blank).map_err(|e| SpamError::io(path, e))?;
        needs_blank = !raw.ends_with(b"\n\n") && !raw.ends_with(b"\r\n\r\n");
        written += 1;
    }
    out.flush().map_err(|e| SpamError::io(path, e))?;
    Ok(written)
}

/// Write one message, terminating it with a newline if it lacks one.
pub fn write_message(out: &mut impl Write, raw: &[u8], blank_before: bool) -> std::io::Result<()> {
    if blank_before {
        out.write_all(b"\n")?;
    }
    out.write_all(raw)?;
    if !raw.ends_with(b"\n") {
        out.write_all(b"\n")?;
    }
    Ok(())
}

/// Whether a non-empty file does not already end in a blank line.
fn ends_without_blank_line(path: &Path) -> Result<bool> {
    let mut file = match File::open(path) {
        Ok(f) => f,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(false),
        Err(e) => return Err(SpamError::io(path, e)),
    };
    let len = file.metadata().map_err(|e| SpamError::io(path, e))?.len();
    if len == 0 {
        return Ok(false);
    }
    let tail_len = len.min(2);
    file.seek(SeekFrom::End(-(tail_len as i64)))
        .map_err(|e| SpamError::io(path, e))?;
    let mut tail = Vec::with_capacity(2);
    file.read_to_end(&mut tail)
        .map_err(|e| SpamError::io(path, e))?;
    Ok(tail != b"\n\n")
}

/// Read one line (newline included) into `line`. Returns 0 at EOF.
fn read_line(reader: &mut impl BufRead, line: &mut Vec<u8>) -> std::io::Result<usize> {
    reader.read_until(b'\n', line)
}

fn strip_bom(line: &[u8]) -> &[u8] {
    line.strip_prefix(&[0xEF, 0xBB, 0xBF]).unwrap_or(line)
}

/// Check whether a line is an MBOX separator (`From ` at the start).
fn is_mbox_separator(line: &[u8]) -> bool {
    strip_bom(line).starts_with(b"From ")
}

/// Check whether a line is blank (empty or only whitespace / CR / LF).
fn is_blank_line(line: &[u8]) -> bool {
    line.iter()
        .all(|&b| b == b'\n' || b == b'\r' || b == b' ' || b == b'\t')
}
