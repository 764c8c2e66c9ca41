//! Reading the clipboard and deciding whether its contents are worth offering.

use std::io;
use std::process::{Command, Stdio};

use crate::error::{Error, Result};
use crate::normalize::{looks_like_url, normalize_value};

/// Anything that can hand over the current clipboard text.
pub trait Clipboard {
    /// Returns the clipboard text.
    ///
    /// Fails with [`Error::ClipboardBlocked`] when the clipboard cannot be read
    /// at all. An empty clipboard is an `Ok` empty string.
    fn read_text(&mut self) -> Result<String>;
}

impl<C: Clipboard + ?Sized> Clipboard for &mut C {
    fn read_text(&mut self) -> Result<String> {
        (**self).read_text()
    }
}

impl<C: Clipboard + ?Sized> Clipboard for Box<C> {
    fn read_text(&mut self) -> Result<String> {
        (**self).read_text()
    }
}

/// A clipboard held in memory. Used for tests and when input is piped in.
#[derive(Debug, Clone, Default)]
pub struct MemoryClipboard {
    content: Option<String>,
    reads: usize,
}

impl MemoryClipboard {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            reads: 0,
        }
    }

    /// A clipboard whose every read is refused.
    pub fn denied() -> Self {
        Self {
            content: None,
            reads: 0,
        }
    }

    pub fn set(&mut self, content: impl Into<String>) {
        self.content = Some(content.into());
    }

    /// How many times the clipboard has been read.
    pub fn reads(&self) -> usize {
        self.reads
    }
}

impl Clipboard for MemoryClipboard {
    fn read_text(&mut self) -> Result<String> {
        self.reads += 1;
        match &self.content {
            Some(text) => Ok(text.clone()),
            None => Err(Error::ClipboardBlocked(io::Error::new(
                io::ErrorKind::PermissionDenied,
                "clipboard access denied",
            ))),
        }
    }
}

/// The desktop clipboard, read through the platform's paste utility.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClipboard;

impl SystemClipboard {
    fn candidates() -> &'static [(&'static str, &'static [&'static str])] {
        if cfg!(target_os = "macos") {
            &[("pbpaste", &[])]
        } else if cfg!(target_os = "windows") {
            &[(
                "powershell",
                &["-NoProfile", "-Command", "Get-Clipboard -Raw"],
            )]
        } else {
            &[
                ("wl-paste", &["--no-newline"]),
                ("xclip", &["-selection", "clipboard", "-o"]),
                ("xsel", &["--clipboard", "--output"]),
            ]
        }
    }
}

impl Clipboard for SystemClipboard {
    fn read_text(&mut self) -> Result<String> {
        let mut last_err = io::Error::new(io::ErrorKind::NotFound, "no clipboard utility found");
        for (program, args) in Self::candidates() {
            let output = Command::new(program)
                .args(*args)
                .stdin(Stdio::null())
                .stderr(Stdio::null())
                .output();
            match output {
                Ok(out) if out.status.success() => {
                    tracing::debug!(program, bytes = out.stdout.len(), "read clipboard");
                    return Ok(decode_output(program, out.stdout));
                }
                Ok(out) => {
                    last_err = io::Error::other(format!("{program} exited with {}", out.status));
                }
                Err(e) => last_err = e,
            }
        }
        Err(Error::ClipboardBlocked(last_err))
    }
}

// Invalid UTF-8 is replaced with U+FFFD rather than rejected.
fn decode_output(program: &str, bytes: Vec<u8>) -> String {
    match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(err) => {
            tracing::debug!(
                program,
                valid_up_to = err.utf8_error().valid_up_to(),
                "clipboard output is not valid UTF-8; replacing invalid bytes"
            );
            String::from_utf8_lossy(err.as_bytes()).into_owned()
        }
    }
}

/// What kind of content was found on the clipboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClipboardKind {
    Link,
    Text,
}

impl ClipboardKind {
    /// The line shown above the offer.
    pub fn info(self) -> &'static str {
        match self {
            ClipboardKind::Link => "Link detected on the clipboard.",
            ClipboardKind::Text => "Text detected on the clipboard.",
        }
    }
}

/// Clipboard content offered for import, already normalized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClipboardCandidate {
    pub value: String,
    pub kind: ClipboardKind,
}

/// Decides whether `raw` clipboard text should be offered to the user.
///
/// Blank text, text longer than `max_len` UTF-16 code units and text equal
/// (after normalization) to the current `draft` are not offered. Counting UTF-16
/// units keeps the limit identical to a browser's `String.length`, so a
/// character outside the Basic Multilingual Plane counts twice.
pub fn detect_candidate(raw: &str, draft: &str, max_len: usize) -> Option<ClipboardCandidate> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed.encode_utf16().count() > max_len {
        return None;
    }

    let value = normalize_value(trimmed);
    if value.is_empty() || value == normalize_value(draft) {
        return None;
    }

    let kind = if looks_like_url(raw) {
        ClipboardKind::Link
    } else {
        ClipboardKind::Text
    };
    Some(ClipboardCandidate { value, kind })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_links_and_normalizes_them() {
        let c = detect_candidate("  example.com/x ", "", 800).unwrap();
        assert_eq!(c.value, "https://example.com/x");
        assert_eq!(c.kind, ClipboardKind::Link);
        assert_eq!(c.kind.info(), "Link detected on the clipboard.");
    }

    #[test]
    fn detects_plain_text() {
        let c = detect_candidate("meet at noon", "", 800).unwrap();
        assert_eq!(c.value, "meet at noon");
        assert_eq!(c.kind, ClipboardKind::Text);
    }

    #[test]
    fn skips_blank_and_oversized() {
        assert_eq!(detect_candidate(" \n\t", "", 800), None);
        assert_eq!(detect_candidate(&"a".repeat(801), "", 800), None);
        assert!(detect_candidate(&"a".repeat(800), "", 800).is_some());
        // Length counts UTF-16 units: Hangul is one unit, emoji are two.
        assert!(detect_candidate(&"가".repeat(800), "", 800).is_some());
        assert_eq!(detect_candidate(&"😀".repeat(500), "", 800), None);
        assert!(detect_candidate(&"😀".repeat(400), "", 800).is_some());
    }

    #[test]
    fn skips_what_is_already_drafted() {
        assert_eq!(detect_candidate("example.com", " example.com ", 800), None);
        assert_eq!(
            detect_candidate("www.example.com", "https://www.example.com", 800),
            None
        );
        assert!(detect_candidate("example.com", "other.com", 800).is_some());
    }

    #[test]
    fn invalid_utf8_output_is_replaced() {
        assert_eq!(decode_output("test", b"example.com".to_vec()), "example.com");
        assert_eq!(decode_output("test", b"ab\xffcd".to_vec()), "ab\u{FFFD}cd");
    }

    #[test]
    fn memory_clipboard_counts_reads_and_can_deny() {
        let mut clip = MemoryClipboard::new("hi");
        assert_eq!(clip.read_text().unwrap(), "hi");
        assert_eq!(clip.reads(), 1);

        let mut denied = MemoryClipboard::denied();
        assert!(matches!(denied.read_text(), Err(Error::ClipboardBlocked(_))));
    }
}
