//! The draft / locked state machine behind the generator.
//!
//! Typing only changes the draft. The QR code follows the *locked* value, which
//! changes on [`Session::save`], and the error correction level, which changes on
//! [`Session::toggle_ecc`]. Whenever either of those moves, the code is rendered
//! again; nothing else triggers a render.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use chrono::{Local, NaiveTime};

use crate::clipboard::{detect_candidate, Clipboard, ClipboardCandidate};
use crate::config::Settings;
use crate::ecc::EccLevel;
use crate::error::{Error, Result};
use crate::normalize::normalize_value;
use crate::render::{self, RenderOptions, Rendered};

/// What [`Session::open_now`] decided.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NowQr {
    /// Nothing has been saved yet.
    NotSaved,
    /// The saved value is a web link and should be opened.
    Open(String),
    /// The saved value is plain text.
    NotALink,
}

#[derive(Debug, Clone)]
struct Flash {
    message: String,
    until: Instant,
}

pub struct Session<C> {
    clipboard: C,

    margin: u32,
    scale: u32,
    placeholder: String,
    download_name: String,
    output_dir: PathBuf,
    clipboard_max_len: usize,
    toast_for: Duration,
    highlight_for: Duration,

    draft: String,
    locked: String,
    ecc: EccLevel,
    error: Option<String>,

    candidate: Option<ClipboardCandidate>,
    clipboard_checked: bool,

    saved_at: Option<String>,
    toast: Option<Flash>,
    errors_raised: u64,
    toasts_shown: u64,
    highlight_until: Option<Instant>,

    rendered_key: Option<(String, EccLevel)>,
    preview: Option<Rendered>,
    ready: bool,
}

impl<C: Clipboard> Session<C> {
    /// Starts a session and renders the placeholder code.
    pub fn new(clipboard: C, settings: &Settings) -> Result<Self> {
        let opts = settings.render_options()?;
        let mut session = Self {
            clipboard,
            margin: opts.margin,
            scale: opts.scale,
            placeholder: settings.placeholder.clone(),
            download_name: settings.download_name.clone(),
            output_dir: settings.output_dir.clone(),
            clipboard_max_len: settings.clipboard_max_len,
            toast_for: settings.toast_duration(),
            highlight_for: settings.highlight_duration(),
            draft: String::new(),
            locked: String::new(),
            ecc: opts.ecc,
            error: None,
            candidate: None,
            clipboard_checked: false,
            saved_at: None,
            toast: None,
            errors_raised: 0,
            toasts_shown: 0,
            highlight_until: None,
            rendered_key: None,
            preview: None,
            ready: false,
        };
        session.refresh();
        Ok(session)
    }

    pub fn draft(&self) -> &str {
        &self.draft
    }

    pub fn set_draft(&mut self, text: impl Into<String>) {
        self.draft = text.into();
    }

    /// The saved value, normalized. Empty until the first successful save.
    pub fn locked_value(&self) -> String {
        normalize_value(&self.locked)
    }

    pub fn ecc(&self) -> EccLevel {
        self.ecc
    }

    /// The message currently shown under the input, if any.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Counts every error raised, so a front end can tell a repeated message
    /// from one it already showed.
    pub fn errors_raised(&self) -> u64 {
        self.errors_raised
    }

    /// Counts every toast shown, including repeats of the same message.
    pub fn toasts_shown(&self) -> u64 {
        self.toasts_shown
    }

    pub fn candidate(&self) -> Option<&ClipboardCandidate> {
        self.candidate.as_ref()
    }

    /// Local `HH:MM` of the last successful save.
    pub fn saved_at(&self) -> Option<&str> {
        self.saved_at.as_deref()
    }

    /// True once the code for the current locked value and level is drawn.
    pub fn is_ready(&self) -> bool {
        self.ready
    }

    pub fn preview(&self) -> Option<&Rendered> {
        self.preview.as_ref()
    }

    pub fn toast_at(&self, now: Instant) -> Option<&str> {
        self.toast
            .as_ref()
            .filter(|t| now < t.until)
            .map(|t| t.message.as_str())
    }

    pub fn toast(&self) -> Option<&str> {
        self.toast_at(Instant::now())
    }

    pub fn is_highlighted_at(&self, now: Instant) -> bool {
        self.highlight_until.is_some_and(|until| now < until)
    }

    pub fn is_highlighted(&self) -> bool {
        self.is_highlighted_at(Instant::now())
    }

    /// What the preview encodes: the locked value, or the placeholder before any save.
    pub fn payload(&self) -> String {
        let locked = self.locked_value();
        if locked.is_empty() {
            self.placeholder.clone()
        } else {
            locked
        }
    }

    fn render_options(&self) -> RenderOptions {
        RenderOptions {
            margin: self.margin,
            scale: self.scale,
            ecc: self.ecc,
        }
    }

    fn show_toast(&mut self, message: impl Into<String>) {
        let message = message.into();
        tracing::debug!(%message, "toast");
        self.toasts_shown += 1;
        self.toast = Some(Flash {
            message,
            until: Instant::now() + self.toast_for,
        });
    }

    fn pulse_highlight(&mut self) {
        self.highlight_until = Some(Instant::now() + self.highlight_for);
    }

    fn raise(&mut self, message: String) {
        self.errors_raised += 1;
        self.error = Some(message);
    }

    fn fail(&mut self, err: Error) -> Error {
        tracing::debug!(error = %err, "session error");
        self.raise(err.to_string());
        err
    }

    /// Renders again if the locked value or level changed since the last render.
    ///
    /// Returns whether a render was attempted.
    pub fn refresh(&mut self) -> bool {
        let key = (self.locked_value(), self.ecc);
        if self.rendered_key.as_ref() == Some(&key) {
            return false;
        }

        self.error = None;
        self.ready = false;
        let payload = self.payload();
        match render::render(&payload, &self.render_options()) {
            Ok(rendered) => {
                self.preview = Some(rendered);
                self.ready = true;
            }
            Err(err) => {
                tracing::warn!(error = %err, chars = payload.chars().count(), "QR render failed");
                self.preview = None;
                self.raise(err.to_string());
            }
        }
        self.rendered_key = Some(key);
        true
    }

    /// Looks at the clipboard once per session and offers its content for import.
    ///
    /// Clipboard failures are ignored. Later calls do nothing.
    pub fn detect_clipboard(&mut self) -> Option<&ClipboardCandidate> {
        if self.clipboard_checked {
            return None;
        }
        self.clipboard_checked = true;

        let raw = match self.clipboard.read_text() {
            Ok(raw) => raw,
            Err(err) => {
                tracing::debug!(error = %err, "clipboard detection skipped");
                return None;
            }
        };

        self.candidate = detect_candidate(&raw, &self.draft, self.clipboard_max_len);
        if let Some(candidate) = &self.candidate {
            tracing::info!(kind = ?candidate.kind, "clipboard candidate found");
        }
        self.candidate.as_ref()
    }

    /// Moves the offered clipboard content into the draft.
    ///
    /// Returns false when there was nothing on offer.
    pub fn import_clipboard(&mut self) -> bool {
        match self.candidate.take() {
            Some(candidate) => {
                self.draft = candidate.value;
                self.error = None;
                true
            }
            None => false,
        }
    }

    pub fn dismiss_clipboard(&mut self) {
        self.candidate = None;
    }

    /// Reads the clipboard into the draft, normalized.
    pub fn paste(&mut self) -> Result<&str> {
        let raw = match self.clipboard.read_text() {
            Ok(raw) => raw,
            Err(Error::ClipboardBlocked(e)) => return Err(self.fail(Error::ClipboardBlocked(e))),
            Err(other) => {
                let blocked = Error::ClipboardBlocked(std::io::Error::other(other.to_string()));
                return Err(self.fail(blocked));
            }
        };

        let normalized = normalize_value(&raw);
        if normalized.is_empty() {
            return Err(self.fail(Error::ClipboardEmpty));
        }

        self.draft = normalized;
        self.error = None;
        self.candidate = None;
        Ok(&self.draft)
    }

    /// Empties the draft. The saved value and the QR code stay as they are.
    pub fn clear(&mut self) {
        self.draft.clear();
        self.error = None;
    }

    /// Locks the normalized draft in and renders it, stamping the current local time.
    pub fn save(&mut self) -> Result<String> {
        self.save_at(Local::now().time())
    }

    pub fn save_at(&mut self, time: NaiveTime) -> Result<String> {
        let normalized = normalize_value(&self.draft);
        if normalized.is_empty() {
            return Err(self.fail(Error::EmptyDraft));
        }

        self.locked = normalized;
        self.error = None;
        self.saved_at = Some(time.format("%H:%M").to_string());
        tracing::info!(ecc = %self.ecc, chars = self.locked.chars().count(), "saved");

        self.show_toast("Saved");
        self.pulse_highlight();
        self.refresh();
        Ok(self.locked_value())
    }

    /// Cycles the error correction level and renders again.
    pub fn toggle_ecc(&mut self) -> EccLevel {
        self.ecc = self.ecc.next();
        self.show_toast(format!("ECC: {}", self.ecc));
        self.pulse_highlight();
        self.refresh();
        self.ecc
    }

    /// Jumps straight to `level` without the toast and highlight of a toggle.
    pub fn set_ecc(&mut self, level: EccLevel) {
        self.ecc = level;
        self.refresh();
    }

    /// Decides what "QR now" should do with the saved value.
    pub fn open_now(&mut self) -> NowQr {
        let locked = self.locked_value();
        if locked.is_empty() {
            self.show_toast("Save first");
            return NowQr::NotSaved;
        }

        let url = normalize_value(&locked);
        if url.starts_with("http") {
            NowQr::Open(url)
        } else {
            self.show_toast("This QR is not a link");
            NowQr::NotALink
        }
    }

    /// Writes the current code as PNG to `dir` (or the configured output
    /// directory) under the configured download name.
    pub fn download(&self, dir: Option<&Path>) -> Result<PathBuf> {
        let preview = self.preview.as_ref().ok_or(Error::NothingRendered)?;
        let dir = dir.unwrap_or(&self.output_dir);
        render::save_png(&preview.image, dir, &self.download_name)
    }

    /// The current code as a `data:image/png;base64,...` URL.
    pub fn data_url(&self) -> Result<String> {
        let preview = self.preview.as_ref().ok_or(Error::NothingRendered)?;
        render::to_data_url(&preview.image)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clipboard::{ClipboardKind, MemoryClipboard};

    fn session(clip: MemoryClipboard) -> Session<MemoryClipboard> {
        Session::new(clip, &Settings::default()).unwrap()
    }

    fn noon() -> NaiveTime {
        NaiveTime::from_hms_opt(12, 5, 0).unwrap()
    }

    #[test]
    fn starts_with_placeholder_preview() {
        let s = session(MemoryClipboard::default());
        assert!(s.is_ready());
        assert_eq!(s.locked_value(), "");
        assert_eq!(s.payload(), "https://example.com");
        assert_eq!(s.preview().unwrap().payload, "https://example.com");
        assert_eq!(s.ecc(), EccLevel::Medium);
    }

    #[test]
    fn drafting_does_not_touch_the_code() {
        let mut s = session(MemoryClipboard::default());
        s.set_draft("example.org");
        assert!(!s.refresh());
        assert_eq!(s.preview().unwrap().payload, "https://example.com");
    }

    #[test]
    fn save_locks_normalized_draft() {
        let mut s = session(MemoryClipboard::default());
        s.set_draft("  example.org/a ");
        let locked = s.save_at(noon()).unwrap();

        assert_eq!(locked, "https://example.org/a");
        assert_eq!(s.preview().unwrap().payload, "https://example.org/a");
        assert_eq!(s.saved_at(), Some("12:05"));
        assert_eq!(s.toast(), Some("Saved"));
        assert!(s.is_highlighted());
        assert_eq!(s.error(), None);
        // The draft keeps what was typed.
        assert_eq!(s.draft(), "  example.org/a ");
    }

    #[test]
    fn save_with_empty_draft_sets_error_and_keeps_lock() {
        let mut s = session(MemoryClipboard::default());
        s.set_draft("first");
        s.save_at(noon()).unwrap();

        s.set_draft("   ");
        assert!(matches!(s.save_at(noon()), Err(Error::EmptyDraft)));
        assert_eq!(s.error(), Some("Enter some content before saving."));
        assert_eq!(s.locked_value(), "first");
    }

    #[test]
    fn resaving_the_same_value_does_not_rerender() {
        let mut s = session(MemoryClipboard::default());
        s.set_draft("same");
        s.save_at(noon()).unwrap();
        assert!(!s.refresh());
        s.save_at(noon()).unwrap();
        assert!(s.is_ready());
    }

    #[test]
    fn toggle_cycles_and_rerenders() {
        let mut s = session(MemoryClipboard::default());
        s.set_draft("hello");
        s.save_at(noon()).unwrap();
        let before = s.preview().unwrap().modules();

        assert_eq!(s.toggle_ecc(), EccLevel::Quartile);
        assert_eq!(s.toast(), Some("ECC: Q"));
        assert_eq!(s.preview().unwrap().ecc, EccLevel::Quartile);
        assert!(s.preview().unwrap().modules() >= before);

        assert_eq!(s.toggle_ecc(), EccLevel::High);
        assert_eq!(s.toggle_ecc(), EccLevel::Low);
        assert_eq!(s.toggle_ecc(), EccLevel::Medium);
    }

    #[test]
    fn toast_and_highlight_expire() {
        let mut s = session(MemoryClipboard::default());
        s.toggle_ecc();
        let later = Instant::now() + Duration::from_secs(2);
        assert!(s.toast_at(Instant::now()).is_some());
        assert_eq!(s.toast_at(later), None);
        assert!(!s.is_highlighted_at(later));
    }

    #[test]
    fn clear_keeps_locked_value() {
        let mut s = session(MemoryClipboard::default());
        s.set_draft("keep me");
        s.save_at(noon()).unwrap();
        s.clear();
        assert_eq!(s.draft(), "");
        assert_eq!(s.locked_value(), "keep me");
        assert_eq!(s.error(), None);
    }

    #[test]
    fn detection_runs_once() {
        let mut s = session(MemoryClipboard::new("www.example.com"));
        let c = s.detect_clipboard().cloned().unwrap();
        assert_eq!(c.value, "https://www.example.com");
        assert_eq!(c.kind, ClipboardKind::Link);
        assert!(s.detect_clipboard().is_none());
        assert_eq!(s.clipboard.reads(), 1);
    }

    #[test]
    fn detection_ignores_denied_clipboard() {
        let mut s = session(MemoryClipboard::denied());
        assert!(s.detect_clipboard().is_none());
        assert_eq!(s.error(), None);
    }

    #[test]
    fn detection_skips_text_equal_to_draft() {
        let mut s = session(MemoryClipboard::new("example.com"));
        s.set_draft("https://example.com");
        assert!(s.detect_clipboard().is_none());
    }

    #[test]
    fn import_and_dismiss() {
        let mut s = session(MemoryClipboard::new("note to self"));
        s.detect_clipboard();
        assert!(s.import_clipboard());
        assert_eq!(s.draft(), "note to self");
        assert!(s.candidate().is_none());
        assert!(!s.import_clipboard());

        let mut s = session(MemoryClipboard::new("note to self"));
        s.detect_clipboard();
        s.dismiss_clipboard();
        assert!(s.candidate().is_none());
        assert_eq!(s.draft(), "");
    }

    #[test]
    fn paste_normalizes_into_draft() {
        let mut s = session(MemoryClipboard::new(" example.net "));
        s.detect_clipboard();
        assert_eq!(s.paste().unwrap(), "https://example.net");
        assert_eq!(s.draft(), "https://example.net");
        assert!(s.candidate().is_none());
    }

    #[test]
    fn paste_errors() {
        let mut s = session(MemoryClipboard::new("  "));
        assert!(matches!(s.paste(), Err(Error::ClipboardEmpty)));
        assert_eq!(s.error(), Some("The clipboard is empty."));

        let mut s = session(MemoryClipboard::denied());
        assert!(matches!(s.paste(), Err(Error::ClipboardBlocked(_))));
        assert_eq!(s.error(), Some("Clipboard access is blocked. Paste manually."));
    }

    #[test]
    fn open_now_outcomes() {
        let mut s = session(MemoryClipboard::default());
        assert_eq!(s.open_now(), NowQr::NotSaved);
        assert_eq!(s.toast(), Some("Save first"));

        s.set_draft("example.com");
        s.save_at(noon()).unwrap();
        assert_eq!(
            s.open_now(),
            NowQr::Open("https://example.com".to_string())
        );

        s.set_draft("just words");
        s.save_at(noon()).unwrap();
        assert_eq!(s.open_now(), NowQr::NotALink);
        assert_eq!(s.toast(), Some("This QR is not a link"));
    }

    #[test]
    fn oversized_payload_reports_error() {
        let mut s = session(MemoryClipboard::default());
        s.set_draft("x".repeat(8000));
        s.save_at(noon()).unwrap();
        assert!(!s.is_ready());
        assert!(s.preview().is_none());
        assert!(s.error().unwrap().starts_with("QR encoding failed"));
        assert!(matches!(s.download(None), Err(Error::NothingRendered)));

        // A fresh save clears it.
        s.set_draft("short");
        s.save_at(noon()).unwrap();
        assert!(s.is_ready());
        assert_eq!(s.error(), None);
    }

    #[test]
    fn out_of_range_render_settings_fail_instead_of_panicking() {
        let settings = Settings {
            scale: 200_000_000,
            ..Settings::default()
        };
        let result = Session::new(MemoryClipboard::default(), &settings);
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn counters_track_repeats() {
        let mut s = session(MemoryClipboard::default());
        assert!(s.save_at(noon()).is_err());
        assert!(s.save_at(noon()).is_err());
        assert_eq!(s.errors_raised(), 2);

        s.set_draft("a");
        s.save_at(noon()).unwrap();
        s.save_at(noon()).unwrap();
        assert_eq!(s.toasts_shown(), 2);
        assert_eq!(s.errors_raised(), 2);
    }

    #[test]
    fn download_writes_png() {
        let dir = tempfile::tempdir().unwrap();
        let mut s = session(MemoryClipboard::default());
        s.set_draft("example.com");
        s.save_at(noon()).unwrap();

        let path = s.download(Some(dir.path())).unwrap();
        assert_eq!(path, dir.path().join("zzQR.png"));
        let img = image::open(&path).unwrap();
        assert_eq!(img.width(), s.preview().unwrap().image.width());

        assert!(s.data_url().unwrap().starts_with("data:image/png;base64,"));
    }
}
