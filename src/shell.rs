//! A line-oriented front end for [`Session`].
//!
//! Plain lines replace the draft. Lines starting with `:` are commands; a line
//! starting with `::` is taken as draft text with the first colon removed.

use std::fs;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use crate::clipboard::Clipboard;
use crate::launch::Launcher;
use crate::render;
use crate::session::{NowQr, Session};

const HELP: &str = "\
Type text or a link to edit the draft, then:
  :save          lock the draft in and render it
  :clear         empty the draft
  :paste         replace the draft with the clipboard
  :import        take the clipboard offer
  :dismiss       ignore the clipboard offer
  :ecc           cycle the error correction level (L, M, Q, H)
  :png [DIR]     save the code as PNG
  :svg FILE      save the code as SVG
  :open          open the saved link
  :show          print the code
  :status        show the current state
  :quit          leave";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Draft(String),
    Save,
    Clear,
    Paste,
    Import,
    Dismiss,
    Ecc,
    Png(Option<PathBuf>),
    Svg(Option<PathBuf>),
    Open,
    Show,
    Status,
    Help,
    Quit,
    Unknown(String),
}

impl Command {
    pub fn parse(line: &str) -> Command {
        if let Some(text) = line.strip_prefix("::") {
            return Command::Draft(format!(":{text}"));
        }
        let Some(rest) = line.strip_prefix(':') else {
            return Command::Draft(line.to_string());
        };

        let mut parts = rest.trim().splitn(2, char::is_whitespace);
        let name = parts.next().unwrap_or_default().to_ascii_lowercase();
        let arg = parts
            .next()
            .map(str::trim)
            .filter(|a| !a.is_empty())
            .map(PathBuf::from);

        match name.as_str() {
            "save" | "s" => Command::Save,
            "clear" | "c" => Command::Clear,
            "paste" | "p" => Command::Paste,
            "import" | "i" => Command::Import,
            "dismiss" | "d" => Command::Dismiss,
            "ecc" | "e" => Command::Ecc,
            "png" => Command::Png(arg),
            "svg" => Command::Svg(arg),
            "open" | "o" => Command::Open,
            "show" => Command::Show,
            "status" => Command::Status,
            "help" | "h" | "?" => Command::Help,
            "quit" | "q" | "exit" => Command::Quit,
            _ => Command::Unknown(rest.trim().to_string()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

pub struct Shell<C, L> {
    session: Session<C>,
    launcher: L,
    // Errors and toasts already printed; each is printed once.
    errors_seen: u64,
    toasts_seen: u64,
}

impl<C: Clipboard, L: Launcher> Shell<C, L> {
    pub fn new(session: Session<C>, launcher: L) -> Self {
        Self {
            session,
            launcher,
            errors_seen: 0,
            toasts_seen: 0,
        }
    }

    pub fn session(&self) -> &Session<C> {
        &self.session
    }

    pub fn launcher(&self) -> &L {
        &self.launcher
    }

    /// Offers the clipboard once, then executes lines until `:quit` or end of input.
    pub fn run<R: BufRead, W: Write>(&mut self, input: R, out: &mut W) -> io::Result<()> {
        if let Some(candidate) = self.session.detect_clipboard() {
            writeln!(out, "{}", candidate.kind.info())?;
            writeln!(out, "  {}", candidate.value)?;
            writeln!(out, "  :import to use it, :dismiss to ignore it")?;
        }

        for line in input.lines() {
            let line = line?;
            if self.execute(&line, out)? == Flow::Quit {
                break;
            }
        }
        Ok(())
    }

    pub fn execute<W: Write>(&mut self, line: &str, out: &mut W) -> io::Result<Flow> {
        let command = Command::parse(line);
        tracing::debug!(?command, "shell command");

        match command {
            Command::Draft(text) => self.session.set_draft(text),
            Command::Save => {
                if let Ok(value) = self.session.save() {
                    writeln!(out, "Saved {}: {}", self.session.saved_at().unwrap_or("--:--"), value)?;
                }
            }
            Command::Clear => self.session.clear(),
            Command::Paste => {
                if let Ok(draft) = self.session.paste() {
                    writeln!(out, "Draft: {draft}")?;
                }
            }
            Command::Import => {
                if self.session.import_clipboard() {
                    writeln!(out, "Draft: {}", self.session.draft())?;
                } else {
                    writeln!(out, "Nothing to import.")?;
                }
            }
            Command::Dismiss => self.session.dismiss_clipboard(),
            Command::Ecc => {
                self.session.toggle_ecc();
            }
            Command::Png(dir) => match self.session.download(dir.as_deref()) {
                Ok(path) => writeln!(out, "Wrote {}", path.display())?,
                Err(err) => writeln!(out, "{err}")?,
            },
            Command::Svg(None) => writeln!(out, "Usage: :svg FILE")?,
            Command::Svg(Some(path)) => match self.session.preview() {
                Some(preview) => {
                    let svg = render::to_svg_string(&preview.code, 4);
                    match fs::write(&path, svg) {
                        Ok(()) => writeln!(out, "Wrote {}", path.display())?,
                        Err(err) => writeln!(out, "Could not write {}: {err}", path.display())?,
                    }
                }
                None => writeln!(out, "No QR code has been rendered yet.")?,
            },
            Command::Open => {
                if let NowQr::Open(url) = self.session.open_now() {
                    if let Err(err) = self.launcher.open(&url) {
                        tracing::warn!(error = %err, %url, "could not open link");
                        writeln!(out, "Could not open {url}: {err}")?;
                    }
                }
            }
            Command::Show => self.show(out)?,
            Command::Status => self.status(out)?,
            Command::Help => writeln!(out, "{HELP}")?,
            Command::Quit => return Ok(Flow::Quit),
            Command::Unknown(name) => writeln!(out, "Unknown command :{name} (try :help)")?,
        }

        self.report(out)?;
        Ok(Flow::Continue)
    }

    // Prints the error and toast only when they were raised since the last report.
    fn report<W: Write>(&mut self, out: &mut W) -> io::Result<()> {
        let raised = self.session.errors_raised();
        if raised != self.errors_seen {
            self.errors_seen = raised;
            if let Some(err) = self.session.error() {
                writeln!(out, "! {err}")?;
            }
        }

        let shown = self.session.toasts_shown();
        if shown != self.toasts_seen {
            self.toasts_seen = shown;
            if let Some(toast) = self.session.toast() {
                writeln!(out, "[{toast}]")?;
            }
        }
        Ok(())
    }

    fn show<W: Write>(&self, out: &mut W) -> io::Result<()> {
        if let Some(preview) = self.session.preview() {
            write!(out, "{}", render::to_terminal_string(&preview.code, 2))?;
        }
        let locked = self.session.locked_value();
        if locked.is_empty() {
            writeln!(out, "Content: Not saved yet.")
        } else {
            writeln!(out, "Content: {locked}")
        }
    }

    fn status<W: Write>(&self, out: &mut W) -> io::Result<()> {
        let s = &self.session;
        writeln!(out, "Draft:  {}", s.draft())?;
        let locked = s.locked_value();
        match s.saved_at() {
            Some(at) => writeln!(out, "Saved:  {locked} ({at})")?,
            None => writeln!(out, "Saved:  -")?,
        }
        writeln!(out, "ECC:    {}", s.ecc())?;
        if let Some(preview) = s.preview() {
            writeln!(
                out,
                "QR:     {} modules, {}x{} px",
                preview.modules(),
                preview.image.width(),
                preview.image.height()
            )?;
        }
        Ok(())
    }
}
