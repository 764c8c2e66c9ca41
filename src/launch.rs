//! Handing a link to the desktop's browser.

use std::io;
use std::process::{Command, Stdio};

pub trait Launcher {
    fn open(&mut self, url: &str) -> io::Result<()>;
}

/// Opens links with `open`, `xdg-open` or the Windows URL protocol handler,
/// depending on the platform.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemLauncher;

/// Builds the command that opens `url` on `os` (a `std::env::consts::OS` value).
///
/// The link is always a single argument to a program that does no shell
/// parsing. On Windows that rules out `cmd /C start`, which would treat `&`,
/// `|` and `^` in the link as command syntax.
pub fn open_command(os: &str, url: &str) -> Command {
    let mut cmd = match os {
        "macos" => Command::new("open"),
        "windows" => {
            let mut c = Command::new("rundll32");
            c.arg("url.dll,FileProtocolHandler");
            c
        }
        _ => Command::new("xdg-open"),
    };
    cmd.arg(url);
    cmd
}

impl Launcher for SystemLauncher {
    fn open(&mut self, url: &str) -> io::Result<()> {
        let status = open_command(std::env::consts::OS, url)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()?;
        if status.success() {
            tracing::info!(%url, "opened link");
            Ok(())
        } else {
            Err(io::Error::other(format!("launcher exited with {status}")))
        }
    }
}

/// Remembers links instead of opening them.
#[derive(Debug, Clone, Default)]
pub struct RecordingLauncher {
    pub opened: Vec<String>,
}

impl Launcher for RecordingLauncher {
    fn open(&mut self, url: &str) -> io::Result<()> {
        self.opened.push(url.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::OsStr;

    fn parts(cmd: &Command) -> (String, Vec<String>) {
        (
            cmd.get_program().to_string_lossy().into_owned(),
            cmd.get_args()
                .map(|a| a.to_string_lossy().into_owned())
                .collect(),
        )
    }

    #[test]
    fn windows_link_never_goes_through_a_shell() {
        let url = "https://example.com/?a=1&calc|more^x";
        let cmd = open_command("windows", url);
        let (program, args) = parts(&cmd);

        assert_eq!(program, "rundll32");
        assert_eq!(args, vec!["url.dll,FileProtocolHandler", url]);
        assert!(!["cmd", "cmd.exe", "powershell"].contains(&program.as_str()));
        assert!(!args.iter().any(|a| a.eq_ignore_ascii_case("/C")));
    }

    #[test]
    fn unix_launchers_take_the_link_as_one_argument() {
        let url = "https://example.com/a b?x=1&y=2";
        for (os, program) in [("macos", "open"), ("linux", "xdg-open"), ("freebsd", "xdg-open")] {
            let cmd = open_command(os, url);
            assert_eq!(cmd.get_program(), OsStr::new(program));
            assert_eq!(cmd.get_args().collect::<Vec<_>>(), vec![OsStr::new(url)]);
        }
    }

    #[test]
    fn recording_launcher_keeps_links() {
        let mut launcher = RecordingLauncher::default();
        launcher.open("https://a.io").unwrap();
        assert_eq!(launcher.opened, vec!["https://a.io".to_string()]);
    }
}
