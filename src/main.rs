//! Command line entry point for zzqr.

use std::fs;
use std::io::{self, IsTerminal, Read};
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use zzqr::clipboard::SystemClipboard;
use zzqr::config::Settings;
use zzqr::launch::{Launcher, SystemLauncher};
use zzqr::logging::init_tracing;
use zzqr::render;
use zzqr::shell::Shell;
use zzqr::{normalize_value, EccLevel, NowQr, Session};

/// zzqr: turn a link or text into a QR code, right now
#[derive(Parser)]
#[command(name = "zzqr")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Log level when RUST_LOG is not set (overrides configuration)
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Make a QR code from TEXT, the clipboard, or stdin
    Make {
        /// Text or link to encode (read from stdin when omitted)
        text: Option<String>,

        /// Take the content from the clipboard
        #[arg(short, long, conflicts_with = "text")]
        paste: bool,

        /// Error correction level: L, M, Q or H
        #[arg(short, long)]
        ecc: Option<String>,

        /// Directory for the PNG
        #[arg(short, long)]
        out: Option<PathBuf>,

        /// Also write an SVG to this file
        #[arg(long)]
        svg: Option<PathBuf>,

        /// Print the code to the terminal
        #[arg(long)]
        print: bool,

        /// Print the PNG as a data URL instead of writing a file
        #[arg(long)]
        data_url: bool,

        /// Open the link in a browser afterwards
        #[arg(long)]
        open: bool,
    },

    /// Print the normalized form of TEXT
    Normalize {
        text: String,
    },

    /// Interactive session on stdin/stdout
    Shell,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let settings = Settings::load().context("failed to load configuration")?;
    init_tracing(cli.log_level.as_deref().unwrap_or(&settings.log_level));

    match cli.command {
        Commands::Make {
            text,
            paste,
            ecc,
            out,
            svg,
            print,
            data_url,
            open,
        } => {
            let mut session = Session::new(SystemClipboard, &settings)?;
            if let Some(ecc) = ecc {
                session.set_ecc(ecc.parse::<EccLevel>()?);
            }

            if paste {
                session.paste()?;
            } else if let Some(text) = text {
                session.set_draft(text);
            } else if !io::stdin().is_terminal() {
                let mut buf = String::new();
                io::stdin()
                    .read_to_string(&mut buf)
                    .context("failed to read stdin")?;
                session.set_draft(buf);
            } else {
                bail!("nothing to encode: pass TEXT, --paste, or pipe input");
            }

            let value = session.save()?;
            tracing::info!(%value, ecc = %session.ecc(), "made QR code");

            let preview = match session.preview() {
                Some(preview) => preview,
                None => bail!(session.error().unwrap_or("QR generation failed").to_string()),
            };

            if print {
                print!("{}", render::to_terminal_string(&preview.code, 2));
            }
            if let Some(path) = svg {
                fs::write(&path, render::to_svg_string(&preview.code, 4))
                    .with_context(|| format!("failed to write {}", path.display()))?;
                eprintln!("Wrote {}", path.display());
            }
            if data_url {
                println!("{}", session.data_url()?);
            } else {
                let path = session.download(out.as_deref())?;
                eprintln!("Wrote {}", path.display());
            }

            if open {
                match session.open_now() {
                    NowQr::Open(url) => SystemLauncher
                        .open(&url)
                        .with_context(|| format!("failed to open {url}"))?,
                    _ => eprintln!("This QR is not a link"),
                }
            }
        }
        Commands::Normalize { text } => {
            println!("{}", normalize_value(&text));
        }
        Commands::Shell => {
            let session = Session::new(SystemClipboard, &settings)?;
            let mut shell = Shell::new(session, SystemLauncher);
            let stdin = io::stdin();
            let mut stdout = io::stdout();
            shell.run(stdin.lock(), &mut stdout)?;
        }
    }

    Ok(())
}
