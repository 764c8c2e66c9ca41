//! # zzqr
//!
//! Turn a link or a piece of text into a QR code, right now.
//!
//! `zzqr` keeps two values apart: the *draft* you are typing and the *locked*
//! value you saved. Only the locked value is encoded, so half-typed input never
//! reaches the code. Anything that looks like a web address is normalized to an
//! `https://` link before it is locked in.
//!
//! ## Features
//!
//! - URL detection and normalization (`example.com` → `https://example.com`).
//! - Four error correction levels, cycled L → M → Q → H.
//! - One-shot clipboard detection with an import offer, plus explicit paste.
//! - PNG export (file, bytes or `data:` URL), SVG and terminal output.
//!
//! ## Example
//!
//! ```rust
//! use zzqr::clipboard::MemoryClipboard;
//! use zzqr::config::Settings;
//! use zzqr::session::Session;
//!
//! let mut session = Session::new(MemoryClipboard::default(), &Settings::default()).unwrap();
//! session.set_draft("example.com");
//! assert_eq!(session.save().unwrap(), "https://example.com");
//!
//! let preview = session.preview().unwrap();
//! assert_eq!(preview.payload, "https://example.com");
//! ```
//!
//! ## Modules
//!
//! - [`normalize`]: link detection and canonicalization.
//! - [`render`]: encoding and drawing (PNG, SVG, terminal).
//! - [`session`]: the draft/locked state machine.
//! - [`clipboard`]: clipboard access and import offers.
//! - [`shell`]: the interactive terminal front end.

pub mod clipboard;
pub mod config;
pub mod ecc;
pub mod error;
pub mod launch;
pub mod logging;
pub mod normalize;
pub mod render;
pub mod session;
pub mod shell;

pub use ecc::EccLevel;
pub use error::{Error, Result};
pub use normalize::{looks_like_url, normalize_value};
pub use session::{NowQr, Session};
