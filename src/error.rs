use thiserror::Error;

/// Everything that can go wrong while turning input into a QR image.
///
/// The `Display` text of the first four variants is what the session shows to
/// the user, so keep it short and phrased for a person rather than a log.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Enter some content before saving.")]
    EmptyDraft,

    #[error("The clipboard is empty.")]
    ClipboardEmpty,

    #[error("Clipboard access is blocked. Paste manually.")]
    ClipboardBlocked(#[source] std::io::Error),

    #[error("No QR code has been rendered yet.")]
    NothingRendered,

    #[error("Unknown error correction level: {0:?} (expected L, M, Q or H)")]
    InvalidEcc(String),

    #[error("QR image would be {side}x{side} px (limit {limit})")]
    ImageTooLarge { side: u64, limit: u32 },

    #[error("QR encoding failed: {0}")]
    Encode(#[from] qrcode::types::QrError),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_facing_messages() {
        assert_eq!(
            Error::EmptyDraft.to_string(),
            "Enter some content before saving."
        );
        assert_eq!(Error::ClipboardEmpty.to_string(), "The clipboard is empty.");
        let blocked = Error::ClipboardBlocked(std::io::Error::other("denied"));
        assert_eq!(
            blocked.to_string(),
            "Clipboard access is blocked. Paste manually."
        );
    }

    #[test]
    fn encode_error_converts() {
        let err: Error = qrcode::types::QrError::DataTooLong.into();
        assert!(matches!(err, Error::Encode(_)));
    }
}
