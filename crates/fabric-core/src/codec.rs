//! Base64 codecs for part payloads.
//!
//! The codec is injected into the file system so the encoding strategy can
//! vary without touching the caching or write-back logic.

use base64::Engine;
use base64::alphabet;
use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig, STANDARD};
use base64::engine::DecodePaddingMode;

use crate::error::{CodecError, CodecResult};

/// Encodes and decodes part payloads.
pub trait Base64Encoder: Send + Sync {
    /// Encode raw bytes.
    fn encode(&self, bytes: &[u8]) -> String;

    /// Decode a payload into raw bytes.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::InvalidBase64`] if the payload is malformed.
    fn decode(&self, payload: &str) -> CodecResult<Vec<u8>>;

    /// Encode UTF-8 text.
    fn encode_text(&self, text: &str) -> String {
        self.encode(text.as_bytes())
    }

    /// Decode a payload that is expected to hold UTF-8 text.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::InvalidBase64`] for malformed payloads and
    /// [`CodecError::InvalidUtf8`] when the bytes are not text.
    fn decode_text(&self, payload: &str) -> CodecResult<String> {
        let bytes = self.decode(payload)?;
        String::from_utf8(bytes).map_err(|e| CodecError::InvalidUtf8(e.to_string()))
    }
}

/// Strict RFC 4648 base64 with padding.
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardBase64Encoder;

impl Base64Encoder for StandardBase64Encoder {
    fn encode(&self, bytes: &[u8]) -> String {
        STANDARD.encode(bytes)
    }

    fn decode(&self, payload: &str) -> CodecResult<Vec<u8>> {
        STANDARD
            .decode(payload)
            .map_err(|e| CodecError::InvalidBase64(e.to_string()))
    }
}

const LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new()
        .with_encode_padding(true)
        .with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Base64 that tolerates missing padding and embedded line breaks.
///
/// Some services wrap long payloads at 76 columns; this codec strips ASCII
/// whitespace before decoding. Encoding is identical to the standard codec.
#[derive(Debug, Clone, Copy, Default)]
pub struct LenientBase64Encoder;

impl Base64Encoder for LenientBase64Encoder {
    fn encode(&self, bytes: &[u8]) -> String {
        LENIENT.encode(bytes)
    }

    fn decode(&self, payload: &str) -> CodecResult<Vec<u8>> {
        let compact: String = payload
            .chars()
            .filter(|c| !c.is_ascii_whitespace())
            .collect();
        LENIENT
            .decode(compact)
            .map_err(|e| CodecError::InvalidBase64(e.to_string()))
    }
}
