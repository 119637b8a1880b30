//! # Preference Value Format
//!
//! Binary encoding for values kept in a preference store.
//!
//! Format: Header (5 bytes) + postcard-serialized [`PreferenceValue`].
//! - 4 bytes: Magic ("SGPV")
//! - 1 byte: Version
//!
//! Size and header are validated before the payload is decoded.

use crate::CaptureError;
use crate::primitives::{FORMAT_VERSION, HEADER_LEN, MAGIC_BYTES, MAX_ENCODED_VALUE_SIZE};
use serde::{Deserialize, Serialize};

// =============================================================================
// VALUE
// =============================================================================

/// A single configuration value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PreferenceValue {
    Bool(bool),
    Int(i64),
    Text(String),
}

impl PreferenceValue {
    /// Name of the variant, as used on the command line.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            PreferenceValue::Bool(_) => "bool",
            PreferenceValue::Int(_) => "int",
            PreferenceValue::Text(_) => "text",
        }
    }

    /// Parse `raw` as the variant named by `kind`.
    pub fn parse(kind: &str, raw: &str) -> Result<Self, CaptureError> {
        match kind {
            "bool" => raw
                .parse()
                .map(PreferenceValue::Bool)
                .map_err(|e| CaptureError::InvalidArgument(format!("bad bool '{raw}': {e}"))),
            "int" => raw
                .parse()
                .map(PreferenceValue::Int)
                .map_err(|e| CaptureError::InvalidArgument(format!("bad int '{raw}': {e}"))),
            "text" => Ok(PreferenceValue::Text(raw.to_string())),
            other => Err(CaptureError::InvalidArgument(format!(
                "unknown value kind '{other}' (expected bool, int or text)"
            ))),
        }
    }
}

impl std::fmt::Display for PreferenceValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PreferenceValue::Bool(b) => write!(f, "{b}"),
            PreferenceValue::Int(i) => write!(f, "{i}"),
            PreferenceValue::Text(s) => f.write_str(s),
        }
    }
}

// =============================================================================
// HEADER
// =============================================================================

/// The header that precedes every encoded value.
#[derive(Debug, Clone, Copy)]
pub struct ValueHeader {
    pub magic: [u8; 4],
    pub version: u8,
}

impl ValueHeader {
    /// Header for the current format version.
    #[must_use]
    pub fn new() -> Self {
        Self {
            magic: *MAGIC_BYTES,
            version: FORMAT_VERSION,
        }
    }

    /// Check magic and version.
    pub fn validate(&self) -> Result<(), CaptureError> {
        if &self.magic != MAGIC_BYTES {
            return Err(CaptureError::SerializationError(
                "Invalid magic bytes".to_string(),
            ));
        }
        if self.version != FORMAT_VERSION {
            return Err(CaptureError::SerializationError(format!(
                "Unsupported version: {} (expected {})",
                self.version, FORMAT_VERSION
            )));
        }
        Ok(())
    }

    /// Write header to bytes.
    pub fn to_bytes(&self) -> [u8; HEADER_LEN] {
        let mut bytes = [0u8; HEADER_LEN];
        bytes[0..4].copy_from_slice(&self.magic);
        bytes[4] = self.version;
        bytes
    }

    /// Read header from bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CaptureError> {
        let (magic, rest) = bytes
            .split_first_chunk::<4>()
            .ok_or_else(|| CaptureError::SerializationError("Header too short".to_string()))?;
        let version = *rest
            .first()
            .ok_or_else(|| CaptureError::SerializationError("Header too short".to_string()))?;
        Ok(Self {
            magic: *magic,
            version,
        })
    }
}

impl Default for ValueHeader {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// ENCODING
// =============================================================================

/// Encode a value (header + payload).
pub fn value_to_bytes(value: &PreferenceValue) -> Result<Vec<u8>, CaptureError> {
    let payload =
        postcard::to_stdvec(value).map_err(|e| CaptureError::SerializationError(e.to_string()))?;

    let total = HEADER_LEN + payload.len();
    if total > MAX_ENCODED_VALUE_SIZE {
        return Err(CaptureError::SerializationError(format!(
            "Encoded value of {} bytes exceeds maximum {} bytes",
            total, MAX_ENCODED_VALUE_SIZE
        )));
    }

    let mut result = Vec::with_capacity(total);
    result.extend_from_slice(&ValueHeader::new().to_bytes());
    result.extend_from_slice(&payload);
    Ok(result)
}

/// Decode a value.
///
/// Validates, in order: minimum size, maximum size, header. Only then is the
/// payload handed to postcard.
pub fn value_from_bytes(bytes: &[u8]) -> Result<PreferenceValue, CaptureError> {
    if bytes.len() < HEADER_LEN {
        return Err(CaptureError::SerializationError(format!(
            "Data too short: minimum {} bytes required",
            HEADER_LEN
        )));
    }
    if bytes.len() > MAX_ENCODED_VALUE_SIZE {
        return Err(CaptureError::SerializationError(format!(
            "Data size {} bytes exceeds maximum allowed {} bytes",
            bytes.len(),
            MAX_ENCODED_VALUE_SIZE
        )));
    }

    let header = ValueHeader::from_bytes(bytes)?;
    header.validate()?;

    let payload = bytes.get(HEADER_LEN..).unwrap_or_default();
    postcard::from_bytes(payload).map_err(|e| {
        CaptureError::SerializationError(format!("Failed to decode preference value: {}", e))
    })
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_layout() {
        let bytes = ValueHeader::new().to_bytes();
        assert_eq!(&bytes[0..4], MAGIC_BYTES);
        assert_eq!(bytes[4], FORMAT_VERSION);
    }

    #[test]
    fn text_value_survives_encoding() {
        let value = PreferenceValue::Text("front".to_string());
        let bytes = value_to_bytes(&value).expect("encode");
        assert_eq!(value_from_bytes(&bytes).expect("decode"), value);
    }

    #[test]
    fn invalid_magic_rejected() {
        let mut bytes = value_to_bytes(&PreferenceValue::Int(1)).expect("encode");
        bytes[0..4].copy_from_slice(b"XXXX");
        assert!(value_from_bytes(&bytes).is_err());
    }

    #[test]
    fn future_version_rejected() {
        let mut bytes = value_to_bytes(&PreferenceValue::Bool(true)).expect("encode");
        bytes[4] = FORMAT_VERSION + 1;
        let err = value_from_bytes(&bytes).expect_err("must fail");
        assert!(err.to_string().contains("Unsupported version"));
    }

    #[test]
    fn truncated_data_rejected() {
        assert!(value_from_bytes(b"SGP").is_err());
        // Header only, no payload.
        assert!(value_from_bytes(&ValueHeader::new().to_bytes()).is_err());
    }

    #[test]
    fn oversized_text_rejected() {
        let value = PreferenceValue::Text("x".repeat(MAX_ENCODED_VALUE_SIZE));
        assert!(value_to_bytes(&value).is_err());
    }

    #[test]
    fn parse_kinds() {
        assert_eq!(
            PreferenceValue::parse("int", "1").expect("int"),
            PreferenceValue::Int(1)
        );
        assert_eq!(
            PreferenceValue::parse("bool", "true").expect("bool"),
            PreferenceValue::Bool(true)
        );
        assert!(PreferenceValue::parse("int", "one").is_err());
        assert!(PreferenceValue::parse("float", "1.0").is_err());
    }
}
