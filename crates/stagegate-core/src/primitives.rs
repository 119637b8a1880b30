//! # Primitives
//!
//! Compile-time constants shared across the crate.

/// Fixed-point unit for [`crate::ScaleFactor`]: one whole step is one million.
pub const SCALE_ONE: u64 = 1_000_000;

// =============================================================================
// PREFERENCE FORMAT
// =============================================================================

/// Magic bytes that prefix every stored preference value.
pub const MAGIC_BYTES: &[u8; 4] = b"SGPV";

/// Current preference value format version.
///
/// Increment this when making breaking changes to the encoding.
pub const FORMAT_VERSION: u8 = 1;

/// Header length: magic bytes followed by the version byte.
pub const HEADER_LEN: usize = 5;

/// Maximum length of a preference key in bytes.
pub const MAX_KEY_LENGTH: usize = 128;

/// Maximum size of an encoded preference value (header included).
///
/// Checked before decoding so a corrupted store cannot request huge
/// allocations.
pub const MAX_ENCODED_VALUE_SIZE: usize = 64 * 1024;

/// Key under which the preferred capture camera is persisted.
pub const PREFERRED_CAMERA_KEY: &str = "direct_capture_camera_id";
