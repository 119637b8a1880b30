//! # Core Type Definitions
//!
//! This module contains the value types shared by every part of the crate:
//! - Sizes and orientation (`Dimensions`, `Orientation`, `ScreenRotation`)
//! - Camera descriptions (`CameraFacing`, `CameraInfo`, `Capabilities`)
//! - Capture output (`CapturedFrame`, `SurfaceHandle`)
//! - Error types (`GateError`, `CaptureError`)
//!
//! ## Determinism Guarantees
//!
//! All geometry is expressed in integers. Ratios that would naturally be
//! fractional are stored as fixed-point millionths (see [`ScaleFactor`]).

use serde::{Deserialize, Serialize};
use thiserror::Error;

// =============================================================================
// SIZES & ORIENTATION
// =============================================================================

/// A width/height pair in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    /// Create a new size.
    #[must_use]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Pixel count, widened so it cannot overflow.
    #[must_use]
    pub const fn area(self) -> u64 {
        (self.width as u64) * (self.height as u64)
    }

    /// True if either side is zero.
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// The shorter side.
    #[must_use]
    pub fn short_side(self) -> u32 {
        self.width.min(self.height)
    }

    /// The longer side.
    #[must_use]
    pub fn long_side(self) -> u32 {
        self.width.max(self.height)
    }
}

impl std::fmt::Display for Dimensions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

impl std::str::FromStr for Dimensions {
    type Err = CaptureError;

    /// Parse `WIDTHxHEIGHT` (e.g. `1920x1080`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (w, h) = s
            .split_once(['x', 'X'])
            .ok_or_else(|| CaptureError::InvalidArgument(format!("expected WxH, got '{s}'")))?;
        let width = w
            .trim()
            .parse()
            .map_err(|e| CaptureError::InvalidArgument(format!("bad width '{w}': {e}")))?;
        let height = h
            .trim()
            .parse()
            .map_err(|e| CaptureError::InvalidArgument(format!("bad height '{h}': {e}")))?;
        Ok(Self { width, height })
    }
}

/// Orientation of the host display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    #[default]
    Portrait,
    Landscape,
}

/// Rotation of the host display relative to its natural orientation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ScreenRotation {
    #[default]
    Rotation0,
    Rotation90,
    Rotation180,
    Rotation270,
}

impl ScreenRotation {
    /// Rotation in degrees.
    #[must_use]
    pub const fn degrees(self) -> u16 {
        match self {
            ScreenRotation::Rotation0 => 0,
            ScreenRotation::Rotation90 => 90,
            ScreenRotation::Rotation180 => 180,
            ScreenRotation::Rotation270 => 270,
        }
    }

    /// Convert from degrees. Only right angles are accepted.
    pub fn from_degrees(degrees: u16) -> Result<Self, CaptureError> {
        match degrees {
            0 => Ok(ScreenRotation::Rotation0),
            90 => Ok(ScreenRotation::Rotation90),
            180 => Ok(ScreenRotation::Rotation180),
            270 => Ok(ScreenRotation::Rotation270),
            other => Err(CaptureError::InvalidArgument(format!(
                "screen rotation must be 0, 90, 180 or 270 (got {other})"
            ))),
        }
    }
}

// =============================================================================
// CAMERA DESCRIPTIONS
// =============================================================================

/// Which way a camera faces.
///
/// The discriminants match the identifiers the preference store persists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CameraFacing {
    #[default]
    Back = 0,
    Front = 1,
}

impl CameraFacing {
    /// The opposite camera.
    #[must_use]
    pub const fn flipped(self) -> Self {
        match self {
            CameraFacing::Back => CameraFacing::Front,
            CameraFacing::Front => CameraFacing::Back,
        }
    }

    /// Persisted identifier.
    #[must_use]
    pub const fn id(self) -> i64 {
        self as i64
    }

    /// Inverse of [`CameraFacing::id`].
    #[must_use]
    pub const fn from_id(id: i64) -> Option<Self> {
        match id {
            0 => Some(CameraFacing::Back),
            1 => Some(CameraFacing::Front),
            _ => None,
        }
    }
}

impl std::fmt::Display for CameraFacing {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CameraFacing::Back => f.write_str("back"),
            CameraFacing::Front => f.write_str("front"),
        }
    }
}

/// What a camera device reports once it has been opened.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CameraInfo {
    /// Direction of the opened camera.
    pub facing: CameraFacing,
    /// Clockwise angle the sensor image must be rotated to be upright, in degrees.
    pub sensor_orientation: u16,
    /// Preview sizes the device supports, in no particular order.
    pub preview_sizes: Vec<Dimensions>,
}

/// Capabilities announced to the capture flow after initialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Capabilities {
    /// Number of cameras on the device.
    pub camera_count: usize,
    /// Preview size the camera will stream at.
    pub preview: Dimensions,
}

impl Capabilities {
    /// Flipping only makes sense with more than one camera.
    #[must_use]
    pub const fn can_flip(&self) -> bool {
        self.camera_count > 1
    }
}

/// Opaque handle to a preview surface owned by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SurfaceHandle(pub u64);

/// A full-resolution picture delivered by the camera device.
///
/// `data` is whatever the device produced (usually JPEG); it is never decoded here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapturedFrame {
    pub data: Vec<u8>,
    pub size: Dimensions,
    /// Sensor rotation in degrees at capture time.
    pub rotation: u16,
}

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Errors raised by [`crate::StageGate`].
///
/// Both variants indicate a programming error in the caller and are not
/// meant to be retried.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GateError {
    /// The gate was constructed without any stages.
    #[error("Stage gate requires at least one stage")]
    EmptyStageSet,

    /// A stage that was not declared at construction was referenced.
    #[error("Unknown stage: {0}")]
    UnknownStage(String),
}

/// Errors that can occur anywhere in the capture flow.
///
/// - No silent failures
/// - Use `Result<T, CaptureError>` for fallible operations
/// - Library code never panics
#[derive(Debug, Error)]
pub enum CaptureError {
    /// Misuse of a stage gate.
    #[error(transparent)]
    Gate(#[from] GateError),

    /// A size with a zero side was supplied where a real size is required.
    #[error("Invalid dimensions: {0}")]
    InvalidDimensions(Dimensions),

    /// No camera could be opened or the device failed mid-operation.
    #[error("Camera unavailable: {0}")]
    CameraUnavailable(String),

    /// A preference key is empty or too long.
    #[error("Invalid preference key: {0:?}")]
    InvalidKey(String),

    /// A serialization or deserialization error occurred.
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    IoError(String),

    /// A user-supplied argument could not be interpreted.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

// =============================================================================
// TESTS
// =============================================================================
