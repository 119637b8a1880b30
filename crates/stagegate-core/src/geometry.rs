//! # Preview & Capture Geometry
//!
//! Size arithmetic the capture flow needs once the camera and the view have
//! both reported their dimensions:
//! - [`PreviewTransform`]: how to stretch the preview so it is not distorted
//! - [`crop_to_surface`]: the centered region of a full capture that matches
//!   what the preview showed
//! - [`camera_rotation`]: the display rotation to apply to the sensor image
//! - [`largest_preview_size`]: the preview size to stream at
//!
//! Integer arithmetic only. Ratios are compared by cross-multiplication and
//! scale factors are fixed-point millionths.

use crate::primitives::SCALE_ONE;
use crate::{CameraFacing, CaptureError, Dimensions, Orientation, ScreenRotation};
use serde::{Deserialize, Serialize};

// =============================================================================
// SCALE FACTOR
// =============================================================================

/// A non-negative scale stored as millionths (`1_000_000` is 1.0).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ScaleFactor(pub u64);

impl ScaleFactor {
    /// The identity scale.
    pub const IDENTITY: Self = Self(SCALE_ONE);

    /// `numerator / denominator` rounded down to the nearest millionth.
    ///
    /// Returns `None` when `denominator` is zero.
    #[must_use]
    pub fn ratio(numerator: u64, denominator: u64) -> Option<Self> {
        numerator
            .saturating_mul(SCALE_ONE)
            .checked_div(denominator)
            .map(Self)
    }

    /// Raw millionths.
    #[must_use]
    pub const fn millionths(self) -> u64 {
        self.0
    }
}

impl Default for ScaleFactor {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl std::fmt::Display for ScaleFactor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{:06}", self.0 / SCALE_ONE, self.0 % SCALE_ONE)
    }
}

// =============================================================================
// PREVIEW TRANSFORM
// =============================================================================

/// Per-axis scale to apply to the preview surface.
///
/// Only one axis is ever stretched; the other stays at identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PreviewTransform {
    pub scale_x: ScaleFactor,
    pub scale_y: ScaleFactor,
}

impl PreviewTransform {
    /// Compute the transform for a camera streaming at `preview` into a view
    /// of size `view`.
    ///
    /// The camera's width is its short side in portrait and its long side in
    /// landscape. When the width ratio `cam_w / view_w` exceeds the height
    /// ratio `cam_h / view_h` the X axis is scaled by the width ratio,
    /// otherwise the Y axis is scaled by the height ratio.
    ///
    /// # Errors
    ///
    /// `CaptureError::InvalidDimensions` if either size has a zero side.
    pub fn compute(
        preview: Dimensions,
        view: Dimensions,
        orientation: Orientation,
    ) -> Result<Self, CaptureError> {
        if preview.is_empty() {
            return Err(CaptureError::InvalidDimensions(preview));
        }
        if view.is_empty() {
            return Err(CaptureError::InvalidDimensions(view));
        }

        let (cam_w, cam_h) = match orientation {
            Orientation::Portrait => (preview.short_side(), preview.long_side()),
            Orientation::Landscape => (preview.long_side(), preview.short_side()),
        };
        let (cam_w, cam_h) = (u64::from(cam_w), u64::from(cam_h));
        let (view_w, view_h) = (u64::from(view.width), u64::from(view.height));

        let mut transform = Self::default();
        // cam_w / view_w > cam_h / view_h
        if cam_w * view_h > cam_h * view_w {
            transform.scale_x =
                ScaleFactor::ratio(cam_w, view_w).ok_or(CaptureError::InvalidDimensions(view))?;
        } else {
            transform.scale_y =
                ScaleFactor::ratio(cam_h, view_h).ok_or(CaptureError::InvalidDimensions(view))?;
        }
        Ok(transform)
    }

    /// True if neither axis is scaled.
    #[must_use]
    pub fn is_identity(&self) -> bool {
        self.scale_x == ScaleFactor::IDENTITY && self.scale_y == ScaleFactor::IDENTITY
    }
}

// =============================================================================
// CAPTURE CROP
// =============================================================================

/// A rectangle inside a captured image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CropRect {
    pub left: u32,
    pub top: u32,
    pub width: u32,
    pub height: u32,
}

impl CropRect {
    /// Size of the rectangle.
    #[must_use]
    pub const fn size(&self) -> Dimensions {
        Dimensions::new(self.width, self.height)
    }
}

/// The centered region of `image` with the aspect ratio of `surface`.
///
/// The side of the image that is relatively shorter than the surface is kept
/// whole; the other side is trimmed equally at both ends.
pub fn crop_to_surface(image: Dimensions, surface: Dimensions) -> Result<CropRect, CaptureError> {
    if image.is_empty() {
        return Err(CaptureError::InvalidDimensions(image));
    }
    if surface.is_empty() {
        return Err(CaptureError::InvalidDimensions(surface));
    }

    let (img_w, img_h) = (u64::from(image.width), u64::from(image.height));
    let (surf_w, surf_h) = (u64::from(surface.width), u64::from(surface.height));

    // img_w / surf_w < img_h / surf_h
    let (target_w, target_h) = if img_w * surf_h < img_h * surf_w {
        (img_w, img_w * surf_h / surf_w)
    } else {
        (img_h * surf_w / surf_h, img_h)
    };

    // Both targets are bounded by the image, so they fit back into u32.
    Ok(CropRect {
        left: (img_w.abs_diff(target_w) / 2) as u32,
        top: (img_h.abs_diff(target_h) / 2) as u32,
        width: target_w as u32,
        height: target_h as u32,
    })
}

// =============================================================================
// ROTATION & SIZE SELECTION
// =============================================================================

/// Clockwise rotation, in degrees, to apply to the camera image so it appears
/// upright on a screen rotated by `screen`.
///
/// Front cameras are mirrored, so their rotation is compensated in the
/// opposite direction.
#[must_use]
pub fn camera_rotation(sensor_orientation: u16, facing: CameraFacing, screen: ScreenRotation) -> u16 {
    let sensor = sensor_orientation % 360;
    let screen = screen.degrees();

    match facing {
        CameraFacing::Front => (360 - (sensor + screen) % 360) % 360,
        CameraFacing::Back => (sensor + 360 - screen) % 360,
    }
}

/// The supported size with the most pixels. Ties keep the first listed.
#[must_use]
pub fn largest_preview_size(sizes: &[Dimensions]) -> Option<Dimensions> {
    sizes
        .iter()
        .copied()
        .reduce(|best, size| if size.area() > best.area() { size } else { best })
}

// =============================================================================
// TESTS
// =============================================================================
