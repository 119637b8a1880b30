//! A scriptable stand-in for camera hardware.
//!
//! Used by tests and by the CLI's `simulate` command. Every call is recorded
//! so the order the gate imposed can be inspected afterwards.

use super::CameraDevice;
use crate::{CameraFacing, CameraInfo, CaptureError, CapturedFrame, Dimensions, SurfaceHandle};
use serde::{Deserialize, Serialize};

/// One call made into a [`SimulatedCamera`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceCall {
    Open(CameraFacing),
    StartPreview {
        size: Dimensions,
        surface: SurfaceHandle,
    },
    SetRotation(u16),
    TakePicture,
    Stop,
}

/// In-memory camera device.
#[derive(Debug, Clone)]
pub struct SimulatedCamera {
    camera_count: usize,
    sensor_orientation: u16,
    preview_sizes: Vec<Dimensions>,
    picture_size: Dimensions,
    fail_preview: bool,
    opened: Option<CameraFacing>,
    previewing: bool,
    pictures_taken: u64,
    calls: Vec<DeviceCall>,
}

impl SimulatedCamera {
    /// A device with `camera_count` cameras, a 90° sensor, common preview
    /// sizes up to 1920x1080 and 4032x3024 pictures.
    #[must_use]
    pub fn new(camera_count: usize) -> Self {
        Self {
            camera_count,
            sensor_orientation: 90,
            preview_sizes: vec![
                Dimensions::new(640, 480),
                Dimensions::new(1280, 720),
                Dimensions::new(1920, 1080),
            ],
            picture_size: Dimensions::new(4032, 3024),
            fail_preview: false,
            opened: None,
            previewing: false,
            pictures_taken: 0,
            calls: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_sensor_orientation(mut self, degrees: u16) -> Self {
        self.sensor_orientation = degrees;
        self
    }

    #[must_use]
    pub fn with_preview_sizes(mut self, sizes: Vec<Dimensions>) -> Self {
        self.preview_sizes = sizes;
        self
    }

    #[must_use]
    pub fn with_picture_size(mut self, size: Dimensions) -> Self {
        self.picture_size = size;
        self
    }

    /// Make every `start_preview` fail.
    #[must_use]
    pub fn failing_preview(mut self) -> Self {
        self.fail_preview = true;
        self
    }

    /// Calls received so far, oldest first.
    #[must_use]
    pub fn calls(&self) -> &[DeviceCall] {
        &self.calls
    }
}

impl CameraDevice for SimulatedCamera {
    fn camera_count(&self) -> usize {
        self.camera_count
    }

    fn open(&mut self, facing: CameraFacing) -> Result<CameraInfo, CaptureError> {
        self.calls.push(DeviceCall::Open(facing));
        if let Some(current) = self.opened {
            return Err(CaptureError::CameraUnavailable(format!(
                "{current} camera is already open"
            )));
        }
        if facing == CameraFacing::Front && self.camera_count < 2 {
            return Err(CaptureError::CameraUnavailable(
                "device has no front camera".to_string(),
            ));
        }

        self.opened = Some(facing);
        Ok(CameraInfo {
            facing,
            sensor_orientation: self.sensor_orientation,
            preview_sizes: self.preview_sizes.clone(),
        })
    }

    fn start_preview(
        &mut self,
        size: Dimensions,
        surface: SurfaceHandle,
    ) -> Result<(), CaptureError> {
        self.calls.push(DeviceCall::StartPreview { size, surface });
        if self.opened.is_none() {
            return Err(CaptureError::CameraUnavailable(
                "camera is not open".to_string(),
            ));
        }
        if self.fail_preview {
            return Err(CaptureError::IoError("preview surface rejected".to_string()));
        }
        self.previewing = true;
        Ok(())
    }

    fn set_rotation(&mut self, degrees: u16) -> Result<(), CaptureError> {
        self.calls.push(DeviceCall::SetRotation(degrees));
        Ok(())
    }

    fn take_picture(&mut self) -> Result<CapturedFrame, CaptureError> {
        self.calls.push(DeviceCall::TakePicture);
        if !self.previewing {
            return Err(CaptureError::CameraUnavailable(
                "preview is not running".to_string(),
            ));
        }

        self.pictures_taken = self.pictures_taken.saturating_add(1);
        Ok(CapturedFrame {
            data: format!("frame-{}", self.pictures_taken).into_bytes(),
            size: self.picture_size,
            rotation: self.sensor_orientation,
        })
    }

    fn stop(&mut self) {
        self.calls.push(DeviceCall::Stop);
        self.opened = None;
        self.previewing = false;
    }
}
