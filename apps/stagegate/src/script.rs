//! # Simulation Scripts
//!
//! A script is a TOML description of a simulated camera plus the sequence of
//! host events a capture screen would receive. Replaying it through a
//! [`CaptureSession`] shows which listener callbacks each event produces and
//! in what order the camera device was driven.
//!
//! ```toml
//! orientation = "portrait"
//!
//! [camera]
//! count = 2
//!
//! [[step]]
//! event = "resume"
//!
//! [[step]]
//! event = "view_layout"
//! size = { width = 1080, height = 1920 }
//! ```

use serde::{Deserialize, Serialize};
use stagegate_core::camera::DeviceCall;
use stagegate_core::{
    CameraFacing, CaptureError, CaptureListener, CaptureSession, CapturedImage, CropRect,
    Dimensions, Orientation, PreferenceStore, PreviewTransform, ScreenRotation, SimulatedCamera,
    SurfaceHandle,
};
use std::cell::RefCell;
use std::path::Path;
use std::rc::Rc;

/// Maximum script file size (1 MB).
const MAX_SCRIPT_FILE_SIZE: u64 = 1024 * 1024;

// =============================================================================
// SCRIPT FORMAT
// =============================================================================

/// Simulated hardware.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CameraSpec {
    pub count: usize,
    pub sensor_orientation: u16,
    pub preview_sizes: Option<Vec<Dimensions>>,
    pub picture_size: Option<Dimensions>,
    pub fail_preview: bool,
}

impl Default for CameraSpec {
    fn default() -> Self {
        Self {
            count: 2,
            sensor_orientation: 90,
            preview_sizes: None,
            picture_size: None,
            fail_preview: false,
        }
    }
}

impl CameraSpec {
    fn build(&self) -> SimulatedCamera {
        let mut camera =
            SimulatedCamera::new(self.count).with_sensor_orientation(self.sensor_orientation);
        if let Some(sizes) = &self.preview_sizes {
            camera = camera.with_preview_sizes(sizes.clone());
        }
        if let Some(size) = self.picture_size {
            camera = camera.with_picture_size(size);
        }
        if self.fail_preview {
            camera = camera.failing_preview();
        }
        camera
    }
}

/// One host event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum Step {
    Resume,
    Pause,
    ViewLayout {
        size: Dimensions,
    },
    Surface {
        id: u64,
        #[serde(default)]
        rotation: u16,
    },
    Orientation {
        value: Orientation,
    },
    Capture,
    Flip,
}

/// A complete simulation.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Script {
    pub orientation: Orientation,
    pub camera: CameraSpec,
    #[serde(rename = "step")]
    pub steps: Vec<Step>,
}

impl Script {
    /// Parse a script from TOML text.
    pub fn from_toml(text: &str) -> Result<Self, CaptureError> {
        toml::from_str(text).map_err(|e| {
            CaptureError::SerializationError(format!("Invalid simulation script: {}", e))
        })
    }

    /// Read and parse a script file.
    pub fn load(path: &Path) -> Result<Self, CaptureError> {
        let metadata = std::fs::metadata(path)
            .map_err(|e| CaptureError::IoError(format!("Cannot read {}: {}", path.display(), e)))?;
        if metadata.len() > MAX_SCRIPT_FILE_SIZE {
            return Err(CaptureError::SerializationError(format!(
                "Script size {} bytes exceeds maximum allowed {} bytes",
                metadata.len(),
                MAX_SCRIPT_FILE_SIZE
            )));
        }

        let text = std::fs::read_to_string(path)
            .map_err(|e| CaptureError::IoError(format!("Cannot read {}: {}", path.display(), e)))?;
        Self::from_toml(&text)
    }
}

// =============================================================================
// RECORDED EVENTS
// =============================================================================

/// A listener callback, or a step that failed outright.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionEvent {
    CameraError {
        message: String,
    },
    FlipAvailable {
        available: bool,
    },
    Transform {
        transform: PreviewTransform,
    },
    ImageCaptured {
        size: Dimensions,
        crop: CropRect,
        rotation: u16,
        bytes: usize,
    },
    StepFailed {
        message: String,
    },
}

impl std::fmt::Display for SessionEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionEvent::CameraError { message } => write!(f, "camera error: {message}"),
            SessionEvent::FlipAvailable { available } => write!(f, "flip available: {available}"),
            SessionEvent::Transform { transform } => write!(
                f,
                "preview transform: scale x {} y {}",
                transform.scale_x, transform.scale_y
            ),
            SessionEvent::ImageCaptured {
                size,
                crop,
                rotation,
                bytes,
            } => write!(
                f,
                "image captured: {size} ({bytes} bytes, rotation {rotation}), crop {}x{} at ({}, {})",
                crop.width, crop.height, crop.left, crop.top
            ),
            SessionEvent::StepFailed { message } => write!(f, "step failed: {message}"),
        }
    }
}

/// Collects listener callbacks in arrival order.
#[derive(Debug, Default)]
pub struct RecordingListener {
    events: RefCell<Vec<SessionEvent>>,
}

impl RecordingListener {
    /// Remove and return everything recorded so far.
    pub fn drain(&self) -> Vec<SessionEvent> {
        std::mem::take(&mut *self.events.borrow_mut())
    }

    fn push(&self, event: SessionEvent) {
        self.events.borrow_mut().push(event);
    }
}

impl CaptureListener for RecordingListener {
    fn on_camera_error(&self, error: &CaptureError) {
        self.push(SessionEvent::CameraError {
            message: error.to_string(),
        });
    }

    fn on_flip_available(&self, available: bool) {
        self.push(SessionEvent::FlipAvailable { available });
    }

    fn on_transform(&self, transform: PreviewTransform) {
        self.push(SessionEvent::Transform { transform });
    }

    fn on_image_captured(&self, image: CapturedImage) {
        self.push(SessionEvent::ImageCaptured {
            size: image.frame.size,
            crop: image.crop,
            rotation: image.frame.rotation,
            bytes: image.frame.data.len(),
        });
    }
}

// =============================================================================
// REPLAY
// =============================================================================

/// What happened in response to one step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimelineEntry {
    pub index: usize,
    pub step: Step,
    pub events: Vec<SessionEvent>,
}

/// Outcome of a replay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulationReport {
    pub timeline: Vec<TimelineEntry>,
    pub device_calls: Vec<DeviceCall>,
    pub final_facing: CameraFacing,
}

/// Replay `script` against a simulated camera, with `prefs` as the
/// session's preference store.
///
/// A step that fails is recorded as [`SessionEvent::StepFailed`] and the
/// replay continues, the way a host would keep delivering events.
pub fn run_script<P: PreferenceStore>(
    script: &Script,
    prefs: P,
) -> Result<SimulationReport, CaptureError> {
    let recorder = Rc::new(RecordingListener::default());
    let listener: Rc<dyn CaptureListener> = recorder.clone();
    let mut session = CaptureSession::new(script.camera.build(), prefs, listener)?;
    session.set_orientation(script.orientation);

    let mut timeline = Vec::with_capacity(script.steps.len());
    for (index, step) in script.steps.iter().enumerate() {
        tracing::debug!(index, ?step, "applying step");

        if let Err(e) = apply(&mut session, step) {
            tracing::warn!(index, error = %e, "step failed");
            recorder.push(SessionEvent::StepFailed {
                message: e.to_string(),
            });
        }

        timeline.push(TimelineEntry {
            index,
            step: step.clone(),
            events: recorder.drain(),
        });
    }

    Ok(SimulationReport {
        timeline,
        device_calls: session.camera().with_device(|d| d.calls().to_vec()),
        final_facing: session.facing(),
    })
}

fn apply<P: PreferenceStore>(
    session: &mut CaptureSession<SimulatedCamera, P>,
    step: &Step,
) -> Result<(), CaptureError> {
    match step {
        Step::Resume => session.resume(),
        Step::Pause => session.pause(),
        Step::ViewLayout { size } => session.on_view_layout(*size),
        Step::Surface { id, rotation } => {
            let rotation = ScreenRotation::from_degrees(*rotation)?;
            session.on_surface_available(SurfaceHandle(*id), rotation)
        }
        Step::Orientation { value } => {
            session.set_orientation(*value);
            Ok(())
        }
        Step::Capture => session.capture(),
        Step::Flip => session.flip().map(|_| ()),
    }
}
