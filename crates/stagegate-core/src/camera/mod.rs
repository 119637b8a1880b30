//! # Gated Camera
//!
//! Sequences calls into an external [`CameraDevice`] so that each one waits
//! for the hardware state it depends on:
//!
//! | Operation | Waits for |
//! |-----------|-----------|
//! | `link_surface` | `Initialized` |
//! | `set_screen_rotation` | `PreviewStarted` |
//! | `capture` | `PreviewStarted` |
//!
//! Callers issue operations in whatever order their host delivers the
//! triggering events; the gate restores the required order.
//!
//! `release` never waits: a preview that has not started may never start, so
//! the device is stopped as soon as it is open. It then resets the gate so
//! the next `initialize` starts a fresh cycle.
//!
//! Deferred operations cannot return errors to their caller, so device
//! failures are reported through [`CameraEventListener`].

mod simulated;

pub use simulated::{DeviceCall, SimulatedCamera};

use crate::geometry::{camera_rotation, largest_preview_size};
use crate::{
    CameraFacing, CameraInfo, Capabilities, CaptureError, CapturedFrame, Dimensions,
    ScreenRotation, StageGate, SurfaceHandle,
};
use std::cell::RefCell;
use std::rc::{Rc, Weak};

// =============================================================================
// COLLABORATOR TRAITS
// =============================================================================

/// Camera hardware, implemented by the host platform.
pub trait CameraDevice {
    /// Number of cameras present.
    fn camera_count(&self) -> usize;

    /// Open the camera facing `facing`.
    fn open(&mut self, facing: CameraFacing) -> Result<CameraInfo, CaptureError>;

    /// Start streaming at `size` into `surface`.
    fn start_preview(
        &mut self,
        size: Dimensions,
        surface: SurfaceHandle,
    ) -> Result<(), CaptureError>;

    /// Set the display rotation of the preview and of captured pictures.
    fn set_rotation(&mut self, degrees: u16) -> Result<(), CaptureError>;

    /// Take a full-resolution picture.
    fn take_picture(&mut self) -> Result<CapturedFrame, CaptureError>;

    /// Stop the preview and release the camera.
    fn stop(&mut self);
}

/// Receives failures of deferred camera operations.
pub trait CameraEventListener {
    fn on_camera_unavailable(&self, error: &CaptureError);
}

// =============================================================================
// GATED CAMERA
// =============================================================================

/// Hardware readiness stages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DeviceStage {
    /// The camera is open and its capabilities are known.
    Initialized,
    /// The preview is streaming into a surface.
    PreviewStarted,
}

struct CameraState<D> {
    device: D,
    facing: CameraFacing,
    info: Option<CameraInfo>,
    preview_size: Option<Dimensions>,
    surface: Option<SurfaceHandle>,
    screen_rotation: ScreenRotation,
}

/// A [`CameraDevice`] whose operations are ordered by a [`StageGate`].
pub struct GatedCamera<D> {
    state: Rc<RefCell<CameraState<D>>>,
    gate: Rc<StageGate<DeviceStage>>,
    listener: Rc<dyn CameraEventListener>,
}

impl<D> std::fmt::Debug for GatedCamera<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatedCamera")
            .field("gate", &self.gate)
            .finish_non_exhaustive()
    }
}

impl<D: CameraDevice + 'static> GatedCamera<D> {
    /// Wrap `device`, starting with the camera facing `facing`.
    pub fn new(
        device: D,
        facing: CameraFacing,
        listener: Rc<dyn CameraEventListener>,
    ) -> Result<Self, CaptureError> {
        let gate = StageGate::new([DeviceStage::Initialized, DeviceStage::PreviewStarted])?;
        Ok(Self {
            state: Rc::new(RefCell::new(CameraState {
                device,
                facing,
                info: None,
                preview_size: None,
                surface: None,
                screen_rotation: ScreenRotation::default(),
            })),
            gate: Rc::new(gate),
            listener,
        })
    }

    /// Open the current camera and announce its capabilities.
    ///
    /// Streams at the largest supported preview size. Calling it again while
    /// the camera is open returns the current capabilities.
    pub fn initialize(&self) -> Result<Capabilities, CaptureError> {
        if self.gate.is_completed(DeviceStage::Initialized)?
            && let Some(capabilities) = self.current_capabilities()
        {
            tracing::debug!("camera already open");
            return Ok(capabilities);
        }

        match self.open_current() {
            Ok(capabilities) => {
                self.gate.mark_completed(DeviceStage::Initialized)?;
                Ok(capabilities)
            }
            Err(e) => {
                tracing::warn!(error = %e, "camera unavailable");
                self.gate.reset();
                self.listener.on_camera_unavailable(&e);
                Err(e)
            }
        }
    }

    fn open_current(&self) -> Result<Capabilities, CaptureError> {
        let mut state = self.state.borrow_mut();
        let camera_count = state.device.camera_count();
        if camera_count == 0 {
            return Err(CaptureError::CameraUnavailable(
                "no cameras present".to_string(),
            ));
        }

        let facing = state.facing;
        let info = state.device.open(facing)?;
        let Some(preview) = largest_preview_size(&info.preview_sizes) else {
            state.device.stop();
            return Err(CaptureError::CameraUnavailable(format!(
                "{facing} camera reports no preview sizes"
            )));
        };

        tracing::debug!(%facing, %preview, camera_count, "camera opened");
        state.info = Some(info);
        state.preview_size = Some(preview);
        Ok(Capabilities {
            camera_count,
            preview,
        })
    }

    fn current_capabilities(&self) -> Option<Capabilities> {
        let state = self.state.borrow();
        state.preview_size.map(|preview| Capabilities {
            camera_count: state.device.camera_count(),
            preview,
        })
    }

    /// Start the preview into `surface` once the camera is open.
    pub fn link_surface(&self, surface: SurfaceHandle) -> Result<(), CaptureError> {
        let state = Rc::clone(&self.state);
        let gate = Rc::downgrade(&self.gate);
        let listener = Rc::clone(&self.listener);

        self.gate.run(DeviceStage::Initialized, move || {
            let started = {
                let mut state = state.borrow_mut();
                state.surface = Some(surface);
                let preview_size = state.preview_size;
                match preview_size {
                    Some(size) => state.device.start_preview(size, surface),
                    None => Err(CaptureError::CameraUnavailable(
                        "camera is not open".to_string(),
                    )),
                }
            };

            match started {
                Ok(()) => mark(&gate, DeviceStage::PreviewStarted, listener.as_ref()),
                Err(e) => {
                    tracing::error!(error = %e, "failed to start preview");
                    listener.on_camera_unavailable(&e);
                }
            }
        })?;
        Ok(())
    }

    /// Rotate the preview to match the screen once it is streaming.
    pub fn set_screen_rotation(&self, rotation: ScreenRotation) -> Result<(), CaptureError> {
        let state = Rc::clone(&self.state);
        let listener = Rc::clone(&self.listener);

        self.gate.run(DeviceStage::PreviewStarted, move || {
            let applied = {
                let mut state = state.borrow_mut();
                state.screen_rotation = rotation;
                let degrees = state
                    .info
                    .as_ref()
                    .map(|info| camera_rotation(info.sensor_orientation, info.facing, rotation));
                match degrees {
                    Some(degrees) => state.device.set_rotation(degrees),
                    None => Ok(()),
                }
            };
            if let Err(e) = applied {
                listener.on_camera_unavailable(&e);
            }
        })?;
        Ok(())
    }

    /// Take a picture once the preview is streaming and hand it to `callback`.
    pub fn capture(
        &self,
        callback: impl FnOnce(CapturedFrame) + 'static,
    ) -> Result<(), CaptureError> {
        let state = Rc::clone(&self.state);
        let listener = Rc::clone(&self.listener);

        self.gate.run(DeviceStage::PreviewStarted, move || {
            let picture = state.borrow_mut().device.take_picture();
            match picture {
                Ok(frame) => callback(frame),
                Err(e) => {
                    tracing::error!(error = %e, "capture failed");
                    listener.on_camera_unavailable(&e);
                }
            }
        })?;
        Ok(())
    }

    /// Stop the camera if it is open, forget the surface, and reset the gate
    /// for the next cycle. Operations still waiting are discarded.
    pub fn release(&self) -> Result<(), CaptureError> {
        let opened = self.gate.is_completed(DeviceStage::Initialized)?;
        {
            let mut state = self.state.borrow_mut();
            state.surface = None;
            if opened {
                state.device.stop();
            }
        }
        self.gate.reset();

        tracing::debug!(opened, "camera released");
        Ok(())
    }

    /// Switch to the other camera, keeping the current surface and rotation.
    ///
    /// If the other camera cannot be opened the selection stays on the
    /// previous camera, which is left released.
    pub fn flip(&self) -> Result<(CameraFacing, Capabilities), CaptureError> {
        let (surface, previous, rotation) = {
            let state = self.state.borrow();
            (state.surface, state.facing, state.screen_rotation)
        };
        let facing = previous.flipped();

        self.release()?;
        self.state.borrow_mut().facing = facing;
        let capabilities = match self.initialize() {
            Ok(capabilities) => capabilities,
            Err(e) => {
                self.state.borrow_mut().facing = previous;
                return Err(e);
            }
        };
        if let Some(surface) = surface {
            self.link_surface(surface)?;
        }
        self.set_screen_rotation(rotation)?;

        tracing::info!(%facing, "camera flipped");
        Ok((facing, capabilities))
    }

    /// The camera currently selected.
    pub fn facing(&self) -> CameraFacing {
        self.state.borrow().facing
    }

    /// Whether `stage` has been reached in the current cycle.
    pub fn is_at(&self, stage: DeviceStage) -> bool {
        // Both DeviceStage variants are declared in `new`, so the lookup
        // cannot fail.
        matches!(self.gate.is_completed(stage), Ok(true))
    }

    /// Inspect the wrapped device.
    pub fn with_device<R>(&self, f: impl FnOnce(&D) -> R) -> R {
        f(&self.state.borrow().device)
    }
}

fn mark(
    gate: &Weak<StageGate<DeviceStage>>,
    stage: DeviceStage,
    listener: &dyn CameraEventListener,
) {
    if let Some(gate) = gate.upgrade()
        && let Err(e) = gate.mark_completed(stage)
    {
        listener.on_camera_unavailable(&e.into());
    }
}

// =============================================================================
// TESTS
// =============================================================================
