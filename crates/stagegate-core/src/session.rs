//! # Capture Session
//!
//! Drives one capture screen: it owns a [`GatedCamera`], the injected
//! preference store, and a [`StageGate`] with the single stage
//! [`ViewStage::ViewSizeAvailable`].
//!
//! Camera capabilities and the on-screen view size arrive independently.
//! The preview transform needs both, so it is deferred on the view stage
//! and computed as soon as the view has been laid out.
//!
//! Each capture starts a new cycle: the view gate is reset, and anything
//! that depends on the view size waits for the next layout.
//!
//! ## Preferences
//!
//! The preferred camera is read once when the session is created and written
//! whenever the user flips cameras.

use crate::camera::{CameraDevice, CameraEventListener, GatedCamera};
use crate::geometry::{CropRect, PreviewTransform, crop_to_surface};
use crate::storage::{CameraPreferences, PreferenceStore};
use crate::{
    CameraFacing, Capabilities, CaptureError, CapturedFrame, Dimensions, Orientation,
    ScreenRotation, StageGate, SurfaceHandle,
};
use serde::{Deserialize, Serialize};
use std::cell::Cell;
use std::rc::Rc;

// =============================================================================
// TYPES
// =============================================================================

/// View readiness stages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ViewStage {
    /// The preview view has been laid out and its size is known.
    ViewSizeAvailable,
}

/// A captured frame together with the region that matches the preview.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapturedImage {
    pub frame: CapturedFrame,
    pub crop: CropRect,
}

/// Receives the outcome of session events. Implemented by the host UI.
pub trait CaptureListener {
    /// The camera failed or could not be opened.
    fn on_camera_error(&self, error: &CaptureError);

    /// Whether the flip control should be offered.
    fn on_flip_available(&self, available: bool);

    /// The preview transform is ready to be applied.
    fn on_transform(&self, transform: PreviewTransform);

    /// A full-resolution capture completed.
    fn on_image_captured(&self, image: CapturedImage);
}

/// Routes camera failures to the session listener.
struct ErrorBridge(Rc<dyn CaptureListener>);

impl CameraEventListener for ErrorBridge {
    fn on_camera_unavailable(&self, error: &CaptureError) {
        self.0.on_camera_error(error);
    }
}

// =============================================================================
// SESSION
// =============================================================================

/// Headless capture-flow controller.
pub struct CaptureSession<D, P> {
    camera: GatedCamera<D>,
    view_gate: Rc<StageGate<ViewStage>>,
    view_size: Rc<Cell<Option<Dimensions>>>,
    orientation: Rc<Cell<Orientation>>,
    capabilities: Option<Capabilities>,
    prefs: P,
    listener: Rc<dyn CaptureListener>,
}

impl<D, P> std::fmt::Debug for CaptureSession<D, P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CaptureSession")
            .field("camera", &self.camera)
            .field("view_gate", &self.view_gate)
            .field("view_size", &self.view_size.get())
            .field("capabilities", &self.capabilities)
            .finish_non_exhaustive()
    }
}

impl<D, P> CaptureSession<D, P>
where
    D: CameraDevice + 'static,
    P: PreferenceStore,
{
    /// Create a session, selecting the camera stored in `prefs`.
    pub fn new(
        device: D,
        prefs: P,
        listener: Rc<dyn CaptureListener>,
    ) -> Result<Self, CaptureError> {
        let facing = CameraPreferences::preferred_facing(&prefs)?;
        let bridge: Rc<dyn CameraEventListener> = Rc::new(ErrorBridge(Rc::clone(&listener)));
        let camera = GatedCamera::new(device, facing, bridge)?;

        tracing::debug!(%facing, "capture session created");
        Ok(Self {
            camera,
            view_gate: Rc::new(StageGate::new([ViewStage::ViewSizeAvailable])?),
            view_size: Rc::new(Cell::new(None)),
            orientation: Rc::new(Cell::new(Orientation::default())),
            capabilities: None,
            prefs,
            listener,
        })
    }

    /// Open the camera. Failures are also reported to the listener.
    pub fn resume(&mut self) -> Result<(), CaptureError> {
        let capabilities = self.camera.initialize()?;
        self.on_capabilities(capabilities)
    }

    /// Release the camera once its preview is running.
    pub fn pause(&self) -> Result<(), CaptureError> {
        self.camera.release()
    }

    /// Record new camera capabilities and schedule the preview transform.
    pub fn on_capabilities(&mut self, capabilities: Capabilities) -> Result<(), CaptureError> {
        self.capabilities = Some(capabilities);
        self.listener.on_flip_available(capabilities.can_flip());

        let view_size = Rc::clone(&self.view_size);
        let orientation = Rc::clone(&self.orientation);
        let listener = Rc::clone(&self.listener);

        self.view_gate.run(ViewStage::ViewSizeAvailable, move || {
            let Some(view) = view_size.get() else {
                tracing::trace!("view stage complete without a size");
                return;
            };
            match PreviewTransform::compute(capabilities.preview, view, orientation.get()) {
                Ok(transform) => listener.on_transform(transform),
                Err(e) => listener.on_camera_error(&e),
            }
        })?;
        Ok(())
    }

    /// The preview view has been laid out at `size`.
    pub fn on_view_layout(&self, size: Dimensions) -> Result<(), CaptureError> {
        self.view_size.set(Some(size));
        self.view_gate.mark_completed(ViewStage::ViewSizeAvailable)?;
        Ok(())
    }

    /// The host created the preview surface.
    pub fn on_surface_available(
        &self,
        surface: SurfaceHandle,
        display_rotation: ScreenRotation,
    ) -> Result<(), CaptureError> {
        self.camera.link_surface(surface)?;
        self.camera.set_screen_rotation(display_rotation)
    }

    /// The display orientation changed. Applies to transforms computed later.
    pub fn set_orientation(&self, orientation: Orientation) {
        self.orientation.set(orientation);
    }

    /// Start a new capture cycle and take a picture.
    ///
    /// The captured frame is reported with the crop that matches the view.
    pub fn capture(&self) -> Result<(), CaptureError> {
        self.view_gate.reset();

        let view_size = Rc::clone(&self.view_size);
        let listener = Rc::clone(&self.listener);

        self.camera.capture(move |frame| {
            let cropped = view_size
                .get()
                .ok_or_else(|| {
                    CaptureError::InvalidArgument("view size unknown at capture".to_string())
                })
                .and_then(|view| crop_to_surface(frame.size, view));

            match cropped {
                Ok(crop) => listener.on_image_captured(CapturedImage { frame, crop }),
                Err(e) => listener.on_camera_error(&e),
            }
        })
    }

    /// Switch cameras if more than one is present and remember the choice.
    ///
    /// Returns the newly selected camera, or `None` if flipping is not
    /// possible yet.
    pub fn flip(&mut self) -> Result<Option<CameraFacing>, CaptureError> {
        if !self.capabilities.is_some_and(|c| c.can_flip()) {
            tracing::debug!("flip ignored: single camera or capabilities unknown");
            return Ok(None);
        }

        let (facing, capabilities) = self.camera.flip()?;
        CameraPreferences::set_preferred_facing(&mut self.prefs, facing)?;
        self.on_capabilities(capabilities)?;
        Ok(Some(facing))
    }

    /// The camera currently selected.
    pub fn facing(&self) -> CameraFacing {
        self.camera.facing()
    }

    /// The last reported capabilities.
    pub fn capabilities(&self) -> Option<Capabilities> {
        self.capabilities
    }

    /// The wrapped camera.
    pub fn camera(&self) -> &GatedCamera<D> {
        &self.camera
    }

    /// The injected preference store.
    pub fn prefs(&self) -> &P {
        &self.prefs
    }

    /// Consume the session, returning the preference store.
    pub fn into_prefs(self) -> P {
        self.prefs
    }
}

// =============================================================================
// TESTS
// =============================================================================
