//! # stagegate-core
//!
//! A stage-ordering synchronizer and the headless capture flow built on it.
//!
//! The central type is [`StageGate`]: it tracks a fixed set of named stages,
//! defers callbacks until their stage completes, and resets for reuse across
//! repeated cycles. Everything else in this crate is an application of it to
//! a camera capture screen, with hardware and UI reduced to trait seams.
//!
//! ## Layout
//!
//! - `system`: the stage gate itself
//! - `types`: sizes, camera descriptions, errors
//! - `geometry`: preview transform, capture crop, sensor rotation
//! - `formats` / `storage`: the preference value encoding and stores
//! - `camera`: [`GatedCamera`] over a host-provided [`CameraDevice`]
//! - `session`: [`CaptureSession`], the capture-screen controller
//!
//! ## Architectural Constraints
//!
//! - Single execution context: shared state is `Rc`/`RefCell`, nothing is `Send`
//! - No async, no network dependencies
//! - Integer geometry only
//! - Library code never panics; every failure is a [`CaptureError`]

// =============================================================================
// MODULES
// =============================================================================

pub mod camera;
pub mod formats;
pub mod geometry;
pub mod primitives;
pub mod session;
pub mod storage;
pub mod system;
pub mod types;

// =============================================================================
// RE-EXPORTS: Core Types
// =============================================================================

pub use types::{
    CameraFacing, CameraInfo, Capabilities, CaptureError, CapturedFrame, Dimensions, GateError,
    Orientation, ScreenRotation, SurfaceHandle,
};

// =============================================================================
// RE-EXPORTS: Stage Gate
// =============================================================================

pub use system::{PendingAction, StageGate};

// =============================================================================
// RE-EXPORTS: Capture Flow
// =============================================================================

pub use camera::{CameraDevice, CameraEventListener, DeviceStage, GatedCamera, SimulatedCamera};
pub use formats::{PreferenceValue, value_from_bytes, value_to_bytes};
pub use geometry::{
    CropRect, PreviewTransform, ScaleFactor, camera_rotation, crop_to_surface,
    largest_preview_size,
};
pub use session::{CaptureListener, CaptureSession, CapturedImage, ViewStage};
pub use storage::{CameraPreferences, MemoryPreferences, PreferenceStore, RedbPreferences};
