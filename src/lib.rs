//! Device-Capture: a minimal camera-capture object over V4L2.
//!
//! [`DeviceCapture`] owns one camera handle: it is opened once at
//! construction, reports whether that worked, hands out frames on demand and
//! releases the handle exactly once. The native side sits behind the
//! [`CaptureBackend`] trait, with a V4L2 implementation for real hardware and
//! a mock one for running without it.

pub mod capture;
pub mod config;
pub mod convert;
pub mod device;
pub mod mock;
pub mod traits;
pub mod validation;

pub use capture::{DeviceCapture, DeviceState};
pub use config::{CaptureConfig, Config, ConfigError};
pub use device::{V4l2Backend, V4l2Handle};
pub use mock::{MockBackend, TestPattern};
pub use traits::{
    CaptureBackend, CaptureError, DeviceCapabilities, Format, FourCC, Frame, FrameMetadata,
    PixelFormat,
};
