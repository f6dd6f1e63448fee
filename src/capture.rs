//! The device-capture object: one owned camera handle, open flag, frame grab.

use crate::device::V4l2Backend;
use crate::traits::{CaptureBackend, CaptureError, Frame, Result};

/// Lifecycle of a [`DeviceCapture`].
#[derive(Debug)]
pub enum DeviceState {
    /// Acquisition succeeded and the handle is held.
    Open,
    /// Acquisition failed; carries the reason.
    OpenFailed(CaptureError),
    /// The handle was released.
    Closed,
}

/// Exclusive owner of one camera device.
///
/// Acquisition happens once, in the constructor, and its outcome is cached
/// in [`is_open`](Self::is_open). The handle is released exactly once, by
/// [`close`](Self::close) or on drop.
///
/// Reads block the calling thread; `&mut self` receivers serialize access.
pub struct DeviceCapture<B: CaptureBackend = V4l2Backend> {
    backend: B,
    device_id: i32,
    handle: Option<B::Handle>,
    is_open: bool,
    state: DeviceState,
}

impl DeviceCapture<V4l2Backend> {
    /// Open `/dev/video{device_id}` with default stream settings.
    ///
    /// Never fails; check [`is_open`](Self::is_open).
    pub fn open(device_id: i32) -> Self {
        Self::with_backend(V4l2Backend::default(), device_id)
    }
}

impl<B: CaptureBackend> DeviceCapture<B> {
    /// Acquire `device_id` through `backend`.
    ///
    /// Failure is recorded rather than returned: the result is reflected by
    /// [`is_open`](Self::is_open) and [`status`](Self::status).
    pub fn with_backend(backend: B, device_id: i32) -> Self {
        let (handle, state) = match backend.open_device(device_id) {
            Ok(handle) if backend.is_handle_valid(&handle) => (Some(handle), DeviceState::Open),
            Ok(handle) => {
                backend.release_handle(handle);
                let reason = CaptureError::DeviceOpenFailed(format!(
                    "device {device_id} cannot capture"
                ));
                (None, DeviceState::OpenFailed(reason))
            }
            Err(err) => (None, DeviceState::OpenFailed(err)),
        };

        match &state {
            DeviceState::OpenFailed(reason) => {
                tracing::warn!(device_id, %reason, "failed to open capture device");
            }
            _ => tracing::debug!(device_id, "capture device open"),
        }

        Self {
            backend,
            device_id,
            is_open: handle.is_some(),
            handle,
            state,
        }
    }

    /// Id this capture was constructed with.
    pub const fn device_id(&self) -> i32 {
        self.device_id
    }

    /// Whether the initial acquisition succeeded.
    ///
    /// Cached at construction and never re-evaluated, not even by
    /// [`close`](Self::close).
    pub const fn is_open(&self) -> bool {
        self.is_open
    }

    /// Current lifecycle state, including the failure reason.
    pub const fn status(&self) -> &DeviceState {
        &self.state
    }

    /// Grab the next frame, or `None` when there is none to give.
    ///
    /// Returns immediately when the device is not open or already closed.
    /// Otherwise blocks until the native layer yields a frame or ends the
    /// stream. Read failures and empty frames are reported as `None`.
    pub fn capture_frame(&mut self) -> Option<Frame> {
        match self.read_frame() {
            Ok(frame) => Some(frame),
            Err(
                CaptureError::NotOpen
                | CaptureError::Closed
                | CaptureError::EndOfStream
                | CaptureError::EmptyFrame,
            ) => None,
            Err(err) => {
                tracing::warn!(device_id = self.device_id, %err, "frame read failed");
                None
            }
        }
    }

    /// Grab the next frame, distinguishing why none was produced.
    pub fn read_frame(&mut self) -> Result<Frame> {
        if !self.is_open {
            return Err(CaptureError::NotOpen);
        }
        let Some(handle) = self.handle.as_mut() else {
            return Err(CaptureError::Closed);
        };

        match self.backend.read_frame(handle)? {
            Some(frame) if frame.is_empty() => Err(CaptureError::EmptyFrame),
            Some(frame) => Ok(frame),
            None => Err(CaptureError::EndOfStream),
        }
    }

    /// Release the device. Later calls do nothing.
    pub fn close(&mut self) {
        if let Some(handle) = self.handle.take() {
            self.backend.release_handle(handle);
            self.state = DeviceState::Closed;
            tracing::debug!(device_id = self.device_id, "capture device closed");
        }
    }
}

impl<B: CaptureBackend> Drop for DeviceCapture<B> {
    fn drop(&mut self) {
        self.close();
    }
}

impl<B: CaptureBackend> std::fmt::Debug for DeviceCapture<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeviceCapture")
            .field("device_id", &self.device_id)
            .field("is_open", &self.is_open)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}
