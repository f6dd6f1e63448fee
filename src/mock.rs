//! Simulated backend for running without hardware.

use crate::config::CaptureConfig;
use crate::convert::yuyv_to_rgb24;
use crate::traits::{
    CaptureBackend, CaptureError, Format, Frame, FrameMetadata, PixelFormat, Result,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Backend that serves synthetic YUYV frames for a fixed set of device ids.
#[derive(Debug, Clone)]
pub struct MockBackend {
    devices: Vec<i32>,
    format: Format,
    pattern: TestPattern,
    frame_limit: Option<u32>,
    fail_after: Option<u32>,
    valid_handles: bool,
    releases: Arc<AtomicUsize>,
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MockBackend {
    /// Create a backend exposing device 0 with 640x480 color bars.
    #[must_use]
    pub fn new() -> Self {
        Self {
            devices: vec![0],
            format: Format::yuyv(640, 480),
            pattern: TestPattern::ColorBars,
            frame_limit: None,
            fail_after: None,
            valid_handles: true,
            releases: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Create a backend producing frames at the configured resolution.
    #[must_use]
    pub fn from_config(config: &CaptureConfig) -> Self {
        Self::new().with_format(Format::yuyv(config.width, config.height))
    }

    /// Set the ids that resolve to a device.
    #[must_use]
    pub fn with_devices(mut self, devices: &[i32]) -> Self {
        self.devices = devices.to_vec();
        self
    }

    /// Set the format of generated frames.
    #[must_use]
    pub fn with_format(mut self, format: Format) -> Self {
        self.format = format;
        self
    }

    /// Set the test pattern for frame generation.
    #[must_use]
    pub fn with_pattern(mut self, pattern: TestPattern) -> Self {
        self.pattern = pattern;
        self
    }

    /// End the stream after `frames` frames.
    #[must_use]
    pub fn with_frame_limit(mut self, frames: u32) -> Self {
        self.frame_limit = Some(frames);
        self
    }

    /// Fail every read after `frames` frames, like a device unplugged
    /// mid-stream.
    #[must_use]
    pub fn with_read_error_after(mut self, frames: u32) -> Self {
        self.fail_after = Some(frames);
        self
    }

    /// Hand out handles that fail the validity check, like a device node
    /// that opens but cannot capture.
    #[must_use]
    pub fn with_invalid_handles(mut self) -> Self {
        self.valid_handles = false;
        self
    }

    /// Number of handles released so far, shared across clones.
    #[must_use]
    pub fn release_count(&self) -> usize {
        self.releases.load(Ordering::SeqCst)
    }
}

/// Handle to one simulated device.
#[derive(Debug)]
pub struct MockHandle {
    device_id: i32,
    sequence: u32,
    valid: bool,
}

impl MockHandle {
    /// Id the handle was opened with.
    #[must_use]
    pub const fn device_id(&self) -> i32 {
        self.device_id
    }
}

impl CaptureBackend for MockBackend {
    type Handle = MockHandle;

    fn open_device(&self, device_id: i32) -> Result<MockHandle> {
        if !self.devices.contains(&device_id) {
            return Err(CaptureError::DeviceNotFound(device_id));
        }

        Ok(MockHandle {
            device_id,
            sequence: 0,
            valid: self.valid_handles,
        })
    }

    fn is_handle_valid(&self, handle: &MockHandle) -> bool {
        handle.valid
    }

    fn read_frame(&self, handle: &mut MockHandle) -> Result<Option<Frame>> {
        if self
            .frame_limit
            .is_some_and(|limit| handle.sequence >= limit)
        {
            return Ok(None);
        }
        if self.fail_after.is_some_and(|after| handle.sequence >= after) {
            return Err(CaptureError::StreamError(format!(
                "mock device {} disconnected",
                handle.device_id
            )));
        }

        let raw = generate_test_frame(&self.format, self.pattern);
        let data = yuyv_to_rgb24(&raw, &self.format)?;

        let seq = handle.sequence;
        handle.sequence += 1;

        Ok(Some(Frame {
            data,
            width: self.format.width,
            height: self.format.height,
            pixel_format: PixelFormat::Rgb24,
            metadata: FrameMetadata {
                sequence: seq,
                timestamp: Duration::from_millis(u64::from(seq) * 33), // ~30fps
                bytes_used: self.format.size,
            },
        }))
    }

    fn release_handle(&self, handle: MockHandle) {
        tracing::debug!(device_id = handle.device_id, "releasing mock device");
        self.releases.fetch_add(1, Ordering::SeqCst);
    }
}

/// Test pattern types for mock frame generation.
#[derive(Debug, Clone, Copy)]
pub enum TestPattern {
    /// SMPTE color bars pattern.
    ColorBars,
    /// Horizontal gradient from dark to light.
    Gradient,
    /// Solid color with specified Y, U, V values.
    Solid(u8, u8, u8),
}

/// Generate YUYV frame data based on pattern.
fn generate_test_frame(format: &Format, pattern: TestPattern) -> Vec<u8> {
    let width = format.width;
    let line_len = width.div_ceil(2) as usize * 4;
    let stride = (format.stride as usize).max(line_len);
    let mut data = vec![0u8; stride * format.height as usize];
    if data.is_empty() {
        return data;
    }

    for line in data.chunks_mut(stride) {
        for (pair, group) in line.chunks_exact_mut(4).enumerate() {
            #[allow(clippy::cast_possible_truncation)]
            let x = pair as u32 * 2;
            if x >= width {
                break;
            }
            let (y_val, u_val, v_val) = pattern_yuv(pattern, x, width);
            group.copy_from_slice(&[y_val, u_val, y_val, v_val]);
        }
    }

    data
}

/// YUV value of the pixel pair starting at column `x`.
fn pattern_yuv(pattern: TestPattern, x: u32, width: u32) -> (u8, u8, u8) {
    // White, Yellow, Cyan, Green, Magenta, Red, Blue, Black
    const BARS: [(u8, u8, u8); 8] = [
        (235, 128, 128),
        (210, 16, 146),
        (170, 166, 16),
        (145, 54, 34),
        (106, 202, 222),
        (81, 90, 240),
        (41, 240, 110),
        (16, 128, 128),
    ];

    match pattern {
        TestPattern::ColorBars => {
            let bar_width = (width / 8).max(1);
            let bar_idx = (x / bar_width).min(7) as usize;
            BARS.get(bar_idx).copied().unwrap_or((16, 128, 128))
        }
        TestPattern::Gradient => {
            #[allow(clippy::cast_possible_truncation)]
            let y_val = ((u64::from(x) * 255) / u64::from(width.max(1))) as u8;
            (y_val, 128, 128)
        }
        TestPattern::Solid(y, u, v) => (y, u, v),
    }
}
