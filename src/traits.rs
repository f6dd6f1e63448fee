//! Core traits and types for the device-capture abstraction.

use std::fmt;
use std::time::Duration;

/// Pixel format code as reported by the capture driver (e.g., YUYV).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FourCC(pub [u8; 4]);

impl FourCC {
    /// Create a new `FourCC` from a 4-byte array.
    #[must_use]
    pub const fn new(code: &[u8; 4]) -> Self {
        Self(*code)
    }

    /// YUYV pixel format (4:2:2 packed).
    pub const YUYV: Self = Self::new(b"YUYV");
}

impl fmt::Display for FourCC {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", String::from_utf8_lossy(&self.0))
    }
}

impl From<v4l::FourCC> for FourCC {
    fn from(fourcc: v4l::FourCC) -> Self {
        Self(fourcc.repr)
    }
}

impl From<FourCC> for v4l::FourCC {
    fn from(fourcc: FourCC) -> Self {
        Self::new(&fourcc.0)
    }
}

/// Native buffer layout negotiated with the device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Format {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// Pixel format.
    pub fourcc: FourCC,
    /// Bytes per line (stride).
    pub stride: u32,
    /// Total frame size in bytes.
    pub size: u32,
}

impl Format {
    /// Create a packed YUYV format with the minimal stride.
    ///
    /// Odd widths round up to a whole `[Y0 U Y1 V]` group per row. Sizes
    /// beyond `u32` saturate.
    #[must_use]
    pub const fn yuyv(width: u32, height: u32) -> Self {
        let stride = width.div_ceil(2).saturating_mul(4);
        Self {
            width,
            height,
            fourcc: FourCC::YUYV,
            stride,
            size: stride.saturating_mul(height),
        }
    }
}

/// Pixel layout of the data carried by a [`Frame`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelFormat {
    /// Packed 8-bit RGB, 3 bytes per pixel.
    Rgb24,
}

impl PixelFormat {
    /// Number of bytes used by one pixel.
    #[must_use]
    pub const fn bytes_per_pixel(self) -> usize {
        match self {
            Self::Rgb24 => 3,
        }
    }
}

/// Metadata for a captured frame.
#[derive(Debug, Clone)]
pub struct FrameMetadata {
    /// Frame sequence number.
    pub sequence: u32,
    /// Capture timestamp.
    pub timestamp: Duration,
    /// Bytes the driver filled in the native buffer.
    pub bytes_used: u32,
}

/// A captured video frame, copied out of the native buffer.
#[derive(Debug, Clone)]
pub struct Frame {
    /// Pixel data laid out according to `pixel_format`.
    pub data: Vec<u8>,
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// Layout of `data`.
    pub pixel_format: PixelFormat,
    /// Frame metadata.
    pub metadata: FrameMetadata,
}

impl Frame {
    /// A frame with no pixels carries no sample and counts as "no frame".
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0 || self.data.is_empty()
    }

    /// Get RGB values for a pixel at the specified coordinates.
    ///
    /// Returns `None` when the coordinates fall outside the frame or the
    /// payload is shorter than the dimensions claim.
    #[must_use]
    pub fn pixel_at(&self, x: u32, y: u32) -> Option<(u8, u8, u8)> {
        if x >= self.width || y >= self.height {
            return None;
        }

        let bpp = self.pixel_format.bytes_per_pixel();
        let offset = (y as usize * self.width as usize + x as usize) * bpp;

        match self.pixel_format {
            PixelFormat::Rgb24 => {
                let px = self.data.get(offset..offset + bpp)?;
                match *px {
                    [r, g, b] => Some((r, g, b)),
                    _ => None,
                }
            }
        }
    }
}

/// Device capability flags.
#[derive(Debug, Clone, Default)]
pub struct DeviceCapabilities {
    /// Driver name.
    pub driver: String,
    /// Card/device name.
    pub card: String,
    /// Bus information.
    pub bus_info: String,
    /// Whether the device can capture video.
    pub can_capture: bool,
    /// Whether the device supports streaming.
    pub can_stream: bool,
}

/// Error type for capture operations.
#[derive(Debug, thiserror::Error)]
pub enum CaptureError {
    /// Device with given id was not found.
    #[error("Device {0} not found")]
    DeviceNotFound(i32),
    /// Failed to open device.
    #[error("Failed to open device: {0}")]
    DeviceOpenFailed(String),
    /// Device refused the requested format.
    #[error("Format not supported: {} {}x{}", .0.fourcc, .0.width, .0.height)]
    FormatNotSupported(Format),
    /// The initial acquisition failed.
    #[error("Device is not open")]
    NotOpen,
    /// The device was released.
    #[error("Device has been closed")]
    Closed,
    /// The native layer ended the stream.
    #[error("End of stream")]
    EndOfStream,
    /// The native layer returned a frame without content.
    #[error("Empty frame")]
    EmptyFrame,
    /// Error during streaming operation.
    #[error("Stream error: {0}")]
    StreamError(String),
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for capture operations.
pub type Result<T> = std::result::Result<T, CaptureError>;

/// The native capabilities a [`DeviceCapture`](crate::DeviceCapture) is
/// built on.
///
/// A backend hands out opaque handles; the caller owns each handle and gives
/// it back through [`release_handle`](Self::release_handle) exactly once.
pub trait CaptureBackend {
    /// Opaque native resource for one opened device.
    type Handle;

    /// Acquire the device identified by `device_id`.
    fn open_device(&self, device_id: i32) -> Result<Self::Handle>;

    /// Whether an acquired handle is usable for capture.
    fn is_handle_valid(&self, handle: &Self::Handle) -> bool;

    /// Block until the next frame is available.
    ///
    /// `Ok(None)` means the native layer ended the stream.
    fn read_frame(&self, handle: &mut Self::Handle) -> Result<Option<Frame>>;

    /// Release the native resource.
    fn release_handle(&self, handle: Self::Handle);
}
