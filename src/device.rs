//! V4L2 backend implementation using the v4l crate.

use v4l::buffer::Type;
use v4l::io::mmap::Stream;
use v4l::io::traits::CaptureStream as _;
use v4l::video::Capture;
use v4l::Device;

use crate::config::CaptureConfig;
use crate::convert::yuyv_to_rgb24;
use crate::traits::{
    CaptureBackend, CaptureError, DeviceCapabilities, Format, FourCC, Frame, FrameMetadata,
    PixelFormat, Result,
};
use std::io;
use std::time::Duration;

/// Backend over V4L2 device nodes (`/dev/video{id}`).
#[derive(Debug, Clone, Default)]
pub struct V4l2Backend {
    config: CaptureConfig,
}

impl V4l2Backend {
    /// Create a backend negotiating the given stream settings.
    #[must_use]
    pub const fn new(config: CaptureConfig) -> Self {
        Self { config }
    }
}

/// An opened V4L2 device.
///
/// The mmap stream is started on the first read and always dropped before
/// the device it was created from.
pub struct V4l2Handle {
    stream: Option<Stream<'static>>,
    device: Device,
    capabilities: DeviceCapabilities,
    format: Format,
    buffer_count: u32,
}

impl V4l2Handle {
    /// Capabilities reported by the driver.
    #[must_use]
    pub const fn capabilities(&self) -> &DeviceCapabilities {
        &self.capabilities
    }

    /// Format negotiated with the driver.
    #[must_use]
    pub const fn format(&self) -> &Format {
        &self.format
    }
}

impl CaptureBackend for V4l2Backend {
    type Handle = V4l2Handle;

    fn open_device(&self, device_id: i32) -> Result<V4l2Handle> {
        let index =
            usize::try_from(device_id).map_err(|_| CaptureError::DeviceNotFound(device_id))?;

        let device = Device::new(index).map_err(|err| match err.kind() {
            io::ErrorKind::NotFound => CaptureError::DeviceNotFound(device_id),
            _ => CaptureError::DeviceOpenFailed(err.to_string()),
        })?;

        let caps = device
            .query_caps()
            .map_err(|err| CaptureError::DeviceOpenFailed(err.to_string()))?;

        let capabilities = DeviceCapabilities {
            driver: caps.driver,
            card: caps.card,
            bus_info: caps.bus,
            can_capture: caps.capabilities.contains(v4l::capability::Flags::VIDEO_CAPTURE),
            can_stream: caps.capabilities.contains(v4l::capability::Flags::STREAMING),
        };

        let format = if capabilities.can_capture {
            negotiate_format(&device, &self.config)?
        } else {
            Format::yuyv(0, 0)
        };

        tracing::debug!(
            device_id,
            driver = %capabilities.driver,
            card = %capabilities.card,
            width = format.width,
            height = format.height,
            "opened V4L2 device"
        );

        Ok(V4l2Handle {
            stream: None,
            device,
            capabilities,
            format,
            buffer_count: self.config.buffer_count,
        })
    }

    fn is_handle_valid(&self, handle: &V4l2Handle) -> bool {
        handle.capabilities.can_capture && handle.capabilities.can_stream
    }

    fn read_frame(&self, handle: &mut V4l2Handle) -> Result<Option<Frame>> {
        if handle.stream.is_none() {
            let stream =
                Stream::with_buffers(&handle.device, Type::VideoCapture, handle.buffer_count)
                    .map_err(|err| CaptureError::StreamError(err.to_string()))?;
            tracing::debug!(buffers = handle.buffer_count, "started mmap stream");
            handle.stream = Some(stream);
        }

        let Some(stream) = handle.stream.as_mut() else {
            return Err(CaptureError::StreamError("stream not started".to_owned()));
        };

        let (buf, meta) = stream
            .next()
            .map_err(|err| CaptureError::StreamError(err.to_string()))?;

        if meta.bytesused == 0 {
            return Err(CaptureError::EmptyFrame);
        }

        let used = buf.get(..meta.bytesused as usize).unwrap_or(buf);
        let data = yuyv_to_rgb24(used, &handle.format)?;

        // Safe conversions: V4L2 timestamps are always non-negative in practice
        #[allow(clippy::cast_sign_loss)]
        let secs = meta.timestamp.sec.max(0) as u64;
        #[allow(clippy::cast_sign_loss, clippy::cast_possible_truncation)]
        let nanos = (meta.timestamp.usec.max(0) as u32).saturating_mul(1000);

        tracing::trace!(sequence = meta.sequence, bytes = meta.bytesused, "captured frame");

        Ok(Some(Frame {
            data,
            width: handle.format.width,
            height: handle.format.height,
            pixel_format: PixelFormat::Rgb24,
            metadata: FrameMetadata {
                sequence: meta.sequence,
                timestamp: Duration::new(secs, nanos),
                bytes_used: meta.bytesused,
            },
        }))
    }

    fn release_handle(&self, handle: V4l2Handle) {
        let V4l2Handle {
            stream, device, ..
        } = handle;
        // Stops streaming and unmaps buffers before the fd is closed.
        drop(stream);
        drop(device);
        tracing::debug!("released V4L2 device");
    }
}

/// Request YUYV at the configured resolution; returns what the driver set.
fn negotiate_format(device: &Device, config: &CaptureConfig) -> Result<Format> {
    let mut fmt = device
        .format()
        .map_err(|err| CaptureError::DeviceOpenFailed(err.to_string()))?;

    fmt.width = config.width;
    fmt.height = config.height;
    fmt.fourcc = FourCC::YUYV.into();

    let fmt = device
        .set_format(&fmt)
        .map_err(|err| CaptureError::DeviceOpenFailed(err.to_string()))?;

    let actual = Format {
        width: fmt.width,
        height: fmt.height,
        fourcc: FourCC::from(fmt.fourcc),
        stride: fmt.stride,
        size: fmt.size,
    };

    if actual.fourcc != FourCC::YUYV {
        return Err(CaptureError::FormatNotSupported(actual));
    }

    Ok(actual)
}
