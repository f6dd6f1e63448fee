//! Lifecycle scenarios for `DeviceCapture`, run without hardware.

use device_capture::validation::validate_color_bars;
use device_capture::{
    CaptureError, DeviceCapture, DeviceState, Format, MockBackend, PixelFormat, TestPattern,
};

#[test]
fn test_invalid_device_is_not_open_and_yields_nothing() {
    let mut capture = DeviceCapture::open(-1);

    assert!(!capture.is_open());
    assert!(capture.capture_frame().is_none());
    assert!(capture.capture_frame().is_none());
    assert!(matches!(
        capture.status(),
        DeviceState::OpenFailed(CaptureError::DeviceNotFound(-1))
    ));
}

#[test]
fn test_nonexistent_mock_devices_are_not_open() {
    for id in [-1, 1, 42, i32::MAX, i32::MIN] {
        let mut capture = DeviceCapture::with_backend(MockBackend::new(), id);
        assert!(!capture.is_open(), "device {id} should not open");
        assert!(capture.capture_frame().is_none());
    }
}

#[test]
fn test_valid_device_yields_non_empty_frame() {
    let backend = MockBackend::new().with_format(Format::yuyv(320, 240));
    let mut capture = DeviceCapture::with_backend(backend, 0);

    assert!(capture.is_open());
    let frame = capture.capture_frame().expect("frame expected");

    assert_eq!(frame.width, 320);
    assert_eq!(frame.height, 240);
    assert_eq!(frame.pixel_format, PixelFormat::Rgb24);
    assert_eq!(frame.data.len(), 320 * 240 * 3);
    assert!(validate_color_bars(&frame).is_ok());
}

#[test]
fn test_open_flag_survives_reads_and_end_of_stream() {
    let backend = MockBackend::new()
        .with_pattern(TestPattern::Gradient)
        .with_frame_limit(3);
    let mut capture = DeviceCapture::with_backend(backend, 0);

    let frames: Vec<_> = std::iter::from_fn(|| capture.capture_frame()).collect();

    assert_eq!(frames.len(), 3);
    assert!(capture.is_open());
}

#[test]
fn test_capture_after_close_yields_nothing() {
    let backend = MockBackend::new();
    let observer = backend.clone();
    let mut capture = DeviceCapture::with_backend(backend, 0);

    capture.close();

    assert!(capture.capture_frame().is_none());
    assert!(matches!(capture.read_frame(), Err(CaptureError::Closed)));
    assert_eq!(observer.release_count(), 1);
}

#[test]
fn test_close_twice_then_drop_releases_once() {
    let backend = MockBackend::new();
    let observer = backend.clone();

    let mut capture = DeviceCapture::with_backend(backend, 0);
    capture.close();
    capture.close();
    drop(capture);

    assert_eq!(observer.release_count(), 1);
}

#[test]
fn test_failed_open_never_releases_on_drop() {
    let backend = MockBackend::new();
    let observer = backend.clone();

    let capture = DeviceCapture::with_backend(backend, 5);
    drop(capture);

    assert_eq!(observer.release_count(), 0);
}

#[test]
fn test_capture_moves_across_threads() {
    let capture = DeviceCapture::with_backend(MockBackend::new(), 0);

    let handle = std::thread::spawn(move || {
        let mut capture = capture;
        capture.capture_frame().map(|frame| frame.metadata.sequence)
    });

    assert_eq!(handle.join().expect("capture thread panicked"), Some(0));
}
