//! Frame validation utilities for test pattern verification.
//!
//! This module provides functions to validate that captured frames contain
//! expected test patterns. Useful for integration testing with virtual cameras.

use crate::traits::{CaptureError, Frame, Result};

/// Expected RGB values for SMPTE color bars (8 bars).
///
/// These are the RGB values resulting from converting the YUV values
/// used by the mock backend's color bar pattern.
///
/// Colors in order: White, Yellow, Cyan, Green, Magenta, Red, Blue, Black
const SMPTE_COLOR_BARS: [(u8, u8, u8); 8] = [
    (235, 235, 235), // White
    (235, 235, 11),  // Yellow
    (12, 236, 237),  // Cyan
    (13, 237, 13),   // Green
    (237, 13, 237),  // Magenta
    (238, 14, 13),   // Red
    (15, 15, 239),   // Blue
    (16, 16, 16),    // Black
];

/// Tolerance for RGB color matching (accounts for YUV->RGB conversion errors).
const COLOR_TOLERANCE: u8 = 15;

/// Minimum left-to-right luminance rise for a frame to count as a gradient.
const MIN_GRADIENT_RISE: f32 = 50.0;

/// Validates that a frame contains the SMPTE color bar pattern.
///
/// Samples 8 vertical stripes at their center positions on the middle row
/// and checks each against the expected color within a tolerance.
///
/// # Errors
///
/// Returns `StreamError` if a sample falls outside the frame or any bar
/// doesn't match the expected color within tolerance.
pub fn validate_color_bars(frame: &Frame) -> Result<()> {
    let bar_width = frame.width / 8;
    let center_y = frame.height / 2;

    for (bar_idx, expected_rgb) in (0u32..).zip(SMPTE_COLOR_BARS.iter()) {
        let sample_x = (bar_idx * bar_width) + (bar_width / 2);

        let actual_rgb = frame.pixel_at(sample_x, center_y).ok_or_else(|| {
            CaptureError::StreamError(format!(
                "Failed to get pixel at ({sample_x}, {center_y})"
            ))
        })?;

        if !colors_match(actual_rgb, *expected_rgb, COLOR_TOLERANCE) {
            return Err(CaptureError::StreamError(format!(
                "Color bar {bar_idx} mismatch at ({sample_x}, {center_y}): \
                 expected RGB{expected_rgb:?}, got RGB{actual_rgb:?}"
            )));
        }
    }

    Ok(())
}

/// Validates that a frame contains a horizontal gradient pattern.
///
/// Samples the middle row every 10 pixels and checks that luminance never
/// drops (beyond rounding) and rises by a significant amount overall.
///
/// # Errors
///
/// Returns `StreamError` if the luminance decreases or the total change is
/// too small to be a gradient.
pub fn validate_gradient(frame: &Frame) -> Result<()> {
    let center_y = frame.height / 2;

    let mut first_luminance: Option<f32> = None;
    let mut prev_luminance: Option<f32> = None;

    for x in (0..frame.width).step_by(10) {
        let (r, g, b) = frame.pixel_at(x, center_y).ok_or_else(|| {
            CaptureError::StreamError(format!("Failed to get pixel at ({x}, {center_y})"))
        })?;

        // Y' in Rec. 601
        let luminance = 0.114f32.mul_add(
            f32::from(b),
            0.587f32.mul_add(f32::from(g), 0.299 * f32::from(r)),
        );

        if let Some(prev) = prev_luminance {
            if luminance < prev - 1.0 {
                return Err(CaptureError::StreamError(format!(
                    "Gradient not monotonically increasing at x={x}: \
                     luminance {luminance} < previous {prev}"
                )));
            }
        }

        first_luminance.get_or_insert(luminance);
        prev_luminance = Some(luminance);
    }

    let rise = match (first_luminance, prev_luminance) {
        (Some(first), Some(last)) => last - first,
        _ => 0.0,
    };
    if rise < MIN_GRADIENT_RISE {
        return Err(CaptureError::StreamError(format!(
            "Insufficient luminance change for gradient: {rise} \
             (expected at least {MIN_GRADIENT_RISE})"
        )));
    }

    Ok(())
}

/// Validates that a sequence of frames has incrementing sequence numbers.
///
/// # Errors
///
/// Returns `StreamError` if the slice is empty or any sequence number
/// doesn't increment by exactly 1 from the previous.
pub fn validate_frame_sequence(frames: &[Frame]) -> Result<()> {
    if frames.is_empty() {
        return Err(CaptureError::StreamError(
            "Cannot validate empty frame sequence".to_owned(),
        ));
    }

    for (i, pair) in frames.windows(2).enumerate() {
        if let [prev, curr] = pair {
            let expected = prev.metadata.sequence.wrapping_add(1);
            if curr.metadata.sequence != expected {
                return Err(CaptureError::StreamError(format!(
                    "Frame sequence gap at index {}: expected {expected}, got {}",
                    i + 1,
                    curr.metadata.sequence
                )));
            }
        }
    }

    Ok(())
}

/// Whether all three channels are within `tolerance` of each other.
fn colors_match(actual: (u8, u8, u8), expected: (u8, u8, u8), tolerance: u8) -> bool {
    let (ar, ag, ab) = actual;
    let (er, eg, eb) = expected;

    ar.abs_diff(er) <= tolerance && ag.abs_diff(eg) <= tolerance && ab.abs_diff(eb) <= tolerance
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{MockBackend, TestPattern};
    use crate::DeviceCapture;

    fn capture_one(pattern: TestPattern) -> Frame {
        let mut capture = DeviceCapture::with_backend(MockBackend::new().with_pattern(pattern), 0);
        capture.read_frame().expect("read_frame failed")
    }

    #[test]
    fn test_validate_color_bars_success() {
        let frame = capture_one(TestPattern::ColorBars);
        let result = validate_color_bars(&frame);
        assert!(
            result.is_ok(),
            "Color bars validation should succeed: {result:?}"
        );
    }

    #[test]
    fn test_validate_color_bars_wrong_pattern() {
        let frame = capture_one(TestPattern::Gradient);
        let result = validate_color_bars(&frame);
        assert!(
            result.is_err(),
            "Color bars validation should fail for gradient pattern"
        );
    }

    #[test]
    fn test_validate_gradient_success() {
        let frame = capture_one(TestPattern::Gradient);
        let result = validate_gradient(&frame);
        assert!(
            result.is_ok(),
            "Gradient validation should succeed: {result:?}"
        );
    }

    #[test]
    fn test_validate_gradient_wrong_pattern() {
        let frame = capture_one(TestPattern::Solid(128, 128, 128));
        let result = validate_gradient(&frame);
        assert!(
            result.is_err(),
            "Gradient validation should fail for solid pattern"
        );
    }

    #[test]
    fn test_validate_frame_sequence_success() {
        let mut capture = DeviceCapture::with_backend(MockBackend::new(), 0);

        let frames: Vec<Frame> = (0..5)
            .map(|_| capture.read_frame().expect("read_frame failed"))
            .collect();

        let result = validate_frame_sequence(&frames);
        assert!(
            result.is_ok(),
            "Frame sequence validation should succeed: {result:?}"
        );
    }

    #[test]
    fn test_validate_frame_sequence_empty() {
        let result = validate_frame_sequence(&[]);
        assert!(
            result.is_err(),
            "Frame sequence validation should fail for empty sequence"
        );
    }

    #[test]
    fn test_validate_frame_sequence_with_gap() {
        let mut capture = DeviceCapture::with_backend(MockBackend::new(), 0);

        let mut frames = vec![
            capture.read_frame().expect("read_frame failed"),
            capture.read_frame().expect("read_frame failed"),
        ];

        // Skip a frame to create a gap
        let _ = capture.read_frame().expect("read_frame failed");

        frames.push(capture.read_frame().expect("read_frame failed"));

        let result = validate_frame_sequence(&frames);
        assert!(
            result.is_err(),
            "Frame sequence validation should fail with gap"
        );
    }

    #[test]
    fn test_colors_match_exact() {
        assert!(colors_match((100, 150, 200), (100, 150, 200), 10));
    }

    #[test]
    fn test_colors_match_within_tolerance() {
        assert!(colors_match((100, 150, 200), (105, 155, 205), 10));
    }

    #[test]
    fn test_colors_match_outside_tolerance() {
        assert!(!colors_match((100, 150, 200), (120, 150, 200), 10));
    }
}
