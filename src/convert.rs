//! Conversion from native YUYV buffers to caller-visible RGB24 frames.

use crate::traits::{CaptureError, Format, Result};

/// Convert a packed YUYV buffer to packed RGB24.
///
/// Rows are read at `format.stride`, so padded driver buffers are accepted.
/// Each `[Y0 U Y1 V]` group yields two pixels sharing the same chroma; on an
/// odd-width row the last group yields only its first pixel.
pub fn yuyv_to_rgb24(src: &[u8], format: &Format) -> Result<Vec<u8>> {
    let width = format.width as usize;
    let height = format.height as usize;
    if width == 0 || height == 0 {
        return Ok(Vec::new());
    }

    let line_len = width.div_ceil(2) * 4;
    let stride = (format.stride as usize).max(line_len);

    let needed = stride
        .saturating_mul(height - 1)
        .saturating_add(line_len);
    if src.len() < needed {
        return Err(CaptureError::StreamError(format!(
            "YUYV buffer too short: {} bytes, need {needed}",
            src.len()
        )));
    }

    let mut rgb = Vec::with_capacity(width * height * 3);
    for row in src.chunks(stride).take(height) {
        let line = row.get(..line_len).unwrap_or(row);
        let mut remaining = width;
        for group in line.chunks_exact(4) {
            if let [y0, u, y1, v] = *group {
                let (r, g, b) = yuv_to_rgb(y0, u, v);
                rgb.extend_from_slice(&[r, g, b]);
                if remaining > 1 {
                    let (r, g, b) = yuv_to_rgb(y1, u, v);
                    rgb.extend_from_slice(&[r, g, b]);
                }
            }
            remaining = remaining.saturating_sub(2);
        }
    }

    Ok(rgb)
}

/// Convert YUV values to RGB.
///
/// Uses the ITU-R BT.601 conversion formula, clamped to 0-255.
#[must_use]
#[allow(clippy::many_single_char_names)]
pub fn yuv_to_rgb(y: u8, u: u8, v: u8) -> (u8, u8, u8) {
    let y_f = f32::from(y);
    let u_f = f32::from(u) - 128.0;
    let v_f = f32::from(v) - 128.0;

    let r = 1.402f32.mul_add(v_f, y_f);
    let g = 0.714_14f32.mul_add(-v_f, 0.344_14f32.mul_add(-u_f, y_f));
    let b = 1.772f32.mul_add(u_f, y_f);

    (clamp(r), clamp(g), clamp(b))
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn clamp(val: f32) -> u8 {
    val.clamp(0.0, 255.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_neutral_chroma_is_gray() {
        assert_eq!(yuv_to_rgb(0, 128, 128), (0, 0, 0));
        assert_eq!(yuv_to_rgb(128, 128, 128), (128, 128, 128));
        assert_eq!(yuv_to_rgb(235, 128, 128), (235, 235, 235));
    }

    #[test]
    fn test_saturated_values_clamp() {
        let (r, _, b) = yuv_to_rgb(255, 255, 255);
        assert_eq!(r, 255);
        assert_eq!(b, 255);

        let (r, _, b) = yuv_to_rgb(0, 0, 0);
        assert_eq!(r, 0);
        assert_eq!(b, 0);
    }

    #[test]
    fn test_yuyv_group_expands_to_two_pixels() {
        let format = Format::yuyv(2, 1);
        let rgb = yuyv_to_rgb24(&[16, 128, 235, 128], &format).expect("conversion failed");
        assert_eq!(rgb, vec![16, 16, 16, 235, 235, 235]);
    }

    #[test]
    fn test_padded_stride_is_skipped() {
        let mut format = Format::yuyv(2, 2);
        format.stride = 8;
        let src = [
            50, 128, 50, 128, 0xAA, 0xAA, 0xAA, 0xAA, // row 0 + padding
            90, 128, 90, 128, 0xBB, 0xBB, 0xBB, 0xBB, // row 1 + padding
        ];
        let rgb = yuyv_to_rgb24(&src, &format).expect("conversion failed");
        assert_eq!(rgb.len(), 2 * 2 * 3);
        assert_eq!(rgb.first(), Some(&50));
        assert_eq!(rgb.get(6), Some(&90));
    }

    #[test]
    fn test_odd_width_keeps_last_pixel() {
        let format = Format::yuyv(3, 2);
        assert_eq!(format.stride, 8);
        let src = [
            10, 128, 20, 128, 30, 128, 0, 128, // row 0, last Y1 unused
            40, 128, 50, 128, 60, 128, 0, 128, // row 1
        ];
        let rgb = yuyv_to_rgb24(&src, &format).expect("conversion failed");
        assert_eq!(rgb.len(), 3 * 2 * 3);
        assert_eq!(rgb.get(6..9), Some(&[30, 30, 30][..]));
        assert_eq!(rgb.get(9..12), Some(&[40, 40, 40][..]));
        assert_eq!(rgb.get(15..18), Some(&[60, 60, 60][..]));
    }

    #[test]
    fn test_zero_dimensions_yield_nothing() {
        let rgb = yuyv_to_rgb24(&[], &Format::yuyv(0, 0)).expect("conversion failed");
        assert!(rgb.is_empty());
    }

    #[test]
    fn test_short_buffer_rejected() {
        let format = Format::yuyv(4, 4);
        let result = yuyv_to_rgb24(&[0; 10], &format);
        assert!(matches!(result, Err(CaptureError::StreamError(_))));
    }

    #[test]
    fn test_last_row_without_padding_accepted() {
        let mut format = Format::yuyv(2, 2);
        format.stride = 8;
        // Final row carries no trailing padding.
        let src = [10, 128, 10, 128, 0, 0, 0, 0, 20, 128, 20, 128];
        let rgb = yuyv_to_rgb24(&src, &format).expect("conversion failed");
        assert_eq!(rgb.len(), 12);
    }
}
