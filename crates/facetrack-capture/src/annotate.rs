//! Frame annotation and wire encoding for the optional `frame` payload
//! field.
//!
//! The overlay draws the tracked region (hollow box), its center marker and
//! the confidence/status readout onto a copy of the raw frame, then the
//! result is JPEG-compressed and base64-encoded for transport. Text labels
//! need a TTF font, which is supplied at startup; without one the overlay
//! falls back to a confidence meter and a status color chip, so the feature
//! works with no bundled assets.

use std::path::Path;

use ab_glyph::{FontArc, PxScale};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use facetrack_core::{TrackStatus, TrackedState};
use image::codecs::jpeg::JpegEncoder;
use image::{Rgb, RgbImage};
use imageproc::drawing::{
    draw_filled_circle_mut, draw_filled_rect_mut, draw_hollow_rect_mut, draw_text_mut,
};
use imageproc::rect::Rect;

use crate::error::{CaptureError, CaptureResult};
use crate::frame::Frame;

/// JPEG quality for streamed frames.
pub const JPEG_QUALITY: u8 = 60;

const BOX_COLOR: Rgb<u8> = Rgb([0, 255, 0]);
const MARKER_COLOR: Rgb<u8> = Rgb([255, 0, 0]);
const LABEL_COLOR: Rgb<u8> = Rgb([255, 255, 255]);
const STATUS_COLOR: Rgb<u8> = Rgb([200, 200, 200]);
const METER_BACK_COLOR: Rgb<u8> = Rgb([60, 60, 60]);

/// Draws tracking overlays onto captured frames.
#[derive(Debug, Clone, Default)]
pub struct Overlay {
    font: Option<FontArc>,
}

impl Overlay {
    /// Overlay without text rendering (meter and color chip only).
    #[must_use]
    pub fn new() -> Self {
        Self { font: None }
    }

    /// Overlay with text labels rendered in the given font.
    #[must_use]
    pub fn with_font(font: FontArc) -> Self {
        Self { font: Some(font) }
    }

    /// Loads a TTF/OTF font for text labels.
    ///
    /// # Errors
    ///
    /// Returns [`CaptureError::FontLoad`] if the file cannot be read or is
    /// not a parseable font. Treated as fatal at startup.
    pub fn from_font_file(path: impl AsRef<Path>) -> CaptureResult<Self> {
        let path = path.as_ref();
        let data = std::fs::read(path)
            .map_err(|e| CaptureError::font_load(path.display().to_string(), e.to_string()))?;
        let font = FontArc::try_from_vec(data)
            .map_err(|e| CaptureError::font_load(path.display().to_string(), e.to_string()))?;
        Ok(Self::with_font(font))
    }

    /// Whether text labels will be rendered.
    #[must_use]
    pub fn has_font(&self) -> bool {
        self.font.is_some()
    }

    /// Renders the overlay for `state` onto a copy of `frame`.
    #[must_use]
    pub fn render(&self, frame: &Frame, state: &TrackedState) -> RgbImage {
        let mut canvas = frame.image.clone();
        let (w, h) = (canvas.width(), canvas.height());

        if state.is_tracking() {
            let box_w = ((state.width * w as f32) as u32).clamp(2, w);
            let box_h = ((state.height * h as f32) as u32).clamp(2, h);
            let cx = (state.center_x * w as f32) as i32;
            let cy = (state.center_y * h as f32) as i32;
            let x0 = (cx - box_w as i32 / 2).clamp(0, w as i32 - 1);
            let y0 = (cy - box_h as i32 / 2).clamp(0, h as i32 - 1);

            let rect = Rect::at(x0, y0).of_size(box_w, box_h);
            draw_hollow_rect_mut(&mut canvas, rect, BOX_COLOR);
            if box_w > 4 && box_h > 4 {
                // Second ring for a 2px stroke.
                let inner = Rect::at(x0 + 1, y0 + 1).of_size(box_w - 2, box_h - 2);
                draw_hollow_rect_mut(&mut canvas, inner, BOX_COLOR);
            }
            draw_filled_circle_mut(&mut canvas, (cx, cy), 4, MARKER_COLOR);

            match &self.font {
                Some(font) => {
                    let label = format!("conf:{:.2}", state.confidence);
                    let y = (y0 - 18).max(0);
                    draw_text_mut(
                        &mut canvas,
                        LABEL_COLOR,
                        x0,
                        y,
                        PxScale::from(16.0),
                        font,
                        &label,
                    );
                }
                None => self.draw_confidence_meter(&mut canvas, state, x0, y0, box_w),
            }
        }

        match &self.font {
            Some(font) => {
                let label = format!("status:{}", state.status);
                draw_text_mut(
                    &mut canvas,
                    STATUS_COLOR,
                    10,
                    8,
                    PxScale::from(18.0),
                    font,
                    &label,
                );
            }
            None => {
                let chip = Rect::at(10, 10).of_size(12, 12);
                draw_filled_rect_mut(&mut canvas, chip, status_color(state.status));
            }
        }

        canvas
    }

    fn draw_confidence_meter(
        &self,
        canvas: &mut RgbImage,
        state: &TrackedState,
        x0: i32,
        y0: i32,
        box_w: u32,
    ) {
        let y = (y0 - 8).max(0);
        let back = Rect::at(x0, y).of_size(box_w, 4);
        draw_filled_rect_mut(canvas, back, METER_BACK_COLOR);
        let filled = (box_w as f32 * state.confidence.clamp(0.0, 1.0)) as u32;
        if filled > 0 {
            let bar = Rect::at(x0, y).of_size(filled, 4);
            draw_filled_rect_mut(canvas, bar, LABEL_COLOR);
        }
    }

    /// Renders and encodes the overlay in one step: the value of the wire
    /// `frame` field.
    ///
    /// # Errors
    ///
    /// Returns [`CaptureError::Encoding`] if JPEG compression fails. Callers
    /// swallow this and send the payload without the field.
    pub fn annotate_and_encode(&self, frame: &Frame, state: &TrackedState) -> CaptureResult<String> {
        encode_frame(&self.render(frame, state))
    }
}

fn status_color(status: TrackStatus) -> Rgb<u8> {
    match status {
        TrackStatus::Ok => BOX_COLOR,
        TrackStatus::NoFace => STATUS_COLOR,
        TrackStatus::CameraError | TrackStatus::DetectorError => MARKER_COLOR,
    }
}

/// JPEG-compresses an image at streaming quality and base64-encodes it.
///
/// # Errors
///
/// Returns [`CaptureError::Encoding`] if compression fails.
pub fn encode_frame(image: &RgbImage) -> CaptureResult<String> {
    let mut buf = Vec::new();
    let mut encoder = JpegEncoder::new_with_quality(&mut buf, JPEG_QUALITY);
    encoder
        .encode_image(image)
        .map_err(|e| CaptureError::encoding(e.to_string()))?;
    Ok(STANDARD.encode(&buf))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use facetrack_core::Candidate;

    fn tracked_state() -> TrackedState {
        let candidate = Candidate::new(0.4, 0.4, 0.2, 0.2, 0.8);
        TrackedState::from_candidate(&candidate, Utc::now())
    }

    fn gray_frame() -> Frame {
        Frame::new(RgbImage::from_pixel(160, 120, Rgb([40, 40, 40])))
    }

    #[test]
    fn test_render_draws_box_and_marker_when_tracking() {
        let overlay = Overlay::new();
        let state = tracked_state();
        let canvas = overlay.render(&gray_frame(), &state);

        // Center marker is red.
        let center = canvas.get_pixel(80, 60);
        assert_eq!(*center, MARKER_COLOR);

        // Box edge passes through x0 = (0.5 - 0.1) * 160 = 64.
        let edge = canvas.get_pixel(64, 60);
        assert_eq!(*edge, BOX_COLOR);
    }

    #[test]
    fn test_render_skips_box_when_not_tracking() {
        let overlay = Overlay::new();
        let state = TrackedState::no_face(Utc::now());
        let canvas = overlay.render(&gray_frame(), &state);

        // No box: the frame center still has the background color.
        assert_eq!(*canvas.get_pixel(80, 60), Rgb([40, 40, 40]));
        // The status chip is drawn in the no-face color.
        assert_eq!(*canvas.get_pixel(12, 12), STATUS_COLOR);
    }

    #[test]
    fn test_encode_produces_decodable_jpeg() {
        let encoded = encode_frame(&gray_frame().image).unwrap();
        assert!(!encoded.is_empty());

        let bytes = STANDARD.decode(encoded).unwrap();
        // JPEG SOI marker.
        assert_eq!(&bytes[..2], &[0xFF, 0xD8]);
    }

    #[test]
    fn test_annotate_and_encode_round_trip() {
        let overlay = Overlay::new();
        let encoded = overlay
            .annotate_and_encode(&gray_frame(), &tracked_state())
            .unwrap();
        let bytes = STANDARD.decode(encoded).unwrap();
        let decoded = image::load_from_memory(&bytes).unwrap();
        assert_eq!(decoded.width(), 160);
        assert_eq!(decoded.height(), 120);
    }

    #[test]
    fn test_missing_font_file_is_a_font_load_error() {
        let err = Overlay::from_font_file("/nonexistent/font.ttf").unwrap_err();
        assert!(matches!(err, CaptureError::FontLoad { .. }));
    }
}
