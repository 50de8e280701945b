//! Still-image capturer
//!
//! A synthetic capturer with no device behind it: the host pushes PNG frames,
//! which are decoded to RGBA8 and published to the video source through a
//! watch channel. Only the most recent frame is kept.

use super::traits::{CaptureFormat, Capturer, CapturerKind, StillImageSink};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::watch;

/// Still-image decoding errors
#[derive(Error, Debug)]
pub enum ImageError {
    #[error("PNG decoding error: {0}")]
    Decode(#[from] png::DecodingError),

    #[error("Unsupported PNG layout: {0}")]
    Unsupported(String),
}

/// A decoded RGBA8 frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StillFrame {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

/// Decode a PNG image into an RGBA8 frame
pub fn decode_png(encoded: &[u8]) -> Result<StillFrame, ImageError> {
    let mut decoder = png::Decoder::new(encoded);
    decoder.set_transformations(png::Transformations::EXPAND | png::Transformations::STRIP_16);
    let mut reader = decoder.read_info()?;

    let mut buf = vec![0; reader.output_buffer_size()];
    let info = reader.next_frame(&mut buf)?;
    buf.truncate(info.buffer_size());

    let rgba = match info.color_type {
        png::ColorType::Rgba => buf,
        png::ColorType::Rgb => buf
            .chunks_exact(3)
            .flat_map(|p| [p[0], p[1], p[2], 255])
            .collect(),
        png::ColorType::Grayscale => buf.iter().flat_map(|&g| [g, g, g, 255]).collect(),
        png::ColorType::GrayscaleAlpha => buf
            .chunks_exact(2)
            .flat_map(|p| [p[0], p[0], p[0], p[1]])
            .collect(),
        other => {
            return Err(ImageError::Unsupported(format!("{:?}", other)));
        }
    };

    Ok(StillFrame {
        width: info.width,
        height: info.height,
        rgba,
    })
}

/// Capturer fed with host-supplied still images
pub struct ImageCapturer {
    running: AtomicBool,
    format: Mutex<Option<CaptureFormat>>,
    delivered: AtomicU64,
    frames: watch::Sender<Option<Arc<StillFrame>>>,
}

impl ImageCapturer {
    pub fn new() -> Self {
        let (frames, _) = watch::channel(None);
        Self {
            running: AtomicBool::new(false),
            format: Mutex::new(None),
            delivered: AtomicU64::new(0),
            frames,
        }
    }

    /// Watch the latest decoded frame
    pub fn subscribe(&self) -> watch::Receiver<Option<Arc<StillFrame>>> {
        self.frames.subscribe()
    }

    pub fn latest_frame(&self) -> Option<Arc<StillFrame>> {
        self.frames.borrow().clone()
    }

    /// Frames received while running
    pub fn frames_delivered(&self) -> u64 {
        self.delivered.load(Ordering::Relaxed)
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Geometry passed to the last `start_capture`
    pub fn format(&self) -> Option<CaptureFormat> {
        *self.format.lock()
    }
}

impl Default for ImageCapturer {
    fn default() -> Self {
        Self::new()
    }
}

impl Capturer for ImageCapturer {
    fn kind(&self) -> CapturerKind {
        CapturerKind::StillImage
    }

    fn start_capture(&self, format: CaptureFormat) -> anyhow::Result<()> {
        *self.format.lock() = Some(format);
        self.running.store(true, Ordering::SeqCst);
        tracing::debug!("Still-image capturer started at {}", format);
        Ok(())
    }

    fn stop_capture(&self) -> anyhow::Result<()> {
        self.running.store(false, Ordering::SeqCst);
        tracing::debug!(
            "Still-image capturer stopped after {} frames",
            self.frames_delivered()
        );
        Ok(())
    }

    fn as_still_image_sink(&self) -> Option<&dyn StillImageSink> {
        Some(self)
    }
}

impl StillImageSink for ImageCapturer {
    fn put_image(&self, encoded: &[u8]) {
        let frame = match decode_png(encoded) {
            Ok(frame) => frame,
            Err(e) => {
                tracing::warn!("Dropping still image: {}", e);
                return;
            }
        };

        if self.is_running() {
            self.delivered.fetch_add(1, Ordering::Relaxed);
        }
        self.frames.send_replace(Some(Arc::new(frame)));
    }

    fn frames(&self) -> watch::Receiver<Option<Arc<StillFrame>>> {
        self.subscribe()
    }
}

#[cfg(test)]
pub(crate) fn encode_png(width: u32, height: u32, color: png::ColorType, data: &[u8]) -> Vec<u8> {
    let mut out = Vec::new();
    {
        let mut encoder = png::Encoder::new(&mut out, width, height);
        encoder.set_color(color);
        encoder.set_depth(png::BitDepth::Eight);
        let mut writer = encoder.write_header().unwrap();
        writer.write_image_data(data).unwrap();
    }
    out
}
