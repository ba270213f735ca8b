use ndarray::ArrayView3;

use crate::shared::face_box::FaceBox;

/// A single camera frame: contiguous RGB bytes in row-major order.
///
/// Color-space decoding happens before frames reach the engine; the
/// analyzers treat pixel data as already-decoded RGB.
#[derive(Clone, Debug)]
pub struct Frame {
    data: Vec<u8>,
    width: u32,
    height: u32,
    channels: u8,
    index: usize,
    timestamp_ms: u64,
}

impl Frame {
    pub fn new(data: Vec<u8>, width: u32, height: u32, channels: u8, index: usize) -> Self {
        debug_assert_eq!(
            data.len(),
            (width as usize) * (height as usize) * (channels as usize),
            "data length must equal width * height * channels"
        );
        Self {
            data,
            width,
            height,
            channels,
            index,
            timestamp_ms: 0,
        }
    }

    /// Attach the capture time in milliseconds.
    pub fn with_timestamp_ms(mut self, timestamp_ms: u64) -> Self {
        self.timestamp_ms = timestamp_ms;
        self
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn channels(&self) -> u8 {
        self.channels
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn timestamp_ms(&self) -> u64 {
        self.timestamp_ms
    }

    /// True when the buffer length matches the declared dimensions.
    pub fn is_well_formed(&self) -> bool {
        self.channels >= 3
            && self.data.len()
                == (self.width as usize) * (self.height as usize) * (self.channels as usize)
    }

    pub fn as_ndarray(&self) -> ArrayView3<'_, u8> {
        ArrayView3::from_shape(self.shape(), &self.data)
            .expect("Frame data length must match dimensions")
    }

    /// Copy out the pixels covered by `face_box`, clamped to the frame.
    ///
    /// The crop keeps the frame's index and timestamp. A box that falls
    /// entirely outside the frame yields an empty frame.
    pub fn crop(&self, face_box: &FaceBox) -> Frame {
        let clamped = face_box.clamp_to(self.width, self.height);
        let channels = self.channels as usize;
        let row_len = self.width as usize * channels;
        let crop_w = clamped.width as usize;
        let crop_h = clamped.height as usize;

        let mut data = Vec::with_capacity(crop_w * crop_h * channels);
        for row in 0..crop_h {
            let start = (clamped.y as usize + row) * row_len + clamped.x as usize * channels;
            data.extend_from_slice(&self.data[start..start + crop_w * channels]);
        }

        Frame {
            data,
            width: clamped.width,
            height: clamped.height,
            channels: self.channels,
            index: self.index,
            timestamp_ms: self.timestamp_ms,
        }
    }

    /// Luma plane (0.299R + 0.587G + 0.114B) as `f64`, row-major.
    pub fn to_grayscale(&self) -> Vec<f64> {
        self.data
            .chunks_exact(self.channels as usize)
            .map(|px| luma(px[0], px[1], px[2]))
            .collect()
    }

    fn shape(&self) -> (usize, usize, usize) {
        (
            self.height as usize,
            self.width as usize,
            self.channels as usize,
        )
    }
}

pub fn luma(r: u8, g: u8, b: u8) -> f64 {
    0.299 * r as f64 + 0.587 * g as f64 + 0.114 * b as f64
}
