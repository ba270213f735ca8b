use serde::{Deserialize, Serialize};

/// Side of the fallback crop as a fraction of the shorter frame edge.
pub const CENTER_CROP_FRACTION: f64 = 0.6;

/// Axis-aligned face bounding box in frame pixel coordinates.
///
/// The origin may be negative or the box may extend past the frame when it
/// comes straight from a detector; [`FaceBox::clamp_to`] produces a box that
/// is safe to index with.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FaceBox {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl FaceBox {
    pub fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Centered square used when the detector reports no face.
    pub fn centered(frame_width: u32, frame_height: u32) -> Self {
        let side = (frame_width.min(frame_height) as f64 * CENTER_CROP_FRACTION).round() as u32;
        let x = (frame_width.saturating_sub(side) / 2) as i32;
        let y = (frame_height.saturating_sub(side) / 2) as i32;
        Self::new(x, y, side, side)
    }

    pub fn center(&self) -> (f64, f64) {
        (
            self.x as f64 + self.width as f64 / 2.0,
            self.y as f64 + self.height as f64 / 2.0,
        )
    }

    /// Grow (or shrink) the box about its center by `scale`.
    pub fn scaled(&self, scale: f64) -> Self {
        let (cx, cy) = self.center();
        let w = (self.width as f64 * scale).max(0.0);
        let h = (self.height as f64 * scale).max(0.0);
        Self::new(
            (cx - w / 2.0).round() as i32,
            (cy - h / 2.0).round() as i32,
            w.round() as u32,
            h.round() as u32,
        )
    }

    /// Intersect with the frame rectangle `[0, width) x [0, height)`.
    ///
    /// A box with no overlap collapses to a zero-sized box at the nearest
    /// in-frame corner.
    pub fn clamp_to(&self, frame_width: u32, frame_height: u32) -> Self {
        let fw = frame_width as i64;
        let fh = frame_height as i64;
        let x1 = (self.x as i64).clamp(0, fw);
        let y1 = (self.y as i64).clamp(0, fh);
        let x2 = (self.x as i64 + self.width as i64).clamp(0, fw);
        let y2 = (self.y as i64 + self.height as i64).clamp(0, fh);
        Self::new(
            x1 as i32,
            y1 as i32,
            (x2 - x1).max(0) as u32,
            (y2 - y1).max(0) as u32,
        )
    }

    pub fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }
}
