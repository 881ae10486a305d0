//! Captured image frame
//!
//! A frame is immutable once captured. Pixel data is held in `bytes::Bytes`,
//! so handing the same frame to every subscriber only bumps a reference count.

use bytes::Bytes;

use crate::error::{Error, Result};

/// Bytes per pixel of packed BGR data
pub const BGR_BYTES_PER_PIXEL: i32 = 3;

/// One captured image
///
/// `data` holds at least `stride * height` bytes, row after row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    width: i32,
    height: i32,
    stride: i32,
    data: Bytes,
}

impl Frame {
    /// Create a frame, validating the geometry against the buffer
    pub fn new(width: i32, height: i32, stride: i32, data: impl Into<Bytes>) -> Result<Self> {
        let data = data.into();

        if width < 0 || height < 0 || stride < 0 {
            return Err(Error::InvalidFrame(format!(
                "negative geometry {}x{} stride {}",
                width, height, stride
            )));
        }

        let required = stride as usize * height as usize;
        if data.len() < required {
            return Err(Error::InvalidFrame(format!(
                "{} bytes for {} rows of {} bytes",
                data.len(),
                height,
                stride
            )));
        }

        Ok(Self {
            width,
            height,
            stride,
            data,
        })
    }

    /// Create a packed BGR frame (`stride = width * 3`)
    pub fn bgr(width: i32, height: i32, data: impl Into<Bytes>) -> Result<Self> {
        let stride = width
            .checked_mul(BGR_BYTES_PER_PIXEL)
            .ok_or_else(|| Error::InvalidFrame(format!("width {} overflows stride", width)))?;
        Self::new(width, height, stride, data)
    }

    /// Width in pixels
    pub fn width(&self) -> i32 {
        self.width
    }

    /// Height in pixels
    pub fn height(&self) -> i32 {
        self.height
    }

    /// Bytes per row
    pub fn stride(&self) -> i32 {
        self.stride
    }

    /// Raw pixel bytes
    pub fn data(&self) -> &Bytes {
        &self.data
    }

    /// Size of the pixel buffer in bytes
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the frame carries no pixel data
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Bytes of row `y`, or `None` if out of range
    pub fn row(&self, y: i32) -> Option<&[u8]> {
        if y < 0 || y >= self.height {
            return None;
        }
        let start = y as usize * self.stride as usize;
        self.data.get(start..start + self.stride as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bgr_frame() {
        let frame = Frame::bgr(640, 480, vec![0u8; 640 * 480 * 3]).unwrap();

        assert_eq!(frame.width(), 640);
        assert_eq!(frame.height(), 480);
        assert_eq!(frame.stride(), 1920);
        assert_eq!(frame.len(), 921_600);
    }

    #[test]
    fn test_short_buffer_rejected() {
        let result = Frame::new(4, 4, 12, vec![0u8; 47]);
        assert!(matches!(result, Err(Error::InvalidFrame(_))));
    }

    #[test]
    fn test_padded_buffer_accepted() {
        // Drivers may hand back buffers longer than stride * height
        let frame = Frame::new(2, 2, 8, vec![0u8; 20]).unwrap();
        assert_eq!(frame.len(), 20);
    }

    #[test]
    fn test_negative_geometry_rejected() {
        assert!(Frame::new(-1, 2, 3, vec![0u8; 6]).is_err());
        assert!(Frame::new(1, 2, -3, Vec::new()).is_err());
    }

    #[test]
    fn test_row_access() {
        let data: Vec<u8> = (0..12).collect();
        let frame = Frame::new(2, 2, 6, data).unwrap();

        assert_eq!(frame.row(0), Some(&[0, 1, 2, 3, 4, 5][..]));
        assert_eq!(frame.row(1), Some(&[6, 7, 8, 9, 10, 11][..]));
        assert_eq!(frame.row(2), None);
    }

    #[test]
    fn test_clone_shares_pixels() {
        let frame = Frame::bgr(2, 1, vec![1u8; 6]).unwrap();
        let copy = frame.clone();

        assert_eq!(frame.data().as_ptr(), copy.data().as_ptr());
    }
}
