// ============================================================
// Layer 4 — IDX File Parser
// ============================================================
// MNIST and Fashion-MNIST are distributed in the IDX format:
//
//   images:  [magic 0x00000803][count][rows][cols][count*rows*cols u8]
//   labels:  [magic 0x00000801][count][count u8]
//
// All header integers are big-endian u32. The third magic byte
// is the element type (0x08 = unsigned byte) and the fourth is
// the number of dimensions.

use std::path::PathBuf;

use thiserror::Error;

pub const IMAGE_MAGIC: u32 = 0x0000_0803;
pub const LABEL_MAGIC: u32 = 0x0000_0801;

const IMAGE_HEADER_LEN: usize = 16;
const LABEL_HEADER_LEN: usize = 8;

/// Errors raised while reading IDX dataset files.
#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("bad IDX magic number: expected {expected:#010x}, found {found:#010x}")]
    BadMagic { expected: u32, found: u32 },

    #[error("truncated IDX data: expected {expected} bytes, found {actual}")]
    Truncated { expected: usize, actual: usize },

    #[error("IDX header describes {count} images of {rows}x{cols}, too large to address")]
    Oversized { count: usize, rows: usize, cols: usize },

    #[error("label {label} at index {index} is out of range for {num_classes} classes")]
    LabelOutOfRange { index: usize, label: u8, num_classes: usize },

    #[error("image/label count mismatch: {images} images, {labels} labels")]
    CountMismatch { images: usize, labels: usize },

    #[error("cannot read '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Decoded contents of an IDX image file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdxImages {
    pub count: usize,
    pub rows:  usize,
    pub cols:  usize,
    /// `count * rows * cols` pixels, image after image
    pub pixels: Vec<u8>,
}

impl IdxImages {
    pub fn image_len(&self) -> usize {
        self.rows * self.cols
    }

    pub fn iter(&self) -> impl Iterator<Item = &[u8]> {
        // chunks_exact panics on 0; an empty image size yields no images
        self.pixels.chunks_exact(self.image_len().max(1)).take(self.count)
    }
}

fn read_u32(bytes: &[u8], offset: usize) -> Result<u32, DatasetError> {
    let word = bytes.get(offset..offset + 4).ok_or(DatasetError::Truncated {
        expected: offset + 4,
        actual:   bytes.len(),
    })?;
    Ok(u32::from_be_bytes([word[0], word[1], word[2], word[3]]))
}

fn check_magic(bytes: &[u8], expected: u32) -> Result<(), DatasetError> {
    let found = read_u32(bytes, 0)?;
    if found != expected {
        return Err(DatasetError::BadMagic { expected, found });
    }
    Ok(())
}

/// Parse an `idx3-ubyte` image file.
pub fn parse_images(bytes: &[u8]) -> Result<IdxImages, DatasetError> {
    check_magic(bytes, IMAGE_MAGIC)?;
    let count = read_u32(bytes, 4)? as usize;
    let rows  = read_u32(bytes, 8)? as usize;
    let cols  = read_u32(bytes, 12)? as usize;

    let expected = count
        .checked_mul(rows)
        .and_then(|n| n.checked_mul(cols))
        .and_then(|n| n.checked_add(IMAGE_HEADER_LEN))
        .ok_or(DatasetError::Oversized { count, rows, cols })?;
    if bytes.len() < expected {
        return Err(DatasetError::Truncated { expected, actual: bytes.len() });
    }

    Ok(IdxImages {
        count,
        rows,
        cols,
        pixels: bytes[IMAGE_HEADER_LEN..expected].to_vec(),
    })
}

/// Parse an `idx1-ubyte` label file.
pub fn parse_labels(bytes: &[u8]) -> Result<Vec<u8>, DatasetError> {
    check_magic(bytes, LABEL_MAGIC)?;
    let count = read_u32(bytes, 4)? as usize;

    let expected = count
        .checked_add(LABEL_HEADER_LEN)
        .ok_or(DatasetError::Oversized { count, rows: 1, cols: 1 })?;
    if bytes.len() < expected {
        return Err(DatasetError::Truncated { expected, actual: bytes.len() });
    }

    Ok(bytes[LABEL_HEADER_LEN..expected].to_vec())
}

/// Encode images in IDX form. Used to write fixtures.
#[cfg(test)]
pub fn encode_images(rows: usize, cols: usize, images: &[Vec<u8>]) -> Vec<u8> {
    let mut out = Vec::with_capacity(IMAGE_HEADER_LEN + images.len() * rows * cols);
    out.extend_from_slice(&IMAGE_MAGIC.to_be_bytes());
    out.extend_from_slice(&(images.len() as u32).to_be_bytes());
    out.extend_from_slice(&(rows as u32).to_be_bytes());
    out.extend_from_slice(&(cols as u32).to_be_bytes());
    for image in images {
        out.extend_from_slice(image);
    }
    out
}

/// Encode labels in IDX form.
#[cfg(test)]
pub fn encode_labels(labels: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(LABEL_HEADER_LEN + labels.len());
    out.extend_from_slice(&LABEL_MAGIC.to_be_bytes());
    out.extend_from_slice(&(labels.len() as u32).to_be_bytes());
    out.extend_from_slice(labels);
    out
}
