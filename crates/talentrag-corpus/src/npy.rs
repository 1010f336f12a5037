//! Minimal reader for the NumPy `.npy` files produced by the offline
//! embedding job: 2-D, C order, little-endian `f4` or `f8`.

use std::path::Path;

use ndarray::Array2;
use once_cell::sync::Lazy;
use regex::Regex;

use talentrag_core::{Error, Result};

const MAGIC: &[u8] = b"\x93NUMPY";

static DESCR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"'descr'\s*:\s*'([^']+)'").expect("valid descr regex"));
static FORTRAN_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"'fortran_order'\s*:\s*(True|False)").expect("valid fortran_order regex")
});
static SHAPE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"'shape'\s*:\s*\(([^)]*)\)").expect("valid shape regex"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Dtype {
    F32,
    F64,
}

impl Dtype {
    fn size(self) -> usize {
        match self {
            Dtype::F32 => 4,
            Dtype::F64 => 8,
        }
    }
}

/// Read a `.npy` file into an (N, dim) `f32` matrix. `f8` input is narrowed.
pub fn read_npy_matrix(path: &Path) -> Result<Array2<f32>> {
    let bytes = std::fs::read(path)?;
    parse_npy_matrix(&bytes)
        .map_err(|e| Error::Corpus(format!("{}: {}", path.display(), e)))
}

/// Parse in-memory `.npy` bytes.
pub fn parse_npy_matrix(bytes: &[u8]) -> std::result::Result<Array2<f32>, String> {
    if bytes.len() < 10 || &bytes[..6] != MAGIC {
        return Err("not a .npy file (bad magic)".into());
    }

    let major = bytes[6];
    let (header_len, header_start) = match major {
        1 => (u16::from_le_bytes([bytes[8], bytes[9]]) as usize, 10),
        2 | 3 => {
            if bytes.len() < 12 {
                return Err("truncated header length".into());
            }
            let len = u32::from_le_bytes([bytes[8], bytes[9], bytes[10], bytes[11]]);
            (len as usize, 12)
        }
        v => return Err(format!("unsupported .npy version {}", v)),
    };

    let data_start = header_start + header_len;
    if bytes.len() < data_start {
        return Err("truncated header".into());
    }
    let header = std::str::from_utf8(&bytes[header_start..data_start])
        .map_err(|_| "header is not valid text".to_string())?;

    let descr = DESCR_RE
        .captures(header)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
        .ok_or("header has no 'descr'")?;
    let dtype = match descr {
        "<f4" => Dtype::F32,
        "<f8" => Dtype::F64,
        other => return Err(format!("unsupported dtype {}", other)),
    };

    let fortran = FORTRAN_RE
        .captures(header)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str() == "True")
        .ok_or("header has no 'fortran_order'")?;
    if fortran {
        return Err("fortran-ordered arrays are not supported".into());
    }

    let shape_str = SHAPE_RE
        .captures(header)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
        .ok_or("header has no 'shape'")?;
    let shape: Vec<usize> = shape_str
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.parse::<usize>().map_err(|_| format!("bad shape entry {:?}", s)))
        .collect::<std::result::Result<_, _>>()?;
    let (rows, cols) = match shape.as_slice() {
        [rows, cols] => (*rows, *cols),
        other => return Err(format!("expected a 2-D array, got shape {:?}", other)),
    };

    let data = &bytes[data_start..];
    let expected = rows * cols * dtype.size();
    if data.len() < expected {
        return Err(format!(
            "truncated data: expected {} bytes, found {}",
            expected,
            data.len()
        ));
    }

    let values: Vec<f32> = match dtype {
        Dtype::F32 => data[..expected]
            .chunks_exact(4)
            .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
            .collect(),
        Dtype::F64 => data[..expected]
            .chunks_exact(8)
            .map(|c| f64::from_le_bytes([c[0], c[1], c[2], c[3], c[4], c[5], c[6], c[7]]) as f32)
            .collect(),
    };

    Array2::from_shape_vec((rows, cols), values).map_err(|e| e.to_string())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Encode a matrix the way `numpy.save` does (version 1.0, `<f4`).
    pub(crate) fn encode_f32(rows: &[Vec<f32>]) -> Vec<u8> {
        let cols = rows.first().map(Vec::len).unwrap_or(0);
        let mut header = format!(
            "{{'descr': '<f4', 'fortran_order': False, 'shape': ({}, {}), }}",
            rows.len(),
            cols
        );
        // Pad so the data starts on a 64-byte boundary, newline-terminated.
        while (10 + header.len() + 1) % 64 != 0 {
            header.push(' ');
        }
        header.push('\n');

        let mut out = MAGIC.to_vec();
        out.extend_from_slice(&[1, 0]);
        out.extend_from_slice(&(header.len() as u16).to_le_bytes());
        out.extend_from_slice(header.as_bytes());
        for row in rows {
            for v in row {
                out.extend_from_slice(&v.to_le_bytes());
            }
        }
        out
    }

    #[test]
    fn test_parse_f32_matrix() {
        let bytes = encode_f32(&[vec![1.0, 2.0, 3.0], vec![4.0, 5.0, 6.0]]);
        let matrix = parse_npy_matrix(&bytes).unwrap();
        assert_eq!(matrix.shape(), &[2, 3]);
        assert_eq!(matrix[[1, 2]], 6.0);
    }

    #[test]
    fn test_parse_f64_matrix_is_narrowed() {
        let header = "{'descr': '<f8', 'fortran_order': False, 'shape': (1, 2), }\n";
        let mut bytes = MAGIC.to_vec();
        bytes.extend_from_slice(&[1, 0]);
        bytes.extend_from_slice(&(header.len() as u16).to_le_bytes());
        bytes.extend_from_slice(header.as_bytes());
        bytes.extend_from_slice(&0.25f64.to_le_bytes());
        bytes.extend_from_slice(&(-1.5f64).to_le_bytes());

        let matrix = parse_npy_matrix(&bytes).unwrap();
        assert_eq!(matrix.shape(), &[1, 2]);
        assert_eq!(matrix[[0, 0]], 0.25);
        assert_eq!(matrix[[0, 1]], -1.5);
    }

    #[test]
    fn test_rejects_bad_magic_and_dtype() {
        assert!(parse_npy_matrix(b"PK\x03\x04 not numpy").is_err());

        let header = "{'descr': '<i8', 'fortran_order': False, 'shape': (1, 1), }\n";
        let mut bytes = MAGIC.to_vec();
        bytes.extend_from_slice(&[1, 0]);
        bytes.extend_from_slice(&(header.len() as u16).to_le_bytes());
        bytes.extend_from_slice(header.as_bytes());
        bytes.extend_from_slice(&7i64.to_le_bytes());
        assert!(parse_npy_matrix(&bytes).unwrap_err().contains("dtype"));
    }

    #[test]
    fn test_rejects_truncated_data() {
        let mut bytes = encode_f32(&[vec![1.0, 2.0], vec![3.0, 4.0]]);
        bytes.truncate(bytes.len() - 4);
        assert!(parse_npy_matrix(&bytes).unwrap_err().contains("truncated"));
    }
}
