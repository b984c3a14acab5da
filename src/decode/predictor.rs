use crate::error::{PdfError, Result};
use crate::types::Dict;

/// Undo a PNG (10-15) or TIFF (2) predictor described by `/DecodeParms`.
///
/// Cross-reference streams almost always use PNG "Up" prediction.
pub fn apply_predictor(data: &[u8], params: &Dict) -> Result<Vec<u8>> {
    let int_param = |key: &str, default: i64| {
        params.get(key).and_then(|v| v.as_int()).unwrap_or(default)
    };

    let predictor = int_param("Predictor", 1);
    if predictor <= 1 {
        return Ok(data.to_vec());
    }

    let colors = int_param("Colors", 1).max(1) as usize;
    let bits = int_param("BitsPerComponent", 8).max(1) as usize;
    let columns = int_param("Columns", 1).max(1) as usize;

    let bpp = (colors * bits).div_ceil(8).max(1);
    let row_len = (colors * bits * columns).div_ceil(8);

    match predictor {
        2 => Ok(tiff_predictor(data, row_len, bpp)),
        10..=15 => png_predictor(data, row_len, bpp),
        other => Err(PdfError::DecompressError(format!("Unknown predictor {}", other))),
    }
}

fn tiff_predictor(data: &[u8], row_len: usize, bpp: usize) -> Vec<u8> {
    let mut out = data.to_vec();
    for row in out.chunks_mut(row_len) {
        for i in bpp..row.len() {
            row[i] = row[i].wrapping_add(row[i - bpp]);
        }
    }
    out
}

fn png_predictor(data: &[u8], row_len: usize, bpp: usize) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(data.len());
    let mut prev = vec![0u8; row_len];

    for chunk in data.chunks(row_len + 1) {
        let (&filter, encoded) = chunk
            .split_first()
            .ok_or_else(|| PdfError::DecompressError("Empty predictor row".into()))?;

        let mut row = vec![0u8; row_len];
        for (i, &byte) in encoded.iter().enumerate() {
            let left = if i >= bpp { row[i - bpp] } else { 0 };
            let up = prev[i];
            let up_left = if i >= bpp { prev[i - bpp] } else { 0 };

            row[i] = match filter {
                0 => byte,
                1 => byte.wrapping_add(left),
                2 => byte.wrapping_add(up),
                3 => byte.wrapping_add(((left as u16 + up as u16) / 2) as u8),
                4 => byte.wrapping_add(paeth(left, up, up_left)),
                other => {
                    return Err(PdfError::DecompressError(format!(
                        "Unknown PNG filter type {}",
                        other
                    )));
                }
            };
        }

        out.extend_from_slice(&row[..encoded.len()]);
        prev = row;
    }

    Ok(out)
}

fn paeth(a: u8, b: u8, c: u8) -> u8 {
    let p = a as i16 + b as i16 - c as i16;
    let pa = (p - a as i16).abs();
    let pb = (p - b as i16).abs();
    let pc = (p - c as i16).abs();
    if pa <= pb && pa <= pc {
        a
    } else if pb <= pc {
        b
    } else {
        c
    }
}
