use flate2::read::{DeflateDecoder, ZlibDecoder};
use log::warn;
use std::io::Read;

use crate::error::{PdfError, Result};

/// Decompress zlib/deflate data.
///
/// Truncated streams are common in real files; whatever decompressed before
/// the error is kept. Data without a zlib header is retried as raw deflate.
pub fn flate_decode(data: &[u8]) -> Result<Vec<u8>> {
    let mut result = Vec::new();
    match ZlibDecoder::new(data).read_to_end(&mut result) {
        Ok(_) => return Ok(result),
        Err(e) if !result.is_empty() => {
            warn!("FlateDecode truncated after {} bytes: {}", result.len(), e);
            return Ok(result);
        }
        Err(_) => {}
    }

    let mut raw = Vec::new();
    DeflateDecoder::new(data)
        .read_to_end(&mut raw)
        .map_err(|e| PdfError::DecompressError(format!("FlateDecode failed: {}", e)))?;
    Ok(raw)
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::Compression;
    use flate2::write::{DeflateEncoder, ZlibEncoder};
    use std::io::Write;

    #[test]
    fn test_flate_decode() {
        let original = b"BT /F1 12 Tf 72 700 Td (Quarterly totals) Tj ET";
        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(original).unwrap();
        let compressed = encoder.finish().unwrap();

        assert_eq!(flate_decode(&compressed).unwrap(), original);
    }

    #[test]
    fn test_raw_deflate_fallback() {
        let original = b"0 0 m 100 0 l S";
        let mut encoder = DeflateEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(original).unwrap();
        let compressed = encoder.finish().unwrap();

        assert_eq!(flate_decode(&compressed).unwrap(), original);
    }

    #[test]
    fn test_truncated_stream_keeps_prefix() {
        let original: Vec<u8> = (0..4000).map(|i| b'a' + (i % 26) as u8).collect();
        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::fast());
        encoder.write_all(&original).unwrap();
        let compressed = encoder.finish().unwrap();

        let truncated = &compressed[..compressed.len() - 8];
        let decoded = flate_decode(truncated).unwrap();
        assert!(!decoded.is_empty());
        assert!(original.starts_with(&decoded));
    }
}
