mod flate;
mod predictor;

use crate::error::{PdfError, Result};
use crate::types::{Dict, PdfObject};

pub use flate::flate_decode;
pub use predictor::apply_predictor;

/// Decode stream data based on Filter(s) in the stream dictionary
pub fn decode_stream(dict: &Dict, data: &[u8]) -> Result<Vec<u8>> {
    let filters = get_filters(dict)?;
    let params = get_decode_params(dict, filters.len());

    let mut result = data.to_vec();
    for (filter, params) in filters.iter().zip(params) {
        result = apply_filter(filter, &result)?;
        if let Some(params) = params {
            result = apply_predictor(&result, params)?;
        }
    }

    Ok(result)
}

/// Extract filter names from dictionary
fn get_filters(dict: &Dict) -> Result<Vec<String>> {
    match dict.get("Filter") {
        None | Some(PdfObject::Null) => Ok(vec![]),
        Some(PdfObject::Name(name)) => Ok(vec![name.clone()]),
        Some(PdfObject::Array(arr)) => arr
            .iter()
            .map(|obj| {
                obj.as_name()
                    .map(|s| s.to_string())
                    .ok_or_else(|| PdfError::InvalidStructure("Filter must be name".into()))
            })
            .collect(),
        _ => Err(PdfError::InvalidStructure("Invalid Filter type".into())),
    }
}

/// `/DecodeParms` is a single dictionary or an array parallel to `/Filter`
fn get_decode_params(dict: &Dict, count: usize) -> Vec<Option<&Dict>> {
    match dict.get("DecodeParms").or_else(|| dict.get("DP")) {
        Some(PdfObject::Array(arr)) => (0..count)
            .map(|i| arr.get(i).and_then(|p| p.as_dict()))
            .collect(),
        Some(obj) => (0..count)
            .map(|i| if i == 0 { obj.as_dict() } else { None })
            .collect(),
        None => vec![None; count],
    }
}

/// Apply a single filter
fn apply_filter(filter: &str, data: &[u8]) -> Result<Vec<u8>> {
    match filter {
        "FlateDecode" | "Fl" => flate_decode(data),
        "ASCIIHexDecode" | "AHx" => ascii_hex_decode(data),
        "ASCII85Decode" | "A85" => ascii85_decode(data),
        "RunLengthDecode" | "RL" => run_length_decode(data),
        other => Err(PdfError::UnsupportedFilter(other.to_string())),
    }
}

/// Decode ASCII hex encoded data
fn ascii_hex_decode(data: &[u8]) -> Result<Vec<u8>> {
    let mut digits = Vec::with_capacity(data.len());

    for &b in data {
        match b {
            b'>' => break,
            b'0'..=b'9' | b'a'..=b'f' | b'A'..=b'F' => digits.push(b),
            _ if b.is_ascii_whitespace() || b == 0 => {}
            _ => {
                return Err(PdfError::DecompressError(format!(
                    "ASCIIHexDecode: invalid char {:?}",
                    b as char
                )));
            }
        }
    }

    Ok(crate::parser::lexer::hex_pairs_to_bytes(&digits))
}

/// Decode ASCII base-85 data, terminated by `~>`
fn ascii85_decode(data: &[u8]) -> Result<Vec<u8>> {
    let mut result = Vec::with_capacity(data.len() * 4 / 5);
    let mut group = [0u8; 5];
    let mut len = 0;

    let body = data.strip_prefix(b"<~").unwrap_or(data);
    for &b in body {
        match b {
            b'~' => break,
            b'z' if len == 0 => result.extend_from_slice(&[0, 0, 0, 0]),
            b'!'..=b'u' => {
                group[len] = b - b'!';
                len += 1;
                if len == 5 {
                    result.extend_from_slice(&base85_group(&group)?);
                    len = 0;
                }
            }
            _ if b.is_ascii_whitespace() => {}
            _ => {
                return Err(PdfError::DecompressError(format!(
                    "ASCII85Decode: invalid char {:?}",
                    b as char
                )));
            }
        }
    }

    // A final partial group of n chars encodes n-1 bytes, padded with 'u'
    if len > 1 {
        for slot in group.iter_mut().skip(len) {
            *slot = b'u' - b'!';
        }
        let bytes = base85_group(&group)?;
        result.extend_from_slice(&bytes[..len - 1]);
    }

    Ok(result)
}

fn base85_group(group: &[u8; 5]) -> Result<[u8; 4]> {
    let value = group
        .iter()
        .try_fold(0u64, |acc, &d| Some(acc * 85 + d as u64))
        .filter(|v| *v <= u32::MAX as u64)
        .ok_or_else(|| PdfError::DecompressError("ASCII85Decode: group overflow".into()))?;
    Ok((value as u32).to_be_bytes())
}

/// Decode RunLength encoded data
fn run_length_decode(data: &[u8]) -> Result<Vec<u8>> {
    let mut result = Vec::new();
    let mut i = 0;

    while i < data.len() {
        let len = data[i];
        i += 1;
        match len {
            128 => break,
            0..=127 => {
                let count = len as usize + 1;
                let chunk = data.get(i..i + count).ok_or_else(|| {
                    PdfError::DecompressError("RunLengthDecode: truncated literal run".into())
                })?;
                result.extend_from_slice(chunk);
                i += count;
            }
            _ => {
                let byte = *data.get(i).ok_or_else(|| {
                    PdfError::DecompressError("RunLengthDecode: truncated repeat run".into())
                })?;
                result.extend(std::iter::repeat_n(byte, 257 - len as usize));
                i += 1;
            }
        }
    }

    Ok(result)
}
