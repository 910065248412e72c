//! Tile payload codec
//!
//! Turns the text inside a `<data>` element into a flat list of 32-bit
//! global tile ids. The usual path is base64 → zlib → little-endian `u32`s.
//! The decompressed size must match `width * height * 4` exactly; a stream
//! that inflates to anything else is rejected rather than truncated or padded.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use flate2::read::{GzDecoder, ZlibDecoder};
use flate2::write::{GzEncoder, ZlibEncoder};
use std::io::{Read, Write};
use thiserror::Error;

/// Bytes per tile id in the binary payload
pub const BYTES_PER_TILE: usize = 4;

/// Tile payload decoding errors
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("invalid base64 payload: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("decompression failed: {0}")]
    Decompress(#[source] std::io::Error),

    #[error("decompressed size mismatch: expected {expected} bytes, got {actual}")]
    LengthMismatch { expected: usize, actual: usize },

    #[error("invalid CSV tile id '{0}'")]
    InvalidCsv(String),

    #[error("tile payload is empty")]
    MissingPayload,

    #[error("{tile_count} tiles do not fit in addressable memory")]
    TooLarge { tile_count: usize },

    #[error("unsupported encoding '{0}'")]
    UnsupportedEncoding(String),

    #[error("unsupported compression '{0}'")]
    UnsupportedCompression(String),
}

/// Text encoding of a `<data>` payload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    Base64,
    Csv,
}

/// Compression applied to a base64 payload before encoding
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Compression {
    None,
    #[default]
    Zlib,
    Gzip,
}

/// Encoding plus compression, as declared on a `<data>` element
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DataFormat {
    pub encoding: Encoding,
    pub compression: Compression,
}

impl DataFormat {
    /// base64 + zlib, the default layer format of map editors
    pub const BASE64_ZLIB: Self = Self {
        encoding: Encoding::Base64,
        compression: Compression::Zlib,
    };

    /// Interpret the `encoding` / `compression` attribute values
    pub fn from_attributes(
        encoding: Option<&str>,
        compression: Option<&str>,
    ) -> Result<Self, CodecError> {
        let encoding = match encoding {
            Some("base64") => Encoding::Base64,
            Some("csv") => Encoding::Csv,
            Some(other) => return Err(CodecError::UnsupportedEncoding(other.to_string())),
            None => return Err(CodecError::UnsupportedEncoding("xml".to_string())),
        };

        let compression = match (encoding, compression) {
            (_, None) | (_, Some("")) => Compression::None,
            (Encoding::Base64, Some("zlib")) => Compression::Zlib,
            (Encoding::Base64, Some("gzip")) => Compression::Gzip,
            (_, Some(other)) => {
                return Err(CodecError::UnsupportedCompression(other.to_string()))
            }
        };

        Ok(Self { encoding, compression })
    }
}

/// Decode a `<data>` payload into exactly `tile_count` ids (binary formats)
///
/// CSV payloads carry their own count; a wrong count there is caught by the
/// grid builder.
pub fn decode_tile_ids(
    payload: &str,
    format: DataFormat,
    tile_count: usize,
) -> Result<Vec<u32>, CodecError> {
    match format.encoding {
        Encoding::Csv => decode_csv(payload),
        Encoding::Base64 => {
            let expected_len = tile_count
                .checked_mul(BYTES_PER_TILE)
                .ok_or(CodecError::TooLarge { tile_count })?;
            let compressed = decode_base64(payload)?;
            let raw = decompress(&compressed, format.compression, expected_len)?;
            Ok(bytes_to_ids(&raw))
        }
    }
}

/// Decode base64 text, ignoring the whitespace map editors wrap it in
pub fn decode_base64(payload: &str) -> Result<Vec<u8>, CodecError> {
    let cleaned: String = payload.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    if cleaned.is_empty() {
        return Err(CodecError::MissingPayload);
    }
    Ok(BASE64.decode(cleaned.as_bytes())?)
}

/// Inflate `data`, requiring exactly `expected_len` output bytes
///
/// The buffer grows with the stream, so a map header that claims more tiles
/// than the payload holds costs no more memory than the payload inflates to.
pub fn decompress(
    data: &[u8],
    compression: Compression,
    expected_len: usize,
) -> Result<Vec<u8>, CodecError> {
    let mut out = Vec::new();
    // one byte past the expected size is enough to detect an oversized stream
    let limit = u64::try_from(expected_len)
        .unwrap_or(u64::MAX)
        .saturating_add(1);

    match compression {
        Compression::None => out.extend_from_slice(data),
        Compression::Zlib => {
            ZlibDecoder::new(data)
                .take(limit)
                .read_to_end(&mut out)
                .map_err(CodecError::Decompress)?;
        }
        Compression::Gzip => {
            GzDecoder::new(data)
                .take(limit)
                .read_to_end(&mut out)
                .map_err(CodecError::Decompress)?;
        }
    }

    if out.len() != expected_len {
        return Err(CodecError::LengthMismatch {
            expected: expected_len,
            actual: out.len(),
        });
    }

    Ok(out)
}

/// Reinterpret a byte buffer as little-endian `u32` tile ids
pub fn bytes_to_ids(bytes: &[u8]) -> Vec<u32> {
    bytes
        .chunks_exact(BYTES_PER_TILE)
        .map(|chunk| u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect()
}

fn decode_csv(payload: &str) -> Result<Vec<u32>, CodecError> {
    let mut ids = Vec::new();
    for token in payload.split(',') {
        let token = token.trim();
        if token.is_empty() {
            continue;
        }
        let id = token
            .parse()
            .map_err(|_| CodecError::InvalidCsv(token.to_string()))?;
        ids.push(id);
    }
    if ids.is_empty() {
        return Err(CodecError::MissingPayload);
    }
    Ok(ids)
}

/// Encode tile ids the way a map editor writes a base64 `<data>` payload
pub fn encode_tile_ids(ids: &[u32], compression: Compression) -> Result<String, CodecError> {
    let raw: Vec<u8> = ids.iter().flat_map(|id| id.to_le_bytes()).collect();

    let compressed = match compression {
        Compression::None => raw,
        Compression::Zlib => {
            let mut encoder = ZlibEncoder::new(Vec::new(), flate2::Compression::default());
            encoder.write_all(&raw).map_err(CodecError::Decompress)?;
            encoder.finish().map_err(CodecError::Decompress)?
        }
        Compression::Gzip => {
            let mut encoder = GzEncoder::new(Vec::new(), flate2::Compression::default());
            encoder.write_all(&raw).map_err(CodecError::Decompress)?;
            encoder.finish().map_err(CodecError::Decompress)?
        }
    };

    Ok(BASE64.encode(compressed))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zlib_roundtrip() {
        let ids = vec![1, 2, 5, 0, 0x8000_0003, 70000];
        let payload = encode_tile_ids(&ids, Compression::Zlib).unwrap();
        let decoded = decode_tile_ids(&payload, DataFormat::BASE64_ZLIB, ids.len()).unwrap();
        assert_eq!(decoded, ids);
    }

    #[test]
    fn test_gzip_and_uncompressed() {
        let ids: Vec<u32> = (0..64).collect();

        let gz = encode_tile_ids(&ids, Compression::Gzip).unwrap();
        let format = DataFormat::from_attributes(Some("base64"), Some("gzip")).unwrap();
        assert_eq!(decode_tile_ids(&gz, format, 64).unwrap(), ids);

        let plain = encode_tile_ids(&ids, Compression::None).unwrap();
        let format = DataFormat::from_attributes(Some("base64"), None).unwrap();
        assert_eq!(decode_tile_ids(&plain, format, 64).unwrap(), ids);
    }

    #[test]
    fn test_payload_whitespace_is_ignored() {
        let payload = encode_tile_ids(&[7, 8, 9, 10], Compression::Zlib).unwrap();
        let (head, tail) = payload.split_at(payload.len() / 2);
        let wrapped = format!("\n   {}\n   {}\n  ", head, tail);
        assert_eq!(
            decode_tile_ids(&wrapped, DataFormat::BASE64_ZLIB, 4).unwrap(),
            vec![7, 8, 9, 10]
        );
    }

    #[test]
    fn test_length_mismatch() {
        let payload = encode_tile_ids(&[1, 2, 3], Compression::Zlib).unwrap();

        match decode_tile_ids(&payload, DataFormat::BASE64_ZLIB, 4) {
            Err(CodecError::LengthMismatch { expected, actual }) => {
                assert_eq!(expected, 16);
                assert_eq!(actual, 12);
            }
            other => panic!("expected LengthMismatch, got {:?}", other),
        }

        // longer than declared is rejected too
        assert!(matches!(
            decode_tile_ids(&payload, DataFormat::BASE64_ZLIB, 2),
            Err(CodecError::LengthMismatch { expected: 8, .. })
        ));
    }

    #[test]
    fn test_huge_declared_count() {
        let payload = encode_tile_ids(&[1, 2, 3], Compression::Zlib).unwrap();

        // nothing is reserved up front for the declared size
        let tiles = 9_000_000_000_000;
        match decode_tile_ids(&payload, DataFormat::BASE64_ZLIB, tiles) {
            Err(CodecError::LengthMismatch { expected, actual }) => {
                assert_eq!(expected, tiles * BYTES_PER_TILE);
                assert_eq!(actual, 12);
            }
            other => panic!("expected LengthMismatch, got {:?}", other),
        }

        assert!(matches!(
            decode_tile_ids(&payload, DataFormat::BASE64_ZLIB, usize::MAX),
            Err(CodecError::TooLarge { tile_count: usize::MAX })
        ));
    }

    #[test]
    fn test_invalid_base64() {
        let result = decode_tile_ids("eJz*!!", DataFormat::BASE64_ZLIB, 1);
        assert!(matches!(result, Err(CodecError::Base64(_))));

        let result = decode_tile_ids("   ", DataFormat::BASE64_ZLIB, 1);
        assert!(matches!(result, Err(CodecError::MissingPayload)));
    }

    #[test]
    fn test_malformed_stream() {
        // valid base64, but not a zlib stream
        let payload = BASE64.encode(b"definitely not deflate data");
        let result = decode_tile_ids(&payload, DataFormat::BASE64_ZLIB, 4);
        assert!(matches!(
            result,
            Err(CodecError::Decompress(_)) | Err(CodecError::LengthMismatch { .. })
        ));
    }

    #[test]
    fn test_truncated_stream() {
        let ids: Vec<u32> = (0..256).collect();
        let payload = encode_tile_ids(&ids, Compression::Zlib).unwrap();
        let mut bytes = BASE64.decode(payload).unwrap();
        bytes.truncate(bytes.len() / 2);
        let truncated = BASE64.encode(bytes);

        let result = decode_tile_ids(&truncated, DataFormat::BASE64_ZLIB, ids.len());
        assert!(result.is_err());
    }

    #[test]
    fn test_csv() {
        let format = DataFormat::from_attributes(Some("csv"), None).unwrap();
        let ids = decode_tile_ids("\n1,2,\n5,0\n", format, 4).unwrap();
        assert_eq!(ids, vec![1, 2, 5, 0]);

        assert!(matches!(
            decode_tile_ids("1,x", format, 2),
            Err(CodecError::InvalidCsv(token)) if token == "x"
        ));
    }

    #[test]
    fn test_data_format_attributes() {
        assert_eq!(
            DataFormat::from_attributes(Some("base64"), Some("zlib")).unwrap(),
            DataFormat::BASE64_ZLIB
        );
        assert!(matches!(
            DataFormat::from_attributes(Some("base64"), Some("zstd")),
            Err(CodecError::UnsupportedCompression(c)) if c == "zstd"
        ));
        assert!(matches!(
            DataFormat::from_attributes(Some("csv"), Some("zlib")),
            Err(CodecError::UnsupportedCompression(_))
        ));
        assert!(matches!(
            DataFormat::from_attributes(None, None),
            Err(CodecError::UnsupportedEncoding(_))
        ));
    }

    #[test]
    fn test_bytes_to_ids_little_endian() {
        let bytes = [0x01, 0x00, 0x00, 0x00, 0x00, 0x01, 0x00, 0x80];
        assert_eq!(bytes_to_ids(&bytes), vec![1, 0x8000_0100]);
    }
}
