//! Response content-coding negotiation and compression.

use std::collections::HashMap;
use std::fmt;
use std::io::{self, Write};

/// Content codings the server can apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContentCoding {
    Zstd,
    Brotli,
    Deflate,
    Gzip,
}

impl ContentCoding {
    /// Server preference order, used to break quality ties.
    pub const PREFERENCE: [ContentCoding; 4] = [
        ContentCoding::Zstd,
        ContentCoding::Brotli,
        ContentCoding::Deflate,
        ContentCoding::Gzip,
    ];

    /// Token used in `Accept-Encoding` and `Content-Encoding`.
    pub const fn as_str(&self) -> &'static str {
        match self {
            ContentCoding::Zstd => "zstd",
            ContentCoding::Brotli => "br",
            ContentCoding::Deflate => "deflate",
            ContentCoding::Gzip => "gzip",
        }
    }
}

impl fmt::Display for ContentCoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Pick a coding for an `Accept-Encoding` header value.
///
/// Each entry is `coding[;q=weight]`; a missing weight is 1 and a weight of 0
/// refuses the coding. `*` sets the weight of every coding not listed
/// explicitly. The highest weighted coding wins, ties going to the earlier one
/// in [`ContentCoding::PREFERENCE`]. `None` means send the body uncompressed.
pub fn negotiate(accept_encoding: Option<&str>) -> Option<ContentCoding> {
    let header = accept_encoding?;

    let mut weights: HashMap<String, f32> = HashMap::new();
    for entry in header.split(',') {
        let mut parts = entry.split(';');
        let coding = parts.next().unwrap_or("").trim().to_ascii_lowercase();
        if coding.is_empty() {
            continue;
        }

        let mut weight = Some(1.0f32);
        for param in parts {
            if let Some((key, value)) = param.split_once('=') {
                if key.trim().eq_ignore_ascii_case("q") {
                    weight = value
                        .trim()
                        .parse::<f32>()
                        .ok()
                        .filter(|q| (0.0..=1.0).contains(q));
                }
            }
        }
        // Entries with an unparseable weight are ignored
        if let Some(weight) = weight {
            weights.insert(coding, weight);
        }
    }

    let wildcard = weights.get("*").copied();
    let mut best: Option<(ContentCoding, f32)> = None;
    for coding in ContentCoding::PREFERENCE {
        let Some(weight) = weights.get(coding.as_str()).copied().or(wildcard) else {
            continue;
        };
        if weight > 0.0 && best.map_or(true, |(_, w)| weight > w) {
            best = Some((coding, weight));
        }
    }
    best.map(|(coding, _)| coding)
}

/// Compress `data` with `coding`.
pub fn compress(coding: ContentCoding, data: &[u8]) -> io::Result<Vec<u8>> {
    match coding {
        ContentCoding::Zstd => zstd::stream::encode_all(data, 0),
        ContentCoding::Brotli => {
            let mut writer = brotli::CompressorWriter::new(Vec::new(), 4096, 5, 22);
            writer.write_all(data)?;
            writer.flush()?;
            Ok(writer.into_inner())
        }
        ContentCoding::Deflate => {
            let mut encoder =
                flate2::write::ZlibEncoder::new(Vec::new(), flate2::Compression::default());
            encoder.write_all(data)?;
            encoder.finish()
        }
        ContentCoding::Gzip => {
            let mut encoder =
                flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::default());
            encoder.write_all(data)?;
            encoder.finish()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;

    #[test]
    fn test_negotiate_prefers_server_order_on_ties() {
        assert_eq!(
            negotiate(Some("gzip, deflate, br, zstd")),
            Some(ContentCoding::Zstd)
        );
        assert_eq!(negotiate(Some("gzip, deflate, br")), Some(ContentCoding::Brotli));
        assert_eq!(negotiate(Some("gzip, deflate")), Some(ContentCoding::Deflate));
        assert_eq!(negotiate(Some("GZIP")), Some(ContentCoding::Gzip));
    }

    #[test]
    fn test_negotiate_honours_weights() {
        assert_eq!(
            negotiate(Some("br;q=0.5, gzip;q=0.9")),
            Some(ContentCoding::Gzip)
        );
        assert_eq!(negotiate(Some("zstd;q=0, gzip")), Some(ContentCoding::Gzip));
        assert_eq!(negotiate(Some("*;q=0.1, deflate;q=0.2")), Some(ContentCoding::Deflate));
    }

    #[test]
    fn test_negotiate_wildcard() {
        assert_eq!(negotiate(Some("*")), Some(ContentCoding::Zstd));
        assert_eq!(negotiate(Some("*, zstd;q=0")), Some(ContentCoding::Brotli));
    }

    #[test]
    fn test_negotiate_nothing_acceptable() {
        assert_eq!(negotiate(None), None);
        assert_eq!(negotiate(Some("")), None);
        assert_eq!(negotiate(Some("identity")), None);
        assert_eq!(negotiate(Some("compress, gzip;q=0")), None);
        assert_eq!(negotiate(Some("gzip;q=abc")), None);
    }

    fn sample() -> Vec<u8> {
        (0..4096u32).flat_map(|i| (i % 61).to_le_bytes()).collect()
    }

    #[test]
    fn test_compress_gzip_and_deflate() {
        let data = sample();

        let gz = compress(ContentCoding::Gzip, &data).unwrap();
        assert!(gz.len() < data.len());
        let mut out = Vec::new();
        flate2::read::GzDecoder::new(&gz[..]).read_to_end(&mut out).unwrap();
        assert_eq!(out, data);

        let zlib = compress(ContentCoding::Deflate, &data).unwrap();
        let mut out = Vec::new();
        flate2::read::ZlibDecoder::new(&zlib[..]).read_to_end(&mut out).unwrap();
        assert_eq!(out, data);
    }

    #[test]
    fn test_compress_brotli_and_zstd() {
        let data = sample();

        let br = compress(ContentCoding::Brotli, &data).unwrap();
        let mut out = Vec::new();
        brotli::Decompressor::new(&br[..], 4096).read_to_end(&mut out).unwrap();
        assert_eq!(out, data);

        let zst = compress(ContentCoding::Zstd, &data).unwrap();
        assert_eq!(zstd::stream::decode_all(&zst[..]).unwrap(), data);
    }
}
