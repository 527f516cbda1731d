//! Accept-Encoding negotiation and gzip compression for grid payloads.
//!
//! Compression happens per response; compressed bytes are never cached.

use std::io::Write;

use axum::http::{header, HeaderMap};
use flate2::write::GzEncoder;
use flate2::Compression;

/// Whether the client accepts a gzip-encoded response.
///
/// An explicit `gzip` (or `x-gzip`) entry decides by its q-value; otherwise
/// a `*` entry does. `q=0` refuses. Codings are case-insensitive.
pub fn accepts_gzip(headers: &HeaderMap) -> bool {
    let Some(accept) = headers
        .get(header::ACCEPT_ENCODING)
        .and_then(|v| v.to_str().ok())
    else {
        return false;
    };

    let mut explicit: Option<f32> = None;
    let mut wildcard: Option<f32> = None;

    for entry in accept.split(',') {
        let mut parts = entry.split(';');
        let coding = parts.next().unwrap_or("").trim().to_ascii_lowercase();
        if coding.is_empty() {
            continue;
        }

        // Parse quality value (default 1.0)
        let quality = parts
            .find_map(|p| {
                let p = p.trim();
                p.strip_prefix("q=")
                    .or_else(|| p.strip_prefix("Q="))
                    .and_then(|q| q.trim().parse::<f32>().ok())
            })
            .unwrap_or(1.0);

        match coding.as_str() {
            "gzip" | "x-gzip" => explicit = Some(explicit.map_or(quality, |q| q.max(quality))),
            "*" => wildcard = Some(quality),
            _ => {}
        }
    }

    explicit.or(wildcard).map_or(false, |q| q > 0.0)
}

/// Gzip `data` at the default compression level.
pub fn gzip(data: &[u8]) -> std::io::Result<Vec<u8>> {
    let mut encoder = GzEncoder::new(Vec::with_capacity(data.len() / 4), Compression::default());
    encoder.write_all(data)?;
    encoder.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use flate2::read::GzDecoder;
    use std::io::Read;

    fn headers(accept: &str) -> HeaderMap {
        let mut map = HeaderMap::new();
        map.insert(header::ACCEPT_ENCODING, HeaderValue::from_str(accept).unwrap());
        map
    }

    #[test]
    fn test_accepts_gzip() {
        assert!(accepts_gzip(&headers("gzip")));
        assert!(accepts_gzip(&headers("gzip, deflate, br")));
        assert!(accepts_gzip(&headers("br;q=1.0, GZIP;q=0.5")));
        assert!(accepts_gzip(&headers("*")));
        assert!(accepts_gzip(&headers("x-gzip")));
    }

    #[test]
    fn test_refuses_gzip() {
        assert!(!accepts_gzip(&HeaderMap::new()));
        assert!(!accepts_gzip(&headers("identity")));
        assert!(!accepts_gzip(&headers("gzip;q=0")));
        assert!(!accepts_gzip(&headers("gzip; q=0.0, br")));
        assert!(!accepts_gzip(&headers("*;q=0")));
        // Explicit refusal wins over the wildcard.
        assert!(!accepts_gzip(&headers("*, gzip;q=0")));
        // No substring matching.
        assert!(!accepts_gzip(&headers("notgzip")));
    }

    #[test]
    fn test_gzip_roundtrip() {
        let data = br#"{"lat":[36.0],"lon":[118.0,118.5],"shape":[1,2],"lsm":[1.0,0.0]}"#;
        let compressed = gzip(data).unwrap();
        assert_eq!(&compressed[..2], &[0x1f, 0x8b]);

        let mut out = Vec::new();
        GzDecoder::new(&compressed[..]).read_to_end(&mut out).unwrap();
        assert_eq!(&out[..], &data[..]);
    }
}
