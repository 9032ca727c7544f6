//! `data:` URI encoding and decoding.

use base64::Engine;

use crate::error::MediaError;

/// Inline bytes as `data:<mime>;base64,<payload>`.
pub fn encode(mime: &str, bytes: &[u8]) -> String {
    let payload = base64::engine::general_purpose::STANDARD.encode(bytes);
    format!("data:{};base64,{}", mime, payload)
}

/// Split an image data URI into its MIME type and decoded bytes.
pub fn decode(url: &str) -> Result<(String, Vec<u8>), MediaError> {
    let rest = url
        .strip_prefix("data:")
        .ok_or(MediaError::MalformedDataUri)?;
    let (header, payload) = rest.split_once(',').ok_or(MediaError::MalformedDataUri)?;
    let mime = header
        .strip_suffix(";base64")
        .ok_or(MediaError::MalformedDataUri)?;
    if !mime.starts_with("image/") {
        return Err(MediaError::MalformedDataUri);
    }
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(payload.trim())
        .map_err(|e| MediaError::Decode(format!("base64: {}", e)))?;
    Ok((mime.to_string(), bytes))
}

/// Whether `url` claims to be an inline image.
pub fn is_image_data_uri(url: &str) -> bool {
    url.starts_with("data:image/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_prefix() {
        let url = encode("image/png", &[1, 2, 3]);
        assert_eq!(url, "data:image/png;base64,AQID");
        assert!(is_image_data_uri(&url));
    }

    #[test]
    fn test_decode_recovers_mime_and_bytes() {
        let (mime, bytes) = decode("data:image/gif;base64,AQID").unwrap();
        assert_eq!(mime, "image/gif");
        assert_eq!(bytes, vec![1, 2, 3]);
    }

    #[test]
    fn test_decode_rejects_non_image_and_non_base64() {
        assert_eq!(
            decode("data:text/plain;base64,AQID"),
            Err(MediaError::MalformedDataUri)
        );
        assert_eq!(
            decode("data:image/png,rawbytes"),
            Err(MediaError::MalformedDataUri)
        );
        assert_eq!(
            decode("https://example.com/a.png"),
            Err(MediaError::MalformedDataUri)
        );
        assert!(matches!(
            decode("data:image/png;base64,@@@"),
            Err(MediaError::Decode(_))
        ));
    }
}
