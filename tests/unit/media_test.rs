//! Unit tests for data URLs and media helpers

use yacht_shot::media::{data_url, essence, guess_from_extension, sniff, ImagePayload};
use yacht_shot::AppError;

#[test]
fn test_data_url_round_trip() {
    let cases: [(&[u8], &str); 5] = [
        (b"", "image/png"),
        (b"caf\xc3\xa9", "text/plain;charset=utf-8"),
        (b"\x00\x01\x02\xff", "image/jpeg"),
        (b"plain text, with a comma", "text/plain"),
        (b"webp-ish", "image/webp"),
    ];
    for (bytes, media_type) in cases {
        let decoded = data_url::decode(&data_url::encode(bytes, media_type)).unwrap();
        assert_eq!(decoded, ImagePayload::new(bytes.to_vec(), media_type));
    }
}

#[test]
fn test_decode_requires_scheme() {
    for input in ["", "image/png;base64,Zm9v", "DATA:image/png;base64,Zm9v", " data:,x"] {
        assert!(
            matches!(data_url::decode(input), Err(AppError::InvalidDataUrl(_))),
            "accepted {:?}",
            input
        );
    }
}

#[test]
fn test_decode_requires_separator() {
    assert!(matches!(
        data_url::decode("data:image/png;base64Zm9v"),
        Err(AppError::InvalidDataUrl(_))
    ));
}

#[test]
fn test_decode_with_extra_parameters() {
    let decoded = data_url::decode("data:image/png;name=me.png;base64,Zm9v").unwrap();
    assert_eq!(decoded.media_type, "image/png;name=me.png");
    assert_eq!(essence(&decoded.media_type), "image/png");
    assert_eq!(decoded.bytes, b"foo".to_vec());

    let decoded = data_url::decode("data:text/plain;charset=utf-8,caf%C3%A9").unwrap();
    assert_eq!(decoded.media_type, "text/plain;charset=utf-8");
    assert_eq!(decoded.bytes, "café".as_bytes().to_vec());
}

#[test]
fn test_payload_to_data_url() {
    let payload = ImagePayload::new(b"foo".to_vec(), "image/png");
    assert_eq!(payload.to_data_url(), "data:image/png;base64,Zm9v");
    assert_eq!(payload.len(), 3);
    assert!(!payload.is_empty());
}

#[test]
fn test_media_helpers() {
    assert_eq!(guess_from_extension("https://cdn.example.com/yacht.webp"), Some("image/webp"));
    assert_eq!(sniff(b"GIF89a......"), Some("image/gif"));
    assert_eq!(essence("image/png ;foo=bar"), "image/png");
}
