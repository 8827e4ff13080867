use super::*;

#[test]
fn parses_mime_and_base64_flag() {
    let u = DataUrl::parse("data:image/PNG;base64,AAEC").unwrap();
    assert_eq!(u.mime.as_deref(), Some("image/png"));
    assert!(u.is_base64);
    assert_eq!(u.data, "AAEC");
    assert_eq!(u.decode().unwrap(), vec![0u8, 1, 2]);
    assert_eq!(u.extension().as_deref(), Some("png"));
}

#[test]
fn plain_text_data_urls_are_percent_decoded() {
    let u = DataUrl::parse("data:text/plain,hello%20world").unwrap();
    assert!(!u.is_base64);
    assert_eq!(u.decode().unwrap(), b"hello world");
}

#[test]
fn bare_base64_and_missing_padding_decode() {
    assert_eq!(decode_base64("aGk=").unwrap(), b"hi");
    assert_eq!(decode_base64("aGk").unwrap(), b"hi");
    assert_eq!(decode_base64("aG\nk=").unwrap(), b"hi");
}

#[test]
fn garbage_is_a_validation_error() {
    let err = decode_base64("data:image/png;base64,***").unwrap_err();
    assert!(err.is_validation());
}

#[test]
fn encode_then_parse_keeps_mime() {
    let url = encode_data_url(b"abc", "audio/wav");
    assert!(is_data_url(&url));
    assert_eq!(extension_from_data_url(&url).as_deref(), Some("wav"));
    assert_eq!(decode_base64(&url).unwrap(), b"abc");
}

#[test]
fn non_data_urls_are_rejected_by_parse() {
    assert!(DataUrl::parse("https://x/y.png").is_none());
    assert!(DataUrl::parse("data:nocomma").is_none());
}
