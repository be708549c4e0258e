use base64::Engine;
use base64::engine::general_purpose::STANDARD;

/// 将图片字节编码为 data URI，与前端 FileReader.readAsDataURL 的输出一致
pub fn encode_image(bytes: &[u8], mime_type: &str) -> String {
    format!("data:{};base64,{}", mime_type, STANDARD.encode(bytes))
}

/// 校验二维码地址：允许 http(s) URL 或 base64 图片 data URI
pub fn is_valid_image_url(value: &str) -> bool {
    if value.starts_with("http://") || value.starts_with("https://") {
        return true;
    }

    let Some(rest) = value.strip_prefix("data:image/") else {
        return false;
    };
    let Some((_, payload)) = rest.split_once(";base64,") else {
        return false;
    };

    !payload.is_empty() && STANDARD.decode(payload).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_image_roundtrip() {
        let uri = encode_image(&[0x89, 0x50, 0x4e, 0x47], "image/png");
        assert!(uri.starts_with("data:image/png;base64,"));
        assert!(is_valid_image_url(&uri));
    }

    #[test]
    fn test_plain_urls_accepted() {
        assert!(is_valid_image_url("https://example.com/qr.png"));
        assert!(is_valid_image_url("http://example.com/qr.png"));
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(!is_valid_image_url(""));
        assert!(!is_valid_image_url("ftp://example.com/qr.png"));
        assert!(!is_valid_image_url("data:image/png;base64,"));
        assert!(!is_valid_image_url("data:image/png;base64,!!not-base64!!"));
        assert!(!is_valid_image_url("data:text/plain;base64,aGVsbG8="));
    }
}
