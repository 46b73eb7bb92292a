// src/upload/token.rs
//! 上传令牌：时间戳加密钥哈希签名，单次使用。
//!
//! 形如 "1722840000:9f2a..."，服务端在新鲜度窗口内重算并恒定时间比较。

use hmac::{Hmac, Mac};
use sha2::Sha256;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

/// Clock skew tolerated for timestamps from the future.
const MAX_FUTURE_SKEW_SECS: i64 = 30;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenError {
    #[error("malformed token")]
    Malformed,
    #[error("token outside freshness window")]
    Stale,
    #[error("signature mismatch")]
    Mismatch,
}

fn mac(secret: &str) -> HmacSha256 {
    // HMAC accepts keys of any length.
    HmacSha256::new_from_slice(secret.as_bytes()).expect("hmac key")
}

/// Hex signature over the decimal timestamp.
pub fn sign(secret: &str, timestamp: i64) -> String {
    let mut m = mac(secret);
    m.update(timestamp.to_string().as_bytes());
    hex_encode(&m.finalize().into_bytes())
}

/// Full bearer token value, "timestamp:signature".
pub fn issue(secret: &str, timestamp: i64) -> String {
    format!("{}:{}", timestamp, sign(secret, timestamp))
}

/// Verify a bearer token against the shared secret. The signature compare is
/// constant time.
pub fn verify(secret: &str, token: &str, now: i64, max_age_secs: i64) -> Result<(), TokenError> {
    let (ts, sig_hex) = token.split_once(':').ok_or(TokenError::Malformed)?;
    let ts: i64 = ts.parse().map_err(|_| TokenError::Malformed)?;

    if ts > now + MAX_FUTURE_SKEW_SECS || now - ts > max_age_secs {
        return Err(TokenError::Stale);
    }

    let sig = hex_decode(sig_hex).ok_or(TokenError::Malformed)?;
    let mut m = mac(secret);
    m.update(ts.to_string().as_bytes());
    m.verify_slice(&sig).map_err(|_| TokenError::Mismatch)
}

fn hex_encode(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        out.push_str(&format!("{b:02x}"));
    }
    out
}

fn hex_decode(s: &str) -> Option<Vec<u8>> {
    if s.len() % 2 != 0 || s.is_empty() {
        return None;
    }
    let bytes = s.as_bytes();
    let mut out = Vec::with_capacity(s.len() / 2);
    for pair in bytes.chunks(2) {
        let hi = (pair[0] as char).to_digit(16)?;
        let lo = (pair[1] as char).to_digit(16)?;
        out.push(((hi << 4) | lo) as u8);
    }
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "super-secret";

    #[test]
    fn fresh_token_verifies() {
        let now = 1_722_840_000;
        let token = issue(SECRET, now);
        assert_eq!(verify(SECRET, &token, now + 10, 300), Ok(()));
    }

    #[test]
    fn single_bit_flip_is_rejected() {
        let now = 1_722_840_000;
        let token = issue(SECRET, now);
        // Flip one bit of the first signature nibble.
        let (head, sig) = token.split_once(':').unwrap();
        let first = sig.as_bytes()[0] as char;
        let flipped = char::from_digit(first.to_digit(16).unwrap() ^ 1, 16).unwrap();
        let mut tampered = String::from(head);
        tampered.push(':');
        tampered.push(flipped);
        tampered.push_str(&sig[1..]);
        assert_eq!(verify(SECRET, &tampered, now, 300), Err(TokenError::Mismatch));
    }

    #[test]
    fn expired_timestamp_is_rejected() {
        let now = 1_722_840_000;
        let token = issue(SECRET, now);
        assert_eq!(verify(SECRET, &token, now + 301, 300), Err(TokenError::Stale));
    }

    #[test]
    fn far_future_timestamp_is_rejected() {
        let now = 1_722_840_000;
        let token = issue(SECRET, now + 3600);
        assert_eq!(verify(SECRET, &token, now, 300), Err(TokenError::Stale));
    }

    #[test]
    fn malformed_tokens_are_rejected() {
        let now = 1_722_840_000;
        for bad in ["", "no-colon", "123", "abc:def:ghi", "xyz:00", "123:zz", "123:0"] {
            let out = verify(SECRET, bad, now, 300);
            assert!(matches!(out, Err(TokenError::Malformed) | Err(TokenError::Stale)), "{bad}");
        }
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let now = 1_722_840_000;
        let token = issue(SECRET, now);
        assert_eq!(verify("other", &token, now, 300), Err(TokenError::Mismatch));
    }

    #[test]
    fn hex_round_trip() {
        let data = [0u8, 1, 0xab, 0xff];
        assert_eq!(hex_decode(&hex_encode(&data)).unwrap(), data);
        assert!(hex_decode("0g").is_none());
        assert!(hex_decode("abc").is_none());
    }
}
