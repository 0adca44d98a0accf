//! # Hex Text and Fixed-Width Padding
//!
//! Identifiers are exchanged as text in `0x`-prefixed lowercase hex. Values
//! coming from wallets and contract reads are frequently shorter than their
//! field (`0x0`, `0x1`, a recipient with leading zero bytes stripped), so
//! every fixed-width field is left-padded with zero bytes before it is
//! encoded or hashed.

use crate::error::HexError;

/// Render bytes as `0x`-prefixed lowercase hex.
pub fn encode_prefixed(bytes: &[u8]) -> String {
    let body: String = bytes.iter().map(|b| format!("{b:02x}")).collect();
    format!("0x{body}")
}

/// Parse hex text into bytes.
///
/// Accepts an optional `0x`/`0X` prefix and an odd number of digits (the
/// missing high nibble is zero, so `0x1` decodes to `[0x01]`). `0x` alone
/// decodes to the empty vector.
pub fn decode(text: &str) -> Result<Vec<u8>, HexError> {
    let trimmed = text.trim();
    let body = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);

    let mut nibbles = Vec::with_capacity(body.len() + 1);
    if body.len() % 2 == 1 {
        nibbles.push(0u8);
    }
    for (position, c) in body.chars().enumerate() {
        let n = c
            .to_digit(16)
            .ok_or(HexError::InvalidCharacter { found: c, position })?;
        nibbles.push(n as u8);
    }

    Ok(nibbles.chunks(2).map(|pair| (pair[0] << 4) | pair[1]).collect())
}

/// Left-pad `bytes` with zeros to exactly `N` bytes.
///
/// Fails with [`HexError::TooLong`] if the input is wider than `N`.
pub fn pad_left<const N: usize>(bytes: &[u8]) -> Result<[u8; N], HexError> {
    if bytes.len() > N {
        return Err(HexError::TooLong {
            max: N,
            found: bytes.len(),
        });
    }
    let mut out = [0u8; N];
    out[N - bytes.len()..].copy_from_slice(bytes);
    Ok(out)
}

/// Parse hex text and left-pad it to `N` bytes.
pub fn decode_padded<const N: usize>(text: &str) -> Result<[u8; N], HexError> {
    pad_left::<N>(&decode(text)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_prefixed() {
        assert_eq!(encode_prefixed(&[0x00, 0xab, 0x10]), "0x00ab10");
        assert_eq!(encode_prefixed(&[]), "0x");
    }

    #[test]
    fn test_decode_with_and_without_prefix() {
        assert_eq!(decode("0xdeadBEEF").unwrap(), vec![0xde, 0xad, 0xbe, 0xef]);
        assert_eq!(decode("deadbeef").unwrap(), vec![0xde, 0xad, 0xbe, 0xef]);
        assert_eq!(decode("0X01").unwrap(), vec![0x01]);
    }

    #[test]
    fn test_decode_odd_length() {
        assert_eq!(decode("0x0").unwrap(), vec![0x00]);
        assert_eq!(decode("0x123").unwrap(), vec![0x01, 0x23]);
    }

    #[test]
    fn test_decode_empty() {
        assert!(decode("0x").unwrap().is_empty());
        assert!(decode("").unwrap().is_empty());
    }

    #[test]
    fn test_decode_rejects_non_hex() {
        let err = decode("0x12zz").unwrap_err();
        assert_eq!(
            err,
            HexError::InvalidCharacter {
                found: 'z',
                position: 2
            }
        );
    }

    #[test]
    fn test_pad_left() {
        let padded: [u8; 4] = pad_left(&[0xaa, 0xbb]).unwrap();
        assert_eq!(padded, [0x00, 0x00, 0xaa, 0xbb]);
        let exact: [u8; 2] = pad_left(&[0x01, 0x02]).unwrap();
        assert_eq!(exact, [0x01, 0x02]);
    }

    #[test]
    fn test_pad_left_too_long() {
        let err = pad_left::<2>(&[1, 2, 3]).unwrap_err();
        assert_eq!(err, HexError::TooLong { max: 2, found: 3 });
    }

    #[test]
    fn test_decode_padded_short_value() {
        let v: [u8; 32] = decode_padded("0x1").unwrap();
        assert_eq!(v[31], 0x01);
        assert!(v[..31].iter().all(|b| *b == 0));
    }
}
