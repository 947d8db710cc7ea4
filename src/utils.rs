use std::num::IntErrorKind;

use crate::error::TokenError;

/// Parse one dump token as a byte, with the same notation Python's
/// `int(token, 16)` accepts.
///
/// Surrounding whitespace (a stray `\r` from CRLF input) is ignored. A sign,
/// a `0x`/`0X` prefix, and single underscores between digits (or right after
/// the prefix) are allowed. Only ASCII hex digits count as digits. Negative
/// values other than zero, and anything above `ff`, are out of byte range.
pub fn parse_hex_token(token: &str) -> Result<u8, TokenError> {
    let token = token.trim();
    let (negative, unsigned) = match token.as_bytes().first() {
        Some(b'-') => (true, &token[1..]),
        Some(b'+') => (false, &token[1..]),
        _ => (false, token),
    };
    let digits = match unsigned
        .strip_prefix("0x")
        .or_else(|| unsigned.strip_prefix("0X"))
    {
        Some(rest) => rest.strip_prefix('_').unwrap_or(rest),
        None => unsigned,
    };
    let well_formed = !digits.is_empty()
        && digits.bytes().all(|b| b.is_ascii_hexdigit() || b == b'_')
        && !digits.starts_with('_')
        && !digits.ends_with('_')
        && !digits.contains("__");
    if !well_formed {
        return Err(TokenError::Malformed);
    }

    let digits = digits.replace('_', "");
    let value = u8::from_str_radix(&digits, 16).map_err(|err| match err.kind() {
        IntErrorKind::PosOverflow => TokenError::Overflow,
        _ => TokenError::Malformed,
    })?;
    if negative && value != 0 {
        return Err(TokenError::Overflow);
    }
    Ok(value)
}

pub fn bin_to_hex_tokens(bytes: &[u8], upper: bool) -> Vec<String> {
    bytes
        .iter()
        .map(|b| if upper { hex::encode_upper([*b]) } else { hex::encode([*b]) })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hex_token() {
        assert_eq!(parse_hex_token("1f"), Ok(0x1f));
        assert_eq!(parse_hex_token("FF"), Ok(0xff));
        assert_eq!(parse_hex_token("a"), Ok(0x0a));
        assert_eq!(parse_hex_token("0x7E"), Ok(0x7e));
        assert_eq!(parse_hex_token("000ff"), Ok(0xff));
        assert_eq!(parse_hex_token("2a\r"), Ok(0x2a));
    }

    #[test]
    fn test_parse_hex_token_python_notation() {
        assert_eq!(parse_hex_token("+1f"), Ok(0x1f));
        assert_eq!(parse_hex_token("-0"), Ok(0));
        assert_eq!(parse_hex_token("-00"), Ok(0));
        assert_eq!(parse_hex_token("f_f"), Ok(0xff));
        assert_eq!(parse_hex_token("0x_1f"), Ok(0x1f));
        assert_eq!(parse_hex_token("+0X7_e"), Ok(0x7e));
    }

    #[test]
    fn test_parse_hex_token_rejects() {
        assert_eq!(parse_hex_token("zz"), Err(TokenError::Malformed));
        assert_eq!(parse_hex_token(""), Err(TokenError::Malformed));
        assert_eq!(parse_hex_token("0x"), Err(TokenError::Malformed));
        assert_eq!(parse_hex_token("0x_"), Err(TokenError::Malformed));
        assert_eq!(parse_hex_token("_1f"), Err(TokenError::Malformed));
        assert_eq!(parse_hex_token("1f_"), Err(TokenError::Malformed));
        assert_eq!(parse_hex_token("f__f"), Err(TokenError::Malformed));
        assert_eq!(parse_hex_token("+-1"), Err(TokenError::Malformed));
        assert_eq!(parse_hex_token("0x0x1"), Err(TokenError::Malformed));
        assert_eq!(parse_hex_token("-1"), Err(TokenError::Overflow));
        assert_eq!(parse_hex_token("-0x1f"), Err(TokenError::Overflow));
        assert_eq!(parse_hex_token("100"), Err(TokenError::Overflow));
        assert_eq!(parse_hex_token("ffffffffffffffffffff"), Err(TokenError::Overflow));
    }

    #[test]
    fn test_bin_to_hex_tokens() {
        assert_eq!(bin_to_hex_tokens(&[0x0a, 0xff], false), vec!["0a", "ff"]);
        assert_eq!(bin_to_hex_tokens(&[0x0a, 0xff], true), vec!["0A", "FF"]);
    }
}
