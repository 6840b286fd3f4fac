use std::io::Read;
use std::ops::RangeInclusive;

const DIGIT: RangeInclusive<u8> = b'0'..=b'9';
const OCTAL_DIGIT: RangeInclusive<u8> = b'0'..=b'7';
const HEX_LOWERCASE: RangeInclusive<u8> = b'a'..=b'f';
const HEX_UPPERCASE: RangeInclusive<u8> = b'A'..=b'F';

pub fn is_digit(c: u8) -> bool {
    DIGIT.contains(&c)
}

pub fn is_hex_digit(c: u8) -> bool {
    is_digit(c) || HEX_LOWERCASE.contains(&c) || HEX_UPPERCASE.contains(&c)
}

pub fn is_binary_digit(c: u8) -> bool {
    c == b'0' || c == b'1'
}

pub fn is_octal_digit(c: u8) -> bool {
    OCTAL_DIGIT.contains(&c)
}

/// Checks if `c` may start an identifier. Non-ASCII identifiers are not supported.
pub fn is_identifier_start(c: u8) -> bool {
    c.is_ascii_alphabetic() || c == b'_' || c == b'$'
}

/// Checks if `c` may continue an identifier
pub fn is_identifier_part(c: u8) -> bool {
    is_identifier_start(c) || is_digit(c)
}

/// Decodes the UTF-8 character at the start of `bytes`, returning it with its encoded length.
pub fn next_char_in_bytes(bytes: &[u8]) -> (char, usize) {
    let len = match bytes.first() {
        Some(b) if *b < 0x80 => 1,
        Some(b) if *b >> 5 == 0b110 => 2,
        Some(b) if *b >> 4 == 0b1110 => 3,
        _ => 4,
    };
    let len = len.min(bytes.len());
    match std::str::from_utf8(&bytes[..len]).ok().and_then(|s| s.chars().next()) {
        Some(c) => (c, len),
        None => (char::REPLACEMENT_CHARACTER, len.max(1)),
    }
}

/// Formats a number the way `Number.prototype.toString` does for radix 10.
pub fn format_f64(n: f64) -> String {
    if n.is_nan() {
        return "NaN".into();
    }
    if n.is_infinite() {
        return if n > 0.0 { "Infinity".into() } else { "-Infinity".into() };
    }
    if n == 0.0 {
        return "0".into();
    }

    let abs = n.abs();
    if (1e-6..1e21).contains(&abs) {
        // Display prints the shortest representation that round trips
        return format!("{n}");
    }

    // exponent form: 1e+21, 1.5e-7
    let formatted = format!("{n:e}");
    match formatted.split_once('e') {
        Some((mantissa, exp)) if !exp.starts_with('-') => format!("{mantissa}e+{exp}"),
        _ => formatted,
    }
}

/// Reads the little endian operands of a bytecode buffer
pub struct Reader<R: Read>(R, usize);

impl<R: Read> Reader<R> {
    pub fn new(r: R) -> Self {
        Self(r, 0)
    }

    /// Number of bytes read so far
    pub fn offset(&self) -> usize {
        self.1
    }

    pub fn read_bytes<const N: usize>(&mut self) -> Option<[u8; N]> {
        let mut buf = [0; N];
        self.0.read_exact(&mut buf).ok()?;
        self.1 += N;
        Some(buf)
    }

    pub fn read(&mut self) -> Option<u8> {
        self.read_bytes::<1>().map(|[b]| b)
    }

    pub fn read_u16_le(&mut self) -> Option<u16> {
        self.read_bytes().map(u16::from_le_bytes)
    }

    pub fn read_i16_le(&mut self) -> Option<i16> {
        self.read_bytes().map(i16::from_le_bytes)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn number_formatting() {
        assert_eq!(format_f64(1.0), "1");
        assert_eq!(format_f64(-0.0), "0");
        assert_eq!(format_f64(0.5), "0.5");
        assert_eq!(format_f64(123456.0), "123456");
        assert_eq!(format_f64(f64::NAN), "NaN");
        assert_eq!(format_f64(f64::NEG_INFINITY), "-Infinity");
        assert_eq!(format_f64(1e21), "1e+21");
        assert_eq!(format_f64(1.5e-8), "1.5e-8");
    }

    #[test]
    fn utf8_decoding() {
        assert_eq!(next_char_in_bytes("ä!".as_bytes()), ('ä', 2));
        assert_eq!(next_char_in_bytes(b"a"), ('a', 1));
    }
}
