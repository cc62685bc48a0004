//! Bus access traces.
//!
//! A trace is a line-oriented text file:
//!
//! ```text
//! # comment
//! w 0x40000000 0x4F        store 32-bit value
//! r 0x40000004             load, value discarded
//! p 0x40000000 OK\n        store each byte of the text, with \n \r \t \\ \0 \xHH escapes
//! ```
//!
//! Numbers are decimal or `0x`-prefixed hexadecimal; `_` separators are allowed.

use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
#[error("line {line}: {message}")]
pub struct TraceError {
    pub line: usize,
    pub message: String,
}

/// One bus access.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "op", rename_all = "lowercase")]
pub enum Access {
    Read { addr: u32 },
    Write { addr: u32, value: u32 },
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BusTrace {
    accesses: Vec<Access>,
}

impl BusTrace {
    pub fn parse(text: &str) -> Result<Self, TraceError> {
        let mut accesses = Vec::new();
        for (index, raw) in text.lines().enumerate() {
            let line = index + 1;
            let err = |message: String| TraceError { line, message };

            let trimmed = raw.trim_start();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }
            let (op, rest) = split_word(trimmed);
            match op {
                "w" => {
                    let (addr, rest) = split_word(rest);
                    let (value, rest) = split_word(rest);
                    if !rest.trim().is_empty() {
                        return Err(err(format!("unexpected trailing input '{}'", rest.trim())));
                    }
                    accesses.push(Access::Write {
                        addr: parse_number(addr).map_err(err)?,
                        value: parse_number(value).map_err(err)?,
                    });
                }
                "r" => {
                    let (addr, rest) = split_word(rest);
                    if !rest.trim().is_empty() {
                        return Err(err(format!("unexpected trailing input '{}'", rest.trim())));
                    }
                    accesses.push(Access::Read {
                        addr: parse_number(addr).map_err(err)?,
                    });
                }
                "p" => {
                    let (addr, text) = split_word(rest);
                    let addr = parse_number(addr).map_err(err)?;
                    for byte in unescape(text).map_err(err)? {
                        accesses.push(Access::Write {
                            addr,
                            value: u32::from(byte),
                        });
                    }
                }
                other => return Err(err(format!("unknown operation '{other}'"))),
            }
        }
        Ok(Self { accesses })
    }

    /// A trace that stores each byte of `bytes` at `addr`.
    pub fn from_bytes(addr: u32, bytes: &[u8]) -> Self {
        Self {
            accesses: bytes
                .iter()
                .map(|b| Access::Write {
                    addr,
                    value: u32::from(*b),
                })
                .collect(),
        }
    }

    pub fn accesses(&self) -> &[Access] {
        &self.accesses
    }

    pub fn len(&self) -> usize {
        self.accesses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accesses.is_empty()
    }
}

/// Split off the first space-delimited word. The remainder keeps everything
/// after exactly one separator, so `p` text may start with spaces.
fn split_word(s: &str) -> (&str, &str) {
    let s = s.trim_start();
    match s.char_indices().find(|(_, c)| c.is_whitespace()) {
        Some((i, sep)) => (&s[..i], &s[i + sep.len_utf8()..]),
        None => (s, ""),
    }
}

fn parse_number(token: &str) -> Result<u32, String> {
    if token.is_empty() {
        return Err("missing number".into());
    }
    let clean = token.replace('_', "");
    let parsed = match clean.strip_prefix("0x").or_else(|| clean.strip_prefix("0X")) {
        Some(hex) => u32::from_str_radix(hex, 16),
        None => clean.parse(),
    };
    parsed.map_err(|e| format!("invalid number '{token}': {e}"))
}

fn unescape(text: &str) -> Result<Vec<u8>, String> {
    let mut out = Vec::with_capacity(text.len());
    let mut bytes = text.bytes();
    while let Some(b) = bytes.next() {
        if b != b'\\' {
            out.push(b);
            continue;
        }
        match bytes.next() {
            Some(b'n') => out.push(b'\n'),
            Some(b'r') => out.push(b'\r'),
            Some(b't') => out.push(b'\t'),
            Some(b'0') => out.push(0),
            Some(b'\\') => out.push(b'\\'),
            Some(b'x') => {
                let hi = bytes.next();
                let lo = bytes.next();
                let digits = match (hi, lo) {
                    (Some(h), Some(l)) => [h, l],
                    _ => return Err("truncated \\x escape".into()),
                };
                let hex = std::str::from_utf8(&digits).map_err(|e| e.to_string())?;
                let value = u8::from_str_radix(hex, 16)
                    .map_err(|_| format!("invalid \\x escape '{hex}'"))?;
                out.push(value);
            }
            Some(other) => return Err(format!("unknown escape '\\{}'", char::from(other))),
            None => return Err("dangling backslash".into()),
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_all_operations() {
        let trace = BusTrace::parse(
            "# boot\n\
             w 0x40000000 0x4F\n\
             r 1_073_741_828\n\
             \n\
             p 0x40000000 K\\n\n",
        )
        .unwrap();
        assert_eq!(
            trace.accesses(),
            [
                Access::Write { addr: 0x4000_0000, value: 0x4F },
                Access::Read { addr: 0x4000_0004 },
                Access::Write { addr: 0x4000_0000, value: u32::from(b'K') },
                Access::Write { addr: 0x4000_0000, value: u32::from(b'\n') },
            ]
        );
    }

    #[test]
    fn print_keeps_inner_spaces_and_escapes() {
        let trace = BusTrace::parse("p 0x10   a b\\t\\x41\\\\\n").unwrap();
        let bytes: Vec<u8> = trace
            .accesses()
            .iter()
            .map(|a| match a {
                Access::Write { value, .. } => *value as u8,
                Access::Read { .. } => panic!("unexpected read"),
            })
            .collect();
        assert_eq!(bytes, b"  a b\tA\\");
    }

    #[test]
    fn errors_carry_line_numbers() {
        let err = BusTrace::parse("w 0x0 1\nx 0x0\n").unwrap_err();
        assert_eq!(err.line, 2);
        assert!(err.message.contains("unknown operation"));

        let err = BusTrace::parse("\n\nw 0xZZ 1\n").unwrap_err();
        assert_eq!(err.line, 3);

        assert!(BusTrace::parse("w 0x0\n").is_err());
        assert!(BusTrace::parse("r 0x0 0x1\n").is_err());
        assert!(BusTrace::parse("p 0x0 bad\\q\n").is_err());
        assert!(BusTrace::parse("p 0x0 \\x4\n").is_err());
        assert!(BusTrace::parse("w 0x100000000 0\n").is_err());
    }

    #[test]
    fn wide_whitespace_separates_words() {
        let trace = BusTrace::parse("w\u{a0}0x40000000\u{3000}1\n").unwrap();
        assert_eq!(
            trace.accesses(),
            [Access::Write { addr: 0x4000_0000, value: 1 }]
        );

        let err = BusTrace::parse("r 0x0\nw\u{a0}0x0\u{a0}\n").unwrap_err();
        assert_eq!(err.line, 2);
    }

    #[test]
    fn from_bytes_writes_each_byte() {
        let trace = BusTrace::from_bytes(0x4000_0000, b"hi");
        assert_eq!(trace.len(), 2);
        assert_eq!(
            trace.accesses()[1],
            Access::Write { addr: 0x4000_0000, value: u32::from(b'i') }
        );
        assert!(BusTrace::from_bytes(0, b"").is_empty());
    }
}
