//! Text encodings and decode-error policies for the `string` converter.
//!
//! Both settings inherit from the nearest ancestor schema node; the root
//! defaults are utf-8 and strict.

use crate::errors::{ConvertError, ConvertResult, SchemaError, SchemaResult};

/// Byte encodings the `string` converter can decode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    Utf8,
    Ascii,
    Latin1,
}

/// What to do with undecodable bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DecodePolicy {
    /// Fail on the first bad byte
    #[default]
    Strict,
    /// Drop bad bytes
    Ignore,
    /// Substitute U+FFFD for bad bytes
    Replace,
}

impl Encoding {
    /// Resolve an encoding by name, case-insensitive.
    pub fn parse(name: &str) -> SchemaResult<Encoding> {
        match name.to_ascii_lowercase().replace('_', "-").as_str() {
            "utf-8" | "utf8" => Ok(Encoding::Utf8),
            "ascii" | "us-ascii" => Ok(Encoding::Ascii),
            "latin-1" | "latin1" | "iso-8859-1" => Ok(Encoding::Latin1),
            _ => Err(SchemaError::UnsupportedEncoding(name.to_string())),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Encoding::Utf8 => "utf-8",
            Encoding::Ascii => "ascii",
            Encoding::Latin1 => "latin-1",
        }
    }

    /// Decode `bytes` under `policy`.
    pub fn decode(&self, bytes: &[u8], policy: DecodePolicy) -> ConvertResult<String> {
        match self {
            Encoding::Utf8 => decode_utf8(bytes, policy),
            Encoding::Ascii => decode_ascii(bytes, policy),
            // every byte maps directly to the code point of the same value
            Encoding::Latin1 => Ok(bytes.iter().map(|&b| b as char).collect()),
        }
    }
}

impl DecodePolicy {
    /// Resolve a policy by name.
    pub fn parse(name: &str) -> SchemaResult<DecodePolicy> {
        match name {
            "strict" => Ok(DecodePolicy::Strict),
            "ignore" => Ok(DecodePolicy::Ignore),
            "replace" => Ok(DecodePolicy::Replace),
            _ => Err(SchemaError::Malformed(format!(
                "unknown decode error policy '{}'",
                name
            ))),
        }
    }
}

fn decode_utf8(bytes: &[u8], policy: DecodePolicy) -> ConvertResult<String> {
    match std::str::from_utf8(bytes) {
        Ok(s) => Ok(s.to_string()),
        Err(err) => match policy {
            DecodePolicy::Strict => Err(ConvertError::Decode {
                encoding: "utf-8",
                offset: err.valid_up_to(),
            }),
            DecodePolicy::Replace => Ok(String::from_utf8_lossy(bytes).into_owned()),
            DecodePolicy::Ignore => {
                let mut out = String::with_capacity(bytes.len());
                let mut rest = bytes;
                loop {
                    match std::str::from_utf8(rest) {
                        Ok(s) => {
                            out.push_str(s);
                            break;
                        }
                        Err(e) => {
                            let (valid, tail) = rest.split_at(e.valid_up_to());
                            if let Ok(s) = std::str::from_utf8(valid) {
                                out.push_str(s);
                            }
                            match e.error_len() {
                                Some(n) => rest = &tail[n..],
                                // truncated sequence at the end of input
                                None => break,
                            }
                        }
                    }
                }
                Ok(out)
            }
        },
    }
}

fn decode_ascii(bytes: &[u8], policy: DecodePolicy) -> ConvertResult<String> {
    let mut out = String::with_capacity(bytes.len());
    for (offset, &b) in bytes.iter().enumerate() {
        if b.is_ascii() {
            out.push(b as char);
        } else {
            match policy {
                DecodePolicy::Strict => {
                    return Err(ConvertError::Decode {
                        encoding: "ascii",
                        offset,
                    })
                }
                DecodePolicy::Ignore => {}
                DecodePolicy::Replace => out.push('\u{FFFD}'),
            }
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_encoding_names() {
        assert_eq!(Encoding::parse("utf-8").unwrap(), Encoding::Utf8);
        assert_eq!(Encoding::parse("UTF8").unwrap(), Encoding::Utf8);
        assert_eq!(Encoding::parse("latin_1").unwrap(), Encoding::Latin1);
        assert!(Encoding::parse("ebcdic").is_err());
    }

    #[test]
    fn test_utf8_strict() {
        let ok = Encoding::Utf8.decode("héllo".as_bytes(), DecodePolicy::Strict);
        assert_eq!(ok.unwrap(), "héllo");

        let bad = Encoding::Utf8.decode(&[0x68, 0xff, 0x69], DecodePolicy::Strict);
        assert!(matches!(
            bad,
            Err(ConvertError::Decode {
                encoding: "utf-8",
                offset: 1
            })
        ));
    }

    #[test]
    fn test_utf8_replace_and_ignore() {
        let bytes = [0x68, 0xff, 0x69];
        assert_eq!(
            Encoding::Utf8.decode(&bytes, DecodePolicy::Replace).unwrap(),
            "h\u{FFFD}i"
        );
        assert_eq!(
            Encoding::Utf8.decode(&bytes, DecodePolicy::Ignore).unwrap(),
            "hi"
        );
    }

    #[test]
    fn test_utf8_ignore_truncated_tail() {
        // 0xc3 starts a two-byte sequence that never completes
        let bytes = [0x68, 0xc3];
        assert_eq!(
            Encoding::Utf8.decode(&bytes, DecodePolicy::Ignore).unwrap(),
            "h"
        );
    }

    #[test]
    fn test_ascii_policies() {
        let bytes = [b'a', 0x80, b'b'];
        assert!(Encoding::Ascii.decode(&bytes, DecodePolicy::Strict).is_err());
        assert_eq!(
            Encoding::Ascii.decode(&bytes, DecodePolicy::Ignore).unwrap(),
            "ab"
        );
        assert_eq!(
            Encoding::Ascii
                .decode(&bytes, DecodePolicy::Replace)
                .unwrap(),
            "a\u{FFFD}b"
        );
    }

    #[test]
    fn test_latin1_total() {
        assert_eq!(
            Encoding::Latin1
                .decode(&[0x68, 0xe9], DecodePolicy::Strict)
                .unwrap(),
            "hé"
        );
    }
}
