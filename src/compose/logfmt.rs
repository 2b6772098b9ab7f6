//! Decoder for logfmt lines as written by logrus.
//!
//! Compose logs through logrus, so some stderr lines look like
//! `time="2024-02-02T08:14:10+01:00" level=warning msg="..."`.
//! The decoder is a small character state machine.

use indexmap::IndexMap;
use std::iter::Peekable;
use std::str::Chars;
use thiserror::Error;

/// A line that is not valid logfmt.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Invalid logfmt: {0}")]
pub struct LogfmtError(String);

impl LogfmtError {
    fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// Decoded key/value pairs in line order. Keys without `=` map to `None`.
pub type LogfmtRecord = IndexMap<String, Option<String>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Garbage,
    Key,
    Equal,
    IdentValue,
    QuotedValue,
}

fn is_ident(c: char) -> bool {
    c > ' ' && c != '"' && c != '='
}

struct Decoder<'a> {
    chars: Peekable<Chars<'a>>,
    logrus_mode: bool,
    record: LogfmtRecord,
    key: String,
    value: String,
}

impl<'a> Decoder<'a> {
    fn new(line: &'a str, logrus_mode: bool) -> Self {
        Self {
            chars: line.chars().peekable(),
            logrus_mode,
            record: LogfmtRecord::new(),
            key: String::new(),
            value: String::new(),
        }
    }

    fn finish_pair(&mut self, has_value: bool) {
        let key = std::mem::take(&mut self.key);
        let value = std::mem::take(&mut self.value);
        self.record.insert(key, has_value.then_some(value));
    }

    fn step(&mut self, mode: Mode, cur: char) -> Result<Mode, LogfmtError> {
        let next = match mode {
            Mode::Garbage => {
                if is_ident(cur) {
                    // re-read the char as part of the key
                    return Ok(Mode::Key);
                }
                Mode::Garbage
            }
            Mode::Key => {
                if is_ident(cur) {
                    self.key.push(cur);
                    Mode::Key
                } else if cur == '=' {
                    Mode::Equal
                } else {
                    if self.logrus_mode {
                        return Err(LogfmtError::new(
                            "Key must always be followed by \"=\" in logrus mode",
                        ));
                    }
                    self.finish_pair(false);
                    Mode::Garbage
                }
            }
            Mode::Equal => {
                if is_ident(cur) {
                    self.value.push(cur);
                    Mode::IdentValue
                } else if cur == '"' {
                    Mode::QuotedValue
                } else {
                    self.finish_pair(true);
                    Mode::Garbage
                }
            }
            Mode::IdentValue => {
                if is_ident(cur) {
                    self.value.push(cur);
                    Mode::IdentValue
                } else {
                    self.finish_pair(true);
                    Mode::Garbage
                }
            }
            Mode::QuotedValue => match cur {
                '\\' => {
                    self.chars.next();
                    let escaped = self
                        .chars
                        .peek()
                        .copied()
                        .ok_or_else(|| LogfmtError::new("Unterminated escape sequence in quoted string"))?;
                    let decoded = match escaped {
                        '"' => '"',
                        '\\' => '\\',
                        '\'' => '\'',
                        '/' => '/',
                        'b' => '\u{8}',
                        'f' => '\u{c}',
                        'n' => '\n',
                        'r' => '\r',
                        't' => '\t',
                        'u' => {
                            self.chars.next();
                            self.unicode_escape()?
                        }
                        other => {
                            return Err(LogfmtError::new(format!(
                                "Unknown escape sequence \"\\{other}\""
                            )))
                        }
                    };
                    self.value.push(decoded);
                    if escaped == 'u' {
                        // unicode_escape already consumed its digits
                        return Ok(Mode::QuotedValue);
                    }
                    Mode::QuotedValue
                }
                '"' => {
                    self.finish_pair(true);
                    Mode::Garbage
                }
                c if c < ' ' => {
                    return Err(LogfmtError::new(
                        "Control characters in quoted string are not allowed",
                    ))
                }
                c => {
                    self.value.push(c);
                    Mode::QuotedValue
                }
            },
        };
        self.chars.next();
        Ok(next)
    }

    fn hex4(&mut self) -> Result<u32, LogfmtError> {
        let mut code = 0;
        for _ in 0..4 {
            let digit = self
                .chars
                .next()
                .ok_or_else(|| LogfmtError::new("Not enough space for unicode escape"))?;
            let value = digit
                .to_digit(16)
                .ok_or_else(|| LogfmtError::new(format!("Invalid unicode escape digit {digit:?}")))?;
            code = (code << 4) | value;
        }
        Ok(code)
    }

    /// Decodes the four hex digits following `\u`, combining UTF-16
    /// surrogate pairs written as two escapes.
    fn unicode_escape(&mut self) -> Result<char, LogfmtError> {
        let high = self.hex4()?;
        let code = if (0xD800..0xDC00).contains(&high) {
            if self.chars.next() != Some('\\') || self.chars.next() != Some('u') {
                return Err(LogfmtError::new("Unpaired surrogate in unicode escape"));
            }
            let low = self.hex4()?;
            if !(0xDC00..0xE000).contains(&low) {
                return Err(LogfmtError::new("Unpaired surrogate in unicode escape"));
            }
            0x10000 + ((high - 0xD800) << 10) + (low - 0xDC00)
        } else {
            high
        };
        char::from_u32(code)
            .ok_or_else(|| LogfmtError::new(format!("Invalid unicode code point {code:#x}")))
    }

    fn run(mut self) -> Result<LogfmtRecord, LogfmtError> {
        let mut mode = Mode::Garbage;
        while let Some(&cur) = self.chars.peek() {
            mode = self.step(mode, cur)?;
        }
        match mode {
            Mode::Key if self.logrus_mode => Err(LogfmtError::new(
                "Key must always be followed by \"=\" in logrus mode",
            )),
            Mode::Key => {
                self.finish_pair(false);
                Ok(self.record)
            }
            Mode::Equal | Mode::IdentValue => {
                self.finish_pair(true);
                Ok(self.record)
            }
            Mode::QuotedValue => Err(LogfmtError::new("Unterminated quoted string")),
            Mode::Garbage => Ok(self.record),
        }
    }
}

/// Decodes one logfmt line.
///
/// In `logrus_mode` every key must carry a value, which keeps ordinary
/// prose from being mistaken for a record.
pub fn parse_logfmt_line(line: &str, logrus_mode: bool) -> Result<LogfmtRecord, LogfmtError> {
    Decoder::new(line, logrus_mode).run()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn pairs(record: &LogfmtRecord) -> Vec<(&str, Option<&str>)> {
        record
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_deref()))
            .collect()
    }

    #[test]
    fn test_logrus_warning_line() {
        let record = parse_logfmt_line(
            r#"time="2024-02-02T08:14:10+01:00" level=warning msg="a network with name influxNetwork exists but was not created for project \"influxdb\".\nSet `external: true` to use an existing network""#,
            true,
        )
        .unwrap();
        assert_eq!(
            pairs(&record),
            vec![
                ("time", Some("2024-02-02T08:14:10+01:00")),
                ("level", Some("warning")),
                (
                    "msg",
                    Some("a network with name influxNetwork exists but was not created for project \"influxdb\".\nSet `external: true` to use an existing network")
                ),
            ]
        );
    }

    #[test]
    fn test_plain_mode_keys_without_value() {
        let record = parse_logfmt_line("foo bar=baz qux", false).unwrap();
        assert_eq!(
            pairs(&record),
            vec![("foo", None), ("bar", Some("baz")), ("qux", None)]
        );
    }

    #[test]
    fn test_empty_values() {
        let record = parse_logfmt_line(r#"a= b="" c"#, false).unwrap();
        assert_eq!(
            pairs(&record),
            vec![("a", Some("")), ("b", Some("")), ("c", None)]
        );
    }

    #[test]
    fn test_logrus_mode_rejects_prose() {
        assert!(parse_logfmt_line("Error response from daemon: boom", true).is_err());
        assert!(parse_logfmt_line("level=warning msg", true).is_err());
    }

    #[test]
    fn test_unicode_escapes() {
        let record = parse_logfmt_line(r#"msg="\u003e \u00e9 \ud83d\ude00""#, true).unwrap();
        assert_eq!(record["msg"].as_deref(), Some("> é 😀"));
    }

    #[test]
    fn test_invalid_quoted_values() {
        assert!(parse_logfmt_line(r#"msg="unterminated"#, true).is_err());
        assert!(parse_logfmt_line(r#"msg="bad \x escape""#, true).is_err());
        assert!(parse_logfmt_line(r#"msg="\u12"#, true).is_err());
        assert!(parse_logfmt_line(r#"msg="\ud83d alone""#, true).is_err());
        assert!(parse_logfmt_line("msg=\"tab\tinside\"", true).is_err());
        assert!(parse_logfmt_line(r#"msg="trailing \"#, true).is_err());
    }
}
