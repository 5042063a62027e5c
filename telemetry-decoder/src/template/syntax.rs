//! Template syntax
//!
//! A template is literal text with `{name:type}` placeholders, for example
//! `"{value:f} V"` or `"$GPZDA,{time},{day:d},{month:d},{year:d}"`.
//!
//! - `{name}` captures any non-empty text
//! - `{name:type}` captures a typed value (see [`CaptureKind`])
//! - `{:type}` must match but is not reported
//! - `{{` and `}}` are literal braces

use crate::types::{epoch_seconds, parse_iso8601, ConfigError, DecoderError, FieldValue, Result};
use std::collections::HashSet;
use std::fmt;

/// Type annotation of a capture placeholder
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureKind {
    /// No annotation: any non-empty text, matched lazily
    Text,
    /// `d`: signed decimal integer
    Integer,
    /// `x`: hexadecimal integer, optional `0x` prefix
    Hex,
    /// `f`: fixed-point number with a decimal point
    Fixed,
    /// `g`: general number (integer, fixed, exponent, nan, inf)
    Number,
    /// `w`: word characters
    Word,
    /// `l`: letters
    Letters,
    /// `S`: non-whitespace characters
    NonSpace,
    /// `ti`: ISO-8601 timestamp
    Timestamp,
}

impl CaptureKind {
    /// Look up a kind by its type code
    pub fn from_code(code: &str) -> Option<Self> {
        let kind = match code {
            "" => CaptureKind::Text,
            "d" => CaptureKind::Integer,
            "x" => CaptureKind::Hex,
            "f" => CaptureKind::Fixed,
            "g" => CaptureKind::Number,
            "w" => CaptureKind::Word,
            "l" => CaptureKind::Letters,
            "S" => CaptureKind::NonSpace,
            "ti" => CaptureKind::Timestamp,
            _ => return None,
        };
        Some(kind)
    }

    /// Type code as written in a template
    pub fn code(&self) -> &'static str {
        match self {
            CaptureKind::Text => "",
            CaptureKind::Integer => "d",
            CaptureKind::Hex => "x",
            CaptureKind::Fixed => "f",
            CaptureKind::Number => "g",
            CaptureKind::Word => "w",
            CaptureKind::Letters => "l",
            CaptureKind::NonSpace => "S",
            CaptureKind::Timestamp => "ti",
        }
    }

    /// Regular expression for this kind
    ///
    /// Must not contain capturing groups: matchers number their groups by
    /// placeholder position. Digits are ASCII only so that every structural
    /// match converts.
    pub(crate) fn pattern(&self) -> &'static str {
        match self {
            CaptureKind::Text => r".+?",
            CaptureKind::Integer => r"[-+]?[0-9]+",
            CaptureKind::Hex => r"(?:0[xX])?[0-9a-fA-F]+",
            CaptureKind::Fixed => r"[-+]?(?:[0-9]+\.[0-9]*|\.[0-9]+)",
            CaptureKind::Number => {
                r"[-+]?(?:(?:[0-9]+\.?[0-9]*|\.[0-9]+)(?:[eE][-+]?[0-9]+)?|(?i:nan|inf(?:inity)?))"
            }
            CaptureKind::Word => r"\w+",
            CaptureKind::Letters => r"[[:alpha:]]+",
            CaptureKind::NonSpace => r"\S+",
            CaptureKind::Timestamp => {
                r"[0-9]{4}-[0-9]{1,2}-[0-9]{1,2}(?:[Tt ][0-9]{1,2}:[0-9]{2}(?::[0-9]{2}(?:\.[0-9]+)?)?)?(?:[Zz]|[-+][0-9]{2}(?::?[0-9]{2})?)?"
            }
        }
    }

    /// Convert matched text into a typed value
    pub fn convert(&self, field: &str, raw: &str) -> Result<FieldValue> {
        let invalid = |reason: String| DecoderError::InvalidValue {
            field: field.to_string(),
            value: raw.to_string(),
            reason,
        };

        match self {
            CaptureKind::Integer => raw
                .parse::<i64>()
                .map(FieldValue::Integer)
                .map_err(|e| invalid(e.to_string())),
            CaptureKind::Hex => {
                let digits = raw
                    .strip_prefix("0x")
                    .or_else(|| raw.strip_prefix("0X"))
                    .unwrap_or(raw);
                i64::from_str_radix(digits, 16)
                    .map(FieldValue::Integer)
                    .map_err(|e| invalid(e.to_string()))
            }
            CaptureKind::Fixed | CaptureKind::Number => raw
                .parse::<f64>()
                .map(FieldValue::Float)
                .map_err(|e| invalid(e.to_string())),
            CaptureKind::Timestamp => parse_iso8601(raw)
                .map(|ts| FieldValue::Timestamp(epoch_seconds(&ts)))
                .ok_or_else(|| invalid("not a valid ISO-8601 timestamp".to_string())),
            CaptureKind::Text | CaptureKind::Word | CaptureKind::Letters | CaptureKind::NonSpace => {
                Ok(FieldValue::Text(raw.to_string()))
            }
        }
    }
}

/// A capture placeholder
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Capture {
    /// Capture name, `None` for anonymous placeholders
    pub name: Option<String>,
    /// Declared value kind
    pub kind: CaptureKind,
}

impl Capture {
    fn parse(template: &str, spec: &str) -> std::result::Result<Self, ConfigError> {
        let (name, code) = spec.split_once(':').unwrap_or((spec, ""));

        let kind = CaptureKind::from_code(code)
            .ok_or_else(|| invalid(template, format!("unknown capture type \"{}\"", code)))?;

        let name = if name.is_empty() {
            None
        } else if is_valid_name(name) {
            Some(name.to_string())
        } else {
            return Err(invalid(template, format!("invalid capture name \"{}\"", name)));
        };

        Ok(Self { name, kind })
    }
}

impl fmt::Display for Capture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = self.name.as_deref().unwrap_or("");
        match self.kind {
            CaptureKind::Text => write!(f, "{{{}}}", name),
            kind => write!(f, "{{{}:{}}}", name, kind.code()),
        }
    }
}

/// One piece of a parsed template
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Literal(String),
    Capture(Capture),
}

/// A parsed template
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    source: String,
    segments: Vec<Segment>,
}

impl Template {
    /// Parse template text
    ///
    /// Fails on an empty template, unbalanced braces, unknown type codes,
    /// invalid capture names and capture names used twice.
    pub fn parse(source: &str) -> std::result::Result<Self, ConfigError> {
        if source.is_empty() {
            return Err(invalid(source, "template is empty".to_string()));
        }

        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut names = HashSet::new();
        let mut chars = source.chars().peekable();

        while let Some(c) = chars.next() {
            match c {
                '{' if chars.peek() == Some(&'{') => {
                    chars.next();
                    literal.push('{');
                }
                '}' if chars.peek() == Some(&'}') => {
                    chars.next();
                    literal.push('}');
                }
                '{' => {
                    let mut spec = String::new();
                    loop {
                        match chars.next() {
                            Some('}') => break,
                            Some('{') => {
                                return Err(invalid(source, "nested '{' in placeholder".to_string()))
                            }
                            Some(ch) => spec.push(ch),
                            None => {
                                return Err(invalid(source, "unterminated placeholder".to_string()))
                            }
                        }
                    }

                    let capture = Capture::parse(source, &spec)?;
                    if let Some(name) = &capture.name {
                        if !names.insert(name.clone()) {
                            return Err(invalid(
                                source,
                                format!("capture \"{}\" is declared more than once", name),
                            ));
                        }
                    }

                    if !literal.is_empty() {
                        segments.push(Segment::Literal(std::mem::take(&mut literal)));
                    }
                    segments.push(Segment::Capture(capture));
                }
                '}' => return Err(invalid(source, "single '}' outside a placeholder".to_string())),
                other => literal.push(other),
            }
        }

        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }

        Ok(Self {
            source: source.to_string(),
            segments,
        })
    }

    /// Template text as written
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Literal and capture segments in order
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// All capture placeholders in order
    pub fn captures(&self) -> impl Iterator<Item = &Capture> {
        self.segments.iter().filter_map(|segment| match segment {
            Segment::Capture(capture) => Some(capture),
            Segment::Literal(_) => None,
        })
    }

    /// Kind of the named capture, if the template declares it
    pub fn capture_kind(&self, name: &str) -> Option<CaptureKind> {
        self.captures()
            .find(|capture| capture.name.as_deref() == Some(name))
            .map(|capture| capture.kind)
    }
}

impl fmt::Display for Template {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

fn is_valid_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    }
}

fn invalid(template: &str, reason: String) -> ConfigError {
    ConfigError::InvalidTemplate {
        template: template.to_string(),
        reason,
    }
}
