//! Line templates for log records
//!
//! A template such as `{timestamp}\t{channel}\t{level}\t{message}` is parsed once
//! into segments so that rendering a record never fails.

use crate::error::{Result, TracerError};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Timestamp,
    Channel,
    Level,
    Message,
}

/// Fields substituted into a template
#[derive(Debug, Clone, Copy)]
pub struct RecordFields<'a> {
    pub timestamp: &'a str,
    pub channel: &'a str,
    pub level: &'a str,
    pub message: &'a str,
}

/// A parsed log line template
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineFormat {
    segments: Vec<Segment>,
}

impl LineFormat {
    /// Parse a template
    ///
    /// Recognized placeholders are `{timestamp}`, `{channel}`, `{level}` and
    /// `{message}`. `{{` and `}}` produce literal braces.
    pub fn parse(template: &str) -> Result<Self> {
        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut chars = template.chars().peekable();

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
                    let mut name = String::new();
                    let mut closed = false;
                    for n in chars.by_ref() {
                        if n == '}' {
                            closed = true;
                            break;
                        }
                        name.push(n);
                    }
                    if !closed {
                        return Err(TracerError::FormatError(format!(
                            "unterminated placeholder '{{{}'",
                            name
                        )));
                    }
                    let segment = match name.as_str() {
                        "timestamp" => Segment::Timestamp,
                        "channel" => Segment::Channel,
                        "level" => Segment::Level,
                        "message" => Segment::Message,
                        other => {
                            return Err(TracerError::FormatError(format!(
                                "unknown placeholder '{{{}}}'",
                                other
                            )))
                        }
                    };
                    if !literal.is_empty() {
                        segments.push(Segment::Literal(std::mem::take(&mut literal)));
                    }
                    segments.push(segment);
                }
                '}' => {
                    return Err(TracerError::FormatError(
                        "unmatched '}' in line format".to_string(),
                    ))
                }
                other => literal.push(other),
            }
        }

        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }

        Ok(Self { segments })
    }

    /// Render one record, without the trailing newline
    pub fn render(&self, fields: &RecordFields<'_>) -> String {
        let mut line = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => line.push_str(text),
                Segment::Timestamp => line.push_str(fields.timestamp),
                Segment::Channel => line.push_str(fields.channel),
                Segment::Level => line.push_str(fields.level),
                Segment::Message => line.push_str(fields.message),
            }
        }
        line
    }
}

impl Default for LineFormat {
    fn default() -> Self {
        Self {
            segments: vec![
                Segment::Timestamp,
                Segment::Literal("\t".to_string()),
                Segment::Channel,
                Segment::Literal("\t".to_string()),
                Segment::Level,
                Segment::Literal("\t".to_string()),
                Segment::Message,
            ],
        }
    }
}
