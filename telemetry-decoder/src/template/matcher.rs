//! Compiled templates
//!
//! A [`Matcher`] is built once per template and reused for every message.

use crate::template::syntax::{Capture, Segment, Template};
use crate::types::{ConfigError, FieldMap, Result};
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};

/// Options applied when compiling templates
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateOptions {
    /// Match literal text case-sensitively (default: case-insensitive)
    #[serde(default)]
    pub case_sensitive: bool,
}

/// A compiled template
///
/// Matching is all-or-nothing: the whole text must match the template.
#[derive(Debug, Clone)]
pub struct Matcher {
    template: Template,
    regex: Regex,
    /// Capture placeholders in group order (group `i + 1` is `slots[i]`)
    slots: Vec<Capture>,
}

impl Matcher {
    /// Parse and compile template text
    pub fn compile(source: &str, options: &TemplateOptions) -> std::result::Result<Self, ConfigError> {
        let template = Template::parse(source)?;
        Self::from_template(template, options)
    }

    /// Compile an already parsed template
    pub fn from_template(
        template: Template,
        options: &TemplateOptions,
    ) -> std::result::Result<Self, ConfigError> {
        let mut pattern = String::from("^(?:");
        let mut slots = Vec::new();

        for segment in template.segments() {
            match segment {
                Segment::Literal(text) => pattern.push_str(&regex::escape(text)),
                Segment::Capture(capture) => {
                    pattern.push('(');
                    pattern.push_str(capture.kind.pattern());
                    pattern.push(')');
                    slots.push(capture.clone());
                }
            }
        }
        pattern.push_str(")$");

        let regex = RegexBuilder::new(&pattern)
            .case_insensitive(!options.case_sensitive)
            .dot_matches_new_line(true)
            .build()
            .map_err(|e| ConfigError::InvalidTemplate {
                template: template.source().to_string(),
                reason: e.to_string(),
            })?;

        log::trace!("Compiled template {:?} to /{}/", template.source(), pattern);

        Ok(Self {
            template,
            regex,
            slots,
        })
    }

    /// Template text this matcher was compiled from
    pub fn source(&self) -> &str {
        self.template.source()
    }

    /// Parsed template
    pub fn template(&self) -> &Template {
        &self.template
    }

    /// True if the whole text matches, without converting captures
    pub fn is_match(&self, text: &str) -> bool {
        self.regex.is_match(text)
    }

    /// Match the whole text and return the named captures
    ///
    /// # Returns
    /// * `Ok(None)` if the text does not match
    /// * `Ok(Some(fields))` with every named capture converted to its kind
    /// * `Err(DecoderError::InvalidValue)` if the text matches but a capture
    ///   cannot be converted (integer overflow, impossible date)
    pub fn captures(&self, text: &str) -> Result<Option<FieldMap>> {
        let Some(caps) = self.regex.captures(text) else {
            return Ok(None);
        };

        let mut fields = FieldMap::new();
        for (index, slot) in self.slots.iter().enumerate() {
            let Some(name) = &slot.name else {
                continue;
            };
            let raw = caps.get(index + 1).map(|m| m.as_str()).unwrap_or_default();
            fields.insert(name.clone(), slot.kind.convert(name, raw)?);
        }

        Ok(Some(fields))
    }
}
