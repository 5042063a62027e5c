//! Message Decoding Engine
//!
//! Matches a message body against a device type's compiled templates. Templates
//! are tried in declaration order and the first one matching the whole message
//! wins; later templates are not consulted.

use crate::definitions::DeviceType;
use crate::types::{FieldMap, Result};

/// Result of decoding one message
#[derive(Debug, Clone, PartialEq)]
pub struct MessageMatch {
    /// Named captures of the matching template (empty if nothing matched)
    pub fields: FieldMap,
    /// Position of the matching template in the device type's format list
    pub template_index: Option<usize>,
}

impl MessageMatch {
    /// True if one of the templates matched
    pub fn is_matched(&self) -> bool {
        self.template_index.is_some()
    }

    fn unmatched() -> Self {
        Self {
            fields: FieldMap::new(),
            template_index: None,
        }
    }
}

/// Message decoder - extracts raw fields from message bodies
pub struct MessageDecoder;

impl MessageDecoder {
    /// Decode a message body using a device type's templates
    ///
    /// # Arguments
    /// * `device_type` - Device type whose templates describe the message
    /// * `message` - Message body (the record with data_id and timestamp removed)
    ///
    /// # Returns
    /// * `Ok(MessageMatch)` with the first matching template's captures, or with
    ///   empty fields if no template matched
    /// * `Err(DecoderError::InvalidValue)` if the first matching template has a
    ///   capture that cannot be converted
    pub fn decode(device_type: &DeviceType, message: &str) -> Result<MessageMatch> {
        for (index, matcher) in device_type.matchers().iter().enumerate() {
            log::trace!(
                "Trying format {} of {} for {}: {:?}",
                index + 1,
                device_type.matchers().len(),
                device_type.name,
                matcher.source()
            );

            if let Some(fields) = matcher.captures(message)? {
                log::debug!(
                    "Message for {} matched format {:?}: {:?}",
                    device_type.name,
                    matcher.source(),
                    fields
                );
                return Ok(MessageMatch {
                    fields,
                    template_index: Some(index),
                });
            }
        }

        Ok(MessageMatch::unmatched())
    }
}
