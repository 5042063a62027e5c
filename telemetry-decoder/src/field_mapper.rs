//! Field name mapping
//!
//! Renames raw capture names to the canonical names a device declares.

use crate::definitions::Device;
use crate::types::FieldMap;

/// Maps decoded fields to a device's canonical field names
pub struct FieldMapper;

impl FieldMapper {
    /// Rename decoded fields using `device.fields`
    ///
    /// Captures the device does not map are dropped. If two raw names map to the
    /// same canonical name, the one later in name order is kept.
    pub fn map(device: &Device, decoded: FieldMap) -> FieldMap {
        let mut fields = FieldMap::new();

        for (raw_name, value) in decoded {
            match device.fields.get(&raw_name) {
                Some(canonical) => {
                    fields.insert(canonical.clone(), value);
                }
                None => log::debug!(
                    "Got unrecognized field \"{}\" for {} ({}); ignoring",
                    raw_name,
                    device.name,
                    device.device_type
                ),
            }
        }

        fields
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::FieldValue;
    use std::collections::BTreeMap;

    fn device(fields: &[(&str, &str)]) -> Device {
        Device {
            name: "analog1".to_string(),
            device_type: "generic_gauge".to_string(),
            fields: fields
                .iter()
                .map(|(raw, canonical)| (raw.to_string(), canonical.to_string()))
                .collect::<BTreeMap<_, _>>(),
            description: None,
        }
    }

    #[test]
    fn test_renames_mapped_fields() {
        let mut decoded = FieldMap::new();
        decoded.insert("value".to_string(), FieldValue::Float(3.30));

        let fields = FieldMapper::map(&device(&[("value", "voltage")]), decoded);
        assert_eq!(fields.len(), 1);
        assert_eq!(fields.get("voltage"), Some(&FieldValue::Float(3.30)));
        assert!(!fields.contains_key("value"));
    }

    #[test]
    fn test_drops_unmapped_fields() {
        let mut decoded = FieldMap::new();
        decoded.insert("value".to_string(), FieldValue::Float(3.30));
        decoded.insert("checksum".to_string(), FieldValue::Integer(27));

        let fields = FieldMapper::map(&device(&[("value", "voltage")]), decoded);
        assert_eq!(fields.keys().collect::<Vec<_>>(), vec!["voltage"]);
    }

    #[test]
    fn test_unused_mappings_are_inert() {
        let mut decoded = FieldMap::new();
        decoded.insert("value".to_string(), FieldValue::Float(1.0));

        let fields = FieldMapper::map(
            &device(&[("value", "voltage"), ("current", "amps")]),
            decoded,
        );
        assert_eq!(fields.len(), 1);
        assert!(!fields.contains_key("amps"));
    }
}
