//! Device and device type definitions
//!
//! Definitions are read from configuration as a map of name to definition.
//! The `category` key selects the kind of definition:
//!
//! ```yaml
//! analog1:
//!   category: device
//!   device_type: generic_gauge
//!   fields:
//!     value: voltage
//!
//! generic_gauge:
//!   category: device_type
//!   format:
//!     - "{value:f} V"
//!     - "{value:d} V"
//! ```

use crate::template::Matcher;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A configuration definition, tagged by its `category`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "category", rename_all = "snake_case")]
pub enum Definition {
    Device(DeviceDefinition),
    DeviceType(DeviceTypeDefinition),
}

impl Definition {
    /// Build a device definition
    pub fn device<I, K, V>(device_type: impl Into<String>, fields: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Definition::Device(DeviceDefinition {
            device_type: device_type.into(),
            fields: fields
                .into_iter()
                .map(|(raw, canonical)| (raw.into(), canonical.into()))
                .collect(),
            description: None,
        })
    }

    /// Build a device type definition from its ordered templates
    pub fn device_type<I, S>(templates: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Definition::DeviceType(DeviceTypeDefinition {
            format: FormatSpec::Ordered(templates.into_iter().map(Into::into).collect()),
            description: None,
        })
    }

    /// Category name as written in configuration
    pub fn category(&self) -> &'static str {
        match self {
            Definition::Device(_) => "device",
            Definition::DeviceType(_) => "device_type",
        }
    }
}

/// A device instance definition
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeviceDefinition {
    /// Name of the device type describing this device's messages
    #[serde(default)]
    pub device_type: String,

    /// Raw capture name -> canonical field name
    #[serde(default)]
    pub fields: BTreeMap<String, String>,

    #[serde(default)]
    pub description: Option<String>,
}

/// A device type definition
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeviceTypeDefinition {
    /// One template, or an ordered list tried first to last
    #[serde(default)]
    pub format: FormatSpec,

    #[serde(default)]
    pub description: Option<String>,
}

/// The `format` of a device type: a single template or an ordered list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FormatSpec {
    Single(String),
    Ordered(Vec<String>),
}

impl Default for FormatSpec {
    fn default() -> Self {
        FormatSpec::Ordered(Vec::new())
    }
}

impl FormatSpec {
    /// Templates in declaration order
    pub fn templates(&self) -> &[String] {
        match self {
            FormatSpec::Single(template) => std::slice::from_ref(template),
            FormatSpec::Ordered(templates) => templates,
        }
    }
}

/// A definition together with its name and where it came from
#[derive(Debug, Clone, PartialEq)]
pub struct NamedDefinition {
    /// Definition name (device name or device type name)
    pub name: String,
    /// Where the definition was read from (file path, or a caller label)
    pub origin: String,
    pub definition: Definition,
}

impl NamedDefinition {
    pub fn new(name: impl Into<String>, origin: impl Into<String>, definition: Definition) -> Self {
        Self {
            name: name.into(),
            origin: origin.into(),
            definition,
        }
    }
}

/// A validated device
#[derive(Debug, Clone, PartialEq)]
pub struct Device {
    pub name: String,
    pub device_type: String,
    /// Raw capture name -> canonical field name
    pub fields: BTreeMap<String, String>,
    pub description: Option<String>,
}

/// A validated device type with its compiled templates
#[derive(Debug, Clone)]
pub struct DeviceType {
    pub name: String,
    pub description: Option<String>,
    /// Compiled templates, in declaration order
    matchers: Vec<Matcher>,
}

impl DeviceType {
    pub(crate) fn new(name: String, description: Option<String>, matchers: Vec<Matcher>) -> Self {
        Self {
            name,
            description,
            matchers,
        }
    }

    /// Compiled templates, in declaration order
    pub fn matchers(&self) -> &[Matcher] {
        &self.matchers
    }

    /// Template text, in declaration order
    pub fn templates(&self) -> impl Iterator<Item = &str> {
        self.matchers.iter().map(Matcher::source)
    }
}
