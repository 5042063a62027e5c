//! Definition catalog
//!
//! Validates the device -> device type reference graph and compiles every
//! device type's templates. Built once; read-only afterwards.

use crate::definitions::model::{Definition, Device, DeviceType, NamedDefinition};
use crate::template::{Matcher, TemplateOptions};
use crate::types::ConfigError;
use std::collections::{BTreeMap, HashMap};

/// How to treat two definitions with the same name
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DuplicatePolicy {
    /// The later definition replaces the earlier one; a warning is logged
    #[default]
    LastWins,
    /// Duplicate names are a configuration error
    Reject,
}

/// Validated devices and device types
#[derive(Debug, Clone, Default)]
pub struct DefinitionCatalog {
    /// Devices by name
    devices: HashMap<String, Device>,

    /// Device types by name, with compiled templates
    device_types: HashMap<String, DeviceType>,
}

impl DefinitionCatalog {
    /// Build and validate a catalog
    ///
    /// Definitions share one namespace regardless of category. Validation fails if
    /// a device has no device type, names an unknown device type, or a device type
    /// has no templates or an invalid template.
    pub fn build<I>(
        definitions: I,
        options: &TemplateOptions,
        policy: DuplicatePolicy,
    ) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = NamedDefinition>,
    {
        // BTreeMap so validation errors are reported in a stable order
        let mut merged: BTreeMap<String, NamedDefinition> = BTreeMap::new();
        for definition in definitions {
            if let Some(previous) = merged.get(&definition.name) {
                match policy {
                    DuplicatePolicy::Reject => {
                        return Err(ConfigError::DuplicateDefinition {
                            name: definition.name,
                            file: definition.origin,
                            previous_file: previous.origin.clone(),
                        });
                    }
                    DuplicatePolicy::LastWins => log::warn!(
                        "Duplicate definition for \"{}\" found in {} (replaces {} from {})",
                        definition.name,
                        definition.origin,
                        previous.definition.category(),
                        previous.origin
                    ),
                }
            }
            merged.insert(definition.name.clone(), definition);
        }

        let mut device_defs = Vec::new();
        let mut device_types = HashMap::new();

        for (name, named) in merged {
            match named.definition {
                Definition::Device(device) => device_defs.push((name, device)),
                Definition::DeviceType(device_type) => {
                    let templates = device_type.format.templates();
                    if templates.is_empty() {
                        return Err(ConfigError::NoTemplates(name));
                    }

                    let matchers = templates
                        .iter()
                        .map(|template| Matcher::compile(template, options))
                        .collect::<Result<Vec<_>, _>>()?;

                    log::debug!("Compiled {} format(s) for device type {}", matchers.len(), name);
                    device_types.insert(
                        name.clone(),
                        DeviceType::new(name, device_type.description, matchers),
                    );
                }
            }
        }

        let mut devices = HashMap::new();
        for (name, device) in device_defs {
            if device.device_type.is_empty() {
                return Err(ConfigError::MissingDeviceType(name));
            }
            if !device_types.contains_key(&device.device_type) {
                return Err(ConfigError::UnknownDeviceType {
                    device: name,
                    device_type: device.device_type,
                });
            }
            if device.fields.is_empty() {
                log::warn!("No \"fields\" definition found for device {}; all values will be dropped", name);
            }

            devices.insert(
                name.clone(),
                Device {
                    name,
                    device_type: device.device_type,
                    fields: device.fields,
                    description: device.description,
                },
            );
        }

        let catalog = Self {
            devices,
            device_types,
        };
        let stats = catalog.stats();
        log::info!(
            "Loaded {} device(s) and {} device type(s) with {} format(s)",
            stats.num_devices,
            stats.num_device_types,
            stats.num_templates
        );

        Ok(catalog)
    }

    /// Get a device by name
    pub fn device(&self, name: &str) -> Option<&Device> {
        self.devices.get(name)
    }

    /// Get a device type by name
    pub fn device_type(&self, name: &str) -> Option<&DeviceType> {
        self.device_types.get(name)
    }

    /// Resolve a record identifier to its device and device type
    pub fn resolve(&self, data_id: &str) -> Option<(&Device, &DeviceType)> {
        let device = self.devices.get(data_id)?;
        let device_type = self.device_types.get(&device.device_type)?;
        Some((device, device_type))
    }

    /// All device names, sorted
    pub fn device_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.devices.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Get catalog statistics
    pub fn stats(&self) -> CatalogStats {
        CatalogStats {
            num_devices: self.devices.len(),
            num_device_types: self.device_types.len(),
            num_templates: self.device_types.values().map(|t| t.matchers().len()).sum(),
        }
    }
}

/// Catalog statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CatalogStats {
    /// Number of devices
    pub num_devices: usize,
    /// Number of device types
    pub num_device_types: usize,
    /// Total number of templates across device types
    pub num_templates: usize,
}
