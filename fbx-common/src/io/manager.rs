use super::{IoSettings, WriterRegistry};

/// Owns the writer registry and the default IO settings
#[derive(Debug, Default)]
pub struct Manager {
    registry: WriterRegistry,
    settings: IoSettings,
}

impl Manager {
    /// Manager with the default binary + ASCII writers
    pub fn new() -> Self {
        Self::default()
    }

    /// Manager with a caller-supplied registry
    pub fn with_registry(registry: WriterRegistry) -> Self {
        Self {
            registry,
            settings: IoSettings::default(),
        }
    }

    pub fn registry(&self) -> &WriterRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut WriterRegistry {
        &mut self.registry
    }

    pub fn io_settings(&self) -> &IoSettings {
        &self.settings
    }

    pub fn io_settings_mut(&mut self) -> &mut IoSettings {
        &mut self.settings
    }
}
