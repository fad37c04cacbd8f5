//! Keyed export settings bundle

/// Key of the boolean setting that controls texture embedding
pub const EXP_FBX_EMBEDDED: &str = "Export|IncludeGrp|Embed";

/// Settings handed to an exporter at initialization
#[derive(Debug, Clone, PartialEq)]
pub struct IoSettings {
    embed_textures: bool,
    creator: String,
}

impl Default for IoSettings {
    fn default() -> Self {
        Self {
            embed_textures: false,
            creator: format!("fbx-common {}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl IoSettings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a boolean setting by key. Returns `false` for unknown keys.
    pub fn set_bool_prop(&mut self, key: &str, value: bool) -> bool {
        match key {
            EXP_FBX_EMBEDDED => {
                self.embed_textures = value;
                true
            }
            _ => false,
        }
    }

    /// Read a boolean setting by key
    pub fn bool_prop(&self, key: &str) -> Option<bool> {
        match key {
            EXP_FBX_EMBEDDED => Some(self.embed_textures),
            _ => None,
        }
    }

    pub fn embed_textures(&self) -> bool {
        self.embed_textures
    }

    /// Application name written to the document's `Creator` fields
    pub fn creator(&self) -> &str {
        &self.creator
    }

    pub fn set_creator(&mut self, creator: impl Into<String>) {
        self.creator = creator.into();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embedded_key() {
        let mut settings = IoSettings::new();
        assert_eq!(settings.bool_prop(EXP_FBX_EMBEDDED), Some(false));
        assert!(settings.set_bool_prop(EXP_FBX_EMBEDDED, true));
        assert!(settings.embed_textures());
    }

    #[test]
    fn test_unknown_key() {
        let mut settings = IoSettings::new();
        assert!(!settings.set_bool_prop("Export|Nope", true));
        assert_eq!(settings.bool_prop("Export|Nope"), None);
    }
}
