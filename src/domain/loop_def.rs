//! Loop definitions as supplied by the catalog

use serde::{Deserialize, Serialize};

/// A logical voice loop operators can listen to and optionally talk on
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoopDef {
    /// Unique loop name
    pub name: String,
    /// Whether the loop may leave OFF at all
    #[serde(default)]
    pub can_listen: bool,
    /// Whether the loop may be promoted to TALK
    #[serde(default)]
    pub can_talk: bool,
}

impl LoopDef {
    pub fn new(name: impl Into<String>, can_listen: bool, can_talk: bool) -> Self {
        Self {
            name: name.into(),
            can_listen,
            can_talk,
        }
    }

    /// A loop that can be monitored and talked on
    pub fn talk(name: impl Into<String>) -> Self {
        Self::new(name, true, true)
    }

    /// A loop that can only be monitored
    pub fn listen_only(name: impl Into<String>) -> Self {
        Self::new(name, true, false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constructors() {
        assert_eq!(LoopDef::talk("CMD"), LoopDef::new("CMD", true, true));
        assert_eq!(LoopDef::listen_only("OBS"), LoopDef::new("OBS", true, false));
    }

    #[test]
    fn test_deserialize_missing_flags_default_false() {
        let def: LoopDef = serde_json::from_str(r#"{"name": "AUX"}"#).unwrap();
        assert_eq!(def, LoopDef::new("AUX", false, false));
    }

    #[test]
    fn test_deserialize_ignores_extra_fields() {
        let def: LoopDef =
            serde_json::from_str(r#"{"name": "CMD", "can_listen": true, "can_talk": true, "color": "red"}"#).unwrap();
        assert_eq!(def, LoopDef::talk("CMD"));
    }
}
