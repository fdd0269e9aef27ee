//! Inbound commands
//!
//! The command surface accepts `{action, loop?, enabled?}`; it is validated
//! into a [`Command`] before anything touches the control state.

use serde::{Deserialize, Serialize};

use crate::error::{Result, VoxError};

/// Raw command body
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandRequest {
    pub action: String,
    #[serde(rename = "loop", default, skip_serializing_if = "Option::is_none")]
    pub loop_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
}

impl CommandRequest {
    pub fn toggle(loop_name: impl Into<String>) -> Self {
        Self {
            action: "toggle".to_string(),
            loop_name: Some(loop_name.into()),
            enabled: None,
        }
    }

    pub fn off(loop_name: impl Into<String>) -> Self {
        Self {
            action: "off".to_string(),
            loop_name: Some(loop_name.into()),
            enabled: None,
        }
    }

    pub fn delay(enabled: bool) -> Self {
        Self {
            action: "delay".to_string(),
            loop_name: None,
            enabled: Some(enabled),
        }
    }
}

/// A validated command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Advance a loop OFF -> LISTEN -> TALK -> LISTEN ...
    Toggle(String),
    /// Force a loop OFF
    Off(String),
    /// Broadcast delay on/off to every worker
    Delay(bool),
}

impl TryFrom<CommandRequest> for Command {
    type Error = VoxError;

    fn try_from(request: CommandRequest) -> Result<Self> {
        let CommandRequest {
            action,
            loop_name,
            enabled,
        } = request;
        let require_loop = || {
            loop_name
                .clone()
                .filter(|name| !name.is_empty())
                .ok_or_else(|| VoxError::InvalidCommand(format!("'{}' requires 'loop'", action)))
        };

        match action.as_str() {
            "toggle" => Ok(Command::Toggle(require_loop()?)),
            "off" => Ok(Command::Off(require_loop()?)),
            "delay" => enabled
                .map(Command::Delay)
                .ok_or_else(|| VoxError::InvalidCommand("'delay' requires 'enabled'".to_string())),
            other => Err(VoxError::InvalidCommand(format!("unknown action '{}'", other))),
        }
    }
}

/// Which device a selection applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceDirection {
    In,
    Out,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_toggle() {
        let request: CommandRequest = serde_json::from_str(r#"{"action": "toggle", "loop": "CMD"}"#).unwrap();
        assert_eq!(Command::try_from(request).unwrap(), Command::Toggle("CMD".to_string()));
    }

    #[test]
    fn test_parse_off() {
        let command = Command::try_from(CommandRequest::off("OBS")).unwrap();
        assert_eq!(command, Command::Off("OBS".to_string()));
    }

    #[test]
    fn test_parse_delay() {
        let request: CommandRequest = serde_json::from_str(r#"{"action": "delay", "enabled": true}"#).unwrap();
        assert_eq!(Command::try_from(request).unwrap(), Command::Delay(true));
    }

    #[test]
    fn test_missing_loop_rejected() {
        let request: CommandRequest = serde_json::from_str(r#"{"action": "toggle"}"#).unwrap();
        let err = Command::try_from(request).unwrap_err();
        assert!(err.to_string().contains("requires 'loop'"));

        let request = CommandRequest {
            action: "off".to_string(),
            loop_name: Some(String::new()),
            enabled: None,
        };
        assert!(Command::try_from(request).is_err());
    }

    #[test]
    fn test_delay_requires_enabled() {
        let request: CommandRequest = serde_json::from_str(r#"{"action": "delay"}"#).unwrap();
        assert!(matches!(Command::try_from(request), Err(VoxError::InvalidCommand(_))));
    }

    #[test]
    fn test_unknown_action() {
        let request: CommandRequest = serde_json::from_str(r#"{"action": "explode", "loop": "CMD"}"#).unwrap();
        let err = Command::try_from(request).unwrap_err();
        assert!(err.to_string().contains("explode"));
    }

    #[test]
    fn test_request_serialization_uses_loop_key() {
        let json = serde_json::to_value(CommandRequest::toggle("CMD")).unwrap();
        assert_eq!(json["loop"], "CMD");
        assert!(json.get("enabled").is_none());
    }

    #[test]
    fn test_device_direction_names() {
        let dir: DeviceDirection = serde_json::from_str(r#""in""#).unwrap();
        assert_eq!(dir, DeviceDirection::In);
    }
}
