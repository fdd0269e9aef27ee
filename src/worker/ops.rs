//! Remote operations understood by a worker

use serde_json::{Value, json};

/// One remote operation on a worker
#[derive(Debug, Clone, PartialEq)]
pub enum WorkerOp {
    /// Join a loop (the worker leaves whatever it was on)
    Join { loop_name: String },
    /// Leave the current loop
    Leave,
    /// Stop transmitting
    Mute,
    /// Start transmitting
    Talk,
    /// Playback volume, 0.0 to 1.0
    SetVolume { level: f32 },
    DelayOn,
    DelayOff,
    /// Select the capture device
    DeviceIn { device: String },
    /// Select the playback device
    DeviceOut { device: String },
}

impl WorkerOp {
    pub fn join(loop_name: impl Into<String>) -> Self {
        WorkerOp::Join {
            loop_name: loop_name.into(),
        }
    }

    /// Volume clamped into 0.0..=1.0
    pub fn set_volume(level: f32) -> Self {
        let level = if level.is_nan() { 0.0 } else { level.clamp(0.0, 1.0) };
        WorkerOp::SetVolume { level }
    }

    pub fn delay(enabled: bool) -> Self {
        if enabled { WorkerOp::DelayOn } else { WorkerOp::DelayOff }
    }

    /// Short name, also the path segment on the worker
    pub fn kind(&self) -> &'static str {
        match self {
            WorkerOp::Join { .. } => "join",
            WorkerOp::Leave => "leave",
            WorkerOp::Mute => "mute",
            WorkerOp::Talk => "talk",
            WorkerOp::SetVolume { .. } => "set_volume",
            WorkerOp::DelayOn => "delay_on",
            WorkerOp::DelayOff => "delay_off",
            WorkerOp::DeviceIn { .. } => "device_in",
            WorkerOp::DeviceOut { .. } => "device_out",
        }
    }

    /// JSON request body, if the operation takes one
    pub fn body(&self) -> Option<Value> {
        match self {
            WorkerOp::Join { loop_name } => Some(json!({ "loop": loop_name })),
            WorkerOp::SetVolume { level } => Some(json!({ "volume": level })),
            WorkerOp::DeviceIn { device } | WorkerOp::DeviceOut { device } => Some(json!({ "device": device })),
            _ => None,
        }
    }
}

impl std::fmt::Display for WorkerOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WorkerOp::Join { loop_name } => write!(f, "join({})", loop_name),
            WorkerOp::SetVolume { level } => write!(f, "set_volume({:.2})", level),
            WorkerOp::DeviceIn { device } => write!(f, "device_in({})", device),
            WorkerOp::DeviceOut { device } => write!(f, "device_out({})", device),
            other => write!(f, "{}()", other.kind()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_matches_worker_paths() {
        assert_eq!(WorkerOp::join("CMD").kind(), "join");
        assert_eq!(WorkerOp::Leave.kind(), "leave");
        assert_eq!(WorkerOp::delay(true).kind(), "delay_on");
        assert_eq!(WorkerOp::delay(false).kind(), "delay_off");
    }

    #[test]
    fn test_join_body() {
        assert_eq!(WorkerOp::join("CMD").body(), Some(json!({"loop": "CMD"})));
        assert_eq!(WorkerOp::Mute.body(), None);
    }

    #[test]
    fn test_set_volume_clamped() {
        assert_eq!(WorkerOp::set_volume(1.7), WorkerOp::SetVolume { level: 1.0 });
        assert_eq!(WorkerOp::set_volume(-0.3), WorkerOp::SetVolume { level: 0.0 });
        assert_eq!(WorkerOp::set_volume(f32::NAN), WorkerOp::SetVolume { level: 0.0 });
        assert_eq!(WorkerOp::set_volume(0.5).body(), Some(json!({"volume": 0.5})));
    }

    #[test]
    fn test_device_body() {
        let op = WorkerOp::DeviceOut {
            device: "speakers".to_string(),
        };
        assert_eq!(op.kind(), "device_out");
        assert_eq!(op.body(), Some(json!({"device": "speakers"})));
    }

    #[test]
    fn test_display() {
        assert_eq!(WorkerOp::join("CMD").to_string(), "join(CMD)");
        assert_eq!(WorkerOp::Talk.to_string(), "talk()");
        assert_eq!(WorkerOp::set_volume(0.25).to_string(), "set_volume(0.25)");
    }
}
