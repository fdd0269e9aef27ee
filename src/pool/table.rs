//! Loop State Table

use std::collections::HashMap;

use crate::domain::{LoopDef, LoopRecord, LoopState};

/// One state record per catalog loop
#[derive(Debug, Clone, Default)]
pub struct LoopTable {
    records: HashMap<String, LoopRecord>,
}

impl LoopTable {
    /// Every loop starts OFF
    pub fn new(loops: &[LoopDef]) -> Self {
        Self {
            records: loops.iter().map(|def| (def.name.clone(), LoopRecord::off())).collect(),
        }
    }

    pub fn get(&self, loop_name: &str) -> Option<&LoopRecord> {
        self.records.get(loop_name)
    }

    pub fn state_of(&self, loop_name: &str) -> LoopState {
        self.get(loop_name).map(|r| r.state).unwrap_or_default()
    }

    /// Replace a loop's record. Returns false for loops not in the table.
    pub fn set(&mut self, loop_name: &str, record: LoopRecord) -> bool {
        match self.records.get_mut(loop_name) {
            Some(slot) => {
                *slot = record;
                true
            }
            None => false,
        }
    }

    /// The loop currently in TALK other than `except`, if any
    pub fn talking_except(&self, except: &str) -> Option<(&str, &LoopRecord)> {
        self.records
            .iter()
            .find(|(name, record)| record.state == LoopState::Talk && name.as_str() != except)
            .map(|(name, record)| (name.as_str(), record))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &LoopRecord)> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> LoopTable {
        LoopTable::new(&[LoopDef::talk("CMD"), LoopDef::talk("FD"), LoopDef::listen_only("OBS")])
    }

    #[test]
    fn test_new_all_off() {
        let table = table();
        assert_eq!(table.len(), 3);
        assert!(table.iter().all(|(_, r)| *r == LoopRecord::off()));
    }

    #[test]
    fn test_set_unknown_loop_rejected() {
        let mut table = table();
        assert!(!table.set("NOPE", LoopRecord::with_worker(LoopState::Listen, "BOT1")));
        assert!(table.get("NOPE").is_none());
        assert_eq!(table.len(), 3);
    }

    #[test]
    fn test_talking_except() {
        let mut table = table();
        assert!(table.talking_except("CMD").is_none());

        table.set("FD", LoopRecord::with_worker(LoopState::Talk, "BOT2"));
        let (name, record) = table.talking_except("CMD").unwrap();
        assert_eq!(name, "FD");
        assert_eq!(record.assigned_worker.as_deref(), Some("BOT2"));
        assert!(table.talking_except("FD").is_none());
    }

    #[test]
    fn test_state_of_unknown_is_off() {
        let table = table();
        assert_eq!(table.state_of("NOPE"), LoopState::Off);
    }
}
