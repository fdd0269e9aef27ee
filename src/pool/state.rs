//! The shared control state: catalog, Loop State Table and Worker Directory
//!
//! Everything that must change together lives here so a single lock covers
//! it. Methods are the only way to mutate the state; each one leaves the
//! worker/loop cross references consistent.

use crate::domain::{LoopDef, LoopRecord, LoopState, StatusReport, WorkerRef};
use crate::error::{Result, VoxError};

use super::{LoopTable, WorkerDirectory};

#[derive(Debug, Clone)]
pub struct ControlState {
    role: String,
    catalog: Vec<LoopDef>,
    table: LoopTable,
    directory: WorkerDirectory,
}

impl ControlState {
    pub fn new(role: impl Into<String>, catalog: Vec<LoopDef>, directory: WorkerDirectory) -> Self {
        let table = LoopTable::new(&catalog);
        Self {
            role: role.into(),
            catalog,
            table,
            directory,
        }
    }

    pub fn role(&self) -> &str {
        &self.role
    }

    /// Loop definitions of the active role, in catalog order
    pub fn loops(&self) -> &[LoopDef] {
        &self.catalog
    }

    pub fn loop_def(&self, loop_name: &str) -> Option<&LoopDef> {
        self.catalog.iter().find(|def| def.name == loop_name)
    }

    pub fn record(&self, loop_name: &str) -> Option<&LoopRecord> {
        self.table.get(loop_name)
    }

    pub fn table(&self) -> &LoopTable {
        &self.table
    }

    pub fn directory(&self) -> &WorkerDirectory {
        &self.directory
    }

    pub fn worker_ref(&self, worker: &str) -> Option<WorkerRef> {
        self.directory.get(worker).map(|w| w.to_ref())
    }

    /// Pick the least recently used idle worker and claim it for `loop_name`
    pub fn claim_idle(&mut self, loop_name: &str) -> Option<WorkerRef> {
        let name = self.directory.find_idle()?.name.clone();
        self.directory.claim(&name, loop_name).ok()
    }

    /// Undo a claim that never made it into the table
    pub fn unclaim(&mut self, worker: &str) -> bool {
        self.directory.release(worker)
    }

    /// Record `state` for a loop and its (already claimed) worker
    pub fn commit(&mut self, loop_name: &str, state: LoopState, worker: &str) -> Result<()> {
        if state.is_off() {
            return Err(VoxError::InvalidState(format!(
                "use commit_off to turn {} off",
                loop_name
            )));
        }
        let owner = self.directory.get(worker).and_then(|w| w.assigned.as_deref());
        if owner != Some(loop_name) {
            return Err(VoxError::InvalidState(format!(
                "worker {} is not assigned to {}",
                worker, loop_name
            )));
        }
        if !self.table.set(loop_name, LoopRecord::with_worker(state, worker)) {
            return Err(VoxError::LoopNotFound(loop_name.to_string()));
        }
        Ok(())
    }

    /// Turn a loop OFF and release its worker. Returns the released worker.
    pub fn commit_off(&mut self, loop_name: &str) -> Option<String> {
        let worker = self.table.get(loop_name)?.assigned_worker.clone();
        self.table.set(loop_name, LoopRecord::off());
        if let Some(name) = &worker {
            self.directory.release(name);
        }
        worker
    }

    /// The loop in TALK other than `loop_name`, with its worker
    pub fn talking_except(&self, loop_name: &str) -> Option<(String, WorkerRef)> {
        let (name, record) = self.table.talking_except(loop_name)?;
        let worker = self.worker_ref(record.assigned_worker.as_deref()?)?;
        Some((name.to_string(), worker))
    }

    /// Every loop with a worker, as (loop, worker) pairs
    pub fn assignments(&self) -> Vec<(String, WorkerRef)> {
        let mut pairs: Vec<(String, WorkerRef)> = self
            .table
            .iter()
            .filter_map(|(name, record)| {
                let worker = self.worker_ref(record.assigned_worker.as_deref()?)?;
                Some((name.clone(), worker))
            })
            .collect();
        pairs.sort_by(|a, b| a.0.cmp(&b.0));
        pairs
    }

    /// Replace the catalog for a new role. Every assigned worker is released
    /// and returned so the caller can tell it to leave.
    pub fn switch_role(&mut self, role: impl Into<String>, catalog: Vec<LoopDef>) -> Vec<WorkerRef> {
        let released: Vec<WorkerRef> = self.assignments().into_iter().map(|(_, w)| w).collect();
        for worker in &released {
            self.directory.release(&worker.name);
        }
        self.role = role.into();
        self.table = LoopTable::new(&catalog);
        self.catalog = catalog;
        released
    }

    /// Locally known status: every catalog loop with its table state and a
    /// zero participant count
    pub fn local_report(&self) -> StatusReport {
        let mut report = StatusReport::new();
        for def in &self.catalog {
            report.user_counts.insert(def.name.clone(), 0);
            report.states.insert(def.name.clone(), self.table.state_of(&def.name));
        }
        report
    }

    /// Verify the cross-record invariants; returns a description of the
    /// first violation found
    pub fn check_invariants(&self) -> std::result::Result<(), String> {
        let talking = self.table.iter().filter(|(_, r)| r.state == LoopState::Talk).count();
        if talking > 1 {
            return Err(format!("{} loops in TALK", talking));
        }

        for (name, record) in self.table.iter() {
            if !record.is_consistent() {
                return Err(format!("loop {} is {} with worker {:?}", name, record.state, record.assigned_worker));
            }
            if let Some(worker) = &record.assigned_worker {
                let owner = self.directory.get(worker).and_then(|w| w.assigned.as_deref());
                if owner != Some(name.as_str()) {
                    return Err(format!("loop {} references worker {} owned by {:?}", name, worker, owner));
                }
            }
            if !record.state.is_off() && !self.loop_def(name).is_some_and(|d| d.can_listen) {
                return Err(format!("loop {} cannot listen but is {}", name, record.state));
            }
        }

        for worker in self.directory.workers() {
            if let Some(loop_name) = &worker.assigned {
                let back = self.table.get(loop_name).and_then(|r| r.assigned_worker.as_deref());
                if back != Some(worker.name.as_str()) {
                    return Err(format!("worker {} assigned to {} without a back reference", worker.name, loop_name));
                }
            }
        }
        Ok(())
    }
}
