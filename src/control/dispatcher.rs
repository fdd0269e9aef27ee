//! Command dispatcher - the loop state machine
//!
//! Transitions (toggle, off, role switch) and the calls that target a loop's
//! or the pool's workers (volume, device) are serialized through the command
//! lane. Within a transition the state lock is only taken to read a snapshot
//! and to commit; remote calls run with the state lock released so status
//! reads never wait on a slow worker. Because only the lane holder mutates,
//! the snapshot taken at the start of a transition is still current when it
//! commits.

use std::sync::Arc;

use futures::future::join_all;
use tokio::sync::Mutex as AsyncMutex;

use super::{
    Command, CommandOutcome, CommitPolicy, DeviceDirection, OpFailure, RoleSwitch, SharedState, lock_state,
};
use crate::catalog::{CatalogSource, normalize_role};
use crate::domain::{LoopDef, LoopRecord, LoopState, WorkerRef};
use crate::error::{Result, VoxError};
use crate::worker::{WorkerClient, WorkerOp};

pub struct Dispatcher {
    state: SharedState,
    lane: AsyncMutex<()>,
    client: Arc<dyn WorkerClient>,
    catalog: Arc<dyn CatalogSource>,
    policy: CommitPolicy,
}

impl Dispatcher {
    pub fn new(
        state: SharedState,
        client: Arc<dyn WorkerClient>,
        catalog: Arc<dyn CatalogSource>,
        policy: CommitPolicy,
    ) -> Self {
        Self {
            state,
            lane: AsyncMutex::new(()),
            client,
            catalog,
            policy,
        }
    }

    pub fn policy(&self) -> CommitPolicy {
        self.policy
    }

    pub fn state(&self) -> &SharedState {
        &self.state
    }

    /// Execute a validated command
    pub async fn dispatch(&self, command: Command) -> Result<CommandOutcome> {
        match command {
            Command::Toggle(loop_name) => self.toggle(&loop_name).await,
            Command::Off(loop_name) => self.off(&loop_name).await,
            Command::Delay(enabled) => Ok(self.delay(enabled).await),
        }
    }

    /// Advance a loop: OFF -> LISTEN -> TALK -> LISTEN -> ...
    pub async fn toggle(&self, loop_name: &str) -> Result<CommandOutcome> {
        let _lane = self.lane.lock().await;
        let (def, record) = self.snapshot(loop_name)?;

        match record.state {
            LoopState::Off => self.start_listening(&def).await,
            LoopState::Listen if def.can_talk => self.grant_talk(&def, &record).await,
            LoopState::Listen => Ok(CommandOutcome::unchanged(loop_name, LoopState::Listen)),
            LoopState::Talk => self.demote(&def, &record).await,
        }
    }

    /// Force a loop OFF, releasing its worker. Always commits.
    pub async fn off(&self, loop_name: &str) -> Result<CommandOutcome> {
        let _lane = self.lane.lock().await;
        let (_, record) = self.snapshot(loop_name)?;

        let Some(worker) = record.assigned_worker.as_deref() else {
            return Ok(CommandOutcome::unchanged(loop_name, LoopState::Off));
        };
        let worker = self.worker_ref(worker)?;

        let failures = self.run(&worker, &[WorkerOp::Leave, WorkerOp::Mute]).await;
        lock_state(&self.state).commit_off(loop_name);

        log::info!("{}: {} -> OFF, released {}", loop_name, record.state, worker.name);
        Ok(CommandOutcome::committed(loop_name, LoopState::Off, None, failures))
    }

    /// Broadcast delay on/off to every worker; failures don't stop the rest
    pub async fn delay(&self, enabled: bool) -> CommandOutcome {
        let workers = lock_state(&self.state).directory().refs();
        let op = WorkerOp::delay(enabled);

        let results = join_all(workers.iter().map(|worker| self.client.send(worker, &op))).await;
        let failures: Vec<OpFailure> = workers
            .iter()
            .zip(results)
            .filter_map(|(worker, result)| {
                let err = result.err()?;
                log::warn!("{} on {} failed: {}", op, worker.name, err);
                Some(OpFailure::new(&worker.name, &op, &err))
            })
            .collect();

        log::info!("Delay {} broadcast to {} workers", if enabled { "on" } else { "off" }, workers.len());
        CommandOutcome::broadcast(workers.len(), failures)
    }

    /// Load the catalog for `role` and rebuild the Loop State Table.
    ///
    /// Workers still relaying a loop of the old role are told to leave and
    /// mute before the table is replaced.
    pub async fn switch_role(&self, role: &str) -> Result<RoleSwitch> {
        let role = normalize_role(role);
        if role.is_empty() {
            return Err(VoxError::InvalidCommand("role must not be empty".to_string()));
        }

        let _lane = self.lane.lock().await;
        let loops = self.catalog.load(&role);
        let assigned = lock_state(&self.state).assignments();

        let mut failures = Vec::new();
        for (_, worker) in &assigned {
            failures.extend(self.run(worker, &[WorkerOp::Leave, WorkerOp::Mute]).await);
        }

        let released = lock_state(&self.state).switch_role(role.clone(), loops);
        log::info!("Switched role to {} ({} workers released)", role, released.len());

        Ok(RoleSwitch {
            loops: lock_state(&self.state).loops().len(),
            role,
            released: released.into_iter().map(|w| w.name).collect(),
            failures,
        })
    }

    /// Forward a volume change to the worker relaying `loop_name`
    pub async fn set_volume(&self, loop_name: &str, level: f32) -> Result<CommandOutcome> {
        let _lane = self.lane.lock().await;
        let (_, record) = self.snapshot(loop_name)?;
        let Some(worker) = record.assigned_worker.as_deref() else {
            return Ok(CommandOutcome::unchanged(loop_name, record.state));
        };
        let worker = self.worker_ref(worker)?;

        let failures = self.run(&worker, &[WorkerOp::set_volume(level)]).await;
        if failures.is_empty() {
            Ok(CommandOutcome::committed(loop_name, record.state, Some(&worker.name), failures))
        } else {
            Ok(CommandOutcome::failed(loop_name, record.state, failures))
        }
    }

    /// Select the audio device on the primary (first) worker
    pub async fn select_device(&self, direction: DeviceDirection, device: &str) -> Result<CommandOutcome> {
        let _lane = self.lane.lock().await;
        let primary = lock_state(&self.state)
            .directory()
            .workers()
            .first()
            .map(|w| w.to_ref())
            .ok_or_else(|| VoxError::InvalidState("worker pool is empty".to_string()))?;

        let device = device.to_string();
        let op = match direction {
            DeviceDirection::In => WorkerOp::DeviceIn { device },
            DeviceDirection::Out => WorkerOp::DeviceOut { device },
        };
        let failures = self.run(&primary, &[op]).await;
        Ok(CommandOutcome::broadcast(1, failures))
    }

    /// OFF -> LISTEN: claim the least recently used idle worker, join, mute
    async fn start_listening(&self, def: &LoopDef) -> Result<CommandOutcome> {
        let loop_name = def.name.as_str();
        if !def.can_listen {
            return Ok(CommandOutcome::rejected(loop_name, LoopState::Off, "loop cannot listen"));
        }

        let Some(worker) = lock_state(&self.state).claim_idle(loop_name) else {
            log::info!("{}: no idle worker, staying OFF", loop_name);
            return Ok(CommandOutcome::busy(loop_name));
        };

        let failures = self.run(&worker, &[WorkerOp::join(loop_name), WorkerOp::Mute]).await;

        let mut state = lock_state(&self.state);
        if !failures.is_empty() && !self.policy.commits_on_failure() {
            state.unclaim(&worker.name);
            log::warn!("{}: join on {} failed, staying OFF", loop_name, worker.name);
            return Ok(CommandOutcome::failed(loop_name, LoopState::Off, failures));
        }
        state.commit(loop_name, LoopState::Listen, &worker.name)?;

        log::info!("{}: OFF -> LISTEN on {}", loop_name, worker.name);
        Ok(CommandOutcome::committed(loop_name, LoopState::Listen, Some(&worker.name), failures))
    }

    /// LISTEN -> TALK: mute and demote the current talker first, then join
    /// and talk on this loop's worker
    async fn grant_talk(&self, def: &LoopDef, record: &LoopRecord) -> Result<CommandOutcome> {
        let loop_name = def.name.as_str();
        let worker = self.assigned(record)?;
        let mut failures = Vec::new();

        let talker = lock_state(&self.state).talking_except(loop_name);
        if let Some((other, other_worker)) = talker {
            let demotion = self.run(&other_worker, &[WorkerOp::Mute]).await;
            if !demotion.is_empty() && !self.policy.commits_on_failure() {
                log::warn!("{}: could not mute {} on {}, not granting TALK", loop_name, other, other_worker.name);
                return Ok(CommandOutcome::failed(loop_name, LoopState::Listen, demotion));
            }
            lock_state(&self.state).commit(&other, LoopState::Listen, &other_worker.name)?;
            log::info!("{}: TALK -> LISTEN (preempted by {})", other, loop_name);
            failures.extend(demotion);
        }

        let grant = self.run(&worker, &[WorkerOp::join(loop_name), WorkerOp::Talk]).await;
        if !grant.is_empty() && !self.policy.commits_on_failure() {
            failures.extend(grant);
            return Ok(CommandOutcome::failed(loop_name, LoopState::Listen, failures));
        }
        failures.extend(grant);
        lock_state(&self.state).commit(loop_name, LoopState::Talk, &worker.name)?;

        log::info!("{}: LISTEN -> TALK on {}", loop_name, worker.name);
        Ok(CommandOutcome::committed(loop_name, LoopState::Talk, Some(&worker.name), failures))
    }

    /// TALK -> LISTEN
    async fn demote(&self, def: &LoopDef, record: &LoopRecord) -> Result<CommandOutcome> {
        let loop_name = def.name.as_str();
        let worker = self.assigned(record)?;

        let failures = self.run(&worker, &[WorkerOp::Mute]).await;
        if !failures.is_empty() && !self.policy.commits_on_failure() {
            return Ok(CommandOutcome::failed(loop_name, LoopState::Talk, failures));
        }
        lock_state(&self.state).commit(loop_name, LoopState::Listen, &worker.name)?;

        log::info!("{}: TALK -> LISTEN on {}", loop_name, worker.name);
        Ok(CommandOutcome::committed(loop_name, LoopState::Listen, Some(&worker.name), failures))
    }

    /// Issue operations in order, capturing every failure. A failed call does
    /// not stop the ones after it.
    async fn run(&self, worker: &WorkerRef, ops: &[WorkerOp]) -> Vec<OpFailure> {
        let mut failures = Vec::new();
        for op in ops {
            if let Err(e) = self.client.send(worker, op).await {
                log::warn!("{} on {} failed: {}", op, worker.name, e);
                failures.push(OpFailure::new(&worker.name, op, &e));
            }
        }
        failures
    }

    fn snapshot(&self, loop_name: &str) -> Result<(LoopDef, LoopRecord)> {
        let state = lock_state(&self.state);
        let def = state
            .loop_def(loop_name)
            .cloned()
            .ok_or_else(|| VoxError::LoopNotFound(loop_name.to_string()))?;
        let record = state.record(loop_name).cloned().unwrap_or_default();
        Ok((def, record))
    }

    fn assigned(&self, record: &LoopRecord) -> Result<WorkerRef> {
        let worker = record
            .assigned_worker
            .as_deref()
            .ok_or_else(|| VoxError::InvalidState(format!("{} loop has no worker", record.state)))?;
        self.worker_ref(worker)
    }

    fn worker_ref(&self, worker: &str) -> Result<WorkerRef> {
        lock_state(&self.state)
            .worker_ref(worker)
            .ok_or_else(|| VoxError::InvalidState(format!("unknown worker {}", worker)))
    }
}
