//! Worker Directory and least-recently-used allocator

use crate::clock::StampClock;
use crate::domain::{Worker, WorkerRef, WorkerSpec};
use crate::error::{Result, VoxError};

/// The pool of relay workers
///
/// Workers are created once from the static pool definition and never
/// removed; only their assignment and recency change.
#[derive(Debug, Clone)]
pub struct WorkerDirectory {
    workers: Vec<Worker>,
    clock: StampClock,
}

impl WorkerDirectory {
    pub fn new(workers: Vec<Worker>) -> Self {
        Self {
            workers,
            clock: StampClock::new(),
        }
    }

    /// Build the directory from pool configuration
    pub fn from_specs(specs: &[WorkerSpec], default_host: &str) -> Self {
        Self::new(
            specs
                .iter()
                .map(|spec| Worker::new(spec.name.clone(), spec.endpoint(default_host)))
                .collect(),
        )
    }

    /// The idle worker that has been idle longest; ties go to pool order
    pub fn find_idle(&self) -> Option<&Worker> {
        self.workers.iter().filter(|w| w.is_idle()).min_by_key(|w| w.last_used)
    }

    /// Assign an idle worker to a loop
    pub fn claim(&mut self, worker: &str, loop_name: &str) -> Result<WorkerRef> {
        let stamp = self.clock.next();
        let entry = self
            .workers
            .iter_mut()
            .find(|w| w.name == worker)
            .ok_or_else(|| VoxError::InvalidState(format!("unknown worker {}", worker)))?;

        if let Some(current) = &entry.assigned {
            return Err(VoxError::InvalidState(format!(
                "worker {} already assigned to {}",
                worker, current
            )));
        }

        entry.assigned = Some(loop_name.to_string());
        entry.last_used = stamp;
        log::debug!("Claimed worker {} for loop {}", worker, loop_name);
        Ok(entry.to_ref())
    }

    /// Return a worker to the idle set. Returns false if it was already idle.
    pub fn release(&mut self, worker: &str) -> bool {
        let Some(entry) = self.workers.iter_mut().find(|w| w.name == worker) else {
            log::warn!("Release of unknown worker {} ignored", worker);
            return false;
        };

        match entry.assigned.take() {
            Some(loop_name) => {
                entry.last_used = self.clock.next();
                log::debug!("Released worker {} from loop {}", worker, loop_name);
                true
            }
            None => false,
        }
    }

    pub fn get(&self, worker: &str) -> Option<&Worker> {
        self.workers.iter().find(|w| w.name == worker)
    }

    pub fn workers(&self) -> &[Worker] {
        &self.workers
    }

    /// Addressing handles for every worker, in pool order
    pub fn refs(&self) -> Vec<WorkerRef> {
        self.workers.iter().map(Worker::to_ref).collect()
    }

    pub fn idle_count(&self) -> usize {
        self.workers.iter().filter(|w| w.is_idle()).count()
    }

    pub fn len(&self) -> usize {
        self.workers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.workers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pool(n: usize) -> WorkerDirectory {
        let specs: Vec<WorkerSpec> = (1..=n)
            .map(|i| WorkerSpec::new(format!("BOT{}", i), 6000 + i as u16))
            .collect();
        WorkerDirectory::from_specs(&specs, "127.0.0.1")
    }

    #[test]
    fn test_from_specs() {
        let dir = pool(3);
        assert_eq!(dir.len(), 3);
        assert_eq!(dir.get("BOT2").unwrap().endpoint, "http://127.0.0.1:6002");
        assert_eq!(dir.idle_count(), 3);
    }

    #[test]
    fn test_find_idle_fresh_pool_uses_pool_order() {
        let dir = pool(3);
        assert_eq!(dir.find_idle().unwrap().name, "BOT1");
    }

    #[test]
    fn test_find_idle_least_recently_used() {
        let mut dir = pool(3);
        // Stamp the workers in order BOT3, BOT1, BOT2
        for name in ["BOT3", "BOT1", "BOT2"] {
            dir.claim(name, "X").unwrap();
            assert!(dir.release(name));
        }
        assert_eq!(dir.find_idle().unwrap().name, "BOT3");

        dir.claim("BOT3", "A").unwrap();
        assert_eq!(dir.find_idle().unwrap().name, "BOT1");
    }

    #[test]
    fn test_find_idle_none_when_exhausted() {
        let mut dir = pool(2);
        dir.claim("BOT1", "A").unwrap();
        dir.claim("BOT2", "B").unwrap();
        assert!(dir.find_idle().is_none());
        assert_eq!(dir.idle_count(), 0);
    }

    #[test]
    fn test_claim_sets_assignment_and_stamp() {
        let mut dir = pool(1);
        let worker = dir.claim("BOT1", "CMD").unwrap();
        assert_eq!(worker.name, "BOT1");
        let entry = dir.get("BOT1").unwrap();
        assert_eq!(entry.assigned.as_deref(), Some("CMD"));
        assert!(entry.last_used > 0);
    }

    #[test]
    fn test_claim_busy_worker_fails() {
        let mut dir = pool(1);
        dir.claim("BOT1", "CMD").unwrap();
        let err = dir.claim("BOT1", "OBS").unwrap_err();
        assert!(matches!(err, VoxError::InvalidState(_)));
        assert_eq!(dir.get("BOT1").unwrap().assigned.as_deref(), Some("CMD"));
    }

    #[test]
    fn test_claim_unknown_worker_fails() {
        let mut dir = pool(1);
        assert!(dir.claim("BOT9", "CMD").is_err());
    }

    #[test]
    fn test_release_is_idempotent() {
        let mut dir = pool(1);
        dir.claim("BOT1", "CMD").unwrap();
        assert!(dir.release("BOT1"));
        let stamp = dir.get("BOT1").unwrap().last_used;

        assert!(!dir.release("BOT1"));
        let entry = dir.get("BOT1").unwrap();
        assert!(entry.is_idle());
        assert_eq!(entry.last_used, stamp);
    }

    #[test]
    fn test_release_unknown_worker() {
        let mut dir = pool(1);
        assert!(!dir.release("BOT9"));
    }
}
