//! Loop catalog - the role-specific set of loop definitions
//!
//! Catalogs are read through the [`CatalogSource`] trait so the control plane
//! never cares where loop definitions live. [`FileCatalog`] reads the
//! `loops_<ROLE>.txt` JSON files; [`StaticCatalog`] serves fixed sets.

pub mod file;
pub mod roles;

pub use file::FileCatalog;
pub use roles::{DEFAULT_ROLE, KNOWN_ROLES, is_known_role, normalize_role};

use std::collections::{HashMap, HashSet};

use crate::domain::LoopDef;
use crate::error::Result;

/// Something that can produce the loop set for a role
pub trait CatalogSource: Send + Sync {
    /// Load the loops for `role`, failing on unreadable or malformed data
    fn try_load(&self, role: &str) -> Result<Vec<LoopDef>>;

    /// Load the loops for `role`, falling back to an empty set on failure
    fn load(&self, role: &str) -> Vec<LoopDef> {
        match self.try_load(role) {
            Ok(loops) => dedup_loops(loops),
            Err(e) => {
                log::warn!("Failed to load catalog for role {}: {}; using empty loop set", role, e);
                Vec::new()
            }
        }
    }
}

/// Drop later definitions that reuse an earlier loop name
pub fn dedup_loops(loops: Vec<LoopDef>) -> Vec<LoopDef> {
    let mut seen = HashSet::new();
    loops
        .into_iter()
        .filter(|def| {
            let fresh = seen.insert(def.name.clone());
            if !fresh {
                log::warn!("Duplicate loop '{}' in catalog ignored", def.name);
            }
            fresh
        })
        .collect()
}

/// In-memory catalog keyed by role
#[derive(Debug, Clone, Default)]
pub struct StaticCatalog {
    roles: HashMap<String, Vec<LoopDef>>,
}

impl StaticCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add (or replace) the loop set for a role
    pub fn with_role(mut self, role: &str, loops: Vec<LoopDef>) -> Self {
        self.roles.insert(normalize_role(role), loops);
        self
    }
}

impl CatalogSource for StaticCatalog {
    fn try_load(&self, role: &str) -> Result<Vec<LoopDef>> {
        self.roles
            .get(&normalize_role(role))
            .cloned()
            .ok_or_else(|| crate::error::VoxError::Catalog(format!("no loops defined for role {}", role)))
    }
}
