/// In-memory action catalog registry using ArcSwap
///
/// Loads all catalog entries once and pre-compiles their contracts, so the
/// planning and execution paths never touch the database or compile a schema.
/// Reloads (after a reseed) swap the whole snapshot atomically without
/// blocking concurrent planning or execution.

use anyhow::Result;
use arc_swap::ArcSwap;
use std::{collections::HashMap, sync::Arc};

use crate::catalog::storage::CatalogStorage;
use crate::catalog::types::ActionCatalogEntry;
use crate::schema::Contract;

/// A catalog entry with its contracts compiled for checking
#[derive(Debug)]
pub struct CompiledAction {
    pub entry: ActionCatalogEntry,
    pub input_contract: Option<Contract>,
    pub output_contract: Option<Contract>,
}

/// One immutable view of the whole catalog
#[derive(Debug, Default)]
struct CatalogSnapshot {
    by_key: HashMap<String, Arc<CompiledAction>>,
    /// Seed order, kept stable for display and prompt construction
    ordered: Vec<Arc<CompiledAction>>,
}

/// Lock-free, read-only catalog registry
///
/// The single source of truth for catalog lookups during planning and
/// execution. The engine must never mutate it; the only writer is
/// `load`/`reload`, which swaps the snapshot pointer atomically.
#[derive(Debug)]
pub struct CatalogRegistry {
    snapshot: ArcSwap<CatalogSnapshot>,
}

impl CatalogRegistry {
    /// Build a registry from storage, compiling every contract
    ///
    /// Fails on the first malformed contract; a catalog that does not compile
    /// is a startup defect, not a per-request condition.
    pub async fn load(storage: &CatalogStorage) -> Result<Self> {
        let entries = storage.load_all_entries().await?;
        let registry = Self::from_entries(entries)?;
        tracing::info!(
            "Initialized catalog registry with {} actions",
            registry.snapshot.load().ordered.len()
        );
        Ok(registry)
    }

    /// Build a registry directly from entries (startup helper and test seam)
    pub fn from_entries(entries: Vec<ActionCatalogEntry>) -> Result<Self> {
        let snapshot = Self::compile_snapshot(entries)?;
        Ok(Self {
            snapshot: ArcSwap::new(Arc::new(snapshot)),
        })
    }

    /// Re-read the catalog from storage and swap the snapshot atomically
    pub async fn reload(&self, storage: &CatalogStorage) -> Result<()> {
        let entries = storage.load_all_entries().await?;
        let snapshot = Self::compile_snapshot(entries)?;
        self.snapshot.store(Arc::new(snapshot));
        tracing::info!("Hot-reloaded catalog registry");
        Ok(())
    }

    /// Look up a compiled action by key (lock-free read)
    pub fn lookup(&self, key: &str) -> Option<Arc<CompiledAction>> {
        self.snapshot.load().by_key.get(key).cloned()
    }

    /// All compiled actions in stable seed order
    pub fn list_all(&self) -> Vec<Arc<CompiledAction>> {
        self.snapshot.load().ordered.clone()
    }

    /// All catalog entries in stable seed order (for prompts and API listings)
    pub fn entries(&self) -> Vec<ActionCatalogEntry> {
        self.snapshot
            .load()
            .ordered
            .iter()
            .map(|a| a.entry.clone())
            .collect()
    }

    fn compile_snapshot(entries: Vec<ActionCatalogEntry>) -> Result<CatalogSnapshot> {
        let mut by_key = HashMap::with_capacity(entries.len());
        let mut ordered = Vec::with_capacity(entries.len());

        for entry in entries {
            let input_contract = entry
                .input_contract
                .clone()
                .map(Contract::compile)
                .transpose()
                .map_err(|e| anyhow::anyhow!("{}: {e}", entry.key))?;
            let output_contract = entry
                .output_contract
                .clone()
                .map(Contract::compile)
                .transpose()
                .map_err(|e| anyhow::anyhow!("{}: {e}", entry.key))?;

            let compiled = Arc::new(CompiledAction {
                entry,
                input_contract,
                output_contract,
            });
            by_key.insert(compiled.entry.key.clone(), Arc::clone(&compiled));
            ordered.push(compiled);
        }

        Ok(CatalogSnapshot { by_key, ordered })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::seed::builtin_actions;

    #[test]
    fn lookup_and_order_are_stable() {
        let registry = CatalogRegistry::from_entries(builtin_actions()).unwrap();

        assert!(registry.lookup("stripe.verify_payment").is_some());
        assert!(registry.lookup("acme.unknown_action").is_none());

        let keys: Vec<String> = registry.entries().iter().map(|e| e.key.clone()).collect();
        let seeded: Vec<String> = builtin_actions().iter().map(|e| e.key.clone()).collect();
        assert_eq!(keys, seeded);
    }

    #[test]
    fn contracts_are_precompiled() {
        let registry = CatalogRegistry::from_entries(builtin_actions()).unwrap();
        let action = registry.lookup("stripe.verify_payment").unwrap();
        let example = action.entry.examples.as_ref().unwrap().input.as_ref().unwrap();
        assert!(action.input_contract.as_ref().unwrap().check(example).ok);
    }

    #[test]
    fn malformed_contract_fails_load() {
        let mut entries = builtin_actions();
        entries[1].input_contract = Some(serde_json::json!({ "type": 42 }));
        assert!(CatalogRegistry::from_entries(entries).is_err());
    }
}
