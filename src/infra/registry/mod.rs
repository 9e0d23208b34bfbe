//! Known-entity registry manager.
//!
//! Thread-safe in-memory registries of labeled exchange, bridge, and mixer
//! addresses. Entries load from an optional JSON file at startup, fall back
//! to a small built-in seed set, and can be edited at runtime through the
//! admin API. The engine never sees this manager; it receives an immutable
//! [`AddressRegistries`] snapshot per analysis.

use std::path::Path;

use dashmap::DashMap;
use tracing::{info, warn};

use crate::domain::{AddressRegistries, AppError, EntityKind, KnownEntity};

/// Thread-safe registry manager keyed by address.
#[derive(Debug, Default)]
pub struct RegistryManager {
    store: DashMap<String, KnownEntity>,
}

impl RegistryManager {
    /// Create an empty manager.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a manager seeded with well-known mainnet entities.
    #[must_use]
    pub fn with_defaults() -> Self {
        let manager = Self::new();
        for entity in default_entities() {
            manager.store.insert(entity.address.clone(), entity);
        }
        manager
    }

    /// Load entries from a JSON file (an array of [`KnownEntity`]),
    /// merged over the built-in seed set.
    pub fn from_file(path: &Path) -> Result<Self, AppError> {
        let manager = Self::with_defaults();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            AppError::Config(crate::domain::ConfigError::Invalid {
                key: "REGISTRY_PATH".to_string(),
                message: format!("cannot read {}: {e}", path.display()),
            })
        })?;
        let entities: Vec<KnownEntity> = serde_json::from_str(&raw)?;
        let count = entities.len();
        for entity in entities {
            manager.store.insert(entity.address.clone(), entity);
        }
        info!(count, path = %path.display(), "Loaded registry entries from file");
        Ok(manager)
    }

    /// Immutable snapshot for one engine run, partitioned by kind.
    /// Entries are sorted by address so snapshots are deterministic.
    #[must_use]
    pub fn snapshot(&self) -> AddressRegistries {
        let mut exchanges = Vec::new();
        let mut bridges = Vec::new();
        let mut mixers = Vec::new();

        for entry in self.store.iter() {
            let entity = entry.value().clone();
            match entity.kind {
                EntityKind::CexHotWallet | EntityKind::DexProgram => exchanges.push(entity),
                EntityKind::Bridge => bridges.push(entity),
                EntityKind::Mixer => mixers.push(entity),
                EntityKind::Defi => exchanges.push(entity),
            }
        }
        exchanges.sort_by(|a, b| a.address.cmp(&b.address));
        bridges.sort_by(|a, b| a.address.cmp(&b.address));
        mixers.sort_by(|a, b| a.address.cmp(&b.address));

        AddressRegistries {
            exchanges,
            bridges,
            mixers,
        }
    }

    /// Add or replace an entry. Returns true if an entry was replaced.
    pub fn upsert(&self, entity: KnownEntity) -> bool {
        let replaced = self.store.insert(entity.address.clone(), entity).is_some();
        if replaced {
            warn!("Registry entry replaced");
        }
        replaced
    }

    /// Remove an entry by address. Returns the removed entity, if any.
    pub fn remove(&self, address: &str) -> Option<KnownEntity> {
        self.store.remove(address).map(|(_, entity)| entity)
    }

    /// All entries, sorted by address.
    #[must_use]
    pub fn list(&self) -> Vec<KnownEntity> {
        let mut entries: Vec<KnownEntity> =
            self.store.iter().map(|e| e.value().clone()).collect();
        entries.sort_by(|a, b| a.address.cmp(&b.address));
        entries
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.store.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }
}

/// Built-in seed entries for well-known mainnet programs and hot wallets.
fn default_entities() -> Vec<KnownEntity> {
    vec![
        KnownEntity::new(
            "5tzFkiKscXHK5ZXCGbXZxdw7gTjjD1mBwuoFbhUvuAi9",
            "Binance 1",
            EntityKind::CexHotWallet,
        ),
        KnownEntity::new(
            "2ojv9BAiHUrvsm9gxDe7fJSzbNZSJcxZvf8dqmWGHG8S",
            "Coinbase 1",
            EntityKind::CexHotWallet,
        ),
        KnownEntity::new(
            "FWznbcNXWQuHTawe9RxvQ2LdCENssh12dsznf4RiouN5",
            "Kraken",
            EntityKind::CexHotWallet,
        ),
        KnownEntity::new(
            "675kPX9MHTjS2zt1qfr1NYHuzeLXfQM9H24wFSUt1Mp8",
            "Raydium AMM v4",
            EntityKind::DexProgram,
        ),
        KnownEntity::new(
            "JUP6LkbZbjS1jKKwapdHNy74zcZ3tLUZoi5QNyVTaV4",
            "Jupiter Aggregator v6",
            EntityKind::DexProgram,
        ),
        KnownEntity::new(
            "worm2ZoG2kUd4vFXhvjh93UUH596ayRfgQ2MgjNMTth",
            "Wormhole Core Bridge",
            EntityKind::Bridge,
        ),
        KnownEntity::new(
            "wormDTUJ6AWPNvk59vGQbDvGJmqbDTdgWgAqcLBCgUb",
            "Wormhole Portal Token Bridge",
            EntityKind::Bridge,
        ),
        KnownEntity::new(
            "A11bzrZyDejJzXQSzRjV8cLPqHDtbcqRkWF2SvVNA9Mb",
            "Allbridge Core",
            EntityKind::Bridge,
        ),
        KnownEntity::new(
            "1MixREhUu6cdU1absa9PgPnqxGV41CujooNZ6FRqeWM",
            "SolMixer",
            EntityKind::Mixer,
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_partition_by_kind() {
        let manager = RegistryManager::with_defaults();
        let snapshot = manager.snapshot();
        assert!(!snapshot.exchanges.is_empty());
        assert!(!snapshot.bridges.is_empty());
        assert!(!snapshot.mixers.is_empty());
    }

    #[test]
    fn test_snapshot_is_deterministic() {
        let manager = RegistryManager::with_defaults();
        assert_eq!(manager.snapshot(), manager.snapshot());
    }

    #[test]
    fn test_upsert_and_remove() {
        let manager = RegistryManager::new();
        let entity = KnownEntity::new(
            "9xQeWvG816bUx9EPjHmaT23yvVM2ZWbrrpZb9PusVFin",
            "Test CEX",
            EntityKind::CexHotWallet,
        );

        assert!(!manager.upsert(entity.clone()));
        assert_eq!(manager.len(), 1);
        // Replacing the same address reports true.
        assert!(manager.upsert(entity.clone()));

        let removed = manager.remove(&entity.address).unwrap();
        assert_eq!(removed.label, "Test CEX");
        assert!(manager.is_empty());
    }

    #[test]
    fn test_from_file_merges_over_defaults() {
        let dir = std::env::temp_dir().join("privacy-scorer-registry-test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("registry.json");
        std::fs::write(
            &path,
            r#"[{"address":"9xQeWvG816bUx9EPjHmaT23yvVM2ZWbrrpZb9PusVFin","label":"Custom CEX","kind":"cex_hot_wallet"}]"#,
        )
        .unwrap();

        let manager = RegistryManager::from_file(&path).unwrap();
        assert!(manager.len() > 1);
        assert!(
            manager
                .list()
                .iter()
                .any(|e| e.label == "Custom CEX")
        );

        std::fs::remove_file(&path).ok();
    }
}
