//! Static, insertion-ordered registry of configured rigs and their probes.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use super::claymore::ClaymoreProbe;
use super::probe::RigProbe;
use super::RigConfig;

/// One registered rig: its configuration plus the probe used to reach it.
#[derive(Clone)]
pub struct RigEntry {
    config: RigConfig,
    probe: Arc<dyn RigProbe>,
}

impl std::fmt::Debug for RigEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RigEntry")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl RigEntry {
    /// Pair a rig config with the probe that reaches it.
    pub fn new(config: RigConfig, probe: Arc<dyn RigProbe>) -> Self {
        Self { config, probe }
    }

    /// Rig name.
    pub fn name(&self) -> &str {
        &self.config.name
    }

    /// Static configuration.
    pub fn config(&self) -> &RigConfig {
        &self.config
    }

    /// Probe for this rig.
    pub fn probe(&self) -> &dyn RigProbe {
        self.probe.as_ref()
    }
}

/// Immutable mapping from rig name to [`RigEntry`], kept in config order.
#[derive(Debug, Clone, Default)]
pub struct RigRegistry {
    entries: Vec<RigEntry>,
}

impl RigRegistry {
    /// Build a registry from entries, rejecting duplicate names.
    ///
    /// # Errors
    ///
    /// Returns an error if two entries share a name.
    pub fn new(entries: Vec<RigEntry>) -> anyhow::Result<Self> {
        let mut seen = HashSet::new();
        for entry in &entries {
            anyhow::ensure!(
                seen.insert(entry.name().to_owned()),
                "duplicate rig name: {}",
                entry.name()
            );
        }
        Ok(Self { entries })
    }

    /// Build a registry of Claymore probes from rig configs.
    ///
    /// # Errors
    ///
    /// Returns an error if two rigs share a name.
    pub fn from_configs(rigs: &[RigConfig], timeout: Duration) -> anyhow::Result<Self> {
        let entries = rigs
            .iter()
            .map(|rig| {
                let probe: Arc<dyn RigProbe> = Arc::new(ClaymoreProbe::from_config(rig, timeout));
                RigEntry::new(rig.clone(), probe)
            })
            .collect();
        Self::new(entries)
    }

    /// Look up a rig by exact name.
    pub fn get(&self, name: &str) -> Option<&RigEntry> {
        self.entries.iter().find(|e| e.name() == name)
    }

    /// Whether a rig with this name is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// The only rig, when exactly one is registered.
    pub fn sole(&self) -> Option<&RigEntry> {
        match self.entries.as_slice() {
            [only] => Some(only),
            _ => None,
        }
    }

    /// Iterate rigs in configuration order.
    pub fn iter(&self) -> impl Iterator<Item = &RigEntry> {
        self.entries.iter()
    }

    /// Number of registered rigs.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no rigs are registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
