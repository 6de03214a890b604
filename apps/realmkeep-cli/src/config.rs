use std::path::{Path, PathBuf};

use realmkeep_decay::DecayConfig;
use realmkeep_kernel::{DescriptorTable, ObjectDescriptor, WorldState};
use realmkeep_sweep::DriverConfig;
use realmkeep_zone::{RealmConfig, RealmError};
use serde::{Deserialize, Serialize};

pub const GOLD: u32 = 0x0EED;
pub const BACKPACK: u32 = 0x0E75;
pub const CORPSE: u32 = 0x2006;
pub const BLOOD: u32 = 0x122A;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: serde_yaml::Error,
    },
    #[error(transparent)]
    Realm(#[from] RealmError),
}

/// Everything needed to stand up one shard's live world.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ShardConfig {
    pub realms: Vec<RealmConfig>,
    pub decay: DecayConfig,
    pub driver: DriverConfig,
    pub descriptors: Vec<ObjectDescriptor>,
}

impl Default for ShardConfig {
    fn default() -> Self {
        Self {
            realms: vec![
                RealmConfig::default(),
                RealmConfig {
                    name: "ilshenar".to_string(),
                    width: 2304,
                    height: 1600,
                },
            ],
            decay: DecayConfig::default(),
            driver: DriverConfig::default(),
            descriptors: vec![
                ObjectDescriptor {
                    objtype: GOLD,
                    decay_delay_secs: Some(3600),
                    description: Some("gold coin".to_string()),
                    ..ObjectDescriptor::default()
                },
                ObjectDescriptor {
                    objtype: BACKPACK,
                    decay_delay_secs: Some(3600),
                    description: Some("backpack".to_string()),
                    ..ObjectDescriptor::default()
                },
                ObjectDescriptor {
                    objtype: CORPSE,
                    corpse: true,
                    decays_on_structures: true,
                    destroy_script: Some("misc/oncorpsedecay".to_string()),
                    decay_delay_secs: Some(420),
                    description: Some("corpse".to_string()),
                },
                ObjectDescriptor {
                    objtype: BLOOD,
                    decays_on_structures: true,
                    decay_delay_secs: Some(60),
                    description: Some("blood".to_string()),
                    ..ObjectDescriptor::default()
                },
            ],
        }
    }
}

impl ShardConfig {
    /// Load a YAML config. Missing sections keep their defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_yaml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn descriptor_table(&self) -> DescriptorTable {
        self.descriptors.iter().cloned().collect()
    }

    /// Build the realms and install the descriptor table.
    pub fn build_world(&self) -> Result<WorldState, ConfigError> {
        let world = WorldState::new(&self.realms, self.decay.clone())?;
        Ok(world.with_descriptors(self.descriptor_table()))
    }
}
