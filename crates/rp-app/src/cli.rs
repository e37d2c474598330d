//! Command-line arguments

use std::path::PathBuf;
use std::str::FromStr;

use clap::Parser;
use rp_slot_lab::{MachineConfig, TimingConfig, TimingProfile};
use rp_state::{SnapshotConfig, SnapshotStore};

#[derive(Parser, Debug)]
#[command(name = "reelpick", version, about = "Slot-style random picker")]
pub struct Cli {
    /// Snapshot file (defaults to the per-user data directory)
    #[arg(long, value_name = "PATH")]
    pub snapshot: Option<PathBuf>,

    /// Fixed RNG seed for reproducible draws
    #[arg(long)]
    pub seed: Option<u64>,

    /// Reveal timing: normal, turbo or instant
    #[arg(long, default_value = "normal")]
    pub timing: TimingProfile,

    /// Remove the stored session and exit
    #[arg(long)]
    pub clear: bool,

    /// Run a draw once the session is ready
    #[arg(long)]
    pub draw: bool,

    /// Start a new session with this title
    #[arg(long)]
    pub title: Option<String>,

    /// Slot contents as comma-separated items, each `TEXT` or `TEXT@IMAGE`
    #[arg(long = "slot", value_name = "ITEMS", requires = "title")]
    pub slots: Vec<SlotSpec>,

    /// Print the final session as JSON
    #[arg(long)]
    pub json: bool,
}

impl Cli {
    pub fn snapshot_store(&self) -> SnapshotStore {
        match &self.snapshot {
            Some(path) => SnapshotStore::new(SnapshotConfig::at(path)),
            None => SnapshotStore::default(),
        }
    }

    pub fn machine_config(&self) -> MachineConfig {
        MachineConfig {
            timing: TimingConfig::from_profile(self.timing),
            seed: self.seed,
            ..MachineConfig::default()
        }
    }
}

/// One `--slot` argument
#[derive(Debug, Clone, PartialEq)]
pub struct SlotSpec {
    pub items: Vec<ItemSpec>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ItemSpec {
    pub text: String,
    pub image: Option<PathBuf>,
}

impl FromStr for ItemSpec {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (text, image) = match s.rsplit_once('@') {
            Some((text, path)) if !path.trim().is_empty() => {
                (text, Some(PathBuf::from(path.trim())))
            }
            _ => (s, None),
        };
        let text = text.trim().to_string();
        if text.is_empty() && image.is_none() {
            return Err(format!("Empty item in '{}'", s));
        }
        Ok(Self { text, image })
    }
}

impl FromStr for SlotSpec {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let items = s
            .split(',')
            .map(ItemSpec::from_str)
            .collect::<Result<Vec<_>, _>>()?;
        if items.len() > rp_core::MAX_ITEMS_PER_SLOT {
            return Err(format!(
                "A slot holds at most {} items",
                rp_core::MAX_ITEMS_PER_SLOT
            ));
        }
        Ok(Self { items })
    }
}
