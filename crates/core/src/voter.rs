//! Voters, their organizations and levels
//!
//! The voter directory is owned elsewhere; the vetting engine only reads it.

use std::collections::BTreeSet;
use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{CoreError, CoreResult, LocaleId};

/// Numeric voter identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VoterId(pub u32);

impl fmt::Display for VoterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Affiliation of a voter. Agreement is counted per organization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Organization {
    Adobe,
    Apple,
    Cldr,
    Gnome,
    Google,
    Guest,
    Ibm,
    Meta,
    Microsoft,
    Mozilla,
    Oracle,
    Sil,
    Surveytool,
    Wikimedia,
}

impl Organization {
    pub const ALL: [Organization; 14] = [
        Organization::Adobe,
        Organization::Apple,
        Organization::Cldr,
        Organization::Gnome,
        Organization::Google,
        Organization::Guest,
        Organization::Ibm,
        Organization::Meta,
        Organization::Microsoft,
        Organization::Mozilla,
        Organization::Oracle,
        Organization::Sil,
        Organization::Surveytool,
        Organization::Wikimedia,
    ];

    /// Organizations with a seat on the technical committee. Their vetters
    /// carry extra weight.
    pub fn is_tc_org(&self) -> bool {
        matches!(
            self,
            Organization::Adobe
                | Organization::Apple
                | Organization::Google
                | Organization::Ibm
                | Organization::Meta
                | Organization::Microsoft
        )
    }

    pub fn name(&self) -> &'static str {
        match self {
            Organization::Adobe => "adobe",
            Organization::Apple => "apple",
            Organization::Cldr => "cldr",
            Organization::Gnome => "gnome",
            Organization::Google => "google",
            Organization::Guest => "guest",
            Organization::Ibm => "ibm",
            Organization::Meta => "meta",
            Organization::Microsoft => "microsoft",
            Organization::Mozilla => "mozilla",
            Organization::Oracle => "oracle",
            Organization::Sil => "sil",
            Organization::Surveytool => "surveytool",
            Organization::Wikimedia => "wikimedia",
        }
    }
}

impl fmt::Display for Organization {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Organization {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.to_ascii_lowercase();
        Organization::ALL
            .iter()
            .copied()
            .find(|org| org.name() == lower)
            .ok_or_else(|| CoreError::UnknownOrganization(s.to_string()))
    }
}

/// Seniority tier, ordered from least to most trusted
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Anonymous,
    Locked,
    Street,
    Vetter,
    Expert,
    Manager,
    Tc,
    Admin,
}

impl Level {
    /// Weight of a vote cast at this level by a member of `org`
    pub fn votes(&self, org: Organization) -> u32 {
        match self {
            Level::Anonymous | Level::Locked => 0,
            Level::Street => 1,
            Level::Vetter if org.is_tc_org() => 6,
            Level::Vetter => 4,
            Level::Expert => 8,
            Level::Manager => 4,
            Level::Tc => 20,
            Level::Admin => 100,
        }
    }

    /// Levels allowed to cast a vote at a reduced weight
    pub fn can_override(&self) -> bool {
        *self >= Level::Tc
    }

    /// Weight used when this level votes at reduced strength
    pub fn reduced_votes(&self, org: Organization) -> u32 {
        Level::Vetter.votes(org).min(self.votes(org))
    }

    /// Levels that may vote in any locale regardless of assignment
    pub fn can_vote_anywhere(&self) -> bool {
        matches!(self, Level::Manager | Level::Tc | Level::Admin)
    }
}

impl FromStr for Level {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "anonymous" => Ok(Level::Anonymous),
            "locked" => Ok(Level::Locked),
            "street" => Ok(Level::Street),
            "vetter" => Ok(Level::Vetter),
            "expert" => Ok(Level::Expert),
            "manager" => Ok(Level::Manager),
            "tc" => Ok(Level::Tc),
            "admin" => Ok(Level::Admin),
            _ => Err(CoreError::UnknownLevel(s.to_string())),
        }
    }
}

/// A registered voter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoterInfo {
    pub id: VoterId,
    #[serde(default)]
    pub name: String,
    pub organization: Organization,
    pub level: Level,
    /// Locales this voter may work in; none means unrestricted
    #[serde(default)]
    pub locales: Option<BTreeSet<LocaleId>>,
}

impl VoterInfo {
    pub fn new(id: u32, organization: Organization, level: Level) -> Self {
        Self {
            id: VoterId(id),
            name: format!("voter-{}", id),
            organization,
            level,
            locales: None,
        }
    }

    /// Restrict this voter to the given locales
    pub fn with_locales<I: IntoIterator<Item = LocaleId>>(mut self, locales: I) -> Self {
        self.locales = Some(locales.into_iter().collect());
        self
    }

    /// Weight of this voter's vote
    pub fn votes(&self) -> u32 {
        self.level.votes(self.organization)
    }

    /// Whether the voter's locale assignment covers `locale`
    pub fn covers_locale(&self, locale: &LocaleId) -> bool {
        match &self.locales {
            None => true,
            Some(assigned) => assigned
                .iter()
                .any(|l| l.is_ancestor_or_self_of(locale) || l.language() == locale.language()),
        }
    }
}

/// Read access to the registry of voters
pub trait VoterDirectory: Send + Sync {
    /// Look up a voter by id
    fn get(&self, id: VoterId) -> Option<VoterInfo>;

    fn contains(&self, id: VoterId) -> bool {
        self.get(id).is_some()
    }
}

#[derive(Debug, Deserialize)]
struct VoterFile {
    #[serde(default)]
    voters: Vec<VoterInfo>,
}

/// In-memory voter directory
#[derive(Debug, Default)]
pub struct MemoryVoterDirectory {
    voters: DashMap<VoterId, VoterInfo>,
}

impl MemoryVoterDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a directory from a list of voters
    pub fn with_voters<I: IntoIterator<Item = VoterInfo>>(voters: I) -> Self {
        let directory = Self::new();
        for voter in voters {
            directory.insert(voter);
        }
        directory
    }

    /// Load a directory from YAML of the form `voters: [...]`
    pub fn from_yaml_str(yaml: &str) -> CoreResult<Self> {
        let file: VoterFile = serde_yaml::from_str(yaml)?;
        Ok(Self::with_voters(file.voters))
    }

    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> CoreResult<Self> {
        let contents = fs::read_to_string(path.as_ref())?;
        let directory = Self::from_yaml_str(&contents)?;
        info!("Loaded {} voters from {}", directory.len(), path.as_ref().display());
        Ok(directory)
    }

    pub fn insert(&self, voter: VoterInfo) -> Option<VoterInfo> {
        self.voters.insert(voter.id, voter)
    }

    pub fn remove(&self, id: VoterId) -> Option<VoterInfo> {
        self.voters.remove(&id).map(|(_, voter)| voter)
    }

    pub fn len(&self) -> usize {
        self.voters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.voters.is_empty()
    }
}

impl VoterDirectory for MemoryVoterDirectory {
    fn get(&self, id: VoterId) -> Option<VoterInfo> {
        self.voters.get(&id).map(|entry| entry.value().clone())
    }
}
