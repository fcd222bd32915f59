//! The registered rule set and its loader.
//!
//! A [`RuleSet`] holds the ambient events, triggered sounds, and block
//! effects in registration order. It is built either from already
//! validated rules or from a [`RuleSetDefinition`] read out of YAML, in
//! which case each malformed definition is rejected on its own and listed in
//! the [`LoadReport`] while the rest load normally. Entries are deserialized
//! one at a time, so a misspelled field only costs the rule it appears in.

use std::collections::BTreeSet;
use std::path::Path;

use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::{info, warn};

use crate::effect::{BlockEffect, BlockEffectDefinition};
use crate::error::RuleError;
use crate::event::{AmbientEvent, RuleDefinition};
use crate::trigger::{TriggeredSound, TriggeredSoundDefinition};

// ---------------------------------------------------------------------------
// Rule set
// ---------------------------------------------------------------------------

/// Every rule the scheduler evaluates.
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    events: Vec<AmbientEvent>,
    triggered: Vec<TriggeredSound>,
    effects: Vec<BlockEffect>,
}

impl RuleSet {
    /// Create an empty rule set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an ambient event.
    ///
    /// # Errors
    ///
    /// Returns [`RuleError::DuplicateId`] if an event with the same id is
    /// already registered.
    pub fn add_event(&mut self, event: AmbientEvent) -> Result<(), RuleError> {
        if self.events.iter().any(|e| e.id() == event.id()) {
            return Err(RuleError::DuplicateId {
                id: event.id().to_owned(),
            });
        }
        self.events.push(event);
        Ok(())
    }

    /// Append a triggered sound.
    ///
    /// # Errors
    ///
    /// Returns [`RuleError::DuplicateId`] on a repeated id.
    pub fn add_triggered_sound(&mut self, sound: TriggeredSound) -> Result<(), RuleError> {
        if self.triggered.iter().any(|s| s.id() == sound.id()) {
            return Err(RuleError::DuplicateId {
                id: sound.id().to_owned(),
            });
        }
        self.triggered.push(sound);
        Ok(())
    }

    /// Append a block effect.
    ///
    /// # Errors
    ///
    /// Returns [`RuleError::DuplicateId`] on a repeated id.
    pub fn add_effect(&mut self, effect: BlockEffect) -> Result<(), RuleError> {
        if self.effects.iter().any(|e| e.id() == effect.id()) {
            return Err(RuleError::DuplicateId {
                id: effect.id().to_owned(),
            });
        }
        self.effects.push(effect);
        Ok(())
    }

    /// Ambient events in registration order.
    pub fn events(&self) -> &[AmbientEvent] {
        &self.events
    }

    /// Triggered sounds in registration order.
    pub fn triggered_sounds(&self) -> &[TriggeredSound] {
        &self.triggered
    }

    /// Block effects in registration order.
    pub fn effects(&self) -> &[BlockEffect] {
        &self.effects
    }

    /// Ids of every ambient event.
    pub fn event_ids(&self) -> BTreeSet<&str> {
        self.events.iter().map(AmbientEvent::id).collect()
    }

    /// Total number of rules of all kinds.
    pub fn len(&self) -> usize {
        self.events
            .len()
            .saturating_add(self.triggered.len())
            .saturating_add(self.effects.len())
    }

    /// Whether no rule is registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every memoized tag so the next evaluation looks tags up again.
    pub fn invalidate_tag_caches(&mut self) {
        self.events
            .iter_mut()
            .for_each(AmbientEvent::invalidate_tag_caches);
        self.triggered
            .iter_mut()
            .for_each(TriggeredSound::invalidate_tag_caches);
        self.effects
            .iter_mut()
            .for_each(BlockEffect::invalidate_tag_caches);
    }

    /// Convert every definition, keeping the valid ones.
    pub fn from_definitions(definitions: RuleSetDefinition) -> (Self, LoadReport) {
        let mut rules = Self::new();
        let mut report = LoadReport::default();

        for rejected in definitions.malformed {
            report.record(rejected.kind, rejected.id, Err(rejected.error));
        }
        for definition in definitions.ambient_events {
            let id = definition.id.clone();
            let result = AmbientEvent::try_from(definition).and_then(|e| rules.add_event(e));
            report.record(RuleKind::AmbientEvent, id, result);
        }
        for definition in definitions.triggered_sounds {
            let id = definition.id.clone();
            let result =
                TriggeredSound::try_from(definition).and_then(|s| rules.add_triggered_sound(s));
            report.record(RuleKind::TriggeredSound, id, result);
        }
        for definition in definitions.block_effects {
            let id = definition.id.clone();
            let result = BlockEffect::try_from(definition).and_then(|e| rules.add_effect(e));
            report.record(RuleKind::BlockEffect, id, result);
        }

        info!(
            ambient_events = rules.events.len(),
            triggered_sounds = rules.triggered.len(),
            block_effects = rules.effects.len(),
            rejected = report.rejected.len(),
            "Rules loaded"
        );
        (rules, report)
    }
}

// ---------------------------------------------------------------------------
// Definitions
// ---------------------------------------------------------------------------

/// Errors that can occur when reading a rules file.
#[derive(Debug, thiserror::Error)]
pub enum RulesFileError {
    /// Failed to read the rules file from disk.
    #[error("failed to read rules file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// The file is not YAML, or a top-level list is not a list.
    #[error("failed to parse rules YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        #[from]
        source: serde_yml::Error,
    },
}

/// All rule definitions from one source, e.g. `ambience-rules.yaml`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RuleSetDefinition {
    /// Cooldown-driven events.
    pub ambient_events: Vec<RuleDefinition>,
    /// Trigger-driven sounds.
    pub triggered_sounds: Vec<TriggeredSoundDefinition>,
    /// Block particle effects.
    pub block_effects: Vec<BlockEffectDefinition>,
    /// Entries that did not deserialize as their kind, in input order.
    pub malformed: Vec<RejectedRule>,
}

/// The file as written, before any entry is interpreted.
#[derive(Debug, Default, Deserialize)]
struct RawRuleFile {
    #[serde(default)]
    ambient_events: Vec<serde_yml::Value>,
    #[serde(default)]
    triggered_sounds: Vec<serde_yml::Value>,
    #[serde(default)]
    block_effects: Vec<serde_yml::Value>,
}

impl RuleSetDefinition {
    /// Read definitions from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns [`RulesFileError::Io`] if the file cannot be read or
    /// [`RulesFileError::Yaml`] if it does not parse. Individual rules are
    /// not validated here.
    pub fn from_file(path: &Path) -> Result<Self, RulesFileError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Read definitions from a YAML string. An empty string has no rules.
    ///
    /// Entries that do not match their kind are kept in
    /// [`RuleSetDefinition::malformed`] instead of failing the whole source.
    ///
    /// # Errors
    ///
    /// Returns [`RulesFileError::Yaml`] if the string is not YAML or a
    /// top-level list has the wrong type.
    pub fn parse(yaml: &str) -> Result<Self, RulesFileError> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        let raw: RawRuleFile = serde_yml::from_str(yaml)?;
        let mut malformed = Vec::new();
        Ok(Self {
            ambient_events: split_entries(
                raw.ambient_events,
                RuleKind::AmbientEvent,
                &mut malformed,
            ),
            triggered_sounds: split_entries(
                raw.triggered_sounds,
                RuleKind::TriggeredSound,
                &mut malformed,
            ),
            block_effects: split_entries(
                raw.block_effects,
                RuleKind::BlockEffect,
                &mut malformed,
            ),
            malformed,
        })
    }
}

/// Deserialize each entry on its own, moving failures into `malformed`.
fn split_entries<T: DeserializeOwned>(
    entries: Vec<serde_yml::Value>,
    kind: RuleKind,
    malformed: &mut Vec<RejectedRule>,
) -> Vec<T> {
    let mut definitions = Vec::with_capacity(entries.len());
    for entry in entries {
        let id = entry
            .get("id")
            .and_then(serde_yml::Value::as_str)
            .map(str::to_owned);
        match serde_yml::from_value::<T>(entry) {
            Ok(definition) => definitions.push(definition),
            Err(e) => malformed.push(RejectedRule {
                kind,
                id,
                error: RuleError::Malformed {
                    reason: e.to_string(),
                },
            }),
        }
    }
    definitions
}

// ---------------------------------------------------------------------------
// Load report
// ---------------------------------------------------------------------------

/// Which list a rule came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleKind {
    /// An [`AmbientEvent`].
    AmbientEvent,
    /// A [`TriggeredSound`].
    TriggeredSound,
    /// A [`BlockEffect`].
    BlockEffect,
}

impl RuleKind {
    /// Label for logging.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::AmbientEvent => "ambient_event",
            Self::TriggeredSound => "triggered_sound",
            Self::BlockEffect => "block_effect",
        }
    }
}

/// A definition that failed to load.
#[derive(Debug, Clone, PartialEq)]
pub struct RejectedRule {
    /// Which list it came from.
    pub kind: RuleKind,
    /// Its id, if it had one.
    pub id: Option<String>,
    /// Why it was rejected.
    pub error: RuleError,
}

/// Outcome of converting a [`RuleSetDefinition`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadReport {
    /// Number of rules registered.
    pub loaded: usize,
    /// Definitions that were rejected. Malformed entries come first, then
    /// the rest in input order.
    pub rejected: Vec<RejectedRule>,
}

impl LoadReport {
    /// Whether every definition loaded.
    pub fn is_clean(&self) -> bool {
        self.rejected.is_empty()
    }

    fn record(&mut self, kind: RuleKind, id: Option<String>, result: Result<(), RuleError>) {
        match result {
            Ok(()) => self.loaded = self.loaded.saturating_add(1),
            Err(error) => {
                warn!(kind = kind.as_str(), id = ?id, error = %error, "Rejected rule definition");
                self.rejected.push(RejectedRule { kind, id, error });
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const RULES: &str = r"
ambient_events:
  - id: cave_drip
    sounds:
      - sound: ambience:cave.drip
    conditions:
      - type: height
        min: -64
        max: 50
    cooldown_min: 100
    cooldown_max: 200
  - id: broken
    sounds:
      - sound: ambience:x
    cooldown_min: 30
    cooldown_max: 10
  - sounds:
      - sound: ambience:nameless
  - id: cave_drip
    sounds:
      - sound: ambience:cave.other
triggered_sounds:
  - id: jump_whoosh
    trigger: jump
    sounds:
      - sound: ambience:jump
block_effects:
  - id: leaves
    block: '#leaves'
    particle: ambience:leaf
    chance: 0.01
";

    #[test]
    fn malformed_definitions_are_rejected_individually() {
        let definitions = RuleSetDefinition::parse(RULES).unwrap();
        let (rules, report) = RuleSet::from_definitions(definitions);

        assert_eq!(report.loaded, 3);
        assert_eq!(report.rejected.len(), 3);
        assert_eq!(rules.len(), 3);
        assert_eq!(rules.events().len(), 1);
        assert_eq!(rules.events()[0].id(), "cave_drip");

        let errors: Vec<&RuleError> = report.rejected.iter().map(|r| &r.error).collect();
        assert!(matches!(errors[0], RuleError::InvertedCooldown { .. }));
        assert_eq!(errors[1], &RuleError::MissingId);
        assert!(matches!(errors[2], RuleError::DuplicateId { .. }));
        assert_eq!(report.rejected[0].id.as_deref(), Some("broken"));
        assert!(!report.is_clean());
    }

    #[test]
    fn shape_errors_only_cost_their_own_entry() {
        let yaml = r"
ambient_events:
  - id: good
    sounds:
      - sound: ambience:good
    cooldown_min: 10
    cooldown_max: 20
  - id: typo
    sounds:
      - sound: ambience:typo
    conditions:
      - type: entites
        entity: zombie
        min_count: 1
triggered_sounds:
  - id: no_trigger
    sounds:
      - sound: ambience:swing
  - id: jump
    trigger: jump
    sounds:
      - sound: ambience:jump
block_effects:
  - id: wordy_chance
    block: minecraft:sand
    particle: ambience:dust
    chance: often
";
        let definitions = RuleSetDefinition::parse(yaml).unwrap();
        assert_eq!(definitions.ambient_events.len(), 1);
        assert_eq!(definitions.triggered_sounds.len(), 1);
        assert!(definitions.block_effects.is_empty());
        assert_eq!(definitions.malformed.len(), 3);

        let (rules, report) = RuleSet::from_definitions(definitions);
        assert_eq!(report.loaded, 2);
        assert_eq!(rules.events()[0].id(), "good");
        assert_eq!(rules.triggered_sounds()[0].id(), "jump");

        let rejected: Vec<(RuleKind, Option<&str>)> = report
            .rejected
            .iter()
            .map(|r| (r.kind, r.id.as_deref()))
            .collect();
        assert_eq!(
            rejected,
            vec![
                (RuleKind::AmbientEvent, Some("typo")),
                (RuleKind::TriggeredSound, Some("no_trigger")),
                (RuleKind::BlockEffect, Some("wordy_chance")),
            ]
        );
        assert!(
            report
                .rejected
                .iter()
                .all(|r| matches!(r.error, RuleError::Malformed { .. }))
        );
    }

    #[test]
    fn rules_file_errors_name_the_rules_file() {
        let error = RuleSetDefinition::parse("ambient_events: 3").unwrap_err();
        assert!(error.to_string().starts_with("failed to parse rules YAML"));
    }

    #[test]
    fn empty_source_has_no_rules() {
        let (rules, report) = RuleSet::from_definitions(RuleSetDefinition::parse("").unwrap());
        assert!(rules.is_empty());
        assert!(report.is_clean());
    }

    #[test]
    fn event_ids_lists_registered_events() {
        let (rules, _) = RuleSet::from_definitions(RuleSetDefinition::parse(RULES).unwrap());
        assert_eq!(rules.event_ids().into_iter().collect::<Vec<_>>(), vec!["cave_drip"]);
    }

    #[test]
    fn malformed_yaml_is_an_error() {
        assert!(matches!(
            RuleSetDefinition::parse("ambient_events: [oops"),
            Err(RulesFileError::Yaml { .. })
        ));
    }

    #[test]
    fn load_project_rules_file() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../ambience-rules.yaml");
        if !path.exists() {
            return;
        }
        let definitions = RuleSetDefinition::from_file(&path).unwrap();
        let (rules, report) = RuleSet::from_definitions(definitions);
        assert!(report.is_clean(), "rejected: {:?}", report.rejected);
        assert!(!rules.events().is_empty());
    }
}
