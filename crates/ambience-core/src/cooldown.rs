//! Per-actor cooldown table.
//!
//! Maps rule id to ticks remaining. An absent entry reads as zero, and an
//! entry is removed as soon as it reaches zero, so the table only ever holds
//! rules that are actively cooling down.

use std::collections::BTreeMap;

/// Remaining cooldown ticks per rule id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CooldownTable {
    remaining: BTreeMap<String, u32>,
}

impl CooldownTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Ticks remaining for a rule; `0` when absent.
    pub fn get(&self, rule_id: &str) -> u32 {
        self.remaining.get(rule_id).copied().unwrap_or(0)
    }

    /// Set the ticks remaining. Setting `0` removes the entry.
    pub fn set(&mut self, rule_id: &str, ticks: u32) {
        if ticks == 0 {
            self.remaining.remove(rule_id);
        } else {
            self.remaining.insert(rule_id.to_owned(), ticks);
        }
    }

    /// Decrement by one tick and return the new value.
    ///
    /// An absent entry stays at zero. An entry that reaches zero is removed.
    pub fn tick_down(&mut self, rule_id: &str) -> u32 {
        let Some(slot) = self.remaining.get_mut(rule_id) else {
            return 0;
        };
        *slot = slot.saturating_sub(1);
        let left = *slot;
        if left == 0 {
            self.remaining.remove(rule_id);
        }
        left
    }

    /// Number of rules currently cooling down.
    pub fn len(&self) -> usize {
        self.remaining.len()
    }

    /// Whether no rule is cooling down.
    pub fn is_empty(&self) -> bool {
        self.remaining.is_empty()
    }

    /// Keep only the cooldowns whose rule id passes `keep`.
    pub fn retain(&mut self, mut keep: impl FnMut(&str) -> bool) {
        self.remaining.retain(|id, _| keep(id));
    }

    /// Forget every cooldown.
    pub fn clear(&mut self) {
        self.remaining.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_reads_zero() {
        let table = CooldownTable::new();
        assert_eq!(table.get("cave"), 0);
        assert!(table.is_empty());
    }

    #[test]
    fn tick_down_is_monotonic() {
        let mut table = CooldownTable::new();
        table.set("cave", 3);
        assert_eq!(table.tick_down("cave"), 2);
        assert_eq!(table.get("cave"), 2);
        assert_eq!(table.tick_down("cave"), 1);
        assert_eq!(table.tick_down("cave"), 0);
        assert_eq!(table.len(), 0);
    }

    #[test]
    fn absent_entry_stays_zero_on_tick_down() {
        let mut table = CooldownTable::new();
        assert_eq!(table.tick_down("cave"), 0);
        assert!(table.is_empty());
    }

    #[test]
    fn retain_drops_unknown_rules() {
        let mut table = CooldownTable::new();
        table.set("cave", 10);
        table.set("wind", 4);
        table.retain(|id| id == "wind");
        assert_eq!(table.get("cave"), 0);
        assert_eq!(table.get("wind"), 4);
    }

    #[test]
    fn setting_zero_removes() {
        let mut table = CooldownTable::new();
        table.set("cave", 10);
        table.set("cave", 0);
        assert!(table.is_empty());
    }
}
