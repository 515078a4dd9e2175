//! Base data plus user edits.
//!
//! Base records are never modified. Creating or editing a record stores a
//! full copy in the overlay's `custom` list; deleting one records its id in
//! `deleted`. [`merge`] folds the three together into what callers see.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

pub trait Record: Clone {
    fn id(&self) -> &str;
}

/// Base order first (with custom edits applied in place), then records that
/// only exist in `custom`. Anything listed in `deleted` is dropped.
pub fn merge<T: Record>(base: &[T], custom: &[T], deleted: &BTreeSet<String>) -> Vec<T> {
    let edits: HashMap<&str, &T> = custom.iter().map(|item| (item.id(), item)).collect();
    let base_ids: BTreeSet<&str> = base.iter().map(Record::id).collect();

    let mut visible = Vec::with_capacity(base.len() + custom.len());
    let mut seen = BTreeSet::new();

    for item in base {
        let id = item.id();
        if deleted.contains(id) || !seen.insert(id) {
            continue;
        }
        let chosen = edits.get(id).copied().unwrap_or(item);
        visible.push(chosen.clone());
    }

    for item in custom {
        let id = item.id();
        if base_ids.contains(id) || deleted.contains(id) || !seen.insert(id) {
            continue;
        }
        visible.push(item.clone());
    }

    visible
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(bound(serialize = "T: Serialize", deserialize = "T: Deserialize<'de>"))]
pub struct Overlay<T> {
    #[serde(default)]
    pub custom: Vec<T>,
    #[serde(default)]
    pub deleted: BTreeSet<String>,
}

impl<T> Default for Overlay<T> {
    fn default() -> Self {
        Self {
            custom: Vec::new(),
            deleted: BTreeSet::new(),
        }
    }
}

impl<T: Record> Overlay<T> {
    pub fn visible(&self, base: &[T]) -> Vec<T> {
        merge(base, &self.custom, &self.deleted)
    }

    pub fn find(&self, base: &[T], id: &str) -> Option<T> {
        if self.deleted.contains(id) {
            return None;
        }
        self.custom
            .iter()
            .find(|item| item.id() == id)
            .or_else(|| base.iter().find(|item| item.id() == id))
            .cloned()
    }

    pub fn upsert(&mut self, item: T) {
        self.deleted.remove(item.id());
        match self.custom.iter_mut().find(|existing| existing.id() == item.id()) {
            Some(existing) => *existing = item,
            None => self.custom.push(item),
        }
    }

    pub fn remove(&mut self, id: &str) {
        self.custom.retain(|item| item.id() != id);
        self.deleted.insert(id.to_string());
    }

    /// Undeletes a base record. Custom-only records are gone once removed.
    pub fn restore(&mut self, id: &str) -> bool {
        self.deleted.remove(id)
    }

    pub fn clear(&mut self) {
        self.custom.clear();
        self.deleted.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Item {
        id: &'static str,
        label: &'static str,
    }

    impl Record for Item {
        fn id(&self) -> &str {
            self.id
        }
    }

    fn item(id: &'static str, label: &'static str) -> Item {
        Item { id, label }
    }

    fn labels(items: &[Item]) -> Vec<&'static str> {
        items.iter().map(|item| item.label).collect()
    }

    #[test]
    fn merge_applies_edits_in_place_and_appends_new() {
        let base = vec![item("a", "A"), item("b", "B"), item("c", "C")];
        let custom = vec![item("x", "X"), item("b", "B2")];
        let deleted = BTreeSet::new();

        let visible = merge(&base, &custom, &deleted);
        assert_eq!(labels(&visible), vec!["A", "B2", "C", "X"]);
    }

    #[test]
    fn merge_drops_deleted_from_both_sources() {
        let base = vec![item("a", "A"), item("b", "B")];
        let custom = vec![item("a", "A2"), item("x", "X"), item("y", "Y")];
        let deleted: BTreeSet<String> = ["a", "y"].iter().map(|id| id.to_string()).collect();

        let visible = merge(&base, &custom, &deleted);
        assert_eq!(labels(&visible), vec!["B", "X"]);
    }

    #[test]
    fn merge_never_repeats_an_id() {
        let base = vec![item("a", "A"), item("a", "A-dup")];
        let custom = vec![item("x", "X1"), item("x", "X2")];
        let visible = merge(&base, &custom, &BTreeSet::new());
        assert_eq!(labels(&visible), vec!["A", "X1"]);
    }

    #[test]
    fn overlay_remove_then_restore_base_record() {
        let base = vec![item("a", "A"), item("b", "B")];
        let mut overlay = Overlay::default();
        overlay.upsert(item("a", "A2"));
        overlay.remove("a");

        assert!(overlay.find(&base, "a").is_none());
        assert_eq!(labels(&overlay.visible(&base)), vec!["B"]);

        assert!(overlay.restore("a"));
        assert_eq!(overlay.find(&base, "a"), Some(item("a", "A")));
        assert!(!overlay.restore("a"));
    }

    #[test]
    fn overlay_upsert_clears_pending_delete() {
        let base = vec![item("a", "A")];
        let mut overlay = Overlay::default();
        overlay.remove("a");
        overlay.upsert(item("a", "A3"));
        assert_eq!(labels(&overlay.visible(&base)), vec!["A3"]);
        assert_eq!(overlay.custom.len(), 1);
    }

    #[test]
    fn clear_restores_base_view() {
        let base = vec![item("a", "A")];
        let mut overlay = Overlay::default();
        overlay.upsert(item("n", "N"));
        overlay.remove("a");
        overlay.clear();
        assert_eq!(labels(&overlay.visible(&base)), vec!["A"]);
    }
}
