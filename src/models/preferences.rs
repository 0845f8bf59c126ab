use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Preference set a user can flip on and off
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PreferenceKind {
    Liked,
    Saved,
}

/// Per-installation liked/saved/hidden membership
///
/// The three sets are independent: an item may be liked, saved and hidden at
/// the same time. Serialized as `{ "liked": {"id": true}, ... }`; a missing
/// set deserializes as empty.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Preferences {
    #[serde(default, with = "membership")]
    pub liked: BTreeSet<String>,
    #[serde(default, with = "membership")]
    pub saved: BTreeSet<String>,
    #[serde(default, with = "membership")]
    pub hidden: BTreeSet<String>,
}

impl Preferences {
    pub fn new() -> Self {
        Self::default()
    }

    fn set_mut(&mut self, kind: PreferenceKind) -> &mut BTreeSet<String> {
        match kind {
            PreferenceKind::Liked => &mut self.liked,
            PreferenceKind::Saved => &mut self.saved,
        }
    }

    /// Flips membership, returning whether the item is now in the set
    pub fn toggle(&mut self, kind: PreferenceKind, item_id: &str) -> bool {
        let set = self.set_mut(kind);
        if set.remove(item_id) {
            false
        } else {
            set.insert(item_id.to_string());
            true
        }
    }

    pub fn hide(&mut self, item_id: &str) {
        self.hidden.insert(item_id.to_string());
    }

    pub fn unhide_all(&mut self) {
        self.hidden.clear();
    }

    pub fn contains(&self, kind: PreferenceKind, item_id: &str) -> bool {
        match kind {
            PreferenceKind::Liked => self.liked.contains(item_id),
            PreferenceKind::Saved => self.saved.contains(item_id),
        }
    }

    pub fn is_hidden(&self, item_id: &str) -> bool {
        self.hidden.contains(item_id)
    }
}

mod membership {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::collections::{BTreeMap, BTreeSet};

    pub fn serialize<S: Serializer>(set: &BTreeSet<String>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(set.iter().map(|id| (id, true)))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<BTreeSet<String>, D::Error> {
        let map = BTreeMap::<String, bool>::deserialize(deserializer)?;
        Ok(map
            .into_iter()
            .filter_map(|(id, member)| member.then_some(id))
            .collect())
    }
}
