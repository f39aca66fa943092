/*!
An insertion-ordered grouping of source ids under arbitrary keys.
Both the variant index (sequence -> sources) and the analyzer (mutation set -> sources, label -> sources)
accumulate into this structure and rank the groups by how many sources reported them.

# Example usage
```rust
use plasvar::grouping::GroupedSources;

let mut groups: GroupedSources<&str> = Default::default();
groups.insert("MSKGE", "p1");
groups.insert("MSRGE", "p2");
groups.insert("MSRGE", "p3");
groups.insert("MSKGE", "p1"); // duplicate sources are only counted once

let ranked = groups.ranked();
assert_eq!(ranked[0].0, &"MSRGE");
assert_eq!(ranked[0].1.len(), 2);
assert_eq!(ranked[1].0, &"MSKGE");
```
*/

use rustc_hash::{FxHashMap as HashMap, FxHashSet as HashSet};
use std::borrow::Borrow;
use std::cmp::Reverse;
use std::hash::Hash;

/// The distinct source ids that reported something
pub type SourceSet = HashSet<String>;

/// Maps keys to the set of source ids reporting them, remembering the order keys were first seen.
#[derive(Clone, Debug)]
pub struct GroupedSources<K> {
    /// Groups in discovery order
    groups: Vec<(K, SourceSet)>,
    /// Key to index into `groups`
    lookup: HashMap<K, usize>
}

impl<K> Default for GroupedSources<K> {
    fn default() -> Self {
        GroupedSources {
            groups: vec![],
            lookup: Default::default()
        }
    }
}

impl<K: PartialEq> PartialEq for GroupedSources<K> {
    fn eq(&self, other: &Self) -> bool {
        // lookup is derived from groups
        self.groups == other.groups
    }
}

impl<K: Clone + Eq + Hash> GroupedSources<K> {
    pub fn new() -> GroupedSources<K> {
        Default::default()
    }

    /// Records that `source_id` reported `key`.
    pub fn insert<S: Into<String>>(&mut self, key: K, source_id: S) {
        self.sources_mut(key).insert(source_id.into());
    }

    /// Records that every id in `source_ids` reported `key`.
    pub fn extend<I: IntoIterator<Item = String>>(&mut self, key: K, source_ids: I) {
        self.sources_mut(key).extend(source_ids);
    }

    /// Returns the source set for a key, creating an empty one at the end of the discovery order if needed
    fn sources_mut(&mut self, key: K) -> &mut SourceSet {
        let index = match self.lookup.get(&key) {
            Some(&index) => index,
            None => {
                let index = self.groups.len();
                self.lookup.insert(key.clone(), index);
                self.groups.push((key, Default::default()));
                index
            }
        };
        &mut self.groups[index].1
    }

    pub fn get<Q>(&self, key: &Q) -> Option<&SourceSet>
    where
        K: Borrow<Q>,
        Q: Eq + Hash + ?Sized
    {
        self.lookup.get(key).map(|&index| &self.groups[index].1)
    }

    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Eq + Hash + ?Sized
    {
        self.lookup.contains_key(key)
    }

    /// Number of distinct keys
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Iterates in discovery order
    pub fn iter(&self) -> impl Iterator<Item = (&K, &SourceSet)> + '_ {
        self.groups.iter().map(|(k, s)| (k, s))
    }

    pub fn keys(&self) -> impl Iterator<Item = &K> + '_ {
        self.groups.iter().map(|(k, _s)| k)
    }

    /// All groups ordered by number of sources, descending.
    /// Ties keep their discovery order since the sort is stable.
    pub fn ranked(&self) -> Vec<(&K, &SourceSet)> {
        let mut ranked: Vec<(&K, &SourceSet)> = self.iter().collect();
        ranked.sort_by_key(|(_k, s)| Reverse(s.len()));
        ranked
    }

    /// Same as `ranked()`, but consumes the grouping
    pub fn into_ranked(self) -> Vec<(K, SourceSet)> {
        let mut ranked = self.groups;
        ranked.sort_by_key(|(_k, s)| Reverse(s.len()));
        ranked
    }
}

impl<K: Clone + Eq + Hash, S: Into<String>> FromIterator<(K, S)> for GroupedSources<K> {
    fn from_iter<T: IntoIterator<Item = (K, S)>>(iter: T) -> Self {
        let mut groups = GroupedSources::new();
        for (key, source_id) in iter {
            groups.insert(key, source_id);
        }
        groups
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_discovery_order() {
        let groups: GroupedSources<String> = [
            ("C".to_string(), "1"),
            ("A".to_string(), "2"),
            ("B".to_string(), "3"),
            ("A".to_string(), "4")
        ].into_iter().collect();

        assert_eq!(groups.len(), 3);
        assert_eq!(groups.keys().cloned().collect::<Vec<String>>(), vec!["C", "A", "B"]);
        assert_eq!(groups.get("A").unwrap().len(), 2);
        assert!(groups.contains_key("B"));
        assert!(groups.get("D").is_none());
    }

    #[test]
    fn test_stable_ranking() {
        let groups: GroupedSources<&str> = [
            ("first", "1"),
            ("second", "2"),
            ("third", "3"),
            ("third", "4"),
            ("fourth", "5")
        ].into_iter().collect();

        // third is the most common, all others are tied and keep their order
        let ranked: Vec<&str> = groups.ranked().into_iter().map(|(k, _s)| *k).collect();
        assert_eq!(ranked, vec!["third", "first", "second", "fourth"]);

        let owned: Vec<(&str, usize)> = groups.into_ranked().into_iter()
            .map(|(k, s)| (k, s.len()))
            .collect();
        assert_eq!(owned, vec![("third", 2), ("first", 1), ("second", 1), ("fourth", 1)]);
    }

    #[test]
    fn test_duplicate_sources() {
        let mut groups: GroupedSources<u8> = Default::default();
        groups.insert(1, "a");
        groups.insert(1, "a");
        groups.extend(1, vec!["a".to_string(), "b".to_string()]);
        assert_eq!(groups.get(&1).unwrap().len(), 2);
        assert!(!groups.is_empty());
    }
}
