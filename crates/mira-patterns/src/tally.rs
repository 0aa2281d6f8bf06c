use std::collections::HashMap;
use std::hash::Hash;

/// Insertion-ordered counter.
///
/// `mode` and `sorted` break ties in favour of the key seen first.
#[derive(Debug, Clone)]
pub struct Tally<K> {
    order: Vec<(K, usize)>,
    index: HashMap<K, usize>,
}

impl<K: Eq + Hash + Clone> Tally<K> {
    pub fn new() -> Self {
        Self {
            order: Vec::new(),
            index: HashMap::new(),
        }
    }

    pub fn add(&mut self, key: K) {
        match self.index.get(&key) {
            Some(&i) => self.order[i].1 += 1,
            None => {
                self.index.insert(key.clone(), self.order.len());
                self.order.push((key, 1));
            }
        }
    }

    pub fn get(&self, key: &K) -> usize {
        self.index.get(key).map(|&i| self.order[i].1).unwrap_or(0)
    }

    /// Most frequent key and its count.
    pub fn mode(&self) -> Option<(&K, usize)> {
        let mut best: Option<(&K, usize)> = None;
        for (key, count) in &self.order {
            if best.is_none_or(|(_, c)| *count > c) {
                best = Some((key, *count));
            }
        }
        best
    }

    /// All keys, most frequent first.
    pub fn sorted(&self) -> Vec<(K, usize)> {
        let mut entries = self.order.clone();
        entries.sort_by(|a, b| b.1.cmp(&a.1));
        entries
    }

    pub fn total(&self) -> usize {
        self.order.iter().map(|(_, c)| c).sum()
    }
}

impl<K: Eq + Hash + Clone> Default for Tally<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Eq + Hash + Clone> FromIterator<K> for Tally<K> {
    fn from_iter<I: IntoIterator<Item = K>>(iter: I) -> Self {
        let mut tally = Self::new();
        for key in iter {
            tally.add(key);
        }
        tally
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mode_prefers_highest_count() {
        let tally: Tally<&str> = ["Happy", "Sad", "Happy", "Happy"].into_iter().collect();
        assert_eq!(tally.mode(), Some((&"Happy", 3)));
        assert_eq!(tally.get(&"Sad"), 1);
        assert_eq!(tally.total(), 4);
    }

    #[test]
    fn ties_resolve_to_first_seen() {
        let tally: Tally<&str> = ["Calm", "Tired", "Tired", "Calm"].into_iter().collect();
        assert_eq!(tally.mode(), Some((&"Calm", 2)));

        let sorted = tally.sorted();
        assert_eq!(sorted, vec![("Calm", 2), ("Tired", 2)]);
    }

    #[test]
    fn mode_count_dominates_every_other_key() {
        let labels = ["Loved", "Sad", "Calm", "Sad", "Loved", "Anxious", "Sad", "Calm"];
        let tally: Tally<&str> = labels.into_iter().collect();
        let (_, top) = tally.mode().unwrap();
        for label in labels {
            assert!(top >= tally.get(&label));
        }
    }

    #[test]
    fn empty_tally_has_no_mode() {
        let tally: Tally<String> = Tally::new();
        assert!(tally.mode().is_none());
        assert!(tally.sorted().is_empty());
    }
}
