use std::collections::HashMap;
use std::hash::Hash;

/// Merge a persisted collection with the seed collection.
///
/// Persisted records keep their order and win on key collision; seed records
/// whose key is not present are appended in seed order. A key repeated within
/// `persisted` keeps its first position and its last value.
pub fn reconcile<T, K, F>(persisted: Vec<T>, seed: Vec<T>, key: F) -> Vec<T>
where
    F: Fn(&T) -> K,
    K: Eq + Hash,
{
    let mut positions = HashMap::new();
    let mut merged: Vec<T> = Vec::with_capacity(persisted.len() + seed.len());

    for record in persisted {
        match positions.get(&key(&record)) {
            Some(&index) => merged[index] = record,
            None => {
                positions.insert(key(&record), merged.len());
                merged.push(record);
            }
        }
    }

    for record in seed {
        if !positions.contains_key(&key(&record)) {
            positions.insert(key(&record), merged.len());
            merged.push(record);
        }
    }

    merged
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(records: &[(&'static str, u32)]) -> Vec<&'static str> {
        records.iter().map(|(id, _)| *id).collect()
    }

    #[test]
    fn persisted_wins_and_seed_fills_gaps() {
        let persisted = vec![("p2", 7), ("x9", 1)];
        let seed = vec![("p1", 0), ("p2", 0), ("p3", 0)];

        let merged = reconcile(persisted, seed, |r| r.0);

        assert_eq!(ids(&merged), vec!["p2", "x9", "p1", "p3"]);
        assert_eq!(merged[0], ("p2", 7));
    }

    #[test]
    fn empty_persisted_is_just_the_seed() {
        let seed = vec![("p1", 0), ("a1", 0)];
        assert_eq!(reconcile(Vec::new(), seed.clone(), |r| r.0), seed);
    }

    #[test]
    fn empty_seed_is_just_persisted() {
        let persisted = vec![("p1", 3)];
        assert_eq!(reconcile(persisted.clone(), Vec::new(), |r| r.0), persisted);
    }

    #[test]
    fn duplicate_persisted_keys_collapse() {
        let persisted = vec![("p1", 1), ("p2", 2), ("p1", 5)];
        let merged = reconcile(persisted, Vec::new(), |r| r.0);
        assert_eq!(merged, vec![("p1", 5), ("p2", 2)]);
    }
}
