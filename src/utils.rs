/// Order in which [`group_by_key`] returns its groups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KeyOrder {
    /// Largest key first.
    #[default]
    Descending,
    Ascending,
}

/// Partitions `records` into groups of equal key.
///
/// Each returned tuple holds the shared key and every record that produced
/// it. Groups come back ordered by key (largest first by default). The input
/// is fully materialized and sorted before grouping, so this is not meant for
/// unbounded streams.
///
/// The sort is stable: records with equal keys keep their input order inside
/// their group.
///
/// ```
/// use finddups::utils::{group_by_key, KeyOrder};
///
/// let things = vec![(1, "foo"), (2, "baz"), (1, "bar")];
/// let groups = group_by_key(things, |t| t.0, KeyOrder::Descending);
/// assert_eq!(groups, vec![(2, vec![(2, "baz")]), (1, vec![(1, "foo"), (1, "bar")])]);
/// ```
pub fn group_by_key<T, K, F>(records: impl IntoIterator<Item = T>, key: F, order: KeyOrder) -> Vec<(K, Vec<T>)>
where
    K: Ord,
    F: Fn(&T) -> K,
{
    let mut records: Vec<T> = records.into_iter().collect();
    match order {
        KeyOrder::Descending => records.sort_by(|a, b| key(b).cmp(&key(a))),
        KeyOrder::Ascending => records.sort_by(|a, b| key(a).cmp(&key(b))),
    }

    let mut groups: Vec<(K, Vec<T>)> = Vec::new();
    for record in records {
        let k = key(&record);
        match groups.last_mut() {
            Some((last, members)) if *last == k => members.push(record),
            _ => groups.push((k, vec![record])),
        }
    }
    groups
}
