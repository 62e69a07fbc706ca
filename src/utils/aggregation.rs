use std::collections::HashMap;
use std::hash::Hash;

use crate::types::{AccountRecord, Dimension, Filter, GroupKey, KeyOrder, Measure};

/// Apply a sub-filter to the dataset, returning the matching subset.
///
/// `Filter::All` keeps every record; an equality filter keeps the records
/// whose field equals the literal value. Records missing the field never
/// match.
pub fn filter_records<'a>(records: &'a [AccountRecord], filter: &Filter) -> Vec<&'a AccountRecord> {
    records
        .iter()
        .filter(|record| filter.matches(record))
        .collect()
}

/// Group records by a key and reduce each group to a single value.
///
/// Keys appear in first-seen order of the input. An empty input yields an
/// empty mapping.
pub fn rollup<K, KF, VF>(records: &[&AccountRecord], key_fn: KF, value_fn: VF) -> Vec<(K, u64)>
where
    K: Clone + Eq + Hash,
    KF: Fn(&AccountRecord) -> K,
    VF: Fn(&AccountRecord) -> u64,
{
    let mut index: HashMap<K, usize> = HashMap::new();
    let mut grouped: Vec<(K, u64)> = Vec::new();

    for record in records {
        let key = key_fn(record);
        let value = value_fn(record);
        match index.get(&key) {
            Some(&slot) => grouped[slot].1 += value,
            None => {
                index.insert(key.clone(), grouped.len());
                grouped.push((key, value));
            }
        }
    }

    grouped
}

/// Aggregate the records along a grouping dimension.
///
/// Numeric groupings (late payments) are sorted ascending; categorical
/// groupings keep first-seen order.
pub fn group_totals(
    records: &[&AccountRecord],
    dimension: Dimension,
    measure: Measure,
) -> Vec<(GroupKey, u64)> {
    let mut groups = match measure {
        Measure::Records => rollup(records, |r| r.group_key(dimension), |_| 1),
        Measure::Accounts => rollup(records, |r| r.group_key(dimension), |r| r.count),
    };

    if dimension.key_order() == KeyOrder::NumericAscending {
        groups.sort_by(|a, b| a.0.cmp(&b.0));
    }

    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn record(late: u32, sex: &str, count: u64) -> AccountRecord {
        AccountRecord {
            late_payments: Some(late),
            sex: Some(sex.to_string()),
            marriage: Some("Married".to_string()),
            age_bin: Some("25-34".to_string()),
            education: Some("University".to_string()),
            cur_sept_category: Some("Low".to_string()),
            count,
        }
    }

    #[test]
    fn test_sum_by_group_keeps_first_seen_order() {
        let records = vec![record(1, "M", 3), record(2, "F", 5), record(3, "M", 2)];
        let refs: Vec<&AccountRecord> = records.iter().collect();

        let groups = group_totals(&refs, Dimension::Gender, Measure::Accounts);
        assert_eq!(
            groups,
            vec![
                (GroupKey::Label("M".to_string()), 5),
                (GroupKey::Label("F".to_string()), 5),
            ]
        );
    }

    #[test]
    fn test_filter_by_late_payments() {
        let records = vec![record(1, "M", 1), record(2, "F", 1), record(2, "M", 1)];

        let filter = Filter::Equals(Dimension::LatePayments, GroupKey::Count(2));
        let subset = filter_records(&records, &filter);
        assert_eq!(subset.len(), 2);
        assert!(subset.iter().all(|r| r.late_payments == Some(2)));
    }

    #[test]
    fn test_filter_all_returns_everything() {
        let records = vec![record(0, "M", 1), record(1, "F", 2)];

        let subset = filter_records(&records, &Filter::All);
        assert_eq!(subset.len(), records.len());
    }

    #[test]
    fn test_empty_records() {
        let records: Vec<AccountRecord> = Vec::new();
        let refs: Vec<&AccountRecord> = records.iter().collect();

        let groups = group_totals(&refs, Dimension::Education, Measure::Accounts);
        assert!(groups.is_empty());
    }

    #[test]
    fn test_numeric_keys_sort_ascending() {
        let records = vec![record(3, "M", 7), record(1, "F", 9), record(2, "M", 4)];
        let refs: Vec<&AccountRecord> = records.iter().collect();

        let groups = group_totals(&refs, Dimension::LatePayments, Measure::Accounts);
        let keys: Vec<GroupKey> = groups.into_iter().map(|(key, _)| key).collect();
        assert_eq!(
            keys,
            vec![GroupKey::Count(1), GroupKey::Count(2), GroupKey::Count(3)]
        );
    }

    #[test]
    fn test_groups_cover_distinct_values_and_preserve_totals() {
        let records = vec![
            record(0, "M", 10),
            record(1, "F", 20),
            record(2, "M", 30),
            record(3, "F", 40),
        ];
        let refs: Vec<&AccountRecord> = records.iter().collect();

        let groups = group_totals(&refs, Dimension::Gender, Measure::Accounts);
        assert_eq!(groups.len(), 2);

        let grouped_total: u64 = groups.iter().map(|(_, value)| value).sum();
        let record_total: u64 = records.iter().map(|r| r.count).sum();
        assert_eq!(grouped_total, record_total);
    }

    #[test]
    fn test_records_measure_counts_rows() {
        let records = vec![record(0, "M", 10), record(1, "M", 20), record(2, "F", 30)];
        let refs: Vec<&AccountRecord> = records.iter().collect();

        let groups = group_totals(&refs, Dimension::Gender, Measure::Records);
        assert_eq!(
            groups,
            vec![
                (GroupKey::Label("M".to_string()), 2),
                (GroupKey::Label("F".to_string()), 1),
            ]
        );
    }

    #[test]
    fn test_missing_field_groups_as_unknown_and_never_matches() {
        let mut anonymous = record(1, "M", 5);
        anonymous.sex = None;
        let records = vec![record(1, "F", 3), anonymous];
        let refs: Vec<&AccountRecord> = records.iter().collect();

        let groups = group_totals(&refs, Dimension::Gender, Measure::Accounts);
        assert_eq!(
            groups,
            vec![
                (GroupKey::Label("F".to_string()), 3),
                (GroupKey::Label("Unknown".to_string()), 5),
            ]
        );

        let filter = Filter::Equals(Dimension::Gender, GroupKey::Label("Unknown".to_string()));
        assert!(filter_records(&records, &filter).is_empty());
    }
}
