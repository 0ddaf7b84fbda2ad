//! Ranking aggregation
//!
//! Mean-position scoring over peer evaluations. Only labels that appear in a
//! parsed order contribute votes; a label never mentioned anywhere receives
//! no entry at all.

use std::collections::BTreeMap;

use crate::council::ranking::{AggregateEntry, Label, RankingRecord};
use crate::core::participant::ParticipantId;

/// Compute aggregate standings across all peer rankings
///
/// For each label present in any parsed order, its 1-based positions are
/// collected across records and resolved through the label map. Entries are
/// sorted by mean position ascending, then vote count descending, then
/// participant id ascending.
pub fn aggregate_rankings(
    records: &[RankingRecord],
    label_to_model: &BTreeMap<Label, ParticipantId>,
) -> Vec<AggregateEntry> {
    let mut positions: BTreeMap<&ParticipantId, Vec<usize>> = BTreeMap::new();

    for record in records {
        for (i, label) in record.parsed_order.iter().enumerate() {
            // Labels outside the assignment contribute nothing
            if let Some(model) = label_to_model.get(label) {
                positions.entry(model).or_default().push(i + 1);
            }
        }
    }

    let mut aggregate: Vec<AggregateEntry> = positions
        .into_iter()
        .map(|(model, positions)| AggregateEntry {
            model: model.clone(),
            mean_position: positions.iter().sum::<usize>() as f64 / positions.len() as f64,
            vote_count: positions.len(),
        })
        .collect();

    aggregate.sort_by(|a, b| {
        a.mean_position
            .total_cmp(&b.mean_position)
            .then(b.vote_count.cmp(&a.vote_count))
            .then(a.model.cmp(&b.model))
    });

    aggregate
}

#[cfg(test)]
mod tests {
    use super::*;

    fn label_map(pairs: &[(char, &str)]) -> BTreeMap<Label, ParticipantId> {
        pairs
            .iter()
            .map(|(c, m)| (Label(*c), ParticipantId::new(*m)))
            .collect()
    }

    fn record(model: &str, order: &[char]) -> RankingRecord {
        RankingRecord::new(
            model.into(),
            "",
            order.iter().map(|c| Label(*c)).collect(),
        )
    }

    #[test]
    fn test_mean_positions_three_voters() {
        // P1 ranks B A C, P2 ranks B C A, P3 ranks A B C
        let records = vec![
            record("p1", &['B', 'A', 'C']),
            record("p2", &['B', 'C', 'A']),
            record("p3", &['A', 'B', 'C']),
        ];
        let map = label_map(&[('A', "p1"), ('B', "p2"), ('C', "p3")]);

        let aggregate = aggregate_rankings(&records, &map);

        assert_eq!(aggregate.len(), 3);
        assert_eq!(aggregate[0].model, "p2".into());
        assert!((aggregate[0].mean_position - 4.0 / 3.0).abs() < 1e-9);
        assert_eq!(aggregate[0].vote_count, 3);
        assert_eq!(aggregate[1].model, "p1".into());
        assert!((aggregate[1].mean_position - 2.0).abs() < 1e-9);
        assert_eq!(aggregate[2].model, "p3".into());
        assert!((aggregate[2].mean_position - 8.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_unknown_labels_ignored() {
        let records = vec![record("p1", &['A', 'Z'])];
        let map = label_map(&[('A', "p1"), ('B', "p2")]);

        let aggregate = aggregate_rankings(&records, &map);

        assert_eq!(aggregate.len(), 1);
        assert_eq!(aggregate[0].model, "p1".into());
        assert_eq!(aggregate[0].vote_count, 1);
    }

    #[test]
    fn test_absent_label_gets_no_entry() {
        // B is never mentioned by any evaluation
        let records = vec![record("p1", &['A']), record("p2", &['A'])];
        let map = label_map(&[('A', "p1"), ('B', "p2")]);

        let aggregate = aggregate_rankings(&records, &map);
        assert_eq!(aggregate.len(), 1);
    }

    #[test]
    fn test_ties_break_on_votes_then_model() {
        // A and B both mean 1.0, but A has two votes
        let records = vec![
            record("p1", &['A']),
            record("p2", &['A']),
            record("p3", &['B']),
        ];
        let map = label_map(&[('A', "m-a"), ('B', "m-b")]);

        let aggregate = aggregate_rankings(&records, &map);
        assert_eq!(aggregate[0].model, "m-a".into());
        assert_eq!(aggregate[1].model, "m-b".into());
    }

    #[test]
    fn test_weighted_sum_matches_recorded_positions() {
        let records = vec![
            record("p1", &['B', 'A', 'C']),
            record("p2", &['C', 'B']),
        ];
        let map = label_map(&[('A', "m-a"), ('B', "m-b"), ('C', "m-c")]);

        let aggregate = aggregate_rankings(&records, &map);
        let weighted: f64 = aggregate
            .iter()
            .map(|e| e.mean_position * e.vote_count as f64)
            .sum();
        // Positions recorded: 1+2+3 in the first ranking, 1+2 in the second
        assert!((weighted - 9.0).abs() < 1e-9);
    }
}
