use chrono::Duration;
use stitch_core::ActivitySignal;

/// Cut a component wherever consecutive activities are more than `max_gap` apart.
///
/// Members are ordered by `(timestamp, id)` first, so the result does not
/// depend on the input order. Each returned piece is in time order.
pub fn split_by_time_gap(
    members: &[usize],
    signals: &[ActivitySignal],
    max_gap: Duration,
) -> Vec<Vec<usize>> {
    let mut ordered = members.to_vec();
    ordered.sort_by(|&a, &b| {
        signals[a]
            .timestamp
            .cmp(&signals[b].timestamp)
            .then_with(|| signals[a].id.cmp(&signals[b].id))
    });

    let mut pieces: Vec<Vec<usize>> = Vec::new();
    let mut current: Vec<usize> = Vec::new();
    for index in ordered {
        if let Some(&last) = current.last() {
            if signals[index].timestamp - signals[last].timestamp > max_gap {
                pieces.push(std::mem::take(&mut current));
            }
        }
        current.push(index);
    }
    if !current.is_empty() {
        pieces.push(current);
    }
    pieces
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeZone, Utc};
    use proptest::prelude::*;

    fn signal_at(id: &str, timestamp: DateTime<Utc>) -> ActivitySignal {
        ActivitySignal {
            id: id.into(),
            source: "github".into(),
            timestamp,
            title: String::new(),
            refs: vec![],
            collaborators: vec![],
            container: None,
            keywords: vec![],
            parent_id: None,
            current_cluster_id: None,
        }
    }

    fn day(month: u32, day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, month, day, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_january_and_february_bursts_split_in_two() {
        let signals = vec![
            signal_at("a", day(1, 1)),
            signal_at("b", day(1, 4)),
            signal_at("c", day(1, 10)),
            signal_at("d", day(2, 1)),
            signal_at("e", day(2, 5)),
        ];
        let pieces = split_by_time_gap(&[4, 2, 0, 3, 1], &signals, Duration::days(14));
        assert_eq!(pieces, vec![vec![0, 1, 2], vec![3, 4]]);
    }

    #[test]
    fn test_gap_of_exactly_threshold_is_kept_together() {
        let signals = vec![signal_at("a", day(3, 1)), signal_at("b", day(3, 15))];
        let pieces = split_by_time_gap(&[0, 1], &signals, Duration::days(14));
        assert_eq!(pieces, vec![vec![0, 1]]);
    }

    #[test]
    fn test_equal_timestamps_ordered_by_id() {
        let signals = vec![signal_at("z", day(3, 1)), signal_at("a", day(3, 1))];
        let pieces = split_by_time_gap(&[0, 1], &signals, Duration::days(14));
        assert_eq!(pieces, vec![vec![1, 0]]);
    }

    #[test]
    fn test_empty_members() {
        assert!(split_by_time_gap(&[], &[], Duration::days(14)).is_empty());
    }

    proptest! {
        #[test]
        fn prop_pieces_cover_input_and_respect_gap(offsets in prop::collection::vec(0i64..240, 0..40)) {
            let base = day(1, 1);
            let signals: Vec<ActivitySignal> = offsets
                .iter()
                .enumerate()
                .map(|(i, hours)| signal_at(&format!("s{i:02}"), base + Duration::hours(hours * 12)))
                .collect();
            let members: Vec<usize> = (0..signals.len()).collect();
            let gap = Duration::days(14);
            let pieces = split_by_time_gap(&members, &signals, gap);

            let mut covered: Vec<usize> = pieces.iter().flatten().copied().collect();
            covered.sort_unstable();
            prop_assert_eq!(covered, members);

            for piece in &pieces {
                for pair in piece.windows(2) {
                    prop_assert!(signals[pair[1]].timestamp - signals[pair[0]].timestamp <= gap);
                }
            }
            for pair in pieces.windows(2) {
                let last = *pair[0].last().unwrap();
                let first = pair[1][0];
                prop_assert!(signals[first].timestamp - signals[last].timestamp > gap);
            }
        }
    }
}
