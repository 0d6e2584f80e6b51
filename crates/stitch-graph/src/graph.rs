use std::collections::VecDeque;

use stitch_config::ClusteringConfig;
use stitch_core::ActivitySignal;

use crate::edge::{EdgeFeatures, EdgeKind, classify};

/// Undirected activity graph over a flat signal arena.
///
/// Nodes are indices into `signals`; each adjacency entry records the
/// strongest rule that connected the pair.
#[derive(Debug, Clone, Default)]
pub struct ActivityGraph {
    signals: Vec<ActivitySignal>,
    adjacency: Vec<Vec<(usize, EdgeKind)>>,
}

impl ActivityGraph {
    /// Evaluate every pair once and record symmetric edges.
    pub fn build(signals: Vec<ActivitySignal>, config: &ClusteringConfig) -> Self {
        let adjacency = {
            let features: Vec<EdgeFeatures<'_>> =
                signals.iter().map(EdgeFeatures::new).collect();
            let mut adjacency = vec![Vec::new(); signals.len()];

            for i in 0..signals.len() {
                for j in (i + 1)..signals.len() {
                    if let Some(kind) = classify(
                        (&signals[i], &features[i]),
                        (&signals[j], &features[j]),
                        config,
                    ) {
                        adjacency[i].push((j, kind));
                        adjacency[j].push((i, kind));
                    }
                }
            }
            adjacency
        };

        Self { signals, adjacency }
    }

    pub fn signals(&self) -> &[ActivitySignal] {
        &self.signals
    }

    pub fn signal(&self, index: usize) -> &ActivitySignal {
        &self.signals[index]
    }

    pub fn node_count(&self) -> usize {
        self.signals.len()
    }

    pub fn edge_count(&self) -> usize {
        self.adjacency.iter().map(Vec::len).sum::<usize>() / 2
    }

    pub fn degree(&self, index: usize) -> usize {
        self.adjacency[index].len()
    }

    /// Number of edges of each kind, strongest first.
    pub fn edge_histogram(&self) -> Vec<(EdgeKind, usize)> {
        let kinds = [
            EdgeKind::ExplicitRef,
            EdgeKind::Containment,
            EdgeKind::Container,
            EdgeKind::Collaborator,
            EdgeKind::Lexical,
        ];
        kinds
            .into_iter()
            .map(|kind| {
                let count = self
                    .adjacency
                    .iter()
                    .flatten()
                    .filter(|(_, k)| *k == kind)
                    .count()
                    / 2;
                (kind, count)
            })
            .collect()
    }

    /// Connected components over the edges accepted by `keep`, found by BFS.
    ///
    /// Components come out in order of their lowest node index; members are
    /// in ascending index order.
    pub fn components<F>(&self, keep: F) -> Vec<Vec<usize>>
    where
        F: Fn(EdgeKind) -> bool,
    {
        let mut visited = vec![false; self.signals.len()];
        let mut components = Vec::new();

        for start in 0..self.signals.len() {
            if visited[start] {
                continue;
            }
            visited[start] = true;
            let mut queue = VecDeque::from([start]);
            let mut members = Vec::new();

            while let Some(node) = queue.pop_front() {
                members.push(node);
                for &(next, kind) in &self.adjacency[node] {
                    if !visited[next] && keep(kind) {
                        visited[next] = true;
                        queue.push_back(next);
                    }
                }
            }

            members.sort_unstable();
            components.push(members);
        }

        components
    }
}
