//! Ranked shortest-path search.
//!
//! A Dijkstra variant over a [`petgraph`] directed multigraph. Candidates are
//! ordered by cumulative edge weight, then by the [`EdgeRank`] of the edge
//! that reached them, then by hop count, then by edge index (registration
//! order) so that the outcome is deterministic.
//!
//! The caller supplies the cost function. Returning `None` for an edge hides
//! it, which is how scope-gated resolution restricts the graph without
//! copying it.

use petgraph::graph::{DiGraph, EdgeIndex, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use std::cmp::Ordering;
use std::collections::hash_map::Entry;
use std::collections::{BinaryHeap, HashMap};
use std::fmt;

/// Secondary ordering of an edge once weights tie.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EdgeRank {
    /// Defined in (or above) the caller's own namespace.
    pub local: bool,
    /// Namespace specificity score; higher wins.
    pub specificity: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EdgeCost {
    pub weight: u32,
    pub rank: EdgeRank,
    /// Identity of the conversion behind the edge; two edges with equal keys
    /// and different identities are an ambiguity.
    pub identity: usize,
}

/// Equally ranked alternatives seen when a node was finalized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tie {
    pub node: NodeIndex,
    pub chosen: EdgeIndex,
    pub rivals: Vec<EdgeIndex>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShortestPath {
    pub nodes: Vec<NodeIndex>,
    pub edges: Vec<EdgeIndex>,
    pub cost: u64,
    pub ties: Vec<Tie>,
}

impl ShortestPath {
    /// Concatenate `self` (ending at a waypoint) with `next` (starting there).
    fn join(mut self, next: ShortestPath) -> ShortestPath {
        self.nodes.extend(next.nodes.into_iter().skip(1));
        self.edges.extend(next.edges);
        self.cost += next.cost;
        self.ties.extend(next.ties);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathError {
    NodeNotFound(NodeIndex),
    NoPath {
        origin: NodeIndex,
        destination: NodeIndex,
    },
}

impl fmt::Display for PathError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathError::NodeNotFound(node) => write!(f, "node {} is not in the graph", node.index()),
            PathError::NoPath {
                origin,
                destination,
            } => write!(
                f,
                "no path from node {} to node {}",
                origin.index(),
                destination.index()
            ),
        }
    }
}

impl std::error::Error for PathError {}

type Key = (u64, bool, i64, usize);

#[derive(Debug)]
struct Candidate {
    cost: u64,
    rank: EdgeRank,
    hops: usize,
    node: NodeIndex,
    via: Option<EdgeIndex>,
}

impl Candidate {
    /// Smaller is better.
    fn key(&self) -> Key {
        (self.cost, !self.rank.local, -self.rank.specificity, self.hops)
    }

    fn seq(&self) -> usize {
        self.via.map(|e| e.index()).unwrap_or(0)
    }
}

impl Ord for Candidate {
    fn cmp(&self, other: &Self) -> Ordering {
        // BinaryHeap is a max-heap
        other
            .key()
            .cmp(&self.key())
            .then_with(|| other.seq().cmp(&self.seq()))
    }
}

impl PartialOrd for Candidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Candidate {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Candidate {}

struct Best {
    key: Key,
    contenders: Vec<(EdgeIndex, usize)>,
}

/// Find the best path from `origin` to `destination`.
///
/// With an `intermediate` distinct from `origin`, the path is forced through
/// it: origin -> intermediate and intermediate -> destination are searched
/// separately and joined.
pub fn find_shortest_path<N, E, F>(
    graph: &DiGraph<N, E>,
    origin: NodeIndex,
    destination: NodeIndex,
    intermediate: Option<NodeIndex>,
    mut cost: F,
) -> Result<ShortestPath, PathError>
where
    F: FnMut(EdgeIndex, &E) -> Option<EdgeCost>,
{
    match intermediate.filter(|via| *via != origin) {
        Some(via) => {
            let first = search(graph, origin, via, &mut cost)?;
            let second = search(graph, via, destination, &mut cost)?;
            Ok(first.join(second))
        }
        None => search(graph, origin, destination, &mut cost),
    }
}

fn search<N, E, F>(
    graph: &DiGraph<N, E>,
    origin: NodeIndex,
    destination: NodeIndex,
    cost: &mut F,
) -> Result<ShortestPath, PathError>
where
    F: FnMut(EdgeIndex, &E) -> Option<EdgeCost>,
{
    for node in [origin, destination] {
        if graph.node_weight(node).is_none() {
            return Err(PathError::NodeNotFound(node));
        }
    }

    let mut parents: HashMap<NodeIndex, Option<EdgeIndex>> = HashMap::new();
    let mut best: HashMap<NodeIndex, Best> = HashMap::new();
    let mut ties = Vec::new();
    let mut heap = BinaryHeap::new();
    let mut total = None;

    heap.push(Candidate {
        cost: 0,
        rank: EdgeRank::default(),
        hops: 0,
        node: origin,
        via: None,
    });

    while let Some(current) = heap.pop() {
        if parents.contains_key(&current.node) {
            continue;
        }
        parents.insert(current.node, current.via);

        if let (Some(chosen), Some(entry)) = (current.via, best.get(&current.node)) {
            if entry.key == current.key() {
                if let Some(tie) = tie_for(current.node, chosen, &entry.contenders) {
                    ties.push(tie);
                }
            }
        }

        if current.node == destination {
            total = Some(current.cost);
            break;
        }

        let mut outgoing: Vec<_> = graph
            .edges_directed(current.node, Direction::Outgoing)
            .collect();
        outgoing.sort_by_key(|edge| edge.id());

        for edge in outgoing {
            let next = edge.target();
            if parents.contains_key(&next) {
                continue;
            }
            let Some(edge_cost) = cost(edge.id(), edge.weight()) else {
                continue;
            };

            let candidate = Candidate {
                cost: current.cost + u64::from(edge_cost.weight),
                rank: edge_cost.rank,
                hops: current.hops + 1,
                node: next,
                via: Some(edge.id()),
            };
            record_contender(&mut best, &candidate, edge_cost.identity);
            heap.push(candidate);
        }
    }

    let Some(total_cost) = total else {
        return Err(PathError::NoPath {
            origin,
            destination,
        });
    };

    let mut edges = Vec::new();
    let mut node = destination;
    while let Some(Some(edge)) = parents.get(&node) {
        edges.push(*edge);
        let Some((source, _)) = graph.edge_endpoints(*edge) else {
            break;
        };
        node = source;
    }
    edges.reverse();

    let mut nodes = vec![origin];
    nodes.extend(
        edges
            .iter()
            .filter_map(|edge| graph.edge_endpoints(*edge).map(|(_, target)| target)),
    );

    Ok(ShortestPath {
        nodes,
        edges,
        cost: total_cost,
        ties,
    })
}

fn record_contender(best: &mut HashMap<NodeIndex, Best>, candidate: &Candidate, identity: usize) {
    let Some(edge) = candidate.via else {
        return;
    };
    let key = candidate.key();
    match best.entry(candidate.node) {
        Entry::Vacant(slot) => {
            slot.insert(Best {
                key,
                contenders: vec![(edge, identity)],
            });
        }
        Entry::Occupied(mut slot) => {
            let entry = slot.get_mut();
            if key < entry.key {
                entry.key = key;
                entry.contenders = vec![(edge, identity)];
            } else if key == entry.key {
                entry.contenders.push((edge, identity));
            }
        }
    }
}

fn tie_for(node: NodeIndex, chosen: EdgeIndex, contenders: &[(EdgeIndex, usize)]) -> Option<Tie> {
    let chosen_identity = contenders
        .iter()
        .find(|(edge, _)| *edge == chosen)
        .map(|(_, identity)| *identity)?;
    let rivals: Vec<EdgeIndex> = contenders
        .iter()
        .filter(|(_, identity)| *identity != chosen_identity)
        .map(|(edge, _)| *edge)
        .collect();
    if rivals.is_empty() {
        None
    } else {
        Some(Tie {
            node,
            chosen,
            rivals,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Link {
        weight: u32,
        rank: EdgeRank,
        visible: bool,
    }

    fn link(weight: u32) -> Link {
        Link {
            weight,
            rank: EdgeRank::default(),
            visible: true,
        }
    }

    type Fixture = (DiGraph<&'static str, Link>, HashMap<&'static str, NodeIndex>);

    fn graph(edges: &[(&'static str, &'static str, Link)]) -> Fixture {
        let mut g = DiGraph::new();
        let mut nodes = HashMap::new();
        for (from, to, _) in edges {
            for name in [*from, *to] {
                if !nodes.contains_key(name) {
                    nodes.insert(name, g.add_node(name));
                }
            }
        }
        for (from, to, data) in edges {
            g.add_edge(
                nodes[from],
                nodes[to],
                Link {
                    weight: data.weight,
                    rank: data.rank,
                    visible: data.visible,
                },
            );
        }
        (g, nodes)
    }

    fn by_weight(edge: EdgeIndex, link: &Link) -> Option<EdgeCost> {
        link.visible.then_some(EdgeCost {
            weight: link.weight,
            rank: link.rank,
            identity: edge.index(),
        })
    }

    fn names(g: &DiGraph<&'static str, Link>, path: &ShortestPath) -> Vec<&'static str> {
        path.nodes.iter().map(|n| g[*n]).collect()
    }

    fn sample() -> Fixture {
        graph(&[
            ("A", "B", link(0)),
            ("B", "C", link(0)),
            ("A", "Base", link(1)),
            ("Base", "C", link(0)),
        ])
    }

    #[test]
    fn test_simple_graph() {
        let (g, n) = sample();
        let path = find_shortest_path(&g, n["A"], n["C"], None, by_weight).unwrap();
        assert_eq!(names(&g, &path), vec!["A", "B", "C"]);
        assert_eq!(path.cost, 0);
        assert_eq!(path.edges.len(), 2);
    }

    #[test]
    fn test_simple_graph_intermediate() {
        let (g, n) = sample();
        let path = find_shortest_path(&g, n["A"], n["C"], Some(n["Base"]), by_weight).unwrap();
        assert_eq!(names(&g, &path), vec!["A", "Base", "C"]);
        assert_eq!(path.cost, 1);
    }

    #[test]
    fn test_intermediate_equal_to_origin_is_ignored() {
        let (g, n) = sample();
        let path = find_shortest_path(&g, n["A"], n["C"], Some(n["A"]), by_weight).unwrap();
        assert_eq!(names(&g, &path), vec!["A", "B", "C"]);
    }

    #[test]
    fn test_simple_graph_exceptions() {
        let (mut g, n) = graph(&[
            ("A", "B", link(0)),
            ("B", "C", link(0)),
            ("A", "Base", link(1)),
            ("D", "Base", link(0)),
            ("Base", "C", link(0)),
        ]);

        assert_eq!(
            find_shortest_path(&g, n["A"], n["D"], None, by_weight),
            Err(PathError::NoPath {
                origin: n["A"],
                destination: n["D"]
            })
        );

        let missing = NodeIndex::new(g.node_count() + 3);
        assert_eq!(
            find_shortest_path(&g, n["A"], missing, None, by_weight),
            Err(PathError::NodeNotFound(missing))
        );

        // Hidden edges do not exist for the search.
        g.add_edge(n["C"], n["D"], Link { weight: 0, rank: EdgeRank::default(), visible: false });
        assert!(find_shortest_path(&g, n["A"], n["D"], None, by_weight).is_err());
    }

    #[test]
    fn test_origin_is_destination() {
        let (g, n) = sample();
        let path = find_shortest_path(&g, n["B"], n["B"], None, by_weight).unwrap();
        assert_eq!(names(&g, &path), vec!["B"]);
        assert!(path.edges.is_empty());
    }

    #[test]
    fn test_rank_breaks_weight_ties() {
        let ranked = |edge: EdgeIndex, link: &Link| {
            Some(EdgeCost { weight: link.weight, rank: link.rank, identity: edge.index() })
        };

        let foreign = EdgeRank { local: false, specificity: 5 };
        let local = EdgeRank { local: true, specificity: 1 };
        let (g, n) = graph(&[
            ("A", "Z", Link { weight: 0, rank: foreign, visible: true }),
            ("A", "Z", Link { weight: 0, rank: local, visible: true }),
        ]);
        let path = find_shortest_path(&g, n["A"], n["Z"], None, ranked).unwrap();
        assert_eq!(path.edges, vec![EdgeIndex::new(1)]);
        assert!(path.ties.is_empty());

        let shallow = EdgeRank { local: false, specificity: 1 };
        let deep = EdgeRank { local: false, specificity: 3 };
        let (g, n) = graph(&[
            ("A", "Z", Link { weight: 0, rank: shallow, visible: true }),
            ("A", "Z", Link { weight: 0, rank: deep, visible: true }),
        ]);
        let path = find_shortest_path(&g, n["A"], n["Z"], None, ranked).unwrap();
        assert_eq!(path.edges, vec![EdgeIndex::new(1)]);

        // Weight always dominates locality.
        let (g, n) = graph(&[
            ("A", "Z", Link { weight: 1, rank: local, visible: true }),
            ("A", "Z", Link { weight: 0, rank: foreign, visible: true }),
        ]);
        let path = find_shortest_path(&g, n["A"], n["Z"], None, ranked).unwrap();
        assert_eq!(path.edges, vec![EdgeIndex::new(1)]);
    }

    #[test]
    fn test_fewer_hops_win_equal_cost() {
        let (g, n) = graph(&[
            ("A", "B", link(0)),
            ("B", "C", link(0)),
            ("A", "C", link(0)),
        ]);
        let path = find_shortest_path(&g, n["A"], n["C"], None, by_weight).unwrap();
        assert_eq!(names(&g, &path), vec!["A", "C"]);
        assert!(path.ties.is_empty());

        let path = find_shortest_path(&g, n["A"], n["C"], Some(n["B"]), by_weight).unwrap();
        assert_eq!(names(&g, &path), vec!["A", "B", "C"]);
    }

    #[test]
    fn test_parallel_edges_report_ties() {
        let (g, n) = graph(&[("A", "B", link(0)), ("A", "B", link(0))]);
        let path = find_shortest_path(&g, n["A"], n["B"], None, by_weight).unwrap();

        assert_eq!(path.edges, vec![EdgeIndex::new(0)]);
        assert_eq!(
            path.ties,
            vec![Tie {
                node: n["B"],
                chosen: EdgeIndex::new(0),
                rivals: vec![EdgeIndex::new(1)]
            }]
        );

        // Same identity on both edges is not an ambiguity.
        let path = find_shortest_path(&g, n["A"], n["B"], None, |_, link: &Link| {
            Some(EdgeCost { weight: link.weight, rank: link.rank, identity: 7 })
        })
        .unwrap();
        assert!(path.ties.is_empty());
    }
}
