use std::collections::BTreeSet;

use ghd_core::SearchError;
use ghd_graph::{random_graph, Edge, Edges, Graph, RandomGraphConfig};
use ghd_search::{
    run_to_completion, BalancedCheck, CombinationIterator, Generator, LocalSearch,
    LocalSearchFactory, Predicate, Search, SearchFactory, Snapshot, SplitCombinationIterator,
};
use proptest::prelude::*;

/// Accepts exactly the listed index combinations, resolved by edge name.
#[derive(Debug)]
struct AcceptNames(BTreeSet<Vec<u32>>);

impl Predicate for AcceptNames {
    fn tag(&self) -> &'static str {
        "accept-names"
    }

    fn check(&self, _graph: &Graph, separator: &Edges, _balance_factor: usize) -> bool {
        self.0.contains(&separator.names())
    }

    fn snapshot(&self) -> Result<Snapshot, SearchError> {
        Snapshot::capture(self.tag(), &self.0)
    }
}

/// Wraps a generator and records the order of protocol calls.
#[derive(Debug)]
struct Recording {
    inner: CombinationIterator,
    calls: Vec<String>,
}

impl Generator for Recording {
    fn tag(&self) -> &'static str {
        "recording"
    }

    fn has_next(&self) -> bool {
        self.inner.has_next()
    }

    fn get_next(&mut self) -> Result<Vec<usize>, SearchError> {
        let next = self.inner.get_next()?;
        self.calls.push(format!("get{next:?}"));
        Ok(next)
    }

    fn found(&mut self) {
        self.calls.push("found".into());
        self.inner.found();
    }

    fn confirm(&mut self) {
        self.calls.push("confirm".into());
        self.inner.confirm();
    }

    fn peek(&self) -> Option<&[usize]> {
        self.inner.peek()
    }

    fn snapshot(&self) -> Result<Snapshot, SearchError> {
        self.inner.snapshot()
    }
}

fn triangle() -> (Graph, Edges) {
    let edges = Edges::new(vec![
        Edge::new(10, [1, 2]),
        Edge::new(11, [2, 3]),
        Edge::new(12, [3, 1]),
    ]);
    (Graph::new(edges.clone()), edges)
}

#[test]
fn immediate_hit_resumes_after_the_winner() {
    let (graph, edges) = triangle();
    let predicate = AcceptNames([vec![10, 11]].into_iter().collect());
    let mut generator = CombinationIterator::new(3, 2);

    let outcome = run_to_completion(&graph, &edges, &predicate, &mut generator, 2).unwrap();
    assert_eq!(outcome.selection, vec![0, 1]);
    assert_eq!(outcome.evaluated, 1);
    assert_eq!(generator.peek(), Some(&[0, 2][..]));
    assert_eq!(generator.get_next().unwrap(), vec![0, 2]);
}

#[test]
fn full_exhaustion_reports_no_selection() {
    let (graph, edges) = triangle();
    let predicate = AcceptNames(BTreeSet::new());
    // shard 0 of 2 yields [0, 1] then [1, 2]
    let mut generator = SplitCombinationIterator::new(3, 2, 0, 2);

    let outcome = run_to_completion(&graph, &edges, &predicate, &mut generator, 2).unwrap();
    assert!(!outcome.is_valid());
    assert!(outcome.selection.is_empty());
    assert_eq!(outcome.evaluated, 2);
    assert!(!generator.has_next());
}

#[test]
fn found_precedes_confirm_exactly_once() {
    let (graph, edges) = triangle();
    let predicate = AcceptNames([vec![10, 12]].into_iter().collect());
    let mut generator = Recording {
        inner: CombinationIterator::new(3, 2),
        calls: Vec::new(),
    };

    let outcome = run_to_completion(&graph, &edges, &predicate, &mut generator, 2).unwrap();
    assert_eq!(outcome.selection, vec![0, 2]);
    assert_eq!(
        generator.calls,
        vec!["get[0, 1]", "confirm", "get[0, 2]", "found", "confirm"]
    );
    assert_eq!(generator.inner.found_positions(), &[vec![0, 2]]);
}

#[test]
fn out_of_range_candidates_surface_as_graph_errors() {
    let (graph, edges) = triangle();
    let mut generator = CombinationIterator::new(5, 2);
    // [0, 1], [0, 2], [0, 3] -> index 3 does not exist
    let err = run_to_completion(
        &graph,
        &edges,
        &AcceptNames(BTreeSet::new()),
        &mut generator,
        2,
    )
    .unwrap_err();
    assert!(matches!(err, SearchError::Graph(ref info) if info.code == "index-out-of-range"));
    assert_eq!(generator.confirmed(), 2);
}

#[test]
fn local_search_runs_rounds_until_exhausted() {
    let (graph, edges) = triangle();
    let predicate = AcceptNames([vec![10, 11], vec![11, 12]].into_iter().collect());
    let mut search = LocalSearch::new(
        graph,
        edges,
        2,
        Box::new(CombinationIterator::new(3, 2)),
    );

    search.advance(&predicate).unwrap();
    assert_eq!(search.current_result(), &[0, 1]);
    assert!(!search.is_exhausted());

    search.advance(&predicate).unwrap();
    assert_eq!(search.current_result(), &[1, 2]);

    search.advance(&predicate).unwrap();
    assert!(search.is_exhausted());
    assert!(search.current_result().is_empty());
    assert_eq!(search.evaluated(), 3);
}

#[test]
fn factory_rejects_multiple_shards() {
    let (graph, edges) = triangle();
    let shards: Vec<Box<dyn Generator>> = ghd_search::split_combinations(3, 2, 2)
        .into_iter()
        .map(|shard| Box::new(shard) as Box<dyn Generator>)
        .collect();
    let err = LocalSearchFactory
        .get_search(graph, edges, 2, shards)
        .err()
        .unwrap();
    assert!(matches!(err, SearchError::Config(ref info) if info.code == "unsupported-sharding"));
}

proptest! {
    #[test]
    fn loop_terminates_within_remaining_combinations(seed in any::<u64>(), k in 1usize..3) {
        let config = RandomGraphConfig { edges: 7, vertices: 8, max_arity: 3 };
        let graph = random_graph(&config, seed).unwrap();
        let edges = graph.edges.clone();
        let total = {
            let mut reference = CombinationIterator::new(edges.len(), k);
            let mut count = 0u64;
            while reference.has_next() {
                reference.get_next().unwrap();
                reference.confirm();
                count += 1;
            }
            count
        };

        let mut generator = CombinationIterator::new(edges.len(), k);
        let outcome = run_to_completion(&graph, &edges, &BalancedCheck, &mut generator, 2).unwrap();
        prop_assert!(outcome.evaluated <= total);

        // valid iff some combination passes the predicate
        let mut reference = CombinationIterator::new(edges.len(), k);
        let mut any_hit = false;
        while reference.has_next() {
            let indices = reference.get_next().unwrap();
            reference.confirm();
            let separator = ghd_graph::get_subset(&edges, &indices).unwrap();
            if BalancedCheck.check(&graph, &separator, 2) {
                any_hit = true;
                break;
            }
        }
        prop_assert_eq!(outcome.is_valid(), any_hit);
        if !outcome.is_valid() {
            prop_assert_eq!(outcome.evaluated, total);
        }
    }
}
