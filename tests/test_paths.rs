use vargraph::graph::VariationGraph;
use vargraph::handle::{Handle, PathHandle};

#[cfg(test)]
mod tests {
    use super::*;

    /// The two-node graph with one embedded path spelling ACGT.
    fn two_node_path() -> (VariationGraph, Handle, Handle, PathHandle) {
        let mut graph = VariationGraph::new();
        let h1 = graph.create_handle_with_id("AC", 1);
        let h2 = graph.create_handle_with_id("GT", 2);
        graph.create_edge(h1, h2);
        let path = graph.create_path_handle("p");
        graph.append_occurrence(path, h1);
        graph.append_occurrence(path, h2);
        (graph, h1, h2, path)
    }

    fn walk_ids(graph: &VariationGraph, path: PathHandle) -> Vec<(u64, bool)> {
        let mut steps = Vec::new();
        graph.for_each_occurrence_in_path(path, |occ| {
            let h = graph.get_occurrence(occ);
            steps.push((graph.get_id(h), graph.get_is_reverse(h)));
        });
        steps
    }

    #[test]
    fn test_two_node_path() {
        let (graph, h1, h2, path) = two_node_path();
        assert_eq!(graph.node_size(), 2);
        assert_eq!(graph.get_edge_count(), 1);
        assert_eq!(graph.get_path_count(), 1);
        assert!(graph.has_path("p"));
        assert!(!graph.has_path("q"));
        assert_eq!(graph.get_path_handle("p"), path);
        assert_eq!(graph.get_path_name(path), "p");
        assert_eq!(graph.get_occurrence_count(path), 2);
        assert!(!graph.is_empty(path));
        assert_eq!(graph.path_sequence(path), "ACGT");
        assert_eq!(graph.get_occurrence_count_on_handle(h1), 1);
        assert_eq!(graph.get_occurrence_count_on_handle(h2), 1);
        assert_eq!(walk_ids(&graph, path), vec![(1, false), (2, false)]);
    }

    #[test]
    fn test_first_last_and_links() {
        let (graph, _, _, path) = two_node_path();
        let first = graph.get_first_occurrence(path);
        let last = graph.get_last_occurrence(path);
        assert!(!graph.has_previous_occurrence(first));
        assert!(graph.has_next_occurrence(first));
        assert!(graph.has_previous_occurrence(last));
        assert!(!graph.has_next_occurrence(last));
        assert_eq!(graph.get_next_occurrence(first), last);
        assert_eq!(graph.get_previous_occurrence(last), first);
        assert_eq!(graph.get_path(first), path);
        assert_eq!(graph.get_path(last), path);
    }

    #[test]
    fn test_reverse_walk_matches_forward_walk() {
        let mut graph = VariationGraph::new();
        let h1 = graph.create_handle_with_id("AC", 1);
        let h2 = graph.create_handle_with_id("GT", 2);
        let h3 = graph.create_handle_with_id("TTA", 3);
        graph.create_edge(h1, h2);
        graph.create_edge(h2, h3);
        let path = graph.create_path_handle("walk");
        graph.append_occurrence(path, h1);
        graph.append_occurrence(path, h2);
        graph.append_occurrence(path, h3);
        let mut forward = Vec::new();
        let mut occ = graph.get_first_occurrence(path);
        forward.push(graph.get_sequence(graph.get_occurrence(occ)));
        let mut steps = 0;
        while graph.has_next_occurrence(occ) {
            occ = graph.get_next_occurrence(occ);
            forward.push(graph.get_sequence(graph.get_occurrence(occ)));
            steps += 1;
        }
        assert_eq!(steps + 1, graph.get_occurrence_count(path));
        assert_eq!(occ, graph.get_last_occurrence(path));
        let mut backward = Vec::new();
        let mut occ = graph.get_last_occurrence(path);
        backward.push(graph.get_sequence(graph.get_occurrence(occ)));
        while graph.has_previous_occurrence(occ) {
            occ = graph.get_previous_occurrence(occ);
            backward.push(graph.get_sequence(graph.get_occurrence(occ)));
        }
        backward.reverse();
        assert_eq!(forward.concat(), backward.concat());
        assert_eq!(forward.concat(), "ACGTTTA");
    }

    #[test]
    fn test_reverse_occurrences() {
        let mut graph = VariationGraph::new();
        let h1 = graph.create_handle_with_id("AC", 1);
        let h2 = graph.create_handle_with_id("GT", 2);
        graph.create_edge(h1, h2.flip());
        let path = graph.create_path_handle("rev");
        graph.append_occurrence(path, h1);
        graph.append_occurrence(path, h2.flip());
        assert_eq!(graph.path_sequence(path), "ACAC");
        assert_eq!(walk_ids(&graph, path), vec![(1, false), (2, true)]);
    }

    #[test]
    fn test_multiple_paths_share_a_node() {
        let mut graph = VariationGraph::new();
        let h1 = graph.create_handle_with_id("A", 1);
        let h2 = graph.create_handle_with_id("C", 2);
        let h3 = graph.create_handle_with_id("G", 3);
        graph.create_edge(h1, h2);
        graph.create_edge(h2, h3);
        let p1 = graph.create_path_handle("p1");
        let p2 = graph.create_path_handle("p2");
        graph.append_occurrence(p1, h1);
        graph.append_occurrence(p1, h2);
        graph.append_occurrence(p2, h2);
        graph.append_occurrence(p2, h3);
        assert_eq!(graph.get_occurrence_count_on_handle(h2), 2);
        let occs = graph.occurrences_of_handle(h2, false);
        assert_eq!(occs.len(), 2);
        let paths: Vec<PathHandle> = occs.iter().map(|o| graph.get_path(*o)).collect();
        assert!(paths.contains(&p1));
        assert!(paths.contains(&p2));
        assert_eq!(graph.path_sequence(p1), "AC");
        assert_eq!(graph.path_sequence(p2), "CG");
    }

    #[test]
    fn test_occurrences_of_handle_orientation_filter() {
        let mut graph = VariationGraph::new();
        let h = graph.create_handle_with_id("ACG", 1);
        let p = graph.create_path_handle("p");
        graph.append_occurrence(p, h);
        graph.append_occurrence(p, h.flip());
        graph.append_occurrence(p, h);
        assert_eq!(graph.occurrences_of_handle(h, false).len(), 3);
        let fwd = graph.occurrences_of_handle(h, true);
        assert_eq!(fwd.len(), 2);
        for occ in fwd {
            assert!(!graph.get_occurrence(occ).is_reverse());
        }
        let rev = graph.occurrences_of_handle(h.flip(), true);
        assert_eq!(rev.len(), 1);
    }

    #[test]
    fn test_path_revisits_a_node() {
        let mut graph = VariationGraph::new();
        let h1 = graph.create_handle_with_id("AC", 1);
        let h2 = graph.create_handle_with_id("GT", 2);
        graph.create_edge(h1, h2);
        graph.create_edge(h2, h1);
        let path = graph.create_path_handle("loop");
        graph.append_occurrence(path, h1);
        graph.append_occurrence(path, h2);
        graph.append_occurrence(path, h1);
        assert_eq!(graph.get_occurrence_count(path), 3);
        assert_eq!(graph.get_occurrence_count_on_handle(h1), 2);
        assert_eq!(graph.path_sequence(path), "ACGTAC");
        assert_eq!(
            walk_ids(&graph, path),
            vec![(1, false), (2, false), (1, false)]
        );
    }

    #[test]
    fn test_for_each_path_handle_skips_empty() {
        let mut graph = VariationGraph::new();
        let h = graph.create_handle_with_id("A", 1);
        let p1 = graph.create_path_handle("full");
        let _p2 = graph.create_path_handle("empty");
        graph.append_occurrence(p1, h);
        assert_eq!(graph.get_path_count(), 2);
        let mut seen = Vec::new();
        graph.for_each_path_handle(|p| seen.push(p));
        assert_eq!(seen, vec![p1]);
    }

    #[test]
    fn test_destroy_path() {
        let mut graph = VariationGraph::new();
        let h1 = graph.create_handle_with_id("A", 1);
        let h2 = graph.create_handle_with_id("C", 2);
        let p1 = graph.create_path_handle("doomed");
        let p2 = graph.create_path_handle("kept");
        graph.append_occurrence(p1, h1);
        graph.append_occurrence(p1, h2);
        graph.append_occurrence(p2, h1);
        graph.append_occurrence(p2, h2);
        graph.destroy_path(p1);
        assert!(!graph.has_path("doomed"));
        assert!(graph.has_path("kept"));
        assert_eq!(graph.get_path_count(), 1);
        assert_eq!(graph.get_occurrence_count_on_handle(h1), 1);
        assert_eq!(graph.get_occurrence_count_on_handle(h2), 1);
        assert_eq!(graph.path_sequence(p2), "AC");
        // path ids are never reused
        let p3 = graph.create_path_handle("fresh");
        assert!(p3.as_integer() > p1.as_integer());
    }

    #[test]
    fn test_destroy_path_with_node_revisits() {
        let mut graph = VariationGraph::new();
        let h1 = graph.create_handle_with_id("AC", 1);
        let h2 = graph.create_handle_with_id("GT", 2);
        let p1 = graph.create_path_handle("loop");
        let p2 = graph.create_path_handle("other");
        graph.append_occurrence(p1, h1);
        graph.append_occurrence(p1, h2);
        graph.append_occurrence(p1, h1);
        graph.append_occurrence(p2, h1);
        graph.destroy_path(p1);
        assert_eq!(graph.get_occurrence_count_on_handle(h1), 1);
        assert_eq!(graph.get_occurrence_count_on_handle(h2), 0);
        assert_eq!(graph.path_sequence(p2), "AC");
    }

    #[test]
    fn test_destroy_empty_path() {
        let mut graph = VariationGraph::new();
        let p = graph.create_path_handle("empty");
        assert_eq!(graph.get_path_count(), 1);
        graph.destroy_path(p);
        assert_eq!(graph.get_path_count(), 0);
        assert!(!graph.has_path("empty"));
        // the name can be reused afterwards
        graph.create_path_handle("empty");
        assert!(graph.has_path("empty"));
    }

    #[test]
    fn test_replace_occurrence_with_chain() {
        let (mut graph, h1, _, path) = two_node_path();
        // split node 1's visit by hand into two fresh nodes spelling AC
        let a = graph.create_handle_with_id("A", 10);
        let c = graph.create_handle_with_id("C", 11);
        let occ = graph.occurrences_of_handle(h1, false)[0];
        let new_occs = graph.replace_occurrence(occ, &[a, c]);
        assert_eq!(new_occs.len(), 2);
        assert_eq!(graph.get_occurrence_count(path), 3);
        assert_eq!(graph.path_sequence(path), "ACGT");
        assert_eq!(graph.get_occurrence_count_on_handle(h1), 0);
        assert_eq!(
            walk_ids(&graph, path),
            vec![(10, false), (11, false), (2, false)]
        );
    }

    #[test]
    fn test_set_occurrence_updates_endpoints() {
        let (mut graph, h1, _, path) = two_node_path();
        let twin = graph.create_handle_with_id("AC", 5);
        let occ = graph.occurrences_of_handle(h1, false)[0];
        let moved = graph.set_occurrence(occ, twin);
        assert_eq!(graph.get_occurrence(moved), twin);
        assert_eq!(graph.get_first_occurrence(path), moved);
        assert_eq!(graph.path_sequence(path), "ACGT");
        assert_eq!(walk_ids(&graph, path), vec![(5, false), (2, false)]);
    }

    #[test]
    fn test_divide_handle_updates_paths() {
        let (mut graph, h1, _, path) = two_node_path();
        let parts = graph.divide_handle(h1, &[1]);
        assert_eq!(parts.len(), 2);
        assert_eq!(graph.get_occurrence_count(path), 3);
        assert_eq!(graph.path_sequence(path), "ACGT");
        assert_eq!(
            walk_ids(&graph, path),
            vec![(3, false), (4, false), (2, false)]
        );
    }

    #[test]
    fn test_divide_handle_updates_reverse_paths() {
        let mut graph = VariationGraph::new();
        let h1 = graph.create_handle_with_id("ACGG", 1);
        let path = graph.create_path_handle("rev");
        graph.append_occurrence(path, h1.flip());
        assert_eq!(graph.path_sequence(path), "CCGT");
        graph.divide_handle(h1, &[2]);
        assert_eq!(graph.get_occurrence_count(path), 2);
        assert_eq!(graph.path_sequence(path), "CCGT");
        let steps = walk_ids(&graph, path);
        assert!(steps.iter().all(|&(_, rev)| rev));
    }

    #[test]
    fn test_apply_orientation_keeps_path_spelling() {
        let (mut graph, h1, _, path) = two_node_path();
        let new_h1 = graph.apply_orientation(h1.flip());
        assert_eq!(graph.get_sequence(new_h1), "GT");
        // the visit is now recorded against the flipped strand
        assert_eq!(walk_ids(&graph, path), vec![(1, true), (2, false)]);
        assert_eq!(graph.path_sequence(path), "ACGT");
    }

    #[test]
    fn test_destroy_handle_moves_path_onto_hidden_node() {
        let (mut graph, h1, _, path) = two_node_path();
        graph.destroy_handle(h1);
        // one original node plus one hidden node carrying AC
        assert_eq!(graph.node_size(), 2);
        assert_eq!(graph.get_edge_count(), 0);
        assert!(!graph.has_node(1));
        assert_eq!(graph.get_occurrence_count(path), 2);
        assert_eq!(graph.path_sequence(path), "ACGT");
        // the hidden node answers queries but not has_node
        let first = graph.get_first_occurrence(path);
        let hidden = graph.get_occurrence(first);
        assert_eq!(graph.get_sequence(hidden), "AC");
        assert!(!graph.has_node(graph.get_id(hidden)));
    }

    #[test]
    fn test_destroy_handle_preserves_reverse_visits() {
        let mut graph = VariationGraph::new();
        let h1 = graph.create_handle_with_id("ACG", 1);
        let path = graph.create_path_handle("rev");
        graph.append_occurrence(path, h1.flip());
        assert_eq!(graph.path_sequence(path), "CGT");
        graph.destroy_handle(h1);
        assert_eq!(graph.get_occurrence_count(path), 1);
        assert_eq!(graph.path_sequence(path), "CGT");
        let visit = graph.get_occurrence(graph.get_first_occurrence(path));
        assert!(visit.is_reverse());
    }

    #[test]
    fn test_destroy_handle_with_revisits() {
        let mut graph = VariationGraph::new();
        let h1 = graph.create_handle_with_id("AC", 1);
        let h2 = graph.create_handle_with_id("GT", 2);
        graph.create_edge(h1, h2);
        graph.create_edge(h2, h1);
        let path = graph.create_path_handle("loop");
        graph.append_occurrence(path, h1);
        graph.append_occurrence(path, h2);
        graph.append_occurrence(path, h1);
        graph.destroy_handle(h1);
        assert_eq!(graph.get_occurrence_count(path), 3);
        assert_eq!(graph.path_sequence(path), "ACGTAC");
    }

    #[test]
    #[should_panic(expected = "already exists")]
    fn test_duplicate_path_name_panics() {
        let mut graph = VariationGraph::new();
        graph.create_path_handle("p");
        graph.create_path_handle("p");
    }

    #[test]
    #[should_panic(expected = "unknown path name")]
    fn test_unknown_path_name_panics() {
        let graph = VariationGraph::new();
        graph.get_path_handle("missing");
    }
}
