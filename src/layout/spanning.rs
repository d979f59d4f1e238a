use std::collections::VecDeque;

use super::family::Family;
use super::graph::FamilyGraph;

/// Strict spanning tree over the person graph: each child hangs under
/// exactly one of its recorded parents.
#[derive(Debug, Clone)]
pub struct SpanningTree {
    pub layout_children: Vec<Vec<usize>>,
    pub layout_parent: Vec<Option<usize>>,
}

impl SpanningTree {
    pub fn has_layout_parent(&self, pid: usize) -> bool {
        self.layout_parent[pid].is_some()
    }

    fn attach(&mut self, parent: usize, child: usize, pinned: &[bool]) {
        if pinned[child] || self.layout_parent[child].is_some() {
            return;
        }
        let mut ancestor = Some(parent);
        while let Some(pid) = ancestor {
            if pid == child {
                return;
            }
            ancestor = self.layout_parent[pid];
        }
        self.layout_parent[child] = Some(parent);
        self.layout_children[parent].push(child);
    }
}

/// Breadth-first from every component root across partner and child edges;
/// parent edges only widen the reachable set. The first parent to reach a
/// child adopts it. Children still unattached afterwards (in-law branches
/// found through parent edges only) go to their family's first parent,
/// upper generations first. Component roots are never adopted, even when
/// cyclic parent data gives them parents, and no one is adopted by their own
/// layout descendant, so the result is always a forest.
pub fn build_spanning_tree(
    graph: &FamilyGraph<'_>,
    roots: &[usize],
    families: &[Family],
) -> SpanningTree {
    let mut tree = SpanningTree {
        layout_children: vec![Vec::new(); graph.len()],
        layout_parent: vec![None; graph.len()],
    };
    let mut reachable = vec![false; graph.len()];
    let mut pinned = vec![false; graph.len()];
    for &root in roots {
        pinned[root] = true;
    }

    for &root in roots {
        if reachable[root] {
            continue;
        }
        reachable[root] = true;
        let mut queue = VecDeque::from([root]);
        while let Some(pid) = queue.pop_front() {
            for &partner in graph.partners(pid) {
                if !reachable[partner] {
                    reachable[partner] = true;
                    queue.push_back(partner);
                }
            }
            for &child in graph.children(pid) {
                tree.attach(pid, child, &pinned);
                if !reachable[child] {
                    reachable[child] = true;
                    queue.push_back(child);
                }
            }
            for &parent in graph.parents(pid) {
                if !reachable[parent] {
                    reachable[parent] = true;
                    queue.push_back(parent);
                }
            }
        }
    }

    let mut by_generation: Vec<&Family> = families.iter().collect();
    by_generation.sort_by_key(|family| family.generation);
    for family in by_generation {
        for &child in &family.children {
            tree.attach(family.parents[0], child, &pinned);
        }
    }

    tree
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{PeopleBuilder, Sex};
    use crate::layout::family::extract_families;
    use crate::layout::generation::assign_generations;

    #[test]
    fn first_reaching_parent_adopts_child() {
        let people = PeopleBuilder::new()
            .person("dad", "Dad", Sex::Male)
            .person("mum", "Mum", Sex::Female)
            .spouses("dad", "mum")
            .couple_child("dad", "mum", "kid")
            .build();
        let graph = FamilyGraph::new(&people);
        let gens = assign_generations(&graph);
        let families = extract_families(&graph, &gens.of);
        let tree = build_spanning_tree(&graph, &gens.roots, &families);
        let kid = graph.lookup("kid").unwrap();
        let root = gens.roots[0];
        assert_eq!(tree.layout_parent[kid], Some(root));
        assert_eq!(tree.layout_children[root], vec![kid]);
        assert!(!tree.has_layout_parent(root));
    }

    #[test]
    fn every_non_root_gets_exactly_one_parent() {
        let people = PeopleBuilder::new()
            .couple_child("a", "b", "c")
            .couple_child("c", "d", "e")
            .couple_child("f", "g", "d")
            .couple_child("c", "d", "h")
            .build();
        let graph = FamilyGraph::new(&people);
        let gens = assign_generations(&graph);
        let families = extract_families(&graph, &gens.of);
        let tree = build_spanning_tree(&graph, &gens.roots, &families);
        for pid in 0..graph.len() {
            let expected = !graph.parents(pid).is_empty();
            assert_eq!(tree.has_layout_parent(pid), expected, "{}", graph.id(pid));
            if let Some(parent) = tree.layout_parent[pid] {
                assert!(graph.parents(pid).contains(&parent));
            }
        }
        let adopted: usize = tree.layout_children.iter().map(Vec::len).sum();
        assert_eq!(adopted, 4);
    }

    #[test]
    fn cyclic_parents_keep_the_root_unadopted() {
        let people = PeopleBuilder::new().child("a", "b").child("b", "a").build();
        let graph = FamilyGraph::new(&people);
        let gens = assign_generations(&graph);
        let families = extract_families(&graph, &gens.of);
        let tree = build_spanning_tree(&graph, &gens.roots, &families);
        assert!(!tree.has_layout_parent(gens.roots[0]));
        assert_eq!(tree.layout_parent[1], Some(0));
    }

    #[test]
    fn parent_cycle_below_a_marriage_stays_a_forest() {
        // x and y list each other as parents; r only reaches them by marriage.
        let people = PeopleBuilder::new()
            .spouses("r", "x")
            .child("x", "y")
            .child("y", "x")
            .build();
        let graph = FamilyGraph::new(&people);
        let gens = assign_generations(&graph);
        let families = extract_families(&graph, &gens.of);
        let tree = build_spanning_tree(&graph, &gens.roots, &families);
        for start in 0..graph.len() {
            let mut steps = 0;
            let mut cursor = tree.layout_parent[start];
            while let Some(pid) = cursor {
                assert_ne!(pid, start, "{} is its own ancestor", graph.id(start));
                steps += 1;
                assert!(steps <= graph.len());
                cursor = tree.layout_parent[pid];
            }
        }
    }
}
