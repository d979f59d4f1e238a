use std::collections::VecDeque;

use super::graph::FamilyGraph;

/// Generation row of every person, plus the root each connected component
/// was assigned from (main root first).
#[derive(Debug, Clone)]
pub struct Generations {
    pub of: Vec<usize>,
    pub roots: Vec<usize>,
    pub max: usize,
}

impl Generations {
    pub fn count(&self) -> usize {
        if self.of.is_empty() { 0 } else { self.max + 1 }
    }
}

pub fn assign_generations(graph: &FamilyGraph<'_>) -> Generations {
    let mut assigned: Vec<Option<i64>> = vec![None; graph.len()];
    let mut roots = Vec::new();

    while let Some(root) = select_root(graph, &assigned) {
        let members = assign_component(graph, root, &mut assigned);
        // Each component is normalised so its topmost row is 0.
        let min = members
            .iter()
            .filter_map(|&pid| assigned[pid])
            .min()
            .unwrap_or(0);
        for &pid in &members {
            if let Some(generation) = assigned[pid].as_mut() {
                *generation -= min;
            }
        }
        roots.push(root);
    }

    let of: Vec<usize> = assigned
        .into_iter()
        .map(|generation| generation.unwrap_or(0).max(0) as usize)
        .collect();
    let max = of.iter().copied().max().unwrap_or(0);
    Generations { of, roots, max }
}

/// Among unassigned people without parents, the one with the most distinct
/// descendants; ties go to the earliest id. Falls back to the first
/// unassigned person when every candidate has parents.
fn select_root(graph: &FamilyGraph<'_>, assigned: &[Option<i64>]) -> Option<usize> {
    let mut best: Option<(usize, usize)> = None;
    for pid in 0..graph.len() {
        if assigned[pid].is_some() || !graph.parents(pid).is_empty() {
            continue;
        }
        let count = count_descendants(graph, pid);
        if best.is_none_or(|(_, best_count)| count > best_count) {
            best = Some((pid, count));
        }
    }
    best.map(|(pid, _)| pid)
        .or_else(|| (0..graph.len()).find(|&pid| assigned[pid].is_none()))
}

pub(super) fn count_descendants(graph: &FamilyGraph<'_>, start: usize) -> usize {
    let mut visited = vec![false; graph.len()];
    visited[start] = true;
    let mut stack = vec![start];
    let mut count = 0;
    while let Some(pid) = stack.pop() {
        for &child in graph.children(pid) {
            if !visited[child] {
                visited[child] = true;
                count += 1;
                stack.push(child);
            }
        }
    }
    count
}

/// Breadth-first over partner, child and parent edges. Returns the people
/// reached, in visiting order.
fn assign_component(
    graph: &FamilyGraph<'_>,
    root: usize,
    assigned: &mut [Option<i64>],
) -> Vec<usize> {
    let mut members = vec![root];
    let mut queue = VecDeque::from([root]);
    assigned[root] = Some(0);

    while let Some(pid) = queue.pop_front() {
        let Some(generation) = assigned[pid] else {
            continue;
        };
        let edges = graph
            .partners(pid)
            .iter()
            .map(|&p| (p, generation))
            .chain(graph.children(pid).iter().map(|&c| (c, generation + 1)))
            .chain(graph.parents(pid).iter().map(|&p| (p, generation - 1)));
        for (next, next_generation) in edges {
            if assigned[next].is_none() {
                assigned[next] = Some(next_generation);
                members.push(next);
                queue.push_back(next);
            }
        }
    }
    members
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{People, PeopleBuilder, Sex};

    fn generation_of(graph: &FamilyGraph<'_>, gens: &Generations, id: &str) -> usize {
        gens.of[graph.lookup(id).unwrap()]
    }

    fn three_generations() -> People {
        PeopleBuilder::new()
            .person("grandpa", "Grandpa", Sex::Male)
            .person("grandma", "Grandma", Sex::Female)
            .spouses("grandpa", "grandma")
            .couple_child("grandpa", "grandma", "dad")
            .spouses("dad", "mum")
            .couple_child("dad", "mum", "kid")
            .build()
    }

    #[test]
    fn root_is_parentless_person_with_most_descendants() {
        let people = three_generations();
        let graph = FamilyGraph::new(&people);
        let gens = assign_generations(&graph);
        assert_eq!(graph.id(gens.roots[0]), "grandma");
    }

    #[test]
    fn couples_share_rows_and_children_go_one_down() {
        let people = three_generations();
        let graph = FamilyGraph::new(&people);
        let gens = assign_generations(&graph);
        assert_eq!(generation_of(&graph, &gens, "grandpa"), 0);
        assert_eq!(generation_of(&graph, &gens, "grandma"), 0);
        assert_eq!(generation_of(&graph, &gens, "dad"), 1);
        assert_eq!(generation_of(&graph, &gens, "mum"), 1);
        assert_eq!(generation_of(&graph, &gens, "kid"), 2);
        assert_eq!(gens.count(), 3);
    }

    #[test]
    fn in_law_ancestors_shift_rows_to_zero() {
        // f's line has the most descendants, so c's parents end up one row
        // below it once the in-law marriage c+d aligns both lines.
        let people = PeopleBuilder::new()
            .couple_child("a", "b", "c")
            .couple_child("c", "d", "e")
            .couple_child("f", "g", "h")
            .couple_child("h", "i", "d")
            .build();
        let graph = FamilyGraph::new(&people);
        let gens = assign_generations(&graph);
        assert_eq!(gens.roots.len(), 1);
        let row = |id| generation_of(&graph, &gens, id);
        assert_eq!(row("d"), row("c"));
        assert_eq!(row("h") + 1, row("d"));
        assert_eq!(row("f"), 0);
        assert_eq!(row("a"), 1);
        assert_eq!(row("e"), 3);
    }

    #[test]
    fn disconnected_people_get_their_own_component() {
        let people = PeopleBuilder::new()
            .couple_child("a", "b", "c")
            .person("loner", "Loner", Sex::Unknown)
            .build();
        let graph = FamilyGraph::new(&people);
        let gens = assign_generations(&graph);
        assert_eq!(gens.roots.len(), 2);
        assert_eq!(generation_of(&graph, &gens, "loner"), 0);
    }

    #[test]
    fn parent_cycles_still_pick_a_root() {
        let people = PeopleBuilder::new().child("a", "b").child("b", "a").build();
        let graph = FamilyGraph::new(&people);
        let gens = assign_generations(&graph);
        assert_eq!(gens.roots, vec![0]);
        assert_eq!(gens.of.len(), 2);
    }

    #[test]
    fn empty_graph_has_no_generations() {
        let people = People::new();
        let graph = FamilyGraph::new(&people);
        let gens = assign_generations(&graph);
        assert!(gens.roots.is_empty());
        assert_eq!(gens.count(), 0);
    }
}
