use std::collections::HashSet;

use super::graph::FamilyGraph;

/// Parent set plus children, index form. `parents` is sorted by id.
#[derive(Debug, Clone, PartialEq)]
pub struct Family {
    pub parents: Vec<usize>,
    pub children: Vec<usize>,
    pub generation: usize,
}

/// Groups every person's children by the child's other recorded parent.
/// A family reached from both parents is emitted once, keyed by its sorted
/// parent tuple. Children are ordered by birth: undated children first, then
/// by year, then by the full date text; remaining ties keep record order.
pub fn extract_families(graph: &FamilyGraph<'_>, generations: &[usize]) -> Vec<Family> {
    let mut families = Vec::new();
    let mut seen: HashSet<Vec<usize>> = HashSet::new();

    for person in 0..graph.len() {
        let mut groups: Vec<(Option<usize>, Vec<usize>)> = Vec::new();
        for &child in graph.children(person) {
            let other = graph
                .parents(child)
                .iter()
                .copied()
                .find(|&parent| parent != person);
            match groups.iter_mut().find(|(key, _)| *key == other) {
                Some((_, kids)) => {
                    if !kids.contains(&child) {
                        kids.push(child);
                    }
                }
                None => groups.push((other, vec![child])),
            }
        }

        for (other, mut kids) in groups {
            let mut parents = match other {
                Some(other) => vec![person, other],
                None => vec![person],
            };
            parents.sort_by(|a, b| graph.id(*a).cmp(graph.id(*b)));
            if !seen.insert(parents.clone()) {
                continue;
            }
            kids.sort_by(|a, b| birth_key(graph, *a).cmp(&birth_key(graph, *b)));
            families.push(Family {
                generation: generations[parents[0]],
                parents,
                children: kids,
            });
        }
    }
    families
}

fn birth_key<'a>(graph: &FamilyGraph<'a>, pid: usize) -> (Option<i32>, &'a str) {
    let person = graph.person(pid);
    (person.birth_year(), person.birth.as_deref().unwrap_or(""))
}

/// Sum over multi-child families whose children sit on `generation` of the
/// index distance between the leftmost and rightmost child.
pub fn sibling_span(
    families: &[Family],
    generations: &[usize],
    generation: usize,
    index_of: impl Fn(usize) -> usize,
) -> usize {
    families
        .iter()
        .filter(|family| family.children.len() >= 2)
        .filter(|family| generations[family.children[0]] == generation)
        .map(|family| {
            let indices = family
                .children
                .iter()
                .filter(|&&child| generations[child] == generation)
                .map(|&child| index_of(child));
            let (min, max) = indices.fold((usize::MAX, 0), |(lo, hi), idx| {
                (lo.min(idx), hi.max(idx))
            });
            max.saturating_sub(min)
        })
        .sum()
}
