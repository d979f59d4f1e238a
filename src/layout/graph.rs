//! Read-only, index-addressed view over a person map.
//!
//! People are numbered densely in id order. Every relationship list is
//! filtered to ids present in the map, stripped of self references and
//! duplicates, and made reciprocal, so the partner relation derived here is
//! symmetric even when only one side of a link was recorded.

use std::collections::{HashMap, HashSet, VecDeque};

use crate::ir::{People, Person};

/// Partners of one person, split by how the partnership is known.
#[derive(Debug, Clone, Copy)]
pub struct PartnerSet<'g> {
    pub spouses: &'g [usize],
    pub co_parents: &'g [usize],
    pub all: &'g [usize],
}

pub struct FamilyGraph<'a> {
    ids: Vec<&'a str>,
    people: Vec<&'a Person>,
    index: HashMap<&'a str, usize>,
    parents: Vec<Vec<usize>>,
    children: Vec<Vec<usize>>,
    spouses: Vec<Vec<usize>>,
    co_parents: Vec<Vec<usize>>,
    partners: Vec<Vec<usize>>,
}

impl<'a> FamilyGraph<'a> {
    pub fn new(people: &'a People) -> Self {
        let ids: Vec<&'a str> = people.keys().map(String::as_str).collect();
        let records: Vec<&'a Person> = people.values().collect();
        let index: HashMap<&'a str, usize> = people
            .keys()
            .enumerate()
            .map(|(idx, id)| (id.as_str(), idx))
            .collect();

        let resolve = |own: usize, refs: &[String]| -> Vec<usize> {
            let mut out = Vec::new();
            for id in refs {
                if let Some(&idx) = index.get(id.as_str())
                    && idx != own
                    && !out.contains(&idx)
                {
                    out.push(idx);
                }
            }
            out
        };

        let raw_parents: Vec<Vec<usize>> = records
            .iter()
            .enumerate()
            .map(|(idx, p)| resolve(idx, &p.parents))
            .collect();
        let raw_children: Vec<Vec<usize>> = records
            .iter()
            .enumerate()
            .map(|(idx, p)| resolve(idx, &p.children))
            .collect();
        let raw_spouses: Vec<Vec<usize>> = records
            .iter()
            .enumerate()
            .map(|(idx, p)| resolve(idx, &p.spouses))
            .collect();

        let mut parents = raw_parents.clone();
        let mut children = raw_children.clone();
        let mut spouses = raw_spouses.clone();
        for (child, list) in raw_parents.iter().enumerate() {
            for &parent in list {
                push_unique(&mut children[parent], child);
            }
        }
        for (parent, list) in raw_children.iter().enumerate() {
            for &child in list {
                push_unique(&mut parents[child], parent);
            }
        }
        for (person, list) in raw_spouses.iter().enumerate() {
            for &spouse in list {
                push_unique(&mut spouses[spouse], person);
            }
        }

        let mut co_parents = vec![Vec::new(); records.len()];
        for (person, kids) in children.iter().enumerate() {
            for &child in kids {
                for &other in &parents[child] {
                    if other != person && !spouses[person].contains(&other) {
                        push_unique(&mut co_parents[person], other);
                    }
                }
            }
        }

        let partners = spouses
            .iter()
            .zip(&co_parents)
            .map(|(s, c)| s.iter().chain(c).copied().collect())
            .collect();

        Self {
            ids,
            people: records,
            index,
            parents,
            children,
            spouses,
            co_parents,
            partners,
        }
    }

    pub fn len(&self) -> usize {
        self.people.len()
    }

    pub fn is_empty(&self) -> bool {
        self.people.is_empty()
    }

    pub fn lookup(&self, id: &str) -> Option<usize> {
        self.index.get(id).copied()
    }

    pub fn person(&self, idx: usize) -> &'a Person {
        self.people[idx]
    }

    pub fn id(&self, idx: usize) -> &'a str {
        self.ids[idx]
    }

    pub fn parents(&self, idx: usize) -> &[usize] {
        &self.parents[idx]
    }

    pub fn children(&self, idx: usize) -> &[usize] {
        &self.children[idx]
    }

    pub fn spouses(&self, idx: usize) -> &[usize] {
        &self.spouses[idx]
    }

    /// Spouses first, then co-parents in child order.
    pub fn partners(&self, idx: usize) -> &[usize] {
        &self.partners[idx]
    }

    pub fn partners_of(&self, idx: usize) -> PartnerSet<'_> {
        PartnerSet {
            spouses: &self.spouses[idx],
            co_parents: &self.co_parents[idx],
            all: &self.partners[idx],
        }
    }

    /// Explicit spouses or parents of a shared child.
    pub fn are_partners(&self, a: usize, b: usize) -> bool {
        self.partners[a].contains(&b)
    }

    /// Couple block containing `start`: breadth-first closure over partner
    /// links restricted to `start`'s generation.
    pub fn partner_group(&self, start: usize, generations: &[usize]) -> Vec<usize> {
        self.partner_group_excluding(start, generations, |_| false)
    }

    /// Like [`partner_group`](Self::partner_group), but members matching
    /// `exclude` are traversed through without being returned.
    pub fn partner_group_excluding(
        &self,
        start: usize,
        generations: &[usize],
        exclude: impl Fn(usize) -> bool,
    ) -> Vec<usize> {
        let generation = generations[start];
        let mut members = Vec::new();
        let mut visited = HashSet::new();
        let mut queue = VecDeque::from([start]);
        while let Some(pid) = queue.pop_front() {
            if generations[pid] != generation || !visited.insert(pid) {
                continue;
            }
            if !exclude(pid) {
                members.push(pid);
            }
            for &partner in self.partners(pid) {
                if !visited.contains(&partner) && generations[partner] == generation {
                    queue.push_back(partner);
                }
            }
        }
        members
    }
}

fn push_unique(list: &mut Vec<usize>, value: usize) {
    if !list.contains(&value) {
        list.push(value);
    }
}
