//! Top-down placement of couple blocks over their descendants.

use std::cmp::Ordering;

use tracing::{debug, trace};

use super::graph::FamilyGraph;
use super::ordering::GenerationOrder;
use super::spanning::SpanningTree;
use super::width::{block_children, header_width};
use crate::config::LayoutConfig;

/// A couple block nobody in the spanning tree adopted: either the main tree
/// or a satellite (typically an in-law ancestry).
#[derive(Debug, Clone)]
pub(super) struct RootBlock {
    pub members: Vec<usize>,
    pub generation: usize,
    pub main: bool,
    pub bridge: Option<usize>,
}

#[derive(Debug, Clone)]
pub(super) struct Placement {
    /// Centre x of every person, before the margin shift.
    pub x: Vec<f32>,
    pub roots: Vec<RootBlock>,
}

pub(super) struct PositionAssigner<'g, 'a> {
    pub graph: &'g FamilyGraph<'a>,
    pub generations: &'g [usize],
    pub tree: &'g SpanningTree,
    pub order: &'g GenerationOrder,
    pub node_widths: &'g [f32],
    pub group_widths: &'g [f32],
    pub config: &'g LayoutConfig,
}

impl PositionAssigner<'_, '_> {
    pub fn run(&self) -> Placement {
        let mut state = PlaceState {
            x: vec![None; self.graph.len()],
            placed: 0,
        };

        let mut ranked: Vec<(usize, RootBlock)> = self
            .layout_roots()
            .into_iter()
            .map(|root| (self.subtree_size(&root.members), root))
            .collect();
        ranked.sort_by(|a, b| b.0.cmp(&a.0));
        let mut roots: Vec<RootBlock> = ranked.into_iter().map(|(_, root)| root).collect();

        if let Some(main) = roots.first_mut() {
            main.main = true;
            debug!(person = self.graph.id(main.members[0]), "placing main tree");
            self.place_group(&mut state, main.members[0], 0.0);
        }

        // Satellites go strictly right of everything placed so far, in the
        // order their bridge people appear in the main tree.
        let mut satellites: Vec<(f32, usize)> = Vec::new();
        for (idx, root) in roots.iter_mut().enumerate().skip(1) {
            root.bridge = self.find_bridge(&root.members, &state);
            let bridge_x = root
                .bridge
                .and_then(|pid| state.x[pid])
                .unwrap_or(f32::INFINITY);
            satellites.push((bridge_x, idx));
        }
        satellites.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(Ordering::Equal));
        let mut absorbed = vec![false; roots.len()];
        for (_, idx) in satellites {
            let primary = roots[idx].members[0];
            // Marry-in roots were already placed beside their partners.
            if state.x[primary].is_some() {
                absorbed[idx] = true;
                continue;
            }
            let left = self.right_edge(&state).unwrap_or(0.0) + self.config.h_gap * 2.0;
            trace!(person = self.graph.id(primary), left, "placing satellite");
            self.place_group(&mut state, primary, left);
        }

        // Whoever is left hangs under a layout parent outside the row above
        // (inconsistent generation data). Each goes right of everything,
        // with its own block and subtree.
        for row in self.order.rows() {
            for &pid in row {
                if state.x[pid].is_none() {
                    let left = self.right_edge(&state).unwrap_or(0.0) + self.config.h_gap * 2.0;
                    trace!(person = self.graph.id(pid), left, "placing displaced group");
                    self.place_group(&mut state, pid, left);
                }
            }
        }

        let roots = roots
            .into_iter()
            .zip(absorbed)
            .filter_map(|(root, absorbed)| (!absorbed).then_some(root))
            .collect();
        Placement {
            x: state.x.into_iter().map(|x| x.unwrap_or(0.0)).collect(),
            roots,
        }
    }

    /// Unadopted blocks in generation-row order. A block is the partner
    /// closure of an unadopted person minus adopted partners; adopted partners
    /// are walked through so the closure reaches every co-root.
    fn layout_roots(&self) -> Vec<RootBlock> {
        let mut grouped = vec![false; self.graph.len()];
        let mut roots = Vec::new();
        for (generation, row) in self.order.rows().iter().enumerate() {
            for &pid in row {
                if self.tree.has_layout_parent(pid) || grouped[pid] {
                    continue;
                }
                let members = self.graph.partner_group_excluding(pid, self.generations, |m| {
                    self.tree.has_layout_parent(m)
                });
                for member in self.graph.partner_group(pid, self.generations) {
                    grouped[member] = true;
                }
                if !members.is_empty() {
                    roots.push(RootBlock {
                        members,
                        generation,
                        main: false,
                        bridge: None,
                    });
                }
            }
        }
        roots
    }

    /// People in the block's spanning subtree, counting each person's
    /// partners without descending through them.
    fn subtree_size(&self, block: &[usize]) -> usize {
        fn walk(
            assigner: &PositionAssigner<'_, '_>,
            pid: usize,
            visited: &mut [bool],
            size: &mut usize,
        ) {
            if visited[pid] {
                return;
            }
            visited[pid] = true;
            *size += 1;
            for &partner in assigner.graph.partners(pid) {
                if !visited[partner] {
                    visited[partner] = true;
                    *size += 1;
                }
            }
            for &child in &assigner.tree.layout_children[pid] {
                walk(assigner, child, visited, size);
            }
        }

        let mut visited = vec![false; self.graph.len()];
        let mut size = 0;
        for &pid in block {
            walk(self, pid, &mut visited, &mut size);
        }
        size
    }

    /// First already-placed person found depth-first along recorded child
    /// links from any block member.
    fn find_bridge(&self, block: &[usize], state: &PlaceState) -> Option<usize> {
        fn search(
            graph: &FamilyGraph<'_>,
            pid: usize,
            state: &PlaceState,
            visited: &mut [bool],
        ) -> Option<usize> {
            if visited[pid] {
                return None;
            }
            visited[pid] = true;
            if state.x[pid].is_some() {
                return Some(pid);
            }
            graph
                .children(pid)
                .iter()
                .find_map(|&child| search(graph, child, state, visited))
        }

        block.iter().find_map(|&pid| {
            let mut visited = vec![false; self.graph.len()];
            search(self.graph, pid, state, &mut visited)
        })
    }

    fn right_edge(&self, state: &PlaceState) -> Option<f32> {
        state
            .x
            .iter()
            .enumerate()
            .filter_map(|(pid, x)| x.map(|x| x + self.node_widths[pid] / 2.0))
            .reduce(f32::max)
    }

    /// Footprint of `pid`'s block counting only people not yet placed.
    fn effective_width(&self, state: &PlaceState, pid: usize) -> f32 {
        if state.placed == 0 {
            return self.group_widths[pid];
        }
        let members = self
            .graph
            .partner_group_excluding(pid, self.generations, |m| state.x[m].is_some());
        let header = header_width(&members, self.node_widths, self.config.spouse_gap);
        let children = block_children(&members, self.tree, self.generations, self.order, |c| {
            state.x[c].is_some()
        });
        if children.is_empty() {
            return header;
        }

        let gaps = self.config.h_gap * (children.len() - 1) as f32;
        let children_total = children
            .into_iter()
            .map(|child| self.effective_width(state, child))
            .sum::<f32>()
            + gaps;
        header.max(children_total)
    }

    /// Centres the unplaced part of `pid`'s block over `[left, left + width)`
    /// and recursively lays its unplaced children out beneath it.
    fn place_group(&self, state: &mut PlaceState, pid: usize, left: f32) {
        if state.x[pid].is_some() {
            return;
        }
        let mut members = self
            .graph
            .partner_group_excluding(pid, self.generations, |m| state.x[m].is_some());
        let total = self.effective_width(state, pid);
        let center = left + total / 2.0;

        members.sort_by_key(|&m| self.order.index_of(m));
        let chain = header_width(&members, self.node_widths, self.config.spouse_gap);
        let mut cursor = center - chain / 2.0;
        for &member in &members {
            let width = self.node_widths[member];
            state.set(member, cursor + width / 2.0);
            cursor += width + self.config.spouse_gap;
        }

        let children = block_children(&members, self.tree, self.generations, self.order, |c| {
            state.x[c].is_some()
        });
        if children.is_empty() {
            return;
        }
        let widths: Vec<f32> = children
            .iter()
            .map(|&child| self.effective_width(state, child))
            .collect();
        let children_total =
            widths.iter().sum::<f32>() + self.config.h_gap * (children.len() - 1) as f32;
        let mut cursor = center - children_total / 2.0;
        for (child, width) in children.into_iter().zip(widths) {
            self.place_group(state, child, cursor);
            cursor += width + self.config.h_gap;
        }
    }
}

struct PlaceState {
    x: Vec<Option<f32>>,
    placed: usize,
}

impl PlaceState {
    fn set(&mut self, pid: usize, x: f32) {
        if self.x[pid].replace(x).is_none() {
            self.placed += 1;
        }
    }
}
