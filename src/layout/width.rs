use super::graph::FamilyGraph;
use super::ordering::GenerationOrder;
use super::spanning::SpanningTree;
use crate::config::LayoutConfig;

/// Bottom-up footprint of every couple block plus its layout descendants.
/// All members of a block share one width.
pub struct WidthCalculator<'g, 'a> {
    graph: &'g FamilyGraph<'a>,
    generations: &'g [usize],
    tree: &'g SpanningTree,
    order: &'g GenerationOrder,
    node_widths: &'g [f32],
    config: &'g LayoutConfig,
    memo: Vec<Option<f32>>,
}

impl<'g, 'a> WidthCalculator<'g, 'a> {
    pub fn new(
        graph: &'g FamilyGraph<'a>,
        generations: &'g [usize],
        tree: &'g SpanningTree,
        order: &'g GenerationOrder,
        node_widths: &'g [f32],
        config: &'g LayoutConfig,
    ) -> Self {
        Self {
            graph,
            generations,
            tree,
            order,
            node_widths,
            config,
            memo: vec![None; graph.len()],
        }
    }

    /// Fills the memo for everyone, deepest generation first.
    pub fn compute_all(mut self) -> Vec<f32> {
        let order = self.order;
        for row in order.rows().iter().rev() {
            for &pid in row {
                self.group_width(pid);
            }
        }
        self.memo
            .iter()
            .enumerate()
            .map(|(pid, width)| width.unwrap_or(self.node_widths[pid]))
            .collect()
    }

    pub fn group_width(&mut self, pid: usize) -> f32 {
        if let Some(width) = self.memo[pid] {
            return width;
        }
        // Children always sit one row down, so the recursion bottoms out.
        let members = self.graph.partner_group(pid, self.generations);
        let header = header_width(&members, self.node_widths, self.config.spouse_gap);
        let children = block_children(
            &members,
            self.tree,
            self.generations,
            self.order,
            |_| false,
        );
        let mut total = header;
        if !children.is_empty() {
            let mut children_total = self.config.h_gap * (children.len() - 1) as f32;
            for child in children {
                children_total += self.group_width(child);
            }
            total = total.max(children_total);
        }
        for &member in &members {
            self.memo[member] = Some(total);
        }
        total
    }
}

/// Width of a row of member boxes separated by the spouse gap.
pub(super) fn header_width(members: &[usize], node_widths: &[f32], spouse_gap: f32) -> f32 {
    if members.is_empty() {
        return 0.0;
    }
    let boxes: f32 = members.iter().map(|&pid| node_widths[pid]).sum();
    boxes + spouse_gap * (members.len() - 1) as f32
}

/// Union of the members' layout children on the next row, minus `skip`, in
/// row order.
pub(super) fn block_children(
    members: &[usize],
    tree: &SpanningTree,
    generations: &[usize],
    order: &GenerationOrder,
    skip: impl Fn(usize) -> bool,
) -> Vec<usize> {
    let mut children: Vec<usize> = Vec::new();
    for &member in members {
        for &child in &tree.layout_children[member] {
            // Children off the next row are placed as their own groups.
            let next_row = generations[child] == generations[member] + 1;
            if next_row && !skip(child) && !children.contains(&child) {
                children.push(child);
            }
        }
    }
    children.sort_by_key(|&child| order.index_of(child));
    children
}
