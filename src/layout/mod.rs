mod connectors;
mod crossing;
mod family;
mod generation;
mod graph;
mod ordering;
mod position;
mod spanning;
mod text;
pub(crate) mod types;
mod width;
pub use types::*;

use std::collections::BTreeMap;

use tracing::{debug, warn};

use crate::config::LayoutConfig;
use crate::ir::People;
use connectors::{Boxes, couple_links, family_connectors};
use crossing::CrossingMinimizer;
use family::extract_families;
use generation::assign_generations;
use graph::FamilyGraph;
use ordering::initial_order;
use position::PositionAssigner;
use spanning::build_spanning_tree;
use width::WidthCalculator;

/// Lays out a person graph as generation rows. Total over any input: every
/// person gets exactly one position, and identical input gives identical
/// output.
pub fn compute_layout(people: &People, config: &LayoutConfig) -> Layout {
    let graph = FamilyGraph::new(people);
    if graph.is_empty() {
        return Layout {
            width: config.margin * 2.0,
            height: config.margin * 2.0,
            node_height: config.node_height,
            ..Layout::default()
        };
    }

    let generations = assign_generations(&graph);
    debug!(
        people = graph.len(),
        generations = generations.count(),
        components = generations.roots.len(),
        "assigned generations"
    );

    let families = extract_families(&graph, &generations.of);
    let tree = build_spanning_tree(&graph, &generations.roots, &families);
    let skipped = (0..graph.len())
        .filter(|&pid| {
            tree.layout_parent[pid]
                .is_some_and(|parent| generations.of[parent] + 1 != generations.of[pid])
        })
        .count();
    if skipped > 0 {
        warn!(count = skipped, "layout parents outside the row directly above their child");
    }
    debug!(families = families.len(), "built spanning tree");

    let mut order = initial_order(&graph, &generations, &tree);
    let report = CrossingMinimizer {
        graph: &graph,
        generations: &generations.of,
        tree: &tree,
        families: &families,
        config: &config.ordering,
    }
    .run(&mut order);

    let node_widths = text::node_widths(&graph, config);
    let group_widths = WidthCalculator::new(
        &graph,
        &generations.of,
        &tree,
        &order,
        &node_widths,
        config,
    )
    .compute_all();

    let placement = PositionAssigner {
        graph: &graph,
        generations: &generations.of,
        tree: &tree,
        order: &order,
        node_widths: &node_widths,
        group_widths: &group_widths,
        config,
    }
    .run();
    debug!(roots = placement.roots.len(), "placed all people");

    let mut xs = placement.x;
    let ys: Vec<f32> = generations
        .of
        .iter()
        .map(|&generation| config.row_center(generation))
        .collect();
    let half_height = config.node_height / 2.0;
    let mut min_x = f32::INFINITY;
    let mut max_x = f32::NEG_INFINITY;
    let mut max_y = 0.0f32;
    for pid in 0..graph.len() {
        min_x = min_x.min(xs[pid] - node_widths[pid] / 2.0);
        max_x = max_x.max(xs[pid] + node_widths[pid] / 2.0);
        max_y = max_y.max(ys[pid] + half_height);
    }
    if min_x < config.margin {
        let shift = config.margin - min_x;
        for x in &mut xs {
            *x += shift;
        }
        max_x += shift;
    }

    let boxes = Boxes {
        x: &xs,
        y: &ys,
        width: &node_widths,
    };
    let couples = couple_links(&graph, &boxes);
    let connectors = family_connectors(&graph, &generations.of, &families, &boxes, config);

    let positions: BTreeMap<String, PersonLayout> = (0..graph.len())
        .map(|pid| {
            let id = graph.id(pid).to_string();
            let person = PersonLayout {
                id: id.clone(),
                x: xs[pid],
                y: ys[pid],
                width: node_widths[pid],
                generation: generations.of[pid],
                layout_parent: tree.layout_parent[pid].map(|parent| graph.id(parent).to_string()),
                subtree_width: group_widths[pid],
            };
            (id, person)
        })
        .collect();

    let names = |list: &[usize]| -> Vec<String> {
        list.iter().map(|&pid| graph.id(pid).to_string()).collect()
    };
    let families_out = families
        .iter()
        .map(|family| FamilyUnit {
            parents: names(&family.parents),
            children: names(&family.children),
            generation: family.generation,
        })
        .collect();
    let roots = placement
        .roots
        .iter()
        .map(|root| LayoutRoot {
            members: names(&root.members),
            generation: root.generation,
            main: root.main,
            bridge: root.bridge.map(|pid| graph.id(pid).to_string()),
        })
        .collect();

    Layout {
        positions,
        families: families_out,
        couples,
        connectors,
        roots,
        width: max_x + config.margin,
        height: max_y + config.margin,
        node_height: config.node_height,
        stats: LayoutStats {
            generations: generations.count(),
            crossings_initial: report.initial.iter().sum(),
            crossings_final: report.refined.iter().sum(),
            row_pairs: report
                .initial
                .iter()
                .zip(&report.refined)
                .enumerate()
                .map(|(top, (&initial, &refined))| RowPairCrossings {
                    top,
                    initial,
                    refined,
                })
                .collect(),
        },
    }
}
