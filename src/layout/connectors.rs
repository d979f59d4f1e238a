use std::collections::HashMap;

use super::family::Family;
use super::graph::FamilyGraph;
use super::types::{ChildDrop, CoupleLink, FamilyConnector, PartnerKind};
use crate::config::LayoutConfig;

/// Placed boxes by person index: centre point and width.
pub(super) struct Boxes<'p> {
    pub x: &'p [f32],
    pub y: &'p [f32],
    pub width: &'p [f32],
}

/// One line per partner pair, between the facing box edges.
pub(super) fn couple_links(graph: &FamilyGraph<'_>, boxes: &Boxes<'_>) -> Vec<CoupleLink> {
    let mut links = Vec::new();
    for a in 0..graph.len() {
        let partners = graph.partners_of(a);
        for &b in partners.all {
            if b < a {
                continue;
            }
            let (left, right) = if boxes.x[a] <= boxes.x[b] { (a, b) } else { (b, a) };
            let kind = if partners.spouses.contains(&b) {
                PartnerKind::Spouse
            } else {
                PartnerKind::CoParent
            };
            links.push(CoupleLink {
                a: graph.id(a).to_string(),
                b: graph.id(b).to_string(),
                kind,
                y: (boxes.y[a] + boxes.y[b]) / 2.0,
                x1: boxes.x[left] + boxes.width[left] / 2.0,
                x2: boxes.x[right] - boxes.width[right] / 2.0,
            });
        }
    }
    links
}

/// Junction, bar and drops for every family. Bars between the same pair of
/// generations are staggered upward so they do not overlap.
pub(super) fn family_connectors(
    graph: &FamilyGraph<'_>,
    generations: &[usize],
    families: &[Family],
    boxes: &Boxes<'_>,
    config: &LayoutConfig,
) -> Vec<FamilyConnector> {
    let half_height = config.node_height / 2.0;
    let mut stagger: HashMap<(usize, usize), usize> = HashMap::new();
    let mut connectors = Vec::with_capacity(families.len());

    for family in families {
        let Some(&first_child) = family.children.first() else {
            continue;
        };
        let junction = match family.parents.as_slice() {
            [single] => (boxes.x[*single], boxes.y[*single] + half_height),
            parents => {
                let count = parents.len() as f32;
                (
                    parents.iter().map(|&p| boxes.x[p]).sum::<f32>() / count,
                    parents.iter().map(|&p| boxes.y[p]).sum::<f32>() / count,
                )
            }
        };

        let mut children = family.children.clone();
        children.sort_by(|&a, &b| boxes.x[a].total_cmp(&boxes.x[b]));
        let child_top = children
            .iter()
            .map(|&c| boxes.y[c] - half_height)
            .fold(f32::INFINITY, f32::min);

        let slot = stagger
            .entry((family.generation, generations[first_child]))
            .or_insert(0);
        let bar_y = (junction.1 + child_top) / 2.0 - *slot as f32 * config.connectors.bar_stagger;
        *slot += 1;

        let bar_x1 = boxes.x[children[0]].min(junction.0);
        let bar_x2 = boxes.x[children[children.len() - 1]].max(junction.0);
        connectors.push(FamilyConnector {
            parents: family.parents.iter().map(|&p| graph.id(p).to_string()).collect(),
            junction,
            bar_y,
            bar_x1,
            bar_x2,
            drops: children
                .iter()
                .map(|&c| ChildDrop {
                    child: graph.id(c).to_string(),
                    x: boxes.x[c],
                    y_top: boxes.y[c] - half_height,
                })
                .collect(),
        });
    }
    connectors
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::PeopleBuilder;
    use crate::layout::family::extract_families;
    use crate::layout::generation::assign_generations;

    #[test]
    fn couple_link_spans_facing_edges() {
        let people = PeopleBuilder::new()
            .spouses("a", "b")
            .couple_child("c", "d", "e")
            .build();
        let graph = FamilyGraph::new(&people);
        // a, b, c, d, e
        let x = [100.0, 400.0, 1000.0, 700.0, 850.0];
        let y = [30.0, 30.0, 30.0, 30.0, 170.0];
        let width = [210.0; 5];
        let links = couple_links(&graph, &Boxes { x: &x, y: &y, width: &width });
        assert_eq!(links.len(), 2);
        assert_eq!(links[0].kind, PartnerKind::Spouse);
        assert_eq!((links[0].x1, links[0].x2), (205.0, 295.0));
        assert_eq!(links[1].kind, PartnerKind::CoParent);
        assert_eq!((links[1].x1, links[1].x2), (805.0, 895.0));
    }

    #[test]
    fn family_bars_sit_between_rows_and_stagger() {
        let people = PeopleBuilder::new()
            .couple_child("a", "b", "c")
            .child("b", "d")
            .build();
        let graph = FamilyGraph::new(&people);
        let gens = assign_generations(&graph);
        let families = extract_families(&graph, &gens.of);
        // a, b, c, d
        let x = [105.0, 335.0, 220.0, 470.0];
        let y = [30.0, 30.0, 170.0, 170.0];
        let width = [210.0; 4];
        let config = LayoutConfig::default();
        let connectors = family_connectors(
            &graph,
            &gens.of,
            &families,
            &Boxes { x: &x, y: &y, width: &width },
            &config,
        );
        assert_eq!(connectors.len(), 2);
        let couple = &connectors[0];
        assert_eq!(couple.parents, vec!["a", "b"]);
        assert_eq!(couple.junction, (220.0, 30.0));
        assert_eq!(couple.bar_y, 85.0);
        assert_eq!(couple.drops[0].y_top, 140.0);

        let single = &connectors[1];
        assert_eq!(single.parents, vec!["b"]);
        assert_eq!(single.junction, (335.0, 60.0));
        // (60 + 140) / 2 - 10
        assert_eq!(single.bar_y, 90.0);
        assert_eq!((single.bar_x1, single.bar_x2), (335.0, 470.0));
    }
}
