//! Property tests over generated layered families.
//!
//! Every generated person links only to their own row (spouses) or the row
//! above (parents), so the input is generation-consistent and every layout
//! property must hold.

use proptest::prelude::*;
use sippschaft_layout::{LayoutConfig, People, PeopleBuilder, Sex, compute_layout};

/// Per row: an optional parent pair from the row above for each person, and
/// a few spouse pairs inside the row.
type RowLinks = (Vec<Option<(usize, usize)>>, Vec<(usize, usize)>);

fn id(layer: usize, i: usize) -> String {
    format!("l{layer}p{i}")
}

fn build_family(widths: &[usize], links: &[RowLinks]) -> People {
    let mut builder = PeopleBuilder::new();
    for (layer, (&width, (parents, spouses))) in widths.iter().zip(links).enumerate() {
        for i in 0..width {
            let sex = if i % 2 == 0 { Sex::Male } else { Sex::Female };
            let me = id(layer, i);
            builder = builder.person(&me, &me, sex);
            if layer == 0 {
                continue;
            }
            builder = match parents[i] {
                Some((a, b)) if a != b => builder.couple_child(&id(layer - 1, a), &id(layer - 1, b), &me),
                Some((a, _)) => builder.child(&id(layer - 1, a), &me),
                None => builder,
            };
        }
        for &(a, b) in spouses {
            if a != b {
                builder = builder.spouses(&id(layer, a), &id(layer, b));
            }
        }
    }
    builder.build()
}

fn family_strategy() -> impl Strategy<Value = People> {
    proptest::collection::vec(2usize..=5, 2..=5)
        .prop_flat_map(|widths| {
            let links: Vec<_> = widths
                .iter()
                .enumerate()
                .map(|(layer, &width)| {
                    let above = if layer == 0 { 1 } else { widths[layer - 1] };
                    (
                        proptest::collection::vec(
                            proptest::option::weighted(0.8, (0..above, 0..above)),
                            width,
                        ),
                        proptest::collection::vec((0..width, 0..width), 0..width),
                    )
                })
                .collect();
            (Just(widths), links)
        })
        .prop_map(|(widths, links)| build_family(&widths, &links))
}

proptest! {
    #[test]
    fn row_pair_crossings_never_rise(people in family_strategy()) {
        let layout = compute_layout(&people, &LayoutConfig::default());
        prop_assert_eq!(layout.stats.row_pairs.len(), layout.stats.generations - 1);
        for pair in &layout.stats.row_pairs {
            prop_assert!(
                pair.refined <= pair.initial,
                "rows {}-{} crossings {} -> {}",
                pair.top,
                pair.top + 1,
                pair.initial,
                pair.refined
            );
        }
        prop_assert!(layout.stats.crossings_final <= layout.stats.crossings_initial);
    }
}

proptest! {
    #[test]
    fn everyone_is_placed_on_a_consistent_row(people in family_strategy()) {
        let layout = compute_layout(&people, &LayoutConfig::default());
        prop_assert_eq!(layout.positions.len(), people.len());
        for (pid, person) in &people {
            let me = &layout.positions[pid];
            for spouse in &person.spouses {
                prop_assert_eq!(me.generation, layout.positions[spouse].generation);
            }
            if !person.parents.is_empty() {
                prop_assert!(person
                    .parents
                    .iter()
                    .any(|parent| layout.positions[parent].generation + 1 == me.generation));
            }
        }
    }
}

proptest! {
    #[test]
    fn boxes_on_one_row_never_overlap(people in family_strategy()) {
        let layout = compute_layout(&people, &LayoutConfig::default());
        let placed: Vec<_> = layout.positions.values().collect();
        for (i, a) in placed.iter().enumerate() {
            for b in &placed[i + 1..] {
                if a.generation == b.generation {
                    prop_assert!(
                        (a.x - b.x).abs() + 0.01 >= (a.width + b.width) / 2.0,
                        "{} and {} overlap",
                        a.id,
                        b.id
                    );
                }
            }
        }
    }
}

proptest! {
    #[test]
    fn layout_is_deterministic(people in family_strategy()) {
        let config = LayoutConfig::default();
        let first = compute_layout(&people, &config);
        let second = compute_layout(&people, &config);
        prop_assert_eq!(first.positions, second.positions);
        prop_assert_eq!(first.connectors, second.connectors);
    }
}
