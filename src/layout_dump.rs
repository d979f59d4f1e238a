use crate::ir::People;
use crate::layout::{CoupleLink, FamilyConnector, Layout, LayoutRoot, RowPairCrossings};
use serde::Serialize;
use std::fmt::Write as _;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

#[derive(Debug, Serialize)]
pub struct LayoutDump {
    pub width: f32,
    pub height: f32,
    pub generations: usize,
    pub crossings_initial: usize,
    pub crossings_final: usize,
    pub row_crossings: Vec<RowPairCrossings>,
    pub nodes: Vec<NodeDump>,
    pub families: Vec<FamilyDump>,
    pub couples: Vec<CoupleLink>,
    pub connectors: Vec<FamilyConnector>,
    pub roots: Vec<LayoutRoot>,
}

#[derive(Debug, Serialize)]
pub struct NodeDump {
    pub id: String,
    pub label: String,
    pub life_span: String,
    pub photo: Option<String>,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub generation: usize,
    pub layout_parent: Option<String>,
    pub subtree_width: f32,
}

#[derive(Debug, Serialize)]
pub struct FamilyDump {
    pub key: String,
    pub parents: Vec<String>,
    pub children: Vec<String>,
    pub generation: usize,
}

impl LayoutDump {
    pub fn from_layout(layout: &Layout, people: &People) -> Self {
        let nodes = layout
            .positions
            .values()
            .map(|pos| {
                let person = people.get(&pos.id);
                NodeDump {
                    id: pos.id.clone(),
                    label: person.map(|p| p.label()).unwrap_or_else(|| pos.id.clone()),
                    life_span: person.map(|p| p.life_span()).unwrap_or_default(),
                    photo: person.and_then(|p| p.photo.clone()),
                    x: pos.x,
                    y: pos.y,
                    width: pos.width,
                    height: layout.node_height,
                    generation: pos.generation,
                    layout_parent: pos.layout_parent.clone(),
                    subtree_width: pos.subtree_width,
                }
            })
            .collect();

        let families = layout
            .families
            .iter()
            .map(|family| FamilyDump {
                key: family.key(),
                parents: family.parents.clone(),
                children: family.children.clone(),
                generation: family.generation,
            })
            .collect();

        LayoutDump {
            width: layout.width,
            height: layout.height,
            generations: layout.stats.generations,
            crossings_initial: layout.stats.crossings_initial,
            crossings_final: layout.stats.crossings_final,
            row_crossings: layout.stats.row_pairs.clone(),
            nodes,
            families,
            couples: layout.couples.clone(),
            connectors: layout.connectors.clone(),
            roots: layout.roots.clone(),
        }
    }
}

pub fn write_layout_dump(path: &Path, layout: &Layout, people: &People) -> anyhow::Result<()> {
    let file = File::create(path)?;
    let writer = BufWriter::new(file);
    let dump = LayoutDump::from_layout(layout, people);
    serde_json::to_writer_pretty(writer, &dump)?;
    Ok(())
}

/// One `id generation x y width` line per person, id order, with a header.
pub fn layout_tsv(layout: &Layout) -> String {
    let mut out = String::from("id\tgeneration\tx\ty\twidth\n");
    for pos in layout.positions.values() {
        let _ = writeln!(
            out,
            "{}\t{}\t{:.1}\t{:.1}\t{:.1}",
            pos.id, pos.generation, pos.x, pos.y, pos.width
        );
    }
    out
}
