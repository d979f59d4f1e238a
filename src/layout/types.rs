use std::collections::BTreeMap;

use serde::Serialize;

/// Final placement of one person. `x`/`y` are the node centre.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PersonLayout {
    pub id: String,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub generation: usize,
    pub layout_parent: Option<String>,
    /// Footprint of the person's couple block plus all layout descendants.
    pub subtree_width: f32,
}

impl PersonLayout {
    pub fn left(&self) -> f32 {
        self.x - self.width / 2.0
    }

    pub fn right(&self) -> f32 {
        self.x + self.width / 2.0
    }
}

/// A parent set with its children, ordered by birth.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FamilyUnit {
    pub parents: Vec<String>,
    pub children: Vec<String>,
    pub generation: usize,
}

impl FamilyUnit {
    pub fn key(&self) -> String {
        self.parents.join("+")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PartnerKind {
    Spouse,
    CoParent,
}

/// Horizontal line between two partners' facing box edges.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CoupleLink {
    pub a: String,
    pub b: String,
    pub kind: PartnerKind,
    pub y: f32,
    pub x1: f32,
    pub x2: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChildDrop {
    pub child: String,
    pub x: f32,
    pub y_top: f32,
}

/// Routing hint for one family: a vertical from the parents' junction down
/// to a horizontal bar, then one drop per child.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FamilyConnector {
    pub parents: Vec<String>,
    pub junction: (f32, f32),
    pub bar_y: f32,
    pub bar_x1: f32,
    pub bar_x2: f32,
    pub drops: Vec<ChildDrop>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LayoutRoot {
    pub members: Vec<String>,
    pub generation: usize,
    pub main: bool,
    /// First already-placed descendant that ties a satellite to the main tree.
    pub bridge: Option<String>,
}

/// Crossings between rows `top` and `top + 1`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RowPairCrossings {
    pub top: usize,
    pub initial: usize,
    pub refined: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LayoutStats {
    pub generations: usize,
    pub crossings_initial: usize,
    pub crossings_final: usize,
    pub row_pairs: Vec<RowPairCrossings>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct Layout {
    pub positions: BTreeMap<String, PersonLayout>,
    pub families: Vec<FamilyUnit>,
    pub couples: Vec<CoupleLink>,
    pub connectors: Vec<FamilyConnector>,
    pub roots: Vec<LayoutRoot>,
    pub width: f32,
    pub height: f32,
    pub node_height: f32,
    pub stats: LayoutStats,
}

impl Layout {
    pub fn main_root(&self) -> Option<&LayoutRoot> {
        self.roots.iter().find(|root| root.main)
    }

    pub fn satellites(&self) -> impl Iterator<Item = &LayoutRoot> {
        self.roots.iter().filter(|root| !root.main)
    }
}
