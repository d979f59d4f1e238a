use super::generation::Generations;
use super::graph::FamilyGraph;
use super::spanning::SpanningTree;

/// Left-to-right order of every generation row, with a reverse index.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationOrder {
    rows: Vec<Vec<usize>>,
    index: Vec<usize>,
}

impl GenerationOrder {
    fn new(rows: Vec<Vec<usize>>, people: usize) -> Self {
        let mut order = Self {
            rows,
            index: vec![0; people],
        };
        for generation in 0..order.rows.len() {
            order.reindex(generation);
        }
        order
    }

    pub fn rows(&self) -> &[Vec<usize>] {
        &self.rows
    }

    pub fn row(&self, generation: usize) -> &[usize] {
        self.rows.get(generation).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Position of `pid` within its own generation row.
    pub fn index_of(&self, pid: usize) -> usize {
        self.index[pid]
    }

    pub fn set_row(&mut self, generation: usize, row: Vec<usize>) {
        self.rows[generation] = row;
        self.reindex(generation);
    }

    fn reindex(&mut self, generation: usize) {
        for (idx, &pid) in self.rows[generation].iter().enumerate() {
            self.index[pid] = idx;
        }
    }
}

struct DfsOrder<'g, 'a> {
    graph: &'g FamilyGraph<'a>,
    generations: &'g Generations,
    tree: &'g SpanningTree,
    placed: Vec<bool>,
    rows: Vec<Vec<usize>>,
}

impl DfsOrder<'_, '_> {
    fn add(&mut self, pid: usize) {
        if !self.placed[pid] {
            self.placed[pid] = true;
            self.rows[self.generations.of[pid]].push(pid);
        }
    }

    fn visit(&mut self, pid: usize) {
        if self.placed[pid] {
            return;
        }
        self.add(pid);
        let graph = self.graph;
        let tree = self.tree;
        let partners = graph.partners(pid);
        for &partner in partners {
            self.add(partner);
        }
        for &child in &tree.layout_children[pid] {
            self.visit(child);
        }
        for &partner in partners {
            for &child in &tree.layout_children[partner] {
                self.visit(child);
            }
        }
    }
}

/// Depth-first baseline order: a person, then their partners, then the
/// person's layout children, then each partner's layout children. People
/// the main walk misses are walked afterwards in id order.
pub fn initial_order(
    graph: &FamilyGraph<'_>,
    generations: &Generations,
    tree: &SpanningTree,
) -> GenerationOrder {
    let mut dfs = DfsOrder {
        graph,
        generations,
        tree,
        placed: vec![false; graph.len()],
        rows: vec![Vec::new(); generations.count()],
    };
    for &root in &generations.roots {
        dfs.visit(root);
    }
    for pid in 0..graph.len() {
        dfs.visit(pid);
    }
    GenerationOrder::new(dfs.rows, graph.len())
}
