//! Cycle groups and successor depth of the precedence graph.
//!
//! Operations are grouped into strongly connected components; the
//! condensation is a DAG whose longest paths rank operations by
//! structural position.
//!
//! # Algorithm
//! Tarjan's SCC algorithm on an explicit frame stack. Components come out
//! in reverse topological order, so the longest path over successors is
//! filled in emission order and the one over predecessors in the reverse
//! order.
//!
//! # Reference
//! Tarjan (1972), "Depth-First Search and Linear Graph Algorithms"

use crate::config::Direction;

/// Strongly connected components of the precedence graph with the
/// successor depth of each component in both directions.
#[derive(Debug, Clone)]
pub struct CycleGroups {
    group_of: Vec<usize>,
    group_count: usize,
    forward_depth: Vec<u32>,
    backward_depth: Vec<u32>,
}

struct Tarjan<'a> {
    adj: &'a [Vec<usize>],
    index: Vec<Option<usize>>,
    low: Vec<usize>,
    on_stack: Vec<bool>,
    stack: Vec<usize>,
    next_index: usize,
    group_of: Vec<usize>,
    group_count: usize,
}

impl<'a> Tarjan<'a> {
    fn new(adj: &'a [Vec<usize>]) -> Self {
        let n = adj.len();
        Self {
            adj,
            index: vec![None; n],
            low: vec![0; n],
            on_stack: vec![false; n],
            stack: Vec::new(),
            next_index: 0,
            group_of: vec![usize::MAX; n],
            group_count: 0,
        }
    }

    fn run(mut self) -> (Vec<usize>, usize) {
        for v in 0..self.adj.len() {
            if self.index[v].is_none() {
                self.connect(v);
            }
        }
        (self.group_of, self.group_count)
    }

    fn enter(&mut self, v: usize) {
        self.index[v] = Some(self.next_index);
        self.low[v] = self.next_index;
        self.next_index += 1;
        self.stack.push(v);
        self.on_stack[v] = true;
    }

    /// Depth-first search from `root` on an explicit frame stack.
    fn connect(&mut self, root: usize) {
        let adj = self.adj;
        self.enter(root);
        // (node, next outgoing edge)
        let mut frames = vec![(root, 0usize)];
        while let Some(frame) = frames.last_mut() {
            let (v, edge) = *frame;
            if let Some(&w) = adj[v].get(edge) {
                frame.1 += 1;
                match self.index[w] {
                    None => {
                        self.enter(w);
                        frames.push((w, 0));
                    }
                    Some(iw) if self.on_stack[w] => {
                        self.low[v] = self.low[v].min(iw);
                    }
                    Some(_) => {}
                }
                continue;
            }

            frames.pop();
            if Some(self.low[v]) == self.index[v] {
                while let Some(w) = self.stack.pop() {
                    self.on_stack[w] = false;
                    self.group_of[w] = self.group_count;
                    if w == v {
                        break;
                    }
                }
                self.group_count += 1;
            }
            if let Some(&(parent, _)) = frames.last() {
                self.low[parent] = self.low[parent].min(self.low[v]);
            }
        }
    }
}

impl CycleGroups {
    /// Builds the groups of a graph with `n` nodes and `(pred, succ)` edges.
    pub fn new(n: usize, edges: &[(usize, usize)]) -> Self {
        let mut adj = vec![Vec::new(); n];
        for &(p, s) in edges {
            adj[p].push(s);
        }
        let (group_of, group_count) = Tarjan::new(&adj).run();

        let mut succ_groups = vec![Vec::new(); group_count];
        let mut pred_groups = vec![Vec::new(); group_count];
        for &(p, s) in edges {
            let (gp, gs) = (group_of[p], group_of[s]);
            if gp != gs {
                succ_groups[gp].push(gs);
                pred_groups[gs].push(gp);
            }
        }

        // Group k's successors all carry smaller numbers.
        let mut forward_depth = vec![1u32; group_count];
        for g in 0..group_count {
            let best = succ_groups[g].iter().map(|&s| forward_depth[s]).max();
            if let Some(b) = best {
                forward_depth[g] = b + 1;
            }
        }
        let mut backward_depth = vec![1u32; group_count];
        for g in (0..group_count).rev() {
            let best = pred_groups[g].iter().map(|&p| backward_depth[p]).max();
            if let Some(b) = best {
                backward_depth[g] = b + 1;
            }
        }

        Self {
            group_of,
            group_count,
            forward_depth,
            backward_depth,
        }
    }

    /// Group of node `v`.
    #[inline]
    pub fn group_of(&self, v: usize) -> usize {
        self.group_of[v]
    }

    /// Number of groups.
    pub fn group_count(&self) -> usize {
        self.group_count
    }

    /// Whether `v` sits on a precedence cycle with another node.
    pub fn is_cyclic(&self, v: usize) -> bool {
        let g = self.group_of[v];
        self.group_of.iter().filter(|&&x| x == g).count() > 1
    }

    /// Number of groups on the longest path starting at `v`'s group,
    /// following successors (forward) or predecessors (backward).
    pub fn successor_depth(&self, v: usize, direction: Direction) -> u32 {
        let g = self.group_of[v];
        match direction {
            Direction::Forward => self.forward_depth[g],
            Direction::Backward => self.backward_depth[g],
        }
    }
}
