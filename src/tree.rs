//! Branching move tree.
//!
//! Nodes live in an arena and refer to each other by [`NodeId`]. Each node
//! keeps an ordered list of children, all alternatives from the same position,
//! and the index of its main-line child. The first child ever added becomes
//! the main line; later siblings are variations.
//!
//! Nodes are never removed: stepping back leaves the abandoned line in place
//! so it can be re-entered by playing the same move again.

use serde::{Deserialize, Serialize};

use crate::board::{Color, Point};
use crate::coord::{grid_to_human, human_to_grid};

/// Handle to a node in a [`GameTree`]. Stable for the lifetime of the tree.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum MoveKind {
    Play(Point),
    Pass,
    Resign,
}

impl MoveKind {
    /// Parse human notation, `pass` or `resign` (any case).
    pub fn parse(text: &str, board_size: usize) -> Option<MoveKind> {
        let t = text.trim();
        if t.eq_ignore_ascii_case("pass") {
            return Some(MoveKind::Pass);
        }
        if t.eq_ignore_ascii_case("resign") {
            return Some(MoveKind::Resign);
        }
        human_to_grid(t, board_size).map(MoveKind::Play)
    }

    pub fn to_human(self, board_size: usize) -> String {
        match self {
            MoveKind::Play(p) => grid_to_human(p, board_size),
            MoveKind::Pass => "pass".into(),
            MoveKind::Resign => "resign".into(),
        }
    }

    pub fn point(self) -> Option<Point> {
        match self {
            MoveKind::Play(p) => Some(p),
            _ => None,
        }
    }

    pub fn is_pass(self) -> bool {
        matches!(self, MoveKind::Pass)
    }
}

/// Who chose a move.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Agent {
    Player,
    Oracle,
}

/// Oracle evaluation of the position after a move, from Black's point of view.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Analysis {
    /// Probability that Black wins, in `[0, 1]`.
    pub win_prob: f64,
    /// Expected final score, positive when Black leads.
    pub score: f64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Move {
    pub kind: MoveKind,
    pub color: Color,
    pub agent: Agent,
    /// Filled in when the oracle answers; may arrive after the move is recorded.
    pub analysis: Option<Analysis>,
    pub comment: Option<String>,
}

impl Move {
    pub fn new(kind: MoveKind, color: Color) -> Self {
        Self {
            kind,
            color,
            agent: Agent::Player,
            analysis: None,
            comment: None,
        }
    }

    pub fn with_agent(mut self, agent: Agent) -> Self {
        self.agent = agent;
        self
    }
}

#[derive(Clone, Debug)]
pub struct GameNode {
    /// `None` only for the root.
    mv: Option<Move>,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    main_line: usize,
}

impl GameNode {
    pub fn mv(&self) -> Option<&Move> {
        self.mv.as_ref()
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// Index into [`children`](Self::children) of the main-line continuation.
    pub fn main_line_index(&self) -> usize {
        self.main_line
    }

    pub fn main_line_child(&self) -> Option<NodeId> {
        self.children.get(self.main_line).copied()
    }
}

pub struct GameTree {
    nodes: Vec<GameNode>,
    current: NodeId,
}

impl Default for GameTree {
    fn default() -> Self {
        Self::new()
    }
}

impl GameTree {
    pub fn new() -> Self {
        Self {
            nodes: vec![GameNode {
                mv: None,
                parent: None,
                children: Vec::new(),
                main_line: 0,
            }],
            current: NodeId(0),
        }
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    pub fn current(&self) -> NodeId {
        self.current
    }

    /// Number of nodes, root included.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.len() == 1
    }

    pub fn contains(&self, id: NodeId) -> bool {
        id.0 < self.nodes.len()
    }

    /// # Panics
    /// If `id` does not belong to this tree.
    pub fn node(&self, id: NodeId) -> &GameNode {
        &self.nodes[id.0]
    }

    pub fn get(&self, id: NodeId) -> Option<&GameNode> {
        self.nodes.get(id.0)
    }

    pub fn move_mut(&mut self, id: NodeId) -> Option<&mut Move> {
        self.nodes.get_mut(id.0).and_then(|n| n.mv.as_mut())
    }

    /// Record `mv` after the current node and make it current.
    ///
    /// If the current node already has a child with the same move, that child
    /// is re-entered instead and nothing is created.
    pub fn add_move(&mut self, mv: Move) -> NodeId {
        let cur = self.current;
        let existing = self.nodes[cur.0]
            .children
            .iter()
            .copied()
            .find(|&c| self.nodes[c.0].mv.as_ref().is_some_and(|m| m.kind == mv.kind));
        if let Some(child) = existing {
            self.current = child;
            return child;
        }

        let id = NodeId(self.nodes.len());
        self.nodes.push(GameNode {
            mv: Some(mv),
            parent: Some(cur),
            children: Vec::new(),
            main_line: 0,
        });
        self.nodes[cur.0].children.push(id);
        self.current = id;
        id
    }

    /// Nodes from just below the root down to `id`, root excluded.
    pub fn path_to_root(&self, id: NodeId) -> Vec<NodeId> {
        let mut path = Vec::new();
        let mut node = id;
        while let Some(parent) = self.nodes[node.0].parent {
            path.push(node);
            node = parent;
        }
        assert_eq!(node, self.root(), "node {id:?} has no path to the root");
        path.reverse();
        path
    }

    /// Path from the root to the current node.
    pub fn current_path(&self) -> Vec<NodeId> {
        self.path_to_root(self.current)
    }

    /// Number of moves between the root and `id`.
    pub fn ply_of(&self, id: NodeId) -> usize {
        let mut n = 0;
        let mut node = id;
        while let Some(parent) = self.nodes[node.0].parent {
            n += 1;
            node = parent;
        }
        n
    }

    pub fn ply(&self) -> usize {
        self.ply_of(self.current)
    }

    /// Whether every step from the root to `id` takes the main-line child.
    pub fn is_on_main_line(&self, id: NodeId) -> bool {
        let mut node = id;
        while let Some(parent) = self.nodes[node.0].parent {
            if self.nodes[parent.0].main_line_child() != Some(node) {
                return false;
            }
            node = parent;
        }
        true
    }

    pub fn go_to_root(&mut self) {
        self.current = self.root();
    }

    /// Step to the parent. Stays put at the root.
    pub fn back(&mut self) -> bool {
        match self.nodes[self.current.0].parent {
            Some(parent) => {
                self.current = parent;
                true
            }
            None => false,
        }
    }

    /// Step to the main-line child. Stays put at a leaf.
    pub fn forward(&mut self) -> bool {
        match self.nodes[self.current.0].main_line_child() {
            Some(child) => {
                self.current = child;
                true
            }
            None => false,
        }
    }

    /// Move the cursor to ply `n`.
    ///
    /// Going back retraces the current path; going forward always follows the
    /// main-line children and stops early at a leaf.
    pub fn go_to_ply(&mut self, n: usize) {
        if n == 0 {
            self.go_to_root();
            return;
        }
        let ply = self.ply();
        if n < ply {
            for _ in 0..ply - n {
                self.back();
            }
        } else {
            for _ in ply..n {
                if !self.forward() {
                    break;
                }
            }
        }
    }

    /// Leave the variation the cursor is in.
    ///
    /// Walks up to the nearest ancestor where the path left that ancestor's
    /// main line and jumps to its main-line child. Nested variations need one
    /// call per level. No-op when already on the main line.
    pub fn return_to_main_line(&mut self) {
        let mut node = self.current;
        while let Some(parent) = self.nodes[node.0].parent {
            let main = self.nodes[parent.0].main_line_child();
            if main != Some(node) {
                if let Some(main) = main {
                    self.current = main;
                }
                return;
            }
            node = parent;
        }
    }

    /// Last node reached by following main-line children from `id`.
    pub fn main_line_end(&self, id: NodeId) -> NodeId {
        let mut node = id;
        while let Some(child) = self.nodes[node.0].main_line_child() {
            node = child;
        }
        node
    }

    /// Moves along the path to the current node.
    pub fn moves(&self) -> impl Iterator<Item = &Move> + '_ {
        self.current_path()
            .into_iter()
            .filter_map(move |id| self.nodes[id.0].mv.as_ref())
    }
}
