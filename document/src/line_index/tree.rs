//! A persistent, path-copying order-statistic tree of lines, structurally
//! parallel to `textbuf`'s piece-table tree (same four-color Okasaki/Might
//! scheme) but indexed by *rank* (line number) rather than by variable-size
//! byte offset, since lines are never split the way pieces are splicing a
//! byte range. Each node owns exactly one line's `byte_len`; `count` and
//! `bytes` are whole-subtree aggregates recomputed from the two children
//! after every structural change, rather than threaded through rotations by
//! hand — simpler to get right than the piece table's delta bookkeeping, and
//! just as cheap since a rotation only ever touches O(1) nodes.

use std::sync::Arc;

#[derive(Clone, Copy, Debug, PartialEq)]
enum Color {
    Red,
    Black,
    BlackBlack,
    NegativeBlack,
}

impl Color {
    fn blacken(&mut self) {
        *self = match *self {
            Color::Red => Color::Black,
            Color::Black => Color::BlackBlack,
            Color::BlackBlack => unreachable!(),
            Color::NegativeBlack => Color::Red,
        };
    }

    fn redden(&mut self) {
        *self = match *self {
            Color::Red => Color::NegativeBlack,
            Color::Black => Color::Red,
            Color::BlackBlack => Color::Black,
            Color::NegativeBlack => unreachable!(),
        };
    }
}

#[derive(Clone, Debug, PartialEq)]
enum Node {
    Leaf,
    BBLeaf,
    Internal(Internal),
}

impl Node {
    fn color(&self) -> Color {
        match self {
            Node::Internal(n) => n.color,
            Node::Leaf => Color::Black,
            Node::BBLeaf => Color::BlackBlack,
        }
    }

    fn is_leaf(&self) -> bool {
        !matches!(self, Node::Internal(_))
    }

    fn count(&self) -> u64 {
        match self {
            Node::Internal(n) => n.count,
            _ => 0,
        }
    }

    fn bytes(&self) -> u64 {
        match self {
            Node::Internal(n) => n.bytes,
            _ => 0,
        }
    }

    fn redden(&mut self) {
        match self {
            Node::Leaf => unreachable!(),
            Node::BBLeaf => *self = Node::Leaf,
            Node::Internal(n) => n.redden(),
        }
    }

    fn internal_mut(&mut self) -> Option<&mut Internal> {
        match self {
            Node::Internal(n) => Some(n),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
struct Internal {
    left: Arc<Node>,
    right: Arc<Node>,
    color: Color,
    /// This line's own length in bytes (including its terminator, or the
    /// trailing byte count for the final line).
    byte_len: u64,
    /// Number of lines in this node's whole subtree, including itself.
    count: u64,
    /// Total bytes of this node's whole subtree, including itself.
    bytes: u64,
}

impl Internal {
    fn leaf(color: Color, byte_len: u64) -> Internal {
        Internal {
            left: Arc::new(Node::Leaf),
            right: Arc::new(Node::Leaf),
            color,
            byte_len,
            count: 1,
            bytes: byte_len,
        }
    }

    fn recompute(&mut self) {
        self.count = 1 + self.left.count() + self.right.count();
        self.bytes = self.byte_len + self.left.bytes() + self.right.bytes();
    }

    fn blacken(&mut self) {
        self.color.blacken();
    }

    fn redden(&mut self) {
        self.color.redden();
    }

    fn take_left(&mut self) -> Arc<Node> {
        std::mem::replace(&mut self.left, Arc::new(Node::Leaf))
    }

    fn take_right(&mut self) -> Arc<Node> {
        std::mem::replace(&mut self.right, Arc::new(Node::Leaf))
    }

    /// Insert `byte_len` as the new rightmost (maximum-rank) descendant of
    /// this node's left subtree; used when an insertion's target rank lands
    /// exactly at this node's own rank (i.e. it must precede this node).
    fn insert_as_new_max_of_left(&mut self, byte_len: u64) {
        fn go(node: &mut Internal, byte_len: u64) {
            let right = Arc::make_mut(&mut node.right);
            match right {
                Node::Internal(r) => {
                    go(r, byte_len);
                    r.balance();
                }
                _ => {
                    node.right = Arc::new(Node::Internal(Internal::leaf(Color::Red, byte_len)));
                }
            }
            node.recompute();
        }

        let left = Arc::make_mut(&mut self.left);
        match left {
            Node::Internal(l) => {
                go(l, byte_len);
                l.balance();
            }
            _ => {
                self.left = Arc::new(Node::Internal(Internal::leaf(Color::Red, byte_len)));
            }
        }
    }

    /// Matt Might's bubble: propagate a BlackBlack child upward by reddening
    /// both children and blackening self, then rebalance.
    fn bubble(&mut self) {
        if self.left.color() == Color::BlackBlack || self.right.color() == Color::BlackBlack {
            self.blacken();
            Arc::make_mut(&mut self.left).redden();
            Arc::make_mut(&mut self.right).redden();
        }
        self.balance();
        self.recompute();
    }

    /// Remove this node, which has at most one non-leaf child (the caller
    /// guarantees this by first swapping in the in-order predecessor when
    /// both children are internal).
    fn remove_self(node: &mut Node) {
        let n = node.internal_mut().unwrap();
        match (n.left.is_leaf(), n.right.is_leaf()) {
            (true, true) => {
                *node = match n.color {
                    Color::Red => Node::Leaf,
                    Color::Black => Node::BBLeaf,
                    _ => unreachable!(),
                };
            }
            (true, false) => {
                if n.color == Color::Black && n.right.color() == Color::Red {
                    let mut right = n.take_right();
                    let right = Arc::make_mut(&mut right).internal_mut().unwrap().clone();
                    *n = right;
                    n.color = Color::Black;
                }
            }
            (false, true) => {
                if n.color == Color::Black && n.left.color() == Color::Red {
                    let mut left = n.take_left();
                    let left = Arc::make_mut(&mut left).internal_mut().unwrap().clone();
                    *n = left;
                    n.color = Color::Black;
                }
            }
            (false, false) => unreachable!("caller replaces with predecessor first"),
        }
    }

    /// Remove and return the maximum (rightmost) line in this subtree.
    fn remove_max(node: &mut Node) -> u64 {
        let n = node.internal_mut().unwrap();
        if n.right.is_leaf() {
            let byte_len = n.byte_len;
            Internal::remove_self(node);
            byte_len
        } else {
            let right = Arc::make_mut(&mut n.right);
            let byte_len = Internal::remove_max(right);
            n.bubble();
            byte_len
        }
    }

    /// Okasaki's insertion cases and Might's deletion cases, unified exactly
    /// as in `textbuf`'s piece tree, minus the delta-aggregate bookkeeping
    /// (handled by `recompute` at the call sites instead).
    fn balance(&mut self) {
        use Color::{Black as B, NegativeBlack as NB, Red as R};

        if self.color == R || self.color == NB {
            return;
        }

        fn colors(n: &Arc<Node>) -> (Option<Color>, Option<Color>, Option<Color>) {
            match n.as_ref() {
                Node::Internal(n) => (Some(n.color), Some(n.left.color()), Some(n.right.color())),
                _ => (None, None, None),
            }
        }

        let (cl, cll, clr) = colors(&self.left);
        let (cr, crl, crr) = colors(&self.right);

        match (cl, cll, clr, cr, crl, crr) {
            (Some(R), Some(R), ..) => {
                let mut y_ptr = self.take_left();
                let y = Arc::make_mut(&mut y_ptr).internal_mut().unwrap();
                let mut x_ptr = y.take_left();
                let x = Arc::make_mut(&mut x_ptr).internal_mut().unwrap();

                self.color.redden();
                y.color = B;
                x.color = B;

                std::mem::swap(&mut self.byte_len, &mut y.byte_len);
                std::mem::swap(&mut y.left, &mut y.right);
                std::mem::swap(&mut self.right, &mut y.right);

                self.left = x_ptr;
                self.right = y_ptr;
                recompute_ptr(&mut self.left);
                recompute_ptr(&mut self.right);
            }
            (Some(R), _, Some(R), ..) => {
                let mut x_ptr = self.take_left();
                let x = Arc::make_mut(&mut x_ptr).internal_mut().unwrap();
                let mut y_ptr = x.take_right();
                let y = Arc::make_mut(&mut y_ptr).internal_mut().unwrap();

                self.redden();
                x.color = B;
                y.color = B;

                std::mem::swap(&mut self.byte_len, &mut y.byte_len);
                std::mem::swap(&mut y.left, &mut y.right);
                std::mem::swap(&mut x.right, &mut y.right);
                std::mem::swap(&mut self.right, &mut y.right);

                self.right = y_ptr;
                self.left = x_ptr;
                recompute_ptr(&mut self.left);
                recompute_ptr(&mut self.right);
            }
            (.., Some(R), Some(R), _) => {
                let mut z_ptr = self.take_right();
                let z = Arc::make_mut(&mut z_ptr).internal_mut().unwrap();
                let mut y_ptr = z.take_left();
                let y = Arc::make_mut(&mut y_ptr).internal_mut().unwrap();

                self.color.redden();
                z.color = B;
                y.color = B;

                std::mem::swap(&mut self.byte_len, &mut y.byte_len);
                std::mem::swap(&mut z.left, &mut y.right);
                std::mem::swap(&mut y.left, &mut y.right);
                std::mem::swap(&mut self.left, &mut y.left);

                self.left = y_ptr;
                self.right = z_ptr;
                recompute_ptr(&mut self.left);
                recompute_ptr(&mut self.right);
            }
            (.., Some(R), _, Some(R)) => {
                let mut y_ptr = self.take_right();
                let y = Arc::make_mut(&mut y_ptr).internal_mut().unwrap();
                let mut z_ptr = y.take_right();
                let z = Arc::make_mut(&mut z_ptr).internal_mut().unwrap();

                self.color.redden();
                y.color = B;
                z.color = B;

                std::mem::swap(&mut self.byte_len, &mut y.byte_len);
                std::mem::swap(&mut y.left, &mut y.right);
                std::mem::swap(&mut self.left, &mut y.left);

                self.right = z_ptr;
                self.left = y_ptr;
                recompute_ptr(&mut self.left);
                recompute_ptr(&mut self.right);
            }
            (.., Some(NB), Some(B), Some(B)) => {
                let mut z_ptr = self.take_right();
                let z = Arc::make_mut(&mut z_ptr).internal_mut().unwrap();
                let mut y_ptr = z.take_left();
                let y = Arc::make_mut(&mut y_ptr).internal_mut().unwrap();
                let w_ptr = z.take_right();
                let mut w_ptr = w_ptr;
                {
                    let w = Arc::make_mut(&mut w_ptr).internal_mut().unwrap();
                    w.color = R;
                }

                self.color = B;
                z.color = B;
                y.color = B;

                std::mem::swap(&mut self.byte_len, &mut y.byte_len);
                std::mem::swap(&mut y.left, &mut y.right);
                std::mem::swap(&mut y.left, &mut self.left);
                std::mem::swap(&mut self.left, &mut z.left);

                z.right = w_ptr;
                z.balance();
                z.recompute();

                self.left = y_ptr;
                self.right = z_ptr;
                recompute_ptr(&mut self.left);
                recompute_ptr(&mut self.right);
            }
            (Some(NB), Some(B), Some(B), ..) => {
                let mut x_ptr = self.take_left();
                let x = Arc::make_mut(&mut x_ptr).internal_mut().unwrap();
                let w_ptr = x.take_left();
                let mut w_ptr = w_ptr;
                {
                    let w = Arc::make_mut(&mut w_ptr).internal_mut().unwrap();
                    w.color = R;
                }
                let mut y_ptr = x.take_right();
                let y = Arc::make_mut(&mut y_ptr).internal_mut().unwrap();

                self.color = B;
                x.color = B;
                y.color = B;

                std::mem::swap(&mut self.byte_len, &mut y.byte_len);
                std::mem::swap(&mut y.left, &mut y.right);
                std::mem::swap(&mut self.right, &mut y.right);
                std::mem::swap(&mut self.right, &mut x.right);

                x.left = w_ptr;
                x.balance();
                x.recompute();

                self.left = x_ptr;
                self.right = y_ptr;
                recompute_ptr(&mut self.left);
                recompute_ptr(&mut self.right);
            }
            _ => {}
        }
    }
}

fn recompute_ptr(n: &mut Arc<Node>) {
    if let Node::Internal(i) = Arc::make_mut(n) {
        i.recompute();
    }
}

/// A persistent, rank-indexed tree of line byte-lengths.
#[derive(Clone, Debug)]
pub(crate) struct LineTree {
    root: Arc<Node>,
}

impl LineTree {
    pub fn new() -> LineTree {
        LineTree {
            root: Arc::new(Node::Leaf),
        }
    }

    pub fn count(&self) -> u64 {
        self.root.count()
    }

    pub fn total_bytes(&self) -> u64 {
        self.root.bytes()
    }

    /// Insert a line of `byte_len` bytes at rank `at` (0-based; `at ==
    /// count()` appends).
    pub fn insert(&mut self, at: u64, byte_len: u64) {
        let at_root = true;
        insert_rec(&mut self.root, at, byte_len, at_root);
        if let Node::Internal(i) = Arc::make_mut(&mut self.root) {
            i.color = Color::Black;
        }
    }

    /// Remove the line at rank `at`, returning its byte length.
    pub fn remove(&mut self, at: u64) -> u64 {
        let removed = remove_rec(&mut self.root, at, true);
        match Arc::make_mut(&mut self.root) {
            Node::Internal(n) => n.color = Color::Black,
            other => *other = Node::Leaf,
        }
        removed
    }

    /// Replace the byte length of the line at rank `at`.
    pub fn set_len(&mut self, at: u64, byte_len: u64) {
        set_len_rec(&mut self.root, at, byte_len);
    }

    pub fn get(&self, at: u64) -> Option<u64> {
        get_rec(&self.root, at)
    }

    /// Starting byte offset of the line at rank `at` (sum of all earlier
    /// lines' lengths).
    pub fn start_offset(&self, at: u64) -> Option<u64> {
        if at >= self.count() {
            return None;
        }
        Some(offset_rec(&self.root, at))
    }

    /// `(rank, line_start_offset, byte_len)` of the line containing byte
    /// offset `pos`. `pos == total_bytes()` resolves to the final line.
    pub fn find_at_offset(&self, pos: u64) -> (u64, u64, u64) {
        find_at_offset_rec(&self.root, pos, 0, 0)
    }

    pub fn iter_lens(&self) -> Vec<u64> {
        let mut out = Vec::with_capacity(self.count() as usize);
        collect(&self.root, &mut out);
        out
    }
}

fn collect(node: &Arc<Node>, out: &mut Vec<u64>) {
    if let Node::Internal(n) = node.as_ref() {
        collect(&n.left, out);
        out.push(n.byte_len);
        collect(&n.right, out);
    }
}

fn insert_rec(node: &mut Arc<Node>, rank: u64, byte_len: u64, at_root: bool) {
    if node.is_leaf() {
        let color = if at_root { Color::Black } else { Color::Red };
        *node = Arc::new(Node::Internal(Internal::leaf(color, byte_len)));
        return;
    }

    let n = Arc::make_mut(node).internal_mut().unwrap();
    let left_count = n.left.count();

    if rank < left_count {
        insert_rec(&mut n.left, rank, byte_len, false);
    } else if rank == left_count {
        n.insert_as_new_max_of_left(byte_len);
    } else {
        insert_rec(&mut n.right, rank - left_count - 1, byte_len, false);
    }

    n.balance();
    n.recompute();
    if at_root {
        n.color = Color::Black;
    }
}

fn remove_rec(node: &mut Arc<Node>, rank: u64, at_root: bool) -> u64 {
    if node.is_leaf() {
        unreachable!("remove_rec: rank out of bounds");
    }

    let mut self_removed = false;
    let removed;
    {
        let n = Arc::make_mut(node).internal_mut().unwrap();
        let left_count = n.left.count();

        if rank < left_count {
            removed = remove_rec(&mut n.left, rank, false);
            n.bubble();
        } else if rank == left_count {
            if !n.left.is_leaf() && !n.right.is_leaf() {
                let left = Arc::make_mut(&mut n.left);
                let pred_len = Internal::remove_max(left);
                removed = n.byte_len;
                n.byte_len = pred_len;
                n.bubble();
            } else {
                removed = n.byte_len;
                self_removed = true;
            }
        } else {
            removed = remove_rec(&mut n.right, rank - left_count - 1, false);
            n.bubble();
        }
    }

    if self_removed {
        Internal::remove_self(Arc::make_mut(node));
    }

    match Arc::make_mut(node) {
        Node::Internal(n) => {
            n.recompute();
            if at_root {
                n.color = Color::Black;
            }
        }
        other => {
            if at_root {
                *other = Node::Leaf;
            }
        }
    }

    removed
}

fn set_len_rec(node: &mut Arc<Node>, rank: u64, byte_len: u64) {
    let n = Arc::make_mut(node).internal_mut().unwrap();
    let left_count = n.left.count();
    if rank < left_count {
        set_len_rec(&mut n.left, rank, byte_len);
    } else if rank == left_count {
        n.byte_len = byte_len;
    } else {
        set_len_rec(&mut n.right, rank - left_count - 1, byte_len);
    }
    n.recompute();
}

fn get_rec(node: &Arc<Node>, rank: u64) -> Option<u64> {
    match node.as_ref() {
        Node::Internal(n) => {
            let left_count = n.left.count();
            if rank < left_count {
                get_rec(&n.left, rank)
            } else if rank == left_count {
                Some(n.byte_len)
            } else {
                get_rec(&n.right, rank - left_count - 1)
            }
        }
        _ => None,
    }
}

fn offset_rec(node: &Arc<Node>, rank: u64) -> u64 {
    match node.as_ref() {
        Node::Internal(n) => {
            let left_count = n.left.count();
            if rank < left_count {
                offset_rec(&n.left, rank)
            } else if rank == left_count {
                n.left.bytes()
            } else {
                n.left.bytes() + n.byte_len + offset_rec(&n.right, rank - left_count - 1)
            }
        }
        _ => 0,
    }
}

fn find_at_offset_rec(node: &Arc<Node>, pos: u64, rank_base: u64, offset_base: u64) -> (u64, u64, u64) {
    match node.as_ref() {
        Node::Internal(n) => {
            let left_bytes = n.left.bytes();
            let left_count = n.left.count();
            if pos < left_bytes {
                find_at_offset_rec(&n.left, pos, rank_base, offset_base)
            } else if pos < left_bytes + n.byte_len || n.right.is_leaf() {
                (rank_base + left_count, offset_base + left_bytes, n.byte_len)
            } else {
                find_at_offset_rec(
                    &n.right,
                    pos - left_bytes - n.byte_len,
                    rank_base + left_count + 1,
                    offset_base + left_bytes + n.byte_len,
                )
            }
        }
        _ => (rank_base, offset_base, 0),
    }
}

/// Structural red-black + aggregate validity check, mirroring `textbuf`'s own
/// `is_valid_tree` (no red node has a red child, every root-to-leaf black
/// height agrees, and every node's cached `count`/`bytes` match its actual
/// subtree).
#[cfg(test)]
pub(crate) fn is_valid_tree(tree: &LineTree) -> Result<(), &'static str> {
    fn black_height(node: &Arc<Node>) -> Result<u64, ()> {
        match node.as_ref() {
            Node::Leaf => Ok(1),
            Node::BBLeaf => Ok(2),
            Node::Internal(n) => {
                let left = black_height(&n.left)?;
                let right = black_height(&n.right)?;
                if left == right {
                    Ok(left + if n.color == Color::Black { 1 } else { 0 })
                } else {
                    Err(())
                }
            }
        }
    }

    fn red_nodes_have_black_children(node: &Arc<Node>) -> bool {
        let self_ok = match node.as_ref() {
            Node::Internal(n) if n.color == Color::Red => {
                n.left.color() == Color::Black && n.right.color() == Color::Black
            }
            _ => true,
        };
        match node.as_ref() {
            Node::Internal(n) => {
                self_ok
                    && red_nodes_have_black_children(&n.left)
                    && red_nodes_have_black_children(&n.right)
            }
            _ => self_ok,
        }
    }

    fn aggregates_match(node: &Arc<Node>) -> Result<(u64, u64), ()> {
        match node.as_ref() {
            Node::Leaf | Node::BBLeaf => Ok((0, 0)),
            Node::Internal(n) => {
                let (lc, lb) = aggregates_match(&n.left)?;
                let (rc, rb) = aggregates_match(&n.right)?;
                let count = 1 + lc + rc;
                let bytes = n.byte_len + lb + rb;
                if count == n.count && bytes == n.bytes {
                    Ok((count, bytes))
                } else {
                    Err(())
                }
            }
        }
    }

    if tree.root.color() != Color::Black {
        return Err("root is not black");
    }
    if black_height(&tree.root).is_err() {
        return Err("black height unbalanced");
    }
    if !red_nodes_have_black_children(&tree.root) {
        return Err("red node has a red child");
    }
    if aggregates_match(&tree.root).is_err() {
        return Err("count/bytes aggregates do not match subtree contents");
    }
    Ok(())
}
