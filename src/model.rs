//! Vitter's Algorithm Λ: a single adaptive Huffman tree kept in lockstep by an
//! encoder and a decoder without ever transmitting a code table.
//!
//! The tree and its weight-class structure are stored in arenas (`Vec<Node>`,
//! `Vec<Block>`) addressed by stable indices rather than as a graph of raw
//! pointers. This sidesteps the cyclic-ownership problem (node ↔ block, node
//! ↔ node via parent/child and via block list, block ↔ block) that a pointer
//! based port would otherwise have to solve with reference counting, and it
//! makes the grandchild-parent-pointer fixup in [`Model::switch_nodes`] free
//! to do unconditionally.

use std::collections::HashMap;

type NodeId = usize;
type BlockId = usize;

#[derive(Clone, Debug)]
struct Node {
    weight: u32,
    symbol: Option<u8>,
    parent: Option<NodeId>,
    left: Option<NodeId>,
    right: Option<NodeId>,
    next: Option<NodeId>,
    prev: Option<NodeId>,
    block: Option<BlockId>,
}

impl Node {
    fn new(weight: u32) -> Self {
        Self {
            weight,
            symbol: None,
            parent: None,
            left: None,
            right: None,
            next: None,
            prev: None,
            block: None,
        }
    }
    fn is_leaf(&self) -> bool {
        self.left.is_none() && self.right.is_none()
    }
}

#[derive(Clone, Debug)]
struct Block {
    internal: bool,
    weight: u32,
    next: Option<BlockId>,
    prev: Option<BlockId>,
    leader: Option<NodeId>,
    tail: Option<NodeId>,
}

impl Block {
    fn new(internal: bool, weight: u32) -> Self {
        Self { internal, weight, next: None, prev: None, leader: None, tail: None }
    }
    fn is_empty(&self) -> bool {
        self.leader.is_none() && self.tail.is_none()
    }
}

/// An adaptive Huffman coder maintaining a single prefix-code tree.
///
/// `split` only controls cosmetic output formatting in the line driver; it
/// has no effect on the tree or on decoding.
pub struct Model {
    nodes: Vec<Node>,
    blocks: Vec<Block>,
    root: NodeId,
    nyt: NodeId,
    start_block: BlockId,
    symbols: HashMap<u8, NodeId>,
    split: bool,
}

impl Model {
    /// Construct a fresh model: a single root node (the initial NYT) in the
    /// weight-0 leaf block, followed by an empty weight-0 internal block.
    pub fn new(split: bool) -> Self {
        let mut nodes = vec![Node::new(0)];
        let root: NodeId = 0;
        let mut blocks = vec![Block::new(false, 0), Block::new(true, 0)];
        blocks[0].next = Some(1);
        blocks[1].prev = Some(0);
        blocks[0].leader = Some(root);
        blocks[0].tail = Some(root);
        nodes[root].block = Some(0);
        Self { nodes, blocks, root, nyt: root, start_block: 0, symbols: HashMap::new(), split }
    }

    /// Cosmetic grouping flag accepted for API symmetry (see `Model::new`).
    pub fn split(&self) -> bool {
        self.split
    }

    fn alloc_node(&mut self, weight: u32) -> NodeId {
        self.nodes.push(Node::new(weight));
        self.nodes.len() - 1
    }

    fn alloc_block(&mut self, internal: bool, weight: u32) -> BlockId {
        self.blocks.push(Block::new(internal, weight));
        self.blocks.len() - 1
    }

    fn block_insert(&mut self, block: BlockId, node: NodeId) {
        if let Some(tail) = self.blocks[block].tail {
            self.nodes[tail].prev = Some(node);
            self.nodes[node].next = Some(tail);
        }
        if self.blocks[block].leader.is_none() {
            self.blocks[block].leader = Some(node);
        }
        self.blocks[block].tail = Some(node);
        self.nodes[node].block = Some(block);
    }

    fn block_remove(&mut self, block: BlockId, node: NodeId) {
        let node_prev = self.nodes[node].prev;
        let node_next = self.nodes[node].next;
        if let Some(p) = node_prev {
            self.nodes[p].next = node_next;
        }
        if let Some(n) = node_next {
            self.nodes[n].prev = node_prev;
        }
        if self.blocks[block].leader == Some(node) {
            self.blocks[block].leader = node_prev;
        }
        if self.blocks[block].tail == Some(node) {
            self.blocks[block].tail = node_next;
        }
        self.nodes[node].block = None;
        self.nodes[node].prev = None;
        self.nodes[node].next = None;
    }

    /// Find (or create, advancing to `.next`) the block immediately before
    /// or at `weight`, inserting a new terminal block if the list ends first.
    /// Mirrors the reference's `insertNodeIntoBlock` walk.
    fn insert_node_into_block(&mut self, node: NodeId) -> BlockId {
        let internal = !self.nodes[node].is_leaf();
        let node_weight = self.nodes[node].weight;

        let mut curr = self.start_block;
        while self.blocks[curr].weight < node_weight {
            match self.blocks[curr].next {
                Some(next) => curr = next,
                None => {
                    let fresh = self.alloc_block(internal, node_weight);
                    self.blocks[fresh].prev = Some(curr);
                    self.blocks[curr].next = Some(fresh);
                    curr = fresh;
                    break;
                }
            }
        }

        if let Some(b) = self.nodes[node].block {
            self.block_remove(b, node);
        }

        if self.blocks[curr].weight == node_weight && internal && !self.blocks[curr].internal {
            curr = match self.blocks[curr].next {
                Some(next) => next,
                None => {
                    let fresh = self.alloc_block(internal, node_weight);
                    self.blocks[fresh].prev = Some(curr);
                    self.blocks[curr].next = Some(fresh);
                    fresh
                }
            };
        }

        if self.blocks[curr].weight > node_weight || (!internal && self.blocks[curr].internal) {
            let fresh = self.alloc_block(internal, node_weight);
            let before = self.blocks[curr].prev;
            self.blocks[fresh].prev = before;
            self.blocks[fresh].next = Some(curr);
            if let Some(b) = before {
                self.blocks[b].next = Some(fresh);
            }
            self.blocks[curr].prev = Some(fresh);
            curr = fresh;
        }

        self.block_insert(curr, node);
        curr
    }

    /// Extend the tree at the NYT position, returning the new symbol leaf.
    fn split_nyt(&mut self) -> NodeId {
        let nyt = self.nyt;
        let new_leaf = self.alloc_node(0);
        let new_nyt = self.alloc_node(0);

        self.nodes[nyt].right = Some(new_leaf);
        self.nodes[new_leaf].parent = Some(nyt);
        self.nodes[nyt].left = Some(new_nyt);
        self.nodes[new_nyt].parent = Some(nyt);

        let internal_block = self.blocks[self.start_block].next.expect("zero-weight internal block always exists");
        let old_block = self.nodes[nyt].block.expect("NYT always belongs to a block");
        self.block_remove(old_block, nyt);
        self.block_insert(internal_block, nyt);

        self.nyt = new_nyt;
        self.block_insert(self.start_block, new_leaf);
        self.block_insert(self.start_block, self.nyt);

        log::trace!("split NYT: new leaf={new_leaf} new NYT={new_nyt}");
        new_leaf
    }

    fn add_symbol(&mut self, c: u8) -> NodeId {
        let leaf = self.split_nyt();
        self.nodes[leaf].symbol = Some(c);
        self.symbols.insert(c, leaf);
        leaf
    }

    fn find_node(&self, c: u8) -> Option<NodeId> {
        self.symbols.get(&c).copied()
    }

    fn node_to_string(&self, mut node: NodeId) -> String {
        let mut bits = Vec::new();
        while node != self.root {
            let parent = self.nodes[node].parent.expect("non-root node has a parent");
            bits.push(if self.nodes[parent].right == Some(node) { b'1' } else { b'0' });
            node = parent;
        }
        bits.reverse();
        String::from_utf8(bits).expect("bits are all ascii '0'/'1'")
    }

    /// Encode a single byte against the current tree. Does not update the
    /// tree; callers must call [`Model::update_model`] afterwards so that an
    /// encoder and decoder running in lockstep see the same tree.
    pub fn encode(&self, c: u8) -> String {
        match self.find_node(c) {
            Some(leaf) => self.node_to_string(leaf),
            None => {
                let mut out = self.node_to_string(self.nyt);
                for i in (0..8).rev() {
                    out.push(if (c >> i) & 1 == 1 { '1' } else { '0' });
                }
                out
            }
        }
    }

    /// Decode an entire textual bit sequence, updating the tree after every
    /// decoded byte. Characters other than `'0'`/`'1'` are skipped as
    /// navigation no-ops; a truncated trailing literal yields whatever bytes
    /// were fully decoded rather than an error.
    pub fn decode(&mut self, bitstring: &str) -> Vec<u8> {
        let mut out = Vec::new();
        let mut curr = self.root;
        let mut chars = bitstring.chars();

        while let Some(ch) = chars.next() {
            if curr == self.nyt {
                let mut byte: u8 = 0;
                for i in 0..8 {
                    let Some(bit) = (if i == 0 { Some(ch) } else { chars.next() }) else {
                        return out;
                    };
                    byte <<= 1;
                    if bit == '1' {
                        byte |= 1;
                    }
                }
                out.push(byte);
                self.update_model(byte);
                curr = self.root;
            } else {
                match ch {
                    '1' => curr = self.nodes[curr].right.expect("internal node has a right child"),
                    '0' => curr = self.nodes[curr].left.expect("internal node has a left child"),
                    _ => continue,
                }
                if curr != self.nyt && self.nodes[curr].is_leaf() {
                    let symbol = self.nodes[curr].symbol.expect("non-NYT leaf has a symbol");
                    out.push(symbol);
                    self.update_model(symbol);
                    curr = self.root;
                }
            }
        }
        out
    }

    /// Swap two nodes' tree positions (symbol + children), fixing up the
    /// grandchildren's parent pointers and the symbol index unconditionally.
    fn switch_nodes(&mut self, n1: NodeId, n2: NodeId) {
        log::trace!("switch nodes: n1={n1} n2={n2}");
        let s1 = self.nodes[n1].symbol;
        let s2 = self.nodes[n2].symbol;
        self.nodes[n1].symbol = s2;
        self.nodes[n2].symbol = s1;
        if let Some(s) = s1 {
            self.symbols.insert(s, n2);
        }
        if let Some(s) = s2 {
            self.symbols.insert(s, n1);
        }

        let (l1, r1) = (self.nodes[n1].left, self.nodes[n1].right);
        let (l2, r2) = (self.nodes[n2].left, self.nodes[n2].right);
        self.nodes[n1].left = l2;
        self.nodes[n1].right = r2;
        self.nodes[n2].left = l1;
        self.nodes[n2].right = r1;

        for child in [l2, r2].into_iter().flatten() {
            self.nodes[child].parent = Some(n1);
        }
        for child in [l1, r1].into_iter().flatten() {
            self.nodes[child].parent = Some(n2);
        }
    }

    /// Relocate `node` past the block that follows it (`node`'s old slide
    /// destination), taking over the positions vacated as `block`'s members
    /// cascade one step toward the tree position `node` is leaving.
    fn shift_block(&mut self, block: BlockId, node: NodeId) {
        let mut curr = self.blocks[block].leader.expect("slide target block is non-empty");
        let mut prev = self.nodes[curr].prev;
        let temp_parent = self.nodes[node].parent.expect("node being slid has a parent");
        let node_was_right = self.nodes[temp_parent].right == Some(node);

        let curr_parent = self.nodes[curr].parent.expect("block leader has a parent");
        if self.nodes[curr_parent].right == Some(curr) {
            self.nodes[curr_parent].right = Some(node);
        } else {
            self.nodes[curr_parent].left = Some(node);
        }
        self.nodes[node].parent = Some(curr_parent);

        while Some(curr) != self.blocks[block].tail {
            let prev_node = prev.expect("block list not exhausted before reaching tail");
            let prev_parent = self.nodes[prev_node].parent.expect("non-tail member has a parent");
            if self.nodes[prev_parent].right == Some(prev_node) {
                self.nodes[prev_parent].right = Some(curr);
            } else {
                self.nodes[prev_parent].left = Some(curr);
            }
            self.nodes[curr].parent = Some(prev_parent);

            curr = prev_node;
            prev = self.nodes[curr].prev;
        }

        if node_was_right {
            self.nodes[temp_parent].right = Some(curr);
        } else {
            self.nodes[temp_parent].left = Some(curr);
        }
        self.nodes[curr].parent = Some(temp_parent);
    }

    /// Advance `node` past its following block if required to restore the
    /// sibling invariant, then increment its weight and reinsert it.
    /// Returns the next node to process on the way up to the root.
    fn slide_and_increment(&mut self, node: NodeId) -> NodeId {
        let parent = self.nodes[node].parent.expect("slide target is not the root");
        let block = self.nodes[node].block.expect("node belongs to a block");
        let next_block = self.blocks[block].next.expect("every block has a backstop successor");

        let node_is_leaf = self.nodes[node].is_leaf();
        let fires = (node_is_leaf
            && self.blocks[next_block].internal
            && self.blocks[next_block].weight == self.nodes[node].weight)
            || (!node_is_leaf
                && !self.blocks[next_block].internal
                && self.blocks[next_block].weight == self.nodes[node].weight + 1);

        if fires {
            log::trace!("slide: node={node} past block={next_block}");
            self.block_remove(block, node);
            if !self.blocks[next_block].is_empty() {
                self.shift_block(next_block, node);
            }
        }

        self.nodes[node].weight += 1;
        self.insert_node_into_block(node);

        if !self.nodes[node].is_leaf() {
            parent
        } else {
            self.nodes[node].parent.expect("leaf has a parent")
        }
    }

    /// Update the tree for byte `c`, keeping an encoder and a decoder that
    /// call this after every symbol in lockstep.
    pub fn update_model(&mut self, c: u8) {
        let mut leaf_to_increment: Option<NodeId> = None;
        let mut curr = match self.find_node(c) {
            None => {
                let new_leaf = self.add_symbol(c);
                leaf_to_increment = Some(new_leaf);
                self.nodes[new_leaf].parent.expect("freshly split leaf has a parent")
            }
            Some(mut node) => {
                let block = self.nodes[node].block.expect("node belongs to a block");
                if self.blocks[block].leader != Some(node) {
                    let leader = self.blocks[block].leader.expect("non-empty block has a leader");
                    self.switch_nodes(node, leader);
                    node = leader;
                }
                let parent = self.nodes[node].parent.expect("non-root leaf has a parent");
                if self.nodes[parent].left == Some(self.nyt) {
                    leaf_to_increment = Some(node);
                    parent
                } else {
                    node
                }
            }
        };

        while curr != self.root {
            curr = self.slide_and_increment(curr);
        }

        self.nodes[self.root].weight += 1;
        let root_block = self.nodes[self.root].block.expect("root belongs to a block");
        self.block_remove(root_block, self.root);
        self.insert_node_into_block(self.root);

        if let Some(leaf) = leaf_to_increment {
            self.slide_and_increment(leaf);
        }

        self.debug_check_invariants();
    }

    #[cfg(debug_assertions)]
    fn debug_check_invariants(&self) {
        let mut w = None;
        let mut b = Some(self.start_block);
        while let Some(curr) = b {
            if let Some(prev_w) = w {
                debug_assert!(self.blocks[curr].weight >= prev_w, "blocks must be weight-ordered");
            }
            w = Some(self.blocks[curr].weight);
            b = self.blocks[curr].next;
        }
        debug_assert!(self.nodes[self.nyt].is_leaf(), "NYT must be a leaf");
        debug_assert_eq!(self.nodes[self.nyt].weight, 0, "NYT must have weight 0");
    }
    #[cfg(not(debug_assertions))]
    fn debug_check_invariants(&self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roundtrip(bytes: &[u8], split: bool) -> (Vec<String>, Vec<u8>) {
        let mut enc_model = Model::new(split);
        let mut fragments = Vec::new();
        for &b in bytes {
            fragments.push(enc_model.encode(b));
            enc_model.update_model(b);
        }
        let mut dec_model = Model::new(split);
        let decoded = dec_model.decode(&fragments.concat());
        (fragments, decoded)
    }

    #[test]
    fn empty_input() {
        let mut model = Model::new(false);
        assert_eq!(model.decode(""), Vec::<u8>::new());
    }

    #[test]
    fn single_byte_a() {
        let mut enc = Model::new(false);
        let frag = enc.encode(b'A');
        assert_eq!(frag, "01000001");
        enc.update_model(b'A');

        let mut dec = Model::new(false);
        assert_eq!(dec.decode("01000001"), vec![b'A']);
    }

    #[test]
    fn repeated_aa() {
        let mut enc = Model::new(false);
        let first = enc.encode(b'A');
        assert_eq!(first, "01000001");
        enc.update_model(b'A');
        let second = enc.encode(b'A');
        assert_eq!(second, "1");
        enc.update_model(b'A');

        let total = [first, second].concat();
        assert_eq!(total, "010000011");

        let mut dec = Model::new(false);
        assert_eq!(dec.decode(&total), b"AA");
    }

    #[test]
    fn ab() {
        let mut enc = Model::new(false);
        let first = enc.encode(b'A');
        enc.update_model(b'A');
        let second = enc.encode(b'B');
        enc.update_model(b'B');
        assert_eq!(first, "01000001");
        assert_eq!(second, "001000010");
        let total = [first, second].concat();
        assert_eq!(total, "01000001001000010");

        let mut dec = Model::new(false);
        assert_eq!(dec.decode(&total), b"AB");
    }

    #[test]
    fn abracadabra_roundtrip_and_weights() {
        let data = b"ABRACADABRA";
        let (fragments, decoded) = roundtrip(data, false);
        assert_eq!(decoded, data);

        let mut model = Model::new(false);
        for (i, &b) in data.iter().enumerate() {
            let _ = fragments[i];
            model.encode(b);
            model.update_model(b);
        }
        assert_eq!(model.nodes[model.root].weight, 11);
        let a = model.find_node(b'A').unwrap();
        let bw = model.find_node(b'B').unwrap();
        let r = model.find_node(b'R').unwrap();
        let c = model.find_node(b'C').unwrap();
        let d = model.find_node(b'D').unwrap();
        assert_eq!(model.nodes[a].weight, 5);
        assert_eq!(model.nodes[bw].weight, 2);
        assert_eq!(model.nodes[r].weight, 2);
        assert_eq!(model.nodes[c].weight, 1);
        assert_eq!(model.nodes[d].weight, 1);
    }

    #[test]
    fn nul_byte_is_a_legitimate_symbol() {
        let data = [0u8, b'A', 0u8, b'B', 0u8];
        let (_, decoded) = roundtrip(&data, false);
        assert_eq!(decoded, data);
    }

    #[test]
    fn decode_tolerates_stray_characters_between_codewords() {
        let mut enc = Model::new(true);
        let first = enc.encode(b'A');
        enc.update_model(b'A');
        let second = enc.encode(b'A');
        enc.update_model(b'A');
        let spaced = format!("{first} {second}");
        let mut dec = Model::new(true);
        assert_eq!(dec.decode(&spaced), b"AA");
    }

    #[test]
    fn decode_truncated_literal_returns_partial_output() {
        let mut dec = Model::new(false);
        // NYT codeword ("") + only 5 of the 8 literal bits.
        assert_eq!(dec.decode("01000"), Vec::<u8>::new());
    }

    #[test]
    fn random_stream_roundtrips_and_preserves_weight() {
        use rand::{Rng, SeedableRng};
        let mut rng = rand::rngs::StdRng::seed_from_u64(42);
        let data: Vec<u8> = (0..10_000).map(|_| rng.gen::<u8>()).collect();

        let mut enc = Model::new(false);
        let mut bits = String::new();
        for (i, &b) in data.iter().enumerate() {
            bits.push_str(&enc.encode(b));
            enc.update_model(b);
            assert_eq!(enc.nodes[enc.root].weight as usize, i + 1);
            let leaf_sum: u32 = enc.symbols.values().map(|&n| enc.nodes[n].weight).sum();
            assert_eq!(leaf_sum as usize, i + 1);
        }

        let mut dec = Model::new(false);
        assert_eq!(dec.decode(&bits), data);
    }
}
