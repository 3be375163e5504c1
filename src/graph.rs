// src/graph.rs

//! Succinct dynamic variation graph.
//!
//! Nodes, stranded edges and embedded paths live in a handful of dynamic
//! indexed vectors rather than pointer-linked records: an identifier table
//! with tombstones, a packed 2-bit sequence stream with delimiter bits,
//! per-node topology records with delta-compressed neighbors, and the
//! per-node path-occurrence blocks defined in `paths`. Every mutator keeps
//! the parallel structures in lock-step.

use std::collections::{HashMap, HashSet};
use std::io::{self, Error, ErrorKind, Read, Write};
use std::sync::atomic::{AtomicBool, Ordering};

use rayon::prelude::*;
use simple_sds::serialize::Serialize;

use crate::bitvec::DynBitVec;
use crate::dna;
use crate::handle::{self, Edge, Handle, OccurrenceHandle};
use crate::intvec::PackedIntVec;
use crate::wavelet::WaveletTree;

/// Number of header integers at the start of every topology record.
pub const TOPOLOGY_NODE_HEADER_LENGTH: usize = 1;
/// Header slot holding the record's edge-entry count.
pub const TOPOLOGY_EDGE_COUNT_OFFSET: usize = 0;

/// Link sentinel marking the first occurrence of a path. Above every legal
/// `edge_to_delta(..) + 2` value, whatever the node id range.
pub const PATH_BEGIN_MARKER: u64 = u64::MAX - 1;
/// Link sentinel marking the last occurrence of a path.
pub const PATH_END_MARKER: u64 = u64::MAX;

#[derive(Clone, Debug)]
pub(crate) struct PathMetadata {
    pub(crate) name: String,
    pub(crate) first: OccurrenceHandle,
    pub(crate) last: OccurrenceHandle,
    pub(crate) length: u64,
}

/// A bidirected sequence graph with embedded paths, encoded over dynamic
/// succinct vectors. External node ids are positive and sparse; internal
/// ranks are dense except for tombstones left by deletion.
pub struct VariationGraph {
    pub(crate) max_id: u64,
    pub(crate) min_id: u64,
    pub(crate) node_count: u64,
    pub(crate) edge_count: u64,
    pub(crate) path_count: u64,
    pub(crate) path_handle_next: u64,
    pub(crate) deleted_node_count: u64,
    pub(crate) hidden_count: u64,
    /// external id at each raw rank, 0 at tombstones
    pub(crate) id_iv: PackedIntVec,
    /// tombstone bits, parallel to `id_iv`
    pub(crate) deleted_bv: DynBitVec,
    /// external id -> raw rank
    pub(crate) id_map: HashMap<u64, u64>,
    /// ids of hidden nodes carrying orphaned path sequence
    pub(crate) hidden_ids: HashSet<u64>,
    pub(crate) topology_iv: PackedIntVec,
    pub(crate) topology_bv: DynBitVec,
    pub(crate) seq_pv: PackedIntVec,
    pub(crate) seq_bv: DynBitVec,
    pub(crate) path_wt: WaveletTree,
    pub(crate) path_rev_iv: PackedIntVec,
    pub(crate) path_next_id_iv: PackedIntVec,
    pub(crate) path_next_rank_iv: PackedIntVec,
    pub(crate) path_prev_id_iv: PackedIntVec,
    pub(crate) path_prev_rank_iv: PackedIntVec,
    pub(crate) path_meta: HashMap<u64, PathMetadata>,
    pub(crate) path_names: HashMap<String, u64>,
}

impl Default for VariationGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl VariationGraph {
    pub fn new() -> Self {
        // the delimiter vectors start with one set bit so that select1(r)
        // is the start of rank r's record and select1(r+1) its end, for
        // every rank including the last
        let mut seq_bv = DynBitVec::new();
        seq_bv.push(true);
        let mut topology_bv = DynBitVec::new();
        topology_bv.push(true);
        VariationGraph {
            max_id: 0,
            min_id: 0,
            node_count: 0,
            edge_count: 0,
            path_count: 0,
            path_handle_next: 0,
            deleted_node_count: 0,
            hidden_count: 0,
            id_iv: PackedIntVec::new(),
            deleted_bv: DynBitVec::new(),
            id_map: HashMap::new(),
            hidden_ids: HashSet::new(),
            topology_iv: PackedIntVec::new(),
            topology_bv,
            seq_pv: PackedIntVec::new(),
            seq_bv,
            path_wt: WaveletTree::new(),
            path_rev_iv: PackedIntVec::new(),
            path_next_id_iv: PackedIntVec::new(),
            path_next_rank_iv: PackedIntVec::new(),
            path_prev_id_iv: PackedIntVec::new(),
            path_prev_rank_iv: PackedIntVec::new(),
            path_meta: HashMap::new(),
            path_names: HashMap::new(),
        }
    }

    ////////////////////////////////////////////////////////////////////////
    // Node queries
    ////////////////////////////////////////////////////////////////////////

    /// Check if a node exists by id. Hidden nodes are not reported.
    pub fn has_node(&self, node_id: u64) -> bool {
        self.id_map.contains_key(&node_id) && !self.hidden_ids.contains(&node_id)
    }

    /// Look up the handle for the node with the given id in the given
    /// orientation. The node must exist.
    pub fn get_handle(&self, node_id: u64, is_reverse: bool) -> Handle {
        let rank = *self
            .id_map
            .get(&node_id)
            .unwrap_or_else(|| panic!("unknown node id {}", node_id));
        Handle::pack(rank, is_reverse)
    }

    /// Get the external id from a handle.
    pub fn get_id(&self, handle: Handle) -> u64 {
        self.id_iv.at(handle.rank() as usize)
    }

    /// Get the orientation of a handle.
    pub fn get_is_reverse(&self, handle: Handle) -> bool {
        handle.is_reverse()
    }

    /// Invert the orientation of a handle.
    pub fn flip(&self, handle: Handle) -> Handle {
        handle.flip()
    }

    /// Get the locally forward version of a handle.
    pub fn forward(&self, handle: Handle) -> Handle {
        handle.forward()
    }

    /// Effective rank of a handle: the raw rank with tombstones subtracted.
    /// This is the index into the sequence, topology and occurrence stores.
    pub(crate) fn handle_rank(&self, handle: Handle) -> usize {
        let rank = handle.rank() as usize;
        if self.deleted_node_count == 0 {
            rank
        } else {
            rank - self.deleted_bv.rank1(rank)
        }
    }

    /// Inverse of `handle_rank`: the raw rank of a live effective rank.
    pub(crate) fn rank_to_raw(&self, rank: usize) -> usize {
        if self.deleted_node_count == 0 {
            rank
        } else {
            self.deleted_bv.select0(rank)
        }
    }

    /// Get the length of a node's sequence.
    pub fn get_length(&self, handle: Handle) -> usize {
        let rank = self.handle_rank(handle);
        self.seq_bv.select1(rank + 1) - self.seq_bv.select1(rank)
    }

    /// Get the sequence of a node in the handle's local forward orientation.
    pub fn get_sequence(&self, handle: Handle) -> String {
        let rank = self.handle_rank(handle);
        let start = self.seq_bv.select1(rank);
        let end = self.seq_bv.select1(rank + 1);
        let mut seq = String::with_capacity(end - start);
        for i in start..end {
            seq.push(dna::decode_base(self.seq_pv.at(i)));
        }
        if handle.is_reverse() {
            dna::reverse_complement(&seq)
        } else {
            seq
        }
    }

    /// Number of nodes, hidden nodes included.
    pub fn node_size(&self) -> usize {
        self.id_map.len()
    }

    /// Number of live nodes, as tracked by the mutators.
    pub fn get_node_count(&self) -> u64 {
        self.node_count
    }

    /// Number of edges.
    pub fn get_edge_count(&self) -> u64 {
        self.edge_count
    }

    /// Total number of stored bases across all nodes.
    pub fn total_sequence_length(&self) -> usize {
        self.seq_pv.len()
    }

    /// Smallest live id, or a smaller number. Unspecified when empty.
    pub fn min_node_id(&self) -> u64 {
        self.min_id
    }

    /// Largest live id, or a larger number. Unspecified when empty.
    pub fn max_node_id(&self) -> u64 {
        self.max_id
    }

    ////////////////////////////////////////////////////////////////////////
    // Edge queries
    ////////////////////////////////////////////////////////////////////////

    pub(crate) fn edge_to_delta(&self, left: Handle, right: Handle) -> u64 {
        let a = self.get_id(left) as i64;
        let b = self.get_id(right) as i64;
        let delta = b - a;
        if delta == 0 {
            1
        } else if delta > 0 {
            2 * delta as u64
        } else {
            2 * (-delta) as u64 + 1
        }
    }

    pub(crate) fn edge_delta_to_id(base: u64, delta: u64) -> u64 {
        debug_assert!(delta != 0, "zero edge delta is reserved");
        if delta == 1 {
            base
        } else if delta % 2 == 0 {
            base + delta / 2
        } else {
            base - (delta - 1) / 2
        }
    }

    /// Loop over the handles adjacent to `handle` on its right side
    /// (`go_left == false`) or left side (`go_left == true`). The callback
    /// returns false to stop; the result is false if iteration stopped
    /// early. The iterated node's record must not be mutated mid-loop.
    pub fn follow_edges<F>(&self, handle: Handle, go_left: bool, mut iteratee: F) -> bool
    where
        F: FnMut(Handle) -> bool,
    {
        let handle_id = self.get_id(handle);
        let rank = self.handle_rank(handle);
        let is_rev = handle.is_reverse();
        let record = self.topology_bv.select1(rank);
        let edge_count = self.topology_iv.at(record + TOPOLOGY_EDGE_COUNT_OFFSET) as usize;
        let edge_start = record + TOPOLOGY_NODE_HEADER_LENGTH;
        for e in 0..edge_count {
            let i = edge_start + 2 * e;
            let other_id = Self::edge_delta_to_id(handle_id, self.topology_iv.at(i));
            let tag = self.topology_iv.at(i + 1);
            let on_rev = handle::unpack_on_rev(tag);
            let mut other_rev = handle::unpack_other_rev(tag);
            let mut to_curr = handle::unpack_to_curr(tag);
            if is_rev != on_rev {
                other_rev = !other_rev;
                to_curr = !to_curr;
            }
            if go_left == to_curr && !iteratee(self.get_handle(other_id, other_rev)) {
                return false;
            }
        }
        true
    }

    /// Whether the edge from `left` to `right` exists, in exactly that
    /// traversal frame.
    pub fn has_edge(&self, left: Handle, right: Handle) -> bool {
        let mut exists = false;
        self.follow_edges(left, false, |next| {
            if next == right {
                exists = true;
            }
            !exists
        });
        exists
    }

    /// Number of edges on one side of a handle.
    pub fn get_degree(&self, handle: Handle, go_left: bool) -> usize {
        let mut degree = 0;
        self.follow_edges(handle, go_left, |_| {
            degree += 1;
            true
        });
        degree
    }

    /// A pair of handles used as an edge, in the given traversal frame.
    pub fn edge_handle(&self, left: Handle, right: Handle) -> Edge {
        Edge(left, right)
    }

    /// The canonical storage frame of an edge: smaller id on the left,
    /// reversing both sides when necessary.
    pub(crate) fn canonicalize_edge(&self, left: Handle, right: Handle) -> (Handle, Handle) {
        let left_id = self.get_id(left);
        let right_id = self.get_id(right);
        if left_id > right_id
            || (left_id == right_id && left.is_reverse() && right.is_reverse())
        {
            (right.flip(), left.flip())
        } else {
            (left, right)
        }
    }

    ////////////////////////////////////////////////////////////////////////
    // Iteration
    ////////////////////////////////////////////////////////////////////////

    /// Loop over all nodes in their forward orientation, in internal rank
    /// order. Returns false if the callback stopped the loop. The callback
    /// may destroy the handle it is given, and only that handle.
    pub fn for_each_handle<F>(&self, mut iteratee: F) -> bool
    where
        F: FnMut(Handle) -> bool,
    {
        for i in 0..self.id_iv.len() {
            if self.deleted_bv.at(i) {
                continue;
            }
            if !iteratee(Handle::pack(i as u64, false)) {
                return false;
            }
        }
        true
    }

    /// Parallel variant of `for_each_handle`. The callback must not touch
    /// the graph; stopping early is best-effort only.
    pub fn for_each_handle_parallel<F>(&self, iteratee: F) -> bool
    where
        F: Fn(Handle) -> bool + Sync,
    {
        let stop = AtomicBool::new(false);
        (0..self.id_iv.len()).into_par_iter().for_each(|i| {
            if stop.load(Ordering::Relaxed) || self.deleted_bv.at(i) {
                return;
            }
            if !iteratee(Handle::pack(i as u64, false)) {
                stop.store(true, Ordering::Relaxed);
            }
        });
        !stop.load(Ordering::Relaxed)
    }

    /// Visit every edge once: each node's two orientations are scanned and
    /// an edge is emitted only from the side with the smaller packed value.
    pub fn for_each_edge<F>(&self, mut iteratee: F) -> bool
    where
        F: FnMut(Edge) -> bool,
    {
        self.for_each_handle(|handle| {
            let mut keep_going = true;
            self.follow_edges(handle, false, |next| {
                if handle.as_integer() < next.as_integer() {
                    keep_going = iteratee(Edge(handle, next));
                }
                keep_going
            });
            if keep_going {
                self.follow_edges(handle.flip(), false, |next| {
                    if handle.as_integer() < next.as_integer() {
                        keep_going = iteratee(Edge(handle.flip(), next));
                    }
                    keep_going
                });
            }
            keep_going
        })
    }

    ////////////////////////////////////////////////////////////////////////
    // Node mutation
    ////////////////////////////////////////////////////////////////////////

    /// Create a node with the next free id and return its forward handle.
    pub fn create_handle(&mut self, sequence: &str) -> Handle {
        let id = self.max_id + 1;
        self.create_handle_with_id(sequence, id)
    }

    /// Create a hidden node. Hidden nodes hold sequence that paths still
    /// traverse after the original node was destroyed; they answer every
    /// rank-based query but are not reported by `has_node`.
    pub fn create_hidden_handle(&mut self, sequence: &str) -> Handle {
        let id = self.max_id + 1;
        self.hidden_ids.insert(id);
        self.hidden_count += 1;
        self.create_handle_with_id(sequence, id)
    }

    /// Create a node with the given id and return its forward handle. The
    /// id must be positive and unused, the sequence nonempty.
    pub fn create_handle_with_id(&mut self, sequence: &str, id: u64) -> Handle {
        assert!(!sequence.is_empty(), "node {} must have a nonempty sequence", id);
        assert!(id > 0, "node ids must be positive");
        assert!(!self.id_map.contains_key(&id), "node id {} already exists", id);
        self.max_id = self.max_id.max(id);
        self.min_id = if self.min_id == 0 { id } else { self.min_id.min(id) };
        let raw_rank = self.id_iv.len() as u64;
        self.id_map.insert(id, raw_rank);
        self.id_iv.push(id);
        self.deleted_bv.push(false);
        for c in sequence.bytes() {
            self.seq_pv.push(dna::encode_base(c));
        }
        for _ in 0..sequence.len() - 1 {
            self.seq_bv.push(false);
        }
        self.seq_bv.push(true);
        // empty topology record: header only
        self.topology_iv.push(0);
        self.topology_bv.push(true);
        // empty occurrence block: sentinel only
        self.path_wt.push(0);
        self.path_rev_iv.push(0);
        self.path_next_id_iv.push(0);
        self.path_next_rank_iv.push(0);
        self.path_prev_id_iv.push(0);
        self.path_prev_rank_iv.push(0);
        self.node_count += 1;
        Handle::pack(raw_rank, false)
    }

    /// Remove a node and all of its edges. Paths that traverse the node are
    /// redirected to a hidden node carrying its sequence, so path walks
    /// keep spelling the same string. Invalidates the handle.
    ///
    /// May be called during serial `for_each_handle` only on the node being
    /// iterated, and never during `follow_edges` on this node.
    pub fn destroy_handle(&mut self, handle: Handle) {
        let fwd_handle = handle.forward();
        let id = self.get_id(handle);
        // drop the edges
        let mut edges_to_destroy = Vec::new();
        self.follow_edges(fwd_handle, false, |h| {
            edges_to_destroy.push((fwd_handle, h));
            true
        });
        self.follow_edges(fwd_handle, true, |h| {
            edges_to_destroy.push((h, fwd_handle));
            true
        });
        for (left, right) in edges_to_destroy {
            self.destroy_edge(left, right);
        }
        // move surviving path visits onto a hidden node before any record
        // is removed, so every read during the redirect sees aligned
        // structures; highest local rank first, lower ranks keep meaning
        let mut occurrences = Vec::new();
        self.for_each_occurrence_on_handle(fwd_handle, |occ| occurrences.push(occ));
        if !occurrences.is_empty() {
            let seq = self.get_sequence(fwd_handle);
            let hidden = self.create_hidden_handle(&seq);
            for occ in occurrences.into_iter().rev() {
                let visit = self.get_occurrence(occ);
                let target = if visit.is_reverse() { hidden.flip() } else { hidden };
                self.set_occurrence(occ, target);
            }
        }
        let rank = self.handle_rank(fwd_handle);
        // topology record (empty now: header only)
        let record = self.topology_bv.select1(rank);
        for _ in 0..TOPOLOGY_NODE_HEADER_LENGTH {
            self.topology_iv.remove(record);
            self.topology_bv.remove(record);
        }
        // sequence slice
        let seq_off = self.seq_bv.select1(rank);
        let length = self.seq_bv.select1(rank + 1) - seq_off;
        for _ in 0..length {
            self.seq_pv.remove(seq_off);
            self.seq_bv.remove(seq_off);
        }
        // occurrence block (sentinel only now)
        let begin = self.path_wt.select(rank, 0);
        let end = self.path_wt.select(rank + 1, 0);
        for _ in begin..end {
            self.path_wt.remove(begin);
            self.path_rev_iv.remove(begin);
            self.path_next_id_iv.remove(begin);
            self.path_next_rank_iv.remove(begin);
            self.path_prev_id_iv.remove(begin);
            self.path_prev_rank_iv.remove(begin);
        }
        // tombstone the identifier entry
        let raw = fwd_handle.rank() as usize;
        self.id_iv.set(raw, 0);
        self.deleted_bv.set(raw, true);
        self.id_map.remove(&id);
        if self.hidden_ids.remove(&id) {
            self.hidden_count -= 1;
        }
        self.node_count -= 1;
        self.deleted_node_count += 1;
        // nodes past the tombstone lost one effective rank; the endpoint
        // records in the path metadata follow along (no occurrence can
        // still sit on the destroyed node itself)
        let rank = rank as u64;
        for meta in self.path_meta.values_mut() {
            if meta.length == 0 {
                continue;
            }
            if meta.first.node_rank > rank {
                meta.first.node_rank -= 1;
            }
            if meta.last.node_rank > rank {
                meta.last.node_rank -= 1;
            }
        }
    }

    /// Compact the identifier table: drop tombstones and rewrite the
    /// id-to-rank map to dense ranks. Outstanding handles are invalidated.
    /// Ranks are otherwise stable across deletions within a session.
    pub fn rebuild_id_handle_mapping(&mut self) {
        if self.deleted_node_count == 0 {
            return;
        }
        let mut dense = 0u64;
        for i in 0..self.id_iv.len() {
            let id = self.id_iv.at(i);
            if id == 0 {
                continue;
            }
            self.id_map.insert(id, dense);
            dense += 1;
        }
        let mut i = 0;
        while i < self.id_iv.len() {
            if self.id_iv.at(i) == 0 {
                self.id_iv.remove(i);
                self.deleted_bv.remove(i);
            } else {
                i += 1;
            }
        }
        self.deleted_node_count = 0;
    }

    ////////////////////////////////////////////////////////////////////////
    // Edge mutation
    ////////////////////////////////////////////////////////////////////////

    /// Create an edge between two handles. Existing edges are ignored, in
    /// either orientation of the pair.
    pub fn create_edge(&mut self, left: Handle, right: Handle) {
        if self.has_edge(left, right) {
            return;
        }
        let (left_h, right_h) = self.canonicalize_edge(left, right);
        if self.has_edge(left_h, right_h) {
            return;
        }
        let left_rank = self.handle_rank(left_h);
        let right_rank = self.handle_rank(right_h);
        let left_relative = self.edge_to_delta(left_h, right_h);
        let left_offset = self.topology_bv.select1(left_rank);
        let ins = left_offset + TOPOLOGY_NODE_HEADER_LENGTH;
        self.topology_iv.insert(
            ins,
            handle::pack_edge_tag(left_h.is_reverse(), right_h.is_reverse(), false),
        );
        self.topology_iv.insert(ins, left_relative);
        self.topology_bv.insert(ins, false);
        self.topology_bv.insert(ins, false);
        let count = self.topology_iv.at(left_offset + TOPOLOGY_EDGE_COUNT_OFFSET);
        self.topology_iv.set(left_offset + TOPOLOGY_EDGE_COUNT_OFFSET, count + 1);
        if left_rank != right_rank {
            let right_relative = self.edge_to_delta(right_h, left_h);
            let right_offset = self.topology_bv.select1(right_rank);
            let ins = right_offset + TOPOLOGY_NODE_HEADER_LENGTH;
            self.topology_iv.insert(
                ins,
                handle::pack_edge_tag(right_h.is_reverse(), left_h.is_reverse(), true),
            );
            self.topology_iv.insert(ins, right_relative);
            self.topology_bv.insert(ins, false);
            self.topology_bv.insert(ins, false);
            let count = self.topology_iv.at(right_offset + TOPOLOGY_EDGE_COUNT_OFFSET);
            self.topology_iv.set(right_offset + TOPOLOGY_EDGE_COUNT_OFFSET, count + 1);
        }
        self.edge_count += 1;
    }

    /// Remove one edge entry from a node's record. The target is matched on
    /// its decoded id, orientation and direction, all adjusted to the
    /// viewer's orientation.
    fn remove_edge_entry(
        &mut self,
        rank: usize,
        viewer_rev: bool,
        viewer_id: u64,
        target_id: u64,
        target_rev: bool,
        target_to_curr: bool,
    ) -> bool {
        let offset = self.topology_bv.select1(rank);
        let count = self.topology_iv.at(offset + TOPOLOGY_EDGE_COUNT_OFFSET) as usize;
        let start = offset + TOPOLOGY_NODE_HEADER_LENGTH;
        for e in 0..count {
            let i = start + 2 * e;
            let other_id = Self::edge_delta_to_id(viewer_id, self.topology_iv.at(i));
            let tag = self.topology_iv.at(i + 1);
            let on_rev = handle::unpack_on_rev(tag);
            let mut other_rev = handle::unpack_other_rev(tag);
            let mut to_curr = handle::unpack_to_curr(tag);
            if viewer_rev != on_rev {
                other_rev = !other_rev;
                to_curr = !to_curr;
            }
            if other_id == target_id && other_rev == target_rev && to_curr == target_to_curr {
                self.topology_iv.remove(i);
                self.topology_iv.remove(i);
                self.topology_bv.remove(i);
                self.topology_bv.remove(i);
                let count = self.topology_iv.at(offset + TOPOLOGY_EDGE_COUNT_OFFSET);
                self.topology_iv.set(offset + TOPOLOGY_EDGE_COUNT_OFFSET, count - 1);
                return true;
            }
        }
        false
    }

    /// Remove the edge connecting two handles. Nonexistent edges are
    /// ignored.
    pub fn destroy_edge(&mut self, left: Handle, right: Handle) {
        let (left_h, right_h) = self.canonicalize_edge(left, right);
        let left_rank = self.handle_rank(left_h);
        let right_rank = self.handle_rank(right_h);
        let left_id = self.get_id(left_h);
        let right_id = self.get_id(right_h);
        let found_left = self.remove_edge_entry(
            left_rank,
            left_h.is_reverse(),
            left_id,
            right_id,
            right_h.is_reverse(),
            false,
        );
        let mut found = found_left;
        if left_rank != right_rank {
            let found_right = self.remove_edge_entry(
                right_rank,
                right_h.is_reverse(),
                right_id,
                left_id,
                left_h.is_reverse(),
                true,
            );
            found = found || found_right;
        }
        if found {
            self.edge_count -= 1;
        }
    }

    ////////////////////////////////////////////////////////////////////////
    // Structural rewrites
    ////////////////////////////////////////////////////////////////////////

    /// Overwrite a node's forward-strand sequence, resizing its slice in
    /// place. The new sequence must be nonempty.
    pub fn set_handle_sequence(&mut self, handle: Handle, sequence: &str) {
        assert!(!sequence.is_empty(), "node sequences must be nonempty");
        let rank = self.handle_rank(handle);
        let seq_off = self.seq_bv.select1(rank);
        let length = self.seq_bv.select1(rank + 1) - seq_off;
        if sequence.len() < length {
            for _ in 0..length - sequence.len() {
                self.seq_pv.remove(seq_off + 1);
                self.seq_bv.remove(seq_off + 1);
            }
        } else if sequence.len() > length {
            for _ in 0..sequence.len() - length {
                self.seq_pv.insert(seq_off + 1, 0);
                self.seq_bv.insert(seq_off + 1, false);
            }
        }
        for (i, c) in sequence.bytes().enumerate() {
            self.seq_pv.set(seq_off + i, dna::encode_base(c));
        }
    }

    /// Make the orientation given by the handle the node's forward
    /// orientation: the stored sequence becomes its reverse complement,
    /// incident edges are rewritten, and every path visit flips its
    /// orientation bit so paths keep spelling the same string. Returns the
    /// new forward handle.
    pub fn apply_orientation(&mut self, handle: Handle) -> Handle {
        if !handle.is_reverse() {
            return handle;
        }
        let fwd = handle.flip();
        let mut edges_fwd = Vec::new();
        let mut edges_rev = Vec::new();
        self.follow_edges(fwd, false, |h| {
            edges_fwd.push(h);
            true
        });
        self.follow_edges(fwd, true, |h| {
            edges_rev.push(h);
            true
        });
        for h in &edges_fwd {
            self.destroy_edge(fwd, *h);
        }
        for h in &edges_rev {
            self.destroy_edge(*h, fwd);
        }
        let seq = self.get_sequence(handle);
        self.set_handle_sequence(handle, &seq);
        let rank = self.handle_rank(handle) as u64;
        let count = self.get_occurrence_count_on_handle(handle);
        for k in 0..count {
            let i = self.occurrence_rank(OccurrenceHandle::new(rank, k));
            let rev = self.path_rev_iv.at(i);
            self.path_rev_iv.set(i, 1 - rev);
        }
        for h in &edges_fwd {
            self.create_edge(handle, *h);
        }
        for h in &edges_rev {
            self.create_edge(*h, handle);
        }
        fwd
    }

    /// Split a node at the given offsets, taken in the handle's
    /// orientation. The pieces keep the original's forward strand; the
    /// returned handles come in the order and orientation of the handle
    /// passed in. Path visits are rewritten to cross the pieces in
    /// equivalent order and orientation, and boundary edges are reattached.
    pub fn divide_handle(&mut self, handle: Handle, offsets: &[usize]) -> Vec<Handle> {
        let length = self.get_length(handle);
        let mut fwd_offsets = vec![0usize];
        if handle.is_reverse() {
            for &o in offsets {
                fwd_offsets.push(length - o);
            }
        } else {
            for &o in offsets {
                fwd_offsets.push(o);
            }
        }
        fwd_offsets.sort_unstable();
        let fwd_handle = handle.forward();
        let seq = self.get_sequence(fwd_handle);
        fwd_offsets.push(seq.len());
        let mut handles = Vec::with_capacity(fwd_offsets.len() - 1);
        for pair in fwd_offsets.windows(2) {
            handles.push(self.create_handle(&seq[pair[0]..pair[1]]));
        }
        let mut rev_handles: Vec<Handle> = handles.iter().map(|h| h.flip()).collect();
        rev_handles.reverse();
        for i in 0..handles.len() - 1 {
            self.create_edge(handles[i], handles[i + 1]);
        }
        // rewrite the path context
        let mut occurrences = Vec::new();
        self.for_each_occurrence_on_handle(fwd_handle, |occ| occurrences.push(occ));
        for occ in occurrences.into_iter().rev() {
            let visit = self.get_occurrence(occ);
            if visit.is_reverse() {
                self.replace_occurrence(occ, &rev_handles);
            } else {
                self.replace_occurrence(occ, &handles);
            }
        }
        // reattach the boundary edges; self loops die with the node
        let raw = fwd_handle.rank();
        let mut edges_fwd = Vec::new();
        let mut edges_rev = Vec::new();
        self.follow_edges(fwd_handle, false, |h| {
            if h.rank() != raw {
                edges_fwd.push(h);
            }
            true
        });
        self.follow_edges(fwd_handle, true, |h| {
            if h.rank() != raw {
                edges_rev.push(h);
            }
            true
        });
        self.destroy_handle(fwd_handle);
        for h in &edges_rev {
            self.create_edge(*h, handles[0]);
        }
        for h in &edges_fwd {
            self.create_edge(*handles.last().unwrap(), *h);
        }
        if handle.is_reverse() {
            rev_handles
        } else {
            handles
        }
    }

    /// Remove all nodes, edges and paths.
    pub fn clear(&mut self) {
        *self = Self::new();
    }

    ////////////////////////////////////////////////////////////////////////
    // Serialization
    ////////////////////////////////////////////////////////////////////////

    /// Write the graph as a whole-graph snapshot. Tombstones are compacted
    /// first, so outstanding handles are invalidated.
    pub fn serialize<W: Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.rebuild_id_handle_mapping();
        (self.max_id as usize).serialize(writer)?;
        (self.min_id as usize).serialize(writer)?;
        (self.node_count as usize).serialize(writer)?;
        (self.edge_count as usize).serialize(writer)?;
        (self.path_count as usize).serialize(writer)?;
        (self.path_handle_next as usize).serialize(writer)?;
        (self.deleted_node_count as usize).serialize(writer)?;
        self.id_iv.serialize(writer)?;
        self.deleted_bv.serialize(writer)?;
        let mut ids: Vec<u64> = self.id_map.keys().copied().collect();
        ids.sort_unstable();
        ids.len().serialize(writer)?;
        for id in ids {
            (id as usize).serialize(writer)?;
            (self.id_map[&id] as usize).serialize(writer)?;
        }
        self.topology_iv.serialize(writer)?;
        self.topology_bv.serialize(writer)?;
        self.seq_pv.serialize(writer)?;
        self.seq_bv.serialize(writer)?;
        self.path_wt.serialize(writer)?;
        self.path_rev_iv.serialize(writer)?;
        self.path_next_id_iv.serialize(writer)?;
        self.path_next_rank_iv.serialize(writer)?;
        self.path_prev_id_iv.serialize(writer)?;
        self.path_prev_rank_iv.serialize(writer)?;
        let mut path_ids: Vec<u64> = self.path_meta.keys().copied().collect();
        path_ids.sort_unstable();
        path_ids.len().serialize(writer)?;
        for path_id in path_ids {
            let meta = &self.path_meta[&path_id];
            (path_id as usize).serialize(writer)?;
            (meta.length as usize).serialize(writer)?;
            (meta.first.node_rank as usize).serialize(writer)?;
            (meta.first.local_rank as usize).serialize(writer)?;
            (meta.last.node_rank as usize).serialize(writer)?;
            (meta.last.local_rank as usize).serialize(writer)?;
            serialize_name(&meta.name, writer)?;
        }
        let mut names: Vec<&String> = self.path_names.keys().collect();
        names.sort_unstable();
        names.len().serialize(writer)?;
        for name in names {
            serialize_name(name, writer)?;
            (self.path_names[name] as usize).serialize(writer)?;
        }
        Ok(())
    }

    /// Load a snapshot written by `serialize`. A failed load leaves nothing
    /// usable; discard the result.
    pub fn load<R: Read>(reader: &mut R) -> io::Result<Self> {
        let mut graph = VariationGraph::new();
        graph.max_id = usize::load(reader)? as u64;
        graph.min_id = usize::load(reader)? as u64;
        graph.node_count = usize::load(reader)? as u64;
        graph.edge_count = usize::load(reader)? as u64;
        graph.path_count = usize::load(reader)? as u64;
        graph.path_handle_next = usize::load(reader)? as u64;
        graph.deleted_node_count = usize::load(reader)? as u64;
        graph.id_iv = PackedIntVec::load(reader)?;
        graph.deleted_bv = DynBitVec::load(reader)?;
        let entries = usize::load(reader)?;
        graph.id_map = HashMap::with_capacity(entries);
        for _ in 0..entries {
            let id = usize::load(reader)? as u64;
            let rank = usize::load(reader)? as u64;
            graph.id_map.insert(id, rank);
        }
        graph.topology_iv = PackedIntVec::load(reader)?;
        graph.topology_bv = DynBitVec::load(reader)?;
        graph.seq_pv = PackedIntVec::load(reader)?;
        graph.seq_bv = DynBitVec::load(reader)?;
        graph.path_wt = WaveletTree::load(reader)?;
        graph.path_rev_iv = PackedIntVec::load(reader)?;
        graph.path_next_id_iv = PackedIntVec::load(reader)?;
        graph.path_next_rank_iv = PackedIntVec::load(reader)?;
        graph.path_prev_id_iv = PackedIntVec::load(reader)?;
        graph.path_prev_rank_iv = PackedIntVec::load(reader)?;
        let records = usize::load(reader)?;
        graph.path_meta = HashMap::with_capacity(records);
        for _ in 0..records {
            let path_id = usize::load(reader)? as u64;
            let length = usize::load(reader)? as u64;
            let first = OccurrenceHandle::new(
                usize::load(reader)? as u64,
                usize::load(reader)? as u64,
            );
            let last = OccurrenceHandle::new(
                usize::load(reader)? as u64,
                usize::load(reader)? as u64,
            );
            let name = load_name(reader)?;
            graph.path_meta.insert(
                path_id,
                PathMetadata {
                    name,
                    first,
                    last,
                    length,
                },
            );
        }
        let entries = usize::load(reader)?;
        graph.path_names = HashMap::with_capacity(entries);
        for _ in 0..entries {
            let name = load_name(reader)?;
            let path_id = usize::load(reader)? as u64;
            graph.path_names.insert(name, path_id);
        }
        Ok(graph)
    }
}

/// Length-prefixed string, zero-padded to u64 alignment.
fn serialize_name<W: Write>(name: &str, writer: &mut W) -> io::Result<()> {
    name.len().serialize(writer)?;
    writer.write_all(name.as_bytes())?;
    let pad = (8 - name.len() % 8) % 8;
    writer.write_all(&[0u8; 8][..pad])?;
    Ok(())
}

fn load_name<R: Read>(reader: &mut R) -> io::Result<String> {
    let len = usize::load(reader)?;
    let mut buf = vec![0u8; len + (8 - len % 8) % 8];
    reader.read_exact(&mut buf)?;
    buf.truncate(len);
    String::from_utf8(buf)
        .map_err(|_| Error::new(ErrorKind::InvalidData, "path name is not valid UTF-8"))
}
