// src/paths.rs

//! Embedded paths: the per-node occurrence blocks and the path metadata.
//!
//! Six parallel vectors are addressed by an absolute occurrence index. The
//! wavelet tree stores `path_id + 1` per occurrence with a 0 sentinel at
//! the head of every node's block, so `select(r, 0) + 1 + k` is the
//! absolute index of the k-th occurrence on rank r. The link vectors form a
//! doubly linked list per path over (delta-encoded neighbor id, local rank)
//! pairs.

use crate::graph::{PathMetadata, VariationGraph, PATH_BEGIN_MARKER, PATH_END_MARKER};
use crate::handle::{Handle, OccurrenceHandle, PathHandle};

impl VariationGraph {
    ////////////////////////////////////////////////////////////////////////
    // Path queries
    ////////////////////////////////////////////////////////////////////////

    /// Determine if a path with this name exists.
    pub fn has_path(&self, name: &str) -> bool {
        self.path_names.contains_key(name)
    }

    /// Look up the handle for a path name. The path must exist.
    pub fn get_path_handle(&self, name: &str) -> PathHandle {
        let id = *self
            .path_names
            .get(name)
            .unwrap_or_else(|| panic!("unknown path name {:?}", name));
        PathHandle::new(id)
    }

    /// The name of a path.
    pub fn get_path_name(&self, path: PathHandle) -> &str {
        &self.meta(path).name
    }

    /// Number of occurrences in a path; 0 for unknown handles.
    pub fn get_occurrence_count(&self, path: PathHandle) -> u64 {
        self.path_meta
            .get(&path.as_integer())
            .map_or(0, |meta| meta.length)
    }

    /// Number of path occurrences on a node, over all paths.
    pub fn get_occurrence_count_on_handle(&self, handle: Handle) -> u64 {
        let rank = self.handle_rank(handle);
        let begin = self.path_wt.select(rank, 0) + 1;
        let end = self.path_wt.select(rank + 1, 0);
        (end - begin) as u64
    }

    /// Number of paths, empty ones included.
    pub fn get_path_count(&self) -> u64 {
        self.path_count
    }

    /// True if the path has no occurrences.
    pub fn is_empty(&self, path: PathHandle) -> bool {
        self.get_occurrence_count(path) == 0
    }

    /// Visit every nonempty path.
    pub fn for_each_path_handle<F>(&self, mut iteratee: F)
    where
        F: FnMut(PathHandle),
    {
        for id in 0..self.path_handle_next {
            let path = PathHandle::new(id);
            if self.get_occurrence_count(path) > 0 {
                iteratee(path);
            }
        }
    }

    /// Visit every occurrence on a node, in local rank order.
    pub fn for_each_occurrence_on_handle<F>(&self, handle: Handle, mut iteratee: F)
    where
        F: FnMut(OccurrenceHandle),
    {
        let rank = self.handle_rank(handle) as u64;
        for k in 0..self.get_occurrence_count_on_handle(handle) {
            iteratee(OccurrenceHandle::new(rank, k));
        }
    }

    /// All occurrences on a node; with `match_orientation`, only those
    /// whose visit orientation equals the queried handle's.
    pub fn occurrences_of_handle(
        &self,
        handle: Handle,
        match_orientation: bool,
    ) -> Vec<OccurrenceHandle> {
        let mut result = Vec::new();
        self.for_each_occurrence_on_handle(handle, |occ| {
            if !match_orientation
                || self.get_occurrence(occ).is_reverse() == handle.is_reverse()
            {
                result.push(occ);
            }
        });
        result
    }

    /// Absolute index of an occurrence in the parallel vectors.
    pub(crate) fn occurrence_rank(&self, occ: OccurrenceHandle) -> usize {
        self.path_wt.select(occ.node_rank as usize, 0) + 1 + occ.local_rank as usize
    }

    /// The node handle visited by an occurrence, with its visit
    /// orientation.
    pub fn get_occurrence(&self, occ: OccurrenceHandle) -> Handle {
        let raw = self.rank_to_raw(occ.node_rank as usize) as u64;
        Handle::pack(raw, self.path_rev_iv.at(self.occurrence_rank(occ)) != 0)
    }

    /// The path an occurrence belongs to.
    pub fn get_path(&self, occ: OccurrenceHandle) -> PathHandle {
        PathHandle::new(self.path_wt.at(self.occurrence_rank(occ)) - 1)
    }

    fn meta(&self, path: PathHandle) -> &PathMetadata {
        self.path_meta
            .get(&path.as_integer())
            .unwrap_or_else(|| panic!("unknown path handle {}", path.as_integer()))
    }

    /// First occurrence of a path, which must be nonempty.
    pub fn get_first_occurrence(&self, path: PathHandle) -> OccurrenceHandle {
        let meta = self.meta(path);
        assert!(meta.length > 0, "path {:?} is empty", meta.name);
        meta.first
    }

    /// Last occurrence of a path, which must be nonempty.
    pub fn get_last_occurrence(&self, path: PathHandle) -> OccurrenceHandle {
        let meta = self.meta(path);
        assert!(meta.length > 0, "path {:?} is empty", meta.name);
        meta.last
    }

    /// True if the occurrence is not the last on its path.
    pub fn has_next_occurrence(&self, occ: OccurrenceHandle) -> bool {
        self.path_next_id_iv.at(self.occurrence_rank(occ)) != PATH_END_MARKER
    }

    /// True if the occurrence is not the first on its path.
    pub fn has_previous_occurrence(&self, occ: OccurrenceHandle) -> bool {
        self.path_prev_id_iv.at(self.occurrence_rank(occ)) != PATH_BEGIN_MARKER
    }

    /// The next occurrence on the path, which must exist.
    pub fn get_next_occurrence(&self, occ: OccurrenceHandle) -> OccurrenceHandle {
        let i = self.occurrence_rank(occ);
        let curr_id = self.id_iv.at(self.rank_to_raw(occ.node_rank as usize));
        let delta = self.path_next_id_iv.at(i) - 2;
        let next_id = Self::edge_delta_to_id(curr_id, delta);
        let next = self.get_handle(next_id, false);
        OccurrenceHandle::new(self.handle_rank(next) as u64, self.path_next_rank_iv.at(i))
    }

    /// The previous occurrence on the path, which must exist.
    pub fn get_previous_occurrence(&self, occ: OccurrenceHandle) -> OccurrenceHandle {
        let i = self.occurrence_rank(occ);
        let curr_id = self.id_iv.at(self.rank_to_raw(occ.node_rank as usize));
        let delta = self.path_prev_id_iv.at(i) - 2;
        let prev_id = Self::edge_delta_to_id(curr_id, delta);
        let prev = self.get_handle(prev_id, false);
        OccurrenceHandle::new(self.handle_rank(prev) as u64, self.path_prev_rank_iv.at(i))
    }

    /// Walk a path from first to last occurrence.
    pub fn for_each_occurrence_in_path<F>(&self, path: PathHandle, mut iteratee: F)
    where
        F: FnMut(OccurrenceHandle),
    {
        if self.is_empty(path) {
            return;
        }
        let mut occ = self.get_first_occurrence(path);
        iteratee(occ);
        while self.has_next_occurrence(occ) {
            occ = self.get_next_occurrence(occ);
            iteratee(occ);
        }
    }

    /// The concatenated, visit-oriented sequence a path spells out.
    pub fn path_sequence(&self, path: PathHandle) -> String {
        let mut seq = String::new();
        self.for_each_occurrence_in_path(path, |occ| {
            seq.push_str(&self.get_sequence(self.get_occurrence(occ)));
        });
        seq
    }

    ////////////////////////////////////////////////////////////////////////
    // Path mutation
    ////////////////////////////////////////////////////////////////////////

    /// Create an empty path. The name must be fresh.
    pub fn create_path_handle(&mut self, name: &str) -> PathHandle {
        assert!(
            !self.path_names.contains_key(name),
            "path name {:?} already exists",
            name
        );
        let id = self.path_handle_next;
        self.path_handle_next += 1;
        self.path_names.insert(name.to_string(), id);
        self.path_meta.insert(
            id,
            PathMetadata {
                name: name.to_string(),
                first: OccurrenceHandle::new(0, 0),
                last: OccurrenceHandle::new(0, 0),
                length: 0,
            },
        );
        self.path_count += 1;
        PathHandle::new(id)
    }

    /// Insert an unlinked occurrence at the tail of the node's block.
    pub(crate) fn create_occurrence(
        &mut self,
        path: PathHandle,
        handle: Handle,
    ) -> OccurrenceHandle {
        let node_rank = self.handle_rank(handle) as u64;
        let local_rank = self.get_occurrence_count_on_handle(handle);
        let occ = OccurrenceHandle::new(node_rank, local_rank);
        let i = self.occurrence_rank(occ);
        self.path_wt.insert(i, path.as_integer() + 1);
        self.path_rev_iv.insert(i, handle.is_reverse() as u64);
        self.path_next_id_iv.insert(i, PATH_END_MARKER);
        self.path_next_rank_iv.insert(i, 0);
        self.path_prev_id_iv.insert(i, PATH_BEGIN_MARKER);
        self.path_prev_rank_iv.insert(i, 0);
        occ
    }

    /// Write the forward link of `from` and the backward link of `to`.
    pub(crate) fn link_occurrences(&mut self, from: OccurrenceHandle, to: OccurrenceHandle) {
        debug_assert_eq!(self.get_path(from), self.get_path(to));
        let from_handle = self.get_occurrence(from);
        let to_handle = self.get_occurrence(to);
        let i = self.occurrence_rank(from);
        let forward = self.edge_to_delta(from_handle, to_handle) + 2;
        self.path_next_id_iv.set(i, forward);
        self.path_next_rank_iv.set(i, to.local_rank);
        let j = self.occurrence_rank(to);
        let backward = self.edge_to_delta(to_handle, from_handle) + 2;
        self.path_prev_id_iv.set(j, backward);
        self.path_prev_rank_iv.set(j, from.local_rank);
    }

    /// Append a visit to the end of a path.
    pub fn append_occurrence(&mut self, path: PathHandle, to_append: Handle) -> OccurrenceHandle {
        assert!(
            self.path_meta.contains_key(&path.as_integer()),
            "unknown path handle {}",
            path.as_integer()
        );
        let new_occ = self.create_occurrence(path, to_append);
        let (length, last) = {
            let meta = &self.path_meta[&path.as_integer()];
            (meta.length, meta.last)
        };
        if length > 0 {
            self.link_occurrences(last, new_occ);
        }
        let meta = self.path_meta.get_mut(&path.as_integer()).unwrap();
        if length == 0 {
            meta.first = new_occ;
        }
        meta.last = new_occ;
        meta.length += 1;
        new_occ
    }

    fn destroy_path_handle_records(&mut self, i: usize) {
        self.path_wt.remove(i);
        self.path_rev_iv.remove(i);
        self.path_next_id_iv.remove(i);
        self.path_next_rank_iv.remove(i);
        self.path_prev_id_iv.remove(i);
        self.path_prev_rank_iv.remove(i);
    }

    /// Remove a single occurrence record. Neighbors on its path are left
    /// with begin/end markers; callers that keep the path alive must relink
    /// and maintain the path metadata themselves.
    pub fn destroy_occurrence(&mut self, occ: OccurrenceHandle) {
        if self.has_previous_occurrence(occ) {
            let prev = self.get_previous_occurrence(occ);
            let i = self.occurrence_rank(prev);
            self.path_next_id_iv.set(i, PATH_END_MARKER);
            self.path_next_rank_iv.set(i, 0);
        }
        if self.has_next_occurrence(occ) {
            let next = self.get_next_occurrence(occ);
            let i = self.occurrence_rank(next);
            self.path_prev_id_iv.set(i, PATH_BEGIN_MARKER);
            self.path_prev_rank_iv.set(i, 0);
        }
        // occurrences after this one on the node lose one local rank; every
        // link field pointing at one of them has to drop by one as well.
        // Targets are collected before any decrement lands, because the
        // fields being rewritten are the same ones the walk reads.
        let handle = self.get_occurrence(occ);
        let count = self.get_occurrence_count_on_handle(handle);
        let mut link_targets: Vec<(usize, bool)> = Vec::new();
        for k in occ.local_rank + 1..count {
            let later = OccurrenceHandle::new(occ.node_rank, k);
            if self.has_previous_occurrence(later) {
                let prev = self.get_previous_occurrence(later);
                link_targets.push((self.occurrence_rank(prev), true));
            }
            if self.has_next_occurrence(later) {
                let next = self.get_next_occurrence(later);
                link_targets.push((self.occurrence_rank(next), false));
            }
        }
        for (i, is_next_field) in link_targets {
            if is_next_field {
                let rank = self.path_next_rank_iv.at(i);
                assert!(rank > 0, "occurrence link rank underflow");
                self.path_next_rank_iv.set(i, rank - 1);
            } else {
                let rank = self.path_prev_rank_iv.at(i);
                assert!(rank > 0, "occurrence link rank underflow");
                self.path_prev_rank_iv.set(i, rank - 1);
            }
        }
        // endpoint records of paths visiting this node slide down with the
        // removal as well
        for meta in self.path_meta.values_mut() {
            if meta.length == 0 {
                continue;
            }
            if meta.first.node_rank == occ.node_rank && meta.first.local_rank > occ.local_rank {
                meta.first.local_rank -= 1;
            }
            if meta.last.node_rank == occ.node_rank && meta.last.local_rank > occ.local_rank {
                meta.last.local_rank -= 1;
            }
        }
        self.destroy_path_handle_records(self.occurrence_rank(occ));
    }

    /// Reassign an occurrence to another node, preserving the spelled
    /// sequence.
    pub fn set_occurrence(&mut self, occ: OccurrenceHandle, assign_to: Handle) -> OccurrenceHandle {
        self.replace_occurrence(occ, &[assign_to])[0]
    }

    /// Replace one occurrence with a chain of occurrences over `handles`,
    /// which must concatenate to the same sequence. Links to the
    /// surrounding path context and the path's first/last/length metadata
    /// are maintained.
    pub fn replace_occurrence(
        &mut self,
        occ: OccurrenceHandle,
        handles: &[Handle],
    ) -> Vec<OccurrenceHandle> {
        assert!(!handles.is_empty(), "replacement needs at least one handle");
        let current = self.get_occurrence(occ);
        let prev_seq = self.get_sequence(current);
        let new_seq: String = handles.iter().map(|h| self.get_sequence(*h)).collect();
        assert_eq!(prev_seq, new_seq, "replacement must preserve the path sequence");
        for h in handles {
            assert!(
                h.rank() != current.rank(),
                "cannot replace an occurrence with its own node"
            );
        }
        let path = self.get_path(occ);
        let (was_first, was_last) = {
            let meta = &self.path_meta[&path.as_integer()];
            (meta.first == occ, meta.last == occ)
        };
        let prev = if self.has_previous_occurrence(occ) {
            Some(self.get_previous_occurrence(occ))
        } else {
            None
        };
        let next = if self.has_next_occurrence(occ) {
            Some(self.get_next_occurrence(occ))
        } else {
            None
        };
        self.destroy_occurrence(occ);
        // captured neighbors on the same node shift down with the removal
        let adjust = |mut o: OccurrenceHandle| {
            if o.node_rank == occ.node_rank && o.local_rank > occ.local_rank {
                o.local_rank -= 1;
            }
            o
        };
        let prev = prev.map(adjust);
        let next = next.map(adjust);
        let mut new_occs = Vec::with_capacity(handles.len());
        for h in handles {
            new_occs.push(self.create_occurrence(path, *h));
        }
        for k in 0..new_occs.len() - 1 {
            self.link_occurrences(new_occs[k], new_occs[k + 1]);
        }
        if let Some(prev) = prev {
            self.link_occurrences(prev, new_occs[0]);
        }
        if let Some(next) = next {
            self.link_occurrences(*new_occs.last().unwrap(), next);
        }
        let meta = self.path_meta.get_mut(&path.as_integer()).unwrap();
        if was_first {
            meta.first = new_occs[0];
        }
        if was_last {
            meta.last = *new_occs.last().unwrap();
        }
        meta.length += handles.len() as u64 - 1;
        new_occs
    }

    /// Destroy a path: unlink and remove every occurrence, then erase the
    /// name and metadata.
    pub fn destroy_path(&mut self, path: PathHandle) {
        let id = path.as_integer();
        assert!(self.path_meta.contains_key(&id), "unknown path handle {}", id);
        while self.get_occurrence_count(path) > 0 {
            let first = self.get_first_occurrence(path);
            let next = if self.has_next_occurrence(first) {
                Some(self.get_next_occurrence(first))
            } else {
                None
            };
            self.destroy_occurrence(first);
            let meta = self.path_meta.get_mut(&id).unwrap();
            meta.length -= 1;
            if let Some(mut next) = next {
                if next.node_rank == first.node_rank && next.local_rank > first.local_rank {
                    next.local_rank -= 1;
                }
                meta.first = next;
            }
        }
        let name = self.path_meta.remove(&id).unwrap().name;
        self.path_names.remove(&name);
        self.path_count -= 1;
    }
}
