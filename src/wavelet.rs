// src/wavelet.rs

//! Dynamic wavelet tree over u64 symbols.
//!
//! Every level holds a dynamic bit vector; a symbol's bits, most
//! significant first, choose the branch at each level. Insertion and
//! removal translate an index down the levels through rank, select walks
//! back up. The depth grows on demand by wrapping the root in zero-bit
//! levels, so earlier symbols keep their positions.

use std::io::{self, Error, ErrorKind, Read, Write};

use simple_sds::serialize::Serialize;

use crate::bitvec::DynBitVec;
use crate::intvec::PackedIntVec;

#[inline]
fn bits_for(symbol: u64) -> u32 {
    (64 - symbol.leading_zeros()).max(1)
}

#[derive(Clone, Debug, Default)]
struct Node {
    bits: DynBitVec,
    zero: Option<Box<Node>>,
    one: Option<Box<Node>>,
}

#[derive(Clone, Debug, Default)]
pub struct WaveletTree {
    len: usize,
    depth: u32,
    root: Option<Box<Node>>,
}

impl WaveletTree {
    pub fn new() -> Self {
        WaveletTree::default()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Add zero-bit levels above the root until `depth` levels exist.
    fn grow(&mut self, depth: u32) {
        while self.depth < depth {
            let old = self.root.take();
            let mut bits = DynBitVec::new();
            for _ in 0..self.len {
                bits.push(false);
            }
            self.root = Some(Box::new(Node {
                bits,
                zero: old,
                one: None,
            }));
            self.depth += 1;
        }
    }

    pub fn push(&mut self, symbol: u64) {
        self.insert(self.len, symbol);
    }

    pub fn insert(&mut self, i: usize, symbol: u64) {
        assert!(i <= self.len, "index {} out of bounds ({})", i, self.len);
        let needed = bits_for(symbol);
        if self.root.is_none() {
            self.depth = self.depth.max(needed);
            self.root = Some(Box::new(Node::default()));
        } else if needed > self.depth {
            self.grow(needed);
        }
        Self::insert_rec(self.root.as_mut().unwrap(), self.depth - 1, i, symbol);
        self.len += 1;
    }

    fn insert_rec(node: &mut Node, level: u32, i: usize, symbol: u64) {
        let bit = (symbol >> level) & 1 != 0;
        node.bits.insert(i, bit);
        if level == 0 {
            return;
        }
        let ones = node.bits.rank1(i);
        let child_i = if bit { ones } else { i - ones };
        let child = if bit { &mut node.one } else { &mut node.zero };
        let child = child.get_or_insert_with(|| Box::new(Node::default()));
        Self::insert_rec(child, level - 1, child_i, symbol);
    }

    pub fn remove(&mut self, i: usize) -> u64 {
        assert!(i < self.len, "index {} out of bounds ({})", i, self.len);
        let depth = self.depth;
        let symbol = Self::remove_rec(self.root.as_mut().unwrap(), depth - 1, i);
        self.len -= 1;
        symbol
    }

    fn remove_rec(node: &mut Node, level: u32, i: usize) -> u64 {
        let bit = node.bits.at(i);
        let ones = node.bits.rank1(i);
        let child_i = if bit { ones } else { i - ones };
        node.bits.remove(i);
        let mut symbol = (bit as u64) << level;
        if level > 0 {
            let child = if bit {
                node.one.as_mut()
            } else {
                node.zero.as_mut()
            }
            .expect("wavelet level missing below an occupied branch");
            symbol |= Self::remove_rec(child, level - 1, child_i);
        }
        symbol
    }

    pub fn at(&self, i: usize) -> u64 {
        assert!(i < self.len, "index {} out of bounds ({})", i, self.len);
        let mut node = self.root.as_ref().unwrap();
        let mut i = i;
        let mut symbol = 0u64;
        let mut level = self.depth;
        loop {
            level -= 1;
            let bit = node.bits.at(i);
            symbol |= (bit as u64) << level;
            if level == 0 {
                return symbol;
            }
            let ones = node.bits.rank1(i);
            i = if bit { ones } else { i - ones };
            node = if bit {
                node.one.as_ref()
            } else {
                node.zero.as_ref()
            }
            .expect("wavelet level missing below an occupied branch");
        }
    }

    /// Occurrences of `symbol` in [0, i).
    pub fn rank(&self, i: usize, symbol: u64) -> usize {
        assert!(i <= self.len, "index {} out of bounds ({})", i, self.len);
        if bits_for(symbol) > self.depth {
            return 0;
        }
        let mut node = match self.root.as_ref() {
            Some(root) => root,
            None => return 0,
        };
        let mut i = i;
        let mut level = self.depth;
        loop {
            level -= 1;
            let bit = (symbol >> level) & 1 != 0;
            let ones = node.bits.rank1(i);
            i = if bit { ones } else { i - ones };
            if level == 0 {
                return i;
            }
            match if bit { node.one.as_ref() } else { node.zero.as_ref() } {
                Some(child) => node = child,
                None => return 0,
            }
        }
    }

    /// Position of the k-th occurrence of `symbol` (0-based). Returns the
    /// tree length when there is no such occurrence.
    pub fn select(&self, k: usize, symbol: u64) -> usize {
        if bits_for(symbol) > self.depth {
            return self.len;
        }
        match self
            .root
            .as_ref()
            .and_then(|root| Self::select_rec(root, self.depth - 1, k, symbol))
        {
            Some(pos) => pos,
            None => self.len,
        }
    }

    fn select_rec(node: &Node, level: u32, k: usize, symbol: u64) -> Option<usize> {
        let bit = (symbol >> level) & 1 != 0;
        if level == 0 {
            let count = if bit {
                node.bits.count_ones()
            } else {
                node.bits.count_zeros()
            };
            if k >= count {
                return None;
            }
            return Some(if bit {
                node.bits.select1(k)
            } else {
                node.bits.select0(k)
            });
        }
        let child = if bit { node.one.as_ref() } else { node.zero.as_ref() }?;
        let pos = Self::select_rec(child, level - 1, k, symbol)?;
        Some(if bit {
            node.bits.select1(pos)
        } else {
            node.bits.select0(pos)
        })
    }
}

impl Serialize for WaveletTree {
    fn serialize_header<T: Write>(&self, writer: &mut T) -> io::Result<()> {
        self.len.serialize(writer)
    }

    fn serialize_body<T: Write>(&self, writer: &mut T) -> io::Result<()> {
        let mut values = PackedIntVec::new();
        for i in 0..self.len {
            values.push(self.at(i));
        }
        values.serialize(writer)
    }

    fn load<T: Read>(reader: &mut T) -> io::Result<Self> {
        let len = usize::load(reader)?;
        let values = PackedIntVec::load(reader)?;
        if values.len() != len {
            return Err(Error::new(
                ErrorKind::InvalidData,
                "wavelet tree length does not match its data",
            ));
        }
        let mut wt = WaveletTree::new();
        for i in 0..len {
            wt.push(values.at(i));
        }
        Ok(wt)
    }

    fn size_in_elements(&self) -> usize {
        let mut values = PackedIntVec::new();
        for i in 0..self.len {
            values.push(self.at(i));
        }
        1 + values.size_in_elements()
    }
}
