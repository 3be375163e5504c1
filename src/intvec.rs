// src/intvec.rs

//! Dynamic packed integer vector.
//!
//! Values live in chunks of at most 128 slots; each chunk packs its slots
//! at its own bit width and re-encodes itself when a wider value arrives,
//! so one large value only widens the chunk it lands in. The serialized
//! form packs the whole vector at the global minimal width.

use std::io::{self, Error, ErrorKind, Read, Write};

use simple_sds::serialize::Serialize;

const CHUNK_LEN: usize = 128;

#[inline]
fn bits_for(value: u64) -> usize {
    (64 - value.leading_zeros() as usize).max(1)
}

#[inline]
fn width_mask(width: usize) -> u64 {
    if width == 64 {
        u64::MAX
    } else {
        (1u64 << width) - 1
    }
}

fn pack_values(values: &[u64], width: usize) -> Vec<u64> {
    let bits = values.len() * width;
    let mut words = vec![0u64; (bits + 63) / 64];
    for (i, &value) in values.iter().enumerate() {
        let bit = i * width;
        let wi = bit / 64;
        let off = bit % 64;
        words[wi] |= value << off;
        if off + width > 64 {
            words[wi + 1] |= value >> (64 - off);
        }
    }
    words
}

fn unpack_value(words: &[u64], width: usize, i: usize) -> u64 {
    let bit = i * width;
    let wi = bit / 64;
    let off = bit % 64;
    if off + width <= 64 {
        (words[wi] >> off) & width_mask(width)
    } else {
        ((words[wi] >> off) | (words[wi + 1] << (64 - off))) & width_mask(width)
    }
}

#[derive(Clone, Debug)]
struct Chunk {
    width: usize,
    words: Vec<u64>,
    len: usize,
}

impl Chunk {
    fn from_values(values: &[u64], width: usize) -> Chunk {
        Chunk {
            width,
            words: pack_values(values, width),
            len: values.len(),
        }
    }

    #[inline]
    fn get(&self, i: usize) -> u64 {
        unpack_value(&self.words, self.width, i)
    }

    fn decode(&self) -> Vec<u64> {
        (0..self.len).map(|i| self.get(i)).collect()
    }

    fn set(&mut self, i: usize, value: u64) {
        if bits_for(value) > self.width {
            *self = Chunk::from_values(&self.decode(), bits_for(value));
        }
        let width = self.width;
        let bit = i * width;
        let wi = bit / 64;
        let off = bit % 64;
        let mask = width_mask(width);
        self.words[wi] = (self.words[wi] & !(mask << off)) | ((value & mask) << off);
        if off + width > 64 {
            let high_bits = off + width - 64;
            let high_mask = (1u64 << high_bits) - 1;
            self.words[wi + 1] = (self.words[wi + 1] & !high_mask) | (value >> (64 - off));
        }
    }

    fn insert(&mut self, i: usize, value: u64) {
        debug_assert!(self.len < CHUNK_LEN && i <= self.len);
        let width = self.width.max(bits_for(value));
        let mut values = self.decode();
        values.insert(i, value);
        *self = Chunk::from_values(&values, width);
    }

    fn remove(&mut self, i: usize) -> u64 {
        debug_assert!(i < self.len);
        let mut values = self.decode();
        let value = values.remove(i);
        *self = Chunk::from_values(&values, self.width);
        value
    }

    fn split(&mut self) -> Chunk {
        let mut values = self.decode();
        let right = values.split_off(values.len() / 2);
        let width = self.width;
        *self = Chunk::from_values(&values, width);
        Chunk::from_values(&right, width)
    }
}

/// Dynamic packed integer vector: positional access and assignment,
/// insertion and removal at any index.
#[derive(Clone, Debug, Default)]
pub struct PackedIntVec {
    chunks: Vec<Chunk>,
    len: usize,
}

impl PackedIntVec {
    pub fn new() -> Self {
        PackedIntVec::default()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    fn locate(&self, mut i: usize) -> (usize, usize) {
        for (c, chunk) in self.chunks.iter().enumerate() {
            if i < chunk.len {
                return (c, i);
            }
            i -= chunk.len;
        }
        panic!("integer index out of bounds");
    }

    pub fn at(&self, i: usize) -> u64 {
        assert!(i < self.len, "index {} out of bounds ({})", i, self.len);
        let (c, off) = self.locate(i);
        self.chunks[c].get(off)
    }

    pub fn set(&mut self, i: usize, value: u64) {
        assert!(i < self.len, "index {} out of bounds ({})", i, self.len);
        let (c, off) = self.locate(i);
        self.chunks[c].set(off, value);
    }

    pub fn push(&mut self, value: u64) {
        self.insert(self.len, value);
    }

    pub fn insert(&mut self, i: usize, value: u64) {
        assert!(i <= self.len, "index {} out of bounds ({})", i, self.len);
        if self.chunks.is_empty() {
            self.chunks.push(Chunk::from_values(&[], bits_for(value)));
        }
        let (mut c, mut off) = {
            let mut off = i;
            let mut c = 0;
            while off > self.chunks[c].len {
                off -= self.chunks[c].len;
                c += 1;
            }
            (c, off)
        };
        if self.chunks[c].len == CHUNK_LEN {
            let right = self.chunks[c].split();
            self.chunks.insert(c + 1, right);
            if off > self.chunks[c].len {
                off -= self.chunks[c].len;
                c += 1;
            }
        }
        self.chunks[c].insert(off, value);
        self.len += 1;
    }

    pub fn remove(&mut self, i: usize) -> u64 {
        assert!(i < self.len, "index {} out of bounds ({})", i, self.len);
        let (c, off) = self.locate(i);
        let value = self.chunks[c].remove(off);
        if self.chunks[c].len == 0 {
            self.chunks.remove(c);
        }
        self.len -= 1;
        value
    }

    fn max_width(&self) -> usize {
        let mut width = 1;
        for chunk in &self.chunks {
            for i in 0..chunk.len {
                width = width.max(bits_for(chunk.get(i)));
            }
        }
        width
    }
}

impl Serialize for PackedIntVec {
    fn serialize_header<T: Write>(&self, writer: &mut T) -> io::Result<()> {
        self.len.serialize(writer)
    }

    fn serialize_body<T: Write>(&self, writer: &mut T) -> io::Result<()> {
        let width = self.max_width();
        let mut values = Vec::with_capacity(self.len);
        for chunk in &self.chunks {
            values.extend(chunk.decode());
        }
        width.serialize(writer)?;
        pack_values(&values, width).serialize(writer)
    }

    fn load<T: Read>(reader: &mut T) -> io::Result<Self> {
        let len = usize::load(reader)?;
        let width = usize::load(reader)?;
        if width == 0 || width > 64 {
            return Err(Error::new(
                ErrorKind::InvalidData,
                "invalid packed vector width",
            ));
        }
        let words = Vec::<u64>::load(reader)?;
        if words.len() != (len * width + 63) / 64 {
            return Err(Error::new(
                ErrorKind::InvalidData,
                "packed vector length does not match its data",
            ));
        }
        let mut iv = PackedIntVec::new();
        for i in 0..len {
            iv.push(unpack_value(&words, width, i));
        }
        Ok(iv)
    }

    fn size_in_elements(&self) -> usize {
        let width = self.max_width();
        2 + 1 + (self.len * width + 63) / 64
    }
}
