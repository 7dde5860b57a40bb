use std::fmt;

use bitvec::prelude::*;

/// 一条序列在群体中的存在/缺失向量。
///
/// 第 `i` 位对应颜色 id `i`，即图中第 `i` 个颜色名；该映射在图的生命周期内不变。
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ColourVector {
    bits: BitVec<u64, Lsb0>,
}

impl ColourVector {
    /// All-zero vector over `nb_colours` colours.
    pub fn zeros(nb_colours: usize) -> Self {
        Self { bits: bitvec![u64, Lsb0; 0; nb_colours] }
    }

    /// Ids beyond `nb_colours` are ignored.
    pub fn from_ids<I: IntoIterator<Item = usize>>(nb_colours: usize, ids: I) -> Self {
        let mut v = Self::zeros(nb_colours);
        for id in ids {
            v.insert(id);
        }
        v
    }

    /// Parse a `0`/`1` string, as written in colour tables.
    pub fn from_bit_str(s: &str) -> Option<Self> {
        let mut bits = BitVec::with_capacity(s.len());
        for c in s.chars() {
            match c {
                '0' => bits.push(false),
                '1' => bits.push(true),
                _ => return None,
            }
        }
        Some(Self { bits })
    }

    /// Number of colours (bits), not the number of colours set.
    pub fn len(&self) -> usize {
        self.bits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }

    pub fn insert(&mut self, id: usize) {
        if let Some(mut bit) = self.bits.get_mut(id) {
            *bit = true;
        }
    }

    pub fn contains(&self, id: usize) -> bool {
        self.bits.get(id).is_some_and(|b| *b)
    }

    pub fn count_ones(&self) -> usize {
        self.bits.count_ones()
    }

    pub fn any(&self) -> bool {
        self.bits.any()
    }

    /// Colour ids that are set, ascending.
    pub fn ones(&self) -> impl Iterator<Item = usize> + '_ {
        self.bits.iter_ones()
    }

    /// Keep a bit only where `tail` also has it: every colour set here but
    /// missing from `tail` is cleared.
    pub fn negate(&self, tail: &ColourVector) -> ColourVector {
        let mut out = self.clone();
        for id in self.bits.iter_ones() {
            if !tail.contains(id) {
                out.bits.set(id, false);
            }
        }
        out
    }

    /// 由首、尾 k-mer 的颜色集合得到序列的颜色向量：
    /// 两者相同时取首端集合，否则首端中不在尾端的颜色被清除。
    pub fn from_head_tail(head: ColourVector, tail: &ColourVector) -> ColourVector {
        if head == *tail {
            head
        } else {
            head.negate(tail)
        }
    }
}

impl fmt::Display for ColourVector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for bit in self.bits.iter() {
            f.write_str(if *bit { "1" } else { "0" })?;
        }
        Ok(())
    }
}
