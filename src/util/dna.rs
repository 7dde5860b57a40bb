use crate::error::{Error, Result};

pub const SIGMA: usize = 6; // {0:$, 1:A, 2:C, 3:G, 4:T, 5:N}

/// Separator symbol placed between records of one collection.
pub const SEPARATOR: u8 = 0;

#[inline]
pub fn to_alphabet(b: u8) -> u8 {
    if b == 0 { return SEPARATOR; }
    match b.to_ascii_uppercase() {
        b'A' => 1,
        b'C' => 2,
        b'G' => 3,
        b'T' | b'U' => 4,
        _ => 5, // N and anything else
    }
}

/// Encode into the index alphabet; case is folded and unknown symbols map to N.
pub fn encode(seq: &[u8]) -> Vec<u8> {
    seq.iter().map(|&b| to_alphabet(b)).collect()
}

#[inline]
pub fn complement(base: u8) -> Result<u8> {
    match base {
        b'A' => Ok(b'T'),
        b'C' => Ok(b'G'),
        b'G' => Ok(b'C'),
        b'T' => Ok(b'A'),
        other => Err(Error::InvalidNucleotide(other as char)),
    }
}

/// Reverse complement over the strict {A,C,G,T} alphabet.
/// Any other symbol (lowercase included) yields `InvalidNucleotide`.
pub fn revcomp(seq: &[u8]) -> Result<Vec<u8>> {
    seq.iter().rev().map(|&b| complement(b)).collect()
}

/// Lexicographically smaller of `kmer` and its reverse complement, plus
/// whether `kmer` itself was the smaller one. `None` if `kmer` has a non-ACGT base.
pub fn canonical(kmer: &[u8]) -> Option<(Vec<u8>, bool)> {
    let rc = revcomp(kmer).ok()?;
    if kmer <= rc.as_slice() {
        Some((kmer.to_vec(), true))
    } else {
        Some((rc, false))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn revcomp_basic() {
        assert_eq!(revcomp(b"ACGTT").unwrap(), b"AACGT");
        assert_eq!(revcomp(b"").unwrap(), b"");
    }

    #[test]
    fn revcomp_is_an_involution() {
        let mut x: u32 = 7;
        for len in 0..64 {
            let seq: Vec<u8> = (0..len)
                .map(|_| {
                    x = x.wrapping_mul(1_103_515_245).wrapping_add(12_345);
                    b"ACGT"[(x >> 16) as usize % 4]
                })
                .collect();
            assert_eq!(revcomp(&revcomp(&seq).unwrap()).unwrap(), seq);
        }
    }

    #[test]
    fn revcomp_rejects_other_symbols() {
        assert!(matches!(revcomp(b"ACNT"), Err(Error::InvalidNucleotide('N'))));
        assert!(matches!(revcomp(b"acgt"), Err(Error::InvalidNucleotide('t'))));
    }

    #[test]
    fn encode_folds_case_and_unknowns() {
        assert_eq!(encode(b"acgtRu"), vec![1, 2, 3, 4, 5, 4]);
    }

    #[test]
    fn canonical_picks_smaller_strand() {
        assert_eq!(canonical(b"TTT"), Some((b"AAA".to_vec(), false)));
        assert_eq!(canonical(b"AAC"), Some((b"AAC".to_vec(), true)));
        assert_eq!(canonical(b"ANC"), None);
    }
}
