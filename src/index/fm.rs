use serde::{Deserialize, Serialize};

use super::{sa, ExactMatchIndex};
use crate::util::dna;

/// Occ 采样块大小（每个块记录一次各字母的累计计数）
pub const DEFAULT_BLOCK: usize = 128;

/// 朴素 FM 索引：
/// - 字母以 [0..sigma) 编码，0 预留为记录分隔符 $。
/// - 采用定长分块的 Occ 采样（块内顺扫补偿）。
/// - 只做包含/计数查询，构建完成后丢弃 SA，持久化体积只有 BWT + 采样。
#[derive(Debug, Serialize, Deserialize)]
pub struct FMIndex {
    pub sigma: u8,
    pub block: u32,
    /// C[i] = 文本中字母 < i 的累计数量
    pub c: Vec<u32>,
    /// BWT 序列
    pub bwt: Vec<u8>,
    /// Occ 采样（行优先展平）：occ_samples[block_id * sigma + c]
    pub occ_samples: Vec<u32>,
}

impl FMIndex {
    /// 从编码后的文本构建：SA -> BWT -> C/Occ。
    pub fn from_text(text: &[u8], block: usize) -> Self {
        let sa = sa::build_sa(text);
        let bwt = build_bwt(text, &sa);
        Self::build(bwt, dna::SIGMA as u8, block)
    }

    pub fn build(bwt: Vec<u8>, sigma: u8, block: usize) -> Self {
        let n = bwt.len();
        let sigma_us = sigma as usize;
        let block = block.max(1);

        // C 表
        let mut freq = vec![0u32; sigma_us];
        for &ch in &bwt {
            if let Some(f) = freq.get_mut(ch as usize) { *f += 1; }
        }
        let c: Vec<u32> = freq
            .iter()
            .scan(0u32, |acc, &f| {
                let start = *acc;
                *acc += f;
                Some(start)
            })
            .collect();

        // Occ 采样：每块记录块起点之前的累计
        let num_blocks = n.div_ceil(block);
        let mut occ_samples = Vec::with_capacity(num_blocks * sigma_us);
        let mut running = vec![0u32; sigma_us];
        for chunk in bwt.chunks(block) {
            occ_samples.extend_from_slice(&running);
            for &ch in chunk {
                if let Some(r) = running.get_mut(ch as usize) { *r += 1; }
            }
        }

        Self { sigma, block: block as u32, c, bwt, occ_samples }
    }

    /// BWT[0..pos) 中 a 的出现次数
    #[inline]
    pub fn occ(&self, a: u8, pos: usize) -> u32 {
        if pos == 0 { return 0; }
        let sigma_us = self.sigma as usize;
        let block = self.block as usize;
        let bi = (pos - 1) / block;
        let base = self.occ_samples[bi * sigma_us + a as usize];
        let add = self.bwt[bi * block..pos].iter().filter(|&&ch| ch == a).count() as u32;
        base + add
    }

    /// 反向搜索精确匹配，返回 SA 区间 [l, r)。pat 为编码后的字母表，不应包含 0。
    pub fn backward_search(&self, pat: &[u8]) -> Option<(usize, usize)> {
        if self.bwt.is_empty() { return None; }
        let (mut l, mut r) = (0usize, self.bwt.len());
        for &a in pat.iter().rev() {
            if a == dna::SEPARATOR || a as usize >= self.c.len() { return None; }
            let c0 = self.c[a as usize] as usize;
            l = c0 + self.occ(a, l) as usize;
            r = c0 + self.occ(a, r) as usize;
            if l >= r { return None; }
        }
        Some((l, r))
    }

    /// 模式串出现次数
    pub fn count(&self, pat: &[u8]) -> usize {
        self.backward_search(pat).map_or(0, |(l, r)| r - l)
    }
}

impl ExactMatchIndex for FMIndex {
    fn contains(&self, pattern: &[u8]) -> bool {
        self.count(pattern) > 0
    }
}

/// 根据后缀数组构建 BWT（循环取前一个字符）。
pub fn build_bwt(text: &[u8], sa: &[u32]) -> Vec<u8> {
    let n = text.len();
    sa.iter()
        .map(|&p| match p as usize {
            0 => text[n - 1],
            i => text[i - 1],
        })
        .collect()
}
