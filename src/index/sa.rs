/// 后缀数组构建（前缀倍增）。
///
/// 输入为数值化文本（0:$ 分隔符, 1:A, 2:C, 3:G, 4:T, 5:N），
/// 允许多个 0 作为记录之间的分隔符。每一轮按 (rank[i], rank[i+k]) 排序，
/// 秩全部互异时提前结束。
pub fn build_sa(text: &[u8]) -> Vec<u32> {
    let n = text.len();
    if n == 0 {
        return Vec::new();
    }

    let mut sa: Vec<u32> = (0..n as u32).collect();
    let mut rank: Vec<u32> = text.iter().map(|&b| u32::from(b) + 1).collect();
    let mut next_rank = vec![0u32; n];

    // 越界的第二关键字记为 0，小于任何真实秩
    let key = |rank: &[u32], i: usize, k: usize| (rank[i], rank.get(i + k).copied().unwrap_or(0));

    let mut k = 1usize;
    loop {
        sa.sort_unstable_by_key(|&i| key(&rank, i as usize, k));

        next_rank[sa[0] as usize] = 1;
        for w in 1..n {
            let (a, b) = (sa[w - 1] as usize, sa[w] as usize);
            let bump = u32::from(key(&rank, a, k) != key(&rank, b, k));
            next_rank[b] = next_rank[a] + bump;
        }
        std::mem::swap(&mut rank, &mut next_rank);

        if rank[sa[n - 1] as usize] as usize == n || k >= n {
            break;
        }
        k <<= 1;
    }
    sa
}
