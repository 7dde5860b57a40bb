//! # unitig-caller
//!
//! 在一组细菌基因组（或测序 reads）中判定序列（unitig / k-mer 串）的存在与否。
//!
//! 提供两条互相独立的路径：
//!
//! - **精确子串搜索**：每个样本构建一个 FM 索引（后缀数组 + BWT），对每条查询
//!   检索正链与反向互补链，输出出现该序列的样本名
//! - **着色 de Bruijn 图**：从参考序列 / reads 构建压缩着色 de Bruijn 图，
//!   按 head/tail 规则给每个 unitig 或查询串计算颜色向量
//!
//! ## 快速示例
//!
//! ```rust,no_run
//! use unitig_caller::index::{Collection, IndexBackend};
//! use unitig_caller::output::MatchWriter;
//! use unitig_caller::pool::RayonPool;
//! use unitig_caller::search::{SearchEngine, SearchOpt};
//!
//! let pool = RayonPool::new(4)?;
//! let strains = vec![Collection::new("A", "a.fa"), Collection::new("B", "b.fa")];
//! let opt = SearchOpt { backend: IndexBackend::Fm, write_index: true };
//! let engine = SearchEngine::build(&strains, &opt, &pool)?;
//!
//! let queries = vec!["ACGTTGCA".to_string()];
//! let out = MatchWriter::create("out.pyseer".as_ref())?;
//! engine.call_strings(&queries, &out)?;
//! # Ok::<(), unitig_caller::Error>(())
//! ```
//!
//! ## 模块说明
//!
//! - [`io`]：FASTA / FASTQ 解析，样本列表与查询列表
//! - [`index`]：精确匹配索引（FM 索引、线性扫描）及其磁盘缓存
//! - [`partition`] / [`pool`]：任务分片与线程池
//! - [`search`]：并行子串搜索
//! - [`graph`]：着色 de Bruijn 图、GFA 读写、颜色推断
//! - [`output`]：结果输出（pyseer / tsv / rtab）
//! - [`util`]：DNA 编码 / 反向互补等工具函数

pub mod error;
pub mod graph;
pub mod index;
pub mod io;
pub mod output;
pub mod partition;
pub mod pool;
pub mod search;
pub mod util;

pub use error::{Error, Result};
pub use graph::colours::ColourVector;
pub use graph::dbg::{BuildOpt, ColouredDbg, GraphInput};
pub use graph::resolver::{call_unitigs, query_unitig, query_unitigs};
pub use graph::ColouredGraph;
pub use index::{Collection, IndexBackend};
pub use search::{SearchEngine, SearchOpt};
