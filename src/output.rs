//! 结果输出。
//!
//! 两种行格式，以及颜色结果的 rtab / pyseer 形式：
//!
//! - search hits: `<query> | <name>:1 <name>:1 ...`
//! - colour table: `<sequence>\t<bits>` (bits empty for an absent query)
//! - rtab: header `Unitig\t<name>...`, then `<sequence>\t0\t1...`
//!
//! 凡是接收路径的 `create` / `write_*` 调用都会截断目标文件。

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use parking_lot::Mutex;

use crate::error::{Error, Result};
use crate::graph::colours::ColourVector;

fn create(path: &Path) -> Result<BufWriter<File>> {
    File::create(path)
        .map(BufWriter::new)
        .map_err(|source| Error::UnwritableOutput { path: path.to_path_buf(), source })
}

/// 串行化的命中结果写出器，多线程写入时行不会交错。
pub struct MatchWriter<W: Write> {
    inner: Mutex<W>,
}

impl MatchWriter<BufWriter<File>> {
    pub fn create(path: &Path) -> Result<Self> {
        Ok(Self::new(create(path)?))
    }
}

impl<W: Write> MatchWriter<W> {
    pub fn new(inner: W) -> Self {
        Self { inner: Mutex::new(inner) }
    }

    pub fn write_hits<S: AsRef<str>>(&self, query: &str, present: &[S]) -> Result<()> {
        let mut line = String::with_capacity(query.len() + 2 + present.len() * 8);
        line.push_str(query);
        line.push_str(" |");
        for name in present {
            line.push(' ');
            line.push_str(name.as_ref());
            line.push_str(":1");
        }
        line.push('\n');
        self.inner.lock().write_all(line.as_bytes())?;
        Ok(())
    }

    pub fn flush(&self) -> Result<()> {
        self.inner.lock().flush()?;
        Ok(())
    }

    pub fn into_inner(self) -> W {
        self.inner.into_inner()
    }
}

/// `<sequence>\t<bits>` per row; `None` rows get an empty bit field.
pub fn write_colour_table<'a, W, S, I>(out: &mut W, rows: I) -> Result<()>
where
    W: Write,
    S: AsRef<str>,
    I: IntoIterator<Item = (S, Option<&'a ColourVector>)>,
{
    for (seq, colours) in rows {
        match colours {
            Some(c) => writeln!(out, "{}\t{}", seq.as_ref(), c)?,
            None => writeln!(out, "{}\t", seq.as_ref())?,
        }
    }
    Ok(())
}

/// rtab 存在/缺失矩阵；不在图中的行写为全 0。
pub fn write_rtab<'a, W, S, I>(out: &mut W, colour_names: &[String], rows: I) -> Result<()>
where
    W: Write,
    S: AsRef<str>,
    I: IntoIterator<Item = (S, Option<&'a ColourVector>)>,
{
    write!(out, "Unitig")?;
    for name in colour_names {
        write!(out, "\t{name}")?;
    }
    writeln!(out)?;

    for (seq, colours) in rows {
        out.write_all(seq.as_ref().as_bytes())?;
        for id in 0..colour_names.len() {
            let bit = colours.is_some_and(|c| c.contains(id));
            out.write_all(if bit { b"\t1" } else { b"\t0" })?;
        }
        writeln!(out)?;
    }
    Ok(())
}

/// pyseer rendering of colour results: rows present in no colour are skipped.
pub fn write_pyseer<'a, W, S, I>(out: &mut W, colour_names: &[String], rows: I) -> Result<()>
where
    W: Write,
    S: AsRef<str>,
    I: IntoIterator<Item = (S, Option<&'a ColourVector>)>,
{
    let writer = MatchWriter::new(out);
    for (seq, colours) in rows {
        let Some(colours) = colours else { continue };
        let present: Vec<&str> = colours
            .ones()
            .filter_map(|id| colour_names.get(id).map(String::as_str))
            .collect();
        if !present.is_empty() {
            writer.write_hits(seq.as_ref(), &present)?;
        }
    }
    writer.flush()
}

/// Which renderings of a colour result to produce next to the `.tsv` table.
#[derive(Debug, Clone, Copy, Default)]
pub struct ColourOutputs {
    pub rtab: bool,
    pub pyseer: bool,
}

/// Write `<prefix>.tsv` and, if requested, `<prefix>.rtab` / `<prefix>.pyseer`.
pub fn write_colour_results(
    prefix: &str,
    colour_names: &[String],
    rows: &[(String, Option<ColourVector>)],
    outputs: ColourOutputs,
) -> Result<()> {
    let as_rows = || rows.iter().map(|(s, c)| (s.as_str(), c.as_ref()));

    let tsv = format!("{prefix}.tsv");
    let mut w = create(Path::new(&tsv))?;
    write_colour_table(&mut w, as_rows())?;
    w.flush()?;

    if outputs.rtab {
        let path = format!("{prefix}.rtab");
        let mut w = create(Path::new(&path))?;
        write_rtab(&mut w, colour_names, as_rows())?;
        w.flush()?;
    }
    if outputs.pyseer {
        let path = format!("{prefix}.pyseer");
        let mut w = create(Path::new(&path))?;
        write_pyseer(&mut w, colour_names, as_rows())?;
        w.flush()?;
    }
    Ok(())
}
