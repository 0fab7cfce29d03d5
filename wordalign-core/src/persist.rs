//! JSON persistence of lexical tables, used to warm-start Model 2 without
//! retraining Model 1.

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::Result;
use crate::params::LexicalTable;
use crate::types::Prob;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LexicalEntry {
    /// `None` is the null word.
    pub source: Option<String>,
    pub target: String,
    pub prob: Prob,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
struct LexicalSnapshot {
    entries: Vec<LexicalEntry>,
}

pub fn write_lexical<W: Write>(table: &LexicalTable, writer: W) -> Result<()> {
    let entries = table
        .entries()
        .map(|(source, target, prob)| LexicalEntry {
            source: source.map(str::to_string),
            target: target.to_string(),
            prob,
        })
        .collect();
    serde_json::to_writer(writer, &LexicalSnapshot { entries })?;
    Ok(())
}

pub fn read_lexical<R: Read>(reader: R) -> Result<LexicalTable> {
    let snapshot: LexicalSnapshot = serde_json::from_reader(reader)?;
    Ok(LexicalTable::from_entries(
        snapshot
            .entries
            .iter()
            .map(|e| (e.source.as_deref(), e.target.as_str(), e.prob)),
    ))
}

pub fn save_lexical(table: &LexicalTable, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let mut writer = BufWriter::new(File::create(path)?);
    write_lexical(table, &mut writer)?;
    writer.flush()?;
    debug!(path = %path.display(), entries = table.table().len(), "saved lexical table");
    Ok(())
}

pub fn load_lexical(path: impl AsRef<Path>) -> Result<LexicalTable> {
    let file = File::open(path.as_ref())?;
    read_lexical(BufReader::new(file))
}
