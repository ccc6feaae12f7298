//! Tables of URL tokens generated from taxonomy data.

use std::collections::BTreeMap;

use serde::Deserialize;

use super::frames::{create_payload, CellAnnotation};
use super::{encode_as_query, PayloadError};
use crate::codec::Codec;

/// Identifier to URL token.
pub type PayloadTable = BTreeMap<String, String>;

/// Annotations of this labelset describe cell properties rather than cell
/// types, and have no metadata category in the explorer.
const SKIPPED_LABELSET: &str = "neurotransmitter";

/// The parts of a taxonomy dendrogram that are read.
#[derive(Deserialize)]
struct Dendrogram {
    annotations: Vec<DendrogramAnnotation>,
}

#[derive(Deserialize)]
struct DendrogramAnnotation {
    cell_set_accession: String,
    #[serde(default)]
    labelset: String,
    #[serde(default)]
    cell_label: String,
}

/// A token for every annotation in a dendrogram, keyed by cell set accession.
pub fn annotation_table(codec: &Codec, dendrogram: &str) -> Result<PayloadTable, PayloadError> {
    let dendrogram = serde_json::from_str::<Dendrogram>(dendrogram)?;

    let mut table = PayloadTable::new();
    for entry in dendrogram.annotations {
        if entry.labelset == SKIPPED_LABELSET {
            continue;
        }
        let annotation = CellAnnotation::new(entry.labelset, entry.cell_label);
        let token = encode_as_query(codec, &create_payload(&annotation, &[]))?;
        table.insert(entry.cell_set_accession, token);
    }
    Ok(table)
}

const CELL_LABEL_COLUMN: &str = "Cell_label";
const LABELSET_COLUMN: &str = "Labelset";
const MARKERS_COLUMN: &str = "Markers_label";
const KEY_COLUMN: &str = "defined_class";

/// A token for every marker set in a tab-separated table, keyed by its
/// `defined_class` column.
///
/// The `Markers_label` column holds the comma-separated gene symbols to
/// filter on.
pub fn gene_table(codec: &Codec, tsv: &str) -> Result<PayloadTable, PayloadError> {
    // Line numbers count from 1 and include blank lines, which are skipped.
    let mut lines = (1..)
        .zip(tsv.lines())
        .filter(|(_, line)| !line.trim().is_empty());
    let header = match lines.next() {
        Some((_, header)) => header.split('\t').collect::<Vec<_>>(),
        None => return Err(PayloadError::EmptyTable),
    };
    let column = |name: &'static str| match header.iter().position(|h| h.trim() == name) {
        Some(index) => Ok(index),
        None => Err(PayloadError::MissingColumn { name }),
    };
    let columns = [
        column(CELL_LABEL_COLUMN)?,
        column(LABELSET_COLUMN)?,
        column(MARKERS_COLUMN)?,
        column(KEY_COLUMN)?,
    ];

    let mut table = PayloadTable::new();
    for (line_number, line) in lines {
        let fields = line.split('\t').collect::<Vec<_>>();
        let field = |column: usize, name: &'static str| match fields.get(column) {
            Some(field) => Ok(*field),
            None => Err(PayloadError::ShortRow {
                line: line_number,
                column: name,
            }),
        };

        let [cell_label, labelset, markers, key] = columns;
        let annotation = CellAnnotation::new(
            field(labelset, LABELSET_COLUMN)?,
            field(cell_label, CELL_LABEL_COLUMN)?,
        );
        let genes = field(markers, MARKERS_COLUMN)?
            .split(',')
            .map(str::trim)
            .filter(|gene| !gene.is_empty())
            .map(str::to_owned)
            .collect::<Vec<_>>();
        let token = encode_as_query(codec, &create_payload(&annotation, &genes))?;
        table.insert(field(key, KEY_COLUMN)?.to_owned(), token);
    }
    Ok(table)
}

/// Render a table as pretty-printed JSON.
pub fn table_to_json(table: &PayloadTable) -> Result<String, PayloadError> {
    Ok(serde_json::to_string_pretty(table)?)
}
