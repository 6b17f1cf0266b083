use async_trait::async_trait;
use roxmltree::Node;
use std::collections::BTreeMap;
use std::io::{Read, Seek};
use std::time::Instant;

use super::ooxml::{relationship_id, text_of, Package, RelationshipKind};
use super::Extractor;
use crate::error::DecodeError;
use crate::utils::{cell_range, cell_ref, CellRef};

/// Every sheet of a workbook, in declared order, rendered as CSV under a
/// `--- Sheet: name ---` marker.
pub struct XlsxExtractor;

#[async_trait]
impl Extractor for XlsxExtractor {
    async fn extract(&self, bytes: &[u8]) -> Result<String, DecodeError> {
        extract_xlsx(bytes)
    }
}

pub fn extract_xlsx(bytes: &[u8]) -> Result<String, DecodeError> {
    let start = Instant::now();
    let mut package = Package::from_bytes(bytes)?;

    let workbook_part = package.main_part()?;
    let workbook_rels = package.relationships(&workbook_part)?;

    let shared = match workbook_rels
        .iter()
        .find(|r| r.is(RelationshipKind::SharedStrings))
    {
        Some(rel) => load_shared_strings(&mut package, &rel.target)?,
        None => Vec::new(),
    };

    let xml = package.read_part(&workbook_part)?;
    let workbook = roxmltree::Document::parse(&xml)?;
    let sheets: Vec<(String, Option<String>)> = workbook
        .descendants()
        .filter(|n| n.has_tag_name("sheet"))
        .map(|n| {
            (
                n.attribute("name").unwrap_or_default().to_string(),
                relationship_id(n),
            )
        })
        .collect();

    let mut text = String::new();
    for (name, rel_id) in &sheets {
        let rel = workbook_rels
            .iter()
            .find(|r| Some(&r.id) == rel_id.as_ref())
            .ok_or_else(|| DecodeError::MissingPart(format!("sheet '{}'", name)))?;

        text.push_str(&format!("\n--- Sheet: {} ---\n", name));
        // chart sheets have no cell grid
        if rel.is(RelationshipKind::Worksheet) {
            text.push_str(&load_sheet_csv(&mut package, &rel.target, &shared)?);
        }
        text.push('\n');
        tracing::debug!(sheet = %name, "extracted sheet");
    }

    tracing::debug!(
        sheets = sheets.len(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "extracted workbook"
    );
    Ok(text)
}

fn load_shared_strings<R: Read + Seek>(
    package: &mut Package<R>,
    part: &str,
) -> Result<Vec<String>, DecodeError> {
    let Some(xml) = package.try_read_part(part)? else {
        return Ok(Vec::new());
    };
    let doc = roxmltree::Document::parse(&xml)?;

    let strings = doc
        .root_element()
        .children()
        .filter(|n| n.has_tag_name("si"))
        .map(|si| {
            si.descendants()
                .filter(|n| n.has_tag_name("t"))
                // phonetic hints are not part of the cell value
                .filter(|n| !n.ancestors().any(|a| a.has_tag_name("rPh")))
                .filter_map(|n| n.text())
                .collect()
        })
        .collect();
    Ok(strings)
}

fn load_sheet_csv<R: Read + Seek>(
    package: &mut Package<R>,
    part: &str,
    shared: &[String],
) -> Result<String, DecodeError> {
    let xml = package.read_part(part)?;
    let doc = roxmltree::Document::parse(&xml)?;

    let mut cells = BTreeMap::new();
    let mut declared = None;
    let mut next_row = 0;

    for node in doc.root_element().children().filter(|n| n.is_element()) {
        match node.tag_name().name() {
            "dimension" => declared = node.attribute("ref").and_then(cell_range),
            "sheetData" => {
                for row in node.children().filter(|n| n.has_tag_name("row")) {
                    let row_index = row
                        .attribute("r")
                        .and_then(|r| r.parse::<u32>().ok())
                        .filter(|r| *r > 0)
                        .map(|r| r - 1)
                        .unwrap_or(next_row);
                    next_row = row_index + 1;

                    let mut next_col = 0;
                    for cell in row.children().filter(|n| n.has_tag_name("c")) {
                        let pos = cell.attribute("r").and_then(cell_ref).unwrap_or(CellRef {
                            row: row_index,
                            col: next_col,
                        });
                        next_col = pos.col + 1;

                        let value = cell_value(cell, shared)?;
                        if !value.is_empty() {
                            cells.insert(pos, value);
                        }
                    }
                }
            }
            _ => {}
        }
    }

    render_csv(&cells, declared)
}

fn cell_value(cell: Node, shared: &[String]) -> Result<String, DecodeError> {
    let raw = cell
        .children()
        .find(|n| n.has_tag_name("v"))
        .and_then(|v| v.text())
        .unwrap_or("");

    let value = match cell.attribute("t").unwrap_or("n") {
        "s" if raw.is_empty() => String::new(),
        "s" => {
            let index: usize = raw
                .trim()
                .parse()
                .map_err(|_| DecodeError::Malformed(format!("bad shared string index '{}'", raw)))?;
            shared
                .get(index)
                .cloned()
                .ok_or_else(|| DecodeError::Malformed(format!("shared string {} out of range", index)))?
        }
        "inlineStr" => cell
            .children()
            .find(|n| n.has_tag_name("is"))
            .map(text_of)
            .unwrap_or_default(),
        "b" if raw.is_empty() => String::new(),
        "b" => (if raw.trim() == "1" { "TRUE" } else { "FALSE" }).to_string(),
        _ => raw.to_string(),
    };
    Ok(value)
}

/// Largest grid a sheet may render to.
const MAX_GRID_CELLS: u64 = 2_000_000;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct GridBounds {
    first_row: u32,
    last_row: u32,
    first_col: u32,
    last_col: u32,
}

impl GridBounds {
    fn around(start: CellRef, end: CellRef) -> Self {
        Self {
            first_row: start.row.min(end.row),
            last_row: start.row.max(end.row),
            first_col: start.col.min(end.col),
            last_col: start.col.max(end.col),
        }
    }

    fn union(self, other: Self) -> Self {
        Self {
            first_row: self.first_row.min(other.first_row),
            last_row: self.last_row.max(other.last_row),
            first_col: self.first_col.min(other.first_col),
            last_col: self.last_col.max(other.last_col),
        }
    }

    fn cell_count(&self) -> u64 {
        (u64::from(self.last_row - self.first_row) + 1) * (u64::from(self.last_col - self.first_col) + 1)
    }
}

/// Render the sheet as CSV. The grid covers the populated cells and the
/// declared `dimension` range; a declared range too large to render is
/// ignored, and a populated area too large to render is an error.
fn render_csv(
    cells: &BTreeMap<CellRef, String>,
    declared: Option<(CellRef, CellRef)>,
) -> Result<String, DecodeError> {
    let mut keys = cells.keys();
    let Some(first) = keys.next() else {
        return Ok(String::new());
    };
    let populated = keys.fold(GridBounds::around(*first, *first), |bounds, pos| {
        bounds.union(GridBounds::around(*pos, *pos))
    });

    let bounds = match declared.map(|(start, end)| populated.union(GridBounds::around(start, end))) {
        Some(full) if full.cell_count() <= MAX_GRID_CELLS => full,
        _ => populated,
    };
    if bounds.cell_count() > MAX_GRID_CELLS {
        return Err(DecodeError::Malformed(format!(
            "sheet spans {} rows by {} columns",
            bounds.last_row - bounds.first_row + 1,
            bounds.last_col - bounds.first_col + 1
        )));
    }

    let csv = (bounds.first_row..=bounds.last_row)
        .map(|row| {
            (bounds.first_col..=bounds.last_col)
                .map(|col| {
                    cells
                        .get(&CellRef { row, col })
                        .map(|v| csv_field(v))
                        .unwrap_or_default()
                })
                .collect::<Vec<_>>()
                .join(",")
        })
        .collect::<Vec<_>>()
        .join("\n");
    Ok(csv)
}

fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}
