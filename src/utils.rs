use std::path::Path;

use nom::character::complete::{alpha1, char, digit1};
use nom::combinator::{all_consuming, map_res, opt};
use nom::sequence::{pair, preceded};
use nom::IResult;

use crate::error::ExtractionError;
use crate::types::FormatTag;

/// Zero-based spreadsheet cell coordinate
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct CellRef {
    pub row: u32,
    pub col: u32,
}

/// Last dot-separated component of a file name, if any
pub fn file_extension(file_name: &str) -> Option<&str> {
    let name = Path::new(file_name)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(file_name);
    name.rsplit_once('.').map(|(_, ext)| ext)
}

/// Derive the format of a file from its name
pub fn parse_format(file_name: &str) -> Result<FormatTag, ExtractionError> {
    let ext = file_extension(file_name).unwrap_or("");
    FormatTag::from_extension(ext)
        .ok_or_else(|| ExtractionError::UnsupportedFormat(ext.to_ascii_lowercase()))
}

/// True when the path carries one of the recognized extensions
pub fn is_supported(path: &Path) -> bool {
    parse_format(&path.to_string_lossy()).is_ok()
}

fn column_index(letters: &str) -> Result<u32, &'static str> {
    let mut acc: u32 = 0;
    for c in letters.chars() {
        let digit = (c.to_ascii_uppercase() as u32)
            .checked_sub('A' as u32)
            .filter(|d| *d < 26)
            .ok_or("column letter out of range")?;
        acc = acc
            .checked_mul(26)
            .and_then(|a| a.checked_add(digit + 1))
            .ok_or("column overflow")?;
    }
    Ok(acc - 1)
}

fn row_index(digits: &str) -> Result<u32, &'static str> {
    match digits.parse::<u32>() {
        Ok(row) if row > 0 => Ok(row - 1),
        _ => Err("row out of range"),
    }
}

fn column(input: &str) -> IResult<&str, u32> {
    map_res(preceded(opt(char('$')), alpha1), column_index)(input)
}

fn row(input: &str) -> IResult<&str, u32> {
    map_res(preceded(opt(char('$')), digit1), row_index)(input)
}

/// Parse an A1-style cell reference such as `B12` or `$C$3`
pub fn parse_cell_ref(input: &str) -> IResult<&str, CellRef> {
    let (input, (col, row)) = pair(column, row)(input)?;
    Ok((input, CellRef { row, col }))
}

/// Parse a range such as `A1:D5`; a single cell is a one-cell range
pub fn parse_cell_range(input: &str) -> IResult<&str, (CellRef, CellRef)> {
    let (input, (start, end)) =
        pair(parse_cell_ref, opt(preceded(char(':'), parse_cell_ref)))(input)?;
    Ok((input, (start, end.unwrap_or(start))))
}

pub fn cell_ref(s: &str) -> Option<CellRef> {
    all_consuming(parse_cell_ref)(s.trim()).ok().map(|(_, c)| c)
}

pub fn cell_range(s: &str) -> Option<(CellRef, CellRef)> {
    all_consuming(parse_cell_range)(s.trim()).ok().map(|(_, r)| r)
}
