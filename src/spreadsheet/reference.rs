//! A1-style cell references.
use crate::spreadsheet::SpreadsheetError;
use regex::Regex;

/// Longest column name a worksheet can hold (`XFD`).
const MAX_COLUMN_LETTERS: usize = 3;

/// Parses column letters to a 0-based column index: A = 0, Z = 25, AA = 26.
pub(crate) fn col_to_index(letters: &str) -> Option<usize> {
    if letters.is_empty()
        || letters.len() > MAX_COLUMN_LETTERS
        || !letters.chars().all(|letter| letter.is_ascii_alphabetic())
    {
        return None;
    }
    letters
        .to_ascii_uppercase()
        .chars()
        .map(|letter| letter as usize - 'A' as usize + 1)
        .reduce(|index, digit| index * 26 + digit)
        .map(|column| column - 1)
}

/// Parses a 1-based row number to a 0-based row index.
pub(crate) fn row_to_index(number: &str) -> Option<usize> {
    number
        .parse::<usize>()
        .ok()
        .filter(|row| *row > 0)
        .map(|row| row - 1)
}

/// Converts a 0-based column index to column letters.
pub fn index_to_col(col: usize) -> String {
    let mut column = col + 1;
    let mut letters = String::new();
    while column > 0 {
        column -= 1;
        letters.insert(0, (b'A' + (column % 26) as u8) as char);
        column /= 26;
    }
    letters
}

/// Converts 0-based (row, col) indexes to a reference such as `B3`.
pub fn index_to_reference(row: usize, col: usize) -> String {
    format!("{}{}", index_to_col(col), row + 1)
}

/// Splits a reference such as `B3` into 0-based (row, col) indexes.
/// Used on the hot path of sheet parsing, so no regex here.
pub(crate) fn reference_to_index(reference: &str) -> Option<(usize, usize)> {
    let split = reference.find(|character: char| character.is_ascii_digit())?;
    let col = col_to_index(&reference[..split])?;
    let row = row_to_index(&reference[split..])?;
    Some((row, col))
}

/// Decodes a user supplied origin cell (`A1`, `c7`, `$B$2`) into 0-based (row, col) indexes.
pub fn parse_cell_reference(reference: &str) -> Result<(usize, usize), SpreadsheetError> {
    let pattern = Regex::new(r"^\$?([A-Za-z]{1,3})\$?([1-9][0-9]*)$").expect("Hardcode regex pattern");
    let invalid = || SpreadsheetError::InvalidCellReference(reference.to_owned());
    let captures = pattern.captures(reference.trim()).ok_or_else(invalid)?;
    let col = captures
        .get(1)
        .and_then(|matcher| col_to_index(matcher.as_str()))
        .ok_or_else(invalid)?;
    let row = captures
        .get(2)
        .and_then(|matcher| row_to_index(matcher.as_str()))
        .ok_or_else(invalid)?;
    Ok((row, col))
}
