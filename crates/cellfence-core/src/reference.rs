//! Best-effort rewriting of A1 references inside formula text
//!
//! Formulas are never parsed into an expression tree. Instead the text is
//! scanned for unqualified A1 references (`B7`, `$B$7`, `A1:C9`) outside
//! string literals and quoted sheet names, and each one is rewritten on its
//! own. What is deliberately left alone:
//!
//! - references qualified with a sheet name (`Data!A1`, `'My Sheet'!A1:B2`)
//! - whole-row and whole-column references (`3:5`, `A:C`)
//! - defined names and function names (`LOG10(` is a call, not cell LOG10)
//! - anything inside `"..."` string literals

use lazy_regex::regex;

use crate::cell::CellAddress;
use crate::shift::{Axis, ShiftOp};
use crate::{MAX_COLS, MAX_ROWS};

/// Text a reference collapses to when it no longer points at a cell
pub const REF_ERROR: &str = "#REF!";

/// Rewrite the references in `formula` for a row/column insertion or deletion
///
/// `$` markers do not pin a reference: inserting a row above `$B$7` turns it
/// into `$B$8`. A single reference inside a deleted band, or pushed past the
/// sheet limit, becomes `#REF!`; a range that loses part of its extent
/// shrinks, and one that loses all of it becomes `#REF!`.
///
/// ```
/// use cellfence_core::{reference::shift_formula, Axis, ShiftOp};
///
/// let op = ShiftOp::insert(Axis::Row, 1, 2); // two rows above row 2
/// assert_eq!(shift_formula("=SUM(A1:A5)*$B$2", &op), "=SUM(A1:A7)*$B$4");
/// assert_eq!(shift_formula("=Other!A5+\"A5\"", &op), "=Other!A5+\"A5\"");
/// ```
pub fn shift_formula(formula: &str, op: &ShiftOp) -> String {
    rewrite_references(formula, |start, end| match end {
        None => Some(match shift_cell(start, op) {
            Some(addr) => addr.to_a1_string(),
            None => REF_ERROR.to_string(),
        }),
        Some(end) => Some(match shift_area(start, end, op) {
            Some((s, e)) => format!("{}:{}", s.to_a1_string(), e.to_a1_string()),
            None => REF_ERROR.to_string(),
        }),
    })
}

/// Move the relative parts of every reference by `(rows, cols)`
///
/// Used to materialize the formula of a cell that follows a shared formula
/// anchored elsewhere. Absolute parts stay where they are; a reference
/// moved off the sheet becomes `#REF!`.
pub fn translate_formula(formula: &str, rows: i64, cols: i64) -> String {
    if rows == 0 && cols == 0 {
        return formula.to_string();
    }
    rewrite_references(formula, |start, end| {
        let moved_start = translate_cell(start, rows, cols);
        let moved_end = end.map(|e| translate_cell(e, rows, cols));
        Some(match (moved_start, moved_end) {
            (Some(s), None) => s.to_a1_string(),
            (Some(s), Some(Some(e))) => format!("{}:{}", s.to_a1_string(), e.to_a1_string()),
            _ => REF_ERROR.to_string(),
        })
    })
}

fn shift_cell(mut addr: CellAddress, op: &ShiftOp) -> Option<CellAddress> {
    match op.axis {
        Axis::Row => addr.row = op.map_index(addr.row)?,
        Axis::Column => addr.col = op.map_index(addr.col as u32)? as u16,
    }
    Some(addr)
}

fn shift_area(
    mut start: CellAddress,
    mut end: CellAddress,
    op: &ShiftOp,
) -> Option<(CellAddress, CellAddress)> {
    let (first, last) = match op.axis {
        Axis::Row => (start.row, end.row),
        Axis::Column => (start.col as u32, end.col as u32),
    };
    if first > last {
        // Reversed corners (`B5:A1`): move each end on its own
        return Some((shift_cell(start, op)?, shift_cell(end, op)?));
    }
    let (first, last) = op.map_span(first, last)?;
    match op.axis {
        Axis::Row => {
            start.row = first;
            end.row = last;
        }
        Axis::Column => {
            start.col = first as u16;
            end.col = last as u16;
        }
    }
    Some((start, end))
}

fn translate_cell(addr: CellAddress, rows: i64, cols: i64) -> Option<CellAddress> {
    let row = if addr.row_absolute {
        addr.row as i64
    } else {
        addr.row as i64 + rows
    };
    let col = if addr.col_absolute {
        addr.col as i64
    } else {
        addr.col as i64 + cols
    };
    if !(0..MAX_ROWS as i64).contains(&row) || !(0..MAX_COLS as i64).contains(&col) {
        return None;
    }
    Some(CellAddress::with_absolute(
        row as u32,
        col as u16,
        addr.row_absolute,
        addr.col_absolute,
    ))
}

/// Apply `rewrite` to every standalone reference in the code parts of
/// `formula`; `None` from `rewrite` keeps the original text
fn rewrite_references<F>(formula: &str, mut rewrite: F) -> String
where
    F: FnMut(CellAddress, Option<CellAddress>) -> Option<String>,
{
    let mut out = String::with_capacity(formula.len() + 8);
    let mut rest = formula;

    while !rest.is_empty() {
        let literal_at = rest.find(|c: char| c == '"' || c == '\'').unwrap_or(rest.len());
        let (code, tail) = rest.split_at(literal_at);
        rewrite_code(code, &mut rewrite, &mut out);

        let literal_len = quoted_len(tail);
        out.push_str(&tail[..literal_len]);
        rest = &tail[literal_len..];
    }

    out
}

/// Byte length of the quoted run at the start of `s`, both quotes included;
/// a doubled quote character is an escaped quote
fn quoted_len(s: &str) -> usize {
    let bytes = s.as_bytes();
    let Some(&quote) = bytes.first() else {
        return 0;
    };
    let mut i = 1;
    while i < bytes.len() {
        if bytes[i] == quote {
            if bytes.get(i + 1) == Some(&quote) {
                i += 2;
                continue;
            }
            return i + 1;
        }
        i += 1;
    }
    bytes.len()
}

fn rewrite_code<F>(code: &str, rewrite: &mut F, out: &mut String)
where
    F: FnMut(CellAddress, Option<CellAddress>) -> Option<String>,
{
    let re = regex!(r"\$?[A-Za-z]{1,3}\$?[0-9]+(?::\$?[A-Za-z]{1,3}\$?[0-9]+)?");

    let mut last = 0;
    for m in re.find_iter(code) {
        out.push_str(&code[last..m.start()]);
        last = m.end();

        let before = code[..m.start()].chars().next_back();
        let after = code[m.end()..].chars().next();
        let standalone = !before.is_some_and(|c| c.is_alphanumeric() || "_.!$".contains(c))
            && !after.is_some_and(|c| c.is_alphanumeric() || "_.!($".contains(c));

        let replaced = if standalone {
            parse_reference(m.as_str()).and_then(|(start, end)| rewrite(start, end))
        } else {
            None
        };
        out.push_str(replaced.as_deref().unwrap_or(m.as_str()));
    }
    out.push_str(&code[last..]);
}

fn parse_reference(text: &str) -> Option<(CellAddress, Option<CellAddress>)> {
    match text.split_once(':') {
        Some((a, b)) => Some((CellAddress::parse(a).ok()?, Some(CellAddress::parse(b).ok()?))),
        None => Some((CellAddress::parse(text).ok()?, None)),
    }
}
