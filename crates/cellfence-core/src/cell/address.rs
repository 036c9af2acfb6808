//! A1-style cell addresses

use crate::error::{Error, Result};
use crate::{MAX_COLS, MAX_ROWS};
use std::fmt;
use std::str::FromStr;

/// Longest column name a sheet can have (`XFD`)
const MAX_COLUMN_LETTERS: usize = 3;

/// A cell address (e.g., "A1", "$B$2")
///
/// Rows and columns are 0-based internally and 1-based / lettered in text.
/// The optional `$` markers are kept so that a parsed reference formats back
/// the way it was written; they never change which cell is addressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CellAddress {
    /// Row index (0-based internally, 1-based in display)
    pub row: u32,
    /// Column index (0-based, A=0, B=1, ..., XFD=16383)
    pub col: u16,
    /// Whether the row reference is absolute ($)
    pub row_absolute: bool,
    /// Whether the column reference is absolute ($)
    pub col_absolute: bool,
}

impl CellAddress {
    /// Create a new cell address with relative references
    pub fn new(row: u32, col: u16) -> Self {
        Self {
            row,
            col,
            row_absolute: false,
            col_absolute: false,
        }
    }

    /// Create a new cell address with specified absolute/relative flags
    pub fn with_absolute(row: u32, col: u16, row_absolute: bool, col_absolute: bool) -> Self {
        Self {
            row,
            col,
            row_absolute,
            col_absolute,
        }
    }

    /// Parse a cell address from A1-style notation
    ///
    /// Column letters are case-insensitive and the row number must be at least 1.
    ///
    /// # Examples
    /// ```
    /// use cellfence_core::CellAddress;
    ///
    /// let addr = CellAddress::parse("b2").unwrap();
    /// assert_eq!((addr.row, addr.col), (1, 1));
    ///
    /// let addr = CellAddress::parse("$C$10").unwrap();
    /// assert_eq!((addr.row, addr.col), (9, 2));
    /// assert!(addr.row_absolute && addr.col_absolute);
    ///
    /// assert!(CellAddress::parse("A0").is_err());
    /// ```
    pub fn parse(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.is_empty() {
            return Err(Error::InvalidAddress("empty address".into()));
        }

        let split = s
            .char_indices()
            .skip_while(|(_, c)| *c == '$' || c.is_ascii_alphabetic())
            .map(|(i, _)| i)
            .next()
            .unwrap_or(s.len());
        // A `$` directly before the digits belongs to the row part.
        let split = if s[..split].ends_with('$') && split > 1 {
            split - 1
        } else {
            split
        };

        let (col_part, row_part) = s.split_at(split);
        if col_part.is_empty() {
            return Err(Error::InvalidAddress(format!("no column letters in '{}'", s)));
        }
        if row_part.is_empty() {
            return Err(Error::InvalidAddress(format!("no row number in '{}'", s)));
        }

        let (col, col_absolute) = parse_column_part(col_part)?;
        let (row, row_absolute) = parse_row_part(row_part)?;

        Ok(Self {
            row,
            col,
            row_absolute,
            col_absolute,
        })
    }

    /// Convert column index to letters (0 = A, 25 = Z, 26 = AA, etc.)
    pub fn column_to_letters(col: u16) -> String {
        let mut result = Vec::with_capacity(MAX_COLUMN_LETTERS);
        let mut n = col as u32 + 1;

        while n > 0 {
            n -= 1;
            result.push((n % 26) as u8 + b'A');
            n /= 26;
        }

        result.iter().rev().map(|&b| b as char).collect()
    }

    /// Convert column letters to index (A = 0, Z = 25, AA = 26, etc.)
    pub fn letters_to_column(letters: &str) -> Result<u16> {
        if letters.is_empty() {
            return Err(Error::InvalidAddress("empty column letters".into()));
        }
        if letters.len() > MAX_COLUMN_LETTERS {
            return Err(Error::InvalidAddress(format!(
                "column '{}' is beyond the last column XFD",
                letters
            )));
        }

        let mut col: u32 = 0;
        for c in letters.chars() {
            if !c.is_ascii_alphabetic() {
                return Err(Error::InvalidAddress(format!(
                    "invalid column letter '{}'",
                    c
                )));
            }
            col = col * 26 + (c.to_ascii_uppercase() as u32 - 'A' as u32 + 1);
        }

        let col = col - 1;
        if col >= MAX_COLS as u32 {
            return Err(Error::ColumnOutOfBounds(col, MAX_COLS as u32 - 1));
        }

        Ok(col as u16)
    }

    /// Format as A1-style string
    pub fn to_a1_string(&self) -> String {
        let mut result = String::with_capacity(10);

        if self.col_absolute {
            result.push('$');
        }
        result.push_str(&Self::column_to_letters(self.col));

        if self.row_absolute {
            result.push('$');
        }
        result.push_str(&(self.row + 1).to_string());

        result
    }

    /// Same cell, with both `$` markers cleared
    pub fn relative(&self) -> Self {
        Self::new(self.row, self.col)
    }
}

/// Parse the column half of a reference (`A`, `$xfd`), returning the
/// 0-based index and whether it was marked absolute.
pub(crate) fn parse_column_part(s: &str) -> Result<(u16, bool)> {
    let (absolute, letters) = match s.strip_prefix('$') {
        Some(rest) => (true, rest),
        None => (false, s),
    };
    Ok((CellAddress::letters_to_column(letters)?, absolute))
}

/// Parse the row half of a reference (`7`, `$12`), returning the 0-based
/// index and whether it was marked absolute.
pub(crate) fn parse_row_part(s: &str) -> Result<(u32, bool)> {
    let (absolute, digits) = match s.strip_prefix('$') {
        Some(rest) => (true, rest),
        None => (false, s),
    };

    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(Error::InvalidAddress(format!("invalid row number '{}'", s)));
    }

    let row: u32 = digits
        .parse()
        .map_err(|_| Error::InvalidAddress(format!("row number too large in '{}'", s)))?;

    // Rows are 1-based in text, 0-based internally
    if row == 0 {
        return Err(Error::InvalidAddress(format!(
            "row number must be >= 1 in '{}'",
            s
        )));
    }

    let row = row - 1;
    if row >= MAX_ROWS {
        return Err(Error::RowOutOfBounds(row, MAX_ROWS - 1));
    }

    Ok((row, absolute))
}

impl fmt::Display for CellAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_a1_string())
    }
}

impl FromStr for CellAddress {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_to_letters() {
        assert_eq!(CellAddress::column_to_letters(0), "A");
        assert_eq!(CellAddress::column_to_letters(25), "Z");
        assert_eq!(CellAddress::column_to_letters(26), "AA");
        assert_eq!(CellAddress::column_to_letters(701), "ZZ");
        assert_eq!(CellAddress::column_to_letters(702), "AAA");
        assert_eq!(CellAddress::column_to_letters(16383), "XFD");
    }

    #[test]
    fn test_letters_to_column() {
        assert_eq!(CellAddress::letters_to_column("A").unwrap(), 0);
        assert_eq!(CellAddress::letters_to_column("AB").unwrap(), 27);
        assert_eq!(CellAddress::letters_to_column("XFD").unwrap(), 16383);
        assert_eq!(CellAddress::letters_to_column("aa").unwrap(), 26);

        assert!(CellAddress::letters_to_column("XFE").is_err());
        assert!(CellAddress::letters_to_column("AAAAAAAAAA").is_err());
        assert!(CellAddress::letters_to_column("A1").is_err());
    }

    #[test]
    fn test_parse() {
        let addr = CellAddress::parse("A1").unwrap();
        assert_eq!((addr.row, addr.col), (0, 0));
        assert!(!addr.row_absolute && !addr.col_absolute);

        let addr = CellAddress::parse("$A1").unwrap();
        assert!(addr.col_absolute);
        assert!(!addr.row_absolute);

        let addr = CellAddress::parse("A$1").unwrap();
        assert!(!addr.col_absolute);
        assert!(addr.row_absolute);

        let addr = CellAddress::parse(" xfd1048576 ").unwrap();
        assert_eq!((addr.row, addr.col), (1_048_575, 16_383));
    }

    #[test]
    fn test_parse_errors() {
        for bad in ["", "A", "1", "A0", "A-1", "A+1", "A1048577", "XFE1", "A1B", "$$A1", "1A"] {
            assert!(CellAddress::parse(bad).is_err(), "{bad} should not parse");
        }
    }

    #[test]
    fn test_display() {
        assert_eq!(CellAddress::new(0, 0).to_string(), "A1");
        assert_eq!(CellAddress::new(99, 2).to_string(), "C100");
        assert_eq!(CellAddress::with_absolute(0, 0, true, true).to_string(), "$A$1");
        assert_eq!(CellAddress::parse("$b$7").unwrap().relative().to_string(), "B7");
    }
}
