// src/data_types.rs
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One row exactly as the provider returned it, position = column index.
pub type RawRow = Vec<String>;

/// Identifies one table (sheet) inside a spreadsheet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TableSelector {
    ByName(String),
    ById(i32),
}

impl TableSelector {
    pub fn by_name(name: impl Into<String>) -> Self {
        TableSelector::ByName(name.into())
    }

    pub fn matches(&self, table: &TableInfo) -> bool {
        match self {
            TableSelector::ByName(name) => table.title == *name,
            TableSelector::ById(id) => table.sheet_id == *id,
        }
    }
}

impl fmt::Display for TableSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TableSelector::ByName(name) => write!(f, "named '{}'", name),
            TableSelector::ById(id) => write!(f, "with id {}", id),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableInfo {
    pub sheet_id: i32,
    pub title: String,
    pub row_count: Option<i32>,
    pub column_count: Option<i32>,
}

impl TableInfo {
    pub fn new(sheet_id: i32, title: impl Into<String>) -> Self {
        TableInfo {
            sheet_id,
            title: title.into(),
            row_count: None,
            column_count: None,
        }
    }

    /// The sheet title as an A1 range prefix, quoted so any title is accepted.
    pub fn a1_prefix(&self) -> String {
        format!("'{}'", self.title.replace('\'', "''"))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SpreadsheetInfo {
    pub title: String,
    pub tables: Vec<TableInfo>,
}

impl SpreadsheetInfo {
    pub fn find(&self, selector: &TableSelector) -> Option<&TableInfo> {
        self.tables.iter().find(|table| selector.matches(table))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid A1 address {0:?}")]
pub struct CellAddressError(pub String);

/// A single cell in A1 notation. `column` is zero-based, `row` is one-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CellAddress {
    pub column: u32,
    pub row: u32,
}

impl CellAddress {
    pub fn new(column: u32, row: u32) -> Self {
        CellAddress { column, row }
    }

    pub fn column_letters(&self) -> String {
        let mut letters = Vec::new();
        let mut n = self.column + 1;
        while n > 0 {
            n -= 1;
            letters.push(char::from(b'A' + (n % 26) as u8));
            n /= 26;
        }
        letters.iter().rev().collect()
    }
}

impl fmt::Display for CellAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.column_letters(), self.row)
    }
}

impl FromStr for CellAddress {
    type Err = CellAddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || CellAddressError(s.to_string());
        let split = s
            .find(|c: char| c.is_ascii_digit())
            .ok_or_else(invalid)?;
        let (letters, digits) = s.split_at(split);
        if letters.is_empty() || !letters.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(invalid());
        }

        let mut column: u32 = 0;
        for c in letters.chars() {
            let value = c.to_ascii_uppercase() as u32 - 'A' as u32 + 1;
            column = column
                .checked_mul(26)
                .and_then(|acc| acc.checked_add(value))
                .ok_or_else(invalid)?;
        }

        let row: u32 = digits.parse().map_err(|_| invalid())?;
        if row == 0 {
            return Err(invalid());
        }

        Ok(CellAddress::new(column - 1, row))
    }
}

/// Rectangular block of cells between two corners, inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellRange {
    pub start: CellAddress,
    pub end: CellAddress,
}

impl CellRange {
    pub fn new(a: CellAddress, b: CellAddress) -> Self {
        CellRange {
            start: CellAddress::new(a.column.min(b.column), a.row.min(b.row)),
            end: CellAddress::new(a.column.max(b.column), a.row.max(b.row)),
        }
    }

    pub fn contains(&self, address: &CellAddress) -> bool {
        (self.start.column..=self.end.column).contains(&address.column)
            && (self.start.row..=self.end.row).contains(&address.row)
    }
}

impl fmt::Display for CellRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.start, self.end)
    }
}

impl FromStr for CellRange {
    type Err = CellAddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (a, b) = s
            .split_once(':')
            .ok_or_else(|| CellAddressError(s.to_string()))?;
        Ok(CellRange::new(a.parse()?, b.parse()?))
    }
}

/// Snapshot of the working fund as shown on the accounts sheet.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct WorkingFund {
    pub name: String,
    pub amount: String,
    pub goal: String,
}
