//! Typed view over raw rows.
//!
//! A [`RowShape`] validates one trimmed row column by column; [`decode`]
//! splits a batch of rows into decoded values and per-row failures.

use serde::Serialize;
use std::fmt;
use std::str::FromStr;

use crate::data_types::RawRow;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ColumnError {
    #[error("column {column} is missing")]
    Missing { column: usize },

    #[error("column {column}: {value:?} is not {expected}")]
    Invalid {
        column: usize,
        value: String,
        expected: &'static str,
    },
}

/// A row that did not match the shape.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("row {row}: {source}")]
pub struct DecodeError {
    /// Position of the row in the decoded batch.
    pub row: usize,
    pub cells: RawRow,
    #[source]
    pub source: ColumnError,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodeResult<T> {
    pub decoded: Vec<T>,
    pub failures: Vec<DecodeError>,
}

impl<T> DecodeResult<T> {
    pub fn len(&self) -> usize {
        self.decoded.len() + self.failures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

pub trait RowShape: Sized {
    /// Decodes already-trimmed cells. Columns past the shape's width are ignored.
    fn decode_row(cells: &[String]) -> Result<Self, ColumnError>;
}

/// Trims each cell, then decodes every row independently.
pub fn decode<T: RowShape>(rows: &[RawRow]) -> DecodeResult<T> {
    let mut result = DecodeResult {
        decoded: Vec::with_capacity(rows.len()),
        failures: Vec::new(),
    };

    for (row, raw) in rows.iter().enumerate() {
        let cells: RawRow = raw.iter().map(|cell| cell.trim().to_string()).collect();
        match T::decode_row(&cells) {
            Ok(value) => result.decoded.push(value),
            Err(source) => result.failures.push(DecodeError { row, cells, source }),
        }
    }

    result
}

fn column(cells: &[String], column: usize) -> Result<&str, ColumnError> {
    cells
        .get(column)
        .map(String::as_str)
        .ok_or(ColumnError::Missing { column })
}

fn parse_column<T: FromStr>(
    cells: &[String],
    index: usize,
    expected: &'static str,
) -> Result<T, ColumnError> {
    let value = column(cells, index)?;
    value.parse().map_err(|_| ColumnError::Invalid {
        column: index,
        value: value.to_string(),
        expected,
    })
}

macro_rules! account_names {
    ($($variant:ident => $label:literal),+ $(,)?) => {
        /// The accounts tracked on the plan sheet.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum AccountName {
            $($variant),+
        }

        impl AccountName {
            pub const ALL: &'static [AccountName] = &[$(AccountName::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $(AccountName::$variant => $label),+
                }
            }
        }

        impl FromStr for AccountName {
            type Err = ();

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($label => Ok(AccountName::$variant),)+
                    _ => Err(()),
                }
            }
        }
    };
}

account_names! {
    WorkingCapital => "Working Capital",
    CcPayoffLoan => "CC Payoff Loan",
    HomeImprovements => "Home Improvements",
    Travel => "Travel",
    EmergencyFund => "Emergency Fund",
    RentalProperty => "Rental Property",
    ForeverHome => "Forever Home",
    PetersCollege => "Peter's College",
    GeneralInvesting => "General Investing",
    RothIra => "Roth IRA",
}

impl fmt::Display for AccountName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for AccountName {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// One row of the plan overview. Only the account name is validated; the
/// amounts and the date are kept as the sheet formats them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccountRow {
    pub name: AccountName,
    pub goal_amount: String,
    pub completion_amount: String,
    pub completion_date: String,
}

impl RowShape for AccountRow {
    fn decode_row(cells: &[String]) -> Result<Self, ColumnError> {
        Ok(AccountRow {
            name: parse_column(cells, 0, "a known account name")?,
            goal_amount: column(cells, 1)?.to_string(),
            completion_amount: column(cells, 2)?.to_string(),
            completion_date: column(cells, 3)?.to_string(),
        })
    }
}
