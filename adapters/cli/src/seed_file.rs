//! Tab-separated seed file reader.
//!
//! Each non-blank line holds `x<TAB>y<TAB>grains`, with `x` and `y` signed
//! 16-bit integers and `grains` an unsigned 64-bit integer. Fields after the
//! third are ignored.

use std::{
    fmt,
    fs::File,
    io::{self, Read},
    num::ParseIntError,
    path::{Path, PathBuf},
    str::FromStr,
};

use sandpile_core::{CellCoord, CellSeed};
use thiserror::Error;

const FIELD_DELIMITER: char = '\t';

/// Column of a seed line.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum SeedField {
    X,
    Y,
    Grains,
}

impl fmt::Display for SeedField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::X => write!(f, "x"),
            Self::Y => write!(f, "y"),
            Self::Grains => write!(f, "grains"),
        }
    }
}

/// Errors that can occur while loading a seed file.
#[derive(Debug, Error)]
pub(crate) enum SeedFileError {
    /// The file could not be opened.
    #[error("could not open seed file {}", .path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    /// The file was opened but could not be read as UTF-8 text.
    #[error("could not read seed file {}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    /// A line ended before all three fields were present.
    #[error("line {line}: missing {field} field")]
    MissingField { line: usize, field: SeedField },
    /// A field did not hold a number in the expected range.
    #[error("line {line}: invalid {field} value `{value}`")]
    InvalidNumber {
        line: usize,
        field: SeedField,
        value: String,
        #[source]
        source: ParseIntError,
    },
}

/// Reads every seed listed in the file at `path`.
pub(crate) fn read_seed_file(path: &Path) -> Result<Vec<CellSeed>, SeedFileError> {
    let mut file = File::open(path).map_err(|source| SeedFileError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    let mut contents = String::new();
    let _ = file
        .read_to_string(&mut contents)
        .map_err(|source| SeedFileError::Read {
            path: path.to_path_buf(),
            source,
        })?;
    parse_seeds(&contents)
}

/// Parses seed lines in order; duplicates are kept so later lines win when applied.
pub(crate) fn parse_seeds(contents: &str) -> Result<Vec<CellSeed>, SeedFileError> {
    let mut seeds = Vec::new();
    for (index, line) in contents.lines().enumerate() {
        if let Some(seed) = parse_line(index + 1, line)? {
            seeds.push(seed);
        }
    }
    Ok(seeds)
}

fn parse_line(line: usize, text: &str) -> Result<Option<CellSeed>, SeedFileError> {
    if text.trim().is_empty() {
        return Ok(None);
    }

    let mut fields = text.split(FIELD_DELIMITER);
    let x: i16 = parse_field(line, SeedField::X, fields.next())?;
    let y: i16 = parse_field(line, SeedField::Y, fields.next())?;
    let grains: u64 = parse_field(line, SeedField::Grains, fields.next())?;

    Ok(Some(CellSeed::new(
        CellCoord::new(i64::from(x), i64::from(y)),
        grains,
    )))
}

fn parse_field<T>(line: usize, field: SeedField, value: Option<&str>) -> Result<T, SeedFileError>
where
    T: FromStr<Err = ParseIntError>,
{
    let value = value
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .ok_or(SeedFileError::MissingField { line, field })?;
    value
        .parse()
        .map_err(|source| SeedFileError::InvalidNumber {
            line,
            field,
            value: value.to_owned(),
            source,
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seed(x: i64, y: i64, grains: u64) -> CellSeed {
        CellSeed::new(CellCoord::new(x, y), grains)
    }

    #[test]
    fn parses_tab_separated_lines() {
        let seeds = parse_seeds("0\t0\t4\n-3\t12\t18446744073709551615\n").expect("valid");
        assert_eq!(seeds, vec![seed(0, 0, 4), seed(-3, 12, u64::MAX)]);
    }

    #[test]
    fn tolerates_blank_lines_and_carriage_returns() {
        let seeds = parse_seeds("1\t2\t3\r\n\n  \n4\t5\t6").expect("valid");
        assert_eq!(seeds, vec![seed(1, 2, 3), seed(4, 5, 6)]);
    }

    #[test]
    fn ignores_extra_fields() {
        let seeds = parse_seeds("1\t2\t3\tcomment").expect("valid");
        assert_eq!(seeds, vec![seed(1, 2, 3)]);
    }

    #[test]
    fn keeps_duplicates_in_order() {
        let seeds = parse_seeds("0\t0\t9\n0\t0\t1\n").expect("valid");
        assert_eq!(seeds, vec![seed(0, 0, 9), seed(0, 0, 1)]);
    }

    #[test]
    fn reports_missing_field_with_line_number() {
        let error = parse_seeds("0\t0\t1\n5\t6\n").unwrap_err();
        assert!(matches!(
            error,
            SeedFileError::MissingField {
                line: 2,
                field: SeedField::Grains
            }
        ));
        assert_eq!(error.to_string(), "line 2: missing grains field");
    }

    #[test]
    fn reports_malformed_numbers() {
        let error = parse_seeds("x\t0\t1").unwrap_err();
        assert!(matches!(
            error,
            SeedFileError::InvalidNumber {
                line: 1,
                field: SeedField::X,
                ..
            }
        ));

        let error = parse_seeds("0\t0\t-4").unwrap_err();
        assert_eq!(error.to_string(), "line 1: invalid grains value `-4`");
    }

    #[test]
    fn rejects_coordinates_outside_sixteen_bits() {
        let error = parse_seeds("40000\t0\t1").unwrap_err();
        assert!(matches!(
            error,
            SeedFileError::InvalidNumber {
                field: SeedField::X,
                ..
            }
        ));
    }

    #[test]
    fn missing_file_reports_open_error() {
        let error = read_seed_file(Path::new("definitely/not/here.tsv")).unwrap_err();
        assert!(matches!(error, SeedFileError::Open { .. }));
    }
}
