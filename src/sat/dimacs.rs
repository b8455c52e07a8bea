#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! A parser for the DIMACS CNF file format.
//!
//! The format is line based:
//! - Comment lines start with `c`.
//! - The problem line `p cnf <num_variables> <num_clauses>` declares the size of
//!   the instance. It is optional; without it the variable count is the largest
//!   variable used.
//! - Clauses are whitespace separated integer literals terminated by `0`. A clause
//!   may span several lines, and a `0` on its own is the empty clause.
//! - A `%` line ends the data (as in the SATLIB benchmark files).
//!
//! Plain text input (`1 -2 0\n2 3 0`) is the same format without a problem line.

use crate::sat::clause::Clause;
use crate::sat::cnf::Cnf;
use crate::sat::error::ParseError;
use crate::sat::literal::Literal;
use std::io::{self, BufRead};
use std::path::Path;
use tracing::warn;

/// Parsed `p cnf` line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Header {
    num_vars: usize,
    num_clauses: usize,
}

fn parse_header(line_no: usize, line: &str) -> Result<Header, ParseError> {
    let invalid = || ParseError::InvalidHeader {
        line: line_no,
        content: line.to_string(),
    };

    let mut parts = line.split_whitespace();
    if parts.next() != Some("p") || parts.next() != Some("cnf") {
        return Err(invalid());
    }
    let mut number = || -> Result<usize, ParseError> {
        parts
            .next()
            .and_then(|s| s.parse().ok())
            .ok_or_else(invalid)
    };
    let num_vars = number()?;
    let num_clauses = number()?;
    Ok(Header {
        num_vars,
        num_clauses,
    })
}

/// Parses DIMACS formatted data from a `BufRead` source into a [`Cnf`].
///
/// # Errors
///
/// - [`ParseError::Io`] if reading fails.
/// - [`ParseError::InvalidToken`] for a token that is not an `i32` (or is `i32::MIN`).
/// - [`ParseError::InvalidHeader`] for a malformed problem line.
pub fn parse_dimacs<R: BufRead>(reader: R) -> Result<Cnf, ParseError> {
    let mut header: Option<Header> = None;
    let mut clauses: Vec<Clause> = Vec::new();
    let mut current: Vec<Literal> = Vec::new();
    let mut max_var = 0;

    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        let line_no = idx + 1;
        let mut parts = line.split_whitespace().peekable();

        match parts.peek() {
            Some(&"%") => break,
            None | Some(&"c") => {}
            Some(&"p") => header = Some(parse_header(line_no, &line)?),
            Some(token) if token.starts_with('c') => {}
            Some(_) => {
                for token in parts {
                    let value: i32 = token.parse().map_err(|_| ParseError::InvalidToken {
                        line: line_no,
                        token: token.to_string(),
                    })?;
                    if value == 0 {
                        clauses.push(Clause::new(current.drain(..)));
                        continue;
                    }
                    let lit = Literal::try_from(value).map_err(|_| ParseError::InvalidToken {
                        line: line_no,
                        token: token.to_string(),
                    })?;
                    max_var = max_var.max(lit.variable());
                    current.push(lit);
                }
            }
        }
    }

    if !current.is_empty() {
        warn!("last clause is not terminated by 0; accepting it anyway");
        clauses.push(Clause::new(current));
    }

    let num_vars = match header {
        Some(h) => {
            if h.num_clauses != clauses.len() {
                warn!(
                    declared = h.num_clauses,
                    found = clauses.len(),
                    "clause count differs from the problem line"
                );
            }
            if max_var > h.num_vars {
                warn!(
                    declared = h.num_vars,
                    used = max_var,
                    "variables exceed the problem line; widening the universe"
                );
            }
            h.num_vars.max(max_var)
        }
        None => max_var,
    };

    Ok(Cnf::new(num_vars, clauses)?)
}

/// Parses plain text CNF such as `"1 -2 0\n2 3 0"`.
///
/// # Errors
///
/// See [`parse_dimacs`].
pub fn parse_text(input: &str) -> Result<Cnf, ParseError> {
    parse_dimacs(io::Cursor::new(input))
}

/// Parses a DIMACS CNF file specified by its path.
///
/// # Errors
///
/// [`ParseError::Io`] if the file cannot be opened, otherwise see [`parse_dimacs`].
pub fn parse_file<P: AsRef<Path>>(file_path: P) -> Result<Cnf, ParseError> {
    let file = std::fs::File::open(file_path)?;
    parse_dimacs(io::BufReader::new(file))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn lits(clause: &Clause) -> Vec<i32> {
        clause.iter().map(|l| l.to_i32()).collect()
    }

    #[test]
    fn test_parse_simple_dimacs() {
        let dimacs_content = "c This is a comment\n\
                              p cnf 3 2\n\
                              1 -2 0\n\
                              2 3 0\n";
        let cnf = parse_dimacs(Cursor::new(dimacs_content)).unwrap();

        assert_eq!(cnf.num_clauses(), 2, "Should parse 2 clauses");
        assert_eq!(cnf.num_vars(), 3);
        assert_eq!(cnf.width(), 2);
        assert_eq!(lits(&cnf[0]), vec![1, -2]);
        assert_eq!(lits(&cnf[1]), vec![2, 3]);
    }

    #[test]
    fn test_parse_dimacs_with_empty_lines_and_end_marker() {
        let dimacs_content = "p cnf 2 2\n\
                              \n\
                              1 0\n\
                              \n\
                              -2 0\n\
                              %\n\
                              5 6 0\n";
        let cnf = parse_dimacs(Cursor::new(dimacs_content)).unwrap();

        assert_eq!(cnf.num_clauses(), 2);
        assert_eq!(cnf.num_vars(), 2);
        assert_eq!(lits(&cnf[0]), vec![1]);
        assert_eq!(lits(&cnf[1]), vec![-2]);
    }

    #[test]
    fn test_parse_dimacs_clause_spanning_lines() {
        let cnf = parse_text("1 2\n3 0 -1\n-2 0").unwrap();
        assert_eq!(cnf.num_clauses(), 2);
        assert_eq!(lits(&cnf[0]), vec![1, 2, 3]);
        assert_eq!(lits(&cnf[1]), vec![-1, -2]);
    }

    #[test]
    fn test_parse_dimacs_empty_clause() {
        let cnf = parse_dimacs(Cursor::new("p cnf 1 1\n0\n")).unwrap();
        assert_eq!(cnf.num_clauses(), 1);
        assert!(cnf[0].is_empty());
    }

    #[test]
    fn test_parse_dimacs_declared_vars_kept() {
        let cnf = parse_dimacs(Cursor::new("p cnf 5 1\n1 -2 0\n")).unwrap();
        assert_eq!(cnf.num_vars(), 5);
    }

    #[test]
    fn test_parse_dimacs_header_widened_by_used_vars() {
        let cnf = parse_dimacs(Cursor::new("p cnf 1 1\n1 -4 0\n")).unwrap();
        assert_eq!(cnf.num_vars(), 4);
    }

    #[test]
    fn test_parse_dimacs_unterminated_last_clause() {
        let cnf = parse_text("1 2 0\n-1").unwrap();
        assert_eq!(cnf.num_clauses(), 2);
        assert_eq!(lits(&cnf[1]), vec![-1]);
    }

    #[test]
    fn test_parse_dimacs_malformed_literal() {
        let err = parse_text("1 abc 0\n").unwrap_err();
        assert!(matches!(
            err,
            ParseError::InvalidToken { line: 1, ref token } if token == "abc"
        ));
    }

    #[test]
    fn test_parse_dimacs_malformed_header() {
        let err = parse_text("c ok\np cnf x 2\n").unwrap_err();
        assert!(matches!(err, ParseError::InvalidHeader { line: 2, .. }));
    }

    #[test]
    fn test_parse_dimacs_no_clauses() {
        let cnf = parse_dimacs(Cursor::new("p cnf 0 0\n")).unwrap();
        assert!(cnf.is_empty());
        assert_eq!(cnf.num_vars(), 0);
    }

    #[test]
    fn test_parse_file_missing() {
        let err = parse_file("/definitely/not/here.cnf").unwrap_err();
        assert!(matches!(err, ParseError::Io(_)));
    }

    #[test]
    fn test_display_round_trips_through_parser() {
        let cnf = parse_text("1 -2 0\n2 3 0\n").unwrap();
        assert_eq!(parse_text(&cnf.to_string()).unwrap(), cnf);
    }
}
