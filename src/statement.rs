//! Statement recognition shared by every pass.
//!
//! A statement starts on a line matching one of the openers below and ends on
//! the first line satisfying its [`Terminator`]. Openers are tried in a fixed
//! priority: table, index, enum type.
//!
//! ```sql
//! CREATE TABLE "User" (            -- Table, ends at ");"
//! CREATE UNIQUE INDEX "User_email_key" ON "User"("email");   -- UniqueIndex, ends at ";"
//! CREATE TYPE "Role" AS ENUM ('USER', 'ADMIN');              -- Enum, ends at ");"
//! ```

use std::fmt;

use nom::{
    branch::alt,
    bytes::complete::{tag_no_case, take_while1},
    character::complete::{char, multispace1},
    combinator::{not, opt, recognize},
    sequence::{delimited, pair, terminated, tuple},
    IResult,
};
use serde::Serialize;

/// Token whose presence on the line before a statement means it is guarded.
pub const OPEN_MARKER: &str = "DO $$";
/// First line of a guard block.
pub const OPEN_LINE: &str = "DO $$ BEGIN";
/// Last line of a guard block.
pub const CLOSE_LINE: &str = "END $$;";

/// Statement kinds recognized by the scanner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StatementKind {
    Table,
    Index,
    UniqueIndex,
    Enum,
}

impl StatementKind {
    pub const ALL: [StatementKind; 4] = [
        StatementKind::Table,
        StatementKind::Index,
        StatementKind::UniqueIndex,
        StatementKind::Enum,
    ];

    pub fn terminator(self) -> Terminator {
        match self {
            StatementKind::Table | StatementKind::Enum => Terminator::CloseParen,
            StatementKind::Index | StatementKind::UniqueIndex => Terminator::Semicolon,
        }
    }
}

impl fmt::Display for StatementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatementKind::Table => write!(f, "table"),
            StatementKind::Index => write!(f, "index"),
            StatementKind::UniqueIndex => write!(f, "unique index"),
            StatementKind::Enum => write!(f, "enum type"),
        }
    }
}

/// How the last line of a statement is recognized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Terminator {
    /// A line ending in `);`
    CloseParen,
    /// A line ending in `;`
    Semicolon,
}

impl Terminator {
    pub fn matches(self, line: &str) -> bool {
        let line = line.trim_end();
        match self {
            Terminator::CloseParen => line.ends_with(");"),
            Terminator::Semicolon => line.ends_with(';'),
        }
    }
}

/// A recognized statement opener.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Opener {
    pub kind: StatementKind,
    /// Object name with quotes stripped (`public.User`).
    pub name: String,
}

impl Opener {
    fn new(kind: StatementKind, name: &str) -> Self {
        Self {
            kind,
            name: name.replace('"', ""),
        }
    }
}

/// Parse a `"quoted"` identifier, returning the content.
fn quoted_identifier(input: &str) -> IResult<&str, &str> {
    delimited(char('"'), take_while1(|c: char| c != '"'), char('"'))(input)
}

/// Parse `"name"` or `"schema"."name"`.
fn qualified_name(input: &str) -> IResult<&str, &str> {
    recognize(pair(
        quoted_identifier,
        opt(pair(char('.'), quoted_identifier)),
    ))(input)
}

fn bare_identifier(input: &str) -> IResult<&str, &str> {
    take_while1(|c: char| c.is_alphanumeric() || c == '_' || c == '.')(input)
}

fn if_not_exists(input: &str) -> IResult<&str, &str> {
    recognize(tuple((
        tag_no_case("IF"),
        multispace1,
        tag_no_case("NOT"),
        multispace1,
        tag_no_case("EXISTS"),
    )))(input)
}

fn concurrently(input: &str) -> IResult<&str, &str> {
    recognize(pair(tag_no_case("CONCURRENTLY"), multispace1))(input)
}

/// `CREATE TABLE "<name>"`
fn create_table(input: &str) -> IResult<&str, Opener> {
    let (input, _) = tuple((
        tag_no_case("CREATE"),
        multispace1,
        tag_no_case("TABLE"),
        multispace1,
    ))(input)?;
    let (input, name) = qualified_name(input)?;
    Ok((input, Opener::new(StatementKind::Table, name)))
}

/// `CREATE [UNIQUE] INDEX <name>`
fn create_index(input: &str) -> IResult<&str, Opener> {
    let (input, _) = pair(tag_no_case("CREATE"), multispace1)(input)?;
    let (input, unique) = opt(terminated(tag_no_case("UNIQUE"), multispace1))(input)?;
    let (input, _) = pair(tag_no_case("INDEX"), multispace1)(input)?;
    // IF NOT EXISTS is already idempotent; CONCURRENTLY cannot run inside DO.
    let (input, _) = not(alt((if_not_exists, concurrently)))(input)?;
    let (input, name) = alt((qualified_name, bare_identifier))(input)?;

    let kind = if unique.is_some() {
        StatementKind::UniqueIndex
    } else {
        StatementKind::Index
    };
    Ok((input, Opener::new(kind, name)))
}

/// `CREATE TYPE "<name>" AS ENUM`
fn create_enum(input: &str) -> IResult<&str, Opener> {
    let (input, _) = tuple((
        tag_no_case("CREATE"),
        multispace1,
        tag_no_case("TYPE"),
        multispace1,
    ))(input)?;
    let (input, name) = qualified_name(input)?;
    let (input, _) = tuple((
        multispace1,
        tag_no_case("AS"),
        multispace1,
        tag_no_case("ENUM"),
    ))(input)?;
    Ok((input, Opener::new(StatementKind::Enum, name)))
}

/// Recognize a statement opener, ignoring leading indentation.
pub fn parse_opener(line: &str) -> Option<Opener> {
    alt((create_table, create_index, create_enum))(line.trim_start())
        .ok()
        .map(|(_, opener)| opener)
}

/// Index of the terminator line for a statement opened at `start`.
///
/// Returns `None` when input ends, or another statement opens, before the
/// terminator is seen.
pub fn statement_end<S: AsRef<str>>(
    source: &[S],
    start: usize,
    kind: StatementKind,
) -> Option<usize> {
    let terminator = kind.terminator();
    for (idx, line) in source.iter().enumerate().skip(start) {
        let line = line.as_ref();
        if idx > start && parse_opener(line).is_some() {
            return None;
        }
        if terminator.matches(line) {
            return Some(idx);
        }
    }
    None
}

/// Whether the nearest non-blank line above `idx` opens a guard block.
pub fn is_guarded<S: AsRef<str>>(source: &[S], idx: usize) -> bool {
    source[..idx]
        .iter()
        .rev()
        .map(|line| line.as_ref())
        .find(|line| !line.trim().is_empty())
        .is_some_and(opens_block)
}

/// Whether `line` opens a guard block that continues on later lines.
///
/// `DO $$ BEGIN ... END $$;` written on one line is closed already.
pub fn opens_block(line: &str) -> bool {
    line.find(OPEN_MARKER)
        .is_some_and(|pos| !line[pos + OPEN_MARKER.len()..].contains("END $$"))
}

pub fn is_close_marker(line: &str) -> bool {
    line.trim_start().starts_with("END $$")
}
