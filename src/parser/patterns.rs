//! Line pattern table for generated weight files.
//!
//! Each line of a weight function is matched against a fixed, ordered table
//! of patterns. The first match wins and yields a tagged [`Term`]. Lines that
//! carry a weight marker but match nothing are reported as malformed.

use super::schema::ComponentRange;
use crate::utils::config::WEIGHT_LINE_MARKERS;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};

/// A recognised piece of a weight formula
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Term {
    /// `fn <name>(` - start of an operation
    Operation(String),
    /// `Minimum execution time: <v> picoseconds`
    MinExecutionTime(u64),
    /// `Weight::from_parts(<ref_time>, <proof_size>)`
    Base { ref_time: u64, proof_size: u64 },
    /// `.saturating_add(Weight::from_parts(<r>, <p>).saturating_mul(<var>.into()))`
    Coefficient {
        var: String,
        ref_time: u64,
        proof_size: u64,
    },
    /// `.reads((<n>_u64).saturating_mul(<var>.into()))`
    ReadsPerVar { var: String, count: u64 },
    /// `.writes((<n>_u64).saturating_mul(<var>.into()))`
    WritesPerVar { var: String, count: u64 },
    /// `.reads(<n>_u64)`
    Reads(u64),
    /// `.writes(<n>_u64)`
    Writes(u64),
    /// ``The range of component `<var>` is `[<low>, <high>]` ``
    ComponentRange { var: String, range: ComponentRange },
}

/// A weight-marked line that no pattern accepts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MalformedLine(pub String);

type TermBuilder = fn(&Captures) -> Option<Term>;

const NUM: &str = r"(\d[\d_]*)";

static PATTERN_TABLE: Lazy<Vec<(Regex, TermBuilder)>> = Lazy::new(|| {
    let table: [(String, TermBuilder); 9] = [
        (r"^\s*(?:pub\s+)?fn\s+(\w+)\s*\(".to_string(), operation),
        (
            format!(r"Minimum execution time:\s*{NUM}\s*picoseconds"),
            min_execution_time,
        ),
        (
            format!(
                r"\.saturating_add\(Weight::from_parts\(\s*{NUM}\s*,\s*{NUM}\s*\)\.saturating_mul\((\w+)\.into\(\)\)\)"
            ),
            coefficient,
        ),
        (
            format!(r"\.reads\(\({NUM}_u64\)\.saturating_mul\((\w+)\.into\(\)\)\)"),
            reads_per_var,
        ),
        (
            format!(r"\.writes\(\({NUM}_u64\)\.saturating_mul\((\w+)\.into\(\)\)\)"),
            writes_per_var,
        ),
        (format!(r"\.reads\({NUM}_u64\)"), reads),
        (format!(r"\.writes\({NUM}_u64\)"), writes),
        (
            format!(r"^\s*Weight::from_parts\(\s*{NUM}\s*,\s*{NUM}\s*\)"),
            base,
        ),
        (
            format!(r"The range of component `(\w+)` is `\[{NUM},\s*{NUM}\]`"),
            component_range,
        ),
    ];

    table
        .into_iter()
        .map(|(pattern, build)| (Regex::new(&pattern).expect("weight line pattern"), build))
        .collect()
});

fn operation(caps: &Captures) -> Option<Term> {
    Some(Term::Operation(caps[1].to_string()))
}

fn min_execution_time(caps: &Captures) -> Option<Term> {
    Some(Term::MinExecutionTime(parse_number(&caps[1])?))
}

fn coefficient(caps: &Captures) -> Option<Term> {
    Some(Term::Coefficient {
        ref_time: parse_number(&caps[1])?,
        proof_size: parse_number(&caps[2])?,
        var: caps[3].to_string(),
    })
}

fn reads_per_var(caps: &Captures) -> Option<Term> {
    Some(Term::ReadsPerVar {
        count: parse_number(&caps[1])?,
        var: caps[2].to_string(),
    })
}

fn writes_per_var(caps: &Captures) -> Option<Term> {
    Some(Term::WritesPerVar {
        count: parse_number(&caps[1])?,
        var: caps[2].to_string(),
    })
}

fn reads(caps: &Captures) -> Option<Term> {
    Some(Term::Reads(parse_number(&caps[1])?))
}

fn writes(caps: &Captures) -> Option<Term> {
    Some(Term::Writes(parse_number(&caps[1])?))
}

fn base(caps: &Captures) -> Option<Term> {
    Some(Term::Base {
        ref_time: parse_number(&caps[1])?,
        proof_size: parse_number(&caps[2])?,
    })
}

fn component_range(caps: &Captures) -> Option<Term> {
    Some(Term::ComponentRange {
        var: caps[1].to_string(),
        range: ComponentRange {
            low: parse_number(&caps[2])?,
            high: parse_number(&caps[3])?,
        },
    })
}

/// Parse a decimal literal that may contain `_` separators
pub fn parse_number(literal: &str) -> Option<u64> {
    literal.replace('_', "").parse().ok()
}

/// Whether a line carries weight data at all
pub fn has_weight_marker(line: &str) -> bool {
    WEIGHT_LINE_MARKERS.iter().any(|marker| line.contains(marker))
}

/// Match one source line against the pattern table
///
/// # Returns
/// * `Ok(Some(term))` - the first matching pattern
/// * `Ok(None)` - the line carries no weight data (comments, braces, ...)
/// * `Err(MalformedLine)` - the line looks like weight data but matches nothing
pub fn classify_line(line: &str) -> Result<Option<Term>, MalformedLine> {
    for (regex, build) in PATTERN_TABLE.iter() {
        if let Some(caps) = regex.captures(line) {
            return build(&caps)
                .map(Some)
                .ok_or_else(|| MalformedLine(line.trim().to_string()));
        }
    }

    if has_weight_marker(line) {
        Err(MalformedLine(line.trim().to_string()))
    } else {
        Ok(None)
    }
}
