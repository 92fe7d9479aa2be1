//! Activity file reader.
//!
//! One compound per line, tab separated: `id<TAB>name<TAB>value`. The
//! name column may be omitted. Blank lines and lines starting with `#`
//! are skipped.

use std::io::BufRead;

use super::FormatError;
use crate::types::CompoundId;

/// Read `(id, activity)` pairs.
pub fn read_activities<R: BufRead>(reader: R) -> Result<Vec<(CompoundId, f64)>, FormatError> {
    let mut activities = Vec::new();
    for (i, line) in reader.lines().enumerate() {
        let line_no = i + 1;
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let columns: Vec<&str> = trimmed.split('\t').map(str::trim).collect();
        let (id, value) = match columns.as_slice() {
            [id, _name, value] => (*id, *value),
            [id, value] => (*id, *value),
            _ => {
                return Err(FormatError::parse(
                    line_no,
                    format!("expected 2 or 3 tab separated columns, got {}", columns.len()),
                ))
            }
        };
        let id: u32 = id
            .parse()
            .map_err(|_| FormatError::parse(line_no, format!("invalid compound id '{}'", id)))?;
        let value: f64 = value
            .parse()
            .map_err(|_| FormatError::parse(line_no, format!("invalid activity '{}'", value)))?;
        activities.push((CompoundId(id), value));
    }
    Ok(activities)
}
