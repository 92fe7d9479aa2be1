//! gSpan graph file reader.
//!
//! ```text
//! t # <id>
//! v <index> <label>
//! e <a> <b> <label>
//! ```
//!
//! Vertex indices must be consecutive from 0 within each graph. A
//! `t # -1` line ends the input.

use std::io::BufRead;

use super::FormatError;
use crate::types::{CompoundId, EdgeLabel, MolGraph, VertexLabel};

fn field<T: std::str::FromStr>(token: Option<&str>, line: usize, what: &str) -> Result<T, FormatError> {
    let token = token.ok_or_else(|| FormatError::parse(line, format!("missing {}", what)))?;
    token
        .parse()
        .map_err(|_| FormatError::parse(line, format!("invalid {} '{}'", what, token)))
}

/// Read all graphs from a gSpan stream.
///
/// Graphs are returned as read; validation happens when they are added to
/// a store.
pub fn read_gsp<R: BufRead>(reader: R) -> Result<Vec<(CompoundId, MolGraph)>, FormatError> {
    let mut graphs = Vec::new();
    let mut current: Option<(CompoundId, MolGraph)> = None;

    for (i, line) in reader.lines().enumerate() {
        let line_no = i + 1;
        let line = line?;
        let mut tokens = line.split_whitespace();
        let Some(kind) = tokens.next() else {
            continue;
        };
        match kind {
            "t" => {
                if tokens.next() != Some("#") {
                    return Err(FormatError::parse(line_no, "expected 't # <id>'"));
                }
                let id: i64 = field(tokens.next(), line_no, "graph id")?;
                if let Some(done) = current.take() {
                    graphs.push(done);
                }
                if id == -1 {
                    break;
                }
                let id = u32::try_from(id)
                    .map_err(|_| FormatError::parse(line_no, format!("graph id {} out of range", id)))?;
                current = Some((CompoundId(id), MolGraph::new()));
            }
            "v" => {
                let (_, graph) = current
                    .as_mut()
                    .ok_or_else(|| FormatError::parse(line_no, "vertex before any graph"))?;
                let index: usize = field(tokens.next(), line_no, "vertex index")?;
                let label: u16 = field(tokens.next(), line_no, "vertex label")?;
                if index != graph.vertex_count() {
                    return Err(FormatError::parse(
                        line_no,
                        format!("vertex {} out of sequence, expected {}", index, graph.vertex_count()),
                    ));
                }
                graph.add_vertex(VertexLabel(label));
            }
            "e" => {
                let (_, graph) = current
                    .as_mut()
                    .ok_or_else(|| FormatError::parse(line_no, "edge before any graph"))?;
                let a: usize = field(tokens.next(), line_no, "edge source")?;
                let b: usize = field(tokens.next(), line_no, "edge target")?;
                let label: u16 = field(tokens.next(), line_no, "edge label")?;
                graph.add_edge(a, b, EdgeLabel(label));
            }
            other => {
                return Err(FormatError::parse(line_no, format!("unknown record '{}'", other)));
            }
        }
    }
    if let Some(done) = current.take() {
        graphs.push(done);
    }
    Ok(graphs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_two_graphs() {
        let text = "t # 1\nv 0 6\nv 1 8\ne 0 1 2\n\nt # 2\nv 0 7\nt # -1\nt # 3\n";
        let graphs = read_gsp(text.as_bytes()).unwrap();
        assert_eq!(graphs.len(), 2);
        assert_eq!(graphs[0].0, CompoundId(1));
        assert_eq!(graphs[0].1.edges(), &[(0, 1, EdgeLabel(2))]);
        assert_eq!(graphs[1].1.vertex_labels(), &[VertexLabel(7)]);
    }

    #[test]
    fn test_rejects_bad_lines() {
        let err = read_gsp("v 0 6\n".as_bytes()).unwrap_err();
        assert!(matches!(err, FormatError::Parse { line: 1, .. }));

        let err = read_gsp("t # 1\nv 1 6\n".as_bytes()).unwrap_err();
        assert!(matches!(err, FormatError::Parse { line: 2, .. }));

        let err = read_gsp("t # 1\nv 0 x\n".as_bytes()).unwrap_err();
        assert!(err.to_string().contains("vertex label"));
    }
}
