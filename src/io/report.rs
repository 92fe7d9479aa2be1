//! Rendering mining results as text.
//!
//! Formats:
//!
//! - `yaml`: one list item per pattern,
//!   `- [ "<smarts>", <statistic>, [<actives>], [<inactives>] ]`
//! - `dfs`: canonical code, support and statistic, tab separated
//! - `gspan`: each pattern as a `t`/`v`/`e` graph block
//! - `json`: one serialized result per line
//!
//! Block separators are `---` in yaml, `#` in gspan and an empty line
//! otherwise.

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::io::Write;

use crate::types::{CompoundId, DfsCode, EdgeLabel, MiningResult};

/// Activity per compound, used to split supports into actives and
/// inactives.
pub type ActivityMap = BTreeMap<CompoundId, f64>;

/// Output format of a [`ReportWriter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
pub enum ReportFormat {
    /// YAML-style list with SMARTS patterns.
    #[default]
    Yaml,
    /// Canonical DFS codes.
    Dfs,
    /// gSpan graph blocks.
    Gspan,
    /// JSON lines.
    Json,
}

/// SMARTS-style bond symbol for an edge label.
fn bond_symbol(label: EdgeLabel) -> &'static str {
    match label.0 {
        1 => "-",
        2 => "=",
        3 => "#",
        4 => ":",
        _ => "~",
    }
}

fn push_ring_digit(out: &mut String, digit: usize) {
    if digit < 10 {
        let _ = write!(out, "{}", digit);
    } else {
        let _ = write!(out, "%{}", digit);
    }
}

struct SmartsLayout {
    labels: Vec<u16>,
    children: Vec<Vec<(usize, EdgeLabel)>>,
    ring_open: Vec<Vec<(usize, EdgeLabel)>>,
    ring_close: Vec<Vec<usize>>,
}

impl SmartsLayout {
    fn write_atom(&self, v: usize, out: &mut String) {
        let _ = write!(out, "[#{}]", self.labels[v]);
        for &(digit, label) in &self.ring_open[v] {
            out.push_str(bond_symbol(label));
            push_ring_digit(out, digit);
        }
        for &digit in &self.ring_close[v] {
            push_ring_digit(out, digit);
        }
        let kids = &self.children[v];
        for (i, &(child, label)) in kids.iter().enumerate() {
            let branch = i + 1 < kids.len();
            if branch {
                out.push('(');
            }
            out.push_str(bond_symbol(label));
            self.write_atom(child, out);
            if branch {
                out.push(')');
            }
        }
    }
}

/// Render a pattern as a SMARTS-style string.
///
/// Atoms are written as `[#label]`, bonds 1 to 4 as `-`, `=`, `#`, `:`,
/// and every cycle-closing edge gets its own ring number.
pub fn smarts(code: &DfsCode) -> String {
    let n = code.vertex_count();
    let mut layout = SmartsLayout {
        labels: vec![code.root().0; n],
        children: vec![Vec::new(); n],
        ring_open: vec![Vec::new(); n],
        ring_close: vec![Vec::new(); n],
    };
    let mut digit = 0;
    for edge in code.edges() {
        let (from, to) = (edge.from as usize, edge.to as usize);
        if edge.is_forward() {
            layout.labels[to] = edge.to_label.0;
            layout.children[from].push((to, edge.edge_label));
        } else {
            digit += 1;
            layout.ring_open[to].push((digit, edge.edge_label));
            layout.ring_close[from].push(digit);
        }
    }
    let mut out = String::new();
    layout.write_atom(0, &mut out);
    out
}

fn id_list<'a>(ids: impl Iterator<Item = &'a CompoundId>) -> String {
    let joined: Vec<String> = ids.map(|id| id.to_string()).collect();
    format!("[{}]", joined.join(", "))
}

/// Streaming result renderer.
pub struct ReportWriter<W: Write> {
    writer: W,
    format: ReportFormat,
    activities: ActivityMap,
    written: usize,
}

impl<W: Write> ReportWriter<W> {
    /// Create a writer.
    pub fn new(writer: W, format: ReportFormat, activities: ActivityMap) -> Self {
        Self {
            writer,
            format,
            activities,
            written: 0,
        }
    }

    /// Number of results written.
    pub fn written(&self) -> usize {
        self.written
    }

    /// Render one result.
    pub fn write_result(&mut self, result: &MiningResult) -> std::io::Result<()> {
        match self.format {
            ReportFormat::Yaml => {
                let line = self.yaml_line(result);
                writeln!(self.writer, "{}", line)?;
            }
            ReportFormat::Dfs => {
                let statistic = result
                    .assessment
                    .as_ref()
                    .map_or_else(|| "-".to_string(), |a| format!("{:.4}", a.statistic));
                writeln!(self.writer, "{}\t{}\t{}", result.code, result.support, statistic)?;
            }
            ReportFormat::Gspan => {
                writeln!(self.writer, "t # {} {}", self.written, result.support)?;
                let graph = result.code.to_graph();
                for (v, label) in graph.labels().iter().enumerate() {
                    writeln!(self.writer, "v {} {}", v, label)?;
                }
                for edge in graph.edges() {
                    writeln!(self.writer, "e {} {} {}", edge.a, edge.b, edge.label)?;
                }
            }
            ReportFormat::Json => {
                let line = serde_json::to_string(result)
                    .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
                writeln!(self.writer, "{}", line)?;
            }
        }
        self.written += 1;
        Ok(())
    }

    fn yaml_line(&self, result: &MiningResult) -> String {
        let pattern = smarts(&result.code);
        match &result.assessment {
            Some(assessment) if assessment.active + assessment.inactive == assessment.labelled => {
                let actives = result
                    .compounds
                    .iter()
                    .filter(|id| self.activities.get(*id) == Some(&1.0));
                let inactives = result
                    .compounds
                    .iter()
                    .filter(|id| self.activities.get(*id) == Some(&0.0));
                format!(
                    "- [ \"{}\", {:.4}, {}, {} ]",
                    pattern,
                    assessment.statistic,
                    id_list(actives),
                    id_list(inactives)
                )
            }
            Some(assessment) => {
                let labelled = result
                    .compounds
                    .iter()
                    .filter(|id| self.activities.contains_key(*id));
                format!("- [ \"{}\", {:.4}, {} ]", pattern, assessment.statistic, id_list(labelled))
            }
            None => format!(
                "- [ \"{}\", {}, {} ]",
                pattern,
                result.support,
                id_list(result.compounds.iter())
            ),
        }
    }

    /// End the current block of results.
    pub fn write_separator(&mut self) -> std::io::Result<()> {
        let separator = match self.format {
            ReportFormat::Yaml => "---",
            ReportFormat::Gspan => "#",
            ReportFormat::Dfs | ReportFormat::Json => "",
        };
        writeln!(self.writer, "{}", separator)
    }

    /// Flush the underlying writer.
    pub fn flush(&mut self) -> std::io::Result<()> {
        self.writer.flush()
    }

    /// Recover the writer.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canonical_form::canonical_code;
    use crate::types::{Assessment, Direction, IndexedGraph, MolGraph, PatternRole, VertexLabel};

    fn code_of(labels: &[u16], edges: &[(usize, usize, u16)]) -> DfsCode {
        let graph = IndexedGraph::from_mol(&MolGraph::from_parts(
            labels.iter().map(|&l| VertexLabel(l)).collect(),
            edges.iter().map(|&(a, b, l)| (a, b, EdgeLabel(l))).collect(),
        ))
        .unwrap();
        canonical_code(&graph).unwrap()
    }

    fn result(code: DfsCode, assessment: Option<Assessment>) -> MiningResult {
        MiningResult {
            root: 0,
            code,
            support: 3,
            compounds: vec![CompoundId(1), CompoundId(2), CompoundId(5)],
            assessment,
            closed: true,
            role: PatternRole::Closed,
            boundary: true,
        }
    }

    #[test]
    fn test_smarts_chain_and_branch() {
        assert_eq!(smarts(&code_of(&[6, 8], &[(0, 1, 2)])), "[#6]=[#8]");
        assert_eq!(
            smarts(&code_of(&[6, 7, 8], &[(0, 1, 1), (0, 2, 1)])),
            "[#6](-[#7])-[#8]"
        );
    }

    #[test]
    fn test_smarts_ring() {
        let triangle = code_of(&[6, 6, 6], &[(0, 1, 4), (1, 2, 4), (2, 0, 4)]);
        assert_eq!(smarts(&triangle), "[#6]:1:[#6]:[#6]1");
    }

    #[test]
    fn test_yaml_classification_line() {
        let activities: ActivityMap =
            [(CompoundId(1), 1.0), (CompoundId(2), 0.0), (CompoundId(5), 1.0)].into_iter().collect();
        let assessment = Assessment {
            statistic: 1.5,
            p_value: 0.22,
            upper_bound: 2.0,
            significant: false,
            direction: Direction::Activating,
            labelled: 3,
            active: 2,
            inactive: 1,
        };
        let mut writer = ReportWriter::new(Vec::new(), ReportFormat::Yaml, activities);
        writer
            .write_result(&result(code_of(&[6, 8], &[(0, 1, 1)]), Some(assessment)))
            .unwrap();
        let text = String::from_utf8(writer.into_inner()).unwrap();
        assert_eq!(text, "- [ \"[#6]-[#8]\", 1.5000, [1, 5], [2] ]\n");
    }

    #[test]
    fn test_yaml_without_assessment() {
        let mut writer = ReportWriter::new(Vec::new(), ReportFormat::Yaml, ActivityMap::new());
        writer.write_result(&result(code_of(&[6, 8], &[(0, 1, 1)]), None)).unwrap();
        let text = String::from_utf8(writer.into_inner()).unwrap();
        assert_eq!(text, "- [ \"[#6]-[#8]\", 3, [1, 2, 5] ]\n");
    }

    #[test]
    fn test_gspan_block() {
        let mut writer = ReportWriter::new(Vec::new(), ReportFormat::Gspan, ActivityMap::new());
        writer.write_result(&result(code_of(&[6, 8], &[(0, 1, 2)]), None)).unwrap();
        assert_eq!(writer.written(), 1);
        let text = String::from_utf8(writer.into_inner()).unwrap();
        assert_eq!(text, "t # 0 3\nv 0 6\nv 1 8\ne 0 1 2\n");
    }

    #[test]
    fn test_separator_between_blocks() {
        let mut writer = ReportWriter::new(Vec::new(), ReportFormat::Yaml, ActivityMap::new());
        writer.write_result(&result(code_of(&[6, 8], &[(0, 1, 1)]), None)).unwrap();
        writer.write_separator().unwrap();
        assert_eq!(writer.written(), 1);
        let text = String::from_utf8(writer.into_inner()).unwrap();
        assert_eq!(text, "- [ \"[#6]-[#8]\", 3, [1, 2, 5] ]\n---\n");
    }
}
