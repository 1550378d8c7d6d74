use std::io::{self, Write};

use colored::Colorize;

use crate::compare::Side;
use crate::ext::relative_depth;
use crate::filesystem::EntryKind;
use crate::walker::{MismatchDetail, PathDifference, TraversalResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineStyle {
    Missing,
    Mismatch,
    SummaryIdentical,
    SummaryDifferent,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportLine {
    pub depth: usize,
    pub style: LineStyle,
    pub text: String,
}

impl ReportLine {
    fn plain(&self) -> String {
        format!("{}{}", "  ".repeat(self.depth), self.text)
    }
}

/// Renders `result` as report lines: one per difference, in path order and
/// indented by directory depth, followed by a summary line.
pub fn render(result: &TraversalResult) -> Vec<ReportLine> {
    let mut lines: Vec<ReportLine> = result.differences.iter().map(render_difference).collect();
    lines.push(render_summary(result));
    lines
}

fn display_path(path: &str, kind: EntryKind) -> String {
    if kind == EntryKind::Directory {
        format!("{path}/")
    } else {
        path.to_string()
    }
}

fn render_difference(difference: &PathDifference) -> ReportLine {
    let (style, text) = match difference {
        PathDifference::MissingOnRight { path, kind } => (
            LineStyle::Missing,
            format!("missing on right: {}", display_path(path, *kind)),
        ),
        PathDifference::MissingOnLeft { path, kind } => (
            LineStyle::Missing,
            format!("missing on left: {}", display_path(path, *kind)),
        ),
        PathDifference::TypeMismatch { path, left, right } => (
            LineStyle::Mismatch,
            format!("type mismatch: {path} (left {left}, right {right})"),
        ),
        PathDifference::ContentMismatch { path, detail } => {
            (LineStyle::Mismatch, render_detail(path, detail))
        }
    };

    ReportLine {
        depth: relative_depth(difference.path()),
        style,
        text,
    }
}

fn render_detail(path: &str, detail: &MismatchDetail) -> String {
    match detail {
        MismatchDetail::Digest { left, right } => {
            format!("content differs: {path} (left sha256 {left}, right sha256 {right})")
        }
        MismatchDetail::Metadata { left, right } => format!(
            "size/time differs: {path} (left {} bytes at {}, right {} bytes at {})",
            left.size, left.modified_at, right.size, right.modified_at
        ),
        MismatchDetail::LinkTarget { left, right } => {
            format!("link target differs: {path} (left -> {left}, right -> {right})")
        }
        MismatchDetail::Unreadable { side, message } => {
            format!("unreadable: {path} ({side}: {message})")
        }
        MismatchDetail::DirectoryCycle { left, right } => {
            let sides: Vec<String> = [(Side::Left, left), (Side::Right, right)]
                .into_iter()
                .filter_map(|(side, ancestor)| {
                    let ancestor = ancestor.as_deref()?;
                    let ancestor = if ancestor.is_empty() { "." } else { ancestor };
                    Some(format!("{side} leads back to {ancestor}"))
                })
                .collect();
            format!("directory cycle: {path} ({})", sides.join(", "))
        }
    }
}

fn render_summary(result: &TraversalResult) -> ReportLine {
    let counts = format!(
        "{} {} in {} {} compared",
        result.files_compared,
        plural(result.files_compared, "file", "files"),
        result.directories_compared,
        plural(result.directories_compared, "directory", "directories"),
    );

    if result.identical {
        ReportLine {
            depth: 0,
            style: LineStyle::SummaryIdentical,
            text: format!("The trees are identical: {counts}"),
        }
    } else {
        let count = result.differences.len();
        ReportLine {
            depth: 0,
            style: LineStyle::SummaryDifferent,
            text: format!(
                "The trees differ: {count} {}, {counts}",
                plural(count, "difference", "differences")
            ),
        }
    }
}

fn plural(count: usize, singular: &'static str, plural: &'static str) -> &'static str {
    if count == 1 { singular } else { plural }
}

/// Writes rendered results to an output sink, as text or JSON.
#[derive(Debug, Clone, Copy, Default)]
pub struct Reporter {
    use_color: bool,
}

impl Reporter {
    pub fn new(use_color: bool) -> Self {
        Self { use_color }
    }

    pub fn write_text(&self, result: &TraversalResult, sink: &mut impl Write) -> io::Result<()> {
        for line in render(result) {
            let text = line.plain();
            if self.use_color {
                let colored = match line.style {
                    LineStyle::Missing => text.yellow(),
                    LineStyle::Mismatch => text.red(),
                    LineStyle::SummaryIdentical => text.green().bold(),
                    LineStyle::SummaryDifferent => text.red().bold(),
                };
                writeln!(sink, "{colored}")?;
            } else {
                writeln!(sink, "{text}")?;
            }
        }
        sink.flush()
    }

    pub fn write_json(&self, result: &TraversalResult, sink: &mut impl Write) -> io::Result<()> {
        serde_json::to_writer_pretty(&mut *sink, result)?;
        writeln!(sink)?;
        sink.flush()
    }
}
