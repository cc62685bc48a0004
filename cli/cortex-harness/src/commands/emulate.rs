//! `cortex-harness emulate`: replay a bus trace against the test peripherals.

use std::cell::RefCell;
use std::fmt::Write as _;
use std::path::Path;
use std::rc::Rc;

use anyhow::{bail, Context, Result};
use cortex_periph::{BusTrace, LogSink, Machine, MachineConfig, RecordingSink, ReplaySummary};
use serde::Serialize;

use super::{to_json, Format};

/// Result of one replay.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    #[serde(flatten)]
    pub summary: ReplaySummary,
    /// Completed lines, trailing whitespace removed.
    pub lines: Vec<String>,
    /// Text after the last line feed.
    pub partial: String,
}

/// Replay `trace` on a fresh machine, logging output to `sink`.
pub fn replay(trace: &BusTrace, config: MachineConfig, sink: Rc<dyn LogSink>) -> Result<Report> {
    let lines = Rc::new(RefCell::new(Vec::new()));
    let partial = Rc::new(RefCell::new(String::new()));

    let line_log = Rc::clone(&lines);
    let partial_log = Rc::clone(&partial);
    let mut machine = Machine::new(
        config,
        sink,
        Box::new(move |line: &str| line_log.borrow_mut().push(line.to_string())),
        Some(Box::new(move |c: char| {
            let mut pending = partial_log.borrow_mut();
            if c == '\n' {
                pending.clear();
            } else {
                pending.push(c);
            }
        })),
    )
    .context("mapping peripherals")?;

    let summary = machine.replay(trace).context("replaying trace")?;
    drop(machine);

    let lines = lines.take();
    let partial = partial.take();
    Ok(Report {
        summary,
        lines,
        partial,
    })
}

/// Load and replay a trace file.
///
/// Text mode prints the completed lines as the line handler saw them,
/// followed by any unterminated text, and logs the summary. JSON mode
/// returns the whole report.
pub fn run(
    path: &Path,
    config: MachineConfig,
    expect_complete: bool,
    format: Format,
) -> Result<String> {
    let text =
        std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let trace = BusTrace::parse(&text).with_context(|| format!("parsing {}", path.display()))?;
    log::debug!("{}: {} accesses", path.display(), trace.len());

    let report = replay(&trace, config, Rc::new(RecordingSink::new()))?;

    let out = match format {
        Format::Json => to_json(&report)?,
        Format::Text => render_text(&report)?,
    };
    log::info!(
        "{} reads, {} writes, {} lines, {}",
        report.summary.reads,
        report.summary.writes,
        report.lines.len(),
        if report.summary.completed {
            "run complete"
        } else {
            "no completion signal"
        }
    );
    if expect_complete && !report.summary.completed {
        bail!("{} ended before the completion register was written", path.display());
    }
    Ok(out)
}

fn render_text(report: &Report) -> Result<String> {
    let mut out = String::new();
    for line in &report.lines {
        writeln!(out, "{line}")?;
    }
    if !report.partial.is_empty() {
        writeln!(out, "{}", report.partial)?;
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recorded(trace: &str) -> (Report, Rc<RecordingSink>) {
        let sink = Rc::new(RecordingSink::new());
        let trace = BusTrace::parse(trace).unwrap();
        let report = replay(&trace, MachineConfig::default(), sink.clone()).unwrap();
        (report, sink)
    }

    #[test]
    fn collects_lines_and_partial_text() {
        let (report, sink) = recorded(
            "p 0x40000000 [TEST] NVIC\\n  [PASS] enable  \\nTotal\n\
             r 0x40000004\n",
        );
        assert_eq!(report.lines, ["[TEST] NVIC", "  [PASS] enable"]);
        assert_eq!(report.partial, "Total");
        assert_eq!(report.summary.reads, 1);
        assert!(!report.summary.completed);
        assert_eq!(sink.text(), "[TEST] NVIC\n  [PASS] enable  \nTotal");
    }

    #[test]
    fn completion_is_reported() {
        let (report, _) = recorded("p 0x40000000 done\\n\nw 0x40001000 0xDEADBEEF\n");
        assert!(report.summary.completed);
        assert_eq!(report.lines, ["done"]);
        assert!(report.partial.is_empty());
    }

    #[test]
    fn json_report_flattens_summary() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.trace");
        std::fs::write(&path, "p 0x40000000 OK\\n\nw 0x40001000 0xDEADBEEF\n").unwrap();

        let out = run(&path, MachineConfig::default(), true, Format::Json).unwrap();
        let json: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(json["completed"], true);
        assert_eq!(json["writes"], 4);
        assert_eq!(json["lines"][0], "OK");
    }

    #[test]
    fn text_output_uses_trimmed_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("crlf.trace");
        std::fs::write(
            &path,
            "p 0x40000000 [PASS] one  \\r\\n[PASS] two\\r\\nTotal\n\
             w 0x40001000 0xDEADBEEF\n",
        )
        .unwrap();

        let out = run(&path, MachineConfig::default(), true, Format::Text).unwrap();
        assert_eq!(out, "[PASS] one\n[PASS] two\nTotal\n");
    }

    #[test]
    fn expect_complete_fails_on_truncated_run() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hung.trace");
        std::fs::write(&path, "p 0x40000000 booting\\n\n").unwrap();

        assert!(run(&path, MachineConfig::default(), false, Format::Json).is_ok());
        let err = run(&path, MachineConfig::default(), true, Format::Json).unwrap_err();
        assert!(format!("{err:#}").contains("completion register"));
    }

    #[test]
    fn malformed_trace_names_the_line() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.trace");
        std::fs::write(&path, "# header\nq 0x0\n").unwrap();
        let err = run(&path, MachineConfig::default(), false, Format::Json).unwrap_err();
        assert!(format!("{err:#}").contains("line 2"));
    }

    #[test]
    fn unmapped_access_fails() {
        let sink = Rc::new(RecordingSink::new());
        let trace = BusTrace::parse("w 0x0 1\n").unwrap();
        assert!(replay(&trace, MachineConfig::default(), sink).is_err());
    }
}
