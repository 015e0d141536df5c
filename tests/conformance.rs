//! Conformance transcripts
//!
//! Each file under `tests/conformance/` is a series of cases introduced by a
//! `### title` line. Within a case, `>>> ` and `... ` lines accumulate
//! source; the next plain line is the expected printed form of the value
//! the accumulated source evaluates to. Every case runs in a fresh session.

use std::path::PathBuf;

use serpent::Session;
use tracing_subscriber::EnvFilter;

struct Case {
    title: String,
    steps: Vec<Step>,
}

struct Step {
    source: String,
    /// `None` when the source only has to run without error
    expected: Option<String>,
    line: usize,
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn parse_transcript(text: &str) -> Vec<Case> {
    let mut cases: Vec<Case> = Vec::new();
    let mut pending = String::new();
    let mut pending_line = 0;

    fn flush(cases: &mut [Case], pending: &mut String, expected: Option<String>, line: usize) {
        if let Some(case) = cases.last_mut() {
            case.steps.push(Step {
                source: std::mem::take(pending),
                expected,
                line,
            });
        }
    }

    for (number, line) in text.lines().enumerate() {
        let number = number + 1;
        if let Some(title) = line.strip_prefix("###") {
            if !pending.is_empty() {
                flush(&mut cases, &mut pending, None, pending_line);
            }
            cases.push(Case {
                title: title.trim().to_string(),
                steps: Vec::new(),
            });
        } else if let Some(code) = line
            .strip_prefix(">>> ")
            .or_else(|| line.strip_prefix("... "))
            .or_else(|| (line == ">>>" || line == "...").then_some(""))
        {
            if pending.is_empty() {
                pending_line = number;
            }
            pending.push_str(code);
            pending.push('\n');
        } else if line.trim().is_empty() || line.starts_with('#') {
            continue;
        } else {
            flush(&mut cases, &mut pending, Some(line.trim_end().to_string()), pending_line);
        }
    }
    if !pending.is_empty() {
        flush(&mut cases, &mut pending, None, pending_line);
    }
    cases
}

fn run_transcript(file: &str) {
    init_tracing();
    let path: PathBuf = [env!("CARGO_MANIFEST_DIR"), "tests", "conformance", file]
        .iter()
        .collect();
    let text = std::fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("cannot read {}: {}", path.display(), e));
    let cases = parse_transcript(&text);
    assert!(!cases.is_empty(), "{} has no cases", file);

    let mut failures = Vec::new();
    for case in &cases {
        let mut session = Session::new();
        for step in &case.steps {
            let outcome = match session.evaluate(&step.source) {
                Ok(value) => match &step.expected {
                    Some(expected) if value.repr() != *expected => {
                        Some(format!("expected {}, got {}", expected, value.repr()))
                    }
                    _ => None,
                },
                Err(err) => Some(format!("error: {}", err)),
            };
            if let Some(problem) = outcome {
                failures.push(format!(
                    "{}:{} [{}]\n{}{}",
                    file, step.line, case.title, step.source, problem
                ));
                break;
            }
        }
    }
    assert!(
        failures.is_empty(),
        "{} of {} case(s) failed:\n\n{}",
        failures.len(),
        cases.len(),
        failures.join("\n\n")
    );
}

#[test]
fn test_transcript_parser() {
    let cases = parse_transcript(
        "### first\n>>> a = 1\n>>> a\n1\n\n### second\n>>> if 1:\n...   b = 2\n>>> b\n2\n>>> print b\n",
    );
    assert_eq!(cases.len(), 2);
    assert_eq!(cases[0].steps.len(), 1);
    assert_eq!(cases[0].steps[0].source, "a = 1\na\n");
    assert_eq!(cases[1].steps.len(), 2);
    assert_eq!(cases[1].steps[0].source, "if 1:\n  b = 2\nb\n");
    assert_eq!(cases[1].steps[1].expected, None);
}

#[test]
fn conformance_assignments() {
    run_transcript("assignments.py");
}

#[test]
fn conformance_basic() {
    run_transcript("basic.py");
}

#[test]
fn conformance_builtins() {
    run_transcript("builtins.py");
}

#[test]
fn conformance_del() {
    run_transcript("del.py");
}

#[test]
fn conformance_expressions() {
    run_transcript("expressions.py");
}

#[test]
fn conformance_functions() {
    run_transcript("functions.py");
}

#[test]
fn conformance_globals() {
    run_transcript("globals.py");
}

#[test]
fn conformance_imports() {
    run_transcript("imports.py");
}

#[test]
fn conformance_instances() {
    run_transcript("instances.py");
}

#[test]
fn conformance_statements() {
    run_transcript("statements.py");
}
