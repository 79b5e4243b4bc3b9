//! Mismatch diffs and suite output.
//!
//! Diffs are line based: the rendered form is what a failing test prints,
//! and the colored form is what `SuiteReport::print` writes to stdout.

use difference::{Changeset, Difference};
use std::io;
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

use crate::error::FixtureError;

/// Expected vs. actual output of a fixture that compiled but did not match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mismatch {
    pub fixture: String,
    pub expected: String,
    pub actual: String,
}

impl Mismatch {
    /// Plain-text diff, `-` for expected lines and `+` for actual lines.
    pub fn render(&self) -> String {
        let changeset = Changeset::new(&self.expected, &self.actual, "\n");
        let mut out = format!("compiled output of fixture '{}' does not match output.css\n", self.fixture);
        for diff in &changeset.diffs {
            let (marker, text) = match diff {
                Difference::Same(x) => (' ', x),
                Difference::Rem(x) => ('-', x),
                Difference::Add(x) => ('+', x),
            };
            for line in text.split('\n') {
                out.push(marker);
                out.push_str(line);
                out.push('\n');
            }
        }
        // Differences confined to trailing whitespace are invisible in a line diff.
        if changeset.distance == 0 || self.expected.trim_end() == self.actual.trim_end() {
            out.push_str(&format!(
                "expected: {:?}\n  actual: {:?}\n",
                self.expected, self.actual
            ));
        }
        out
    }

    fn write_colored(&self, writer: &mut impl WriteColor) -> io::Result<()> {
        let changeset = Changeset::new(&self.expected, &self.actual, "\n");
        for diff in &changeset.diffs {
            let (marker, color, text) = match diff {
                Difference::Same(x) => (' ', None, x),
                Difference::Add(x) => ('+', Some(Color::Green), x),
                Difference::Rem(x) => ('-', Some(Color::Red), x),
            };
            writer.set_color(ColorSpec::new().set_fg(color))?;
            for line in text.split('\n') {
                writeln!(writer, "{marker}{line}")?;
            }
        }
        writer.reset()
    }
}

/// Outcome of one fixture inside a suite run.
#[derive(Debug)]
pub enum FixtureStatus {
    Passed,
    Mismatch(Mismatch),
    Failed(FixtureError),
}

#[derive(Debug, Default)]
pub struct SuiteReport {
    pub entries: Vec<(String, FixtureStatus)>,
}

impl SuiteReport {
    pub fn push(&mut self, fixture: impl Into<String>, status: FixtureStatus) {
        self.entries.push((fixture.into(), status));
    }

    pub fn passed(&self) -> usize {
        self.entries
            .iter()
            .filter(|(_, status)| matches!(status, FixtureStatus::Passed))
            .count()
    }

    pub fn failed(&self) -> usize {
        self.entries.len() - self.passed()
    }

    pub fn has_failures(&self) -> bool {
        self.failed() > 0
    }

    pub fn failures(&self) -> impl Iterator<Item = &(String, FixtureStatus)> {
        self.entries
            .iter()
            .filter(|(_, status)| !matches!(status, FixtureStatus::Passed))
    }

    /// Writes PASS/FAIL lines to stdout, colored when the terminal allows.
    pub fn print(&self) {
        let mut stdout = StandardStream::stdout(ColorChoice::Auto);
        let _ = self.write_to(&mut stdout);
    }

    pub fn write_to(&self, writer: &mut impl WriteColor) -> io::Result<()> {
        for (fixture, status) in &self.entries {
            match status {
                FixtureStatus::Passed => {
                    writer.set_color(ColorSpec::new().set_fg(Some(Color::Green)).set_bold(true))?;
                    writeln!(writer, "PASS: {fixture}")?;
                }
                FixtureStatus::Mismatch(mismatch) => {
                    writer.set_color(ColorSpec::new().set_fg(Some(Color::Red)).set_bold(true))?;
                    writeln!(writer, "FAIL: {fixture}")?;
                    mismatch.write_colored(writer)?;
                }
                FixtureStatus::Failed(err) => {
                    writer.set_color(ColorSpec::new().set_fg(Some(Color::Red)).set_bold(true))?;
                    writeln!(writer, "FAIL: {fixture}")?;
                    writer.set_color(ColorSpec::new().set_fg(Some(Color::Yellow)))?;
                    writeln!(writer, "  {err}")?;
                }
            }
            writer.reset()?;
        }
        writeln!(writer, "{} passed, {} failed", self.passed(), self.failed())
    }

    /// Panics listing every failed fixture.
    pub fn assert_passed(&self) {
        if !self.has_failures() {
            return;
        }
        let mut message = format!("{} of {} fixtures failed:\n", self.failed(), self.entries.len());
        for (fixture, status) in self.failures() {
            match status {
                FixtureStatus::Mismatch(mismatch) => message.push_str(&mismatch.render()),
                FixtureStatus::Failed(err) => message.push_str(&format!("{fixture}: {err}\n")),
                FixtureStatus::Passed => {}
            }
        }
        panic!("{message}");
    }
}
