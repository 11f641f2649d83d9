//! Program-and-compare test suites run through a [`BridgeClient`].
//!
//! A suite is a directory of `<name>.hex` programs and a directory of matching
//! `<name>.ans` expected results. Each case resets the core, clears instruction
//! memory, loads the program, runs it, waits, and compares the word at a fixed
//! verification address against the expected value.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::channel::ByteChannel;
use crate::client::BridgeClient;
use crate::program::{read_expected, Program};
use crate::Error;

const PROGRAM_EXTENSION: &str = "hex";
const EXPECTED_EXTENSION: &str = "ans";

/// Where the suite lives and how each case is run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SuiteConfig {
    /// Directory holding the `*.hex` programs.
    pub hex_dir: PathBuf,
    /// Directory holding the `*.ans` expected results.
    pub expected_dir: PathBuf,
    /// Address read back after the program ran.
    pub verify_address: u32,
    /// Address of the first program word.
    pub program_start: u32,
    /// Bytes of instruction memory overwritten with NOPs before loading.
    pub clear_bytes: u32,
    /// Time the core gets to execute, in milliseconds.
    pub run_delay_ms: u64,
}

impl Default for SuiteConfig {
    fn default() -> Self {
        let root = PathBuf::from("test_suite");
        Self {
            hex_dir: root.join("hex"),
            expected_dir: root.join("expected"),
            verify_address: 0x0000_2000,
            program_start: 0x0000_0000,
            clear_bytes: 128,
            run_delay_ms: 100,
        }
    }
}

impl SuiteConfig {
    /// The execution delay as a [`Duration`].
    pub fn run_delay(&self) -> Duration {
        Duration::from_millis(self.run_delay_ms)
    }
}

/// One program with its expected result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestCase {
    /// File stem shared by the program and the expected result.
    pub name: String,
    /// Program file.
    pub hex_path: PathBuf,
    /// Expected-result file.
    pub ans_path: PathBuf,
}

/// Finds all test cases of a suite, sorted by name.
///
/// Programs without an expected result are skipped with a warning.
pub fn discover(config: &SuiteConfig) -> Result<Vec<TestCase>, Error> {
    if !config.expected_dir.is_dir() {
        return Err(Error::Suite(format!(
            "directory {} not found",
            config.expected_dir.display()
        )));
    }

    let unreadable = |e: std::io::Error| {
        Error::Suite(format!("cannot list {}: {e}", config.hex_dir.display()))
    };

    let mut cases = Vec::new();
    for entry in std::fs::read_dir(&config.hex_dir).map_err(unreadable)? {
        let hex_path = entry.map_err(unreadable)?.path();
        if hex_path.extension().and_then(|ext| ext.to_str()) != Some(PROGRAM_EXTENSION) {
            continue;
        }
        let Some(name) = hex_path.file_stem().and_then(|s| s.to_str()) else {
            continue;
        };

        let ans_path = case_path(&config.expected_dir, name, EXPECTED_EXTENSION);
        if !ans_path.is_file() {
            tracing::warn!("No expected result for {name}, skipping");
            continue;
        }

        cases.push(TestCase {
            name: name.to_string(),
            hex_path,
            ans_path,
        });
    }

    cases.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(cases)
}

/// The result of running one [`TestCase`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestOutcome {
    /// Name of the case.
    pub name: String,
    /// The expected value, if the expected-result file could be read.
    pub expected: Option<u32>,
    /// The value read back, if the run got that far.
    pub actual: Option<u32>,
    /// Number of program words loaded.
    pub instructions: usize,
    /// Why the case could not be completed.
    pub failure: Option<String>,
}

impl TestOutcome {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            expected: None,
            actual: None,
            instructions: 0,
            failure: None,
        }
    }

    fn failed(mut self, step: &str, error: impl std::fmt::Display) -> Self {
        self.failure = Some(format!("{step}: {error}"));
        self
    }

    /// Whether the value read back matches the expected value.
    pub fn passed(&self) -> bool {
        self.failure.is_none() && self.expected.is_some() && self.expected == self.actual
    }
}

/// Runs a single case. Failures of individual steps end up in the outcome.
pub fn run_test_case<C: ByteChannel>(
    client: &mut BridgeClient<C>,
    case: &TestCase,
    config: &SuiteConfig,
) -> TestOutcome {
    let mut outcome = TestOutcome::new(&case.name);

    match read_expected(&case.ans_path) {
        Ok(expected) => outcome.expected = Some(expected),
        Err(e) => return outcome.failed("reading expected result", e),
    }
    let program = match Program::from_file(&case.hex_path) {
        Ok(program) => program,
        Err(e) => return outcome.failed("reading program", e),
    };

    if let Err(e) = client.reset() {
        return outcome.failed("reset", e);
    }
    tracing::debug!("[{}] core held in reset", case.name);

    if let Err(e) = client.clear_memory(config.program_start, config.clear_bytes) {
        return outcome.failed("clearing memory", e);
    }

    match client.load_program(&program, config.program_start) {
        Ok(count) => outcome.instructions = count,
        Err(e) => return outcome.failed("loading program", e),
    }
    tracing::debug!("[{}] loaded {} instructions", case.name, outcome.instructions);

    if let Err(e) = client.run() {
        return outcome.failed("run", e);
    }

    std::thread::sleep(config.run_delay());

    match client.verify(config.verify_address) {
        Ok(actual) => outcome.actual = Some(actual),
        Err(e) => return outcome.failed("verify", e),
    }
    tracing::debug!("[{}] read back {:?}", case.name, outcome.actual);

    outcome
}

/// Outcomes of a whole suite run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SuiteReport {
    /// One outcome per case, in run order.
    pub outcomes: Vec<TestOutcome>,
}

impl SuiteReport {
    /// Number of passed cases.
    pub fn passed(&self) -> usize {
        self.outcomes.iter().filter(|o| o.passed()).count()
    }

    /// Number of cases run.
    pub fn total(&self) -> usize {
        self.outcomes.len()
    }

    /// Whether every case passed.
    pub fn all_passed(&self) -> bool {
        self.passed() == self.total()
    }
}

/// Runs every case in order, calling `on_outcome` after each one.
pub fn run_suite<C: ByteChannel>(
    client: &mut BridgeClient<C>,
    cases: &[TestCase],
    config: &SuiteConfig,
    mut on_outcome: impl FnMut(usize, &TestOutcome),
) -> SuiteReport {
    let mut report = SuiteReport::default();
    for (index, case) in cases.iter().enumerate() {
        let outcome = run_test_case(client, case, config);
        on_outcome(index, &outcome);
        report.outcomes.push(outcome);
    }
    report
}

fn case_path(dir: &Path, name: &str, extension: &str) -> PathBuf {
    dir.join(format!("{name}.{extension}"))
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::test::QueueChannel;

    fn suite_dirs() -> (tempfile::TempDir, SuiteConfig) {
        let root = tempfile::tempdir().unwrap();
        let config = SuiteConfig {
            hex_dir: root.path().join("hex"),
            expected_dir: root.path().join("expected"),
            run_delay_ms: 0,
            ..Default::default()
        };
        std::fs::create_dir(&config.hex_dir).unwrap();
        std::fs::create_dir(&config.expected_dir).unwrap();
        (root, config)
    }

    fn add_case(config: &SuiteConfig, name: &str, program: &str, expected: Option<&str>) {
        std::fs::write(case_path(&config.hex_dir, name, "hex"), program).unwrap();
        if let Some(expected) = expected {
            std::fs::write(case_path(&config.expected_dir, name, "ans"), expected).unwrap();
        }
    }

    #[test]
    fn defaults_match_the_reference_suite() {
        let config = SuiteConfig::default();
        assert_eq!(config.hex_dir, Path::new("test_suite/hex"));
        assert_eq!(config.expected_dir, Path::new("test_suite/expected"));
        assert_eq!(config.verify_address, 0x2000);
        assert_eq!(config.clear_bytes, 128);
        assert_eq!(config.run_delay(), Duration::from_millis(100));
    }

    #[test]
    fn discover_sorts_and_skips_unmatched() {
        let (_root, config) = suite_dirs();
        add_case(&config, "02_sub", "00000013\n", Some("0"));
        add_case(&config, "01_add", "00000013\n", Some("8"));
        add_case(&config, "03_orphan", "00000013\n", None);
        std::fs::write(config.hex_dir.join("README.txt"), "not a program").unwrap();

        let names: Vec<_> = discover(&config)
            .unwrap()
            .into_iter()
            .map(|case| case.name)
            .collect();
        assert_eq!(names, vec!["01_add", "02_sub"]);
    }

    #[test]
    fn discover_pairs_programs_with_expected_results() {
        let (_root, config) = suite_dirs();
        add_case(&config, "01_add", "00000013\n", Some("8"));

        assert_eq!(
            discover(&config).unwrap(),
            vec![TestCase {
                name: "01_add".to_string(),
                hex_path: config.hex_dir.join("01_add.hex"),
                ans_path: config.expected_dir.join("01_add.ans"),
            }]
        );
    }

    #[test]
    fn discover_requires_the_expected_directory() {
        let (_root, mut config) = suite_dirs();
        config.expected_dir = config.expected_dir.join("missing");
        assert!(matches!(discover(&config), Err(Error::Suite(_))));
    }

    #[test]
    fn unlistable_program_directory_names_the_directory() {
        let (_root, mut config) = suite_dirs();
        config.hex_dir = config.hex_dir.join("missing");

        match discover(&config) {
            Err(Error::Suite(message)) => {
                assert!(message.contains(&config.hex_dir.display().to_string()), "{message}");
            }
            other => panic!("unexpected result {other:?}"),
        }
    }

    #[test]
    fn case_runs_the_full_sequence() {
        let (_root, config) = suite_dirs();
        let config = SuiteConfig {
            clear_bytes: 8,
            ..config
        };
        add_case(&config, "01_add", "00500093\n00300113\n002081B3\n", Some("8"));
        let case = discover(&config).unwrap().remove(0);

        // reset, 2 clears, 3 loads, run, then the verify word.
        let mut responses = b"K".to_vec();
        responses.extend(b"KK");
        responses.extend(b"KKK");
        responses.extend(b"K");
        responses.extend([0x08, 0x00, 0x00, 0x00]);
        let mut client = BridgeClient::new(QueueChannel::new(&responses));

        let outcome = run_test_case(&mut client, &case, &config);
        assert_eq!(
            outcome,
            TestOutcome {
                name: "01_add".to_string(),
                expected: Some(8),
                actual: Some(8),
                instructions: 3,
                failure: None,
            }
        );
        assert!(outcome.passed());

        let sent = client.into_inner().output;
        assert_eq!(sent[0], b'S');
        assert_eq!(sent.len(), 1 + 5 * 9 + 1 + 5);
        assert_eq!(&sent[sent.len() - 5..], &[b'V', 0x00, 0x20, 0x00, 0x00]);
    }

    #[test]
    fn failed_step_is_recorded() {
        let (_root, config) = suite_dirs();
        add_case(&config, "01_add", "00000013\n", Some("8"));
        let case = discover(&config).unwrap().remove(0);

        let mut client = BridgeClient::new(QueueChannel::new(b"X"));
        let outcome = run_test_case(&mut client, &case, &config);

        assert!(!outcome.passed());
        assert_eq!(outcome.expected, Some(8));
        assert!(outcome.failure.as_deref().unwrap().starts_with("reset"));
    }

    #[test]
    fn unreadable_expected_result_fails_before_touching_the_bridge() {
        let (_root, config) = suite_dirs();
        add_case(&config, "01_bad", "00000013\n", Some("eight"));
        let case = discover(&config).unwrap().remove(0);

        let mut client = BridgeClient::new(QueueChannel::new(b""));
        let outcome = run_test_case(&mut client, &case, &config);

        assert!(!outcome.passed());
        assert!(client.into_inner().output.is_empty());
    }

    #[test]
    fn report_counts() {
        let pass = TestOutcome {
            expected: Some(1),
            actual: Some(1),
            ..TestOutcome::new("a")
        };
        let mismatch = TestOutcome {
            expected: Some(1),
            actual: Some(2),
            ..TestOutcome::new("b")
        };
        let report = SuiteReport {
            outcomes: vec![pass.clone(), mismatch],
        };
        assert_eq!(report.passed(), 1);
        assert_eq!(report.total(), 2);
        assert!(!report.all_passed());

        assert!(SuiteReport {
            outcomes: vec![pass]
        }
        .all_passed());
    }
}
