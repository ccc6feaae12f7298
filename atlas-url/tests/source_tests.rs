//! Runs `atlas-url` over the schemas in `tests/schemas` and `schemas`.
//!
//! Each schema may carry test configuration as TOML in `//~` comments:
//!
//! ```text
//! //~ exit-code = 1
//! //~ stderr-contains = ["duplicate field number 1"]
//! //~ example-type = "Camera"
//! //~ example-data = ["camera/*.json"]
//! ```
//!
//! Every schema is checked, and every example JSON file is encoded to a URL
//! token and decoded again, which must reproduce the original JSON.

use itertools::Itertools;
use libtest_mimic::{Arguments, Failed, Trial};
use serde::Deserialize;
use std::fmt::Write;
use std::path::{Path, PathBuf};
use std::process::{self, Output};
use walkdir::WalkDir;

fn main() {
    let args = Arguments::from_args();

    let tests = std::iter::empty()
        .chain(find_source_files("schemas"))
        .chain(find_source_files("tests/schemas"))
        .map(|path| {
            let name = path.display().to_string();
            Trial::test(name, move || run_test(&path))
        })
        .collect();

    libtest_mimic::run(&args, tests).exit();
}

#[derive(Deserialize, Debug)]
#[serde(deny_unknown_fields)]
#[serde(rename_all = "kebab-case")]
struct Config {
    #[serde(default = "DEFAULT_IGNORE")]
    ignore: bool,
    #[serde(default = "DEFAULT_EXIT_CODE")]
    exit_code: i32,
    #[serde(default)]
    stderr_contains: Vec<String>,
    #[serde(default = "DEFAULT_EXAMPLE_TYPE")]
    example_type: String,
    #[serde(default)]
    example_data: Vec<String>,
}

const DEFAULT_IGNORE: fn() -> bool = || false;
const DEFAULT_EXIT_CODE: fn() -> i32 = || 0;
const DEFAULT_EXAMPLE_TYPE: fn() -> String = || "ExplorePageInitPayload".to_owned();

struct TestFailure {
    name: &'static str,
    details: Vec<(&'static str, String)>,
}

/// Recursively walk over schema files under a file path.
fn find_source_files(root: impl AsRef<Path>) -> impl Iterator<Item = PathBuf> {
    WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| matches!(entry.path().extension(), Some(ext) if ext == "kiwi"))
        .map(|entry| entry.into_path())
}

fn read_config(schema_file: &Path) -> Result<Config, TestFailure> {
    const CONFIG_COMMENT_START: &str = "//~";

    let source = std::fs::read_to_string(schema_file).map_err(|error| TestFailure {
        name: "unexpected io error",
        details: vec![("std::io::Error", error.to_string())],
    })?;
    // Collect the lines with CONFIG_COMMENT_START prefix, stripping the prefix in the process
    let config_source = source
        .lines()
        .filter_map(|line| line.split(CONFIG_COMMENT_START).nth(1))
        .join("\n");

    // Parse those lines as TOML
    toml::from_str::<Config>(&config_source).map_err(|error| TestFailure {
        name: "config parse error",
        details: vec![("toml::de::Error", error.to_string())],
    })
}

fn run_test(schema_file: &Path) -> Result<(), Failed> {
    let config = match read_config(schema_file) {
        Ok(config) => config,
        Err(failure) => return failures_to_outcome(&[failure]),
    };

    if config.ignore {
        return Ok(());
    }

    let mut failures = Vec::new();
    check_schema(schema_file, &config, &mut failures);

    let base_dir = schema_file.with_file_name("");
    let example_data = globwalk::GlobWalkerBuilder::from_patterns(&base_dir, &config.example_data)
        .sort_by(|a, b| a.file_name().cmp(b.file_name()))
        .build()
        .map_err(|error| Failed::from(format!("invalid example-data pattern: {error}")))?;

    for example_file in example_data.filter_map(Result::ok) {
        round_trip_example(schema_file, &config, example_file.path(), &mut failures);
    }

    failures_to_outcome(&failures)
}

fn atlas_url() -> process::Command {
    process::Command::new(env!("CARGO_BIN_EXE_atlas-url"))
}

fn output_details(command: &process::Command, output: &Output) -> Vec<(&'static str, String)> {
    let mut details = vec![
        ("command", format!("{command:?}")),
        ("status", output.status.to_string()),
    ];
    let stdout = String::from_utf8_lossy(&output.stdout);
    if !stdout.is_empty() {
        details.push(("stdout", stdout.into_owned()));
    }
    let stderr = String::from_utf8_lossy(&output.stderr);
    if !stderr.is_empty() {
        details.push(("stderr", stderr.into_owned()));
    }
    details
}

fn run(command: &mut process::Command, failures: &mut Vec<TestFailure>) -> Option<Output> {
    match command.output() {
        Ok(output) => Some(output),
        Err(error) => {
            failures.push(TestFailure {
                name: "unexpected command error",
                details: vec![("std::io::Error", error.to_string())],
            });
            None
        }
    }
}

fn check_schema(schema_file: &Path, config: &Config, failures: &mut Vec<TestFailure>) {
    let mut command = atlas_url();
    command.arg("check").arg("--schema").arg(schema_file);
    let output = match run(&mut command, failures) {
        Some(output) => output,
        None => return,
    };

    if output.status.code() != Some(config.exit_code) {
        failures.push(TestFailure {
            name: "unexpected exit status",
            details: output_details(&command, &output),
        });
    }

    let stderr = String::from_utf8_lossy(&output.stderr);
    for expected in &config.stderr_contains {
        if !stderr.contains(expected.as_str()) {
            let mut details = vec![("expected", expected.clone())];
            details.extend(output_details(&command, &output));
            failures.push(TestFailure {
                name: "missing diagnostic",
                details,
            });
        }
    }
}

fn round_trip_example(
    schema_file: &Path,
    config: &Config,
    example_file: &Path,
    failures: &mut Vec<TestFailure>,
) {
    let mut encode = atlas_url();
    encode
        .arg("encode")
        .arg("--schema")
        .arg(schema_file)
        .arg("--type")
        .arg(&config.example_type)
        .arg(example_file);
    let encoded = match run(&mut encode, failures) {
        Some(output) if output.status.success() => output,
        Some(output) => {
            failures.push(TestFailure {
                name: "example failed to encode",
                details: output_details(&encode, &output),
            });
            return;
        }
        None => return,
    };
    let token = String::from_utf8_lossy(&encoded.stdout).trim().to_owned();

    let mut decode = atlas_url();
    decode
        .arg("decode")
        .arg("--schema")
        .arg(schema_file)
        .arg("--type")
        .arg(&config.example_type)
        .arg(&token);
    let decoded = match run(&mut decode, failures) {
        Some(output) if output.status.success() => output,
        Some(output) => {
            failures.push(TestFailure {
                name: "example failed to decode",
                details: output_details(&decode, &output),
            });
            return;
        }
        None => return,
    };

    let expected = std::fs::read_to_string(example_file)
        .map_err(|error| error.to_string())
        .and_then(|text| {
            serde_json::from_str::<serde_json::Value>(&text).map_err(|error| error.to_string())
        });
    let actual = serde_json::from_slice::<serde_json::Value>(&decoded.stdout);
    match (expected, actual) {
        (Ok(expected), Ok(actual)) if expected == actual => {}
        (Ok(expected), Ok(actual)) => failures.push(TestFailure {
            name: "example changed in round trip",
            details: vec![
                ("example", example_file.display().to_string()),
                ("token", token),
                ("expected", expected.to_string()),
                ("actual", actual.to_string()),
            ],
        }),
        (Err(error), _) => failures.push(TestFailure {
            name: "invalid example",
            details: vec![("example", example_file.display().to_string()), ("error", error)],
        }),
        (_, Err(error)) => failures.push(TestFailure {
            name: "decoded output is not JSON",
            details: vec![("serde_json::Error", error.to_string())],
        }),
    }
}

fn failures_to_outcome(failures: &[TestFailure]) -> Result<(), Failed> {
    if failures.is_empty() {
        return Ok(());
    }

    let mut msg = String::new();

    writeln!(msg).unwrap();
    for failure in failures {
        writeln!(msg, "    {}:", failure.name).unwrap();
        for (name, data) in &failure.details {
            writeln!(msg, "        ---- {name} ----").unwrap();
            for line in data.lines() {
                writeln!(msg, "        {line}").unwrap();
            }
        }
        writeln!(msg).unwrap();
    }
    writeln!(msg).unwrap();
    writeln!(msg, "    failures:").unwrap();
    for failure in failures {
        writeln!(msg, "        {}", failure.name).unwrap();
    }

    Err(Failed::from(msg))
}
