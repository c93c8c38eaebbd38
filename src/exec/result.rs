// src/exec/result.rs

//! Timestamped results of external-process invocations.

use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};

/// Sentinel exit code recorded when a process could not be started or
/// awaited. Callers must check the accompanying error rather than infer
/// failure from this code alone.
pub const FAILURE_EXIT_CODE: i32 = 1;

/// Outcome of one external-process invocation.
///
/// `stdout`/`stderr` hold captured bytes and stay empty for execution
/// modes that inherit or discard the streams. Timestamps are UTC; the exit
/// code is assigned exactly once per attempt.
#[derive(Debug, Clone, Serialize)]
pub struct ExecutionResult {
    pub program: String,
    pub args: Vec<String>,
    #[serde(serialize_with = "bytes_as_text")]
    pub stdout: Vec<u8>,
    #[serde(serialize_with = "bytes_as_text")]
    pub stderr: Vec<u8>,
    pub code: i32,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
}

fn bytes_as_text<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&String::from_utf8_lossy(bytes))
}

impl ExecutionResult {
    /// A fresh result stamped with the current time.
    pub(crate) fn started(program: impl Into<String>, args: Vec<String>) -> Self {
        let now = Utc::now();
        Self {
            program: program.into(),
            args,
            stdout: Vec::new(),
            stderr: Vec::new(),
            code: 0,
            started_at: now,
            ended_at: now,
        }
    }

    /// Record the exit code and the end timestamp.
    pub(crate) fn finish(&mut self, code: i32) {
        self.code = code;
        self.ended_at = Utc::now();
    }

    /// Captured standard output as text.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.stdout).into_owned()
    }

    /// Captured standard error as text.
    pub fn error_text(&self) -> String {
        String::from_utf8_lossy(&self.stderr).into_owned()
    }

    /// Captured standard output split into lines.
    pub fn lines(&self) -> Vec<String> {
        split_lines(&self.stdout)
    }

    /// Captured standard error split into lines.
    pub fn error_lines(&self) -> Vec<String> {
        split_lines(&self.stderr)
    }

    /// Captured standard output parsed as JSON.
    pub fn json(&self) -> serde_json::Result<serde_json::Value> {
        serde_json::from_slice(&self.stdout)
    }

    /// Captured standard error parsed as JSON.
    pub fn error_json(&self) -> serde_json::Result<serde_json::Value> {
        serde_json::from_slice(&self.stderr)
    }

    pub fn success(&self) -> bool {
        self.code == 0
    }

    /// Fail when the exit code is non-zero.
    pub fn validate(&self) -> anyhow::Result<()> {
        self.validate_with(|result| {
            if result.code != 0 {
                anyhow::bail!(
                    "command {} failed with code {}",
                    result.program,
                    result.code
                );
            }
            Ok(())
        })
    }

    /// Validate with a caller-supplied predicate.
    pub fn validate_with(
        &self,
        check: impl FnOnce(&Self) -> anyhow::Result<()>,
    ) -> anyhow::Result<()> {
        check(self)
    }
}

fn split_lines(bytes: &[u8]) -> Vec<String> {
    let text = String::from_utf8_lossy(bytes);
    text.split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line).to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result_with_stdout(bytes: &[u8]) -> ExecutionResult {
        let mut result = ExecutionResult::started("prog", vec![]);
        result.stdout = bytes.to_vec();
        result
    }

    #[test]
    fn text_and_lines() {
        let result = result_with_stdout(b"one\ntwo\r\nthree");
        assert_eq!(result.text(), "one\ntwo\r\nthree");
        assert_eq!(result.lines(), ["one", "two", "three"]);
    }

    #[test]
    fn json_view() {
        let result = result_with_stdout(br#"{"ok": true}"#);
        let value = result.json().unwrap();
        assert_eq!(value["ok"], serde_json::Value::Bool(true));

        let bad = result_with_stdout(b"not json");
        assert!(bad.json().is_err());
    }

    #[test]
    fn validate_checks_exit_code() {
        let mut result = result_with_stdout(b"");
        assert!(result.validate().is_ok());
        result.code = 3;
        assert!(!result.success());
        assert!(result.validate().is_err());
    }

    #[test]
    fn validate_with_custom_predicate() {
        let mut result = result_with_stdout(b"");
        result.code = 2;
        // Some tools use exit code 2 for "no matches", which a caller may
        // consider fine.
        let ok = result.validate_with(|r| {
            if r.code > 2 {
                anyhow::bail!("unexpected code {}", r.code);
            }
            Ok(())
        });
        assert!(ok.is_ok());
    }

    #[test]
    fn serializes_streams_as_text() {
        let result = result_with_stdout(b"hello");
        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["stdout"], "hello");
        assert_eq!(value["code"], 0);
    }
}
