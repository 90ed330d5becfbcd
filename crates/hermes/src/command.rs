//! Command-line splitting.
//!
//! An argv is split into positional tokens and `--key[=value]` options.
//! A bare `--flag` is `true`, `--key=value` is the string `value`. A lone
//! `--` ends option parsing; everything after it is positional.
//!
//! Options are never declared up front: every `--key`, known or not, lands
//! in the open options bag handlers read, which a fixed-argument parser
//! such as clap would reject.

use indexmap::IndexMap;
use serde_json::Value;

/// Exit status of a successful command.
pub const EXIT_SUCCESS: i32 = 0;
/// Exit status of a failed command.
pub const EXIT_FAILURE: i32 = 1;
/// Exit status of a command invoked with the wrong arguments.
pub const EXIT_USAGE: i32 = 2;

/// A parsed command line.
///
/// # Example
///
/// ```
/// use hermes::CommandLine;
/// use serde_json::json;
///
/// let line = CommandLine::parse(["migrate", "users", "--force", "--step=2"]);
/// assert_eq!(line.positional(), ["migrate", "users"]);
/// assert_eq!(line.options()["force"], json!(true));
/// assert_eq!(line.options()["step"], json!("2"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandLine {
    positional: Vec<String>,
    options: IndexMap<String, Value>,
}

impl CommandLine {
    /// Splits an argv (without the program name).
    pub fn parse<I, S>(argv: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut line = Self::default();
        let mut options_done = false;

        for arg in argv {
            let arg = arg.as_ref();
            if options_done {
                line.positional.push(arg.to_string());
                continue;
            }
            if arg == "--" {
                options_done = true;
                continue;
            }
            match arg.strip_prefix("--") {
                Some(option) => {
                    let (key, value) = match option.split_once('=') {
                        Some((key, value)) => (key, Value::String(value.to_string())),
                        None => (option, Value::Bool(true)),
                    };
                    line.options.insert(key.to_string(), value);
                }
                None => line.positional.push(arg.to_string()),
            }
        }

        line
    }

    /// Positional tokens in order.
    #[must_use]
    pub fn positional(&self) -> &[String] {
        &self.positional
    }

    /// The options bag.
    #[must_use]
    pub fn options(&self) -> &IndexMap<String, Value> {
        &self.options
    }

    /// The positional tokens joined by single spaces.
    #[must_use]
    pub fn line(&self) -> String {
        self.positional.join(" ")
    }

    /// Splits into positional tokens and options.
    #[must_use]
    pub fn into_parts(self) -> (Vec<String>, IndexMap<String, Value>) {
        (self.positional, self.options)
    }
}

/// What a command dispatch prints and exits with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    /// Process exit status.
    pub status: i32,
    /// Text for the terminal.
    pub text: String,
}

impl CommandOutput {
    /// A successful result.
    pub fn success(text: impl Into<String>) -> Self {
        Self {
            status: EXIT_SUCCESS,
            text: text.into(),
        }
    }

    /// A failed result.
    pub fn failure(text: impl Into<String>) -> Self {
        Self {
            status: EXIT_FAILURE,
            text: text.into(),
        }
    }

    /// A usage failure.
    pub fn usage(text: impl Into<String>) -> Self {
        Self {
            status: EXIT_USAGE,
            text: text.into(),
        }
    }

    /// True when the status is zero.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status == EXIT_SUCCESS
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_mixed() {
        let line = CommandLine::parse(["user:create", "--admin", "ada", "--team=core"]);
        assert_eq!(line.positional(), ["user:create", "ada"]);
        assert_eq!(line.options()["admin"], json!(true));
        assert_eq!(line.options()["team"], json!("core"));
        assert_eq!(line.line(), "user:create ada");
    }

    #[test]
    fn test_empty_value_is_empty_string() {
        let line = CommandLine::parse(["run", "--env="]);
        assert_eq!(line.options()["env"], json!(""));
    }

    #[test]
    fn test_double_dash_ends_options() {
        let line = CommandLine::parse(["echo", "--", "--loud"]);
        assert_eq!(line.positional(), ["echo", "--loud"]);
        assert!(line.options().is_empty());
    }

    #[test]
    fn test_undeclared_options_are_kept_in_order() {
        let line = CommandLine::parse(["deploy", "--zone=eu", "--dry-run", "--zone=us"]);
        let keys: Vec<&str> = line.options().keys().map(String::as_str).collect();
        assert_eq!(keys, ["zone", "dry-run"]);
        assert_eq!(line.options()["zone"], json!("us"));
    }

    #[test]
    fn test_single_dash_is_positional() {
        let line = CommandLine::parse(["cat", "-"]);
        assert_eq!(line.positional(), ["cat", "-"]);
    }

    #[test]
    fn test_output_status() {
        assert!(CommandOutput::success("ok").is_success());
        assert_eq!(CommandOutput::failure("no").status, EXIT_FAILURE);
        assert_eq!(CommandOutput::usage("no").status, EXIT_USAGE);
    }
}
