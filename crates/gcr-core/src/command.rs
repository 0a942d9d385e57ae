//! Command parsing and colour forcing for captured output.

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{GcrError, Result};

/// A single program invocation: token 0 is the program.
///
/// Serializes as its token list; deserializing goes through [`CommandSpec::new`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct CommandSpec {
    tokens: Vec<String>,
}

impl CommandSpec {
    /// Build from explicit tokens. The token list must not be empty.
    pub fn new(tokens: Vec<String>) -> Result<Self> {
        if tokens.is_empty() || tokens[0].is_empty() {
            return Err(GcrError::InvalidCommand("command is empty".to_string()));
        }
        Ok(Self { tokens })
    }

    /// Split a shell-style command line (POSIX quoting rules).
    pub fn parse(line: &str) -> Result<Self> {
        let tokens = shlex::split(line)
            .ok_or_else(|| GcrError::InvalidCommand(format!("unbalanced quotes in '{line}'")))?;
        Self::new(tokens)
    }

    pub fn program(&self) -> &str {
        &self.tokens[0]
    }

    pub fn args(&self) -> &[String] {
        &self.tokens[1..]
    }

    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    /// File name of the program, so `/usr/bin/git` matches `git`.
    fn program_name(&self) -> &str {
        Path::new(self.program())
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or(self.program())
    }
}

impl TryFrom<Vec<String>> for CommandSpec {
    type Error = GcrError;

    fn try_from(tokens: Vec<String>) -> Result<Self> {
        Self::new(tokens)
    }
}

impl From<CommandSpec> for Vec<String> {
    fn from(command: CommandSpec) -> Self {
        command.tokens
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let quoted: Vec<String> = self
            .tokens
            .iter()
            .map(|t| shlex::try_quote(t).map(|q| q.into_owned()).unwrap_or_else(|_| t.clone()))
            .collect();
        write!(f, "{}", quoted.join(" "))
    }
}

/// How a known program is coaxed into colour while its output is piped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorRule {
    /// Insert flags right after the program name, before any subcommand.
    Prepend(&'static [&'static str]),
    /// Append one flag after the caller's arguments.
    Append(&'static str),
    /// Leave the command alone.
    Passthrough,
}

const GIT_COLOR_FLAGS: &[&str] = &[
    "-c",
    "color.ui=always",
    "-c",
    "color.diff=always",
    "-c",
    "color.status=always",
];

/// Known programs and their colour rules. Extend by adding entries.
pub const COLOR_RULES: &[(&str, ColorRule)] = &[
    ("git", ColorRule::Prepend(GIT_COLOR_FLAGS)),
    ("pytest", ColorRule::Append("--color=yes")),
    ("py.test", ColorRule::Append("--color=yes")),
    ("mypy", ColorRule::Append("--color-output")),
];

/// Look up the colour rule for a program name.
pub fn color_rule(program: &str) -> ColorRule {
    COLOR_RULES
        .iter()
        .find(|(name, _)| *name == program)
        .map(|(_, rule)| *rule)
        .unwrap_or(ColorRule::Passthrough)
}

/// Rewrite `command` so captured output keeps its colour.
///
/// Without capture the program sees the terminal directly and the command
/// is returned unchanged.
pub fn normalize(command: &CommandSpec, will_capture_output: bool) -> CommandSpec {
    if !will_capture_output {
        return command.clone();
    }

    let tokens = match color_rule(command.program_name()) {
        ColorRule::Prepend(flags) => {
            let mut tokens = Vec::with_capacity(command.tokens.len() + flags.len());
            tokens.push(command.tokens[0].clone());
            tokens.extend(flags.iter().map(|f| f.to_string()));
            tokens.extend(command.tokens[1..].iter().cloned());
            tokens
        }
        ColorRule::Append(flag) => {
            let mut tokens = command.tokens.clone();
            tokens.push(flag.to_string());
            tokens
        }
        ColorRule::Passthrough => command.tokens.clone(),
    };

    CommandSpec { tokens }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cmd(tokens: &[&str]) -> CommandSpec {
        CommandSpec::new(tokens.iter().map(|t| t.to_string()).collect()).unwrap()
    }

    #[test]
    fn test_git_flags_go_before_subcommand() {
        let normalized = normalize(&cmd(&["git", "status"]), true);
        assert_eq!(
            normalized.tokens(),
            &[
                "git",
                "-c",
                "color.ui=always",
                "-c",
                "color.diff=always",
                "-c",
                "color.status=always",
                "status"
            ]
        );
    }

    #[test]
    fn test_no_capture_leaves_command_unchanged() {
        let original = cmd(&["git", "status"]);
        assert_eq!(normalize(&original, false), original);
    }

    #[test]
    fn test_pytest_flag_is_appended() {
        let normalized = normalize(&cmd(&["pytest", "-x", "tests/"]), true);
        assert_eq!(normalized.tokens(), &["pytest", "-x", "tests/", "--color=yes"]);
    }

    #[test]
    fn test_unknown_program_passes_through() {
        let original = cmd(&["make", "test"]);
        assert_eq!(normalize(&original, true), original);
    }

    #[test]
    fn test_program_matched_by_file_name() {
        let normalized = normalize(&cmd(&["/usr/bin/git", "log"]), true);
        assert_eq!(normalized.program(), "/usr/bin/git");
        assert_eq!(normalized.args()[0], "-c");
        assert_eq!(normalized.args().last().unwrap(), "log");
    }

    #[test]
    fn test_parse_honours_quotes() {
        let parsed = CommandSpec::parse(r#"grep -r "def main" src"#).unwrap();
        assert_eq!(parsed.tokens(), &["grep", "-r", "def main", "src"]);
    }

    #[test]
    fn test_parse_rejects_empty_and_unbalanced() {
        assert!(matches!(CommandSpec::parse("   "), Err(GcrError::InvalidCommand(_))));
        assert!(matches!(CommandSpec::parse("echo 'oops"), Err(GcrError::InvalidCommand(_))));
    }

    #[test]
    fn test_display_requotes_tokens() {
        let parsed = CommandSpec::parse(r#"grep -r "def main" src"#).unwrap();
        let shown = parsed.to_string();
        assert!(shown.starts_with("grep -r "));
        assert_eq!(CommandSpec::parse(&shown).unwrap(), parsed);
    }

    #[test]
    fn test_deserialize_validates_tokens() {
        let parsed: CommandSpec = serde_json::from_str(r#"["make", "test"]"#).unwrap();
        assert_eq!(parsed, cmd(&["make", "test"]));
        assert_eq!(serde_json::to_string(&parsed).unwrap(), r#"["make","test"]"#);

        assert!(serde_json::from_str::<CommandSpec>("[]").is_err());
        assert!(serde_json::from_str::<CommandSpec>(r#"[""]"#).is_err());
        assert!(serde_json::from_str::<CommandSpec>(r#"{"tokens":[]}"#).is_err());
    }

    #[test]
    fn test_color_rule_lookup() {
        assert!(matches!(color_rule("git"), ColorRule::Prepend(_)));
        assert_eq!(color_rule("mypy"), ColorRule::Append("--color-output"));
        assert_eq!(color_rule("cargo"), ColorRule::Passthrough);
    }
}
