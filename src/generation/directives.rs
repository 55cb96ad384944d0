//! Dockerfile instruction scanning and directive checks

use crate::analysis::{AnalysisProfile, LanguageFamily};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A single logical Dockerfile instruction, continuations joined
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instruction {
    /// Upper-cased keyword (`FROM`, `RUN`, ...)
    pub keyword: String,
    pub arguments: String,
    /// 1-based line where the instruction starts
    pub line: usize,
}

/// Splits Dockerfile text into instructions.
///
/// Comment lines and blank lines are skipped. Lines ending in `\` are joined
/// with the following line, and comments inside a continuation are dropped.
pub fn parse_instructions(text: &str) -> Vec<Instruction> {
    let mut instructions = Vec::new();
    let mut pending: Option<(usize, String)> = None;

    for (index, raw_line) in text.lines().enumerate() {
        let line = raw_line.trim();

        if line.starts_with('#') || (line.is_empty() && pending.is_none()) {
            continue;
        }

        let (continues, body) = match line.strip_suffix('\\') {
            Some(body) => (true, body.trim_end()),
            None => (false, line),
        };

        let (start, mut logical) = pending.take().unwrap_or((index + 1, String::new()));
        if !logical.is_empty() && !body.is_empty() {
            logical.push(' ');
        }
        logical.push_str(body);

        if continues {
            pending = Some((start, logical));
        } else if let Some(instruction) = to_instruction(start, &logical) {
            instructions.push(instruction);
        }
    }

    if let Some((start, logical)) = pending {
        if let Some(instruction) = to_instruction(start, &logical) {
            instructions.push(instruction);
        }
    }

    instructions
}

fn to_instruction(line: usize, logical: &str) -> Option<Instruction> {
    let logical = logical.trim();
    let (keyword, arguments) = match logical.split_once(char::is_whitespace) {
        Some((keyword, rest)) => (keyword, rest.trim()),
        None => (logical, ""),
    };

    if keyword.is_empty() || !keyword.chars().all(|c| c.is_ascii_alphabetic()) {
        return None;
    }

    Some(Instruction {
        keyword: keyword.to_ascii_uppercase(),
        arguments: arguments.to_string(),
        line,
    })
}

/// Directives checked on a generated artifact
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Directive {
    BaseImage,
    StartCommand,
    UserSwitch,
    PortDeclaration,
    HealthCheck,
}

impl Directive {
    /// Dockerfile keyword(s) satisfying the directive
    pub fn keyword(&self) -> &'static str {
        match self {
            Directive::BaseImage => "FROM",
            Directive::StartCommand => "CMD/ENTRYPOINT",
            Directive::UserSwitch => "USER",
            Directive::PortDeclaration => "EXPOSE",
            Directive::HealthCheck => "HEALTHCHECK",
        }
    }

    /// Directives whose absence makes the artifact unrunnable
    pub fn is_load_bearing(&self) -> bool {
        matches!(self, Directive::BaseImage | Directive::StartCommand)
    }
}

impl fmt::Display for Directive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

/// Presence of each checked directive in an artifact
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectiveReport {
    pub has_base_image: bool,
    pub has_start: bool,
    /// The effective user is neither `root` nor UID 0
    pub has_user: bool,
    pub has_expose: bool,
    pub has_healthcheck: bool,
}

impl DirectiveReport {
    pub fn inspect(text: &str) -> Self {
        Self::from_instructions(&parse_instructions(text))
    }

    pub fn from_instructions(instructions: &[Instruction]) -> Self {
        let has_base_image = instructions
            .iter()
            .find(|i| i.keyword != "ARG")
            .map_or(false, |i| i.keyword == "FROM");

        let has_start = instructions
            .iter()
            .any(|i| i.keyword == "CMD" || i.keyword == "ENTRYPOINT");

        let has_user = instructions
            .iter()
            .rev()
            .find(|i| i.keyword == "USER")
            .map_or(false, |i| is_non_root(&i.arguments));

        Self {
            has_base_image,
            has_start,
            has_user,
            has_expose: instructions.iter().any(|i| i.keyword == "EXPOSE"),
            has_healthcheck: instructions
                .iter()
                .any(|i| i.keyword == "HEALTHCHECK" && !i.arguments.eq_ignore_ascii_case("NONE")),
        }
    }

    pub fn contains(&self, directive: Directive) -> bool {
        match directive {
            Directive::BaseImage => self.has_base_image,
            Directive::StartCommand => self.has_start,
            Directive::UserSwitch => self.has_user,
            Directive::PortDeclaration => self.has_expose,
            Directive::HealthCheck => self.has_healthcheck,
        }
    }

    /// Best-practice directives that are absent, in a fixed order
    pub fn missing_hardening(&self) -> Vec<Directive> {
        [
            Directive::UserSwitch,
            Directive::PortDeclaration,
            Directive::HealthCheck,
        ]
        .into_iter()
        .filter(|d| !self.contains(*d))
        .collect()
    }
}

fn is_non_root(arguments: &str) -> bool {
    let user = arguments
        .split_whitespace()
        .next()
        .and_then(|spec| spec.split(':').next())
        .unwrap_or("");
    !user.is_empty() && user != "root" && user != "0"
}

/// Renders arguments as an exec-form array: `["a", "b"]`
fn exec_form<S: AsRef<str>>(args: &[S]) -> String {
    let quoted: Vec<String> = args
        .iter()
        .map(|arg| serde_json::Value::String(arg.as_ref().to_string()).to_string())
        .collect();
    format!("[{}]", quoted.join(", "))
}

/// Deterministic `CMD` line for a profile whose artifact lacks one.
///
/// Python runs an ASGI server on the profile's port, JavaScript/TypeScript
/// wraps the start command in exec form, and everything else goes through
/// `/bin/sh -c`.
pub fn default_start_directive(profile: &AnalysisProfile, default_port: u16) -> String {
    let start_command = profile.start_command.trim();

    match profile.language_family() {
        LanguageFamily::Python => {
            let port = profile.exposed_port.unwrap_or(default_port).to_string();
            format!(
                "CMD {}",
                exec_form(&[
                    "python", "-m", "uvicorn", "main:app", "--host", "0.0.0.0", "--port", port.as_str(),
                ])
            )
        }
        LanguageFamily::JavaScript => {
            let command = if start_command.is_empty() {
                "node server.js"
            } else {
                start_command
            };
            let args: Vec<&str> = command.split_whitespace().collect();
            format!("CMD {}", exec_form(&args))
        }
        _ => {
            let command = if start_command.is_empty() {
                "echo No start command defined"
            } else {
                start_command
            };
            format!("CMD {}", exec_form(&["/bin/sh", "-c", command]))
        }
    }
}
