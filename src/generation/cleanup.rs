//! Removal of formatting artifacts from generated Dockerfile text

use regex::Regex;
use std::sync::OnceLock;

const FENCE: &str = "```";

fn fenced_block_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?s)```(?:[Dd]ockerfile|docker)?[ \t]*\r?\n(.*?)```").expect("valid regex")
    })
}

/// Returns true when `line` opens with the given instruction keyword.
///
/// Case-sensitive: prose such as "From the analysis..." must not match.
fn starts_with_keyword(line: &str, keyword: &str) -> bool {
    line.trim_start()
        .strip_prefix(keyword)
        .map_or(false, |rest| rest.is_empty() || rest.starts_with(char::is_whitespace))
}

/// Strips markdown fences and any prose preceding the first `FROM`/`ARG` line.
///
/// When no such line exists the text is returned trimmed but otherwise intact,
/// leaving rejection to the length and base-image checks.
pub fn strip_formatting(raw: &str) -> String {
    let mut text = raw.to_string();

    if text.contains(FENCE) {
        text = match fenced_block_re()
            .captures(&text)
            .and_then(|captures| captures.get(1))
        {
            Some(inner) => inner.as_str().trim().to_string(),
            None => text
                .replace("```dockerfile", "")
                .replace("```Dockerfile", "")
                .replace(FENCE, "")
                .trim()
                .to_string(),
        };
    }

    let lines: Vec<&str> = text.lines().collect();
    let first_instruction = lines
        .iter()
        .position(|line| starts_with_keyword(line, "FROM") || starts_with_keyword(line, "ARG"));

    match first_instruction {
        Some(index) if index > 0 => lines[index..].join("\n").trim().to_string(),
        _ => text.trim().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_dockerfile_untouched() {
        let text = "FROM node:20-alpine\nWORKDIR /app\nCMD [\"node\", \"server.js\"]";
        assert_eq!(strip_formatting(text), text);
    }

    #[test]
    fn test_fenced_block_with_leading_prose() {
        let raw = "Here is your production Dockerfile:\n\n```dockerfile\nFROM python:3.11-slim AS builder\nWORKDIR /app\n```\n\nLet me know if you need changes.";
        let cleaned = strip_formatting(raw);
        assert_eq!(cleaned, "FROM python:3.11-slim AS builder\nWORKDIR /app");
        assert_eq!(
            cleaned.lines().find(|l| !l.trim().is_empty()),
            Some("FROM python:3.11-slim AS builder")
        );
    }

    #[test]
    fn test_only_first_fenced_block_kept() {
        let raw = "```\nFROM golang:1.22 AS build\n```\nand a compose file:\n```yaml\nservices: {}\n```";
        assert_eq!(strip_formatting(raw), "FROM golang:1.22 AS build");
    }

    #[test]
    fn test_prose_inside_fence_removed() {
        let raw = "```dockerfile\n# Multi-stage build for the API\nThis builds the app.\nARG NODE_VERSION=20\nFROM node:${NODE_VERSION}-alpine\n```";
        assert_eq!(
            strip_formatting(raw),
            "ARG NODE_VERSION=20\nFROM node:${NODE_VERSION}-alpine"
        );
    }

    #[test]
    fn test_unterminated_fence_markers_stripped() {
        let raw = "```dockerfile FROM node:20-alpine\nWORKDIR /app";
        let cleaned = strip_formatting(raw);
        assert!(!cleaned.contains("```"));
        assert!(cleaned.starts_with("FROM node:20-alpine"));
    }

    #[test]
    fn test_leading_prose_without_fence() {
        let raw = "Sure! Below is the file.\nFROM ruby:3.3-slim\nCMD [\"ruby\", \"app.rb\"]";
        assert_eq!(
            strip_formatting(raw),
            "FROM ruby:3.3-slim\nCMD [\"ruby\", \"app.rb\"]"
        );
    }

    #[test]
    fn test_keyword_is_case_sensitive() {
        let raw = "From the analysis, here is a plan.\nfrom scratch";
        assert_eq!(strip_formatting(raw), raw);
    }

    #[test]
    fn test_no_instruction_is_noop() {
        let raw = "  I cannot generate a Dockerfile for this project.  ";
        assert_eq!(
            strip_formatting(raw),
            "I cannot generate a Dockerfile for this project."
        );
    }
}
