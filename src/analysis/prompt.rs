//! Stage-1 prompts: repository signals in, deployment profile out

use super::types::RawRepositoryData;
use crate::llm::SchemaDescriptor;
use serde_json::Value;
use std::collections::BTreeMap;

const EXAMPLE_OUTPUT: &str = r#"{
  "language": "JavaScript",
  "framework": "Express",
  "runtime_version": "nodejs-20",
  "package_manager": "npm",
  "dependencies": {"express": "^4.18.0", "mongoose": "^7.0.0"},
  "exposed_port": 3000,
  "environment_variables": ["PORT", "DB_URI", "JWT_SECRET"],
  "health_check_path": "/health",
  "build_command": null,
  "start_command": "node server.js"
}"#;

/// Limits applied while rendering repository data into the prompt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PromptLimits {
    /// Number of leading file entries listed
    pub file_sample: usize,
    /// Characters of an existing Dockerfile embedded
    pub dockerfile_excerpt: usize,
}

impl Default for PromptLimits {
    fn default() -> Self {
        Self {
            file_sample: 100,
            dockerfile_excerpt: 1000,
        }
    }
}

pub struct PromptBuilder;

impl PromptBuilder {
    /// System instruction embedding the profile's JSON schema
    pub fn analysis_instruction(shape: &SchemaDescriptor) -> String {
        let schema = serde_json::to_string_pretty(&shape.schema).unwrap_or_default();

        format!(
            r#"You are an expert DevOps engineer specializing in application deployment.

Your task is to analyze a GitHub repository's structure and contents to determine its deployment requirements.

You will receive:
1. A list of files in the repository
2. Contents of key configuration files (package.json, requirements.txt, etc.)
3. Existing Dockerfile content (if present)

You MUST respond with ONLY a valid JSON object that EXACTLY matches this schema:

{schema}

CRITICAL RULES:
- Respond with ONLY valid JSON matching the schema above
- No markdown, no explanations, no code blocks, no extra text
- Use production-ready runtime versions (e.g., "python-3.11", "nodejs-20")
- Infer port from framework defaults (FastAPI: 8000, Express: 3000, Next.js: 3000, Flask: 5000)
- Extract env vars from .env.example or config files - output as simple string array
- dependencies MUST be a flat object like {{"express": "4.18.0", "react": "18.2.0"}}
- environment_variables MUST be a list of strings like ["VAR1", "VAR2"]
- Provide complete, working start commands (e.g., "npm start", "uvicorn main:app --host 0.0.0.0 --port 8000")
- If you see an existing Dockerfile, respect its exposed port and commands

EXAMPLE OUTPUT:
{example}
"#,
            schema = schema,
            example = EXAMPLE_OUTPUT,
        )
    }

    /// Task prompt carrying the repository signals.
    ///
    /// Only the first `limits.file_sample` paths are listed, but the header
    /// always reports the full file count.
    pub fn analysis_prompt(repo: &RawRepositoryData, limits: PromptLimits) -> String {
        let total = repo.files.len();
        let sample: Vec<&str> = repo
            .files
            .iter()
            .take(limits.file_sample)
            .map(|f| f.path.as_str())
            .collect();

        let file_list = serde_json::to_string_pretty(&sample).unwrap_or_else(|_| "[]".to_string());

        let dockerfile_section = repo
            .existing_dockerfile
            .as_deref()
            .filter(|content| !content.trim().is_empty())
            .map(|content| {
                let excerpt: String = content.chars().take(limits.dockerfile_excerpt).collect();
                format!("\n**Existing Dockerfile:**\n```\n{}\n```\n", excerpt)
            })
            .unwrap_or_default();

        let detected = repo
            .detected_language
            .as_deref()
            .filter(|lang| !lang.trim().is_empty())
            .unwrap_or("Not detected - please infer from files");

        format!(
            r#"Analyze this GitHub repository and extract deployment requirements.

**Repository:** {name}

**File Structure (sample of {sampled}/{total} files):**
{file_list}

**Package Manager Files:**
{package_files}

**Configuration Files:**
{config_files}
{dockerfile_section}
**Detected Language:** {detected}

Provide your analysis as a JSON object matching the schema in your instructions.
"#,
            name = repo.full_name(),
            sampled = sample.len(),
            total = total,
            file_list = file_list,
            package_files = render_files(&repo.package_files),
            config_files = render_files(&repo.config_files),
            dockerfile_section = dockerfile_section,
            detected = detected,
        )
    }
}

/// Filename to content map as pretty JSON, `{}` when empty
fn render_files(files: &BTreeMap<String, String>) -> String {
    if files.is_empty() {
        return "{}".to_string();
    }
    let object: serde_json::Map<String, Value> = files
        .iter()
        .map(|(name, content)| (name.clone(), Value::String(content.clone())))
        .collect();
    serde_json::to_string_pretty(&object).unwrap_or_else(|_| "{}".to_string())
}
