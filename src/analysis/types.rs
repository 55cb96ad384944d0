use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A single entry of the repository file listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileDescriptor {
    pub path: String,
    /// Whatever the hosting API reported alongside the path (size, sha, type)
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, String>,
}

impl FileDescriptor {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            metadata: BTreeMap::new(),
        }
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

/// Repository signals gathered by the source-hosting collaborator.
///
/// Immutable for the duration of an analysis call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawRepositoryData {
    pub owner: String,
    pub repo: String,
    #[serde(default)]
    pub files: Vec<FileDescriptor>,
    /// Package-manager manifests and lockfiles, keyed by filename
    #[serde(default)]
    pub package_files: BTreeMap<String, String>,
    #[serde(default)]
    pub config_files: BTreeMap<String, String>,
    #[serde(default)]
    pub existing_dockerfile: Option<String>,
    #[serde(default)]
    pub detected_language: Option<String>,
}

impl RawRepositoryData {
    pub fn new(owner: impl Into<String>, repo: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            repo: repo.into(),
            ..Default::default()
        }
    }

    pub fn with_files<I, S>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.files
            .extend(paths.into_iter().map(|p| FileDescriptor::new(p)));
        self
    }

    pub fn with_package_file(mut self, name: impl Into<String>, content: impl Into<String>) -> Self {
        self.package_files.insert(name.into(), content.into());
        self
    }

    pub fn with_config_file(mut self, name: impl Into<String>, content: impl Into<String>) -> Self {
        self.config_files.insert(name.into(), content.into());
        self
    }

    pub fn with_dockerfile(mut self, content: impl Into<String>) -> Self {
        self.existing_dockerfile = Some(content.into());
        self
    }

    pub fn with_detected_language(mut self, language: impl Into<String>) -> Self {
        self.detected_language = Some(language.into());
        self
    }

    /// `owner/repo`
    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner, self.repo)
    }

    pub fn manifest_names(&self) -> Vec<String> {
        self.package_files.keys().cloned().collect()
    }
}

fn default_health_check_path() -> String {
    "/".to_string()
}

/// Deployment requirements inferred from a repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct AnalysisProfile {
    /// Primary language (e.g., 'Python', 'JavaScript', 'TypeScript')
    pub language: String,
    /// Web framework (e.g., 'FastAPI', 'Express', 'Next.js')
    #[serde(default)]
    pub framework: Option<String>,
    /// Runtime version (e.g., 'python-3.11', 'nodejs-20')
    #[serde(default)]
    pub runtime_version: Option<String>,
    /// Package manager (e.g., 'pip', 'npm', 'yarn', 'pnpm')
    pub package_manager: String,
    /// Key dependencies as a flat map of name to version
    #[serde(default)]
    pub dependencies: BTreeMap<String, String>,
    /// Application port (e.g., 3000, 8000, 8080)
    #[serde(default)]
    pub exposed_port: Option<u16>,
    /// Required environment variable names as simple strings
    #[serde(default)]
    pub environment_variables: Vec<String>,
    /// Health check endpoint
    #[serde(default = "default_health_check_path")]
    pub health_check_path: String,
    /// Build command if needed
    #[serde(default)]
    pub build_command: Option<String>,
    /// Production start command
    pub start_command: String,
}

impl AnalysisProfile {
    pub fn language_family(&self) -> LanguageFamily {
        LanguageFamily::from_language(&self.language)
    }

    /// Framework name, or a generic label derived from the language
    pub fn framework_label(&self) -> String {
        match self.framework.as_deref().map(str::trim) {
            Some(framework) if !framework.is_empty() => framework.to_string(),
            _ => format!("Generic {}", self.language),
        }
    }
}

/// Coarse language grouping driving package-manager and start-command defaults
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LanguageFamily {
    JavaScript,
    Python,
    Go,
    Java,
    Other,
}

impl LanguageFamily {
    /// Classifies a free-form language name (case-insensitive).
    ///
    /// JavaScript is tested before Java so that "JavaScript" never lands in
    /// the JVM family.
    pub fn from_language(language: &str) -> Self {
        let lang = language.trim().to_lowercase();
        if lang.contains("javascript") || lang.contains("typescript") || lang.contains("node") {
            LanguageFamily::JavaScript
        } else if lang.contains("python") {
            LanguageFamily::Python
        } else if lang == "go" || lang.contains("golang") {
            LanguageFamily::Go
        } else if lang.contains("java") {
            LanguageFamily::Java
        } else {
            LanguageFamily::Other
        }
    }
}

impl fmt::Display for LanguageFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LanguageFamily::JavaScript => "javascript",
            LanguageFamily::Python => "python",
            LanguageFamily::Go => "go",
            LanguageFamily::Java => "java",
            LanguageFamily::Other => "other",
        };
        f.write_str(name)
    }
}
