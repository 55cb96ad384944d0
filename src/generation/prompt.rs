//! Stage-2 prompts: deployment profile in, Dockerfile text out

use crate::analysis::{AnalysisProfile, PromptBuilder};

const GENERATION_INSTRUCTION: &str = r#"You are a senior DevOps/Security engineer who creates production-hardened Docker images.

CRITICAL OUTPUT FORMAT:
- Output ONLY the raw Dockerfile content
- Start with FROM instruction
- NO markdown (no ```, no ```dockerfile)
- NO explanations before or after the Dockerfile
- Raw text that can be saved directly as "Dockerfile"

MANDATORY SECURITY REQUIREMENTS:
1. **Multi-stage build**: Separate builder and runtime stages to minimize attack surface
2. **Non-root user**: Create and switch to non-root user (UID 1001) before CMD
3. **Minimal base**: Use slim/alpine variants (node:20-alpine, python:3.11-slim)
4. **No secrets**: Never hardcode credentials, tokens, or API keys
5. **Explicit versions**: Tag all base images (NEVER :latest)

PERFORMANCE REQUIREMENTS:
1. **Layer caching**: COPY package files before source code
2. **Multi-stage**: Only copy production artifacts to runtime stage
3. **Production deps**: Install only production dependencies
4. **Clean cache**: Remove package manager caches

PRODUCTION REQUIREMENTS:
1. **HEALTHCHECK**: Required for container orchestration
2. **EXPOSE**: Document container port
3. **CMD exec form**: Use ["exec", "form"] not shell form
4. **WORKDIR**: Set working directory explicitly

FRAMEWORK-SPECIFIC PATTERNS:

**Node.js/Express/Next.js:**
FROM node:20-alpine AS builder
WORKDIR /app
COPY package*.json ./
RUN npm ci --only=production && npm cache clean --force
COPY . .

FROM node:20-alpine AS runtime
WORKDIR /app
COPY --from=builder /app/node_modules ./node_modules
COPY --from=builder /app/package*.json ./
COPY --from=builder /app/server.js ./server.js
RUN addgroup -g 1001 -S nodejs && \
    adduser -S nodejs -u 1001 && \
    chown -R nodejs:nodejs /app
USER nodejs
EXPOSE 3000
HEALTHCHECK --interval=30s --timeout=3s --start-period=5s --retries=3 \
  CMD node -e "require('http').get('http://localhost:3000/health', (r) => process.exit(r.statusCode === 200 ? 0 : 1))"
CMD ["node", "server.js"]

**Python/FastAPI:**
FROM python:3.11-slim AS builder
WORKDIR /app
COPY requirements.txt .
RUN pip install --no-cache-dir --user -r requirements.txt

FROM python:3.11-slim AS runtime
WORKDIR /app
COPY --from=builder /root/.local /root/.local
COPY . .
RUN useradd -m -u 1001 appuser && \
    chown -R appuser:appuser /app
ENV PATH=/root/.local/bin:$PATH
USER appuser
EXPOSE 8000
HEALTHCHECK --interval=30s --timeout=3s CMD python -c "import urllib.request; urllib.request.urlopen('http://localhost:8000/health')"
CMD ["uvicorn", "main:app", "--host", "0.0.0.0", "--port", "8000"]

Generate a Dockerfile following these exact patterns and security requirements.

CRITICAL: Your Dockerfile MUST include:
1. Multi-stage build (builder and runtime stages)
2. RUN command with adduser/addgroup
3. USER directive
4. EXPOSE directive
5. HEALTHCHECK directive
6. CMD directive with exec form ["command", "args"]

DO NOT generate incomplete Dockerfiles. Include ALL sections.
"#;

impl PromptBuilder {
    /// System instruction carrying the hardening requirements and reference
    /// Dockerfiles
    pub fn generation_instruction() -> &'static str {
        GENERATION_INSTRUCTION
    }

    /// Task prompt describing the application to containerize.
    ///
    /// At most `dependency_limit` dependencies are listed. They are taken in
    /// alphabetical order of name, so the cap keeps the first names rather than
    /// the most important ones.
    pub fn generation_prompt(
        profile: &AnalysisProfile,
        default_port: u16,
        dependency_limit: usize,
    ) -> String {
        let dependencies = profile
            .dependencies
            .iter()
            .take(dependency_limit)
            .map(|(name, version)| format!("- {}: {}", name, version))
            .collect::<Vec<_>>()
            .join("\n");

        let environment = if profile.environment_variables.is_empty() {
            "None".to_string()
        } else {
            profile.environment_variables.join(", ")
        };

        format!(
            r#"Generate a production Dockerfile for this application:

**Application Details:**
Language: {language}
Framework: {framework}
Runtime Version: {runtime}
Package Manager: {package_manager}
Exposed Port: {port}
Start Command: {start}
Build Command: {build}
Health Check Path: {health}

**Key Dependencies:**
{dependencies}

**Required Environment Variables:**
{environment}

Generate a COMPLETE, secure, production-ready Dockerfile following the patterns in your instructions.
MUST include: multi-stage build, non-root user, HEALTHCHECK, EXPOSE, and CMD directives.

IMPORTANT: The CMD directive is MANDATORY. Do not generate an incomplete Dockerfile.

OUTPUT ONLY THE COMPLETE DOCKERFILE - NO MARKDOWN, NO EXPLANATIONS."#,
            language = profile.language,
            framework = profile.framework_label(),
            runtime = profile.runtime_version.as_deref().unwrap_or("latest stable"),
            package_manager = profile.package_manager,
            port = profile.exposed_port.unwrap_or(default_port),
            start = profile.start_command,
            build = profile.build_command.as_deref().unwrap_or("None required"),
            health = profile.health_check_path,
            dependencies = dependencies,
            environment = environment,
        )
    }
}
