use crate::compile::{ShaderPreamble, DEFAULT_GLSL_VERSION};

/// Build every stage as a separable program as well (`1`/`true`/`yes`/`on`).
pub const SEPARABLE_PROGRAMS_ENV: &str = "LUMEN_GL_SEPARABLE_PROGRAMS";

/// Replaces the `#version` line submitted ahead of every stage.
pub const GLSL_VERSION_ENV: &str = "LUMEN_GL_GLSL_VERSION";

fn truthy(raw: &str) -> bool {
    let v = raw.trim();
    v == "1"
        || v.eq_ignore_ascii_case("true")
        || v.eq_ignore_ascii_case("yes")
        || v.eq_ignore_ascii_case("on")
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlBackendConfig {
    /// First line of every submitted stage, e.g. `#version 410 core`.
    pub glsl_version: String,
    pub separable_programs: bool,
    /// One define line per program version; version 0 is the default. An empty list behaves
    /// like a single empty define.
    pub version_defines: Vec<String>,
}

impl Default for GlBackendConfig {
    fn default() -> Self {
        Self {
            glsl_version: DEFAULT_GLSL_VERSION.to_owned(),
            separable_programs: false,
            version_defines: vec![String::new()],
        }
    }
}

impl GlBackendConfig {
    /// Defaults, overridden by [`SEPARABLE_PROGRAMS_ENV`] and [`GLSL_VERSION_ENV`].
    pub fn from_env() -> Self {
        Self::default().with_overrides(|name| std::env::var(name).ok())
    }

    fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(raw) = lookup(SEPARABLE_PROGRAMS_ENV) {
            self.separable_programs = truthy(&raw);
        }
        if let Some(raw) = lookup(GLSL_VERSION_ENV) {
            let version = raw.trim();
            if !version.is_empty() {
                self.glsl_version = version.to_owned();
            }
        }
        self
    }

    pub fn with_version_defines<I, S>(mut self, defines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.version_defines = defines.into_iter().map(Into::into).collect();
        self
    }

    pub fn version_count(&self) -> usize {
        self.version_defines.len().max(1)
    }

    pub fn version_define(&self, version: usize) -> &str {
        self.version_defines
            .get(version)
            .map_or("", String::as_str)
    }

    pub fn preamble(&self) -> ShaderPreamble {
        ShaderPreamble::new(self.glsl_version.clone())
    }
}
