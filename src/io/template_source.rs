use anyhow::{Context, anyhow};
use rust_embed::RustEmbed;
use std::collections::HashMap;
use std::path::PathBuf;

/// Where template files come from. Fetching is the only asynchronous part of loading.
#[allow(async_fn_in_trait)]
pub trait TemplateSource {
    async fn fetch(&self, path: &str) -> anyhow::Result<Vec<u8>>;
}

/// Template files below a data directory. Needs to be polled from within a tokio runtime.
#[derive(Debug, Clone)]
pub struct FsTemplateSource {
    root: PathBuf,
}

impl FsTemplateSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl TemplateSource for FsTemplateSource {
    async fn fetch(&self, path: &str) -> anyhow::Result<Vec<u8>> {
        let full_path = self.root.join(path);
        tokio::fs::read(&full_path)
            .await
            .with_context(|| format!("Reading template file {}", full_path.display()))
    }
}

#[derive(RustEmbed)]
#[folder = "assets/templates"]
struct BuiltinTemplates;

/// The template sets compiled into the binary.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmbeddedTemplateSource;

impl EmbeddedTemplateSource {
    pub fn files() -> impl Iterator<Item = String> {
        BuiltinTemplates::iter().map(|file| file.into_owned())
    }
}

impl TemplateSource for EmbeddedTemplateSource {
    async fn fetch(&self, path: &str) -> anyhow::Result<Vec<u8>> {
        BuiltinTemplates::get(path)
            .map(|file| file.data.into_owned())
            .ok_or_else(|| anyhow!("There is no built-in template set {}", path))
    }
}

/// In-memory files, mostly for tests and tools generating sets on the fly.
#[derive(Debug, Clone, Default)]
pub struct MemoryTemplateSource {
    files: HashMap<String, Vec<u8>>,
}

impl MemoryTemplateSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(mut self, path: impl Into<String>, content: impl Into<Vec<u8>>) -> Self {
        self.files.insert(path.into(), content.into());
        self
    }
}

impl TemplateSource for MemoryTemplateSource {
    async fn fetch(&self, path: &str) -> anyhow::Result<Vec<u8>> {
        self.files
            .get(path)
            .cloned()
            .ok_or_else(|| anyhow!("No such file: {}", path))
    }
}
