//! Reference resolution: fetch the lookup page, extract the passage, clean it.
//!
//! ```text
//! "Juan 3:16" ──▶ PassageFetcher ──▶ extract_passage ──▶ clean_verse ──▶ text
//!                  (HTTP GET)         (passage-text)     (rule chain)
//! ```
//!
//! References are passed through unvalidated; a malformed one fails only
//! when the page comes back without a passage. Nothing is retried or cached.

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::clean::{clean_with, CleaningRule, CHAPTER_RULES, VERSE_RULES};
use crate::config::{Config, PassageConfig};
use crate::error::ResolveError;
use crate::extract::{extract_passage, ExtractError};
use crate::fetch::PassageFetcher;

/// Whether a reference names a single verse or a whole chapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassageKind {
    Verse,
    Chapter,
}

impl PassageKind {
    pub fn rules(self) -> &'static [CleaningRule] {
        match self {
            PassageKind::Verse => VERSE_RULES,
            PassageKind::Chapter => CHAPTER_RULES,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ReferenceResolver {
    fetcher: PassageFetcher,
    version: String,
}

impl ReferenceResolver {
    pub fn new(fetcher: PassageFetcher, version: impl Into<String>) -> Self {
        Self {
            fetcher,
            version: version.into(),
        }
    }

    pub fn from_config(config: &PassageConfig) -> Result<Self> {
        let fetcher = PassageFetcher::from_config(config)
            .context("Failed to build HTTP client for passage lookups")?;
        Ok(Self::new(fetcher, config.version.clone()))
    }

    /// Same resolver, different translation code.
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub async fn resolve_verse(&self, reference: &str) -> Result<String, ResolveError> {
        self.resolve(reference, PassageKind::Verse).await
    }

    pub async fn resolve_chapter(&self, reference: &str) -> Result<String, ResolveError> {
        self.resolve(reference, PassageKind::Chapter).await
    }

    pub async fn resolve(&self, reference: &str, kind: PassageKind) -> Result<String, ResolveError> {
        let markup = self.fetcher.fetch(reference, &self.version).await?;

        let raw = extract_passage(&markup).map_err(|e| match e {
            ExtractError::MissingContainer => ResolveError::NotFound {
                reference: reference.to_string(),
            },
        })?;

        let text = clean_with(kind.rules(), &raw);
        if text.is_empty() {
            warn!(reference, "passage container was empty after cleanup");
            return Err(ResolveError::NotFound {
                reference: reference.to_string(),
            });
        }

        info!(reference, version = %self.version, ?kind, chars = text.chars().count(), "resolved passage");
        Ok(text)
    }
}

/// CLI entry point: resolve and print a passage.
pub async fn run_passage(
    config: &Config,
    reference: &str,
    kind: PassageKind,
    translation: Option<String>,
) -> Result<()> {
    let mut resolver = ReferenceResolver::from_config(&config.passage)?;
    if let Some(version) = translation {
        resolver = resolver.with_version(version);
    }

    let text = resolver.resolve(reference, kind).await?;

    println!("{} ({})", reference, resolver.version());
    println!();
    println!("{}", text);
    Ok(())
}
