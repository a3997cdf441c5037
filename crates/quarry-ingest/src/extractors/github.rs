//! `github` sources: a repository branch downloaded as one archive.

use super::archive::documents_from_zip;
use super::{blocking, required_location, store_documents, ExtractorContext};
use crate::error::{ExtractError, ExtractResult};
use crate::registry::{ExtractionSummary, Extractor};
use async_trait::async_trait;
use quarry_core::{RagSettings, SourceDescriptor};
use std::sync::Arc;
use tracing::info;

const API_BASE: &str = "https://api.github.com";
const DEFAULT_BRANCH: &str = "main";

/// Split `owner/repo`, `github.com/owner/repo` or a full GitHub URL into
/// owner and repository name.
pub fn parse_repo(location: &str) -> Option<(String, String)> {
    let trimmed = location.trim().trim_end_matches('/');
    let path = ["https://", "http://"]
        .iter()
        .find_map(|scheme| trimmed.strip_prefix(scheme))
        .unwrap_or(trimmed);
    let path = path
        .strip_prefix("www.github.com/")
        .or_else(|| path.strip_prefix("github.com/"))
        .unwrap_or(path);

    let mut parts = path.split('/');
    let owner = parts.next()?.trim();
    let repo = parts.next()?.trim().trim_end_matches(".git");

    let valid = |s: &str, extra: &[char]| {
        !s.is_empty()
            && s
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || extra.contains(&c))
    };
    if !valid(owner, &['_']) || !valid(repo, &['_', '.']) {
        return None;
    }
    Some((owner.to_string(), repo.to_string()))
}

/// Options: `branch` (default `main`), `is_private`, `token`. A private
/// repository needs a token, from the options or from `[github] token`.
pub struct GithubExtractor {
    ctx: Arc<ExtractorContext>,
}

impl GithubExtractor {
    pub fn new(ctx: Arc<ExtractorContext>) -> Self {
        Self { ctx }
    }

    fn token<'a>(&'a self, source: &'a SourceDescriptor) -> ExtractResult<Option<&'a str>> {
        let token = source
            .option_str("token")
            .filter(|t| !t.is_empty())
            .or(self.ctx.github_token.as_deref());

        if source.option_bool("is_private").unwrap_or(false) && token.is_none() {
            return Err(ExtractError::MissingField {
                source_type: source.normalized_type(),
                field: "token",
            });
        }
        Ok(token)
    }
}

#[async_trait]
impl Extractor for GithubExtractor {
    async fn extract(
        &self,
        source: &SourceDescriptor,
        settings: &RagSettings,
    ) -> ExtractResult<ExtractionSummary> {
        let location = required_location(source)?;
        let (owner, repo) = parse_repo(location).ok_or_else(|| ExtractError::InvalidField {
            field: "location",
            message: format!("not a GitHub repository: {}", location),
        })?;
        let branch = source
            .option_str("branch")
            .filter(|b| !b.trim().is_empty())
            .unwrap_or(DEFAULT_BRANCH);
        let token = self.token(source)?;

        let url = format!("{}/repos/{}/{}/zipball/{}", API_BASE, owner, repo, branch);
        info!("Downloading {}/{}@{}", owner, repo, branch);

        let data = self.ctx.fetcher.get_bytes(&url, token).await?;
        let documents = blocking(move || documents_from_zip(&data, true)).await?;
        info!(
            "Read {} files from {}/{}@{}",
            documents.len(),
            owner,
            repo,
            branch
        );

        store_documents(&self.ctx.db, source, settings, documents).await
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::context;
    use super::*;

    #[test]
    fn test_parse_repo_shapes() {
        let expected = Some(("rust-lang".to_string(), "cargo".to_string()));
        assert_eq!(parse_repo("rust-lang/cargo"), expected);
        assert_eq!(parse_repo("https://github.com/rust-lang/cargo"), expected);
        assert_eq!(parse_repo("https://github.com/rust-lang/cargo.git"), expected);
        assert_eq!(parse_repo("github.com/rust-lang/cargo/tree/master/src"), expected);
        assert_eq!(parse_repo("  rust-lang/cargo/ "), expected);

        assert_eq!(parse_repo("rust-lang"), None);
        assert_eq!(parse_repo("/cargo"), None);
        assert_eq!(parse_repo("owner/re po"), None);
        assert_eq!(parse_repo("https://gitlab.com/owner/repo"), None);
    }

    #[tokio::test]
    async fn test_private_repo_needs_token() {
        let ctx = context();
        let extractor = GithubExtractor::new(ctx);
        let source = SourceDescriptor::new("g1", "github")
            .with_location("acme/secret")
            .with_options(serde_json::json!({ "is_private": true }));

        let err = extractor
            .extract(&source, &RagSettings::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ExtractError::MissingField { field: "token", .. }));

        let with_token = source.with_options(serde_json::json!({
            "is_private": true,
            "token": "ghp_example"
        }));
        assert_eq!(extractor.token(&with_token).unwrap(), Some("ghp_example"));
    }

    #[tokio::test]
    async fn test_rejects_bad_location() {
        let ctx = context();
        let source = SourceDescriptor::new("g1", "github").with_location("not-a-repo");

        let err = GithubExtractor::new(ctx)
            .extract(&source, &RagSettings::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ExtractError::InvalidField { field: "location", .. }));
    }
}
