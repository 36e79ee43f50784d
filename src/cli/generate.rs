//! Generate command — builds the release notes document for one tag.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use crate::config::{Chapters, GeneratorConfig, RepoId, DEFAULT_SKIP_LABEL};
use crate::github::{GithubClient, GithubError};
use crate::notes::generate_release_notes;

/// Generate command options.
#[derive(Parser)]
pub struct GenerateCommand {
    /// Repository to generate notes for, as owner/name.
    #[arg(long, value_name = "OWNER/NAME")]
    pub repository: String,

    /// Tag name of the release being described.
    #[arg(long, value_name = "TAG")]
    pub tag_name: String,

    /// Chapter definitions as a JSON array of {"title", "label"} records.
    #[arg(long, value_name = "JSON", default_value = "[]")]
    pub chapters: String,

    /// Disables the anomaly warning sections.
    #[arg(long)]
    pub no_warnings: bool,

    /// Uses the latest release's publish time instead of its creation time
    /// as the activity cutoff.
    #[arg(long)]
    pub published_at: bool,

    /// Label that excludes an issue or PR from the release notes.
    #[arg(long, value_name = "LABEL", default_value = DEFAULT_SKIP_LABEL)]
    pub skip_release_notes_label: String,

    /// Omits empty chapters and anomaly sections instead of rendering
    /// placeholder text.
    #[arg(long)]
    pub no_print_empty_chapters: bool,

    /// Leaves unlinked merged PRs out of thematic chapters (they then only
    /// appear in the warning sections).
    #[arg(long)]
    pub no_chapters_to_pr_without_issue: bool,

    /// Writes the document to a file instead of stdout.
    #[arg(long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Overrides the GitHub API base URL (for GitHub Enterprise).
    #[arg(long, value_name = "URL")]
    pub api_url: Option<String>,
}

impl GenerateCommand {
    /// Executes the generate command.
    pub async fn execute(self) -> Result<()> {
        // All input validation happens before the first network request
        let repository = RepoId::parse(&self.repository)?;
        let chapters = Chapters::from_json(&self.chapters)?;

        let config = GeneratorConfig {
            repository,
            tag_name: self.tag_name.clone(),
            chapters,
            warnings: !self.no_warnings,
            use_published_at: self.published_at,
            skip_release_notes_label: self.skip_release_notes_label.clone(),
            print_empty_chapters: !self.no_print_empty_chapters,
            chapters_to_pr_without_issue: !self.no_chapters_to_pr_without_issue,
        };
        config.validate()?;

        info!(
            repository = %config.repository,
            tag = %config.tag_name,
            chapters = config.chapters.len(),
            warnings = config.warnings,
            skip_label = %config.skip_release_notes_label,
            "Starting release notes generation"
        );

        let token = std::env::var("GITHUB_TOKEN").map_err(|_| GithubError::TokenNotFound)?;
        let client = match self.api_url.as_deref() {
            Some(api_url) => {
                GithubClient::with_base_url(config.repository.clone(), token, api_url)?
            }
            None => GithubClient::new(config.repository.clone(), token)?,
        };

        let document = generate_release_notes(&client, &config).await?;

        match &self.output {
            Some(path) => {
                std::fs::write(path, &document).with_context(|| {
                    format!("Failed to write release notes to {}", path.display())
                })?;
                eprintln!("Release notes written to {}", path.display());
            }
            None => println!("{document}"),
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn command_definition_is_consistent() {
        GenerateCommand::command().debug_assert();
    }

    #[test]
    fn defaults_map_to_enabled_toggles() {
        let cmd = GenerateCommand::parse_from([
            "generate",
            "--repository",
            "owner/repo",
            "--tag-name",
            "v1.0.0",
        ]);
        assert!(!cmd.no_warnings);
        assert!(!cmd.no_print_empty_chapters);
        assert_eq!(cmd.chapters, "[]");
        assert_eq!(cmd.skip_release_notes_label, DEFAULT_SKIP_LABEL);
    }
}
