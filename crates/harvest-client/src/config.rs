use harvest_core::AppError;

pub const DEFAULT_API_BASE: &str = "https://api.github.com";
pub const DEFAULT_BRANCH: &str = "main";

/// Credentials and destination for the GitHub uploader.
#[derive(Clone)]
pub struct GitHubConfig {
    pub token: String,
    pub owner: String,
    pub repo: String,
    pub branch: String,
    pub api_base: String,
}

impl std::fmt::Debug for GitHubConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitHubConfig")
            .field("token", &"<redacted>")
            .field("owner", &self.owner)
            .field("repo", &self.repo)
            .field("branch", &self.branch)
            .field("api_base", &self.api_base)
            .finish()
    }
}

impl GitHubConfig {
    /// Read configuration from environment variables.
    ///
    /// - `GITHUB_TOKEN` (required)
    /// - `HARVEST_REPO_OWNER`, `HARVEST_REPO_NAME` (required)
    /// - `HARVEST_BRANCH` (optional, defaults to `main`)
    /// - `GITHUB_API_URL` (optional, defaults to the public API)
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with an arbitrary variable source.
    pub fn from_lookup<L>(lookup: L) -> Result<Self, AppError>
    where
        L: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| -> Result<String, AppError> {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .ok_or_else(|| {
                    AppError::ConfigError(format!("{key} not set. Required for GitHub uploads."))
                })
        };
        let optional = |key: &str, default: &str| -> String {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| default.to_string())
        };

        let owner = required("HARVEST_REPO_OWNER")?;
        let repo = required("HARVEST_REPO_NAME")?;
        for (key, value) in [("HARVEST_REPO_OWNER", &owner), ("HARVEST_REPO_NAME", &repo)] {
            if value.contains('/') {
                return Err(AppError::ConfigError(format!(
                    "Invalid {key} '{value}': must not contain '/'"
                )));
            }
        }

        Ok(Self {
            token: required("GITHUB_TOKEN")?,
            owner,
            repo,
            branch: optional("HARVEST_BRANCH", DEFAULT_BRANCH),
            api_base: optional("GITHUB_API_URL", DEFAULT_API_BASE),
        })
    }
}
