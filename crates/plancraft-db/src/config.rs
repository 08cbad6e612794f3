//! Where the plancraft database lives.

use std::env;

/// Connection settings for the plancraft database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DbConfig {
    /// Full PostgreSQL connection URL.
    pub database_url: String,
}

impl DbConfig {
    /// Used when neither a flag, the environment, nor a config file names a URL.
    pub const DEFAULT_URL: &str = "postgresql://localhost:5432/plancraft";

    pub const ENV_VAR: &str = "PLANCRAFT_DATABASE_URL";

    /// Database on the same server that `CREATE DATABASE` is issued from.
    pub const MAINTENANCE_DB: &str = "postgres";

    pub fn new(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
        }
    }

    /// Pick the URL by precedence: `cli_url`, then `PLANCRAFT_DATABASE_URL`,
    /// then `file_url`, then [`DbConfig::DEFAULT_URL`]. A blank environment
    /// variable counts as unset.
    pub fn resolve(cli_url: Option<&str>, file_url: Option<&str>) -> Self {
        let url = cli_url
            .map(str::to_owned)
            .or_else(|| env::var(Self::ENV_VAR).ok().filter(|v| !v.trim().is_empty()))
            .or_else(|| file_url.map(str::to_owned))
            .unwrap_or_else(|| Self::DEFAULT_URL.to_owned());
        Self::new(url)
    }

    /// The database named in the URL path, if there is one.
    pub fn database_name(&self) -> Option<&str> {
        let (_, name, _) = self.split_url();
        (!name.is_empty()).then_some(name)
    }

    /// Same server and query parameters, pointed at [`DbConfig::MAINTENANCE_DB`].
    pub fn maintenance_url(&self) -> String {
        let (server, _, query) = self.split_url();
        format!("{server}/{}{query}", Self::MAINTENANCE_DB)
    }

    /// `(server, database, query)` where `query` keeps its leading `?`.
    fn split_url(&self) -> (&str, &str, &str) {
        let url = self.database_url.as_str();
        let (before_query, query) = url.split_at(url.find('?').unwrap_or(url.len()));
        let authority_start = before_query.find("://").map_or(0, |i| i + 3);

        match before_query[authority_start..].rfind('/') {
            Some(slash) => {
                let slash = authority_start + slash;
                (&before_query[..slash], &before_query[slash + 1..], query)
            }
            None => (before_query, "", query),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_url_names_plancraft() {
        let cfg = DbConfig::new(DbConfig::DEFAULT_URL);
        assert_eq!(cfg.database_name(), Some("plancraft"));
        assert_eq!(cfg.maintenance_url(), "postgresql://localhost:5432/postgres");
    }

    #[test]
    fn query_string_is_kept_for_maintenance() {
        let cfg = DbConfig::new("postgresql://u:p@db.internal:5432/plans?sslmode=require");
        assert_eq!(cfg.database_name(), Some("plans"));
        assert_eq!(
            cfg.maintenance_url(),
            "postgresql://u:p@db.internal:5432/postgres?sslmode=require"
        );
    }

    #[test]
    fn url_without_database() {
        for url in ["postgresql://localhost:5432/", "postgresql://localhost:5432"] {
            let cfg = DbConfig::new(url);
            assert_eq!(cfg.database_name(), None, "{url}");
            assert_eq!(cfg.maintenance_url(), "postgresql://localhost:5432/postgres", "{url}");
        }
    }

    #[test]
    fn explicit_url_wins_over_file() {
        let cfg = DbConfig::resolve(Some("postgresql://cli/clidb"), Some("postgresql://file/filedb"));
        assert_eq!(cfg.database_name(), Some("clidb"));
    }
}
