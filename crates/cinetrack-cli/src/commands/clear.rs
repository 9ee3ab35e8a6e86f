use crate::output::Output;
use cinetrack_config::{CredentialStore, PathManager};
use color_eyre::eyre::eyre;
use color_eyre::Result;
use std::fs;
use std::path::Path;

pub fn run_clear(paths: &PathManager, all: bool, offline_data: bool, credentials: bool, session: bool, output: &Output) -> Result<()> {
    if all {
        remove_file(&paths.offline_store_file(), "offline store", output)?;
        remove_file(&paths.credentials_file(), "credentials", output)?;
        output.success("All local data and credentials cleared");
        return Ok(());
    }

    let mut cleared_anything = false;

    if offline_data {
        remove_file(&paths.offline_store_file(), "offline store", output)?;
        cleared_anything = true;
    }

    if credentials {
        remove_file(&paths.credentials_file(), "credentials", output)?;
        cleared_anything = true;
    } else if session {
        clear_session(paths, output)?;
        cleared_anything = true;
    }

    if !cleared_anything {
        output.warn("No clear option specified. Use --offline-data, --credentials, --session, or --all");
        output.println("\nExample: cinetrack clear --session");
    }

    Ok(())
}

fn remove_file(path: &Path, what: &str, output: &Output) -> Result<()> {
    if path.exists() {
        fs::remove_file(path).map_err(|e| eyre!("Failed to remove {} at {}: {}", what, path.display(), e))?;
        output.success(format!("Cleared {}: {}", what, path.display()));
    } else {
        output.info(format!("No {} found to clear", what));
    }
    Ok(())
}

fn clear_session(paths: &PathManager, output: &Output) -> Result<()> {
    let credentials_file = paths.credentials_file();
    if !credentials_file.exists() {
        output.info("No credentials file found, nothing to clear");
        return Ok(());
    }

    let mut store = CredentialStore::new(credentials_file);
    store.load().map_err(|e| eyre!("Failed to load credentials: {}", e))?;
    if store.get_session_token().is_none() {
        output.info("No stored session found to clear");
        return Ok(());
    }
    store.clear_session();
    store.save().map_err(|e| eyre!("Failed to save credentials: {}", e))?;
    output.success("Cleared stored session");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::OutputFormat;

    #[test]
    fn test_clear_session_keeps_other_credentials() {
        let dir = tempfile::tempdir().unwrap();
        let paths = PathManager::with_base(dir.path());
        let mut store = CredentialStore::new(paths.credentials_file());
        store.set("tmdb_api_key".to_string(), "k".to_string());
        store.set_session_token("token".to_string());
        store.save().unwrap();

        let output = Output::new(OutputFormat::Json, true);
        run_clear(&paths, false, false, false, true, &output).unwrap();

        let mut reloaded = CredentialStore::new(paths.credentials_file());
        reloaded.load().unwrap();
        assert!(reloaded.get_session_token().is_none());
        assert_eq!(reloaded.get("tmdb_api_key").map(String::as_str), Some("k"));
    }

    #[test]
    fn test_clear_all_removes_files() {
        let dir = tempfile::tempdir().unwrap();
        let paths = PathManager::with_base(dir.path());
        paths.ensure_directories().unwrap();
        fs::write(paths.offline_store_file(), "{}").unwrap();
        fs::write(paths.credentials_file(), "").unwrap();

        let output = Output::new(OutputFormat::Json, true);
        run_clear(&paths, true, false, false, false, &output).unwrap();

        assert!(!paths.offline_store_file().exists());
        assert!(!paths.credentials_file().exists());
    }
}
