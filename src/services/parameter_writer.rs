use std::path::{Path, PathBuf};

use crate::domain::scrape_request::ScrapeRequest;

#[derive(Debug, thiserror::Error)]
#[error("could not write {}: {source}", .path.display())]
pub struct ParameterWriteError {
    pub path: PathBuf,
    #[source]
    pub source: std::io::Error,
}

impl ParameterWriteError {
    fn at(path: &Path) -> impl FnOnce(std::io::Error) -> Self + '_ {
        move |source| ParameterWriteError {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Overwrites the query list with a single-element list holding `region`.
///
/// Quotes in `region` are not escaped, so `O'Hare` yields a broken list
/// literal. The scraper reads the structured params file as well.
pub async fn write_query_list(path: &Path, region: &str) -> Result<(), ParameterWriteError> {
    tokio::fs::write(path, render_query_list(region))
        .await
        .map_err(ParameterWriteError::at(path))
}

pub fn render_query_list(region: &str) -> String {
    format!("queries = ['{}']\n", region)
}

/// Rewrites the `country` and `language` assignments of the run script in place.
pub async fn patch_run_script(
    path: &Path,
    region: &str,
    language: &str,
) -> Result<(), ParameterWriteError> {
    let source = tokio::fs::read_to_string(path)
        .await
        .map_err(ParameterWriteError::at(path))?;

    tokio::fs::write(path, patch_script_lines(&source, region, language))
        .await
        .map_err(ParameterWriteError::at(path))
}

/// Line-by-line rewrite. A line is replaced when its trimmed content starts
/// with `country` or `language`; everything else, line endings included,
/// is copied unchanged.
pub fn patch_script_lines(source: &str, region: &str, language: &str) -> String {
    let mut patched = String::with_capacity(source.len());

    for line in source.split_inclusive('\n') {
        let (content, ending) = split_line_ending(line);
        let trimmed = content.trim();

        if trimmed.starts_with("country") {
            patched.push_str(&format!("country = \"{}\"", region));
            patched.push_str(ending);
        } else if trimmed.starts_with("language") {
            patched.push_str(&format!("language = \"{}\"", language));
            patched.push_str(ending);
        } else {
            patched.push_str(line);
        }
    }

    patched
}

fn split_line_ending(line: &str) -> (&str, &str) {
    if let Some(content) = line.strip_suffix("\r\n") {
        (content, "\r\n")
    } else if let Some(content) = line.strip_suffix('\n') {
        (content, "\n")
    } else {
        (line, "")
    }
}

/// JSON copy of the request for scrapers that read structured parameters.
pub async fn write_params_file(
    path: &Path,
    request: &ScrapeRequest,
) -> Result<(), ParameterWriteError> {
    let json = serde_json::to_vec_pretty(request).map_err(|e| ParameterWriteError {
        path: path.to_path_buf(),
        source: e.into(),
    })?;

    tokio::fs::write(path, json)
        .await
        .map_err(ParameterWriteError::at(path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::language::Language;

    const RUN_SCRIPT: &str = "import scraper\n\
        \n\
        country = \"Leipzig\"\n\
        \x20   language = \"en\"\n\
        # country is set above\n\
        max_results = 50\n\
        scraper.run(country, language)";

    #[test]
    fn query_list_holds_single_region() {
        assert_eq!(render_query_list("Leipzig"), "queries = ['Leipzig']\n");
    }

    #[test]
    fn query_list_keeps_quotes_unescaped() {
        assert_eq!(render_query_list("O'Hare"), "queries = ['O'Hare']\n");
    }

    #[tokio::test]
    async fn write_query_list_replaces_whole_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("query_list.py");
        std::fs::write(&path, "queries = ['Berlin', 'Hamburg']\n# extra\n").unwrap();

        write_query_list(&path, "Paris").await.unwrap();

        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "queries = ['Paris']\n"
        );
    }

    #[test]
    fn patch_rewrites_only_country_and_language_lines() {
        let patched = patch_script_lines(RUN_SCRIPT, "Paris", "de");

        let before: Vec<&str> = RUN_SCRIPT.lines().collect();
        let after: Vec<&str> = patched.lines().collect();
        assert_eq!(before.len(), after.len());

        for (i, (old, new)) in before.iter().zip(after.iter()).enumerate() {
            match i {
                2 => assert_eq!(*new, "country = \"Paris\""),
                3 => assert_eq!(*new, "language = \"de\""),
                _ => assert_eq!(old, new),
            }
        }
        // No trailing newline in the input, none added.
        assert!(patched.ends_with("scraper.run(country, language)"));
    }

    #[test]
    fn patch_keeps_crlf_endings() {
        let patched = patch_script_lines("country = 'x'\r\nprint(1)\r\n", "Rome", "es");
        assert_eq!(patched, "country = \"Rome\"\r\nprint(1)\r\n");
    }

    #[test]
    fn patch_matches_plain_prefix() {
        let patched = patch_script_lines("countryCode = 49\nlanguages = []\n", "Bonn", "de");
        assert_eq!(patched, "country = \"Bonn\"\nlanguage = \"de\"\n");
    }

    #[tokio::test]
    async fn patch_run_script_fails_for_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.py");

        let err = patch_run_script(&path, "Paris", "de").await.unwrap_err();
        assert_eq!(err.path, path);
    }

    #[tokio::test]
    async fn params_file_escapes_quotes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scrape_request.json");
        let request = ScrapeRequest::new("O'Hare \"North\"".to_string(), Language::Es).unwrap();

        write_params_file(&path, &request).await.unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["region"], "O'Hare \"North\"");
        assert_eq!(value["language"], "es");
    }
}
