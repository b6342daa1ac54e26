// Issue template discovery and parsing
//
// Templates are Markdown files with a YAML frontmatter block carrying the
// schedule metadata; the body below the block becomes the issue description.

use crate::errors::TemplateError;
use crate::models::IssueTemplate;
use chrono::Duration;
use chrono_tz::Tz;
use gray_matter::engine::YAML;
use gray_matter::{Matter, ParsedEntity};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::info;

/// Metadata from issue template frontmatter
#[derive(Debug, Clone, Deserialize)]
struct TemplateFrontmatter {
    #[serde(default)]
    title: String,
    #[serde(default)]
    confidential: bool,
    #[serde(default)]
    assignees: Vec<String>,
    #[serde(default)]
    labels: Vec<String>,
    #[serde(default)]
    duein: String,
    #[serde(default)]
    crontab: String,
    #[serde(default)]
    timezone: Option<String>,
    #[serde(default)]
    epic: Option<String>,
    #[serde(default)]
    project_id: Option<u64>,
}

/// Walk `dir` for Markdown templates and parse each one.
///
/// Non-Markdown entries are skipped with a log line. A missing directory
/// yields an empty run rather than an error, so a repository without
/// templates is not a failure. Results are ordered by path.
pub fn scan_template_dir(dir: &Path) -> Result<Vec<IssueTemplate>, TemplateError> {
    if !dir.exists() {
        info!(dir = %dir.display(), "Template directory does not exist, nothing to do");
        return Ok(Vec::new());
    }

    let mut files = Vec::new();
    collect_markdown_files(dir, &mut files)?;
    files.sort();

    let mut templates = Vec::with_capacity(files.len());
    for path in files {
        templates.push(parse_template(&path)?);
    }
    Ok(templates)
}

fn collect_markdown_files(dir: &Path, files: &mut Vec<PathBuf>) -> Result<(), TemplateError> {
    let entries = fs::read_dir(dir).map_err(|e| TemplateError::DirectoryRead {
        path: dir.display().to_string(),
        source: e,
    })?;

    for entry in entries {
        let entry = entry.map_err(|e| TemplateError::DirectoryRead {
            path: dir.display().to_string(),
            source: e,
        })?;
        let path = entry.path();

        if path.is_dir() {
            collect_markdown_files(&path, files)?;
            continue;
        }

        if path.extension().and_then(|s| s.to_str()) != Some("md") {
            info!(path = %path.display(), "Not a Markdown file, skipping");
            continue;
        }

        files.push(path);
    }
    Ok(())
}

/// Parse a single template file
pub fn parse_template(path: &Path) -> Result<IssueTemplate, TemplateError> {
    let content = fs::read_to_string(path).map_err(|e| TemplateError::FileRead {
        path: path.display().to_string(),
        source: e,
    })?;
    parse_template_str(path, &content)
}

fn parse_template_str(path: &Path, content: &str) -> Result<IssueTemplate, TemplateError> {
    let display = path.display().to_string();

    let matter = Matter::<YAML>::new();
    let result: ParsedEntity<TemplateFrontmatter> =
        matter
            .parse(content)
            .map_err(|e| TemplateError::InvalidFrontmatter {
                path: display.clone(),
                reason: e.to_string(),
            })?;

    let front = result
        .data
        .ok_or_else(|| TemplateError::MissingFrontmatter {
            path: display.clone(),
        })?;

    if front.title.trim().is_empty() {
        return Err(TemplateError::MissingTitle { path: display });
    }
    if front.crontab.trim().is_empty() {
        return Err(TemplateError::MissingCrontab { path: display });
    }

    let due_in = if front.duein.is_empty() {
        None
    } else {
        Some(
            parse_due_in(&front.duein).map_err(|reason| TemplateError::InvalidDueIn {
                path: display.clone(),
                value: front.duein.clone(),
                reason,
            })?,
        )
    };

    let timezone = match &front.timezone {
        Some(name) => Tz::from_str(name).map_err(|_| TemplateError::InvalidTimezone {
            path: display.clone(),
            value: name.clone(),
        })?,
        None => chrono_tz::UTC,
    };

    Ok(IssueTemplate {
        source: path.to_path_buf(),
        title: front.title,
        description: result.content,
        confidential: front.confidential,
        assignees: front.assignees,
        labels: front.labels,
        due_in,
        crontab: front.crontab,
        timezone,
        epic: front.epic,
        project_id: front.project_id,
    })
}

/// Parse a duration string like "24h", "30m" or "1h30m" into an offset.
/// Units compose additively; hours, minutes and seconds are accepted.
pub fn parse_due_in(value: &str) -> Result<Duration, String> {
    let mut total = Duration::zero();
    let mut digits = String::new();
    let mut saw_unit = false;

    for ch in value.trim().chars() {
        if ch.is_ascii_digit() {
            digits.push(ch);
            continue;
        }

        if digits.is_empty() {
            return Err(format!("expected a number before '{}'", ch));
        }
        let amount: i64 = digits
            .parse()
            .map_err(|_| format!("'{}' is not a valid number", digits))?;
        digits.clear();

        total = total
            + match ch {
                'h' => Duration::hours(amount),
                'm' => Duration::minutes(amount),
                's' => Duration::seconds(amount),
                other => return Err(format!("unknown unit '{}'", other)),
            };
        saw_unit = true;
    }

    if !digits.is_empty() {
        return Err(format!("number '{}' is missing a unit", digits));
    }
    if !saw_unit {
        return Err("empty duration".to_string());
    }
    Ok(total)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(content: &str) -> Result<IssueTemplate, TemplateError> {
        parse_template_str(Path::new("test.md"), content)
    }

    #[test]
    fn test_parses_title_and_content() {
        let template = parse(
            "---\ntitle: Test Title\ncrontab: \"0 9 * * 1\"\n---\nTest Content\n",
        )
        .unwrap();
        assert_eq!(template.title, "Test Title");
        assert_eq!(template.description.trim(), "Test Content");
        assert_eq!(template.crontab, "0 9 * * 1");
    }

    #[test]
    fn test_parses_empty_content() {
        let template =
            parse("---\ntitle: Test Title\ncrontab: \"@daily\"\n---\n").unwrap();
        assert!(template.description.trim().is_empty());
    }

    #[test]
    fn test_parses_confidential() {
        let template = parse(
            "---\ntitle: t\ncrontab: \"@daily\"\nconfidential: true\n---\n",
        )
        .unwrap();
        assert!(template.confidential);
    }

    #[test]
    fn test_confidential_defaults_to_false() {
        let template = parse("---\ntitle: t\ncrontab: \"@daily\"\n---\n").unwrap();
        assert!(!template.confidential);
    }

    #[test]
    fn test_parses_assignees() {
        let template = parse(
            "---\ntitle: t\ncrontab: \"@daily\"\nassignees: [ \"alice\", \"bob\" ]\n---\n",
        )
        .unwrap();
        assert_eq!(template.assignees, vec!["alice", "bob"]);
    }

    #[test]
    fn test_parses_labels() {
        let template = parse(
            "---\ntitle: t\ncrontab: \"@daily\"\nlabels: [ \"ops\", \"recurring\" ]\n---\n",
        )
        .unwrap();
        assert_eq!(template.labels, vec!["ops", "recurring"]);
    }

    #[test]
    fn test_parses_duein() {
        let template = parse(
            "---\ntitle: t\ncrontab: \"@daily\"\nduein: 24h\n---\n",
        )
        .unwrap();
        assert_eq!(template.due_in, Some(Duration::hours(24)));
    }

    #[test]
    fn test_parses_epic_and_project_override() {
        let template = parse(
            "---\ntitle: t\ncrontab: \"@daily\"\nepic: Quarterly Goals\nproject_id: 42\n---\n",
        )
        .unwrap();
        assert_eq!(template.epic.as_deref(), Some("Quarterly Goals"));
        assert_eq!(template.project_id, Some(42));
    }

    #[test]
    fn test_timezone_defaults_to_utc() {
        let template = parse("---\ntitle: t\ncrontab: \"@daily\"\n---\n").unwrap();
        assert_eq!(template.timezone, chrono_tz::UTC);
    }

    #[test]
    fn test_parses_timezone() {
        let template = parse(
            "---\ntitle: t\ncrontab: \"@daily\"\ntimezone: Europe/Berlin\n---\n",
        )
        .unwrap();
        assert_eq!(template.timezone, chrono_tz::Europe::Berlin);
    }

    #[test]
    fn test_rejects_unknown_timezone() {
        let err = parse(
            "---\ntitle: t\ncrontab: \"@daily\"\ntimezone: Mars/Olympus\n---\n",
        )
        .unwrap_err();
        assert!(matches!(err, TemplateError::InvalidTimezone { .. }));
    }

    #[test]
    fn test_rejects_missing_title() {
        let err = parse("---\ncrontab: \"@daily\"\n---\nbody\n").unwrap_err();
        assert!(matches!(err, TemplateError::MissingTitle { .. }));
    }

    #[test]
    fn test_rejects_missing_crontab() {
        let err = parse("---\ntitle: t\n---\nbody\n").unwrap_err();
        assert!(matches!(err, TemplateError::MissingCrontab { .. }));
    }

    #[test]
    fn test_rejects_missing_frontmatter() {
        let err = parse("Just a plain Markdown file.\n").unwrap_err();
        assert!(matches!(err, TemplateError::MissingFrontmatter { .. }));
    }

    #[test]
    fn test_rejects_bad_duein() {
        let err = parse(
            "---\ntitle: t\ncrontab: \"@daily\"\nduein: soon\n---\n",
        )
        .unwrap_err();
        assert!(matches!(err, TemplateError::InvalidDueIn { .. }));
    }

    #[test]
    fn test_parse_due_in_compound() {
        assert_eq!(parse_due_in("1h30m").unwrap(), Duration::minutes(90));
        assert_eq!(parse_due_in("45s").unwrap(), Duration::seconds(45));
        assert_eq!(parse_due_in("24h").unwrap(), Duration::hours(24));
    }

    #[test]
    fn test_parse_due_in_rejects_trailing_number() {
        assert!(parse_due_in("24").is_err());
    }

    #[test]
    fn test_parse_due_in_rejects_unknown_unit() {
        assert!(parse_due_in("2w").is_err());
    }

    #[test]
    fn test_parse_due_in_rejects_empty() {
        assert!(parse_due_in("").is_err());
    }

    #[test]
    fn test_scan_skips_non_markdown_and_recurses() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("weekly.md"),
            "---\ntitle: Weekly\ncrontab: \"0 9 * * 1\"\n---\nbody\n",
        )
        .unwrap();
        fs::write(dir.path().join("notes.txt"), "not a template").unwrap();
        let nested = dir.path().join("team");
        fs::create_dir(&nested).unwrap();
        fs::write(
            nested.join("standup.md"),
            "---\ntitle: Standup\ncrontab: \"@daily\"\n---\n",
        )
        .unwrap();

        let templates = scan_template_dir(dir.path()).unwrap();
        let titles: Vec<_> = templates.iter().map(|t| t.title.as_str()).collect();
        assert_eq!(titles, vec!["Standup", "Weekly"]);
    }

    #[test]
    fn test_scan_missing_directory_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("does-not-exist");
        assert!(scan_template_dir(&missing).unwrap().is_empty());
    }
}
