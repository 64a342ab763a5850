//! Lesson page and playground loading
//!
//! A page is a `*.lesson` file. Its annotations live in comments, so the page
//! text is also the executable source of its main unit:
//!
//! - `//: # Title` names the unit; other `//:` lines and `/*: ... */` blocks are prose
//! - `//> text` is the next expected output line
//! - `//! Kind` expects the unit to fail with `Kind`
//! - `//~ Kind: code` is an exercise line, disabled in the main unit. Each one
//!   derives a unit `"<Title> (exercise N)"` where only that line is enabled.
//!
//! A playground is a directory. With a `playground.toml` manifest, the manifest
//! fixes page order and runner settings; without one, pages are discovered.

use crate::interpreter::errors::ErrorKind;
use crate::lesson::unit::{Expectation, LessonUnit};
use serde::Deserialize;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

pub const MANIFEST_FILE: &str = "playground.toml";
pub const PAGE_EXTENSION: &str = "lesson";

/// How deep page discovery descends below the playground root
const DISCOVERY_DEPTH: usize = 3;

/// Errors raised while loading a playground
#[derive(Debug)]
pub enum LoadError {
    Io { path: PathBuf, source: io::Error },
    Manifest { path: PathBuf, message: String },
    Annotation {
        path: PathBuf,
        line: usize,
        message: String,
    },
    NoPages { path: PathBuf },
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadError::Io { path, source } => write!(f, "cannot read {}: {}", path.display(), source),
            LoadError::Manifest { path, message } => {
                write!(f, "invalid manifest {}: {}", path.display(), message)
            }
            LoadError::Annotation {
                path,
                line,
                message,
            } => write!(f, "{}:{}: {}", path.display(), line, message),
            LoadError::NoPages { path } => {
                write!(f, "no .{} pages found in {}", PAGE_EXTENSION, path.display())
            }
        }
    }
}

impl std::error::Error for LoadError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LoadError::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// The `[runner]` table of a manifest. Unset values keep the runner defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RunnerSettings {
    pub max_steps: Option<usize>,
    pub max_call_depth: Option<usize>,
    pub exercises: Option<bool>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct Manifest {
    title: Option<String>,
    #[serde(default)]
    runner: RunnerSettings,
    #[serde(default, rename = "page")]
    pages: Vec<PageEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct PageEntry {
    name: Option<String>,
    file: PathBuf,
}

/// Every unit of a playground, in run order
#[derive(Debug, Clone)]
pub struct Playground {
    pub title: String,
    pub root: PathBuf,
    pub settings: RunnerSettings,
    pub units: Vec<LessonUnit>,
}

impl Playground {
    /// Load a single page file or a playground directory
    pub fn load(path: &Path) -> Result<Playground, LoadError> {
        if path.is_file() {
            return Self::load_page_file(path);
        }
        if !path.is_dir() {
            return Err(LoadError::Io {
                path: path.to_path_buf(),
                source: io::Error::new(io::ErrorKind::NotFound, "no such file or directory"),
            });
        }

        let manifest_path = path.join(MANIFEST_FILE);
        let (title, settings, pages) = if manifest_path.is_file() {
            let manifest = read_manifest(&manifest_path)?;
            let pages: Vec<(Option<String>, PathBuf)> = if manifest.pages.is_empty() {
                log::warn!(
                    "{} lists no pages, discovering .{} files instead",
                    manifest_path.display(),
                    PAGE_EXTENSION
                );
                discover_pages(path).into_iter().map(|p| (None, p)).collect()
            } else {
                manifest
                    .pages
                    .into_iter()
                    .map(|entry| (entry.name, entry.file))
                    .collect()
            };
            (manifest.title, manifest.runner, pages)
        } else {
            log::debug!("no {} in {}, discovering pages", MANIFEST_FILE, path.display());
            let pages = discover_pages(path).into_iter().map(|p| (None, p)).collect();
            (None, RunnerSettings::default(), pages)
        };

        if pages.is_empty() {
            return Err(LoadError::NoPages {
                path: path.to_path_buf(),
            });
        }

        let mut units = Vec::new();
        for (name, page) in pages {
            let text = read_text(&path.join(&page))?;
            units.extend(parse_page(&text, name.as_deref(), &page)?);
        }
        log::debug!("loaded {} units from {}", units.len(), path.display());

        let title = title.unwrap_or_else(|| file_stem(path));
        Ok(Playground {
            title,
            root: path.to_path_buf(),
            settings,
            units,
        })
    }

    fn load_page_file(path: &Path) -> Result<Playground, LoadError> {
        let text = read_text(path)?;
        let page = PathBuf::from(path.file_name().unwrap_or(path.as_os_str()));
        let units = parse_page(&text, None, &page)?;
        Ok(Playground {
            title: file_stem(path),
            root: path.parent().map(Path::to_path_buf).unwrap_or_default(),
            settings: RunnerSettings::default(),
            units,
        })
    }
}

fn read_text(path: &Path) -> Result<String, LoadError> {
    fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn read_manifest(path: &Path) -> Result<Manifest, LoadError> {
    let text = read_text(path)?;
    toml::from_str(&text).map_err(|err| LoadError::Manifest {
        path: path.to_path_buf(),
        message: err.message().to_string(),
    })
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Find every page below `root`, as paths relative to it, sorted
pub fn discover_pages(root: &Path) -> Vec<PathBuf> {
    let mut pages: Vec<PathBuf> = WalkDir::new(root)
        .max_depth(DISCOVERY_DEPTH)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| {
            entry
                .path()
                .extension()
                .is_some_and(|ext| ext == PAGE_EXTENSION)
        })
        .filter_map(|entry| entry.path().strip_prefix(root).ok().map(Path::to_path_buf))
        .collect();

    pages.sort();
    pages
}

/// A disabled `//~` line
struct ExerciseLine {
    index: usize,
    indent: String,
    code: String,
    kind: ErrorKind,
}

/// Split one page into its main unit followed by one unit per exercise line.
/// The unit is named by the page heading, then `name`, then the file stem.
pub fn parse_page(text: &str, name: Option<&str>, page: &Path) -> Result<Vec<LessonUnit>, LoadError> {
    let annotation_error = |line: usize, message: String| LoadError::Annotation {
        path: page.to_path_buf(),
        line,
        message,
    };
    let parse_kind = |text: &str, line: usize| {
        text.trim()
            .parse::<ErrorKind>()
            .map_err(|message| annotation_error(line, message))
    };

    let lines: Vec<&str> = text.lines().collect();
    let mut heading = None;
    let mut output = Vec::new();
    let mut error = None;
    let mut exercises = Vec::new();
    let mut in_prose = false;

    for (index, raw) in lines.iter().enumerate() {
        let line = index + 1;
        let trimmed = raw.trim_start();

        if in_prose {
            if heading.is_none() {
                heading = title_of(trimmed);
            }
            if trimmed.contains("*/") {
                in_prose = false;
            }
            continue;
        }

        if let Some(rest) = trimmed.strip_prefix("/*:") {
            let body = match rest.find("*/") {
                Some(end) => &rest[..end],
                None => {
                    in_prose = true;
                    rest
                }
            };
            if heading.is_none() {
                heading = title_of(body.trim_start());
            }
        } else if let Some(rest) = trimmed.strip_prefix("//:") {
            if heading.is_none() {
                heading = title_of(rest.trim_start());
            }
        } else if let Some(rest) = trimmed.strip_prefix("//>") {
            output.push(rest.strip_prefix(' ').unwrap_or(rest).to_string());
        } else if let Some(rest) = trimmed.strip_prefix("//!") {
            if error.is_some() {
                return Err(annotation_error(line, "only one '//!' annotation is allowed per page".to_string()));
            }
            error = Some(parse_kind(rest, line)?);
        } else if let Some(rest) = trimmed.strip_prefix("//~") {
            let Some((kind, code)) = rest.split_once(':') else {
                return Err(annotation_error(line, "expected '//~ Kind: code'".to_string()));
            };
            let kind = parse_kind(kind, line)?;
            let code = code.trim();
            if code.is_empty() {
                return Err(annotation_error(line, "exercise line has no code".to_string()));
            }
            exercises.push(ExerciseLine {
                index,
                indent: raw[..raw.len() - trimmed.len()].to_string(),
                code: code.to_string(),
                kind,
            });
        }
    }

    let title = heading
        .or_else(|| name.map(str::to_string))
        .unwrap_or_else(|| file_stem(page));

    let mut units = Vec::with_capacity(exercises.len() + 1);
    units.push(LessonUnit {
        name: title.clone(),
        source: text.to_string(),
        page: page.to_path_buf(),
        is_exercise: false,
        expectation: Expectation {
            output: (!output.is_empty()).then_some(output),
            error,
        },
    });

    for (n, exercise) in exercises.iter().enumerate() {
        let mut source_lines: Vec<String> = lines.iter().map(|l| l.to_string()).collect();
        source_lines[exercise.index] = format!("{}{}", exercise.indent, exercise.code);
        units.push(LessonUnit {
            name: format!("{} (exercise {})", title, n + 1),
            source: source_lines.join("\n"),
            page: page.to_path_buf(),
            is_exercise: true,
            expectation: Expectation {
                output: None,
                error: Some(exercise.kind),
            },
        });
    }

    Ok(units)
}

/// `# Title` -> `Title`; deeper headings do not name a unit
fn title_of(text: &str) -> Option<String> {
    text.strip_prefix("# ")
        .map(str::trim)
        .filter(|title| !title.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    const PAGE: &str = "//: # Constants and Variables
/*:
 Use `let` for constants and `var` for variables.
 */
let apple = 3
var count = 1
count += apple
print(count)
//> 4
//~ ImmutableAssignment: apple = 4
//~ TypeMismatch: count = \"many\"
";

    #[test]
    fn test_page_annotations() {
        let units = parse_page(PAGE, Some("ignored"), Path::new("01.lesson")).unwrap();
        assert_eq!(units.len(), 3);

        let main = &units[0];
        assert_eq!(main.name, "Constants and Variables");
        assert!(!main.is_exercise);
        assert_eq!(main.source, PAGE);
        assert_eq!(main.expectation.output, Some(vec!["4".to_string()]));
        assert_eq!(main.expectation.error, None);

        assert_eq!(units[1].name, "Constants and Variables (exercise 1)");
        assert_eq!(units[1].expectation.error, Some(ErrorKind::ImmutableAssignment));
        assert_eq!(units[1].expectation.output, None);
        assert_eq!(units[2].expectation.error, Some(ErrorKind::TypeMismatch));
    }

    #[test]
    fn test_exercise_enables_only_its_line() {
        let units = parse_page(PAGE, None, Path::new("01.lesson")).unwrap();
        let lines: Vec<&str> = units[1].source.lines().collect();
        assert_eq!(lines.len(), PAGE.lines().count());
        assert_eq!(lines[9], "apple = 4");
        assert!(lines[10].starts_with("//~"));
    }

    #[test]
    fn test_fallback_names() {
        let units = parse_page("print(1)", Some("From Manifest"), Path::new("pages/a.lesson")).unwrap();
        assert_eq!(units[0].name, "From Manifest");
        assert!(units[0].expectation.is_empty());

        let units = parse_page("//: ## Not a title\nprint(1)", None, Path::new("pages/basics.lesson")).unwrap();
        assert_eq!(units[0].name, "basics");
    }

    #[test]
    fn test_expected_error_and_empty_output_line() {
        let units = parse_page("print(\"\")\n//>\nlet x = [1][3]\n//! IndexOutOfBounds", None, Path::new("p.lesson")).unwrap();
        assert_eq!(units[0].expectation.output, Some(vec![String::new()]));
        assert_eq!(units[0].expectation.error, Some(ErrorKind::IndexOutOfBounds));
    }

    #[test]
    fn test_bad_annotations() {
        let err = parse_page("//! NotAKind", None, Path::new("p.lesson")).unwrap_err();
        assert!(matches!(err, LoadError::Annotation { line: 1, .. }));
        assert_eq!(err.to_string(), "p.lesson:1: unknown error kind 'NotAKind'");

        let err = parse_page("\n//~ TypeMismatch", None, Path::new("p.lesson")).unwrap_err();
        assert!(matches!(err, LoadError::Annotation { line: 2, .. }));
    }

    #[test]
    fn test_manifest_playground() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("pages")).unwrap();
        fs::write(dir.path().join("pages/b.lesson"), "print(2)\n//> 2\n").unwrap();
        fs::write(dir.path().join("pages/a.lesson"), "//: # First\nprint(1)\n").unwrap();
        fs::write(
            dir.path().join(MANIFEST_FILE),
            r#"
title = "Basics"

[runner]
max_steps = 500

[[page]]
name = "Second"
file = "pages/b.lesson"

[[page]]
file = "pages/a.lesson"
"#,
        )
        .unwrap();

        let playground = Playground::load(dir.path()).unwrap();
        assert_eq!(playground.title, "Basics");
        assert_eq!(playground.settings.max_steps, Some(500));
        assert_eq!(playground.settings.exercises, None);
        let names: Vec<&str> = playground.units.iter().map(|u| u.name.as_str()).collect();
        assert_eq!(names, vec!["Second", "First"]);
        assert_eq!(playground.units[0].page, PathBuf::from("pages/b.lesson"));
    }

    #[test]
    fn test_manifest_errors() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(MANIFEST_FILE), "[[page]]\nfile = \"missing.lesson\"\n").unwrap();
        let err = Playground::load(dir.path()).unwrap_err();
        assert!(matches!(err, LoadError::Io { .. }));

        fs::write(dir.path().join(MANIFEST_FILE), "[runner]\nmax_stepz = 1\n").unwrap();
        let err = Playground::load(dir.path()).unwrap_err();
        assert!(matches!(err, LoadError::Manifest { .. }));
    }

    #[test]
    fn test_discovery_order_and_depth() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("b/deep/deeper")).unwrap();
        fs::write(root.join("b/one.lesson"), "print(1)").unwrap();
        fs::write(root.join("a.lesson"), "print(0)").unwrap();
        fs::write(root.join("notes.txt"), "not a page").unwrap();
        fs::write(root.join("b/deep/deeper/far.lesson"), "print(9)").unwrap();

        let pages = discover_pages(root);
        assert_eq!(pages, vec![PathBuf::from("a.lesson"), PathBuf::from("b/one.lesson")]);

        let playground = Playground::load(root).unwrap();
        assert_eq!(playground.units.len(), 2);
        assert_eq!(playground.settings, RunnerSettings::default());
    }

    #[test]
    fn test_single_page_and_empty_directory() {
        let dir = tempfile::tempdir().unwrap();
        let err = Playground::load(dir.path()).unwrap_err();
        assert!(matches!(err, LoadError::NoPages { .. }));

        let file = dir.path().join("loops.lesson");
        fs::write(&file, "for i in 1...3 {\n    print(i)\n}\n").unwrap();
        let playground = Playground::load(&file).unwrap();
        assert_eq!(playground.title, "loops");
        assert_eq!(playground.units[0].name, "loops");
    }
}
