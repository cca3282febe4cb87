//! File discovery and per-file analysis.
//!
//! A scan walks the input path, analyzes each Swift file independently
//! (sequentially, or on a bounded rayon pool) and folds the outcomes into a
//! [`DirectoryAnalysisResult`].

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use walkdir::WalkDir;

use crate::aggregate::{aggregate_outcomes, DirectoryAnalysisResult, FileFailure, FileOutcome};
use crate::analysis::{get_analyzer, is_supported_extension, SourceModule};
use crate::detect::Runner;
use crate::error::AnalysisError;
use crate::thresholds::Thresholds;

/// Dependency and build output directories that never hold project sources.
const SKIPPED_DIRS: &[&str] = &["Pods", "Carthage", "DerivedData"];

/// How a scan is executed.
#[derive(Debug, Clone, Copy)]
pub struct ScanOptions {
    /// Worker threads; 0 or 1 analyzes sequentially.
    pub jobs: usize,
    /// Draw a progress bar on stderr.
    pub progress: bool,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            jobs: 1,
            progress: false,
        }
    }
}

fn extension_of(path: &Path) -> &str {
    path.extension().and_then(|e| e.to_str()).unwrap_or("")
}

/// Files found by [`discover_files`], plus entries the walk could not read.
#[derive(Debug, Default)]
pub struct Discovery {
    /// Sorted lexicographically.
    pub files: Vec<PathBuf>,
    pub failures: Vec<FileFailure>,
}

fn walk_failure(root: &Path, err: &walkdir::Error) -> FileFailure {
    let path = err.path().unwrap_or(root);
    FileFailure {
        path: path.display().to_string(),
        error: err.to_string(),
    }
}

/// Collect analyzable files under `root`.
///
/// Unreadable directories become failures and the walk continues past them.
pub fn discover_files(root: &Path, thresholds: &Thresholds) -> Result<Discovery, AnalysisError> {
    let excluded = thresholds.exclusion_set()?;
    let mut discovery = Discovery::default();

    for entry in WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| {
            if e.depth() == 0 {
                return true;
            }
            let name = e.file_name().to_string_lossy();
            // Skip hidden entries and dependency checkouts
            if name.starts_with('.') {
                return false;
            }
            !(e.file_type().is_dir() && SKIPPED_DIRS.contains(&name.as_ref()))
        })
    {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                tracing::warn!(error = %err, "skipping unreadable entry");
                discovery.failures.push(walk_failure(root, &err));
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        if !is_supported_extension(extension_of(path)) {
            continue;
        }
        let relative = path.strip_prefix(root).unwrap_or(path);
        if excluded.is_match(relative) || excluded.is_match(path) {
            tracing::debug!(file = %path.display(), "excluded by configuration");
            continue;
        }
        discovery.files.push(path.to_path_buf());
    }

    discovery.files.sort();
    Ok(discovery)
}

/// Read, decode and parse one file.
pub fn load_tree(path: &Path) -> Result<(SourceModule, String), AnalysisError> {
    let analyzer = get_analyzer(extension_of(path))
        .ok_or_else(|| AnalysisError::UnsupportedFileType(path.to_path_buf()))?;
    let bytes = fs::read(path).map_err(|source| AnalysisError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let source = String::from_utf8(bytes).map_err(|_| AnalysisError::Decode(path.to_path_buf()))?;
    let file_path = path.display().to_string();
    let tree = analyzer.parse(&source, &file_path)?;
    Ok((
        SourceModule {
            path: file_path,
            tree,
        },
        source,
    ))
}

/// Analyze one file, turning any read or parse error into a failure entry.
pub fn analyze_file(path: &Path, runner: &Runner<'_>) -> FileOutcome {
    match load_tree(path) {
        Ok((module, source)) => {
            let result = runner.analyze_with_suppressions(&module.tree, &module.path, &source);
            tracing::debug!(
                file = %module.path,
                defects = result.total_defects(),
                score = result.maintainability_score,
                "analyzed"
            );
            FileOutcome::Analyzed(result)
        }
        Err(err) => {
            tracing::warn!(file = %path.display(), error = %err, "skipping file");
            FileOutcome::Failed(FileFailure {
                path: path.display().to_string(),
                error: err.to_string(),
            })
        }
    }
}

fn progress_bar(len: usize, enabled: bool) -> ProgressBar {
    if !enabled {
        return ProgressBar::hidden();
    }
    let bar = ProgressBar::new(len as u64);
    if let Ok(style) = ProgressStyle::with_template("{spinner} [{bar:30}] {pos}/{len} {wide_msg}") {
        bar.set_style(style.progress_chars("=> "));
    }
    bar
}

fn analyze_all(files: &[PathBuf], runner: &Runner<'_>, options: ScanOptions) -> Vec<FileOutcome> {
    let bar = progress_bar(files.len(), options.progress);
    let run_one = |path: &PathBuf| {
        bar.set_message(path.display().to_string());
        let outcome = analyze_file(path, runner);
        bar.inc(1);
        outcome
    };

    let outcomes: Vec<FileOutcome> = if options.jobs > 1 {
        match rayon::ThreadPoolBuilder::new()
            .num_threads(options.jobs)
            .build()
        {
            Ok(pool) => pool.install(|| files.par_iter().map(&run_one).collect()),
            Err(err) => {
                tracing::warn!(error = %err, "could not start worker pool, running sequentially");
                files.iter().map(&run_one).collect()
            }
        }
    } else {
        files.iter().map(&run_one).collect()
    };

    bar.finish_and_clear();
    outcomes
}

/// Analyze a file or directory with the default detector set.
///
/// Unreadable or unparsable files are reported in `failed_files`; only a
/// missing path, an unsupported single file or an empty directory fail
/// the whole run.
pub fn analyze_path(
    path: &Path,
    thresholds: &Thresholds,
    options: ScanOptions,
) -> Result<DirectoryAnalysisResult, AnalysisError> {
    if !path.exists() {
        return Err(AnalysisError::NotFound(path.to_path_buf()));
    }

    let Discovery { files, failures } = if path.is_file() {
        if !is_supported_extension(extension_of(path)) {
            return Err(AnalysisError::UnsupportedFileType(path.to_path_buf()));
        }
        Discovery {
            files: vec![path.to_path_buf()],
            failures: Vec::new(),
        }
    } else {
        discover_files(path, thresholds)?
    };

    if files.is_empty() && failures.is_empty() {
        return Err(AnalysisError::NoSourceFiles(path.to_path_buf()));
    }
    tracing::debug!(root = %path.display(), files = files.len(), jobs = options.jobs, "starting scan");

    let start = Instant::now();
    let runner = Runner::new(thresholds);
    let outcomes = analyze_all(&files, &runner, options)
        .into_iter()
        .chain(failures.into_iter().map(FileOutcome::Failed));
    Ok(aggregate_outcomes(path, outcomes, start.elapsed()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write(dir: &Path, name: &str, content: &[u8]) {
        let path = dir.join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, content).unwrap();
    }

    fn sample_project() -> TempDir {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        write(root, "Sources/User.swift", b"struct User {\n    let name: String\n    let email: String\n}\n");
        write(
            root,
            "Sources/Greeter.swift",
            b"class Greeter {\n    func greet(user: User) -> String {\n        return user.name\n    }\n}\n",
        );
        write(root, "Pods/Vendor.swift", b"class Vendor {}\n");
        write(root, ".build/Cache.swift", b"class Cache {}\n");
        write(root, "README.md", b"# project\n");
        temp
    }

    #[test]
    fn test_discover_skips_vendored_and_hidden() {
        let temp = sample_project();
        let discovery = discover_files(temp.path(), &Thresholds::default()).unwrap();
        assert!(discovery.failures.is_empty());
        let names: Vec<_> = discovery
            .files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["Greeter.swift", "User.swift"]);
    }

    #[test]
    fn test_discover_honors_excluded_paths() {
        let temp = sample_project();
        let mut thresholds = Thresholds::default();
        thresholds.analysis.excluded_paths = vec!["**/User.swift".to_string()];
        let files = discover_files(temp.path(), &thresholds).unwrap().files;
        assert_eq!(files.len(), 1);
        assert!(files[0].ends_with("Greeter.swift"));
    }

    #[test]
    fn test_invalid_file_is_recorded_not_fatal() {
        let temp = sample_project();
        write(temp.path(), "Sources/Broken.swift", &[0xff, 0xfe, 0x00, 0x41]);

        let result = analyze_path(temp.path(), &Thresholds::default(), ScanOptions::default()).unwrap();
        assert_eq!(result.total_files(), 2);
        assert_eq!(result.failed_files.len(), 1);
        assert!(result.failed_files[0].path.ends_with("Broken.swift"));
        assert!(result.failed_files[0].error.contains("UTF-8"));
    }

    #[test]
    fn test_parallel_scan_matches_sequential() {
        let temp = sample_project();
        let thresholds = Thresholds::default();
        let sequential = analyze_path(temp.path(), &thresholds, ScanOptions::default()).unwrap();
        let parallel = analyze_path(
            temp.path(),
            &thresholds,
            ScanOptions {
                jobs: 4,
                progress: false,
            },
        )
        .unwrap();
        assert_eq!(sequential.results, parallel.results);
        assert_eq!(sequential.failed_files, parallel.failed_files);
    }

    #[test]
    fn test_walk_errors_are_recorded_and_walk_continues() {
        let temp = TempDir::new().unwrap();
        let gone = temp.path().join("gone");
        let discovery = discover_files(&gone, &Thresholds::default()).unwrap();
        assert!(discovery.files.is_empty());
        assert_eq!(discovery.failures.len(), 1);
        assert!(discovery.failures[0].path.ends_with("gone"));
        assert!(!discovery.failures[0].error.is_empty());
    }

    #[test]
    fn test_walk_failures_reach_the_directory_result() {
        let temp = sample_project();
        let err = WalkDir::new(temp.path().join("missing"))
            .into_iter()
            .find_map(Result::err)
            .unwrap();
        let failure = walk_failure(temp.path(), &err);
        assert!(failure.path.ends_with("missing"));

        let runner_thresholds = Thresholds::default();
        let runner = Runner::new(&runner_thresholds);
        let files = discover_files(temp.path(), &runner_thresholds).unwrap().files;
        let outcomes = analyze_all(&files, &runner, ScanOptions::default())
            .into_iter()
            .chain(std::iter::once(FileOutcome::Failed(failure)));
        let result = aggregate_outcomes(temp.path(), outcomes, std::time::Duration::ZERO);
        assert_eq!(result.total_files(), 2);
        assert_eq!(result.failed_files.len(), 1);
    }

    #[test]
    fn test_empty_directory_is_an_error() {
        let temp = TempDir::new().unwrap();
        let err = analyze_path(temp.path(), &Thresholds::default(), ScanOptions::default()).unwrap_err();
        assert!(matches!(err, AnalysisError::NoSourceFiles(_)));
        assert!(err.to_string().starts_with("no source files found under"));
    }

    #[test]
    fn test_missing_and_unsupported_paths() {
        let temp = TempDir::new().unwrap();
        let missing = temp.path().join("nope");
        assert!(matches!(
            analyze_path(&missing, &Thresholds::default(), ScanOptions::default()),
            Err(AnalysisError::NotFound(_))
        ));

        write(temp.path(), "notes.txt", b"hello");
        assert!(matches!(
            analyze_path(&temp.path().join("notes.txt"), &Thresholds::default(), ScanOptions::default()),
            Err(AnalysisError::UnsupportedFileType(_))
        ));
    }

    #[test]
    fn test_single_file() {
        let temp = sample_project();
        let file = temp.path().join("Sources/User.swift");
        let result = analyze_path(&file, &Thresholds::default(), ScanOptions::default()).unwrap();
        assert_eq!(result.total_files(), 1);
        assert!(result.failed_files.is_empty());
    }
}
