//! Directory traversal and per-run bookkeeping around the [`Rewriter`].

use std::{
    collections::BTreeSet,
    fs,
    path::{Path, PathBuf},
};

use tracing::{debug, info, warn};
use tracing_attributes::instrument;
use walkdir::WalkDir;

use crate::{
    error::RewriteError,
    rewrite::{RewriteDecision, Rewriter},
};

/// What a run does to each candidate file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Mode {
    /// Replace console calls and import the logger.
    #[default]
    Migrate,
    /// Only add the missing import to files that already call the logger.
    RepairImports,
}

/// Result of visiting one file.
#[derive(Debug)]
pub struct FileOutcome {
    /// Path relative to the walk root.
    pub path: PathBuf,
    pub decision: RewriteDecision,
}

/// Counters accumulated over a run.
#[derive(Debug, Default)]
pub struct Summary {
    pub scanned: usize,
    /// Root-relative paths of the files that were (or, in a dry run, would be) rewritten.
    pub modified: Vec<PathBuf>,
    pub failed: Vec<(PathBuf, String)>,
    pub substitutions: usize,
    pub imports_inserted: usize,
}

impl Summary {
    pub fn record(&mut self, outcome: &FileOutcome) {
        self.scanned += 1;
        match &outcome.decision {
            RewriteDecision::Unchanged => {}
            RewriteDecision::Rewritten(rewrite) => {
                self.modified.push(outcome.path.clone());
                self.substitutions += rewrite.substitutions;
                if rewrite.inserted_import.is_some() {
                    self.imports_inserted += 1;
                }
            }
            RewriteDecision::Failed(e) => self.failed.push((outcome.path.clone(), e.to_string())),
        }
    }
}

/// Files below `root` whose extension is one of `extensions`, sorted by path.
///
/// Entries that cannot be read are returned separately; they do not stop the walk.
pub fn collect_candidates(
    root: &Path,
    extensions: &BTreeSet<String>,
) -> (Vec<PathBuf>, Vec<walkdir::Error>) {
    let mut files = Vec::new();
    let mut errors = Vec::new();
    for entry in WalkDir::new(root).sort_by_file_name() {
        match entry {
            Ok(entry) => {
                if !entry.file_type().is_file() {
                    continue;
                }
                let matches = entry
                    .path()
                    .extension()
                    .and_then(|ext| ext.to_str())
                    .is_some_and(|ext| extensions.contains(ext));
                if matches {
                    files.push(entry.into_path());
                }
            }
            Err(e) => errors.push(e),
        }
    }
    (files, errors)
}

/// Visits every candidate file below a root, sequentially, and applies the rewriter to it.
#[derive(Debug)]
pub struct Walker {
    root: PathBuf,
    rewriter: Rewriter,
    extensions: BTreeSet<String>,
    mode: Mode,
    dry_run: bool,
}

impl Walker {
    pub fn new(
        root: impl Into<PathBuf>,
        rewriter: Rewriter,
        extensions: BTreeSet<String>,
    ) -> Self {
        Self {
            root: root.into(),
            rewriter,
            extensions,
            mode: Mode::default(),
            dry_run: false,
        }
    }

    pub fn mode(mut self, mode: Mode) -> Self {
        self.mode = mode;
        self
    }

    /// Decide but never write.
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    fn transform(&self, path: &Path, relative: &Path) -> Result<RewriteDecision, RewriteError> {
        let bytes = fs::read(path).map_err(|source| RewriteError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let text = String::from_utf8(bytes).map_err(|_| RewriteError::InvalidUtf8 {
            path: path.to_path_buf(),
        })?;

        let decision = match self.mode {
            Mode::Migrate => self.rewriter.rewrite(&text, relative),
            Mode::RepairImports => self.rewriter.repair_imports(&text, relative),
        };
        if let (Some(new_text), false) = (decision.text(), self.dry_run) {
            fs::write(path, new_text).map_err(|source| RewriteError::Io {
                path: path.to_path_buf(),
                source,
            })?;
        }
        Ok(decision)
    }

    /// Reads, rewrites and writes back a single file. I/O failures become
    /// [`RewriteDecision::Failed`].
    pub fn process_file(&self, path: &Path) -> FileOutcome {
        let relative = path.strip_prefix(&self.root).unwrap_or(path);
        let decision = self
            .transform(path, relative)
            .unwrap_or_else(RewriteDecision::Failed);
        FileOutcome {
            path: relative.to_path_buf(),
            decision,
        }
    }

    /// Processes every candidate, calling `on_file` after each one.
    #[instrument(skip_all, fields(root = %self.root.display()))]
    pub fn run_with(&self, mut on_file: impl FnMut(&FileOutcome)) -> Summary {
        let mut summary = Summary::default();
        let (files, errors) = collect_candidates(&self.root, &self.extensions);
        debug!(candidates = files.len(), "collected candidate files");

        for error in errors {
            let path = error.path().unwrap_or(&self.root).to_path_buf();
            warn!(path = %path.display(), "skipping unreadable entry: {error}");
            summary.failed.push((path, error.to_string()));
        }

        for path in files {
            let outcome = self.process_file(&path);
            if let RewriteDecision::Failed(e) = &outcome.decision {
                warn!(file = %outcome.path.display(), "skipping file: {e}");
            }
            summary.record(&outcome);
            on_file(&outcome);
        }

        info!(
            scanned = summary.scanned,
            modified = summary.modified.len(),
            failed = summary.failed.len(),
            dry_run = self.dry_run,
            "run complete"
        );
        summary
    }

    pub fn run(&self) -> Summary {
        self.run_with(|_| {})
    }
}
