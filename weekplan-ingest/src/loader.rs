//! Directory and file-list loading with routine/project classification.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use weekplan_core::{Project, Routine};

use crate::frontmatter::Frontmatter;
use crate::parsers::{parse_project, parse_routine};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedInputs {
    pub projects: Vec<Project>,
    pub routines: Vec<Routine>,
}

impl ParsedInputs {
    fn absorb(&mut self, path: &Path) -> Result<()> {
        let content = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
        let filename = path
            .file_name()
            .and_then(|n| n.to_str())
            .with_context(|| format!("non-UTF-8 file name: {}", path.display()))?;

        if is_routine_file(&content) {
            let r = parse_routine(&content, filename).with_context(|| format!("parse routine {}", path.display()))?;
            self.routines.push(r);
        } else {
            let p = parse_project(&content, filename).with_context(|| format!("parse project {}", path.display()))?;
            self.projects.push(p);
        }
        Ok(())
    }
}

/// Routine files carry `type: routine` in their header.
pub fn is_routine_file(content: &str) -> bool {
    Frontmatter::split(content).get("type") == Some("routine")
}

/// Every `*.md` directly inside `dir`, in file-name order.
pub fn load_dir(dir: &Path) -> Result<ParsedInputs> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir).with_context(|| format!("read dir {}", dir.display()))? {
        let path = entry?.path();
        if path.is_file() && path.extension().is_some_and(|e| e == "md") {
            files.push(path);
        }
    }
    files.sort();
    debug!(dir = %dir.display(), files = files.len(), "loading directory");
    load_files(&files)
}

/// Parse the given files in the given order.
pub fn load_files(files: &[PathBuf]) -> Result<ParsedInputs> {
    let mut out = ParsedInputs::default();
    for f in files {
        out.absorb(f)?;
    }
    info!(projects = out.projects.len(), routines = out.routines.len(), "inputs loaded");
    Ok(out)
}

/// Mix of directories and files, as given on a command line.
pub fn load_paths(paths: &[PathBuf]) -> Result<ParsedInputs> {
    let mut out = ParsedInputs::default();
    for p in paths {
        let part = if p.is_dir() {
            load_dir(p)?
        } else if p.is_file() {
            load_files(std::slice::from_ref(p))?
        } else {
            bail!("no such file or directory: {}", p.display());
        };
        out.projects.extend(part.projects);
        out.routines.extend(part.routines);
    }
    Ok(out)
}
