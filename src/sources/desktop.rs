use crate::error::LaunchError;
use crate::model::Candidate;
use crate::parser::{self, Descriptor, DesktopKey};
use crate::sources::Source;
use anyhow::Result;
use log::{debug, info, warn};
use std::collections::HashSet;
use std::env;
use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

const DESKTOP_GROUP: &str = "Desktop Entry";
const FALLBACK_DATA_DIRS: &str = "/usr/local/share/:/usr/share/applications/";

/// Ordered list of directories scanned for `.desktop` files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchPath {
    dirs: Vec<PathBuf>,
}

impl SearchPath {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the path from `XDG_DATA_HOME`/`HOME` and `XDG_DATA_DIRS` as returned by `lookup`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.is_empty());

        let mut joined = match non_empty("XDG_DATA_HOME") {
            Some(data_home) => format!("{}/applications/", data_home),
            None => match non_empty("HOME") {
                Some(home) => format!("{}/.local/share/applications/", home),
                None => String::new(),
            },
        };

        let extra = match non_empty("XDG_DATA_DIRS") {
            Some(data_dirs) => data_dirs
                .split(':')
                .filter(|d| !d.is_empty())
                .map(|d| format!("{}/applications/", d))
                .collect::<Vec<_>>()
                .join(":"),
            None => FALLBACK_DATA_DIRS.to_string(),
        };
        joined.push(':');
        joined.push_str(&extra);

        Self::parse(&joined)
    }

    /// Tokenize a `:`-joined path list, skipping empty components.
    pub fn parse(joined: &str) -> Self {
        Self {
            dirs: joined
                .split(':')
                .filter(|s| !s.is_empty())
                .map(PathBuf::from)
                .collect(),
        }
    }

    pub fn dirs(&self) -> &[PathBuf] {
        &self.dirs
    }

    pub fn display(&self) -> String {
        self.dirs
            .iter()
            .map(|d| d.display().to_string())
            .collect::<Vec<_>>()
            .join(":")
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ResolvePolicy {
    pub skip_hidden: bool,
}

impl Default for ResolvePolicy {
    fn default() -> Self {
        Self { skip_hidden: true }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RejectReason {
    NotApplication(String),
    NoDisplay,
    MissingName,
    MissingExec,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Candidate(Candidate),
    /// No `[Desktop Entry]` group.
    NotApplicable,
    Rejected(RejectReason),
}

/// Turn a parsed descriptor into a launchable candidate.
///
/// Only the first `[Desktop Entry]` group is consulted. The first
/// non-empty `Name=` and `Exec=` win; a `Type=` other than
/// `Application` rejects as soon as it is seen.
pub fn resolve(descriptor: &Descriptor, policy: ResolvePolicy) -> Resolution {
    let Some(group) = descriptor.group(DESKTOP_GROUP) else {
        return Resolution::NotApplicable;
    };

    let mut name: Option<&str> = None;
    let mut exec: Option<&str> = None;

    for entry in &group.entries {
        let value = entry.value.as_str();
        match entry.key {
            DesktopKey::Type if value != "Application" => {
                return Resolution::Rejected(RejectReason::NotApplication(value.to_string()));
            }
            DesktopKey::NoDisplay | DesktopKey::Hidden if policy.skip_hidden && value == "true" => {
                return Resolution::Rejected(RejectReason::NoDisplay);
            }
            DesktopKey::Name if name.is_none() && !value.is_empty() => name = Some(value),
            DesktopKey::Exec if exec.is_none() && !value.is_empty() => exec = Some(value),
            _ => {}
        }
    }

    match (name, exec) {
        (Some(n), Some(e)) => Resolution::Candidate(Candidate::new(n, e)),
        (None, _) => Resolution::Rejected(RejectReason::MissingName),
        (_, None) => Resolution::Rejected(RejectReason::MissingExec),
    }
}

/// Walker over the direct children of `dir`, symlinks not followed.
pub fn desktop_walker(dir: &Path, sorted: bool) -> WalkDir {
    let walker = WalkDir::new(dir).min_depth(1).max_depth(1).follow_links(false);
    if sorted { walker.sort_by_file_name() } else { walker }
}

/// Regular file whose name ends in `.desktop`.
pub fn is_desktop_file(entry: &DirEntry) -> bool {
    entry.file_type().is_file()
        && entry
            .file_name()
            .to_str()
            .is_some_and(|n| n.ends_with(".desktop"))
}

/// Candidates unique by display name, in insertion order.
#[derive(Debug, Default)]
struct CandidateList {
    candidates: Vec<Candidate>,
    seen: HashSet<String>,
}

impl CandidateList {
    /// Returns false when the name was already taken.
    fn push(&mut self, candidate: Candidate) -> bool {
        if self.seen.contains(&candidate.name) {
            return false;
        }
        self.seen.insert(candidate.name.clone());
        self.candidates.push(candidate);
        true
    }
}

pub struct DesktopSource {
    pub search_path: SearchPath,
    pub policy: ResolvePolicy,
    pub sort_entries: bool,
}

impl DesktopSource {
    pub fn new(search_path: SearchPath) -> Self {
        Self {
            search_path,
            policy: ResolvePolicy::default(),
            sort_entries: true,
        }
    }

    /// Resolve every directory of the search path, in order.
    pub fn resolve_all(&self) -> Result<Vec<Candidate>, LaunchError> {
        let mut list = CandidateList::default();
        let mut opened = 0usize;

        for dir in self.search_path.dirs() {
            if self.scan_dir(dir, &mut list) {
                opened += 1;
            }
        }

        if opened == 0 {
            return Err(LaunchError::SearchPathUnreadable(self.search_path.display()));
        }

        info!("DesktopSource: found {} entries", list.candidates.len());
        Ok(list.candidates)
    }

    /// Returns false if `dir` itself could not be opened.
    fn scan_dir(&self, dir: &Path, list: &mut CandidateList) -> bool {
        debug!("Scanning desktop files in {:?}", dir);

        for entry in desktop_walker(dir, self.sort_entries) {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) if err.depth() == 0 => {
                    debug!("Skipping search directory {:?}: {}", dir, err);
                    return false;
                }
                Err(err) => {
                    warn!("Cannot inspect entry in {:?}: {}", dir, err);
                    continue;
                }
            };

            if !is_desktop_file(&entry) {
                continue;
            }

            let path = entry.path();
            let descriptor = match parser::parse_file(path) {
                Ok(d) => d,
                Err(err) => {
                    warn!("{}", err);
                    continue;
                }
            };

            match resolve(&descriptor, self.policy) {
                Resolution::Candidate(candidate) => {
                    if !list.push(candidate) {
                        info!("duplicate name: ignoring file {:?}", path);
                    }
                }
                Resolution::NotApplicable => {
                    debug!("{:?} has no [{}] group", path, DESKTOP_GROUP);
                }
                Resolution::Rejected(reason) => {
                    debug!("Skipping {:?}: {:?}", path, reason);
                }
            }
        }

        true
    }
}

impl Source for DesktopSource {
    fn scan(&self) -> Result<Vec<Candidate>> {
        Ok(self.resolve_all()?)
    }
}
