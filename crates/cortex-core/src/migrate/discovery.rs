//! Workspace file discovery.

use chrono::NaiveDate;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::config::ExtractionConfig;
use crate::error::{Error, Result};
use crate::types::{FileDescriptor, FileType, Shard};

/// Directory holding dated daily notes.
pub const DAILY_NOTES_DIR: &str = "memory";

/// Conventional directories scanned for additional markdown.
pub const EXTRA_DIRS: &[&str] = &["notes", "knowledge", "projects"];

const DAILY_NOTE_PRIORITY: u32 = 10;
const EXTRA_PRIORITY: u32 = 20;
const OTHER_PRIORITY: u32 = 30;
const MAX_EXTRA_DEPTH: usize = 4;

/// Known top-level files: name, role, shard hint, priority.
const KNOWN_FILES: &[(&str, FileType, Shard, u32)] = &[
    ("MEMORY.md", FileType::Memory, Shard::Mixed, 1),
    ("USER.md", FileType::User, Shard::Semantic, 2),
    ("IDENTITY.md", FileType::Identity, Shard::Semantic, 3),
    ("SOUL.md", FileType::Soul, Shard::Semantic, 4),
    ("AGENTS.md", FileType::Agents, Shard::Procedural, 5),
    ("TOOLS.md", FileType::Tools, Shard::Procedural, 6),
    ("HEARTBEAT.md", FileType::Heartbeat, Shard::Procedural, 7),
];

/// A discovered file with its size, as listed by scan mode.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanEntry {
    #[serde(flatten)]
    pub file: FileDescriptor,
    pub bytes: u64,
    pub chars: usize,
}

/// True for `YYYY-MM-DD.md` naming a real calendar date.
pub fn is_daily_note_name(name: &str) -> bool {
    let Some(stem) = name.strip_suffix(".md") else {
        return false;
    };
    stem.len() == 10 && NaiveDate::parse_from_str(stem, "%Y-%m-%d").is_ok()
}

fn relative(path: &Path, root: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

fn is_markdown(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("md"))
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.starts_with('.'))
}

fn sorted_entries(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut entries: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| !is_hidden(p))
        .collect();
    entries.sort();
    Ok(entries)
}

fn collect_markdown(dir: &Path, depth: usize, out: &mut Vec<PathBuf>) -> Result<()> {
    for path in sorted_entries(dir)? {
        if path.is_dir() {
            if depth < MAX_EXTRA_DEPTH {
                collect_markdown(&path, depth + 1, out)?;
            }
        } else if is_markdown(&path) {
            out.push(path);
        }
    }
    Ok(())
}

/// Describe one file named explicitly, inferring its role from its name.
pub fn describe_file(path: &Path, root: Option<&Path>) -> FileDescriptor {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let relative_path = match root {
        Some(root) => relative(path, root),
        None => name.clone(),
    };

    if let Some((_, file_type, hint, priority)) = KNOWN_FILES.iter().find(|(n, ..)| *n == name) {
        return FileDescriptor {
            path: path.to_path_buf(),
            relative_path,
            shard_hint: *hint,
            priority: *priority,
            file_type: *file_type,
        };
    }
    let (file_type, shard_hint, priority) = if is_daily_note_name(&name) {
        (FileType::DailyNote, Shard::Episodic, DAILY_NOTE_PRIORITY)
    } else {
        (FileType::Other, Shard::Mixed, OTHER_PRIORITY)
    };
    FileDescriptor {
        path: path.to_path_buf(),
        relative_path,
        shard_hint,
        priority,
        file_type,
    }
}

/// Find migratable files in a workspace, lowest priority number first.
pub fn discover(workspace: &Path) -> Result<Vec<FileDescriptor>> {
    if !workspace.is_dir() {
        return Err(Error::invalid_input(format!(
            "workspace is not a directory: {}",
            workspace.display()
        )));
    }

    let mut files = Vec::new();
    for (name, file_type, hint, priority) in KNOWN_FILES {
        let path = workspace.join(name);
        if path.is_file() {
            files.push(FileDescriptor {
                relative_path: relative(&path, workspace),
                path,
                shard_hint: *hint,
                priority: *priority,
                file_type: *file_type,
            });
        }
    }

    let daily = workspace.join(DAILY_NOTES_DIR);
    if daily.is_dir() {
        for path in sorted_entries(&daily)? {
            let is_note = path.is_file()
                && path
                    .file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(is_daily_note_name);
            if is_note {
                files.push(FileDescriptor {
                    relative_path: relative(&path, workspace),
                    path,
                    shard_hint: Shard::Episodic,
                    priority: DAILY_NOTE_PRIORITY,
                    file_type: FileType::DailyNote,
                });
            }
        }
    }

    for dir in EXTRA_DIRS {
        let root = workspace.join(dir);
        if !root.is_dir() {
            continue;
        }
        let mut found = Vec::new();
        collect_markdown(&root, 0, &mut found)?;
        files.extend(found.into_iter().map(|path| FileDescriptor {
            relative_path: relative(&path, workspace),
            path,
            shard_hint: Shard::Mixed,
            priority: EXTRA_PRIORITY,
            file_type: FileType::Note,
        }));
    }

    files.sort_by(|a, b| a.priority.cmp(&b.priority).then_with(|| a.path.cmp(&b.path)));
    debug!(workspace = %workspace.display(), files = files.len(), "Discovery finished");
    Ok(files)
}

/// Discovered files with enough content to migrate.
pub fn scan(workspace: &Path, config: &ExtractionConfig) -> Result<Vec<ScanEntry>> {
    let mut entries = Vec::new();
    for file in discover(workspace)? {
        let Ok(text) = fs::read_to_string(&file.path) else {
            continue;
        };
        let chars = text.trim().chars().count();
        if chars < config.min_file_chars {
            continue;
        }
        entries.push(ScanEntry {
            bytes: text.len() as u64,
            chars,
            file,
        });
    }
    Ok(entries)
}
