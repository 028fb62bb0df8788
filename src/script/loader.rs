use crate::error::{Error, Result};
use crate::script::substitute::PASSWORD_PLACEHOLDER;
use crate::script::{parse, Script, ScriptFile};
use log::debug;
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};

/// Name given to the script file built from `--command`.
pub const ADHOC_NAME: &str = "command";

/// Reads every script file below `dir` and parses it.
pub fn load_dir(dir: &Path) -> Result<Vec<ScriptFile>> {
    let files = load_all(dir)?
        .into_iter()
        .map(|(name, content)| parse(&name, content.trim()))
        .collect::<Result<Vec<ScriptFile>>>()?;

    if files.is_empty() {
        return Err(Error::NoScripts {
            path: dir.to_path_buf(),
        });
    }

    Ok(files)
}

/// Returns `(file name, content)` for every script file below `dir`, in
/// lexical path order. Hidden files and editor backups are skipped.
pub fn load_all(dir: &Path) -> Result<Vec<(String, String)>> {
    debug!("loading scripts in directory: {}", dir.display());

    let exclude_pattern = Regex::new(r"^\.|~$").map_err(|e| Error::Config(e.to_string()))?;
    let mut paths = Vec::new();
    collect_files(dir, &exclude_pattern, &mut paths)?;
    paths.sort();

    paths
        .into_iter()
        .map(|path| {
            let content = fs::read_to_string(&path).map_err(|source| Error::Load {
                path: path.clone(),
                source,
            })?;
            let name = path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.display().to_string());
            Ok((name, content))
        })
        .collect()
}

fn collect_files(dir: &Path, exclude_pattern: &Regex, paths: &mut Vec<PathBuf>) -> Result<()> {
    let entries = fs::read_dir(dir).map_err(|source| Error::Load {
        path: dir.to_path_buf(),
        source,
    })?;

    for entry in entries {
        let entry = entry.map_err(|source| Error::Load {
            path: dir.to_path_buf(),
            source,
        })?;
        let entry_path = entry.path();
        let file_name = entry.file_name();

        if exclude_pattern.is_match(&file_name.to_string_lossy()) {
            debug!("skipping excluded file: {}", entry_path.display());
            continue;
        }

        if entry_path.is_dir() {
            collect_files(&entry_path, exclude_pattern, paths)?;
        } else {
            paths.push(entry_path);
        }
    }

    Ok(())
}

/// Wraps a single command line into a script file. With `pw`, the password
/// is fed to the command on stdin.
pub fn adhoc(command: &str, pw: bool) -> Result<ScriptFile> {
    let command = command.trim();
    if command.is_empty() {
        return Err(Error::Parse {
            name: ADHOC_NAME.to_string(),
        });
    }

    let stdin: &[&str] = if pw { &[PASSWORD_PLACEHOLDER] } else { &[] };
    Ok(ScriptFile {
        name: ADHOC_NAME.to_string(),
        scripts: vec![Script::new(command, stdin)],
    })
}
