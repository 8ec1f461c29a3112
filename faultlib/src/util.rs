use std::fs;
use std::path::{Path, PathBuf};
use chrono::NaiveDateTime;
use lazy_static::lazy_static;
use regex::Regex;

/// A result file found on disk, with the time its run started
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultFile {
    pub path: PathBuf,
    pub started: NaiveDateTime,
}

lazy_static! {
    static ref RESULT_FILE_PATTERN: Regex =
        Regex::new(r"^faults_(?P<stamp>\d{2}-\d{2}-\d{4}_\d{2}:\d{2}:\d{2})\.csv$").expect("result file pattern is valid");
}

/// Parses the start time back out of a result file name, or None if the name doesn't follow
/// the result file pattern
pub fn parse_result_file_name(file_name: &str) -> Option<NaiveDateTime> {
    let tokens = RESULT_FILE_PATTERN.captures(file_name)?;
    NaiveDateTime::parse_from_str(tokens.name("stamp")?.as_str(), "%m-%d-%Y_%H:%M:%S").ok()
}

/// Lists the result files in a directory, oldest run first
pub fn find_result_files(directory: &Path) -> std::io::Result<Vec<ResultFile>> {
    let entries = fs::read_dir(directory)?;
    let mut out = Vec::new();
    for entry in entries {
        let entry = entry?;
        // Non UTF-8 names can't match the pattern
        let Ok(file_name) = entry.file_name().into_string() else {
            continue;
        };
        if let Some(started) = parse_result_file_name(&file_name) {
            out.push(ResultFile {
                path: entry.path(),
                started,
            });
        }
    }
    out.sort_by(|a, b| a.started.cmp(&b.started).then_with(|| a.path.cmp(&b.path)));
    Ok(out)
}
