//! Sheet naming
//!
//! A sheet is named after its input file, or after the directory holding it
//! when the file is simply called `<tool>.json`. Excel limits names to 31
//! characters, forbids a few punctuation characters and compares names
//! case-insensitively; collisions are resolved with a numeric `_<n>` suffix.

use crate::error::{ReportError, Result};
use std::collections::HashSet;
use std::path::Path;

/// Longest base name kept from a file or directory name
pub const MAX_BASE_LEN: usize = 30;

/// Excel's hard limit on sheet name length
pub const EXCEL_NAME_LIMIT: usize = 31;

/// Candidates tried before giving up on a name
pub const MAX_ATTEMPTS: usize = 1000;

const FORBIDDEN: [char; 7] = ['[', ']', ':', '*', '?', '/', '\\'];

/// Keep only the last `n` characters of `s`
fn tail(s: &str, n: usize) -> &str {
    let count = s.chars().count();
    if count <= n {
        return s;
    }
    match s.char_indices().nth(count - n) {
        Some((idx, _)) => &s[idx..],
        None => s,
    }
}

/// Base sheet name for an input file produced by `tool`
///
/// `results/run1/geninfo.json` with tool `geninfo` becomes `run1`;
/// `results/run1/data.json` becomes `data.json`. Names longer than
/// [`MAX_BASE_LEN`] keep their tail.
pub fn derive_sheet_name(path: &Path, tool: &str) -> String {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let stem = path
        .file_stem()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    let name = if stem == tool {
        path.parent()
            .and_then(|p| p.file_name())
            .map(|n| n.to_string_lossy().into_owned())
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| tool.to_string())
    } else {
        file_name
    };

    tail(&name, MAX_BASE_LEN).to_string()
}

/// Replace characters Excel rejects in sheet names
pub fn sanitize(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| if FORBIDDEN.contains(&c) { '_' } else { c })
        .collect();

    // names may not begin or end with an apostrophe
    let cleaned = match cleaned.strip_prefix('\'') {
        Some(rest) => format!("_{}", rest),
        None => cleaned,
    };
    let cleaned = match cleaned.strip_suffix('\'') {
        Some(rest) => format!("{}_", rest),
        None => cleaned,
    };

    if cleaned.is_empty() {
        "sheet".to_string()
    } else {
        cleaned
    }
}

/// Names already handed out in one workbook
#[derive(Debug, Default)]
pub struct SheetNameRegistry {
    taken: HashSet<String>,
}

impl SheetNameRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.taken.contains(&name.to_lowercase())
    }

    /// Claim `base` or the first free `base_<n>`
    ///
    /// Fails after [`MAX_ATTEMPTS`] candidates are all taken.
    pub fn reserve(&mut self, base: &str) -> Result<String> {
        let base = sanitize(base);

        let mut candidate = tail(&base, EXCEL_NAME_LIMIT).to_string();
        for n in 1..=MAX_ATTEMPTS {
            if self.taken.insert(candidate.to_lowercase()) {
                return Ok(candidate);
            }
            let suffixed = format!("{}_{}", base, n);
            candidate = tail(&suffixed, EXCEL_NAME_LIMIT).to_string();
        }

        Err(ReportError::SheetNamesExhausted {
            name: base,
            attempts: MAX_ATTEMPTS,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_derive_uses_file_name() {
        let path = PathBuf::from("results/run1/data.json");
        assert_eq!(derive_sheet_name(&path, "geninfo"), "data.json");
    }

    #[test]
    fn test_derive_uses_directory_for_tool_named_file() {
        let path = PathBuf::from("results/run1/geninfo.json");
        assert_eq!(derive_sheet_name(&path, "geninfo"), "run1");
    }

    #[test]
    fn test_derive_falls_back_to_tool_without_directory() {
        let path = PathBuf::from("lcov.json");
        assert_eq!(derive_sheet_name(&path, "lcov"), "lcov");
    }

    #[test]
    fn test_derive_keeps_last_thirty_chars() {
        let long = "a_really_long_profile_name_from_ci_job_12345.json";
        let name = derive_sheet_name(Path::new(long), "geninfo");
        assert_eq!(name.chars().count(), 30);
        assert_eq!(name, &long[long.len() - 30..]);
    }

    #[test]
    fn test_tail_is_char_boundary_safe() {
        assert_eq!(tail("ééééé", 3), "ééé");
        assert_eq!(tail("ab", 3), "ab");
    }

    #[test]
    fn test_sanitize() {
        assert_eq!(sanitize("run[1]:a*b?"), "run_1__a_b_");
        assert_eq!(sanitize("'quoted'"), "_quoted_");
        assert_eq!(sanitize(""), "sheet");
    }

    #[test]
    fn test_reserve_suffixes_collisions() {
        let mut names = SheetNameRegistry::new();
        assert_eq!(names.reserve("data.json").unwrap(), "data.json");
        assert_eq!(names.reserve("data.json").unwrap(), "data.json_1");
        assert_eq!(names.reserve("data.json").unwrap(), "data.json_2");
    }

    #[test]
    fn test_reserve_is_case_insensitive() {
        let mut names = SheetNameRegistry::new();
        names.reserve("Run").unwrap();
        assert_eq!(names.reserve("run").unwrap(), "run_1");
        assert!(names.contains("RUN_1"));
    }

    #[test]
    fn test_reserve_suffixed_name_fits_excel_limit() {
        let mut names = SheetNameRegistry::new();
        let base = "x".repeat(30);
        names.reserve(&base).unwrap();
        let second = names.reserve(&base).unwrap();
        assert_eq!(second.chars().count(), EXCEL_NAME_LIMIT);
        assert!(second.ends_with("_1"));
    }

    #[test]
    fn test_reserve_gives_up_after_max_attempts() {
        let mut names = SheetNameRegistry::new();
        for _ in 0..MAX_ATTEMPTS {
            names.reserve("busy").unwrap();
        }
        let err = names.reserve("busy").unwrap_err();
        assert!(matches!(err, ReportError::SheetNamesExhausted { .. }));
    }
}
