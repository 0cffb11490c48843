use crate::number::{AnchorMode, EmbeddedNumber};
use crate::rename::{compute_new_name, path_occupied};
use crate::width::detect_width;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Run configuration, captured once and passed by reference to every pass.
#[derive(Debug, Clone)]
pub struct SortOptions {
    pub root: PathBuf,
    pub recursive: bool,
    pub anchor: AnchorMode,
    pub exclude_hidden: bool,
}

impl Default for SortOptions {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            recursive: false,
            anchor: AnchorMode::Prefix,
            exclude_hidden: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlannedAction {
    Rename,
    Unchanged,
    NoMatch,
    Hidden,
    Conflict,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenameCandidate {
    pub original_path: PathBuf,
    pub target_path: PathBuf,
    pub relative_original: PathBuf,
    pub relative_target: PathBuf,
    pub is_dir: bool,
    pub action: PlannedAction,
}

impl RenameCandidate {
    pub fn changed(&self) -> bool {
        self.original_path != self.target_path
    }

    pub fn report_line(&self) -> String {
        let from = self.relative_original.display();
        let to = self.relative_target.display();
        match self.action {
            PlannedAction::Rename => format!("{from} -> {to}"),
            PlannedAction::Unchanged => format!("{from} -> {to} (変更なし)"),
            PlannedAction::NoMatch => format!("{from} (スキップ: 番号なし)"),
            PlannedAction::Hidden => format!("{from} (スキップ: 隠しファイル)"),
            PlannedAction::Conflict => format!("{from} -> {to} (衝突: リネーム先が既に存在します)"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct PlanStats {
    pub scanned_entries: usize,
    pub skipped_hidden: usize,
    pub numbered: usize,
    pub planned: usize,
    pub unchanged: usize,
    pub no_match: usize,
    pub conflicts: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SortPlan {
    pub root: PathBuf,
    pub anchor: AnchorMode,
    pub recursive: bool,
    pub width: usize,
    pub max_number: Option<EmbeddedNumber>,
    pub candidates: Vec<RenameCandidate>,
    pub stats: PlanStats,
}

#[derive(Debug, Clone)]
struct SnapshotEntry {
    path: PathBuf,
    name: Option<String>,
    is_dir: bool,
    hidden: bool,
}

pub fn generate_plan(options: &SortOptions) -> Result<SortPlan> {
    if !options.root.exists() {
        anyhow::bail!("フォルダが存在しません: {}", options.root.display());
    }
    if !options.root.is_dir() {
        anyhow::bail!("フォルダではありません: {}", options.root.display());
    }

    let mut stats = PlanStats::default();
    let entries = collect_entries(
        &options.root,
        options.recursive,
        options.exclude_hidden,
        &mut stats,
    )?;

    let report = detect_width(
        entries
            .iter()
            .filter(|entry| !entry.hidden)
            .filter_map(|entry| entry.name.as_deref()),
        options.anchor,
    );
    stats.numbered = report.numbered;

    let mut candidates = Vec::with_capacity(entries.len());
    let mut claimed_targets = HashSet::<PathBuf>::new();

    for entry in entries {
        let new_name = entry
            .name
            .as_deref()
            .filter(|_| !entry.hidden)
            .and_then(|name| compute_new_name(name, options.anchor, report.width));

        let (target_path, action) = match new_name {
            None if entry.hidden => (entry.path.clone(), PlannedAction::Hidden),
            None => {
                stats.no_match += 1;
                (entry.path.clone(), PlannedAction::NoMatch)
            }
            Some(new_name) => {
                let target = sibling_path(&entry.path, &new_name)?;
                if target == entry.path {
                    stats.unchanged += 1;
                    (target, PlannedAction::Unchanged)
                } else if claimed_targets.contains(&target) || path_occupied(&target) {
                    tracing::warn!(
                        from = %entry.path.display(),
                        to = %target.display(),
                        "リネーム先が既に存在します"
                    );
                    stats.conflicts += 1;
                    (target, PlannedAction::Conflict)
                } else {
                    stats.planned += 1;
                    claimed_targets.insert(target.clone());
                    (target, PlannedAction::Rename)
                }
            }
        };

        candidates.push(RenameCandidate {
            relative_original: relative_to(&options.root, &entry.path),
            relative_target: relative_to(&options.root, &target_path),
            original_path: entry.path,
            target_path,
            is_dir: entry.is_dir,
            action,
        });
    }

    Ok(SortPlan {
        root: options.root.clone(),
        anchor: options.anchor,
        recursive: options.recursive,
        width: report.width,
        max_number: report.max_number,
        candidates,
        stats,
    })
}

impl SortPlan {
    pub fn pending(&self) -> impl Iterator<Item = &RenameCandidate> {
        self.candidates
            .iter()
            .filter(|candidate| candidate.action == PlannedAction::Rename)
    }
}

/// Recursive listings are contents-first so that a directory is always
/// renamed after everything beneath it. Excluded hidden entries stay in the
/// snapshot as skip lines; anything beneath an excluded directory is dropped.
fn collect_entries(
    root: &Path,
    recursive: bool,
    exclude_hidden: bool,
    stats: &mut PlanStats,
) -> Result<Vec<SnapshotEntry>> {
    let mut out = Vec::new();

    if recursive {
        let walker = WalkDir::new(root)
            .min_depth(1)
            .contents_first(true)
            .sort_by_file_name();

        for entry in walker {
            let entry =
                entry.with_context(|| format!("フォルダ走査に失敗しました: {}", root.display()))?;
            if exclude_hidden && has_hidden_ancestor(root, entry.path()) {
                continue;
            }
            let hidden = exclude_hidden && is_hidden(entry.path());
            tally(stats, hidden);
            out.push(SnapshotEntry {
                name: entry.file_name().to_str().map(str::to_string),
                is_dir: entry.file_type().is_dir(),
                hidden,
                path: entry.into_path(),
            });
        }
    } else {
        for entry in fs::read_dir(root)
            .with_context(|| format!("フォルダを読めませんでした: {}", root.display()))?
        {
            let entry =
                entry.with_context(|| format!("エントリ読み取り失敗: {}", root.display()))?;
            let file_type = entry
                .file_type()
                .with_context(|| format!("種別を取得できませんでした: {}", entry.path().display()))?;
            let path = entry.path();
            let hidden = exclude_hidden && is_hidden(&path);
            tally(stats, hidden);
            out.push(SnapshotEntry {
                name: entry.file_name().to_str().map(str::to_string),
                is_dir: file_type.is_dir(),
                hidden,
                path,
            });
        }
        out.sort_by(|a, b| a.path.cmp(&b.path));
    }

    Ok(out)
}

fn tally(stats: &mut PlanStats, hidden: bool) {
    if hidden {
        stats.skipped_hidden += 1;
    } else {
        stats.scanned_entries += 1;
    }
}

fn has_hidden_ancestor(root: &Path, path: &Path) -> bool {
    path.strip_prefix(root)
        .ok()
        .and_then(Path::parent)
        .map(|parent| {
            parent
                .components()
                .any(|part| part.as_os_str().to_string_lossy().starts_with('.'))
        })
        .unwrap_or(false)
}

fn sibling_path(path: &Path, name: &str) -> Result<PathBuf> {
    let parent = path
        .parent()
        .with_context(|| format!("親ディレクトリを取得できませんでした: {}", path.display()))?;
    Ok(parent.join(name))
}

fn relative_to(root: &Path, path: &Path) -> PathBuf {
    path.strip_prefix(root)
        .map(Path::to_path_buf)
        .unwrap_or_else(|_| path.to_path_buf())
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .map(|name| name.to_string_lossy().starts_with('.'))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn touch(path: &Path) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create parent");
        }
        fs::write(path, b"x").expect("write file");
    }

    fn options(root: &Path) -> SortOptions {
        SortOptions {
            root: root.to_path_buf(),
            ..SortOptions::default()
        }
    }

    fn lines(plan: &SortPlan) -> Vec<String> {
        plan.candidates.iter().map(RenameCandidate::report_line).collect()
    }

    #[test]
    fn plans_prefix_padding_for_flat_directory() {
        let temp = tempdir().expect("tempdir");
        for name in ["1.txt", "2.txt", "15.txt", "notes.md"] {
            touch(&temp.path().join(name));
        }

        let plan = generate_plan(&options(temp.path())).expect("plan");
        assert_eq!(plan.width, 2);
        assert_eq!(
            lines(&plan),
            vec![
                "1.txt -> 01.txt",
                "15.txt -> 15.txt (変更なし)",
                "2.txt -> 02.txt",
                "notes.md (スキップ: 番号なし)",
            ]
        );
        assert_eq!(plan.stats.planned, 2);
        assert_eq!(plan.stats.unchanged, 1);
        assert_eq!(plan.stats.no_match, 1);
    }

    #[test]
    fn suffix_mode_pads_trailing_numbers() {
        let temp = tempdir().expect("tempdir");
        for name in ["track-7", "track-8", "track-20"] {
            touch(&temp.path().join(name));
        }

        let plan = generate_plan(&SortOptions {
            anchor: AnchorMode::Suffix,
            ..options(temp.path())
        })
        .expect("plan");

        let targets: Vec<_> = plan
            .candidates
            .iter()
            .map(|c| c.relative_target.to_string_lossy().to_string())
            .collect();
        assert_eq!(targets, vec!["track-20", "track-07", "track-08"]);
    }

    #[test]
    fn planning_never_touches_the_filesystem() {
        let temp = tempdir().expect("tempdir");
        touch(&temp.path().join("3.txt"));
        touch(&temp.path().join("12.txt"));

        generate_plan(&options(temp.path())).expect("plan");
        assert!(temp.path().join("3.txt").exists());
        assert!(!temp.path().join("03.txt").exists());
    }

    #[test]
    fn existing_target_is_marked_as_conflict() {
        let temp = tempdir().expect("tempdir");
        touch(&temp.path().join("09.txt"));
        touch(&temp.path().join("9.txt"));
        touch(&temp.path().join("10.txt"));

        let plan = generate_plan(&options(temp.path())).expect("plan");
        let nine = plan
            .candidates
            .iter()
            .find(|c| c.relative_original == Path::new("9.txt"))
            .expect("9.txt candidate");
        assert_eq!(nine.action, PlannedAction::Conflict);
        assert_eq!(nine.relative_target, PathBuf::from("09.txt"));
        assert_eq!(plan.stats.conflicts, 1);
    }

    #[test]
    fn duplicate_targets_within_a_run_conflict() {
        let temp = tempdir().expect("tempdir");
        // Both normalise to "07-a.txt" at width 2 and neither exists yet.
        touch(&temp.path().join("007-a.txt"));
        touch(&temp.path().join("7-a.txt"));
        touch(&temp.path().join("10-b.txt"));

        let plan = generate_plan(&options(temp.path())).expect("plan");
        let actions: Vec<_> = plan.candidates.iter().map(|c| c.action).collect();
        assert_eq!(
            actions,
            vec![
                PlannedAction::Rename,
                PlannedAction::Unchanged,
                PlannedAction::Conflict
            ]
        );
    }

    #[test]
    fn recursive_width_is_global_and_children_come_first() {
        let temp = tempdir().expect("tempdir");
        touch(&temp.path().join("1").join("2.txt"));
        touch(&temp.path().join("deep").join("nested").join("100.txt"));

        let plan = generate_plan(&SortOptions {
            recursive: true,
            ..options(temp.path())
        })
        .expect("plan");
        assert_eq!(plan.width, 3);

        let order: Vec<_> = plan
            .candidates
            .iter()
            .map(|c| c.relative_original.clone())
            .collect();
        let child = order
            .iter()
            .position(|p| p == &Path::new("1").join("2.txt"))
            .expect("child");
        let parent = order
            .iter()
            .position(|p| p == Path::new("1"))
            .expect("parent");
        assert!(child < parent);

        let parent_candidate = &plan.candidates[parent];
        assert!(parent_candidate.is_dir);
        assert_eq!(parent_candidate.relative_target, PathBuf::from("001"));
        assert_eq!(
            plan.candidates[child].relative_target,
            Path::new("1").join("002.txt")
        );
    }

    #[test]
    fn non_recursive_ignores_nested_numbers() {
        let temp = tempdir().expect("tempdir");
        touch(&temp.path().join("4.txt"));
        touch(&temp.path().join("sub").join("1000.txt"));

        let plan = generate_plan(&options(temp.path())).expect("plan");
        assert_eq!(plan.width, 1);
        assert_eq!(plan.candidates.len(), 2);
    }

    #[test]
    fn hidden_entries_take_part_by_default() {
        let temp = tempdir().expect("tempdir");
        touch(&temp.path().join("1.txt"));
        touch(&temp.path().join(".cache").join("500.bin"));

        let plan = generate_plan(&SortOptions {
            recursive: true,
            ..options(temp.path())
        })
        .expect("plan");
        assert_eq!(plan.width, 3);
        assert_eq!(plan.stats.skipped_hidden, 0);
        let one = plan
            .candidates
            .iter()
            .find(|c| c.relative_original == Path::new("1.txt"))
            .expect("1.txt candidate");
        assert_eq!(one.relative_target, PathBuf::from("001.txt"));
    }

    #[test]
    fn excluded_hidden_directory_keeps_later_siblings() {
        let temp = tempdir().expect("tempdir");
        touch(&temp.path().join(".cache").join("500.bin"));
        touch(&temp.path().join("1.txt"));
        touch(&temp.path().join("12.txt"));

        let plan = generate_plan(&SortOptions {
            recursive: true,
            exclude_hidden: true,
            ..options(temp.path())
        })
        .expect("plan");
        assert_eq!(plan.width, 2);
        assert_eq!(
            lines(&plan),
            vec![
                ".cache (スキップ: 隠しファイル)",
                "1.txt -> 01.txt",
                "12.txt -> 12.txt (変更なし)",
            ]
        );
        assert_eq!(plan.stats.skipped_hidden, 1);
    }

    #[test]
    fn excluded_hidden_files_still_get_a_report_line() {
        let temp = tempdir().expect("tempdir");
        for name in [".notes-3.txt", "a-7.txt", "b-12.txt"] {
            touch(&temp.path().join(name));
        }
        let suffix = SortOptions {
            anchor: AnchorMode::Suffix,
            ..options(temp.path())
        };

        let plan = generate_plan(&suffix).expect("plan");
        assert_eq!(lines(&plan)[0], ".notes-3.txt -> .notes-03.txt");

        let plan = generate_plan(&SortOptions {
            exclude_hidden: true,
            ..suffix
        })
        .expect("plan");
        assert_eq!(
            lines(&plan),
            vec![
                ".notes-3.txt (スキップ: 隠しファイル)",
                "a-7.txt -> a-07.txt",
                "b-12.txt -> b-12.txt (変更なし)",
            ]
        );
    }

    #[cfg(unix)]
    #[test]
    fn symlinked_directory_is_not_classified_as_directory() {
        let temp = tempdir().expect("tempdir");
        fs::create_dir_all(temp.path().join("real")).expect("create dir");
        std::os::unix::fs::symlink(temp.path().join("real"), temp.path().join("7-link"))
            .expect("symlink");

        for recursive in [false, true] {
            let plan = generate_plan(&SortOptions {
                recursive,
                ..options(temp.path())
            })
            .expect("plan");
            let link = plan
                .candidates
                .iter()
                .find(|c| c.relative_original == Path::new("7-link"))
                .expect("link candidate");
            assert!(!link.is_dir);
        }
    }

    #[test]
    fn no_numbers_leaves_everything_alone() {
        let temp = tempdir().expect("tempdir");
        touch(&temp.path().join("a.txt"));
        touch(&temp.path().join("b.txt"));

        let plan = generate_plan(&options(temp.path())).expect("plan");
        assert_eq!(plan.width, 0);
        assert_eq!(plan.pending().count(), 0);
    }

    #[test]
    fn missing_root_is_an_error() {
        let temp = tempdir().expect("tempdir");
        let err = generate_plan(&options(&temp.path().join("absent"))).expect_err("missing root");
        assert!(err.to_string().contains("フォルダが存在しません"));
    }

    #[test]
    fn plan_serialises_to_json() {
        let temp = tempdir().expect("tempdir");
        touch(&temp.path().join("5.txt"));
        touch(&temp.path().join("10.txt"));

        let plan = generate_plan(&options(temp.path())).expect("plan");
        let json = serde_json::to_value(&plan).expect("json");
        assert_eq!(json["width"], 2);
        assert_eq!(json["anchor"], "prefix");
        assert_eq!(json["max_number"], "10");
        assert_eq!(json["candidates"][1]["action"], "rename");
    }
}
