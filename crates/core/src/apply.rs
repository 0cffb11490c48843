use crate::planner::{PlannedAction, RenameCandidate, SortPlan};
use crate::rename::{rename_entry, RenameError};
use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    #[default]
    SkipAndContinue,
    Abort,
}

impl FailurePolicy {
    pub fn from_strict_flag(strict: bool) -> Self {
        if strict {
            Self::Abort
        } else {
            Self::SkipAndContinue
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenameFailure {
    pub original_path: PathBuf,
    pub target_path: PathBuf,
    pub conflict: bool,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ApplyResult {
    pub applied: usize,
    pub unchanged: usize,
    pub skipped: usize,
    pub failures: Vec<RenameFailure>,
}

pub fn apply_plan(plan: &SortPlan, policy: FailurePolicy) -> Result<ApplyResult> {
    validate_candidates(plan)?;

    let mut result = ApplyResult::default();
    for candidate in &plan.candidates {
        let outcome = match candidate.action {
            PlannedAction::Unchanged => {
                result.unchanged += 1;
                continue;
            }
            PlannedAction::NoMatch | PlannedAction::Hidden => {
                result.skipped += 1;
                continue;
            }
            PlannedAction::Conflict => Err(RenameError::Conflict {
                from: candidate.original_path.clone(),
                to: candidate.target_path.clone(),
            }),
            PlannedAction::Rename => {
                rename_entry(&candidate.original_path, &candidate.target_path)
            }
        };

        match outcome {
            Ok(()) => {
                tracing::debug!(
                    from = %candidate.original_path.display(),
                    to = %candidate.target_path.display(),
                    "リネームしました"
                );
                result.applied += 1;
            }
            Err(err) => {
                tracing::warn!("{}", describe(&err));
                if policy == FailurePolicy::Abort {
                    return Err(anyhow::Error::from(err)
                        .context("厳格モードのため残りのリネームを中止しました"));
                }
                result.failures.push(RenameFailure {
                    original_path: candidate.original_path.clone(),
                    target_path: candidate.target_path.clone(),
                    conflict: err.is_conflict(),
                    reason: describe(&err),
                });
            }
        }
    }

    Ok(result)
}

/// Rejects plans that would move anything out of the run root or across
/// directories; padding only ever changes the final path component.
fn validate_candidates(plan: &SortPlan) -> Result<()> {
    for candidate in plan.candidates.iter().filter(|c| c.changed()) {
        if !candidate.original_path.starts_with(&plan.root) {
            bail!(
                "対象フォルダ外の元ファイルは適用できません: {}",
                candidate.original_path.display()
            );
        }
        if !same_parent(candidate) {
            bail!(
                "別フォルダへのリネームは適用できません: {} -> {}",
                candidate.original_path.display(),
                candidate.target_path.display()
            );
        }
    }
    Ok(())
}

fn same_parent(candidate: &RenameCandidate) -> bool {
    match (
        candidate.original_path.parent(),
        candidate.target_path.parent(),
    ) {
        (Some(from), Some(to)) => from == to,
        _ => false,
    }
}

fn describe(err: &RenameError) -> String {
    match err {
        RenameError::Filesystem { source, .. } => format!("{err}: {source}"),
        RenameError::Conflict { .. } => err.to_string(),
    }
}
