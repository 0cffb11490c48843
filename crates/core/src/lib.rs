mod apply;
mod config;
mod number;
mod planner;
mod rename;
mod width;

pub use apply::{apply_plan, ApplyResult, FailurePolicy, RenameFailure};
pub use config::{app_paths, load_config, load_config_from, AppConfig, AppPaths, ReportFormat};
pub use number::{find_number, split_extension, AnchorMode, EmbeddedNumber, NumberMatch};
pub use planner::{
    generate_plan, PlanStats, PlannedAction, RenameCandidate, SortOptions, SortPlan,
};
pub use rename::{compute_new_name, rename_entry, RenameError};
pub use width::{detect_max_width, detect_width, WidthReport};
