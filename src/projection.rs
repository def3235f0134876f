use crate::{
    engine::{ImagingEngine, StackHandle},
    enums::{ImageClassification, ProjectionOutcome},
    error::ScanError,
    instrument::{VENDOR_A_EXTENSION, VENDOR_A_SCAN_SUFFIX},
};

use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectionAction {
    /// Collapse depth by maximum intensity, keep every frame.
    Project,
    PassThrough,
    Skip,
}

impl ProjectionAction {
    pub fn outcome(self) -> ProjectionOutcome {
        match self {
            ProjectionAction::Project => ProjectionOutcome::Projected,
            ProjectionAction::PassThrough => ProjectionOutcome::PassedThrough,
            ProjectionAction::Skip => ProjectionOutcome::Skipped,
        }
    }
}

/// Pick what to do with a built stack.
///
/// Depth stacks are always kept as they are. Time series are projected when
/// `project` is set, unless they only have one depth plane, in which case
/// there is nothing to collapse and nothing is written.
pub fn decide(
    classification: ImageClassification,
    project: bool,
    single_depth_plane: bool,
) -> ProjectionAction {
    match (classification, project, single_depth_plane) {
        (ImageClassification::DepthStack, _, _) => ProjectionAction::PassThrough,
        (ImageClassification::TimeSeries, true, true) => ProjectionAction::Skip,
        (ImageClassification::TimeSeries, true, false) => ProjectionAction::Project,
        (ImageClassification::TimeSeries, false, _) => ProjectionAction::PassThrough,
    }
}

/// Scan name for output files: no `_raw` title suffix, no vendor tokens.
pub fn output_name(title: &str) -> String {
    let initiator_suffix = format!(".{VENDOR_A_EXTENSION}");
    let mut name = title;
    for suffix in [".tif", "_raw", VENDOR_A_SCAN_SUFFIX, initiator_suffix.as_str()] {
        name = name.strip_suffix(suffix).unwrap_or(name);
    }
    name.to_string()
}

/// Run the decided action on `stack` and write its result into `output_dir`.
pub fn apply<E: ImagingEngine + ?Sized>(
    engine: &mut E,
    stack: StackHandle,
    classification: ImageClassification,
    project: bool,
    output_dir: &Path,
) -> Result<ProjectionOutcome, ScanError> {
    let shape = engine.shape(&stack)?;
    info!("The number of channels is {}", shape.channels);
    info!("The number of z-planes is {}", shape.slices);

    let action = decide(classification, project, shape.is_single_depth_plane());
    let name = output_name(&stack.title);

    match action {
        ProjectionAction::PassThrough => {
            let path = output_path(output_dir, &name, "");
            engine.save_tiff(&stack, &path)?;
            info!("Saved {} unchanged to {}", name, path.display());
        }
        ProjectionAction::Skip => {
            info!("Single plane data detected. Skipping Z-projection for {}", name);
        }
        ProjectionAction::Project => {
            let projected = engine.max_project(&stack)?;
            let path = output_path(output_dir, &name, "MAX_");
            engine.save_tiff(&projected, &path)?;
            engine.close(stack);
            info!("Saved max projection of {} to {}", name, path.display());
        }
    }
    Ok(action.outcome())
}

fn output_path(output_dir: &Path, name: &str, prefix: &str) -> PathBuf {
    output_dir.join(format!("{prefix}{name}.tif"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decision_table_is_total() {
        use ImageClassification::*;
        use ProjectionAction::*;

        let cases = [
            (DepthStack, true, true, PassThrough),
            (DepthStack, true, false, PassThrough),
            (DepthStack, false, true, PassThrough),
            (DepthStack, false, false, PassThrough),
            (TimeSeries, true, true, Skip),
            (TimeSeries, true, false, Project),
            (TimeSeries, false, true, PassThrough),
            (TimeSeries, false, false, PassThrough),
        ];
        for (classification, project, single, expected) in cases {
            assert_eq!(
                decide(classification, project, single),
                expected,
                "{classification:?} project={project} single={single}"
            );
        }
    }

    #[test]
    fn outcomes_follow_actions() {
        assert_eq!(ProjectionAction::Project.outcome(), ProjectionOutcome::Projected);
        assert_eq!(ProjectionAction::PassThrough.outcome(), ProjectionOutcome::PassedThrough);
        assert_eq!(ProjectionAction::Skip.outcome(), ProjectionOutcome::Skipped);
    }

    #[test]
    fn output_names_drop_vendor_tokens() {
        assert_eq!(output_name("scan1_raw"), "scan1");
        assert_eq!(output_name("sample.oif.files"), "sample");
        assert_eq!(output_name("sample.oif"), "sample");
        assert_eq!(output_name("sample_raw.tif"), "sample");
        assert_eq!(output_name("plain"), "plain");
    }
}
