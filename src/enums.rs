use std::fmt;

/// File layout convention of the microscope that produced a root directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Convention {
    /// Olympus: `<base>.oif` initiators with `<base>.oif.files` companions.
    VendorA,
    /// Bruker: one plain directory per scan.
    VendorB,
}

impl fmt::Display for Convention {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Convention::VendorA => f.write_str("vendor-A"),
            Convention::VendorB => f.write_str("vendor-B"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageClassification {
    TimeSeries,
    DepthStack,
}

impl ImageClassification {
    /// Plane order requested from the engine when importing a scan of this kind.
    pub fn axis_order(self) -> AxisOrder {
        match self {
            ImageClassification::DepthStack => AxisOrder::Xyctz,
            ImageClassification::TimeSeries => AxisOrder::Xyczt,
        }
    }
}

impl fmt::Display for ImageClassification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImageClassification::TimeSeries => f.write_str("time series"),
            ImageClassification::DepthStack => f.write_str("depth stack"),
        }
    }
}

/// Plane order of a hyperstack, fastest varying axis first after X and Y.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AxisOrder {
    Xyczt,
    Xyctz,
}

impl AxisOrder {
    pub fn as_str(self) -> &'static str {
        match self {
            AxisOrder::Xyczt => "XYCZT",
            AxisOrder::Xyctz => "XYCTZ",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectionOutcome {
    Projected,
    PassedThrough,
    Skipped,
}

impl fmt::Display for ProjectionOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProjectionOutcome::Projected => f.write_str("projected"),
            ProjectionOutcome::PassedThrough => f.write_str("passed through"),
            ProjectionOutcome::Skipped => f.write_str("skipped"),
        }
    }
}
