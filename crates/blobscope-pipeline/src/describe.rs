//! Per-component structured descriptions.
//!
//! Turns the leading components of a segmentation into numbered
//! [`ComponentDetail`] records carrying a relative size, the vertex
//! count, the intensity ("color difference") and a list of rule-based
//! [`Finding`]s. These records are meant as structured input for a
//! caller's own narrative step; no text generation happens here.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::types::Component;

/// Cutoffs for the per-component findings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DescribeConfig {
    /// Reference area; `size_percentage = area / standard_size * 100`.
    pub standard_size: f64,
    /// Only the first `max_components` components are described.
    pub max_components: usize,
    /// `size_percentage` below this is [`Finding::Atrophy`].
    pub atrophy_below: f64,
    /// `size_percentage` above this is [`Finding::Hypertrophy`].
    pub hypertrophy_above: f64,
    /// Vertex counts below this are [`Finding::IrregularShape`].
    pub irregular_below: usize,
    /// Vertex counts above this are [`Finding::Metaplasia`].
    pub metaplasia_above: usize,
    /// Intensity above this is [`Finding::IntracellularAccumulation`].
    pub accumulation_above: f64,
    /// Intensity below this is [`Finding::Hypochromia`].
    pub hypochromia_below: f64,
}

impl Default for DescribeConfig {
    fn default() -> Self {
        Self {
            standard_size: 0.05,
            max_components: 20,
            atrophy_below: 100.0,
            hypertrophy_above: 150.0,
            irregular_below: 4,
            metaplasia_above: 8,
            accumulation_above: 120.0,
            hypochromia_below: 80.0,
        }
    }
}

/// One rule-based observation about a component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Finding {
    Atrophy,
    Hypertrophy,
    IrregularShape,
    Metaplasia,
    IntracellularAccumulation,
    Hypochromia,
}

impl Finding {
    /// Human-readable label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Atrophy => "Atrophy",
            Self::Hypertrophy => "Hypertrophy",
            Self::IrregularShape => "Irregular shape",
            Self::Metaplasia => "Metaplasia",
            Self::IntracellularAccumulation => "Intracellular accumulation",
            Self::Hypochromia => "Hypochromia",
        }
    }
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Structured description of one component.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentDetail {
    /// 1-based position in discovery order.
    pub number: usize,
    pub area: usize,
    /// Area relative to the configured standard size, in percent.
    pub size_percentage: f64,
    pub vertex_count: usize,
    /// The component's average intensity.
    pub color_difference: f64,
    /// Findings in size, shape, color order. Empty means normal.
    pub findings: Vec<Finding>,
}

impl ComponentDetail {
    /// Comma-separated findings, or `"Normal"` when there are none.
    #[must_use]
    pub fn description(&self) -> String {
        if self.findings.is_empty() {
            return "Normal".to_string();
        }
        self.findings
            .iter()
            .map(|f| f.label())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Findings for a single set of measurements.
///
/// At most one size finding, one shape finding, and one color finding
/// are produced, in that order.
#[must_use]
pub fn findings(
    size_percentage: f64,
    vertex_count: usize,
    color_difference: f64,
    config: &DescribeConfig,
) -> Vec<Finding> {
    let mut out = Vec::new();

    if size_percentage < config.atrophy_below {
        out.push(Finding::Atrophy);
    } else if size_percentage > config.hypertrophy_above {
        out.push(Finding::Hypertrophy);
    }

    if vertex_count < config.irregular_below {
        out.push(Finding::IrregularShape);
    } else if vertex_count > config.metaplasia_above {
        out.push(Finding::Metaplasia);
    }

    if color_difference > config.accumulation_above {
        out.push(Finding::IntracellularAccumulation);
    } else if color_difference < config.hypochromia_below {
        out.push(Finding::Hypochromia);
    }

    out
}

/// Describe the first `config.max_components` components.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn describe_components(components: &[Component], config: &DescribeConfig) -> Vec<ComponentDetail> {
    components
        .iter()
        .take(config.max_components)
        .enumerate()
        .map(|(i, c)| {
            let size_percentage = if config.standard_size > 0.0 {
                c.area as f64 / config.standard_size * 100.0
            } else {
                0.0
            };
            ComponentDetail {
                number: i + 1,
                area: c.area,
                size_percentage,
                vertex_count: c.vertex_count,
                color_difference: c.avg_intensity,
                findings: findings(size_percentage, c.vertex_count, c.avg_intensity, config),
            }
        })
        .collect()
}
