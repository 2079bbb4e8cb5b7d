//! Descriptor aggregation and rule-based classification.
//!
//! Folds the per-component descriptors of one image into an
//! [`AnalysisSummary`]. This is the last step in the pipeline.

use crate::types::{AnalysisSummary, AnomalyLevel, Classification, ClassifierConfig, Component};

/// Summarize a component list and classify the sample.
///
/// Means are 0 when `components` is empty. The sample is
/// [`AnomalyLevel::High`] / [`Classification::AnomalyDetected`] when the
/// dark count or the large count exceeds its limit, and
/// [`AnomalyLevel::Low`] / [`Classification::Normal`] otherwise.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn summarize(components: &[Component], config: &ClassifierConfig) -> AnalysisSummary {
    let component_count = components.len();
    let dark_count = components
        .iter()
        .filter(|c| c.avg_intensity < config.dark_intensity)
        .count();
    let large_count = components
        .iter()
        .filter(|c| c.area > config.large_area)
        .count();

    let (avg_area, avg_intensity) = if component_count == 0 {
        (0.0, 0.0)
    } else {
        let n = component_count as f64;
        let total_area: usize = components.iter().map(|c| c.area).sum();
        let total_intensity: f64 = components.iter().map(|c| c.avg_intensity).sum();
        (total_area as f64 / n, total_intensity / n)
    };

    let flagged =
        dark_count > config.dark_count_limit || large_count > config.large_count_limit;
    let (anomaly_level, classification) = if flagged {
        (AnomalyLevel::High, Classification::AnomalyDetected)
    } else {
        (AnomalyLevel::Low, Classification::Normal)
    };

    AnalysisSummary {
        component_count,
        dark_count,
        large_count,
        avg_area,
        avg_intensity,
        anomaly_level,
        classification,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Point;

    fn component(area: usize, avg_intensity: f64) -> Component {
        Component {
            area,
            perimeter: 0.0,
            vertex_count: 2,
            avg_intensity,
            centroid: Point::new(0.0, 0.0),
        }
    }

    #[test]
    fn empty_list_is_zero_and_normal() {
        let summary = summarize(&[], &ClassifierConfig::default());
        assert_eq!(summary.component_count, 0);
        assert_eq!(summary.dark_count, 0);
        assert_eq!(summary.large_count, 0);
        assert!(summary.avg_area.abs() < f64::EPSILON);
        assert!(summary.avg_intensity.abs() < f64::EPSILON);
        assert!(!summary.avg_area.is_nan());
        assert_eq!(summary.anomaly_level, AnomalyLevel::Low);
        assert_eq!(summary.classification, Classification::Normal);
    }

    #[test]
    fn means_over_components() {
        let summary = summarize(
            &[component(100, 255.0), component(300, 55.0)],
            &ClassifierConfig::default(),
        );
        assert!((summary.avg_area - 200.0).abs() < f64::EPSILON);
        assert!((summary.avg_intensity - 155.0).abs() < f64::EPSILON);
        assert_eq!(summary.dark_count, 1);
    }

    #[test]
    fn cutoffs_are_strict() {
        let summary = summarize(
            &[component(500, 100.0), component(501, 99.9)],
            &ClassifierConfig::default(),
        );
        assert_eq!(summary.large_count, 1);
        assert_eq!(summary.dark_count, 1);
    }

    #[test]
    fn five_large_components_stay_normal() {
        let components = vec![component(600, 255.0); 5];
        let summary = summarize(&components, &ClassifierConfig::default());
        assert_eq!(summary.large_count, 5);
        assert_eq!(summary.anomaly_level, AnomalyLevel::Low);
        assert_eq!(summary.classification, Classification::Normal);
    }

    #[test]
    fn six_large_components_flag_anomaly() {
        let components = vec![component(600, 255.0); 6];
        let summary = summarize(&components, &ClassifierConfig::default());
        assert_eq!(summary.anomaly_level, AnomalyLevel::High);
        assert_eq!(summary.classification, Classification::AnomalyDetected);
    }

    #[test]
    fn four_dark_components_flag_anomaly() {
        let components = vec![component(60, 10.0); 4];
        let summary = summarize(&components, &ClassifierConfig::default());
        assert_eq!(summary.dark_count, 4);
        assert_eq!(summary.classification, Classification::AnomalyDetected);
    }

    #[test]
    fn custom_limits_change_sensitivity() {
        let config = ClassifierConfig {
            large_area: 50,
            large_count_limit: 0,
            ..ClassifierConfig::default()
        };
        let summary = summarize(&[component(60, 255.0)], &config);
        assert_eq!(summary.large_count, 1);
        assert_eq!(summary.anomaly_level, AnomalyLevel::High);
    }
}
