use rebarlink_core::document::ElementId;
use rebarlink_core::geometry::{Bounds3D, Point3};
use rebarlink_core::solid::{PointPosition, Solid};
use tracing::{debug, trace};

use crate::extract::{GeometryElement, ReinforcementElement};
use crate::host::PointClassifier;
use crate::settings::Tolerance;

pub const DEFAULT_POINT_EPSILON: f64 = 1e-9;

/// 匹配阶段的数值选项。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchOptions {
    /// 传递给点位判定谓词的边界容差。
    pub epsilon: f64,
    /// 是否先用包围盒排除明显在外部的点。只影响性能，不影响结果。
    pub bounds_prefilter: bool,
}

impl Default for MatchOptions {
    fn default() -> Self {
        Self {
            epsilon: DEFAULT_POINT_EPSILON,
            bounds_prefilter: true,
        }
    }
}

/// 一轮匹配的统计。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MatchSummary {
    pub assigned: usize,
    pub unassigned: Vec<ElementId>,
    pub tested_pairs: usize,
    pub pruned_pairs: usize,
}

/// 折线点落在实体内部的比例。空折线视为 0；边界点不计入内部。
pub fn inside_fraction(
    outline: &[Point3],
    solid: &Solid,
    classifier: &dyn PointClassifier,
    epsilon: f64,
    prefilter: Option<&Bounds3D>,
) -> f64 {
    if outline.is_empty() {
        return 0.0;
    }
    let inside = outline
        .iter()
        .filter(|point| {
            if let Some(bounds) = prefilter {
                if !bounds.contains_point(**point, epsilon) {
                    return false;
                }
            }
            classifier.classify(**point, solid, epsilon) == PointPosition::Inside
        })
        .count();
    inside as f64 / outline.len() as f64
}

/// 比例为 0 时一律拒绝；否则比例不低于容差即接受。
#[inline]
pub fn accepts(fraction: f64, tolerance: Tolerance) -> bool {
    if fraction == 0.0 {
        false
    } else {
        tolerance.get() <= fraction
    }
}

/// 包含关系匹配器：按几何输入顺序逐个扫描尚未分配的钢筋，先匹配者得。
pub struct ContainmentMatcher<'a> {
    classifier: &'a dyn PointClassifier,
    tolerance: Tolerance,
    options: MatchOptions,
}

impl<'a> ContainmentMatcher<'a> {
    pub fn new(classifier: &'a dyn PointClassifier, tolerance: Tolerance, options: MatchOptions) -> Self {
        Self {
            classifier,
            tolerance,
            options,
        }
    }

    /// 判断单个钢筋是否包含于几何中（不修改分配状态）。
    pub fn contains(&self, geometry: &GeometryElement, reinforcement: &ReinforcementElement) -> bool {
        let (Some(solid), Some(outline)) = (&geometry.solid, &reinforcement.global_outline) else {
            return false;
        };
        let prefilter = if self.options.bounds_prefilter {
            geometry.bounds()
        } else {
            None
        };
        let fraction = inside_fraction(outline, solid, self.classifier, self.options.epsilon, prefilter);
        trace!(
            geometry = geometry.id.get(),
            reinforcement = reinforcement.id.get(),
            fraction,
            "包含比例"
        );
        accepts(fraction, self.tolerance)
    }

    /// 为每个钢筋至多分配一个几何。已分配的钢筋不会再与后续几何比较。
    pub fn assign(
        &self,
        geometry: &mut [GeometryElement],
        reinforcement: &mut [ReinforcementElement],
    ) -> MatchSummary {
        let mut summary = MatchSummary::default();

        for geometry_element in geometry.iter_mut() {
            for rebar in reinforcement.iter_mut() {
                if rebar.is_assigned() || !rebar.is_supported() {
                    continue;
                }
                if self.is_disjoint(geometry_element, rebar) {
                    summary.pruned_pairs += 1;
                    continue;
                }
                summary.tested_pairs += 1;
                if self.contains(geometry_element, rebar) {
                    geometry_element.assign(rebar.id);
                    rebar.mark_assigned();
                    summary.assigned += 1;
                    debug!(
                        geometry = geometry_element.id.get(),
                        reinforcement = rebar.id.get(),
                        mark = %rebar.mark,
                        "钢筋已分配到几何"
                    );
                }
            }
        }

        summary.unassigned = reinforcement
            .iter()
            .filter(|rebar| rebar.is_supported() && !rebar.is_assigned())
            .map(|rebar| rebar.id)
            .collect();
        summary
    }

    /// 包围盒完全分离时，所有点必在外部，可跳过逐点判定。
    fn is_disjoint(&self, geometry: &GeometryElement, rebar: &ReinforcementElement) -> bool {
        if !self.options.bounds_prefilter {
            return false;
        }
        match (geometry.bounds(), &rebar.global_outline) {
            (Some(bounds), Some(outline)) if !outline.is_empty() => {
                !bounds.intersects(&Bounds3D::from_points(outline), self.options.epsilon)
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::RayCastClassifier;

    fn cube(offset: f64) -> Solid {
        Solid::cuboid(
            Point3::new(offset, 0.0, 0.0),
            Point3::new(offset + 1.0, 1.0, 1.0),
        )
    }

    fn geometry(id: u64, solid: Solid) -> GeometryElement {
        GeometryElement::new(ElementId::new(id), Some(solid))
    }

    fn rebar(id: u64, points: &[(f64, f64, f64)]) -> ReinforcementElement {
        ReinforcementElement::new(
            ElementId::new(id),
            id.to_string(),
            Some(points.iter().map(|&(x, y, z)| Point3::new(x, y, z)).collect()),
        )
    }

    fn tolerance(value: f64) -> Tolerance {
        Tolerance::new(value).unwrap()
    }

    #[test]
    fn acceptance_rule_boundaries() {
        assert!(accepts(0.5, tolerance(0.5)));
        assert!(!accepts(0.5 - 1e-12, tolerance(0.5)));
        assert!(!accepts(0.0, tolerance(0.001)));
        assert!(accepts(1.0, tolerance(1.0)));
        assert!(accepts(0.25, tolerance(0.25)));
    }

    #[test]
    fn fraction_counts_only_inside_points() {
        let solid = cube(0.0);
        let classifier = RayCastClassifier;
        let outline = [
            Point3::new(0.5, 0.5, 0.5),
            Point3::new(1.0, 0.5, 0.5),
            Point3::new(2.0, 0.5, 0.5),
            Point3::new(0.2, 0.2, 0.2),
        ];
        let fraction = inside_fraction(&outline, &solid, &classifier, 1e-9, None);
        assert!((fraction - 0.5).abs() < 1e-12);
        assert_eq!(inside_fraction(&[], &solid, &classifier, 1e-9, None), 0.0);
    }

    #[test]
    fn fully_inside_bar_is_assigned() {
        let classifier = RayCastClassifier;
        let matcher = ContainmentMatcher::new(&classifier, tolerance(0.5), MatchOptions::default());
        let mut geometries = vec![geometry(1, cube(0.0))];
        let mut rebars = vec![rebar(
            2,
            &[(0.1, 0.1, 0.5), (0.9, 0.1, 0.5), (0.9, 0.9, 0.5), (0.1, 0.9, 0.5)],
        )];
        let summary = matcher.assign(&mut geometries, &mut rebars);
        assert_eq!(summary.assigned, 1);
        assert_eq!(geometries[0].assigned_reinforcement(), &[ElementId::new(2)]);
        assert!(rebars[0].is_assigned());
    }

    #[test]
    fn quarter_inside_bar_is_rejected_at_half_tolerance() {
        let classifier = RayCastClassifier;
        let matcher = ContainmentMatcher::new(&classifier, tolerance(0.5), MatchOptions::default());
        let mut geometries = vec![geometry(1, cube(0.0))];
        let mut rebars = vec![rebar(
            2,
            &[(0.5, 0.5, 0.5), (1.5, 0.5, 0.5), (2.5, 0.5, 0.5), (3.5, 0.5, 0.5)],
        )];
        let summary = matcher.assign(&mut geometries, &mut rebars);
        assert_eq!(summary.assigned, 0);
        assert_eq!(summary.unassigned, vec![ElementId::new(2)]);
        assert!(geometries[0].assigned_reinforcement().is_empty());
        assert!(!rebars[0].is_assigned());
    }

    #[test]
    fn first_geometry_wins_for_overlapping_volumes() {
        let classifier = RayCastClassifier;
        let matcher = ContainmentMatcher::new(&classifier, tolerance(0.5), MatchOptions::default());
        // 两个体量重叠于 x ∈ [0.5, 1]。
        let mut geometries = vec![geometry(1, cube(0.0)), geometry(2, cube(0.5))];
        let mut rebars = vec![
            rebar(10, &[(0.7, 0.5, 0.5), (0.8, 0.5, 0.5)]),
            rebar(11, &[(1.2, 0.5, 0.5), (1.3, 0.5, 0.5)]),
        ];
        let first = matcher.assign(&mut geometries, &mut rebars);
        assert_eq!(first.assigned, 2);
        assert_eq!(geometries[0].assigned_reinforcement(), &[ElementId::new(10)]);
        assert_eq!(geometries[1].assigned_reinforcement(), &[ElementId::new(11)]);

        // 相同输入重复运行得到相同结果。
        let mut geometries_again = vec![geometry(1, cube(0.0)), geometry(2, cube(0.5))];
        let mut rebars_again = vec![
            rebar(10, &[(0.7, 0.5, 0.5), (0.8, 0.5, 0.5)]),
            rebar(11, &[(1.2, 0.5, 0.5), (1.3, 0.5, 0.5)]),
        ];
        matcher.assign(&mut geometries_again, &mut rebars_again);
        assert_eq!(geometries, geometries_again);
    }

    #[test]
    fn prefilter_does_not_change_outcome() {
        let classifier = RayCastClassifier;
        let rebars_template = vec![
            rebar(10, &[(0.5, 0.5, 0.5), (5.0, 5.0, 5.0)]),
            rebar(11, &[(9.0, 9.0, 9.0)]),
            rebar(12, &[(3.5, 0.5, 0.5), (3.6, 0.5, 0.5), (0.9, 0.9, 0.9)]),
        ];
        let run = |prefilter: bool| {
            let options = MatchOptions {
                bounds_prefilter: prefilter,
                ..MatchOptions::default()
            };
            let matcher = ContainmentMatcher::new(&classifier, tolerance(0.3), options);
            let mut geometries = vec![geometry(1, cube(0.0)), geometry(2, cube(3.0))];
            let mut rebars = rebars_template.clone();
            let summary = matcher.assign(&mut geometries, &mut rebars);
            (geometries, summary)
        };
        let (with, with_summary) = run(true);
        let (without, without_summary) = run(false);
        assert_eq!(with, without);
        assert_eq!(with_summary.assigned, without_summary.assigned);
        assert!(with_summary.pruned_pairs > 0);
        assert_eq!(without_summary.pruned_pairs, 0);
    }

    #[test]
    fn unsupported_and_solidless_never_match() {
        let classifier = RayCastClassifier;
        let matcher = ContainmentMatcher::new(&classifier, tolerance(0.1), MatchOptions::default());
        let mut geometries = vec![
            GeometryElement::new(ElementId::new(1), None),
            geometry(2, cube(0.0)),
        ];
        let mut rebars = vec![
            ReinforcementElement::new(ElementId::new(10), "A", None),
            rebar(11, &[(0.5, 0.5, 0.5)]),
        ];
        let summary = matcher.assign(&mut geometries, &mut rebars);
        assert!(geometries[0].assigned_reinforcement().is_empty());
        assert_eq!(geometries[1].assigned_reinforcement(), &[ElementId::new(11)]);
        assert!(!rebars[0].is_assigned());
        assert!(summary.unassigned.is_empty());
    }
}
