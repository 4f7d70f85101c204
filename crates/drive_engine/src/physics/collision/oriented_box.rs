//! Oriented bounding boxes and the separating-axis test

use crate::foundation::math::{yaw_matrix, Mat3, Transform, Vec3};

/// Squared length below which a cross-product axis is treated as degenerate
const DEGENERATE_AXIS_SQ: f32 = 1.0e-6;

/// A box with arbitrary orientation, stored in world space
///
/// `rotation` maps local axes to world axes; its columns are the box's
/// local X, Y and Z directions. Boxes are rebuilt from their owner's
/// transform every tick and never stored independently.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrientedBox {
    /// World-space centre
    pub center: Vec3,
    /// Half size along each local axis
    pub half_extents: Vec3,
    /// Local-to-world rotation
    pub rotation: Mat3,
}

impl OrientedBox {
    /// Create a box from an explicit rotation matrix
    pub fn new(center: Vec3, half_extents: Vec3, rotation: Mat3) -> Self {
        Self {
            center,
            half_extents,
            rotation,
        }
    }

    /// Create an axis-aligned box
    pub fn axis_aligned(center: Vec3, half_extents: Vec3) -> Self {
        Self::new(center, half_extents, Mat3::identity())
    }

    /// Create a box rotated about +Y by `yaw`
    pub fn from_yaw(center: Vec3, half_extents: Vec3, yaw: f32) -> Self {
        Self::new(center, half_extents, yaw_matrix(yaw))
    }

    /// Create a box following `transform`, with its centre offset in local space
    pub fn from_transform(transform: &Transform, local_center: Vec3, half_extents: Vec3) -> Self {
        Self::new(
            transform.transform_point(local_center),
            half_extents,
            transform.rotation.to_rotation_matrix().into_inner(),
        )
    }

    /// The three local axes in world space
    pub fn axes(&self) -> [Vec3; 3] {
        [
            self.rotation.column(0).into_owned(),
            self.rotation.column(1).into_owned(),
            self.rotation.column(2).into_owned(),
        ]
    }

    /// Whether every component is finite and no half-extent is negative
    pub fn is_well_formed(&self) -> bool {
        self.center.iter().all(|v| v.is_finite())
            && self.half_extents.iter().all(|v| v.is_finite() && *v >= 0.0)
            && self.rotation.iter().all(|v| v.is_finite())
    }

    /// Half the length of this box's shadow on `axis` (scaled by `|axis|`)
    fn projected_radius(&self, axes: &[Vec3; 3], axis: &Vec3) -> f32 {
        self.half_extents.x * axes[0].dot(axis).abs()
            + self.half_extents.y * axes[1].dot(axis).abs()
            + self.half_extents.z * axes[2].dot(axis).abs()
    }

    /// Separating-axis intersection test
    ///
    /// Tests the three face axes of each box and the nine pairwise edge
    /// cross products. Boxes that only touch count as intersecting. The
    /// result is identical for `a.intersects(b)` and `b.intersects(a)`.
    pub fn intersects(&self, other: &Self) -> bool {
        let axes_a = self.axes();
        let axes_b = other.axes();
        let offset = other.center - self.center;

        let separated_on = |axis: &Vec3| -> bool {
            let distance = offset.dot(axis).abs();
            let reach = self.projected_radius(&axes_a, axis) + other.projected_radius(&axes_b, axis);
            distance > reach
        };

        if axes_a.iter().chain(axes_b.iter()).any(|axis| separated_on(axis)) {
            return false;
        }

        for a in &axes_a {
            for b in &axes_b {
                let axis = a.cross(b);
                if axis.norm_squared() < DEGENERATE_AXIS_SQ {
                    continue;
                }
                if separated_on(&axis) {
                    return false;
                }
            }
        }

        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::constants::FRAC_PI_2;

    fn unit_box(center: Vec3) -> OrientedBox {
        OrientedBox::axis_aligned(center, Vec3::new(1.0, 1.0, 1.0))
    }

    #[test]
    fn test_boxes_separated_along_x_do_not_intersect() {
        let a = unit_box(Vec3::zeros());
        let b = unit_box(Vec3::new(10.0, 0.0, 0.0));
        assert!(!a.intersects(&b));
        assert!(!b.intersects(&a));
    }

    #[test]
    fn test_overlapping_and_touching_boxes_intersect() {
        let a = unit_box(Vec3::zeros());
        assert!(a.intersects(&unit_box(Vec3::new(1.5, 0.5, 0.0))));
        assert!(a.intersects(&unit_box(Vec3::new(2.0, 0.0, 0.0))));
        assert!(a.intersects(&a));
    }

    #[test]
    fn test_rotation_matters() {
        // A long thin box along Z misses a box to its side, but hits it once
        // it has been turned a quarter around Y.
        let long = OrientedBox::from_yaw(Vec3::zeros(), Vec3::new(0.5, 0.5, 4.0), 0.0);
        let side = unit_box(Vec3::new(3.5, 0.0, 0.0));
        assert!(!long.intersects(&side));

        let turned = OrientedBox::from_yaw(Vec3::zeros(), Vec3::new(0.5, 0.5, 4.0), FRAC_PI_2);
        assert!(turned.intersects(&side));
    }

    #[test]
    fn test_corner_to_face_contact_is_symmetric() {
        let a = OrientedBox::from_yaw(Vec3::zeros(), Vec3::new(1.0, 1.0, 1.0), 0.785_398);
        let b = OrientedBox::new(
            Vec3::new(2.2, 0.0, 1.6),
            Vec3::new(1.0, 1.0, 1.0),
            Mat3::identity(),
        );
        assert_eq!(a.intersects(&b), b.intersects(&a));
    }

    #[test]
    fn test_intersection_is_symmetric_over_a_grid() {
        let yaws = [0.0, 0.3, 1.1, 2.4, -0.9];
        for (i, yaw_a) in yaws.iter().enumerate() {
            for (j, yaw_b) in yaws.iter().enumerate() {
                #[allow(clippy::cast_precision_loss)]
                let center = Vec3::new(0.7 * i as f32, 0.0, 0.9 * j as f32 - 1.5);
                let a = OrientedBox::from_yaw(Vec3::zeros(), Vec3::new(0.9, 0.75, 2.1), *yaw_a);
                let b = OrientedBox::from_yaw(center, Vec3::new(1.0, 0.5, 1.5), *yaw_b);
                assert_eq!(a.intersects(&b), b.intersects(&a), "yaws {yaw_a} / {yaw_b}");
            }
        }
    }

    #[test]
    fn test_beyond_projected_extents_never_intersect() {
        let a = OrientedBox::from_yaw(Vec3::zeros(), Vec3::new(0.9, 0.75, 2.1), 0.6);
        for step in 0..20 {
            let angle = step as f32 * 0.314;
            // Bounding radii are ~2.4 and ~1.9, so 4.5 is always clear.
            let center = Vec3::new(angle.cos() * 4.5, 0.0, angle.sin() * 4.5);
            let b = OrientedBox::from_yaw(center, Vec3::new(1.0, 0.5, 1.5), angle);
            assert!(!a.intersects(&b));
        }
    }

    #[test]
    fn test_malformed_box_is_detected() {
        let mut bad = unit_box(Vec3::zeros());
        assert!(bad.is_well_formed());
        bad.center.x = f32::NAN;
        assert!(!bad.is_well_formed());

        let negative = OrientedBox::axis_aligned(Vec3::zeros(), Vec3::new(1.0, -1.0, 1.0));
        assert!(!negative.is_well_formed());
    }

    #[test]
    fn test_from_transform_applies_local_offset() {
        let transform = Transform::from_yaw(Vec3::new(5.0, 0.0, 0.0), 0.0);
        let bounds = OrientedBox::from_transform(&transform, Vec3::new(0.0, 0.75, 0.0), Vec3::new(1.0, 0.75, 2.0));
        approx::assert_relative_eq!(bounds.center, Vec3::new(5.0, 0.75, 0.0));
    }
}
