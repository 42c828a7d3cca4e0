//! Bounding Volumes
//!
//! Axis-aligned boxes and spheres used by culling.
//!
//! Both volumes have an *invalid* (empty) state that acts as the identity for
//! union: expanding by an invalid volume is a no-op, and an invalid operand
//! never contains or intersects anything.
//!
//! | Volume | Invalid sentinel |
//! |--------|------------------|
//! | [`BoundingBox`] | `min = +INF`, `max = -INF` |
//! | [`BoundingSphere`] | `radius < 0` |

use glam::{Mat4, Vec3};

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min: Vec3,
    pub max: Vec3,
}

impl Default for BoundingBox {
    fn default() -> Self {
        Self::INVALID
    }
}

impl BoundingBox {
    pub const INVALID: Self = Self {
        min: Vec3::INFINITY,
        max: Vec3::NEG_INFINITY,
    };

    #[inline]
    #[must_use]
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Reset to the invalid state.
    #[inline]
    pub fn init(&mut self) {
        *self = Self::INVALID;
    }

    #[inline]
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.max.cmpge(self.min).all()
    }

    pub fn expand_by_point(&mut self, point: Vec3) {
        self.min = self.min.min(point);
        self.max = self.max.max(point);
    }

    pub fn expand_by_box(&mut self, other: &BoundingBox) {
        if !other.is_valid() {
            return;
        }
        self.min = self.min.min(other.min);
        self.max = self.max.max(other.max);
    }

    pub fn expand_by_sphere(&mut self, sphere: &BoundingSphere) {
        if !sphere.is_valid() {
            return;
        }
        let r = Vec3::splat(sphere.radius);
        self.min = self.min.min(sphere.center - r);
        self.max = self.max.max(sphere.center + r);
    }

    #[inline]
    #[must_use]
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    #[inline]
    #[must_use]
    pub fn radius2(&self) -> f32 {
        0.25 * (self.max - self.min).length_squared()
    }

    #[inline]
    #[must_use]
    pub fn radius(&self) -> f32 {
        self.radius2().sqrt()
    }

    /// Corner `pos` in `0..8`: bit 0 picks max x, bit 1 max y, bit 2 max z.
    #[must_use]
    pub fn corner(&self, pos: u8) -> Vec3 {
        Vec3::new(
            if pos & 1 != 0 { self.max.x } else { self.min.x },
            if pos & 2 != 0 { self.max.y } else { self.min.y },
            if pos & 4 != 0 { self.max.z } else { self.min.z },
        )
    }

    #[must_use]
    pub fn contains(&self, point: Vec3) -> bool {
        self.is_valid() && point.cmpge(self.min).all() && point.cmple(self.max).all()
    }

    #[must_use]
    pub fn intersects(&self, other: &BoundingBox) -> bool {
        self.is_valid()
            && other.is_valid()
            && self.min.cmple(other.max).all()
            && other.min.cmple(self.max).all()
    }

    /// Box enclosing the transformed box (Graphics Gems "TransBox").
    ///
    /// Starts at the translation and accumulates, per matrix component, the
    /// smaller and larger of the min/max products.
    #[must_use]
    pub fn transform(&self, m: &Mat4) -> BoundingBox {
        if !self.is_valid() {
            return *self;
        }

        let translation = m.w_axis.truncate();
        let mut min = translation;
        let mut max = translation;

        for i in 0..3 {
            let column = m.col(i).truncate();
            let a = column * self.max[i];
            let b = column * self.min[i];
            min += a.min(b);
            max += a.max(b);
        }

        BoundingBox { min, max }
    }
}

/// Bounding sphere.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingSphere {
    pub center: Vec3,
    pub radius: f32,
}

impl Default for BoundingSphere {
    fn default() -> Self {
        Self::INVALID
    }
}

impl BoundingSphere {
    pub const INVALID: Self = Self {
        center: Vec3::ZERO,
        radius: -1.0,
    };

    #[inline]
    #[must_use]
    pub fn new(center: Vec3, radius: f32) -> Self {
        Self { center, radius }
    }

    #[inline]
    pub fn init(&mut self) {
        *self = Self::INVALID;
    }

    #[inline]
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.radius >= 0.0
    }

    #[inline]
    #[must_use]
    pub fn radius2(&self) -> f32 {
        self.radius * self.radius
    }

    /// Grow to include `point`, moving the center half the overshoot.
    pub fn expand_by_point(&mut self, point: Vec3) {
        if !self.is_valid() {
            self.center = point;
            self.radius = 0.0;
            return;
        }

        let dv = point - self.center;
        let r = dv.length();
        if r > self.radius {
            let dr = (r - self.radius) * 0.5;
            self.center += dv * (dr / r);
            self.radius += dr;
        }
    }

    /// Grow the radius only, keeping the center fixed.
    pub fn expand_radius_by_sphere(&mut self, other: &BoundingSphere) {
        if !other.is_valid() {
            return;
        }
        if !self.is_valid() {
            *self = *other;
            return;
        }

        let r = self.center.distance(other.center) + other.radius;
        if r > self.radius {
            self.radius = r;
        }
    }

    /// Smallest sphere enclosing both spheres.
    pub fn expand_by_sphere(&mut self, other: &BoundingSphere) {
        if !other.is_valid() {
            return;
        }
        if !self.is_valid() {
            *self = *other;
            return;
        }

        let d = self.center.distance(other.center);

        // other already inside
        if d + other.radius <= self.radius {
            return;
        }
        // other swallows self
        if d + self.radius <= other.radius {
            *self = *other;
            return;
        }

        // The new center lies halfway between the two farthest surface
        // points; similar triangles give the ratio along the center line.
        let new_radius = (self.radius + d + other.radius) * 0.5;
        let ratio = (new_radius - self.radius) / d;
        self.center += (other.center - self.center) * ratio;
        self.radius = new_radius;
    }

    pub fn expand_by_box(&mut self, bbox: &BoundingBox) {
        if !bbox.is_valid() {
            return;
        }
        if !self.is_valid() {
            *self = BoundingSphere::from(bbox);
            return;
        }

        let mut enclosing = *bbox;
        for i in 0..8 {
            let dir = (bbox.corner(i) - self.center).normalize_or_zero();
            enclosing.expand_by_point(self.center - dir * self.radius);
        }
        self.center = enclosing.center();
        self.radius = enclosing.radius();
    }

    #[must_use]
    pub fn contains(&self, point: Vec3) -> bool {
        self.is_valid() && self.center.distance_squared(point) <= self.radius2()
    }

    #[must_use]
    pub fn intersects(&self, other: &BoundingSphere) -> bool {
        if !self.is_valid() || !other.is_valid() {
            return false;
        }
        let r = self.radius + other.radius;
        self.center.distance_squared(other.center) <= r * r
    }

    /// Conservative transform.
    ///
    /// The radius is scaled by the square root of the largest squared row
    /// scale of the upper 3x3. Under non-uniform scale or shear the result is
    /// looser than the exact bound; culling relies on it staying this way.
    #[must_use]
    pub fn transform(&self, m: &Mat4) -> BoundingSphere {
        if !self.is_valid() {
            return *self;
        }

        let sqr_scale = Vec3::new(
            m.row(0).truncate().length_squared(),
            m.row(1).truncate().length_squared(),
            m.row(2).truncate().length_squared(),
        );
        let scale = sqr_scale.max_element().sqrt();

        BoundingSphere {
            center: m.transform_point3(self.center),
            radius: self.radius * scale,
        }
    }
}

impl From<&BoundingBox> for BoundingSphere {
    fn from(bbox: &BoundingBox) -> Self {
        if !bbox.is_valid() {
            return Self::INVALID;
        }
        Self {
            center: bbox.center(),
            radius: bbox.radius(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_volumes_are_invalid() {
        assert!(!BoundingBox::default().is_valid());
        assert!(!BoundingSphere::default().is_valid());
    }

    #[test]
    fn corner_bits_select_axes() {
        let bb = BoundingBox::new(Vec3::ZERO, Vec3::ONE);
        assert_eq!(bb.corner(0), Vec3::ZERO);
        assert_eq!(bb.corner(1), Vec3::X);
        assert_eq!(bb.corner(2), Vec3::Y);
        assert_eq!(bb.corner(4), Vec3::Z);
        assert_eq!(bb.corner(7), Vec3::ONE);
    }

    #[test]
    fn expanding_invalid_sphere_by_point_starts_at_point() {
        let mut s = BoundingSphere::default();
        s.expand_by_point(Vec3::new(1.0, 2.0, 3.0));
        assert!(s.is_valid());
        assert_eq!(s.center, Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(s.radius, 0.0);
    }
}
