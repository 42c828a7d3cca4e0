//! Bounding volume tests
//!
//! Tests for:
//! - Invalid volumes as the identity of expansion
//! - Idempotent expansion
//! - Box and sphere conversions
//! - Conservative sphere transform under non-uniform scale

use glam::{Mat4, Vec3};
use stratum::core::{BoundingBox, BoundingSphere};

// ============================================================================
// Helper
// ============================================================================

const EPSILON: f32 = 1e-5;

fn approx_eq(a: f32, b: f32) -> bool {
    (a - b).abs() < EPSILON
}

fn vec3_approx(a: Vec3, b: Vec3) -> bool {
    approx_eq(a.x, b.x) && approx_eq(a.y, b.y) && approx_eq(a.z, b.z)
}

fn unit_box() -> BoundingBox {
    BoundingBox::new(Vec3::splat(-1.0), Vec3::ONE)
}

// ============================================================================
// BoundingBox
// ============================================================================

#[test]
fn box_expand_by_invalid_is_noop() {
    let mut b = unit_box();
    b.expand_by_box(&BoundingBox::default());
    assert_eq!(b, unit_box());

    b.expand_by_sphere(&BoundingSphere::default());
    assert_eq!(b, unit_box());
}

#[test]
fn box_expand_is_idempotent() {
    let other = BoundingBox::new(Vec3::new(0.0, 0.0, 2.0), Vec3::new(3.0, 1.0, 4.0));

    let mut once = unit_box();
    once.expand_by_box(&other);
    let mut twice = once;
    twice.expand_by_box(&other);
    assert_eq!(once, twice);
    assert_eq!(once.max, Vec3::new(3.0, 1.0, 4.0));

    let sphere = BoundingSphere::new(Vec3::new(5.0, 0.0, 0.0), 1.0);
    once.expand_by_sphere(&sphere);
    let snapshot = once;
    once.expand_by_sphere(&sphere);
    assert_eq!(once, snapshot);
}

#[test]
fn box_center_and_radius() {
    let b = BoundingBox::new(Vec3::ZERO, Vec3::new(2.0, 2.0, 2.0));
    assert_eq!(b.center(), Vec3::ONE);
    assert!(approx_eq(b.radius2(), 3.0));
    assert!(approx_eq(b.radius(), 3.0_f32.sqrt()));
}

#[test]
fn invalid_box_contains_and_intersects_nothing() {
    let invalid = BoundingBox::default();
    assert!(!invalid.contains(Vec3::ZERO));
    assert!(!invalid.intersects(&unit_box()));
    assert!(!unit_box().intersects(&invalid));
    assert!(unit_box().contains(Vec3::ZERO));
}

#[test]
fn box_transform_translates_and_scales() {
    let m = Mat4::from_scale_rotation_translation(
        Vec3::new(2.0, 1.0, 1.0),
        glam::Quat::IDENTITY,
        Vec3::new(10.0, 0.0, 0.0),
    );
    let t = unit_box().transform(&m);
    assert!(vec3_approx(t.min, Vec3::new(8.0, -1.0, -1.0)));
    assert!(vec3_approx(t.max, Vec3::new(12.0, 1.0, 1.0)));

    let invalid = BoundingBox::default().transform(&m);
    assert!(!invalid.is_valid());
}

// ============================================================================
// BoundingSphere
// ============================================================================

#[test]
fn sphere_expand_by_invalid_is_noop() {
    let mut s = BoundingSphere::new(Vec3::ZERO, 1.0);
    s.expand_by_sphere(&BoundingSphere::default());
    s.expand_by_box(&BoundingBox::default());
    assert_eq!(s, BoundingSphere::new(Vec3::ZERO, 1.0));
}

#[test]
fn sphere_merge_covers_both() {
    let mut s = BoundingSphere::new(Vec3::ZERO, 1.0);
    let other = BoundingSphere::new(Vec3::new(4.0, 0.0, 0.0), 1.0);
    s.expand_by_sphere(&other);

    assert!(vec3_approx(s.center, Vec3::new(2.0, 0.0, 0.0)));
    assert!(approx_eq(s.radius, 3.0));

    let snapshot = s;
    s.expand_by_sphere(&other);
    assert!(vec3_approx(s.center, snapshot.center));
    assert!(approx_eq(s.radius, snapshot.radius));
}

#[test]
fn sphere_from_box() {
    let s = BoundingSphere::from(&unit_box());
    assert_eq!(s.center, Vec3::ZERO);
    assert!(approx_eq(s.radius, 3.0_f32.sqrt()));
    assert!(!BoundingSphere::from(&BoundingBox::default()).is_valid());
}

#[test]
fn sphere_intersection() {
    let a = BoundingSphere::new(Vec3::ZERO, 1.0);
    assert!(a.intersects(&BoundingSphere::new(Vec3::new(1.5, 0.0, 0.0), 1.0)));
    assert!(!a.intersects(&BoundingSphere::new(Vec3::new(3.0, 0.0, 0.0), 1.0)));
    assert!(!a.intersects(&BoundingSphere::default()));
}

#[test]
fn sphere_transform_uses_largest_axis_scale() {
    let m = Mat4::from_scale(Vec3::new(1.0, 3.0, 1.0));
    let t = BoundingSphere::new(Vec3::X, 1.0).transform(&m);
    assert!(vec3_approx(t.center, Vec3::X));
    assert!(approx_eq(t.radius, 3.0));
}
