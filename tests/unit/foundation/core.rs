use super::*;

#[test]
fn int_size_ceil_from_rounds_up_and_rejects_degenerate() {
    assert_eq!(IntSize::ceil_from(Size::new(10.2, 3.0)), IntSize::new(11, 3));
    assert_eq!(IntSize::ceil_from(Size::new(-4.0, 3.0)), IntSize::new(0, 3));
    assert_eq!(IntSize::ceil_from(Size::new(f64::NAN, 3.0)), IntSize::new(0, 3));
    assert!(IntSize::ceil_from(Size::new(0.0, 9.0)).is_empty());
}

#[test]
fn color_premul_scales_channels_by_alpha() {
    let c = Color::rgba(1.0, 0.5, 0.0, 0.5);
    assert_eq!(c.to_premul_rgba8(), [128, 64, 0, 128]);
    assert_eq!(Color::TRANSPARENT.to_premul_rgba8(), [0, 0, 0, 0]);
}

#[test]
fn color_with_alpha_clamps() {
    assert_eq!(Color::WHITE.with_alpha(3.0).a, 1.0);
    assert_eq!(Color::WHITE.with_alpha(-1.0).a, 0.0);
}

#[test]
fn resolve_point_maps_infinities_to_bounds() {
    let size = Size::new(100.0, 40.0);
    assert_eq!(
        resolve_point(Point::new(f64::INFINITY, f64::NEG_INFINITY), size),
        Point::new(100.0, 0.0)
    );
    assert_eq!(resolve_point(Point::new(3.0, 4.0), size), Point::new(3.0, 4.0));
}
