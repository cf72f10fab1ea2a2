use super::*;

const ALL: [Easing; 7] = [
    Easing::Linear,
    Easing::InQuad,
    Easing::OutQuad,
    Easing::InOutQuad,
    Easing::InCubic,
    Easing::OutCubic,
    Easing::InOutCubic,
];

#[test]
fn endpoints_are_fixed() {
    for e in ALL {
        assert!(e.apply(0.0).abs() < 1e-6, "{e:?}");
        assert!((e.apply(1.0) - 1.0).abs() < 1e-6, "{e:?}");
    }
}

#[test]
fn curves_are_monotonic() {
    for e in ALL {
        let mut prev = e.apply(0.0);
        for i in 1..=64 {
            let v = e.apply(i as f32 / 64.0);
            assert!(v + 1e-6 >= prev, "{e:?} decreased at {i}");
            prev = v;
        }
    }
}

#[test]
fn input_is_clamped() {
    assert_eq!(Easing::InQuad.apply(-3.0), 0.0);
    assert_eq!(Easing::OutCubic.apply(7.0), 1.0);
}
