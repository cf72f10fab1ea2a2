use super::*;

#[test]
fn instance_beats_call_site_beats_ambient() {
    let ambient = Style {
        blur_radius: Some(10.0),
        noise_factor: Some(0.3),
        alpha: Some(0.5),
        ..Style::default()
    };
    let call_site = Style {
        blur_radius: Some(16.0),
        noise_factor: Some(0.2),
        ..Style::default()
    };
    let instance = Style {
        blur_radius: Some(24.0),
        ..Style::default()
    };

    let mut r = ResolvedStyle::default();
    r.resolve(&instance, &call_site, &ambient, true);
    assert_eq!(r.blur_radius(), 24.0);
    assert_eq!(r.noise_factor(), 0.2);
    assert_eq!(r.alpha(), 0.5);
    assert!(r.tints().is_empty());
}

#[test]
fn defaults_apply_when_no_layer_sets_a_field() {
    let mut r = ResolvedStyle::default();
    let empty = Style::default();
    r.resolve(&empty, &empty, &empty, false);
    assert_eq!(r.blur_radius(), DEFAULT_BLUR_RADIUS);
    assert_eq!(r.noise_factor(), DEFAULT_NOISE_FACTOR);
    assert_eq!(r.alpha(), 1.0);
    assert_eq!(r.blurred_edge_treatment(), BlurredEdgeTreatment::Rectangle);
    assert_eq!(r.input_scale(), InputScale::None);
    assert!(!r.draw_content_behind());
    // Blur defaults to the platform capability.
    assert!(!r.blur_enabled());
    assert!(r.dirty().contains(DirtyFields::BLUR_ENABLED));
}

#[test]
fn resolving_same_values_sets_no_bits() {
    let style = Style {
        blur_radius: Some(12.0),
        tints: Some(vec![Tint::color(Color::WHITE.with_alpha(0.1))]),
        ..Style::default()
    };
    let empty = Style::default();
    let mut r = ResolvedStyle::default();
    r.resolve(&style, &empty, &empty, true);
    assert!(r.dirty().contains(DirtyFields::BLUR_RADIUS | DirtyFields::TINTS));
    assert!(!r.dirty().any(DirtyFields::MASK | DirtyFields::ALPHA));

    r.dirty_mut().clear();
    r.resolve(&style, &empty, &empty, true);
    assert!(r.dirty().is_empty());
}

#[test]
fn style_round_trips_through_json() {
    let json = r#"{
        "blur_radius": 18.0,
        "tints": [{"kind": "color", "color": {"r": 1.0, "g": 1.0, "b": 1.0, "a": 0.2}}],
        "input_scale": "auto",
        "blurred_edge_treatment": {"rounded_rect": {"corner_radius": 12.0}},
        "progressive": {"linear": {"start": {"x": 0.0, "y": 0.0}, "end": {"x": 0.0, "y": 100.0}}}
    }"#;
    let style = Style::from_json(json).unwrap();
    assert_eq!(style.blur_radius, Some(18.0));
    assert_eq!(style.input_scale, Some(InputScale::Auto));
    assert_eq!(
        style.blurred_edge_treatment,
        Some(BlurredEdgeTreatment::RoundedRect {
            corner_radius: 12.0
        })
    );
    match &style.progressive {
        Some(Progressive::Linear(g)) => {
            assert_eq!(g.start_intensity, 0.0);
            assert_eq!(g.end_intensity, 1.0);
        }
        other => panic!("unexpected progressive {other:?}"),
    }

    let again = Style::from_json(&style.to_json().unwrap()).unwrap();
    assert_eq!(again, style);
}

#[test]
fn unknown_fields_and_bad_values_are_rejected() {
    assert!(matches!(
        Style::from_json(r#"{"blur": 3}"#),
        Err(BackdropError::Serde(_))
    ));
    assert!(matches!(
        Style::from_json(r#"{"blur_radius": -3}"#),
        Err(BackdropError::Validation(_))
    ));
    assert!(matches!(
        Style::from_json(r#"{"alpha": 1.5}"#),
        Err(BackdropError::Validation(_))
    ));
    assert!(matches!(
        Style::from_json(r#"{"input_scale": {"fixed": 0.0}}"#),
        Err(BackdropError::Validation(_))
    ));
}
