use super::*;

#[test]
fn blur_radius_0_is_identity() {
    let src = vec![1u8, 2, 3, 4, 5, 6, 7, 8];
    let out = blur_rgba8_premul(&src, 1, 2, 0, 1.0, EdgeMode::Clamp).unwrap();
    assert_eq!(out, src);
}

#[test]
fn clamped_blur_of_constant_image_is_identity() {
    let (w, h) = (4u32, 3u32);
    let px = [10u8, 20u8, 30u8, 40u8];
    let src = px.repeat((w * h) as usize);
    let out = blur_rgba8_premul(&src, w, h, 3, 2.0, EdgeMode::Clamp).unwrap();
    assert_eq!(out, src);
}

#[test]
fn decal_blur_fades_edges_of_constant_image() {
    let (w, h) = (6u32, 6u32);
    let src = [255u8, 255, 255, 255].repeat((w * h) as usize);
    let out = blur_rgba8_premul(&src, w, h, 3, 2.0, EdgeMode::Decal).unwrap();
    let corner = out[3];
    let centre = out[((3 * w + 3) * 4 + 3) as usize];
    assert!(corner < centre, "corner {corner} centre {centre}");
}

#[test]
fn blur_spreads_energy_from_single_pixel() {
    let (w, h) = (5u32, 5u32);
    let mut src = vec![0u8; (w * h * 4) as usize];
    let center = ((2 * w + 2) * 4) as usize;
    src[center..center + 4].copy_from_slice(&[255, 255, 255, 255]);

    let out = blur_rgba8_premul(&src, w, h, 2, 1.2, EdgeMode::Clamp).unwrap();

    let nonzero = out.chunks_exact(4).filter(|px| px[3] != 0).count();
    assert!(nonzero > 1);

    let sum_a: u32 = out.chunks_exact(4).map(|px| u32::from(px[3])).sum();
    assert!((sum_a as i32 - 255).abs() <= 4);
}

#[test]
fn mismatched_buffer_is_a_render_error() {
    let err = blur_rgba8_premul(&[0u8; 7], 1, 2, 1, 1.0, EdgeMode::Clamp).unwrap_err();
    assert!(err.to_string().starts_with("render error:"));
}

#[test]
fn radius_covers_three_sigma() {
    assert_eq!(radius_for_sigma(2.0), 6);
    assert_eq!(radius_for_sigma(0.0), 0);
    assert_eq!(radius_for_sigma(f32::NAN), 0);
}
