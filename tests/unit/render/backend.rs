use super::*;
use crate::{EffectId, foundation::core::Color};

#[test]
fn kernel_from_request_scales_by_density() {
    let tints = [Tint::color(Color::WHITE.with_alpha(0.2))];
    let k = Kernel::from_request(&KernelRequest {
        radius: 10.0,
        density: 2.0,
        edge_treatment: BlurredEdgeTreatment::Rectangle,
        noise_factor: 3.0,
        tints: &tints,
    });
    assert_eq!(k.radius_px, 20.0);
    assert_eq!(k.sigma, 10.0);
    assert!(k.clamp_edges);
    assert_eq!(k.noise_factor, 1.0);
    assert_eq!(k.tints.len(), 1);
}

#[test]
fn unbounded_edges_do_not_clamp() {
    let k = Kernel::from_request(&KernelRequest {
        radius: 0.0,
        density: 1.0,
        edge_treatment: BlurredEdgeTreatment::Unbounded,
        noise_factor: 0.0,
        tints: &[],
    });
    assert!(!k.clamp_edges);
    assert!(k.sigma > 0.0);
}

#[test]
fn no_kernels_provider_never_creates() {
    let mut p = NoKernels;
    assert!(!p.supports_kernels());
    let req = KernelRequest {
        radius: 5.0,
        density: 1.0,
        edge_treatment: BlurredEdgeTreatment::Rectangle,
        noise_factor: 0.0,
        tints: &[],
    };
    assert!(p.create_kernel(&req).is_none());
}

#[test]
fn layer_state_drawable_requires_live_non_empty_layer() {
    let live = LayerState {
        size: IntSize::new(2, 2),
        released: false,
    };
    assert!(live.is_drawable());
    assert!(
        !LayerState {
            released: true,
            ..live
        }
        .is_drawable()
    );
    assert!(
        !LayerState {
            size: IntSize::new(0, 2),
            ..live
        }
        .is_drawable()
    );
}

#[test]
fn vec_sink_deduplicates_requests() {
    let mut sink: Vec<EffectId> = Vec::new();
    sink.request_redraw(EffectId(1));
    sink.request_redraw(EffectId(1));
    sink.request_redraw(EffectId(2));
    assert_eq!(sink, vec![EffectId(1), EffectId(2)]);
}
