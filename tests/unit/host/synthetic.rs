use super::*;

fn window() -> RectD {
    RectD::new(0.0, 0.0, 8.0, 4.0)
}

#[test]
fn rows_are_generated_once_and_counted() {
    let node = SyntheticNode::source("src", window(), Pattern::Constant([0.1, 0.2, 0.3, 1.0]));
    let mut rows = node.open_rows(RectI::new(0, 0, 8, 4), ChannelMask::RGBA);
    rows.claim_interest(true);

    let row = rows.at(1).unwrap();
    assert_eq!((row.offset(), row.right()), (0, 8));
    assert_eq!(row.plane(Channel::Green).unwrap(), &[0.2; 8]);
    assert!(rows.at(1).is_some());
    assert_eq!(node.rows_served(), 1);

    rows.erase(1);
    rows.erase(1);
    assert_eq!(node.rows_erased(), 1);
}

#[test]
fn rows_outside_the_window_or_missing_are_absent() {
    let node = SyntheticNode::source("src", window(), Pattern::Gradient).with_missing_rows([2]);
    let mut rows = node.open_rows(RectI::new(0, 0, 8, 4), ChannelMask::RGBA);
    assert!(rows.at(-1).is_none());
    assert!(rows.at(4).is_none());
    assert!(rows.at(2).is_none());
    assert!(rows.at(3).is_some());
}

#[test]
fn row_span_is_clipped_to_the_data_window() {
    let node = SyntheticNode::source(
        "src",
        RectD::new(2.0, 0.0, 6.0, 4.0),
        Pattern::Constant([1.0; 4]),
    );
    let mut rows = node.open_rows(RectI::new(0, 0, 4, 4), ChannelMask::RGBA);
    let row = rows.at(0).unwrap();
    assert_eq!((row.offset(), row.right()), (2, 4));
    assert_eq!(row.plane(Channel::Red).unwrap().len(), 2);
}

#[test]
fn lazy_channels_appear_after_compute() {
    let node = SyntheticNode::source("src", window(), Pattern::Gradient)
        .with_lazy_channels(ChannelMask::NONE.with(Channel::Alpha));
    let mut rows = node.open_rows(RectI::new(0, 0, 8, 4), ChannelMask::RGBA);
    let row = rows.at(0).unwrap();
    assert!(row.plane(Channel::Alpha).is_none());
    assert!(row.plane(Channel::Red).is_some());
    row.compute_channel(Channel::Alpha);
    assert_eq!(row.plane(Channel::Alpha).unwrap(), &[1.0; 8]);
}

#[test]
fn gradient_samples_pixel_centres() {
    let w = window();
    assert_eq!(Pattern::Gradient.sample(Channel::Red, 0, 0, w), 0.0625);
    assert_eq!(Pattern::Gradient.sample(Channel::Green, 0, 3, w), 0.875);
    assert_eq!(Pattern::Gradient.sample(Channel::Blue, 5, 1, w), 0.5);
}

#[test]
fn connecting_marks_upstream_as_consumed() {
    let src = Arc::new(SyntheticNode::source("src", window(), Pattern::Gradient));
    let fx = SyntheticNode::with_inputs("fx", window(), &["Source", "Mask"]);
    assert!(fx.input(0).is_none());
    assert!(!src.has_output_connected());

    fx.connect_input(0, Arc::clone(&src));
    assert!(src.has_output_connected());
    assert_eq!(fx.input(0).unwrap().name(), "src");
    assert!(fx.input(1).is_none());

    fx.disconnect_input(0);
    assert!(fx.input(0).is_none());
    assert!(fx.input(7).is_none());
}

#[test]
fn node_kinds() {
    let src = SyntheticNode::source("src", window(), Pattern::Gradient);
    assert!(src.is_input_node());
    assert!(!src.is_output_node());
    assert!(matches!(src.producer(), Producer::Native));

    let out = SyntheticNode::with_inputs("out", window(), &["Source"]).as_output();
    assert!(!out.is_input_node());
    assert!(out.is_output_node());
    assert_eq!(out.input_clip_names(), vec!["Source".to_string()]);
}

#[test]
fn effect_ops() {
    let px = [0.25, 0.5, 1.0, 0.5];
    assert_eq!(EffectOp::Passthrough.apply(px), px);
    assert_eq!(EffectOp::Invert.apply(px), [0.75, 0.5, 0.0, 0.5]);
    assert_eq!(EffectOp::Gain(2.0).apply(px), [0.5, 1.0, 2.0, 0.5]);
    assert_eq!(EffectOp::Fill([1.0; 4]).apply(px), [1.0; 4]);
}

#[test]
fn attach_declares_clips_and_hosts_the_effect() {
    let node = Arc::new(SyntheticNode::with_inputs("fx", window(), &["Source", "Mask"]));
    let fx = SyntheticEffect::attach(
        &node,
        EffectOp::Passthrough,
        ProjectSettings::default(),
        BridgeOpts::default(),
    )
    .unwrap();

    assert_eq!(fx.context(), EffectContext::Filter);
    assert!(fx.clip(OUTPUT_CLIP_NAME).unwrap().is_output());
    assert!(!fx.clip(SOURCE_CLIP_NAME).unwrap().descriptor().optional);
    assert!(fx.clip("Mask").unwrap().descriptor().optional);
    assert!(fx.clip("Matte").is_none());
    assert!(matches!(node.producer(), Producer::OpenFx(_)));
}

#[test]
fn generator_context_without_inputs() {
    let node = Arc::new(SyntheticNode::with_inputs("gen", window(), &[]));
    let fx = SyntheticEffect::attach(
        &node,
        EffectOp::Fill([0.0, 0.0, 1.0, 1.0]),
        ProjectSettings::default(),
        BridgeOpts::default(),
    )
    .unwrap();
    assert_eq!(fx.context(), EffectContext::Generator);

    let status = fx.render_action(0.0, FieldOrder::None, RectI::new(0, 0, 2, 2), RenderScale::UNIT);
    assert!(status.is_ok());
    let out = fx.clip(OUTPUT_CLIP_NAME).unwrap();
    let img = out.get_image(0.0, Some(RectD::new(0.0, 0.0, 2.0, 2.0))).unwrap();
    assert_eq!(img.read().pixel_f(1, 1), Some(&[0.0, 0.0, 1.0, 1.0]));
}

#[test]
fn forced_failure_is_reported_and_counted() {
    let node = Arc::new(SyntheticNode::with_inputs("gen", window(), &[]));
    let fx = SyntheticEffect::attach(
        &node,
        EffectOp::Fill([1.0; 4]),
        ProjectSettings::default(),
        BridgeOpts::default(),
    )
    .unwrap();
    fx.fail_with(Some(RenderStatus::ErrMemory));
    let status = fx.render_action(0.0, FieldOrder::None, RectI::new(0, 0, 1, 1), RenderScale::UNIT);
    assert_eq!(status, RenderStatus::ErrMemory);
    fx.fail_with(None);
    let status = fx.render_action(0.0, FieldOrder::None, RectI::new(0, 0, 1, 1), RenderScale::UNIT);
    assert!(status.is_ok());
    assert_eq!(fx.render_count(), 2);
}
