use super::*;
use crate::clip::opts::BridgeOpts;
use crate::foundation::core::RectD;
use crate::host::synthetic::{EffectOp, Pattern, ProjectSettings, SyntheticEffect, SyntheticNode};

fn dw() -> RectD {
    RectD::new(0.0, 0.0, 4.0, 4.0)
}

fn plugin(name: &str, inputs: &[&str]) -> (Arc<SyntheticNode>, Arc<SyntheticEffect>) {
    let node = Arc::new(SyntheticNode::with_inputs(name, dw(), inputs));
    let fx = SyntheticEffect::attach(
        &node,
        EffectOp::Passthrough,
        ProjectSettings::default(),
        BridgeOpts::default(),
    )
    .unwrap();
    (node, fx)
}

fn as_host(node: &Arc<SyntheticNode>) -> Arc<dyn HostNode> {
    node.clone()
}

#[test]
fn native_nodes_add_no_depth() {
    let src = Arc::new(SyntheticNode::source("src", dw(), Pattern::Gradient));
    assert_eq!(UpstreamWalk::new(1).plugin_depth(&as_host(&src)).unwrap(), 0);
}

#[test]
fn depth_counts_the_longest_plugin_chain() {
    let src = Arc::new(SyntheticNode::source("src", dw(), Pattern::Gradient));
    let (a_node, _a) = plugin("a", &["Source"]);
    let (b_node, _b) = plugin("b", &["Source"]);
    let (c_node, _c) = plugin("c", &["Source", "Mask"]);
    a_node.connect_input(0, Arc::clone(&src));
    b_node.connect_input(0, Arc::clone(&a_node));
    c_node.connect_input(0, Arc::clone(&src));
    c_node.connect_input(1, Arc::clone(&b_node));

    assert_eq!(UpstreamWalk::new(8).plugin_depth(&as_host(&c_node)).unwrap(), 3);
    assert_eq!(UpstreamWalk::new(3).plugin_depth(&as_host(&c_node)).unwrap(), 3);
    assert!(matches!(
        UpstreamWalk::new(2).plugin_depth(&as_host(&c_node)),
        Err(BridgeError::DepthExceeded(2))
    ));
}

#[test]
fn shared_upstreams_are_not_cycles() {
    let (a_node, _a) = plugin("a", &[]);
    let (b_node, _b) = plugin("b", &["Source"]);
    let (c_node, _c) = plugin("c", &["Source", "Mask"]);
    b_node.connect_input(0, Arc::clone(&a_node));
    c_node.connect_input(0, Arc::clone(&a_node));
    c_node.connect_input(1, Arc::clone(&b_node));

    assert_eq!(UpstreamWalk::new(8).plugin_depth(&as_host(&c_node)).unwrap(), 3);
}

#[test]
fn loops_are_reported_with_their_chain() {
    let (a_node, _a) = plugin("a", &["Source"]);
    let (b_node, _b) = plugin("b", &["Source"]);
    a_node.connect_input(0, Arc::clone(&b_node));
    b_node.connect_input(0, Arc::clone(&a_node));

    let Err(BridgeError::Cycle(chain)) = UpstreamWalk::new(8).plugin_depth(&as_host(&b_node))
    else {
        panic!("expected a cycle");
    };
    assert_eq!(chain, "b -> a -> b");

    a_node.disconnect_input(0);
    b_node.disconnect_input(0);
}

#[test]
fn self_loops_are_cycles() {
    let (a_node, _a) = plugin("a", &["Source"]);
    a_node.connect_input(0, Arc::clone(&a_node));

    let Err(BridgeError::Cycle(chain)) = UpstreamWalk::new(8).plugin_depth(&as_host(&a_node))
    else {
        panic!("expected a cycle");
    };
    assert_eq!(chain, "a -> a");

    a_node.disconnect_input(0);
}
