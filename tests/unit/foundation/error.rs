use super::*;

#[test]
fn display_prefixes_are_stable() {
    assert!(
        BridgeError::validation("x")
            .to_string()
            .contains("validation error:")
    );
    assert!(
        BridgeError::unconnected("Source")
            .to_string()
            .contains("unconnected clip: Source")
    );
    assert!(
        BridgeError::unsupported("x")
            .to_string()
            .contains("unsupported:")
    );
}

#[test]
fn render_failure_names_clip_and_status() {
    let err = BridgeError::RenderFailed {
        clip: "Source".to_string(),
        status: RenderStatus::Failed,
    };
    let msg = err.to_string();
    assert!(msg.contains("Source"));
    assert!(msg.contains("Failed"));
    assert!(err.is_upstream_failure());
    assert!(!BridgeError::ReadOnly(3).is_upstream_failure());
}

#[test]
fn other_preserves_source() {
    let base = std::io::Error::other("boom");
    let err = BridgeError::Other(anyhow::Error::new(base));
    assert!(err.to_string().contains("boom"));
}
