use super::*;

#[test]
fn display_prefixes_are_stable() {
    assert!(
        TrailreelError::validation("x")
            .to_string()
            .contains("validation error:")
    );
    assert!(
        TrailreelError::decode("x")
            .to_string()
            .contains("decode error:")
    );
    assert!(
        TrailreelError::render("x")
            .to_string()
            .contains("render error:")
    );
    assert!(
        TrailreelError::encode("x")
            .to_string()
            .contains("encode error:")
    );
}

#[test]
fn no_frames_names_the_cache_folder() {
    let err = TrailreelError::NoFrames(PathBuf::from("frames_mercator14"));
    assert_eq!(
        err.to_string(),
        "no frames available in 'frames_mercator14'"
    );
}

#[test]
fn other_preserves_source() {
    let base = std::io::Error::other("boom");
    let err = TrailreelError::Other(anyhow::Error::new(base));
    assert!(err.to_string().contains("boom"));
}
