use super::*;

#[test]
fn skips_are_collected_in_order() {
    let mut summary = RunSummary::default();
    summary.skip("b.gpx", SkipReason::OutOfArea);
    summary.skip("a.fit", SkipReason::TooFewPoints(1));
    summary.skip("c.gpx", SkipReason::OutOfArea);

    let paths: Vec<_> = summary.skipped.iter().map(|s| s.path.clone()).collect();
    assert_eq!(
        paths,
        [PathBuf::from("b.gpx"), PathBuf::from("a.fit"), PathBuf::from("c.gpx")]
    );
    assert_eq!(
        summary.count_skipped(|r| *r == SkipReason::OutOfArea),
        2
    );
}

#[test]
fn reasons_read_well() {
    let frame = FrameId {
        track: 4,
        segment: 12,
    };
    let reason = SkipReason::CorruptFrame {
        frame,
        detail: "disk full".to_string(),
    };
    assert_eq!(
        reason.to_string(),
        "frame frame_004_012.png could not be persisted: disk full"
    );
    assert_eq!(SkipReason::TooFewPoints(1).to_string(), "only 1 point(s)");
}
