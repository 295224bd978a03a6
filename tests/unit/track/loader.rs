use chrono::TimeZone as _;

use super::*;

fn gpx_doc(points: &[(f64, f64)], start: Option<&str>) -> String {
    let mut body = String::new();
    for (i, (lat, lon)) in points.iter().enumerate() {
        match (i, start) {
            (0, Some(t)) => body.push_str(&format!(
                "<trkpt lat=\"{lat}\" lon=\"{lon}\"><time>{t}</time></trkpt>\n"
            )),
            _ => body.push_str(&format!("<trkpt lat=\"{lat}\" lon=\"{lon}\"/>\n")),
        }
    }
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<gpx version="1.1" creator="trailreel-tests" xmlns="http://www.topografix.com/GPX/1/1">
<trk><trkseg>
{body}</trkseg></trk>
</gpx>
"#
    )
}

fn loader() -> TrackLoader {
    TrackLoader::new(
        Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap(),
        AreaFilter {
            center: GeoPoint::new(48.8504, 2.2181).unwrap(),
            radius_km: 100.0,
        },
    )
}

const NEAR: [(f64, f64); 3] = [(48.8504, 2.2181), (48.8520, 2.2200), (48.8540, 2.2230)];

#[test]
fn admits_recent_nearby_track() {
    let dir = tempfile::tempdir().unwrap();
    let p = dir.path().join("a.gpx");
    std::fs::write(&p, gpx_doc(&NEAR, Some("2025-04-01T08:00:00Z"))).unwrap();

    let Admission::Admitted(track) = loader().admit(3, &p) else {
        panic!("expected admission");
    };
    assert_eq!(track.index, 3);
    assert_eq!(track.points.len(), 3);
    assert!(track.is_renderable());
    assert_eq!(
        track.start_time,
        Some(Utc.with_ymd_and_hms(2025, 4, 1, 8, 0, 0).unwrap())
    );
}

#[test]
fn skip_reasons() {
    let dir = tempfile::tempdir().unwrap();
    let cases = [
        ("old.gpx", gpx_doc(&NEAR, Some("2024-12-31T23:59:59Z"))),
        ("notime.gpx", gpx_doc(&NEAR, None)),
        ("short.gpx", gpx_doc(&NEAR[..1], Some("2025-04-01T08:00:00Z"))),
        (
            "far.gpx",
            gpx_doc(
                &[(43.2965, 5.3698), (43.30, 5.37)],
                Some("2025-04-01T08:00:00Z"),
            ),
        ),
        ("broken.gpx", "<gpx".to_string()),
    ];
    for (name, doc) in &cases {
        std::fs::write(dir.path().join(name), doc).unwrap();
    }

    let reason = |name: &str| match loader().admit(0, &dir.path().join(name)) {
        Admission::Skipped(r) => r,
        Admission::Admitted(_) => panic!("{name} should be skipped"),
    };
    assert!(matches!(reason("old.gpx"), SkipReason::BeforeCutoff(_)));
    assert_eq!(reason("notime.gpx"), SkipReason::MissingStartTime);
    assert_eq!(reason("short.gpx"), SkipReason::TooFewPoints(1));
    assert_eq!(reason("far.gpx"), SkipReason::OutOfArea);
    assert!(matches!(reason("broken.gpx"), SkipReason::Unreadable(_)));
    assert!(matches!(reason("missing.gpx"), SkipReason::Unreadable(_)));
}

#[test]
fn unrecognized_extension_is_unreadable() {
    let dir = tempfile::tempdir().unwrap();
    let p = dir.path().join("a.tcx");
    std::fs::write(&p, "<tcx/>").unwrap();
    assert!(matches!(
        loader().admit(0, &p),
        Admission::Skipped(SkipReason::Unreadable(_))
    ));
}

#[test]
fn base_name_order_sorts_paths() {
    let files = vec![PathBuf::from("c.gpx"), PathBuf::from("a.fit")];
    assert_eq!(
        TrackLoader::order(files, ProcessingOrder::BaseName),
        vec![PathBuf::from("a.fit"), PathBuf::from("c.gpx")]
    );
}

#[test]
fn start_time_order_is_chronological_with_undated_last() {
    let dir = tempfile::tempdir().unwrap();
    let a = dir.path().join("a.gpx");
    let b = dir.path().join("b.gpx");
    let c = dir.path().join("c.gpx");
    std::fs::write(&a, gpx_doc(&NEAR, Some("2025-06-01T08:00:00Z"))).unwrap();
    std::fs::write(&b, gpx_doc(&NEAR, None)).unwrap();
    std::fs::write(&c, gpx_doc(&NEAR, Some("2025-02-01T08:00:00Z"))).unwrap();

    let ordered = TrackLoader::order(
        vec![a.clone(), b.clone(), c.clone()],
        ProcessingOrder::StartTime,
    );
    assert_eq!(ordered, vec![c, a, b]);
}
