use super::*;

#[test]
fn defaults_match_the_reference_run() {
    let cfg = PipelineConfig::default();
    assert_eq!((cfg.width, cfg.height, cfg.zoom, cfg.supersample, cfg.fps), (800, 534, 13, 2, 24));
    assert_eq!(cfg.speed_factor, 7.0);
    assert_eq!(cfg.max_frames_per_course, 120);
    assert_eq!(cfg.hold_secs, 2.0);
    assert_eq!(cfg.start_date_limit.to_rfc3339(), "2025-01-01T00:00:00+00:00");
    assert_eq!(cfg.intermediate_video, PathBuf::from("concat_clip.mp4"));
    assert_eq!(cfg.processing_order, ProcessingOrder::BaseName);
    cfg.validate().unwrap();
}

#[test]
fn json_accepts_partial_config_and_legacy_erase_flag() {
    let cfg: PipelineConfig = serde_json::from_str(
        r#"{
            "folder": "runs",
            "errase_frame_folder": true,
            "speed_factor": 2.5,
            "processing_order": "start_time",
            "center": {"lat": 45.76, "lon": 4.83}
        }"#,
    )
    .unwrap();
    assert_eq!(cfg.folder, PathBuf::from("runs"));
    assert!(cfg.erase_frame_folder);
    assert_eq!(cfg.speed_factor, 2.5);
    assert_eq!(cfg.processing_order, ProcessingOrder::StartTime);
    assert_eq!(cfg.center.lat, 45.76);
    assert_eq!(cfg.width, 800);
}

#[test]
fn json_rejects_unknown_fields() {
    assert!(serde_json::from_str::<PipelineConfig>(r#"{"speed": 2}"#).is_err());
}

#[test]
fn config_file_errors_carry_the_path() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cfg.json");
    std::fs::write(&path, "{ not json").unwrap();
    let err = PipelineConfig::from_json_file(&path).unwrap_err();
    assert!(err.to_string().contains("cfg.json"));

    std::fs::write(&path, r#"{"skip_audio": true}"#).unwrap();
    assert!(PipelineConfig::from_json_file(&path).unwrap().skip_audio);
}

#[test]
fn validation_rejects_bad_values() {
    let bad = [
        PipelineConfig {
            width: 801,
            ..PipelineConfig::default()
        },
        PipelineConfig {
            fps: 0,
            ..PipelineConfig::default()
        },
        PipelineConfig {
            speed_factor: 0.0,
            ..PipelineConfig::default()
        },
        PipelineConfig {
            speed_factor: f64::NAN,
            ..PipelineConfig::default()
        },
        PipelineConfig {
            max_frames_per_course: 1,
            ..PipelineConfig::default()
        },
        PipelineConfig {
            zoom: 23,
            ..PipelineConfig::default()
        },
        PipelineConfig {
            supersample: 0,
            ..PipelineConfig::default()
        },
        PipelineConfig {
            center: GeoPoint { lat: 89.0, lon: 0.0 },
            ..PipelineConfig::default()
        },
        PipelineConfig {
            hold_secs: -1.0,
            ..PipelineConfig::default()
        },
    ];
    for cfg in bad {
        assert!(
            matches!(cfg.validate(), Err(TrailreelError::Validation(_))),
            "{cfg:?}"
        );
    }
}

#[test]
fn derived_settings() {
    let cfg = PipelineConfig {
        intermediate_video: PathBuf::from("work/concat_clip.mp4"),
        ..PipelineConfig::default()
    };
    assert_eq!(
        cfg.audio_work_path(),
        PathBuf::from("work/concat_clip_audio.wav")
    );
    assert_eq!(cfg.view().canvas_width(), 1600);
    assert_eq!(cfg.area().radius_km, 100.0);
    assert_eq!(cfg.clip_settings().hold_frames(), 48);
}

#[test]
fn skipped_frames_with_empty_cache_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = PipelineConfig {
        frames_folder: dir.path().join("frames"),
        output_file: dir.path().join("out.mp4"),
        skip_frames: true,
        ..PipelineConfig::default()
    };
    let err = run_pipeline(&cfg).unwrap_err();
    assert!(matches!(err, TrailreelError::NoFrames(_)));
    assert!(!cfg.output_file.exists());
}

#[test]
fn missing_music_means_no_audio() {
    let cfg = PipelineConfig {
        music_path: Some(PathBuf::from("/no/such/music.mp3")),
        ..PipelineConfig::default()
    };
    let clip = Clip {
        source: PathBuf::from("x.mp4"),
        duration_secs: Some(3.0),
    };
    assert_eq!(audio_stage(&cfg, &clip, 1.0), None);

    let cfg = PipelineConfig {
        music_path: None,
        ..cfg
    };
    assert_eq!(audio_stage(&cfg, &clip, 1.0), None);
}
