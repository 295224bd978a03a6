use image::{GrayImage, Luma, Rgb};

use super::*;

fn id(track: usize, segment: usize) -> FrameId {
    FrameId { track, segment }
}

#[test]
fn store_writes_named_valid_png() {
    let dir = tempfile::tempdir().unwrap();
    let cache = FrameCache::new(dir.path());
    let img = RgbImage::from_pixel(4, 2, Rgb([1, 2, 3]));

    let path = cache.store(id(2, 7), &img).unwrap();
    assert_eq!(path, dir.path().join("frame_002_007.png"));
    validate_frame(&path).unwrap();
}

#[test]
fn store_into_missing_folder_reports_and_leaves_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let cache = FrameCache::new(dir.path().join("nope"));
    let img = RgbImage::new(2, 2);
    assert!(cache.store(id(0, 1), &img).is_err());
    assert!(!dir.path().join("nope").exists());
}

#[test]
fn load_all_sorts_by_name_and_skips_garbage() {
    let dir = tempfile::tempdir().unwrap();
    let cache = FrameCache::new(dir.path());
    cache
        .store(id(1, 1), &RgbImage::from_pixel(2, 2, Rgb([9, 9, 9])))
        .unwrap();
    cache
        .store(id(0, 2), &RgbImage::from_pixel(2, 2, Rgb([5, 5, 5])))
        .unwrap();
    GrayImage::from_pixel(2, 2, Luma([77]))
        .save(dir.path().join("frame_000_001.png"))
        .unwrap();
    std::fs::write(dir.path().join("frame_000_003.png"), b"not a png").unwrap();
    std::fs::write(dir.path().join("notes.txt"), b"ignored").unwrap();

    let frames = cache.load_all().unwrap();
    let names: Vec<_> = frames
        .iter()
        .map(|f| f.path.file_name().unwrap().to_str().unwrap().to_string())
        .collect();
    assert_eq!(
        names,
        ["frame_000_001.png", "frame_000_002.png", "frame_001_001.png"]
    );
    // Grayscale frames come back as three channels.
    assert_eq!(frames[0].image.get_pixel(0, 0).0, [77, 77, 77]);
    assert_eq!(frames[2].id, Some(id(1, 1)));
}

#[test]
fn empty_or_missing_folder_has_no_frames() {
    let dir = tempfile::tempdir().unwrap();
    let err = FrameCache::new(dir.path()).load_all().unwrap_err();
    assert!(matches!(err, TrailreelError::NoFrames(_)));

    let err = FrameCache::new(dir.path().join("missing"))
        .load_all()
        .unwrap_err();
    assert!(matches!(err, TrailreelError::NoFrames(_)));
}

#[test]
fn clear_removes_files_but_keeps_folder() {
    let dir = tempfile::tempdir().unwrap();
    let cache = FrameCache::new(dir.path());
    cache.store(id(0, 1), &RgbImage::new(2, 2)).unwrap();
    std::fs::write(dir.path().join("stale.tmp"), b"x").unwrap();

    assert_eq!(cache.clear().unwrap(), 2);
    assert!(dir.path().exists());
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    assert_eq!(FrameCache::new(dir.path().join("missing")).clear().unwrap(), 0);
}
