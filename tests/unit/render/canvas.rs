use image::Rgb;

use super::*;
use crate::foundation::core::GeoPoint;

fn view() -> MapView {
    MapView {
        center: GeoPoint::new(48.85, 2.21).unwrap(),
        width: 40,
        height: 30,
        zoom: 13,
        supersample: 2,
    }
}

fn white_canvas() -> CumulativeCanvas {
    let base = RgbImage::from_pixel(80, 60, Rgb([255, 255, 255]));
    CumulativeCanvas::new(&base, &view()).unwrap()
}

fn rgb_at(pixmap: &Pixmap, x: u32, y: u32) -> [u8; 3] {
    let p = pixmap.pixel(x, y).unwrap();
    [p.red(), p.green(), p.blue()]
}

#[test]
fn rejects_base_of_wrong_size() {
    let base = RgbImage::new(40, 30);
    assert!(CumulativeCanvas::new(&base, &view()).is_err());
}

#[test]
fn segments_accumulate() {
    let mut canvas = white_canvas();
    let red = Rgb8::new(200, 0, 0);
    canvas.draw_segment(PixelPos { x: 5, y: 10 }, PixelPos { x: 75, y: 10 }, red);
    canvas.draw_segment(PixelPos { x: 40, y: 2 }, PixelPos { x: 40, y: 58 }, red);

    assert_eq!(rgb_at(canvas.pixmap(), 20, 10), [200, 0, 0]);
    assert_eq!(rgb_at(canvas.pixmap(), 40, 40), [200, 0, 0]);
    assert_eq!(rgb_at(canvas.pixmap(), 20, 40), [255, 255, 255]);
}

#[test]
fn degenerate_and_offscreen_segments_are_harmless() {
    let mut canvas = white_canvas();
    canvas.draw_segment(PixelPos { x: 5, y: 5 }, PixelPos { x: 5, y: 5 }, Rgb8::BLACK);
    canvas.draw_segment(
        PixelPos { x: -500, y: -500 },
        PixelPos { x: -400, y: -450 },
        Rgb8::BLACK,
    );
    assert!(canvas.pixmap().data().iter().all(|&b| b == 255));
}

#[test]
fn marker_does_not_touch_canvas() {
    let canvas = white_canvas();
    let before = canvas.pixmap().data().to_vec();
    let frame = canvas.snapshot_with_marker(PixelPos { x: 40, y: 30 }, &MarkerStyle::for_supersample(2));

    assert_eq!(canvas.pixmap().data(), &before[..]);

    // Semi-transparent orange over white.
    let [r, g, b] = rgb_at(&frame, 40, 30);
    assert_eq!(r, 255);
    assert!((185..=200).contains(&g), "g = {g}");
    assert!((108..=122).contains(&b), "b = {b}");

    // Dark ring at radius 14..15.
    let [r, _, _] = rgb_at(&frame, 40 + 14, 30);
    assert!(r < 128, "ring pixel r = {r}");

    assert_eq!(rgb_at(&frame, 2, 2), [255, 255, 255]);
}

#[test]
fn opaque_conversion_drops_alpha() {
    let canvas = white_canvas();
    let rgb = opaque_pixmap_to_rgb(canvas.pixmap());
    assert_eq!(rgb.dimensions(), (80, 60));
    assert!(rgb.pixels().all(|p| p.0 == [255, 255, 255]));
}
