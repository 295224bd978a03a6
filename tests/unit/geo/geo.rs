use super::*;

fn gp(lat: f64, lon: f64) -> GeoPoint {
    GeoPoint::new(lat, lon).unwrap()
}

fn view() -> MapView {
    MapView {
        center: gp(48.8504, 2.2181),
        width: 800,
        height: 534,
        zoom: 13,
        supersample: 2,
    }
}

#[test]
fn distance_is_symmetric_and_zero_on_identity() {
    let pairs = [
        (gp(48.8504, 2.2181), gp(48.8566, 2.3522)),
        (gp(-33.86, 151.21), gp(40.71, -74.0)),
        (gp(0.0, 179.9), gp(0.0, -179.9)),
    ];
    for (a, b) in pairs {
        assert_eq!(distance_km(a, b), distance_km(b, a));
        assert_eq!(distance_km(a, a), 0.0);
    }
}

#[test]
fn one_degree_of_latitude_matches_radius() {
    let d = distance_km(gp(0.0, 0.0), gp(1.0, 0.0));
    let expected = EARTH_RADIUS_KM * std::f64::consts::PI / 180.0;
    assert!((d - expected).abs() < 1e-9, "got {d}, expected {expected}");
}

#[test]
fn distance_propagates_nan() {
    let a = GeoPoint {
        lat: f64::NAN,
        lon: 0.0,
    };
    assert!(distance_km(a, gp(0.0, 0.0)).is_nan());
}

#[test]
fn projection_origin_and_pole() {
    let (x, y) = project(gp(0.0, 0.0));
    assert!(x.abs() < 1e-9 && y.abs() < 1e-9);

    let (x, _) = project(gp(0.0, 180.0));
    assert!((x - EARTH_RADIUS_M * std::f64::consts::PI).abs() < 1e-6);

    let (_, y) = project(gp(90.0, 0.0));
    assert!(!y.is_finite() || y > 1e8);
}

#[test]
fn center_maps_to_middle_of_canvas() {
    let v = view();
    let p = to_pixel(v.center, &v);
    assert_eq!(p, PixelPos { x: 800, y: 534 });
}

#[test]
fn north_is_up_and_east_is_right() {
    let v = view();
    let c = to_pixel(v.center, &v);
    let north = to_pixel(gp(48.86, 2.2181), &v);
    let east = to_pixel(gp(48.8504, 2.23), &v);
    assert!(north.y < c.y);
    assert_eq!(north.x, c.x);
    assert!(east.x > c.x);
}

#[test]
fn supersample_scales_offsets() {
    let v1 = MapView {
        supersample: 1,
        ..view()
    };
    let v2 = view();
    let p = gp(48.86, 2.23);
    let a = to_pixel(p, &v1);
    let b = to_pixel(p, &v2);
    assert!((b.x - 2 * a.x).abs() <= 2);
    assert!((b.y - 2 * a.y).abs() <= 2);
}

#[test]
fn meters_per_pixel_halves_per_zoom_level() {
    let z13 = meters_per_pixel(13);
    let z14 = meters_per_pixel(14);
    assert!((z13 / z14 - 2.0).abs() < 1e-12);
    assert!((meters_per_pixel(0) - 156_543.033_928).abs() < 1e-3);
}

#[test]
fn decimate_is_identity_when_short() {
    let pts: Vec<u32> = (0..5).collect();
    let out = decimate(&pts, 5);
    assert!(matches!(out, std::borrow::Cow::Borrowed(_)));
    assert_eq!(&*out, &pts[..]);
    assert_eq!(&*decimate(&pts, 10), &pts[..]);
}

#[test]
fn decimate_keeps_endpoints_and_cap() {
    let pts: Vec<u32> = (0..1000).collect();
    for k in [2usize, 3, 7, 120, 999] {
        let out = decimate(&pts, k);
        assert_eq!(out.len(), k);
        assert_eq!(out[0], 0);
        assert_eq!(out[k - 1], 999);
        assert!(out.windows(2).all(|w| w[0] < w[1]));
    }
}

#[test]
fn decimate_degenerate_caps() {
    let pts: Vec<u32> = (0..10).collect();
    assert_eq!(&*decimate(&pts, 1), &[0]);
    assert!(decimate(&pts, 0).is_empty());
}

#[test]
fn decimate_is_deterministic() {
    let pts: Vec<u32> = (0..237).collect();
    assert_eq!(decimate(&pts, 17), decimate(&pts, 17));
    assert_eq!(&*decimate(&pts, 3), &[0, 118, 236]);
}
