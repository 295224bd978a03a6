use super::*;

fn paris() -> AreaFilter {
    AreaFilter {
        center: GeoPoint::new(48.8504, 2.2181).unwrap(),
        radius_km: 100.0,
    }
}

#[test]
fn empty_track_is_never_relevant() {
    assert!(!paris().is_relevant(&[]));
}

#[test]
fn one_nearby_point_is_enough() {
    let far = GeoPoint::new(43.2965, 5.3698).unwrap(); // Marseille
    let near = GeoPoint::new(48.8566, 2.3522).unwrap();
    assert!(!paris().is_relevant(&[far, far]));
    assert!(paris().is_relevant(&[far, near, far]));
}

#[test]
fn radius_boundary_is_inclusive() {
    let f = paris();
    let p = GeoPoint::new(49.5, 2.2181).unwrap();
    let d = distance_km(p, f.center);
    let exact = AreaFilter { radius_km: d, ..f };
    assert!(exact.is_relevant(&[p]));
    let shy = AreaFilter {
        radius_km: d - 1e-6,
        ..f
    };
    assert!(!shy.is_relevant(&[p]));
}

#[test]
fn gradient_endpoints_and_midpoint() {
    assert_eq!(color_for(0, 5), Rgb8::new(44, 58, 127));
    assert_eq!(color_for(2, 5), Rgb8::new(86, 44, 127));
    assert_eq!(color_for(4, 5), Rgb8::new(44, 127, 44));
}

#[test]
fn single_track_gets_the_start_color() {
    assert_eq!(color_for(0, 1), color_for(0, 5));
    assert_eq!(color_for(0, 0), color_for(0, 5));
}

#[test]
fn color_is_a_pure_function() {
    for total in [1usize, 2, 9, 250] {
        for i in 0..total {
            assert_eq!(color_for(i, total), color_for(i, total));
        }
    }
}

#[test]
fn hsv_gray_when_unsaturated() {
    assert_eq!(hsv_to_rgb(0.3, 0.0, 1.0), Rgb8::new(255, 255, 255));
    assert_eq!(hsv_to_rgb(0.0, 1.0, 1.0), Rgb8::new(255, 0, 0));
}
