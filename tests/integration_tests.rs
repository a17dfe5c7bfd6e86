use approx::assert_abs_diff_eq;
use nested_shaper::metrics::{AngleCumulativeMean, CumulativeMean};
use nested_shaper::{
    shape, wrap_pi, AngleCumulativeShaper, AngleShaper, EuclideanCumulativeShaper, EuclideanShaper,
    MovingMean,
};
use std::f64::consts::PI;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()),
        )
        .with_test_writer()
        .try_init();
}

#[test]
fn test_three_point_derivative() {
    init_tracing();
    // A single stage of one sample passes the input straight to the stencil
    let mut shaper = EuclideanShaper::<f64, 3>::new(1.0, &[1]).unwrap();
    shaper.convolute(1.0, 0.1).unwrap();
    shaper.convolute(2.0, 0.1).unwrap();
    let d = shaper.convolute(4.0, 0.1).unwrap();

    // (4 - 1) / (2 * 0.1)
    assert_eq!(d[0], 2.0);
    assert_abs_diff_eq!(d[1], 15.0, epsilon = 1e-9);
}

#[test]
fn test_constant_preservation() {
    let mut euclidean = EuclideanShaper::<f64, 5>::new(5.0, &[7, 3, 2]).unwrap();
    let mut cumulative = EuclideanCumulativeShaper::<f64, 5>::new(5.0, &[7, 3, 2]).unwrap();
    let mut angle = AngleShaper::<f64, 5>::new(0.5, &[7, 3, 2]).unwrap();

    for _ in 0..50 {
        assert_eq!(euclidean.convolute(5.0, 0.01).unwrap(), [5.0, 0.0, 0.0, 0.0, 0.0]);
        assert_eq!(cumulative.convolute(5.0, 0.01).unwrap(), [5.0, 0.0, 0.0, 0.0, 0.0]);
        let d = angle.convolute(0.5, 0.01).unwrap();
        assert_abs_diff_eq!(d[0], 0.5, epsilon = 1e-12);
    }
}

#[test]
fn test_recursive_matches_cumulative() {
    let mut recursive = MovingMean::<f32>::new(0.0, 16).unwrap();
    let mut cumulative = MovingMean::<f32, CumulativeMean>::new(0.0, 16).unwrap();

    for i in 0..10_000 {
        let x = (i as f32 * 0.013).sin() * 3.0 + (i as f32 * 0.7).cos();
        let a = recursive.convolute(x);
        let b = cumulative.convolute(x);
        assert_abs_diff_eq!(a, b, epsilon = 1e-4);
    }
}

#[test]
fn test_quadratic_derivatives_through_cascade() {
    // A box filter keeps the curvature of a parabola and delays its slope
    let dt = 0.01;
    let mut shaper = EuclideanShaper::<f64, 5>::new(0.0, &[5, 3]).unwrap();
    let latency = shaper.latency();
    assert_eq!(latency, 5.0);

    for i in 0..200 {
        let t = i as f64 * dt;
        let d = shaper.convolute(t * t, dt).unwrap();
        if i < 20 {
            continue;
        }
        let delayed = t - latency * dt;
        assert_abs_diff_eq!(d[1], 2.0 * delayed, epsilon = 1e-8);
        assert_abs_diff_eq!(d[2], 2.0, epsilon = 1e-5);
        assert_abs_diff_eq!(d[3], 0.0, epsilon = 1e-2);
    }
}

#[test]
fn test_step_response_settles() {
    let amplitude = 3.0;
    let dt = 0.1;
    let windows = [10, 5];
    let mut shaper = EuclideanShaper::<f64, 5>::new(0.0, &windows).unwrap();

    let warm_up = windows.iter().sum::<usize>() + 5;
    for _ in 0..warm_up {
        let d = shaper.convolute(amplitude, dt).unwrap();
        // Bounded on the way up
        assert!(d.iter().all(|x| x.is_finite()));
        assert!(d[0] >= -1e-12 && d[0] <= amplitude + 1e-12);
    }

    let d = shaper.convolute(amplitude, dt).unwrap();
    assert_abs_diff_eq!(d[0], amplitude, epsilon = 1e-12);
    for &derivative in &d[1..] {
        assert_abs_diff_eq!(derivative, 0.0, epsilon = 1e-6);
    }
}

#[test]
fn test_fill_idempotence() {
    let mut a = EuclideanShaper::<f64, 3>::new(0.0, &[4, 2]).unwrap();
    let mut b = a.clone();
    for i in 0..10 {
        a.convolute(i as f64, 0.1).unwrap();
        b.convolute(i as f64, 0.1).unwrap();
    }

    a.initialize(2.0);
    b.initialize(2.0);
    b.initialize(2.0);
    assert_eq!(a.convolute(2.0, 0.1).unwrap(), b.convolute(2.0, 0.1).unwrap());
    assert_eq!(a.cascade().stages()[0].mean(), b.cascade().stages()[0].mean());
}

#[test]
fn test_circular_mean() {
    let mut mean = MovingMean::<f64, AngleCumulativeMean>::new(-PI / 6.0 + 2.0 * PI, 3).unwrap();
    mean.convolute(0.0);
    let m = mean.convolute(PI / 6.0);
    assert_abs_diff_eq!(wrap_pi(m), 0.0, epsilon = 1e-4);

    for _ in 0..3 {
        mean.convolute(PI / 6.0);
    }
    assert_abs_diff_eq!(mean.mean(), PI / 6.0, epsilon = 1e-4);
}

#[test]
fn test_angle_shaper_tracks_rotation() {
    // One radian per second for long enough to cross the seam several times
    let dt = 0.01;
    let mut recursive = AngleShaper::<f64, 3>::new(0.0, &[8, 4]).unwrap();
    let mut cumulative = AngleCumulativeShaper::<f64, 3>::new(0.0, &[8, 4]).unwrap();

    for i in 0..2_000 {
        let angle = wrap_pi(i as f64 * dt);
        let a = recursive.convolute(angle, dt).unwrap();
        let b = cumulative.convolute(angle, dt).unwrap();
        if i < 20 {
            continue;
        }
        assert_abs_diff_eq!(a[1], 1.0, epsilon = 1e-6);
        assert_abs_diff_eq!(b[1], 1.0, epsilon = 1e-6);
        assert_abs_diff_eq!(a[2], 0.0, epsilon = 1e-3);
    }
}

#[test]
fn test_array_axes_are_independent() {
    let mut planar = EuclideanShaper::<[f64; 2], 5>::new([1.0, -1.0], &[6, 3]).unwrap();
    let mut x = EuclideanShaper::<f64, 5>::new(1.0, &[6, 3]).unwrap();
    let mut y = EuclideanShaper::<f64, 5>::new(-1.0, &[6, 3]).unwrap();

    for i in 0..100 {
        let t = i as f64 * 0.05;
        let sample = [t.sin(), t * t - 1.0];
        let d = planar.convolute(sample, 0.05).unwrap();
        assert_eq!(d[0], x.convolute(sample[0], 0.05).unwrap());
        assert_eq!(d[1], y.convolute(sample[1], 0.05).unwrap());
    }
}

#[test]
fn test_runtime_resize() {
    let mut shaper = EuclideanShaper::<f32, 3>::with_extents(0.0, &[2, 2], &[16, 8]).unwrap();
    shaper.initialize_with(1.0, &[16, 8]).unwrap();
    assert_eq!(shaper.latency(), 7.5 + 3.5 + 1.0);
    assert_eq!(shaper.convolute(1.0, 0.1).unwrap(), [1.0, 0.0, 0.0]);
    assert!(shaper.initialize_with(1.0, &[17, 8]).is_err());
}

#[test]
fn test_convenience_shape() {
    let data: Vec<f64> = (0..100).map(|i| 0.5 * i as f64).collect();
    let shaped = shape(&data, &[5, 5], 0.1).unwrap();
    assert_eq!(shaped.len(), data.len());
    assert_abs_diff_eq!(shaped[99][1], 5.0, epsilon = 1e-9);
    assert_abs_diff_eq!(shaped[99][2], 0.0, epsilon = 1e-6);

    assert!(shape(&[], &[5], 0.1).unwrap().is_empty());
    assert!(shape(&data, &[], 0.1).is_err());
}
