//! Shapes a coarsely sampled minimum-jerk move and compares against the analytic profile
//!
//! The move is only updated every `hold` control cycles, like a planner running slower
//! than the control loop. The shaped output is compared with the analytic position,
//! velocity and acceleration at the delayed time given by `Shaper::latency`.

use nested_shaper::csv_utils::write_derivatives_csv;
use nested_shaper::EuclideanShaper;

/// Minimum-jerk move of `length` over `duration`: position, velocity, acceleration
fn profile(t: f64, length: f64, duration: f64) -> [f64; 3] {
    let tau = (t / duration).clamp(0.0, 1.0);
    let p = length * (10.0 * tau.powi(3) - 15.0 * tau.powi(4) + 6.0 * tau.powi(5));
    if t <= 0.0 || t >= duration {
        return [p, 0.0, 0.0];
    }
    let v = length / duration * (30.0 * tau.powi(2) - 60.0 * tau.powi(3) + 30.0 * tau.powi(4));
    let a = length / duration.powi(2) * (60.0 * tau - 180.0 * tau.powi(2) + 120.0 * tau.powi(3));
    [p, v, a]
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .init();

    let output = std::env::args().nth(1).unwrap_or_else(|| "trajectory.csv".to_string());

    let dt = 0.001;
    let hold = 10;
    let (length, duration) = (0.2, 0.5);
    let steps = ((duration + 0.2) / dt) as usize;

    let mut shaper = EuclideanShaper::<f64, 3>::new(0.0, &[hold, hold / 2, 3])?;
    let delay = shaper.latency() * dt;

    let mut inputs = Vec::with_capacity(steps);
    let mut outputs = Vec::with_capacity(steps);
    let mut max_error = [0.0f64; 3];

    for i in 0..steps {
        // sample and hold at the planner rate
        let t_planner = (i / hold * hold) as f64 * dt;
        let input = profile(t_planner, length, duration)[0];
        let shaped = shaper.convolute(input, dt)?;

        // the held input lags by half a planner period on average
        let t_reference = i as f64 * dt - delay - (hold - 1) as f64 * dt / 2.0;
        let reference = profile(t_reference, length, duration);
        for k in 0..3 {
            max_error[k] = max_error[k].max((shaped[k] - reference[k]).abs());
        }

        inputs.push(input);
        outputs.push(shaped);
    }

    println!("latency {:.1} ms", delay * 1e3);
    println!("max position error     {:.3e} m", max_error[0]);
    println!("max velocity error     {:.3e} m/s", max_error[1]);
    println!("max acceleration error {:.3e} m/s²", max_error[2]);

    write_derivatives_csv(&output, dt, &inputs, &outputs)?;
    println!("wrote {} rows to {}", outputs.len(), output);

    Ok(())
}
