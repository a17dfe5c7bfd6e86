//! Multi-channel shaping from a TOML configuration
//!
//! A planner provides position and velocity. Both are smoothed, and the acceleration
//! and jerk are derived from the velocity channel alone.

use nested_shaper::config::Config;

const CONFIG: &str = r#"
[nested_filter]
depth = 3
capacities = [20, 10]
windows = [10, 5]
summator = "kbk"
channels = 2
"#;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "debug".into()),
        )
        .init();

    let config = match std::env::args().nth(1) {
        Some(path) => Config::load(path)?,
        None => CONFIG.parse::<Config>()?,
    };
    let mut shaper = config.nested_filter()?.build_shaper::<f64>()?;

    let dt = 0.001;
    let omega = 2.0 * std::f64::consts::PI;
    shaper.fill(&[0.0, omega])?;

    println!("{:>8} {:>10} {:>10} {:>12} {:>14}", "t", "p", "v", "a", "j");
    for i in 1..=1_000 {
        let t = i as f64 * dt;
        let ready = shaper.update(&[(omega * t).sin(), omega * (omega * t).cos()])?;
        if ready && i % 50 == 0 {
            let out = shaper.peek(dt)?;
            println!("{:>8.3} {:>10.4} {:>10.4} {:>12.3} {:>14.1}", t, out[0], out[1], out[2], out[3]);
        }
    }

    Ok(())
}
