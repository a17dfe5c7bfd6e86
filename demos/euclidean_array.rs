//! Shapes a 3-axis helix and writes one derivative table per axis
//!
//! Reads samples from an optional CSV with `x`, `y` and `z` columns; otherwise a helix
//! is generated.

use nested_shaper::csv_utils::{read_csv_column, write_derivatives_csv};
use nested_shaper::EuclideanShaper;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .init();

    let dt = 0.002;
    let samples: Vec<[f64; 3]> = match std::env::args().nth(1) {
        Some(path) => {
            let x = read_csv_column(&path, "x")?;
            let y = read_csv_column(&path, "y")?;
            let z = read_csv_column(&path, "z")?;
            x.iter()
                .zip(&y)
                .zip(&z)
                .map(|((&x, &y), &z)| [x, y, z])
                .collect()
        }
        None => (0..2_000)
            .map(|i| {
                let t = i as f64 * dt;
                [t.cos(), t.sin(), 0.1 * t]
            })
            .collect(),
    };
    let Some(&seed) = samples.first() else {
        return Err("no samples".into());
    };

    let mut shaper = EuclideanShaper::<[f64; 3], 4>::new(seed, &[20, 10])?;
    let mut axes: [Vec<[f64; 4]>; 3] = Default::default();
    for &sample in &samples {
        let derivatives = shaper.convolute(sample, dt)?;
        for (axis, rows) in axes.iter_mut().enumerate() {
            rows.push(derivatives[axis]);
        }
    }

    for (axis, name) in ["x", "y", "z"].iter().enumerate() {
        let inputs: Vec<f64> = samples.iter().map(|s| s[axis]).collect();
        let path = format!("shaped_{name}.csv");
        write_derivatives_csv(&path, dt, &inputs, &axes[axis])?;
        if let Some(last) = axes[axis].last() {
            println!("{name}: value {:8.4} velocity {:8.4} acceleration {:8.4} -> {path}", last[0], last[1], last[2]);
        }
    }

    Ok(())
}
