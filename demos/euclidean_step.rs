//! Step response of a zero seeded shaper, printed as a table

use nested_shaper::EuclideanShaper;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "debug".into()),
        )
        .init();

    let dt = 0.001;
    let amplitude = 1.0;
    let windows = [100, 50, 25];
    let mut shaper = EuclideanShaper::<f64, 5>::new(0.0, &windows)?;

    let settle = windows.iter().sum::<usize>() + 5;
    println!("step of {amplitude}, settles after {settle} samples, latency {} samples", shaper.latency());
    println!("{:>6} {:>10} {:>10} {:>12} {:>14} {:>16}", "i", "p", "v", "a", "j", "s");

    for i in 0..settle + 20 {
        let [p, v, a, j, s] = shaper.convolute(amplitude, dt)?;
        if i % 10 == 0 || i + 1 == settle + 20 {
            println!("{:>6} {:>10.5} {:>10.4} {:>12.3} {:>14.1} {:>16.1}", i, p, v, a, j, s);
        }
    }

    Ok(())
}
