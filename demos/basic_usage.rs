//! Example usage of the nested shaper crate

use nested_shaper::{shape, AngleShaper, EuclideanCumulativeShaper, EuclideanShaper, NestedFilter};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("=== Nested Shaper Examples ===\n");

    let dt = 0.01;

    // Stepped position: a coarse planner updating every 10 samples
    let stepped: Vec<f64> = (0..40).map(|i| (i / 10) as f64).collect();

    println!("Original stepped signal:");
    print_signal(&stepped);

    // Example 1: Convenience function
    println!("\n1. Shaped position (windows 10, 5):");
    let shaped = shape(&stepped, &[10, 5], dt)?;
    let position: Vec<f64> = shaped.iter().map(|d| d[0]).collect();
    print_signal(&position);

    println!("\n   Velocity:");
    let velocity: Vec<f64> = shaped.iter().map(|d| d[1]).collect();
    print_signal(&velocity);

    // Example 2: Higher derivatives with a three stage cascade
    println!("\n2. Jerk with windows (10, 5, 3):");
    let mut shaper = EuclideanShaper::<f64, 5>::new(0.0, &[10, 5, 3])?;
    let mut jerk = Vec::with_capacity(stepped.len());
    for &x in &stepped {
        jerk.push(shaper.convolute(x, dt)?[3]);
    }
    print_signal(&jerk);
    println!("   Latency: {} samples", shaper.latency());

    // Example 3: Drift free recomputed means
    println!("\n3. Cumulative means:");
    let mut cumulative = EuclideanCumulativeShaper::<f64, 3>::new(0.0, &[10, 5])?;
    let mut values = Vec::with_capacity(stepped.len());
    for &x in &stepped {
        values.push(cumulative.convolute(x, dt)?[0]);
    }
    print_signal(&values);

    // Example 4: Heading that wraps at ±π
    println!("\n4. Angle across the seam:");
    let mut heading = AngleShaper::<f64, 3>::new(3.0, &[4, 2])?;
    for i in 0..8 {
        let raw = nested_shaper::wrap_pi(3.0 + 0.1 * i as f64);
        let d = heading.convolute(raw, 0.1)?;
        println!("   raw {:7.3}  value {:7.3}  rate {:6.3}", raw, d[0], d[1]);
    }

    // Example 5: Gated nested filter
    println!("\n5. Nested filter (depth 4, windows 2 and 4):");
    let mut filter = NestedFilter::<f64>::build(4, &[3, 5], &[2, 4], Default::default(), Default::default())?;
    filter.fill(1.0);
    for x in [1.0, 2.0, 2.0, 4.0] {
        filter.update(x);
    }
    println!("   {:?}", filter.peek(0.1)?);

    Ok(())
}

fn print_signal(signal: &[f64]) {
    for (i, &value) in signal.iter().enumerate() {
        print!("{:8.3}", value);
        if i > 0 && (i + 1) % 10 == 0 {
            println!();
        }
    }
    if signal.len() % 10 != 0 {
        println!();
    }
}
