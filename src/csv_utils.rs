use std::fs::File;
use std::io;
use std::path::Path;

use tracing::debug;

/// Reads a column of f64 values from a CSV file by column name, skipping invalid/missing values.
///
/// Fails when the header has no column named `column`.
pub fn read_csv_column<P: AsRef<Path>>(path: P, column: &str) -> csv::Result<Vec<f64>> {
    let file = File::open(path)?;
    let mut rdr = csv::Reader::from_reader(file);

    let headers = rdr.headers()?.clone();
    let col_index = headers.iter().position(|h| h == column).ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("no column named {column:?}"),
        )
    })?;
    collect_column(&mut rdr, col_index)
}

/// Reads a column of f64 values from a CSV file by column index, skipping invalid/missing values.
pub fn read_csv_column_by_index<P: AsRef<Path>>(path: P, col_index: usize) -> csv::Result<Vec<f64>> {
    let file = File::open(path)?;
    let mut rdr = csv::Reader::from_reader(file);
    collect_column(&mut rdr, col_index)
}

fn collect_column<R: io::Read>(rdr: &mut csv::Reader<R>, col_index: usize) -> csv::Result<Vec<f64>> {
    let mut values = Vec::new();
    for result in rdr.records() {
        let record = result?;
        if let Some(field) = record.get(col_index) {
            if let Ok(val) = field.trim().parse::<f64>() {
                values.push(val);
            }
        }
    }
    Ok(values)
}

/// Writes a table of `t, input, value, d1, d2, ..` rows.
///
/// # Arguments
///
/// * `path` - Destination file, truncated if it exists
/// * `dt` - Sample interval, row `i` gets `t = i * dt`
/// * `inputs` - Raw samples
/// * `outputs` - Value and derivatives per sample, all of the same length
pub fn write_derivatives_csv<P: AsRef<Path>, R: AsRef<[f64]>>(
    path: P,
    dt: f64,
    inputs: &[f64],
    outputs: &[R],
) -> csv::Result<()> {
    let path = path.as_ref();
    let mut wtr = csv::Writer::from_path(path)?;
    write_derivatives(&mut wtr, dt, inputs, outputs)?;
    wtr.flush()?;
    debug!(path = %path.display(), rows = inputs.len().min(outputs.len()), "wrote derivative table");
    Ok(())
}

/// Same as [`write_derivatives_csv`] for any CSV writer.
pub fn write_derivatives<W: io::Write, R: AsRef<[f64]>>(
    wtr: &mut csv::Writer<W>,
    dt: f64,
    inputs: &[f64],
    outputs: &[R],
) -> csv::Result<()> {
    let order = outputs.first().map_or(0, |row| row.as_ref().len());
    let mut header = vec!["t".to_string(), "input".to_string(), "value".to_string()];
    header.extend((1..order).map(|k| format!("d{k}")));
    wtr.write_record(&header)?;

    for (i, (input, row)) in inputs.iter().zip(outputs).enumerate() {
        let mut record = Vec::with_capacity(order + 2);
        record.push((i as f64 * dt).to_string());
        record.push(input.to_string());
        record.extend(row.as_ref().iter().map(f64::to_string));
        wtr.write_record(&record)?;
    }
    Ok(())
}
