// src/output.rs
use crate::mc::simulator::PriceMatrix;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

/// Write the first `max_paths` trajectories as `step,time,path_0,path_1,...`
pub fn write_paths_to_csv<P: AsRef<Path>>(
    filename: P,
    paths: &PriceMatrix,
    max_paths: usize,
) -> io::Result<()> {
    let mut file = BufWriter::new(File::create(filename)?);
    let shown = max_paths.min(paths.paths());

    write!(file, "step,time")?;
    for i in 0..shown {
        write!(file, ",path_{}", i)?;
    }
    writeln!(file)?;

    let times = paths.times();
    for (t, row) in paths.view().outer_iter().enumerate() {
        write!(file, "{},{}", t, times[t])?;
        for s in row.iter().take(shown) {
            write!(file, ",{}", s)?;
        }
        writeln!(file)?;
    }
    file.flush()
}

pub fn write_summary_to_csv<P: AsRef<Path>>(filename: P, summary_data: &[(&str, String)]) -> io::Result<()> {
    let mut file = File::create(filename)?;
    for (key, value) in summary_data {
        writeln!(file, "{},{}", key, value)?;
    }
    Ok(())
}
