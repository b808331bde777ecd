use crate::result_store::{NoisePlot, NoiseRun};
use std::fs;
use std::path::Path;

fn push_plot(out: &mut String, plot: &NoisePlot) {
    out.push_str(&format!("plot={}\n", plot.name));
    out.push_str("signals:\n");
    for name in &plot.channels {
        out.push_str(&format!("- {}\n", name));
    }
    out.push_str("values:\n");
    for row in &plot.rows {
        out.push_str(&format!("freq {:e}\n", row.freq));
        for (idx, value) in row.values.iter().enumerate() {
            let name = plot
                .channels
                .get(idx)
                .cloned()
                .unwrap_or_else(|| format!("c{}", idx));
            out.push_str(&format!("{} {:e}\n", name, value));
        }
    }
}

pub fn write_noise_psf(run: &NoiseRun, path: &Path) -> std::io::Result<()> {
    let mut out = String::new();
    out.push_str("PSF_TEXT\n");
    out.push_str("analysis=Noise\n");
    out.push_str(&format!("points={}\n", run.summary.frequencies.len()));
    push_plot(&mut out, &run.spectrum);
    push_plot(&mut out, &run.integrated);
    fs::write(path, out)
}
