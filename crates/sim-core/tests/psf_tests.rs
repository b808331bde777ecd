use sim_core::result_store::{NoisePlot, NoiseRun, NoiseSummary, ResultStore, RunId};
use sim_devices::noise::NoiseSink;

fn plot(name: &str, channels: &[&str], rows: &[(f64, &[f64])]) -> NoisePlot {
    let mut plot = NoisePlot::new(name);
    for c in channels {
        plot.allocate_channel(c).unwrap();
    }
    for (freq, values) in rows {
        plot.begin_row(*freq);
        for v in values.iter() {
            plot.append_output(*v);
        }
        plot.end_row();
    }
    plot
}

#[test]
fn psf_text_writer_outputs_noise_plots() {
    let mut store = ResultStore::new();
    let run = NoiseRun {
        id: RunId(0),
        spectrum: plot(
            "noise_spectrum",
            &["onoise_spectrum", "inoise_spectrum"],
            &[(10.0, &[4.0e-18, 1.0e-18]), (100.0, &[2.0e-18, 5.0e-19])],
        ),
        integrated: plot("integrated_noise", &["onoise_total", "inoise_total"], &[(100.0, &[3.0e-16, 7.5e-17])]),
        summary: NoiseSummary {
            frequencies: vec![10.0, 100.0],
            out_noise: 3.0e-16,
            in_noise: 7.5e-17,
        },
    };
    let run_id = store.add_run(run);

    let mut path = std::env::temp_dir();
    path.push("sim_core_noise_psf_test.txt");
    store.write_psf_text(run_id, &path).unwrap();

    let content = std::fs::read_to_string(&path).unwrap();
    assert!(content.starts_with("PSF_TEXT\n"));
    assert!(content.contains("analysis=Noise"));
    assert!(content.contains("points=2"));
    assert!(content.contains("plot=noise_spectrum"));
    assert!(content.contains("- inoise_spectrum"));
    assert!(content.contains("freq 1e2"));
    assert!(content.contains("onoise_total 3e-16"));
}

#[test]
fn psf_for_missing_run_fails() {
    let store = ResultStore::new();
    let path = std::env::temp_dir().join("sim_core_missing_run.txt");
    assert!(store.write_psf_text(RunId(4), &path).is_err());
}
