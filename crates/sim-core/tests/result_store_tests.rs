use sim_core::result_store::{NoisePlot, NoiseRun, NoiseSummary, ResultStore, RunId};
use sim_devices::noise::{ChannelId, NoiseSink};
use sim_devices::DeviceError;

fn empty_run() -> NoiseRun {
    NoiseRun {
        id: RunId(7),
        spectrum: NoisePlot::new("noise_spectrum"),
        integrated: NoisePlot::new("integrated_noise"),
        summary: NoiseSummary {
            frequencies: Vec::new(),
            out_noise: 0.0,
            in_noise: 0.0,
        },
    }
}

#[test]
fn result_store_adds_run() {
    let mut store = ResultStore::new();
    let first = store.add_run(empty_run());
    let second = store.add_run(empty_run());
    assert_eq!(first.0, 0);
    assert_eq!(second.0, 1);
    assert_eq!(store.runs.len(), 2);
    assert_eq!(store.get(second).unwrap().id, RunId(1));
    assert!(store.get(RunId(2)).is_err());
}

#[test]
fn plot_allocates_channels_in_order() {
    let mut plot = NoisePlot::new("p");
    assert_eq!(plot.allocate_channel("a").unwrap(), ChannelId(0));
    assert_eq!(plot.allocate_channel("b").unwrap(), ChannelId(1));
    assert_eq!(plot.channel_index("b"), Some(1));
    assert_eq!(plot.channel_index("c"), None);
}

#[test]
fn plot_channel_limit() {
    let mut plot = NoisePlot::new("p").with_channel_limit(1);
    plot.allocate_channel("a").unwrap();
    let err = plot.allocate_channel("b").unwrap_err();
    assert!(matches!(err, DeviceError::OutOfMemory { ref channel } if channel == "b"));
    assert_eq!(plot.channels, vec!["a"]);
}

#[test]
fn empty_rows_are_dropped() {
    let mut plot = NoisePlot::new("p");
    plot.allocate_channel("a").unwrap();
    plot.begin_row(1.0);
    plot.append_output(0.5);
    plot.end_row();
    plot.begin_row(2.0);
    plot.end_row();
    plot.begin_row(3.0);
    plot.append_output(1.5);
    plot.end_row();
    assert_eq!(plot.rows.len(), 2);
    assert_eq!(plot.rows[1].freq, 3.0);
    assert_eq!(plot.column("a"), Some(vec![0.5, 1.5]));
}
