use sim_core::error::SimError;
use sim_core::options::{NoiseConfig, SweepType};
use sim_core::sweep::generate_frequencies;

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() <= 1e-9 * b.abs()
}

#[test]
fn decade_sweep_hits_every_decade() {
    let cfg = NoiseConfig {
        fstart: 10.0,
        fstop: 1000.0,
        points: 1,
        sweep: SweepType::Dec,
        steps_summary: 0,
    };
    let f = generate_frequencies(&cfg).unwrap();
    assert_eq!(f.len(), 3);
    assert!(close(f[0], 10.0));
    assert!(close(f[1], 100.0));
    assert!(close(f[2], 1000.0));
}

#[test]
fn octave_sweep_doubles() {
    let cfg = NoiseConfig {
        fstart: 1.0,
        fstop: 4.0,
        points: 1,
        sweep: SweepType::Oct,
        steps_summary: 0,
    };
    let f = generate_frequencies(&cfg).unwrap();
    assert_eq!(f.len(), 3);
    assert!(close(f[1], 2.0));
    assert!(close(f[2], 4.0));
}

#[test]
fn linear_sweep_total_points() {
    let cfg = NoiseConfig {
        fstart: 1.0,
        fstop: 5.0,
        points: 5,
        sweep: SweepType::Lin,
        steps_summary: 0,
    };
    let f = generate_frequencies(&cfg).unwrap();
    assert_eq!(f, vec![1.0, 2.0, 3.0, 4.0, 5.0]);
}

#[test]
fn default_sweep_is_strictly_increasing() {
    let f = generate_frequencies(&NoiseConfig::default()).unwrap();
    assert!(f.len() >= 61);
    assert!(close(f[0], 1.0));
    assert!(close(f[f.len() - 1], 1e6));
    assert!(f.windows(2).all(|w| w[1] > w[0]));
}

#[test]
fn single_frequency_sweep() {
    let cfg = NoiseConfig {
        fstart: 1e3,
        fstop: 1e3,
        ..NoiseConfig::default()
    };
    assert_eq!(generate_frequencies(&cfg).unwrap(), vec![1e3]);
}

#[test]
fn invalid_sweeps_are_rejected() {
    let bad = [
        NoiseConfig {
            fstart: -1.0,
            ..NoiseConfig::default()
        },
        NoiseConfig {
            fstart: 1e3,
            fstop: 1.0,
            ..NoiseConfig::default()
        },
        NoiseConfig {
            points: 0,
            ..NoiseConfig::default()
        },
        NoiseConfig {
            fstop: f64::NAN,
            ..NoiseConfig::default()
        },
    ];
    for cfg in &bad {
        assert!(matches!(
            generate_frequencies(cfg),
            Err(SimError::InvalidSweep(_))
        ));
    }
}

#[test]
fn unbounded_log_span_is_rejected() {
    for sweep in [SweepType::Dec, SweepType::Oct] {
        let cfg = NoiseConfig {
            fstart: 1e-320,
            fstop: 1e10,
            points: 10,
            sweep,
            steps_summary: 0,
        };
        assert!(matches!(
            generate_frequencies(&cfg),
            Err(SimError::InvalidSweep(_))
        ));
    }
}

#[test]
fn oversized_point_count_is_rejected() {
    let cfg = NoiseConfig {
        fstart: 1.0,
        fstop: 10.0,
        points: usize::MAX,
        sweep: SweepType::Dec,
        steps_summary: 0,
    };
    assert!(matches!(
        generate_frequencies(&cfg),
        Err(SimError::InvalidSweep(_))
    ));
}
