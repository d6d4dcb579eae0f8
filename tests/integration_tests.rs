//! Integration tests for the proposal engine

use std::fs::File;
use std::path::{Path, PathBuf};

use ndarray::{Array2, ArrayD};
use ndarray_npy::NpzWriter;
use temporal_proposals::{
    generate_proposals, load_weights, ModelConfig, ProposalConfig, ProposalNetwork,
};

/// Write a feature store with one `(n_snippets, feature_dim)` array per video
fn write_feature_store(path: &Path, videos: &[(&str, usize, usize)]) {
    let mut writer = NpzWriter::new(File::create(path).unwrap());
    for &(video, n_snippets, feature_dim) in videos {
        let features = Array2::from_shape_fn((n_snippets, feature_dim), |(j, d)| {
            (j * feature_dim + d) as f32 * 0.001
        });
        writer.add_array(video, &features).unwrap();
    }
    writer.finish().unwrap();
}

/// Write a weight archive holding all-zero parameters for `network`, with
/// selected positional entries overridden
fn write_weights(path: &Path, network: &ProposalNetwork, overrides: &[(usize, ArrayD<f32>)]) {
    let mut arrays: Vec<ArrayD<f32>> = network
        .parameter_shapes()
        .into_iter()
        .map(ArrayD::zeros)
        .collect();
    for (index, array) in overrides {
        arrays[*index] = array.clone();
    }
    let mut writer = NpzWriter::new(File::create(path).unwrap());
    for (i, array) in arrays.iter().enumerate() {
        writer.add_array(format!("arr_{}", i), array).unwrap();
    }
    writer.finish().unwrap();
}

/// A small geometry shared by most tests: dim-2 snippets pooled with the
/// default mean strategy, windows of 256 frames at stride 128
fn small_config() -> ProposalConfig {
    ProposalConfig::default()
}

fn build_mlp(spec: &str, input_size: usize) -> ProposalNetwork {
    let config: ModelConfig = spec.parse().unwrap();
    ProposalNetwork::build(&config, input_size).unwrap()
}

struct Fixture {
    _dir: tempfile::TempDir,
    features: PathBuf,
    weights: PathBuf,
}

/// Snippet count covering a video of `length` frames with the default
/// 16/8 snippet geometry
fn snippets_for(length: usize) -> usize {
    (length - 16) / 8 + 1
}

fn fixture(video_length: usize, network: &ProposalNetwork, overrides: &[(usize, ArrayD<f32>)]) -> Fixture {
    let dir = tempfile::tempdir().unwrap();
    let features = dir.path().join("features.npz");
    let weights = dir.path().join("weights.npz");
    write_feature_store(&features, &[("v1", snippets_for(video_length), 2)]);
    write_weights(&weights, network, overrides);
    Fixture {
        _dir: dir,
        features,
        weights,
    }
}

#[test]
fn test_end_to_end_zero_weights() {
    let mut network = build_mlp("mlp:2,1,4,0.0,0.0", 2);
    let fx = fixture(512, &network, &[]);
    load_weights(&fx.weights, &mut network).unwrap();

    let result = generate_proposals("v1", 512, &network, &small_config(), fx.features.to_str().unwrap())
        .unwrap();

    // 3 windows (floor((512-256)/128)+1), 2 proposals each.
    assert_eq!(result.metadata.num_windows, 3);
    assert_eq!(result.segments.len(), 6);
    assert_eq!(result.scores.len(), 6);

    // Zero weights: every regression is 0, so each proposal degenerates to
    // its window's start; every confidence is sigmoid(0) = 0.5.
    for (i, segment) in result.segments.iter().enumerate() {
        let window_start = [0, 128, 256][i / 2];
        assert_eq!(segment.start, window_start);
        assert_eq!(segment.end, window_start);
    }
    assert!(result.scores.iter().all(|&s| s == 0.5));
}

#[test]
fn test_short_video_yields_no_proposals() {
    let network = build_mlp("mlp:2,1,4,0.0,0.0", 2);
    let fx = fixture(512, &network, &[]);

    for length in [100, 255, 256] {
        let result = generate_proposals("v1", length, &network, &small_config(), fx.features.to_str().unwrap())
            .unwrap();
        assert!(result.is_empty(), "length {} should yield no proposals", length);
        assert!(result.scores.is_empty());
        assert_eq!(result.metadata.num_windows, 0);
    }
}

#[test]
fn test_out_of_range_regressions_are_clipped() {
    // Force the localization head far outside [0, 1]: the first coordinate
    // saturates high, the second saturates low.
    let mut network = build_mlp("mlp:1,1,1,0.0,0.0", 2);
    let overrides = vec![
        // Trunk W ones, so the embedding is positive for positive features.
        (0, ArrayD::from_elem(vec![2, 1], 1.0)),
        // Trunk bias keeps the embedding strictly positive even at snippet 0.
        (1, ArrayD::from_elem(vec![1], 1.0)),
        (2, {
            let mut w = ArrayD::zeros(vec![1, 2]);
            w[[0, 0]] = 1000.0;
            w[[0, 1]] = -1000.0;
            w
        }),
    ];
    let fx = fixture(512, &network, &overrides);
    load_weights(&fx.weights, &mut network).unwrap();

    let result = generate_proposals("v1", 512, &network, &small_config(), fx.features.to_str().unwrap())
        .unwrap();

    for (i, segment) in result.segments.iter().enumerate() {
        let window_start = [0i64, 128, 256][i];
        // start offset clipped to 1.0 -> window start + 256; length clipped
        // to 0.0 -> degenerate end at the start.
        assert_eq!(segment.start, window_start + 256);
        assert_eq!(segment.end, window_start + 256);
    }
}

#[test]
fn test_score_and_segment_alignment() {
    // Distinct per-proposal biases make the window-major, proposal-minor
    // flattening observable: with a zero trunk the regressions and scores
    // depend only on the proposal index, repeating identically per window.
    let mut network = build_mlp("mlp:2,1,1,0.0,0.0", 2);
    let overrides = vec![
        (3, {
            let mut b = ArrayD::zeros(vec![4]);
            b[[0]] = 0.1;
            b[[1]] = 0.2;
            b[[2]] = 0.3;
            b[[3]] = 0.4;
            b
        }),
        (5, {
            let mut b = ArrayD::zeros(vec![2]);
            b[[0]] = 0.4;
            b[[1]] = 0.9;
            b
        }),
    ];
    let fx = fixture(512, &network, &overrides);
    load_weights(&fx.weights, &mut network).unwrap();

    let result = generate_proposals("v1", 512, &network, &small_config(), fx.features.to_str().unwrap())
        .unwrap();
    assert_eq!(result.segments.len(), 6);

    let sigmoid = |x: f32| 1.0 / (1.0 + (-x).exp());
    for window in 0..3 {
        let window_start = (window * 128) as i64;
        // Proposal 0 of this window: offsets (0.1, 0.2) * 256.
        let p0 = result.segments[window * 2];
        assert_eq!(p0.start, window_start + 25);
        assert_eq!(p0.end, window_start + 76);
        // Proposal 1: offsets (0.3, 0.4) * 256.
        let p1 = result.segments[window * 2 + 1];
        assert_eq!(p1.start, window_start + 76);
        assert_eq!(p1.end, window_start + 179);

        assert!((result.scores[window * 2] - sigmoid(0.4)).abs() < 1e-6);
        assert!((result.scores[window * 2 + 1] - sigmoid(0.9)).abs() < 1e-6);
    }
}

#[test]
fn test_lstm_end_to_end() {
    let config: ModelConfig = "lstm:2,2,3,1".parse().unwrap();
    // Mean pooling of dim-2 snippets gives flat descriptors of width 2,
    // consumed as 2 timesteps of width 1.
    let mut network = ProposalNetwork::build(&config, 2).unwrap();
    let fx = fixture(640, &network, &[]);
    load_weights(&fx.weights, &mut network).unwrap();

    let result = generate_proposals("v1", 640, &network, &small_config(), fx.features.to_str().unwrap())
        .unwrap();

    assert_eq!(result.metadata.num_windows, 4);
    assert_eq!(result.segments.len(), 8);
    // Zero LSTM weights keep the hidden state at zero.
    assert!(result.scores.iter().all(|&s| s == 0.5));
    assert_eq!(result.metadata.model, "lstm:2,2,3,1");
}

#[test]
fn test_metadata_reflects_run() {
    let network = build_mlp("mlp:2,1,4,0.0,0.0", 2);
    let fx = fixture(512, &network, &[]);

    let result = generate_proposals("v1", 512, &network, &small_config(), fx.features.to_str().unwrap())
        .unwrap();
    assert_eq!(result.video, "v1");
    assert_eq!(result.metadata.window_size, 256);
    assert_eq!(result.metadata.stride, 128);
    assert_eq!(result.metadata.model, "mlp:2,1,4,0,0");
    assert_eq!(result.metadata.pooling, "mean");
    assert!(result.metadata.processing_time_ms >= 0.0);
}

#[test]
fn test_unknown_video_fails() {
    let network = build_mlp("mlp:2,1,4,0.0,0.0", 2);
    let fx = fixture(512, &network, &[]);

    let result = generate_proposals("nope", 512, &network, &small_config(), fx.features.to_str().unwrap());
    assert!(result.is_err());
}

#[test]
fn test_pooling_mismatch_fails() {
    // A pyramid strategy widens the descriptors, which no longer match the
    // network's input size.
    let network = build_mlp("mlp:2,1,4,0.0,0.0", 2);
    let fx = fixture(512, &network, &[]);

    let config = ProposalConfig {
        pooling: "pyr-2-mean".parse().unwrap(),
        ..ProposalConfig::default()
    };
    let result = generate_proposals("v1", 512, &network, &config, fx.features.to_str().unwrap());
    assert!(result.is_err());
}
