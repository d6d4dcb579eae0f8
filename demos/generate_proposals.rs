//! Example: Generate proposals for a single video
//!
//! Usage:
//!   cargo run --release --example generate_proposals -- \
//!       [--model SPEC] [--input-size N] [--weights FILE] [--top N] \
//!       <features.npz> <video-id> <video-length>

use std::env;

use temporal_proposals::{
    generate_proposals, load_weights, ModelConfig, ProposalConfig, ProposalNetwork,
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logger
    env_logger::init();

    let mut args: Vec<String> = env::args().skip(1).collect();

    let mut model_spec = "mlp:16,2,1024,0.2,0.5".to_string();
    let mut input_size = 4096usize;
    let mut weights: Option<String> = None;
    let mut top = 10usize;
    let mut positional: Vec<String> = Vec::new();

    while let Some(a) = args.first().cloned() {
        args.remove(0);
        match a.as_str() {
            "--model" => {
                model_spec = args.first().ok_or("--model requires a value")?.clone();
                args.remove(0);
            }
            "--input-size" => {
                input_size = args
                    .first()
                    .ok_or("--input-size requires a value")?
                    .parse()?;
                args.remove(0);
            }
            "--weights" => {
                weights = Some(args.first().ok_or("--weights requires a value")?.clone());
                args.remove(0);
            }
            "--top" => {
                top = args.first().ok_or("--top requires a value")?.parse()?;
                args.remove(0);
            }
            "--help" | "-h" => {
                eprintln!(
                    "Usage: generate_proposals [--model SPEC] [--input-size N] \
                     [--weights FILE] [--top N] <features.npz> <video-id> <video-length>"
                );
                return Ok(());
            }
            _ => positional.push(a),
        }
    }

    if positional.len() != 3 {
        eprintln!("ERROR: Expected <features.npz> <video-id> <video-length>. Use --help for usage.");
        std::process::exit(2);
    }
    let features_path = &positional[0];
    let video = &positional[1];
    let video_length: usize = positional[2].parse()?;

    // Build the network
    let model: ModelConfig = model_spec.parse()?;
    let mut network = ProposalNetwork::build(&model, input_size)?;
    if let Some(path) = &weights {
        load_weights(path, &mut network)?;
    } else {
        eprintln!("WARNING: No --weights given, using randomly initialized parameters");
    }

    // Generate
    let config = ProposalConfig::default();
    let result = generate_proposals(video, video_length, &network, &config, features_path)?;

    // Print results
    println!("Proposals for '{}':", result.video);
    println!("  Windows scanned: {}", result.metadata.num_windows);
    println!("  Proposals: {}", result.len());
    println!("  Processing time: {:.2} ms", result.metadata.processing_time_ms);
    for (segment, score) in result.ranked().into_iter().take(top) {
        println!("  [{:>8}, {:>8})  score {:.4}", segment.start, segment.end, score);
    }

    Ok(())
}
