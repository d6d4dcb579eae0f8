//! Example: Generate proposals for many videos in parallel
//!
//! Usage:
//!   cargo run --release --example batch_videos -- \
//!       [--jobs N] [--json] [--model SPEC] [--input-size N] [--weights FILE] \
//!       <features.npz> <list-file>
//!
//! The list file holds one `<video-id> <video-length>` pair per line.
//!
//! Notes:
//! - Parallelism is across videos (batch-level). Each video is still
//!   processed single-threaded.
//! - Default workers: (available CPU threads - 1), keeping one core free.

use std::env;
use std::time::Instant;

use rayon::prelude::*;
use temporal_proposals::{
    generate_proposals, load_weights, ModelConfig, ProposalConfig, ProposalNetwork,
};

fn default_jobs() -> usize {
    let n = std::thread::available_parallelism().map(|v| v.get()).unwrap_or(1);
    std::cmp::max(1, n.saturating_sub(1))
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let mut args: Vec<String> = env::args().skip(1).collect();

    let mut json = false;
    let mut jobs: Option<usize> = None;
    let mut model_spec = "mlp:16,2,1024,0.2,0.5".to_string();
    let mut input_size = 4096usize;
    let mut weights: Option<String> = None;
    let mut positional: Vec<String> = Vec::new();

    while let Some(a) = args.first().cloned() {
        args.remove(0);
        match a.as_str() {
            "--json" => json = true,
            "--jobs" => {
                let v = args
                    .first()
                    .ok_or("--jobs requires a value")?
                    .parse::<usize>()?;
                args.remove(0);
                jobs = Some(std::cmp::max(1, v));
            }
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
            "--help" | "-h" => {
                eprintln!(
                    "Usage: batch_videos [--jobs N] [--json] [--model SPEC] \
                     [--input-size N] [--weights FILE] <features.npz> <list-file>\n\
                     \n\
                     --jobs N   Parallel workers (default: CPU-1)\n\
                     --json     Emit one JSON object per video (JSONL)\n"
                );
                return Ok(());
            }
            _ => positional.push(a),
        }
    }

    if positional.len() != 2 {
        eprintln!("ERROR: Expected <features.npz> <list-file>. Use --help for usage.");
        std::process::exit(2);
    }
    let features_path = positional[0].clone();
    let list_path = &positional[1];

    let videos: Vec<(String, usize)> = std::fs::read_to_string(list_path)?
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| {
            let mut fields = line.split_whitespace();
            let video = fields.next().ok_or("missing video id")?.to_string();
            let length: usize = fields.next().ok_or("missing video length")?.parse()?;
            Ok::<_, Box<dyn std::error::Error>>((video, length))
        })
        .collect::<Result<_, _>>()?;

    let model: ModelConfig = model_spec.parse()?;
    let mut network = ProposalNetwork::build(&model, input_size)?;
    if let Some(path) = &weights {
        load_weights(path, &mut network)?;
    } else {
        eprintln!("WARNING: No --weights given, using randomly initialized parameters");
    }
    let config = ProposalConfig::default();

    let jobs = jobs.unwrap_or_else(default_jobs);
    eprintln!("Batch: {} videos, jobs={}", videos.len(), jobs);

    let t0 = Instant::now();
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(jobs)
        .build()
        .expect("Failed to build rayon thread pool");

    let outputs: Vec<String> = pool.install(|| {
        videos
            .par_iter()
            .map(|(video, length)| {
                match generate_proposals(video, *length, &network, &config, &features_path) {
                    Ok(result) => {
                        if json {
                            serde_json::to_string(&result)
                                .unwrap_or_else(|e| format!("{{\"error\":\"{}\"}}", e))
                        } else {
                            format!(
                                "{}: {} proposals over {} windows in {:.2} ms",
                                result.video,
                                result.len(),
                                result.metadata.num_windows,
                                result.metadata.processing_time_ms
                            )
                        }
                    }
                    Err(e) => {
                        if json {
                            format!("{{\"video\":{:?},\"error\":{:?}}}", video, e.to_string())
                        } else {
                            format!("{}: FAILED ({})", video, e)
                        }
                    }
                }
            })
            .collect()
    });

    for line in &outputs {
        println!("{}", line);
    }
    eprintln!(
        "Done: {} videos in {:.2} s",
        videos.len(),
        t0.elapsed().as_secs_f32()
    );

    Ok(())
}
