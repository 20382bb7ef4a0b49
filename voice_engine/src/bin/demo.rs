// Voice separation demo — CLI entry point.
//
// Separates a small illustrative note sequence into voices and prints the
// result alongside a staged progress report.
//
// Usage:
//   cargo run -p voice_engine --bin demo -- [--seed N] [--voices N] [--chord-spread F]

use voice_engine::{separate_voices_monitored, SeparationConfig};

fn main() {
    let args: Vec<String> = std::env::args().collect();

    let seed: u32 = parse_flag(&args, "--seed").unwrap_or(0);
    let max_voices: usize = parse_flag(&args, "--voices").unwrap_or(6);
    let chord_spread: f64 = parse_flag(&args, "--chord-spread").unwrap_or(0.0);

    println!("=== Voice Separation Demo ===");
    println!("Seed: {seed}");
    println!("Max voices: {max_voices}");
    println!("Chord spread: {chord_spread}");
    println!();

    let config = SeparationConfig {
        max_voices,
        chord_spread,
        seed,
        ..Default::default()
    };

    println!("[1/3] Building example note sequence...");
    let onset = vec![0.0, 0.0, 0.0, 1.0, 2.0, 2.0];
    let offset = vec![1.0, 1.0, 1.0, 2.0, 3.0, 3.0];
    let position = vec![72, 67, 60, 67, 74, 62];
    println!("  {} notes.", onset.len());

    println!("[2/3] Separating...");
    let mut stage_counts = [0u32; 5];
    let mut monitor = |_start: usize, _stop: usize, _cost: &voice_engine::CostVector, stage: voice_engine::Stage| {
        stage_counts[stage as usize] += 1;
        Ok(())
    };
    match separate_voices_monitored(onset, offset, position, config, &mut monitor) {
        Ok(result) => {
            println!("  Evaluations per stage: {stage_counts:?}");
            println!("[3/3] Result:");
            for (v, notes) in result.voices.iter().enumerate() {
                if !notes.is_empty() {
                    println!("  voice {v}: {notes:?}");
                }
            }
        }
        Err(e) => {
            eprintln!("  Error: {e}");
            std::process::exit(1);
        }
    }
}

fn parse_flag<T: std::str::FromStr>(args: &[String], flag: &str) -> Option<T> {
    args.iter()
        .position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .and_then(|v| v.parse().ok())
}
