use std::{fs, process};

use clap::Parser;
use tracing_subscriber::EnvFilter;
use veriso_cli::{App, Backend, Command};
use veriso_core::audit::{AuditOptions, AuditOutcome, Auditor, Isolation};
use veriso_core::DfsOracle;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let app = App::parse();
    match &app.command {
        Command::Generate(args) => generate(args),
        Command::Audit(args) => audit(args),
    }
}

fn generate(args: &veriso_cli::GenerateArgs) {
    fs::create_dir_all(&args.output_dir).unwrap_or_else(|e| {
        eprintln!("Failed to create output directory: {e}");
        process::exit(1);
    });

    let histories = veriso_testgen::generator::generate_mult_histories(
        args.n_hist,
        args.n_session,
        args.n_key,
        args.n_txn,
        args.n_evt,
    );

    for history in &histories {
        let path = args.output_dir.join(format!("{}.json", history.get_id()));
        let file = fs::File::create(&path).unwrap_or_else(|e| {
            eprintln!("Failed to create {}: {e}", path.display());
            process::exit(1);
        });
        serde_json::to_writer_pretty(file, history).unwrap_or_else(|e| {
            eprintln!("Failed to write {}: {e}", path.display());
            process::exit(1);
        });
    }

    println!(
        "Generated {} histories to {}",
        histories.len(),
        args.output_dir.display()
    );
}

fn audit(args: &veriso_cli::AuditArgs) {
    let isolation = Isolation::from(args.isolation);
    let mut options = AuditOptions::new(isolation);
    if let Some(limit) = args.step_limit {
        options = options.with_step_limit(limit);
    }

    let mut entries: Vec<_> = fs::read_dir(&args.input_dir)
        .unwrap_or_else(|e| {
            eprintln!("Failed to read input directory: {e}");
            process::exit(1);
        })
        .filter_map(Result::ok)
        .filter(|e| e.path().extension().is_some_and(|ext| ext == "json"))
        .collect();

    entries.sort_by_key(fs::DirEntry::path);

    if entries.is_empty() {
        eprintln!("No .json files found in {}", args.input_dir.display());
        process::exit(1);
    }

    if matches!(args.backend, Backend::Matrix) {
        veriso_accel::initialize();
    }

    let mut any_failed = false;
    for entry in entries {
        let path = entry.path();
        let filename = path.file_name().unwrap_or_default().to_string_lossy();

        let file = fs::File::open(&path).unwrap_or_else(|e| {
            eprintln!("Failed to open {filename}: {e}");
            process::exit(1);
        });

        let history: veriso_testgen::generator::GeneratedHistory = serde_json::from_reader(file)
            .unwrap_or_else(|e| {
                eprintln!("Failed to parse {filename}: {e}");
                process::exit(1);
            });

        let outcome = Auditor::new(history.into_data(), options).and_then(|mut auditor| {
            let verdict = match args.backend {
                Backend::Direct => auditor.audit(&mut DfsOracle::default()),
                Backend::Matrix => auditor.audit(&mut veriso_accel::MatrixOracle::default()),
            }?;
            Ok((verdict, auditor.count()))
        });

        match outcome {
            Ok((AuditOutcome::Passed, counts)) => {
                if args.json {
                    let result = serde_json::json!({
                        "file": filename,
                        "ok": true,
                    });
                    println!("{}", serde_json::to_string(&result).unwrap());
                } else if args.verbose {
                    println!("{filename}: PASS");
                    println!("  edges: {counts:?}");
                } else {
                    println!("{filename}: PASS");
                }
            }
            Ok((AuditOutcome::Violation(witness), _)) => {
                any_failed = true;
                if args.json {
                    let result = serde_json::json!({
                        "file": filename,
                        "ok": false,
                        "witness": witness,
                    });
                    println!("{}", serde_json::to_string(&result).unwrap());
                } else if args.verbose {
                    println!("{filename}: FAIL");
                    println!("  cycle: {:?}", witness.cycle);
                    for edge in &witness.edges {
                        println!(
                            "  {:?} -> {:?} [{:?} {:?}]",
                            edge.from, edge.to, edge.edge_type, edge.keys
                        );
                    }
                } else {
                    println!("{filename}: FAIL (cycle of {})", witness.cycle.len());
                }
            }
            Err(e) => {
                any_failed = true;
                if args.json {
                    let result = serde_json::json!({
                        "file": filename,
                        "ok": false,
                        "error": e,
                    });
                    println!("{}", serde_json::to_string(&result).unwrap());
                } else {
                    println!("{filename}: ERROR ({e:?})");
                }
            }
        }
    }

    if matches!(args.backend, Backend::Matrix) {
        veriso_accel::teardown();
    }

    if any_failed {
        process::exit(1);
    }
}
