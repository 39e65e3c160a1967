// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::env;
use std::time::{Duration, Instant};

use anyhow::{bail, Context};
use cronicl::config::{load_and_validate_config, RuntimeBuilder};
use cronicl::message::Signal;
use serde_json::Value;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

const IDLE_TIMEOUT: Duration = Duration::from_secs(30);

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args: Vec<String> = env::args().collect();
    if args.len() < 3 {
        eprintln!("Usage: {} <pipeline.yaml> <value> [value ...]", args[0]);
        eprintln!("Example: {} configs/double.yaml 21", args[0]);
        eprintln!("Example: {} configs/collect.yaml '\"hello\"' '[1, 2, 3]'", args[0]);
        std::process::exit(1);
    }

    let config_file = &args[1];
    let values: Vec<Value> = args[2..].iter().map(|arg| parse_value(arg)).collect();

    println!("🚀 cronicl pipeline run");
    println!("═══════════════════════");
    println!("Pipeline: {}", config_file);
    println!("Inputs: {:?}", values);
    println!();

    run_pipeline(config_file, values)
}

/// JSON when it parses, a plain string otherwise.
fn parse_value(arg: &str) -> Value {
    serde_json::from_str(arg).unwrap_or_else(|_| Value::String(arg.to_string()))
}

fn run_pipeline(config_file: &str, values: Vec<Value>) -> anyhow::Result<()> {
    let config = load_and_validate_config(config_file)
        .with_context(|| format!("failed to load {}", config_file))?;
    let (mut pipeline, init) = RuntimeBuilder::build_pipeline(&config)?;

    println!(
        "📋 {} nodes, entry nodes: {:?}",
        pipeline.graph().len(),
        pipeline.entry_nodes().0
    );

    pipeline.init(&init)?;
    let started = Instant::now();

    let mut submitted = 0;
    for value in values {
        submitted += pipeline.execute(value)?;
    }
    let idle = pipeline.wait_until_idle(IDLE_TIMEOUT);

    // flush anything collectors are holding
    let node_ids: Vec<String> = pipeline.graph().nodes().iter().map(|n| n.id.clone()).collect();
    for node_id in &node_ids {
        pipeline.signal(node_id, Signal::Emit)?;
    }
    let idle = idle && pipeline.wait_until_idle(IDLE_TIMEOUT);

    println!("⏱️  {} message(s) processed in {:?}", submitted, started.elapsed());
    println!();
    println!("📡 Sensors:");
    for reading in pipeline.read_sensors() {
        println!("   {} = {}", reading.operation_name, reading.value);
    }
    println!();
    println!("📊 Stats:");
    println!("   {}", serde_json::to_string_pretty(&pipeline.stats())?);

    pipeline.close();
    pipeline.shutdown();

    if !idle {
        bail!("pipeline did not go idle within {:?}", IDLE_TIMEOUT);
    }
    Ok(())
}
