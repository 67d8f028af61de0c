use std::fs::File;
use std::io::BufWriter;

use clap::{Parser, ValueEnum};
use rc_interconnect::prelude::*;

/// Elmore delay, moments and step response of two capacitively coupled nets
#[derive(Parser)]
#[command(name = "coupled_nets", version)]
struct Cli {
    /// Simulated time, with an optional SI suffix (e.g. 5n)
    #[arg(long, default_value = "5n", value_parser = parse_seconds)]
    duration: f64,

    /// Fixed time step, with an optional SI suffix (e.g. 1p)
    #[arg(long, default_value = "1p", value_parser = parse_seconds)]
    step: f64,

    /// Integration scheme
    #[arg(long, value_enum, default_value_t = Scheme::Rk4)]
    integrator: Scheme,

    /// Print every Nth sample of the step response
    #[arg(long, default_value_t = 250)]
    every: usize,

    /// Also write the full waveform to this CSV file
    #[arg(long)]
    csv: Option<String>,
}

#[derive(Clone, Copy, ValueEnum)]
enum Scheme {
    Euler,
    Rk4,
}

impl From<Scheme> for TimeIntegrator {
    fn from(s: Scheme) -> Self {
        match s {
            Scheme::Euler => Self::ForwardEuler,
            Scheme::Rk4 => Self::Rk4,
        }
    }
}

fn parse_seconds(text: &str) -> Result<f64, String> {
    parse_si(text).ok_or_else(|| format!("not a number: {text}"))
}

/// Driver, two pi segments and a receiver load; returns (driver, midpoint, receiver).
fn add_net(graph: &mut CircuitGraph, driver: &str, names: [&str; 3]) -> (NodeId, NodeId, NodeId) {
    let gnd = graph.ground();
    let half_pi = Component::capacitor(50.0 * FEMTO);
    let drv = graph.add_node(driver);
    let a = graph.add_node(names[0]);
    graph.add_branch(drv, a, Component::resistor(0.1 * KILO));
    let mid = graph.add_node(names[1]);
    graph.add_branch(a, mid, Component::resistor(1.0 * KILO));
    graph.add_branch(a, gnd, half_pi);
    graph.add_branch(mid, gnd, half_pi);
    let rcv = graph.add_node(names[2]);
    graph.add_branch(mid, rcv, Component::resistor(1.0 * KILO));
    graph.add_branch(mid, gnd, half_pi);
    graph.add_branch(rcv, gnd, half_pi);
    graph.add_branch(rcv, gnd, Component::capacitor(20.0 * FEMTO));
    (drv, mid, rcv)
}

fn print_moments(label: &str, moments: &[Matrix]) {
    for (k, m) in moments.iter().enumerate() {
        println!("{label} moment {k} ={m}");
    }
}

fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let mut graph = CircuitGraph::new();
    let (vagg, agg_mid, agg_rcv) = add_net(&mut graph, "vagg", ["n1", "n2", "n3"]);
    let (vvic, vic_mid, vic_rcv) = add_net(&mut graph, "vvic", ["n5", "n6", "n7"]);
    graph.add_branch(agg_mid, vic_mid, Component::capacitor(100.0 * FEMTO));

    let floating = floating_nodes(&graph, &[vagg, vvic]);
    if !floating.is_empty() {
        eprintln!("floating nodes: {floating:?}");
        std::process::exit(1);
    }
    for l in resistor_loops(&graph) {
        eprintln!("warning: resistor loop {}", l.describe(&graph));
    }

    let report = elmore(&graph, vagg);
    println!("node, downstream C, Elmore delay");
    for (node, delay) in report.delays.iter() {
        let down = report.downstream.get(node).unwrap_or_default();
        println!("{}, {down}, {delay}", graph.node_name(node));
    }

    let system = MnaBuilder::from_graph(&graph, &[vagg, vvic], &[agg_rcv, vic_rcv]);
    let full = system.moments(2).unwrap_or_else(|e| {
        eprintln!("moment error: {e}");
        std::process::exit(1);
    });
    print_moments("unreduced", &full);

    let reduced = regularize(&system).unwrap_or_else(|e| {
        eprintln!("regularization error: {e}");
        std::process::exit(1);
    });
    println!(
        "eliminated states {:?}; {} remain",
        reduced.algebraic_states(),
        reduced.dynamic_count
    );
    let short = reduced.system.moments(2).unwrap_or_else(|e| {
        eprintln!("moment error: {e}");
        std::process::exit(1);
    });
    print_moments("reduced", &short);

    let model = StateSpaceModel::from_regularization(&reduced).unwrap_or_else(|e| {
        eprintln!("state-space error: {e}");
        std::process::exit(1);
    });
    let mut engine = StateSpaceEngine::new(model);
    engine.set_step_input(Vector::from_vec(vec![1.0, 0.0]));
    let config = SimulationConfig::transient("coupled_nets", cli.duration, cli.step)
        .with_integrator(cli.integrator.into());
    engine.run(&config).unwrap_or_else(|e| {
        eprintln!("simulation error: {e}");
        std::process::exit(1);
    });
    let wave = engine.waveform();

    println!("time(s), aggressor(V), victim(V)");
    for (t, y) in wave.times.iter().zip(&wave.outputs).step_by(cli.every.max(1)) {
        println!("{t:.6e}, {:.6e}, {:.6e}", y[0], y[1]);
    }
    if let Some(t50) = wave.first_crossing(0, 0.5) {
        let elmore_delay = report.delays.get(agg_rcv).unwrap_or_default();
        println!("aggressor 50% crossing {}, Elmore estimate {elmore_delay}", Delay::new(t50));
    }

    if let Some(path) = cli.csv {
        let written = File::create(&path)
            .map(BufWriter::new)
            .and_then(|w| write_transient_csv(w, wave, &["aggressor", "victim"]));
        if let Err(e) = written {
            eprintln!("Output error: {e}");
            std::process::exit(1);
        }
    }
}
