use criterion::{criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion};
use rc_interconnect::circuits::elmore::elmore;
use rc_interconnect::circuits::graph::{CircuitGraph, CircuitTopology, NodeId};
use rc_interconnect::circuits::reduction::regularize;
use rc_interconnect::circuits::{Component, MnaBuilder};
use rc_interconnect::constants::FEMTO;

fn build_ladder(segments: usize) -> (CircuitGraph, NodeId) {
    let mut graph = CircuitGraph::new();
    let gnd = graph.ground();
    let root = graph.add_node("drv");
    let mut prev = root;
    for i in 0..segments {
        let n = graph.add_node(format!("n{i}"));
        graph.add_branch(prev, n, Component::resistor(10.0));
        graph.add_branch(n, gnd, Component::capacitor(1.0 * FEMTO));
        prev = n;
    }
    (graph, root)
}

/// Two driver, pi, pi, load nets with 100fF between their midpoints.
/// Returns the graph, the two drivers and the two receivers.
fn build_coupled() -> (CircuitGraph, [NodeId; 2], [NodeId; 2]) {
    let mut graph = CircuitGraph::new();
    let gnd = graph.ground();
    let pi_c = Component::capacitor(50.0 * FEMTO);
    let mut net = |prefix: &str| {
        let drv = graph.add_node(format!("{prefix}drv"));
        let a = graph.add_node(format!("{prefix}a"));
        let mid = graph.add_node(format!("{prefix}mid"));
        let rcv = graph.add_node(format!("{prefix}rcv"));
        graph.add_branch(drv, a, Component::resistor(100.0));
        graph.add_branch(a, mid, Component::resistor(1_000.0));
        graph.add_branch(mid, rcv, Component::resistor(1_000.0));
        for n in [a, mid, mid, rcv] {
            graph.add_branch(n, gnd, pi_c);
        }
        graph.add_branch(rcv, gnd, Component::capacitor(20.0 * FEMTO));
        (drv, mid, rcv)
    };
    let (agg, agg_mid, agg_rcv) = net("agg_");
    let (vic, vic_mid, vic_rcv) = net("vic_");
    graph.add_branch(agg_mid, vic_mid, Component::capacitor(100.0 * FEMTO));
    (graph, [agg, vic], [agg_rcv, vic_rcv])
}

fn bench_elmore(c: &mut Criterion) {
    let mut group = c.benchmark_group("elmore_ladder");
    for segments in [100, 1_000, 10_000] {
        let (graph, root) = build_ladder(segments);
        group.bench_with_input(BenchmarkId::from_parameter(segments), &graph, |b, g| {
            b.iter(|| elmore(g, root));
        });
    }
    group.finish();
}

fn bench_regularize(c: &mut Criterion) {
    let mut group = c.benchmark_group("regularize");
    for segments in [10, 50] {
        let (graph, root) = build_ladder(segments);
        let far = graph.nodes().last().unwrap_or_else(|| graph.ground());
        let system = MnaBuilder::from_graph(&graph, &[root], &[far]);
        group.bench_function(BenchmarkId::new("ladder", system.state_count()), |b| {
            b.iter_batched(
                || system.clone(),
                |sys| {
                    let _ = regularize(&sys);
                },
                BatchSize::SmallInput,
            )
        });
    }
    let (graph, drivers, receivers) = build_coupled();
    let system = MnaBuilder::from_graph(&graph, &drivers, &receivers);
    group.bench_function("coupled_nets", |b| {
        b.iter_batched(
            || system.clone(),
            |sys| {
                let _ = regularize(&sys);
            },
            BatchSize::SmallInput,
        )
    });
    group.finish();
}

criterion_group!(benches, bench_elmore, bench_regularize);
criterion_main!(benches);
