//! Two coupled nets, each a driver followed by two pi segments and a
//! receiver load, joined by a 100fF coupling capacitor at their midpoints.

use approx::assert_relative_eq;
use rc_interconnect::prelude::*;

struct Fixture {
    graph: CircuitGraph,
    vagg: NodeId,
    n1: NodeId,
    n2: NodeId,
    n3: NodeId,
    vvic: NodeId,
    n7: NodeId,
}

fn net(graph: &mut CircuitGraph, prefix: &str, driver: &str) -> [NodeId; 4] {
    let gnd = graph.ground();
    let pi_c = Component::capacitor(50.0 * FEMTO);
    let drv = graph.add_node(driver);
    let a = graph.add_node(format!("{prefix}a"));
    graph.add_branch(drv, a, Component::resistor(0.1 * KILO));
    let mid = graph.add_node(format!("{prefix}mid"));
    graph.add_branch(a, mid, Component::resistor(1.0 * KILO));
    graph.add_branch(a, gnd, pi_c);
    graph.add_branch(mid, gnd, pi_c);
    let rcv = graph.add_node(format!("{prefix}rcv"));
    graph.add_branch(mid, rcv, Component::resistor(1.0 * KILO));
    graph.add_branch(mid, gnd, pi_c);
    graph.add_branch(rcv, gnd, pi_c);
    graph.add_branch(rcv, gnd, Component::capacitor(20.0 * FEMTO));
    [drv, a, mid, rcv]
}

fn coupled() -> Fixture {
    let mut graph = CircuitGraph::new();
    let [vagg, n1, n2, n3] = net(&mut graph, "agg_", "vagg");
    let [vvic, _n5, n6, n7] = net(&mut graph, "vic_", "vvic");
    graph.add_branch(n2, n6, Component::capacitor(100.0 * FEMTO));
    Fixture {
        graph,
        vagg,
        n1,
        n2,
        n3,
        vvic,
        n7,
    }
}

fn assembled(f: &Fixture) -> MnaSystem {
    MnaBuilder::from_graph(&f.graph, &[f.vagg, f.vvic], &[f.n3, f.n7])
}

#[test]
fn aggressor_elmore_delays() {
    let f = coupled();
    let report = elmore(&f.graph, f.vagg);

    let down = |n| report.downstream.get(n).unwrap().value();
    assert_relative_eq!(down(f.n3), 70.0 * FEMTO, max_relative = 1e-12);
    assert_relative_eq!(down(f.n2), 270.0 * FEMTO, max_relative = 1e-12);
    assert_relative_eq!(down(f.n1), 320.0 * FEMTO, max_relative = 1e-12);

    let delay = |n| report.delays.get(n).unwrap().value();
    assert_relative_eq!(delay(f.vagg), 0.0);
    assert_relative_eq!(delay(f.n1), 32.0 * PICO, max_relative = 1e-9);
    assert_relative_eq!(delay(f.n2), 302.0 * PICO, max_relative = 1e-9);
    assert_relative_eq!(delay(f.n3), 372.0 * PICO, max_relative = 1e-9);

    assert!(report.delays.get(f.n7).is_none());
    assert_eq!(report.delays.get(f.n3).unwrap().to_string(), "372.0000ps");
}

#[test]
fn fixture_is_well_formed() {
    let f = coupled();
    assert!(floating_nodes(&f.graph, &[f.vagg, f.vvic]).is_empty());
    assert_eq!(floating_nodes(&f.graph, &[f.vagg]).len(), 4);
    assert!(resistor_loops(&f.graph).is_empty());
}

#[test]
fn edge_records_build_the_same_graph() {
    let f = coupled();
    let records: Vec<EdgeRecord> = f
        .graph
        .branch_ids()
        .map(|id| {
            let branch = f.graph.branch(id);
            let (a, b) = branch.endpoints();
            let name = |n| match f.graph.node_name(n) {
                "gnd" => "0".to_owned(),
                other => other.to_owned(),
            };
            EdgeRecord::new(name(a), name(b), branch.component().kind(), branch.component().value())
        })
        .collect();
    let rebuilt = CircuitGraph::from_records(&records);
    assert_eq!(rebuilt.node_count(), f.graph.node_count());
    let root = rebuilt.find_node("vagg").unwrap();
    let rcv = rebuilt.find_node("agg_rcv").unwrap();
    assert_relative_eq!(
        elmore(&rebuilt, root).delays.get(rcv).unwrap().value(),
        372.0 * PICO,
        max_relative = 1e-9
    );
}

#[test]
fn moments_show_coupling() {
    let f = coupled();
    let system = assembled(&f);
    assert_eq!(system.state_count(), 10);
    let moments = system.moments(2).unwrap();
    assert_eq!(moments.len(), 2);

    let m0 = &moments[0];
    assert_relative_eq!(m0[(0, 0)], 1.0, max_relative = 1e-9);
    assert_relative_eq!(m0[(1, 1)], 1.0, max_relative = 1e-9);
    assert_relative_eq!(m0[(0, 1)], 0.0, epsilon = 1e-9);

    let m1 = &moments[1];
    assert_relative_eq!(m1[(0, 0)], -372.0 * PICO, max_relative = 1e-6);
    assert_relative_eq!(m1[(1, 1)], -372.0 * PICO, max_relative = 1e-6);
    assert_relative_eq!(m1[(0, 1)], 110.0 * PICO, max_relative = 1e-6);
    assert_relative_eq!(m1[(1, 0)], 110.0 * PICO, max_relative = 1e-6);
}

#[test]
fn regularization_keeps_moments() {
    let f = coupled();
    let system = assembled(&f);
    let reduced = regularize(&system).unwrap();
    assert_eq!(reduced.algebraic_states(), &[0, 4, 8, 9]);
    assert_eq!(reduced.order, vec![1, 2, 3, 5, 6, 7, 0, 4, 8, 9]);
    assert_eq!(reduced.system.c.shape(), (6, 6));
    assert!(!rc_interconnect::math::is_singular(&reduced.system.c));

    let full = system.moments(3).unwrap();
    let short = reduced.system.moments(3).unwrap();
    for (a, b) in full.iter().zip(&short) {
        let floor = 1e-9 * a.amax();
        for (x, y) in a.iter().zip(b.iter()) {
            assert_relative_eq!(*x, *y, epsilon = floor, max_relative = 1e-6);
        }
    }
}

#[test]
fn step_response_settles_with_a_victim_glitch() {
    let f = coupled();
    let reduced = regularize(&assembled(&f)).unwrap();
    let model = StateSpaceModel::from_regularization(&reduced).unwrap();

    let x0 = Vector::zeros(model.state_count());
    assert!(model.derivative(&x0, &Vector::zeros(2)).iter().all(|&v| v == 0.0));

    let mut engine = StateSpaceEngine::new(model);
    engine.set_step_input(Vector::from_vec(vec![1.0, 0.0]));
    engine
        .run(&SimulationConfig::transient("coupled", 5.0 * NANO, 1.0 * PICO))
        .expect("valid config");
    let wave = engine.into_waveform();

    let aggressor = wave.series(0);
    let victim = wave.series(1);
    assert_relative_eq!(*aggressor.last().unwrap(), 1.0, epsilon = 1e-3);
    assert!(victim.iter().copied().fold(0.0, f64::max) > 0.01);
    assert!(victim.last().unwrap().abs() < 1e-3);

    let t50 = wave.first_crossing(0, 0.5).unwrap();
    let elmore_delay = 372.0 * PICO;
    assert!(t50 > 0.1 * elmore_delay && t50 < 2.0 * elmore_delay);
}
