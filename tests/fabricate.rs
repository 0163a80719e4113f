use trestle::testing::*;
use trestle::{Builder, Error, Fabricator, Graph, Order, Runner};

#[test]
fn the_default_fabricator_clones_the_structure() -> anyhow::Result<()> {
    let runner = Runner::with_lanes(3);
    let g = hypercube(6, &runner)?;
    let clone = g.cloned(&runner)?;

    assert_eq!(clone.vertex_count(&runner)?, 64);
    assert_eq!(clone.edge_count(&runner)?, 384);
    assert_same_shape(&g, &clone);

    // both remain independently usable
    g.free_now(&runner)?;
    assert_eq!(clone.vertex_count(&runner)?, 64);
    Ok(())
}

#[test]
fn every_payload_is_destroyed_exactly_once() -> anyhow::Result<()> {
    let runner = Runner::with_lanes(2);
    let ledger = DropLedger::new();

    let builder = {
        let ledger = ledger.clone();
        Builder::ordered(
            Order::natural(),
            move |v: &Counted<u64>, edges: &mut trestle::Connections<Counted<u64>, Counted<u64>>| {
                for axis in 0..4u64 {
                    edges.connect(
                        Counted::new(axis, &ledger),
                        Counted::new(v.value ^ (1 << axis), &ledger),
                    );
                }
                Ok(())
            },
        )
        .edge_order(Order::natural())
    };

    let g = Graph::build(&builder, Counted::new(0, &ledger), &runner)?;
    assert_eq!(g.vertex_count(&runner)?, 16);
    assert_eq!(g.edge_count(&runner)?, 64);
    // 16 vertices plus 4 interned labels remain alive
    assert_eq!(ledger.live(), 20);

    let clone = g.cloned(&runner)?;
    assert_eq!(ledger.live(), 40);

    g.free_now(&runner)?;
    assert_eq!(ledger.live(), 20);
    clone.free_now(&runner)?;
    assert_eq!(ledger.live(), 0);
    Ok(())
}

#[test]
fn a_mapping_fabricator_changes_the_payload_types() -> anyhow::Result<()> {
    let runner = Runner::with_lanes(2);
    let g = hypercube(4, &runner)?;

    let fab = Fabricator::new(
        Order::natural(),
        |v: &u64| Ok(format!("v{v}")),
        |e: &u64| Ok(*e as u32),
    );
    let named = g.fabricated(&fab, &runner)?;

    assert_eq!(named.vertex_count(&runner)?, 16);
    assert_eq!(named.edge_count(&runner)?, 64);
    assert!(named.contains(&"v0".to_string()));
    assert_eq!(named.root(), &"v0".to_string());
    let labels: Vec<u32> = named
        .edges_from(&"v0".to_string())
        .unwrap()
        .into_iter()
        .map(|(l, _)| *l)
        .collect();
    assert_eq!(labels, vec![0, 1, 2, 3]);
    Ok(())
}

#[test]
fn colliding_vertex_images_are_misuse() -> anyhow::Result<()> {
    let runner = Runner::with_lanes(2);
    let g = hypercube(4, &runner)?;

    let fab = Fabricator::new(Order::natural(), |v: &u64| Ok(*v % 2), |e: &u64| Ok(*e));
    assert!(matches!(
        g.fabricated(&fab, &runner),
        Err(Error::Misuse(_))
    ));
    Ok(())
}
