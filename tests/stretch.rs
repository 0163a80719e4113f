use trestle::testing::*;
use trestle::{Prop, Runner, Stretched, Stretcher};

#[test]
fn stretching_the_roots_edges_inserts_interstitials() -> anyhow::Result<()> {
    let runner = Runner::with_lanes(2);
    let mut g = hypercube(3, &runner)?;

    let s = Stretcher::new(
        Prop::vertex_only(|v: &u64| Ok(*v)),
        |origin: &u64, e: &u64, _target: &u64| {
            if *origin == 0 {
                Ok(Some(Stretched {
                    head: e + 10,
                    vertex: 1000 + e,
                    tail: e + 20,
                }))
            } else {
                Ok(None)
            }
        },
    );
    g.stretch(&s, &runner)?;

    // 3 stretched edges: one vertex and one extra edge each
    assert_eq!(g.vertex_count(&runner)?, 11);
    assert_eq!(g.edge_count(&runner)?, 27);

    let mut from_root: Vec<u64> = g
        .edges_from(&0)
        .unwrap()
        .into_iter()
        .map(|(l, _)| *l)
        .collect();
    from_root.sort_unstable();
    assert_eq!(from_root, vec![10, 11, 12]);
    for axis in 0..3u64 {
        assert_eq!(
            g.edges_from(&(1000 + axis)).unwrap(),
            vec![(&(axis + 20), &(1 << axis))]
        );
        assert_eq!(g.in_degree(&(1000 + axis)), Some(1));
    }
    Ok(())
}

#[test]
fn a_fixed_point_stretch_stops_once_nothing_expands() -> anyhow::Result<()> {
    let runner = Runner::with_lanes(2);
    let mut g = hypercube(3, &runner)?;

    // fire on original labels only, so round two finds nothing
    let s = Stretcher::new(
        Prop::vertex_only(|v: &u64| Ok(*v)),
        |_: &u64, e: &u64, _: &u64| {
            if *e < 3 {
                Ok(Some(Stretched {
                    head: e + 10,
                    vertex: 1 << 20 | e,
                    tail: e + 20,
                }))
            } else {
                Ok(None)
            }
        },
    )
    .fixed();
    g.stretch(&s, &runner)?;

    // every one of the 24 edges stretched exactly once
    assert_eq!(g.vertex_count(&runner)?, 32);
    assert_eq!(g.edge_count(&runner)?, 48);
    Ok(())
}

#[test]
fn an_indifferent_expander_changes_nothing() -> anyhow::Result<()> {
    let runner = Runner::with_lanes(2);
    let reference = hypercube(4, &runner)?;
    let mut g = hypercube(4, &runner)?;

    let s: Stretcher<u64, u64> = Stretcher::plain(|_: &u64| Ok(None));
    g.stretch(&s, &runner)?;
    assert_same_shape(&g, &reference);
    Ok(())
}
