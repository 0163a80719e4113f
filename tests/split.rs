use trestle::testing::*;
use trestle::{Ctops, Fold, Labeler, Mapreducer, Prop, Runner, SplitSide, Splitter, fail};

#[test]
fn the_default_splitter_doubles_the_graph() -> anyhow::Result<()> {
    let runner = Runner::with_lanes(3);
    let mut g = hypercube(4, &runner)?;

    g.split(&Splitter::cloning(), &runner)?;

    assert_eq!(g.vertex_count(&runner)?, 32);
    assert_eq!(g.edge_count(&runner)?, 256);

    // payload-keyed degree checks are ambiguous on a doubled graph, so
    // verify the regular degrees through a fold over the records
    let edge = |_: &u64, _: &u64, _: &u64| Ok(1u64);
    let prop = Prop::new(|inc: Option<u64>, _: &u64, out: Option<u64>| {
        if inc == Some(8) && out == Some(8) {
            Ok(1u64)
        } else {
            fail("split degrees are off")
        }
    })
    .with_incident(Fold::new(edge).reducing(|a, b| Ok(a + b)))
    .with_outgoing(Fold::new(edge).reducing(|a, b| Ok(a + b)));
    let counted = g.mapreduced(&Mapreducer::new(prop, |a, b| Ok(a + b)), &runner)?;
    assert_eq!(counted, 32);
    Ok(())
}

fn rooted_splitter(
    outward_cata: Option<Labeler<u64, ()>>,
) -> Splitter<u64, u64, ()> {
    let copy = || Labeler::new(|e: &u64, _: &()| Ok(*e));
    Splitter::new(
        Prop::vertex_only(|_: &u64| Ok(())),
        |v, _| Ok(*v == 0),
        |_, _| Ok(100u64),
        |_, _| Ok(200u64),
        Ctops {
            inward: SplitSide {
                ana: Some(copy()),
                cata: Some(copy()),
            },
            outward: SplitSide {
                ana: Some(copy()),
                cata: outward_cata,
            },
        },
    )
}

#[test]
fn a_selective_split_replaces_one_vertex_with_two() -> anyhow::Result<()> {
    let runner = Runner::with_lanes(2);
    let mut g = hypercube(3, &runner)?;

    let copy = || Labeler::new(|e: &u64, _: &()| Ok(*e));
    g.split(&rooted_splitter(Some(copy())), &runner)?;

    // 8 - 1 + 2 vertices; the root's 3+3 edges became 6+6
    assert_eq!(g.vertex_count(&runner)?, 9);
    assert_eq!(g.edge_count(&runner)?, 30);
    assert_eq!(g.root(), &100);
    assert!(g.contains(&200));
    assert!(!g.contains(&0));
    assert_eq!(g.out_degree(&100), Some(3));
    assert_eq!(g.out_degree(&200), Some(3));
    assert_eq!(g.in_degree(&100), Some(3));
    assert_eq!(g.in_degree(&200), Some(3));
    Ok(())
}

#[test]
fn an_absent_labeler_drops_that_kind_of_edge() -> anyhow::Result<()> {
    let runner = Runner::with_lanes(2);
    let mut g = hypercube(3, &runner)?;

    // the catastatic image receives edges but emits none
    g.split(&rooted_splitter(None), &runner)?;

    assert_eq!(g.vertex_count(&runner)?, 9);
    assert_eq!(g.edge_count(&runner)?, 27);
    assert_eq!(g.out_degree(&100), Some(3));
    assert_eq!(g.out_degree(&200), Some(0));
    assert_eq!(g.in_degree(&200), Some(3));
    Ok(())
}

#[test]
fn a_guarded_labeler_vetoes_specific_edges() -> anyhow::Result<()> {
    let runner = Runner::with_lanes(2);
    let mut g = hypercube(3, &runner)?;

    let copy = || Labeler::new(|e: &u64, _: &()| Ok(*e));
    let splitter = Splitter::new(
        Prop::vertex_only(|_: &u64| Ok(())),
        |v, _| Ok(*v == 0),
        |_, _| Ok(100u64),
        |_, _| Ok(200u64),
        Ctops {
            inward: SplitSide {
                ana: Some(copy()),
                cata: Some(copy()),
            },
            outward: SplitSide {
                // the anastatic image keeps only the axis-0 edge
                ana: Some(copy().guarded(|e: &u64, _: &()| Ok(*e == 0))),
                cata: Some(copy()),
            },
        },
    );
    g.split(&splitter, &runner)?;

    assert_eq!(g.out_degree(&100), Some(1));
    assert_eq!(g.out_degree(&200), Some(3));
    assert_eq!(g.edge_count(&runner)?, 28);
    Ok(())
}
