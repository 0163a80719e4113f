use trestle::testing::*;
use trestle::{Classifier, Order, Prop, Runner};

fn bitcount_classifier() -> Classifier<u64, u64, (), (), u64> {
    Classifier::new(
        Prop::vertex_only(|v: &u64| Ok(popcount(*v))),
        Order::natural(),
    )
}

#[test]
fn bit_count_classes_have_binomial_sizes() -> anyhow::Result<()> {
    let runner = Runner::with_lanes(3);
    let g = hypercube(6, &runner)?;
    let p = g.partitioned(&bitcount_classifier(), &runner)?;

    assert_eq!(p.class_count(), 7);
    let expected: Vec<usize> = (0..=6).map(|k| choose(6, k) as usize).collect();
    assert_class_sizes(&p, &expected);
    Ok(())
}

#[test]
fn adjacent_vertices_are_never_co_classified() -> anyhow::Result<()> {
    let runner = Runner::with_lanes(2);
    let g = hypercube(6, &runner)?;
    let p = g.partitioned(&bitcount_classifier(), &runner)?;

    for v in 0..64u64 {
        let cv = p.class_of(&g, &v)?;
        for axis in 0..6 {
            let cw = p.class_of(&g, &(v ^ (1 << axis)))?;
            assert_ne!(cv, cw, "vertex {v} shares a class with its neighbor");
        }
    }
    Ok(())
}

#[test]
fn equal_bit_counts_share_a_class() -> anyhow::Result<()> {
    let runner = Runner::with_lanes(2);
    let g = hypercube(6, &runner)?;
    let p = g.partitioned(&bitcount_classifier(), &runner)?;

    assert_eq!(p.class_of(&g, &0b111)?, p.class_of(&g, &0b111000)?);
    assert_eq!(p.class_size(p.class_of(&g, &0b111)?), choose(6, 3) as usize);
    Ok(())
}

#[test]
fn uniting_classes_is_transitive_and_self_unite_is_a_no_op() -> anyhow::Result<()> {
    let runner = Runner::with_lanes(2);
    let g = hypercube(6, &runner)?;
    let p = g.partitioned(&bitcount_classifier(), &runner)?;

    let zeros = p.class_of(&g, &0)?;
    assert_eq!(p.unite(zeros, zeros), zeros);
    assert_eq!(p.class_count(), 7);

    let ones = p.class_of(&g, &1)?;
    let twos = p.class_of(&g, &3)?;
    p.unite(zeros, ones);
    p.unite(p.class_of(&g, &0)?, twos);
    assert_eq!(p.class_count(), 5);
    assert_eq!(p.class_of(&g, &0)?, p.class_of(&g, &3)?);
    assert_eq!(
        p.class_size(p.class_of(&g, &0)?),
        (choose(6, 0) + choose(6, 1) + choose(6, 2)) as usize
    );
    Ok(())
}
