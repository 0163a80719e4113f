use std::sync::Arc;
use std::time::{Duration, Instant};
use trestle::testing::*;
use trestle::{Builder, Error, Graph, KillToken, Order, Runner, fail};

#[test]
fn a_pre_killed_runner_refuses_to_work() -> anyhow::Result<()> {
    let live = Runner::with_lanes(2);
    let g = hypercube(4, &live)?;

    let killed = Runner::with_lanes(2);
    killed.kill.kill();

    assert!(matches!(
        Graph::build(&hypercube_builder(4), 0, &killed),
        Err(Error::Killed)
    ));
    assert!(matches!(g.vertex_count(&killed), Err(Error::Killed)));
    assert!(matches!(g.edge_count(&killed), Err(Error::Killed)));
    Ok(())
}

#[test]
fn a_trip_wire_kills_a_build_in_flight() -> anyhow::Result<()> {
    let kill = KillToken::new();
    let runner = Runner::killable(3, kill.clone());
    let wire = Arc::new(TripWire::new(kill, 10));

    let watched = {
        let wire = wire.clone();
        Builder::new(move |v: &u64, edges: &mut trestle::Connections<u64, u64>| {
            wire.poll();
            for axis in 0..6u64 {
                edges.connect(axis, v ^ (1 << axis));
            }
            Ok(())
        })
        .natural_edge_order()
    };

    assert!(matches!(
        Graph::build(&watched, 0u64, &runner),
        Err(Error::Killed)
    ));
    assert!(wire.seen() >= 10);
    Ok(())
}

#[test]
fn the_first_callback_error_is_the_one_reported() -> anyhow::Result<()> {
    let runner = Runner::with_lanes(3);
    let broken = Builder::new(|v: &u64, edges: &mut trestle::Connections<u64, u64>| {
        if *v == 7 {
            return fail("seven is right out");
        }
        for axis in 0..4u64 {
            edges.connect(axis, v ^ (1 << axis));
        }
        Ok(())
    })
    .natural_edge_order();

    match Graph::build(&broken, 0u64, &runner) {
        Err(Error::Callback(msg)) => assert_eq!(msg, "seven is right out"),
        other => panic!("expected the callback error, got {other:?}"),
    }

    // the runner's own token is untouched by the failure
    assert!(!runner.kill.is_killed());
    let g = hypercube(4, &runner)?;
    assert_eq!(g.vertex_count(&runner)?, 16);
    Ok(())
}

#[test]
fn a_tight_queue_still_terminates() -> anyhow::Result<()> {
    let mut runner = Runner::with_lanes(4);
    runner.queue_depth = 2;

    let g = hypercube(6, &runner)?;
    assert_eq!(g.vertex_count(&runner)?, 64);
    assert_eq!(g.edge_count(&runner)?, 384);
    Ok(())
}

#[test]
fn background_destruction_finishes_on_its_own() -> anyhow::Result<()> {
    let runner = Runner::with_lanes(2);
    let ledger = DropLedger::new();

    let builder = {
        let ledger = ledger.clone();
        Builder::ordered(
            Order::natural(),
            move |v: &Counted<u64>, edges: &mut trestle::Connections<Counted<u64>, u64>| {
                for axis in 0..4u64 {
                    edges.connect(axis, Counted::new(v.value ^ (1 << axis), &ledger));
                }
                Ok(())
            },
        )
    };
    let g = Graph::build(&builder, Counted::new(0, &ledger), &runner)?;
    assert_eq!(ledger.live(), 16);

    g.free_later();
    let deadline = Instant::now() + Duration::from_secs(5);
    while ledger.live() > 0 && Instant::now() < deadline {
        std::thread::sleep(Duration::from_millis(10));
    }
    assert_eq!(ledger.live(), 0);
    Ok(())
}

#[test]
fn kernels_share_one_kill_token() -> anyhow::Result<()> {
    let runner = Runner::with_lanes(2);
    let g = hypercube(5, &runner)?;

    let shared = Runner::killable(2, runner.kill.clone());
    runner.kill.kill();
    assert!(matches!(g.edge_count(&shared), Err(Error::Killed)));
    Ok(())
}
