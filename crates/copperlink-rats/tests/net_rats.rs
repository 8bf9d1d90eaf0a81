use copperlink_core::{Board, Line, ObjectFlags, ObjectId, PadShape, Padstack, Point, Shape, Subcircuit, Terminal};
use copperlink_rats::{
    shape_distance, NetOrchestrator, RatConfig, RatError, RatOutcome, RatPolicy, RecordingHooks,
};

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn round_pad(x: f64, y: f64) -> Shape {
    Shape::Padstack(Padstack::new(
        Point::new(x, y),
        PadShape::Circle { radius: 10.0 },
        vec![0, 1],
    ))
}

/// Place a one-pin part `refdes` at (x, y) and put its pin on `net`.
fn part(board: &mut Board, refdes: &str, x: f64, y: f64, net: &str) -> ObjectId {
    let sc = board.store.add_subcircuit(Subcircuit::new(refdes));
    let id = board.store.add_owned(round_pad(x, y), sc, Some("1"));
    board.netlist.get_or_create(net).add_terminal(Terminal::new(refdes, "1"));
    id
}

fn trace(board: &mut Board, x1: f64, y1: f64, x2: f64, y2: f64) -> ObjectId {
    board.store.add(Shape::Line(Line::new(
        0,
        Point::new(x1, y1),
        Point::new(x2, y2),
        4.0,
    )))
}

fn rat_length_sum(board: &Board) -> f64 {
    board
        .store
        .rats()
        .map(|o| match &o.shape {
            Shape::Rat(r) => r.length(),
            _ => 0.0,
        })
        .sum()
}

#[test]
fn test_touching_net_draws_nothing() {
    init_logging();
    let mut board = Board::new("touching");
    part(&mut board, "J1", 0.0, 0.0, "SIG");
    part(&mut board, "J2", 500.0, 0.0, "SIG");
    part(&mut board, "J3", 500.0, 500.0, "SIG");
    trace(&mut board, 0.0, 0.0, 500.0, 0.0);
    trace(&mut board, 500.0, 0.0, 500.0, 500.0);

    let config = RatConfig::default();
    let mut hooks = RecordingHooks::new();
    let mut orch = NetOrchestrator::new(&mut board, &config, &mut hooks);
    let r = orch.add_rats_for_net("SIG", &RatPolicy::precise()).unwrap();
    assert_eq!(r.drawn, 0);
    assert_eq!(r.missing, 0);
    assert_eq!(r.subnets, 1);
}

#[test]
fn test_two_pads_rat_matches_distance() {
    init_logging();
    let mut board = Board::new("pair");
    let a = part(&mut board, "J1", 0.0, 0.0, "SIG");
    let b = part(&mut board, "J2", 300.0, 400.0, "SIG");
    let expected = shape_distance(
        &board.store.get(a).unwrap().shape,
        &board.store.get(b).unwrap().shape,
        &RatPolicy::precise(),
    )
    .distance();

    let config = RatConfig::default();
    let mut hooks = RecordingHooks::new();
    {
        let mut orch = NetOrchestrator::new(&mut board, &config, &mut hooks);
        let r = orch.add_rats_for_net("SIG", &RatPolicy::precise()).unwrap();
        assert_eq!(r.drawn, 1);
    }
    assert!((expected - 480.0).abs() < 1e-9);
    assert!((rat_length_sum(&board) - expected).abs() < 1e-9);
}

#[test]
fn test_second_pass_is_idempotent() {
    init_logging();
    let mut board = Board::new("idem");
    part(&mut board, "J1", 0.0, 0.0, "SIG");
    part(&mut board, "J2", 300.0, 0.0, "SIG");
    part(&mut board, "J3", 600.0, 0.0, "SIG");

    let config = RatConfig::default();
    let mut hooks = RecordingHooks::new();
    let mut orch = NetOrchestrator::new(&mut board, &config, &mut hooks);
    assert_eq!(orch.add_rats_for_net("SIG", &RatPolicy::precise()).unwrap().drawn, 2);
    let again = orch.add_rats_for_net("SIG", &RatPolicy::precise()).unwrap();
    assert_eq!(again.drawn, 0);
    assert_eq!(again.subnets, 1);
    assert_eq!(orch.board().store.rats().count(), 2);
}

#[test]
fn test_gnd_three_points() {
    init_logging();
    let mut board = Board::new("gnd");
    for (refdes, x, y) in [("C1", 0.0, 0.0), ("C2", 1000.0, 0.0), ("C3", 1000.0, 1000.0)] {
        let sc = board.store.add_subcircuit(Subcircuit::new(refdes));
        board.store.add_owned(
            Shape::Padstack(Padstack::new(
                Point::new(x, y),
                PadShape::Circle { radius: 0.0 },
                vec![0],
            )),
            sc,
            Some("1"),
        );
        board.netlist.get_or_create("GND").add_terminal(Terminal::new(refdes, "1"));
    }

    let config = RatConfig::default();
    let mut hooks = RecordingHooks::new();
    {
        let mut orch = NetOrchestrator::new(&mut board, &config, &mut hooks);
        let r = orch.add_rats_for_net("GND", &RatPolicy::precise()).unwrap();
        assert_eq!(r.subnets, 3);
        assert_eq!(r.drawn, 2);
    }
    // the alternative spanning trees both use the 1414 diagonal
    assert!((rat_length_sum(&board) - 2000.0).abs() < 1e-9);
}

#[test]
fn test_short_reported_once_per_pass() {
    init_logging();
    let mut board = Board::new("short");
    part(&mut board, "A1", 0.0, 0.0, "A");
    part(&mut board, "A2", 0.0, 200.0, "A");
    part(&mut board, "B1", 400.0, 0.0, "B");
    part(&mut board, "B2", 400.0, 200.0, "B");
    // two separate bridges between the nets
    trace(&mut board, 0.0, 0.0, 400.0, 0.0);
    trace(&mut board, 0.0, 200.0, 400.0, 200.0);

    let config = RatConfig::default();
    let mut hooks = RecordingHooks::new();
    {
        let mut orch = NetOrchestrator::new(&mut board, &config, &mut hooks);
        let r = orch.add_rats_for_net("A", &RatPolicy::precise()).unwrap();
        assert_eq!(r.shorts, 1);
    }
    assert_eq!(hooks.shorts.len(), 1);
    assert_eq!(hooks.warnings().count(), 1);
    assert_eq!(hooks.warning_refreshes, 1);
    assert!(board.changed);
    assert!(board.store.objects().any(|o| o.has_flag(ObjectFlags::WARN)));
}

#[test]
fn test_all_nets_pass_reports_short_once() {
    init_logging();
    let mut board = Board::new("short");
    part(&mut board, "A1", 0.0, 0.0, "A");
    part(&mut board, "A2", 0.0, 200.0, "A");
    part(&mut board, "B1", 400.0, 0.0, "B");
    part(&mut board, "B2", 400.0, 200.0, "B");
    trace(&mut board, 0.0, 0.0, 400.0, 0.0);
    trace(&mut board, 0.0, 200.0, 400.0, 200.0);

    let config = RatConfig::default();
    let mut hooks = RecordingHooks::new();
    let report = {
        let mut orch = NetOrchestrator::new(&mut board, &config, &mut hooks);
        orch.add_rats_for_all_nets(&RatPolicy::precise(), None)
    };
    assert_eq!(report.totals.nets, 2);
    assert_eq!(report.totals.shorts, 1);
    assert_eq!(hooks.shorts.len(), 1);
    assert_eq!(hooks.warning_refreshes, 1);
    // one short warning plus the pass summary
    assert_eq!(hooks.messages.len(), 2);
}

#[test]
fn test_unrelated_nets_report_no_short() {
    init_logging();
    let mut board = Board::new("clean");
    part(&mut board, "A1", 0.0, 0.0, "A");
    part(&mut board, "A2", 100.0, 0.0, "A");
    part(&mut board, "B1", 0.0, 300.0, "B");
    part(&mut board, "B2", 100.0, 300.0, "B");

    let config = RatConfig::default();
    let mut hooks = RecordingHooks::new();
    let mut orch = NetOrchestrator::new(&mut board, &config, &mut hooks);
    let report = orch.add_rats_for_all_nets(&RatPolicy::precise(), None);
    assert_eq!(report.totals.shorts, 0);
    assert_eq!(report.totals.drawn, 2);
    assert_eq!(report.outcome, RatOutcome::Remaining(2));
    drop(orch);
    assert!(hooks.shorts.is_empty());
    assert_eq!(hooks.messages.len(), 1);
}

#[test]
fn test_rip_up_then_add_restores_rat_count() {
    init_logging();
    let mut board = Board::new("ripup");
    part(&mut board, "J1", 0.0, 0.0, "SIG");
    part(&mut board, "J2", 300.0, 0.0, "SIG");
    part(&mut board, "J3", 300.0, 300.0, "SIG");
    part(&mut board, "J4", 0.0, 300.0, "SIG");

    let config = RatConfig::default();
    let mut hooks = RecordingHooks::new();
    let mut orch = NetOrchestrator::new(&mut board, &config, &mut hooks);
    let before = orch.add_rats_for_net("SIG", &RatPolicy::precise()).unwrap().drawn;
    assert_eq!(before, 3);

    assert_eq!(orch.rip_up("SIG").unwrap(), 3);
    assert_eq!(orch.board().store.len(), 4);

    let after = orch.add_rats_for_net("SIG", &RatPolicy::precise()).unwrap().drawn;
    assert_eq!(after, before);
}

#[test]
fn test_rip_up_removes_free_copper_only() {
    init_logging();
    let mut board = Board::new("ripup");
    part(&mut board, "J1", 0.0, 0.0, "SIG");
    part(&mut board, "J2", 300.0, 0.0, "SIG");
    part(&mut board, "J3", 300.0, 300.0, "SIG");
    trace(&mut board, 0.0, 0.0, 300.0, 0.0);
    let elsewhere = trace(&mut board, 1000.0, 0.0, 1000.0, 300.0);

    let config = RatConfig::default();
    let mut hooks = RecordingHooks::new();
    let mut orch = NetOrchestrator::new(&mut board, &config, &mut hooks);
    assert_eq!(orch.add_rats_for_net("SIG", &RatPolicy::precise()).unwrap().drawn, 1);

    // the trace and the rat go; the pads and the unrelated trace stay
    assert_eq!(orch.rip_up("SIG").unwrap(), 2);
    assert_eq!(orch.board().store.len(), 4);
    assert!(orch.board().store.contains(elsewhere));
    drop(orch);
    assert!(board.undo());
    assert_eq!(board.store.len(), 6);
}

#[test]
fn test_inhibited_and_missing_terminals() {
    init_logging();
    let mut board = Board::new("partial");
    part(&mut board, "J1", 0.0, 0.0, "SIG");
    part(&mut board, "J2", 0.0, 10.0, "SIG");
    board.netlist.get_or_create("SIG").add_terminal(Terminal::new("U9", "4"));
    part(&mut board, "K1", 0.0, 500.0, "NC");
    part(&mut board, "K2", 500.0, 500.0, "NC");
    board.netlist.get_or_create("NC").inhibit_rats = true;

    let config = RatConfig::default();
    let mut hooks = RecordingHooks::new();
    let report = {
        let mut orch = NetOrchestrator::new(&mut board, &config, &mut hooks);
        orch.add_rats_for_all_nets(&RatPolicy::precise(), None)
    };
    assert_eq!(
        report.outcome,
        RatOutcome::Incomplete {
            missing: 1,
            disabled: 1,
            shorts: 0
        }
    );
    assert_eq!(hooks.messages.len(), 1);
    assert_eq!(board.store.rats().count(), 0);
}

#[test]
fn test_complete_board_message() {
    init_logging();
    let mut board = Board::new("done");
    part(&mut board, "J1", 0.0, 0.0, "SIG");
    part(&mut board, "J2", 15.0, 0.0, "SIG");

    let config = RatConfig::default();
    let mut hooks = RecordingHooks::new();
    let report = {
        let mut orch = NetOrchestrator::new(&mut board, &config, &mut hooks);
        orch.add_rats_for_all_nets(&config.default_policy, None)
    };
    assert!(report.outcome.is_complete());
    assert_eq!(hooks.last_message(), Some(RatOutcome::Complete.summary().as_str()));
}

#[test]
fn test_manual_rat_rejections_create_nothing() {
    init_logging();
    let mut board = Board::new("manual");
    part(&mut board, "A1", 0.0, 0.0, "A");
    part(&mut board, "A2", 200.0, 0.0, "A");
    part(&mut board, "B1", 0.0, 200.0, "B");
    let objects = board.store.len();

    let config = RatConfig::default();
    let mut hooks = RecordingHooks::new();
    {
        let mut orch = NetOrchestrator::new(&mut board, &config, &mut hooks);
        let same = orch.create_rat_by_manual_connection(Point::new(0.0, 0.0), Point::new(200.0, 0.0), true);
        assert!(matches!(same, Err(RatError::SameNet(_))));
        let merge = orch.create_rat_by_manual_connection(Point::new(0.0, 0.0), Point::new(0.0, 200.0), true);
        assert!(matches!(merge, Err(RatError::AmbiguousMerge { .. })));
    }
    assert_eq!(board.store.len(), objects);
    assert!(!board.can_undo());
}

#[test]
fn test_manual_rat_then_net_is_connected() {
    init_logging();
    let mut board = Board::new("manual");
    let a1 = part(&mut board, "A1", 0.0, 0.0, "A");
    let sc = board.store.add_subcircuit(Subcircuit::new("X1"));
    board.store.add_owned(round_pad(200.0, 0.0), sc, Some("1"));

    let config = RatConfig::default();
    let mut hooks = RecordingHooks {
        net_name_reply: Some(Some("ignored".to_string())),
        ..RecordingHooks::new()
    };
    {
        let mut orch = NetOrchestrator::new(&mut board, &config, &mut hooks);
        let manual = orch
            .create_rat_by_manual_connection(Point::new(2.0, 0.0), Point::new(200.0, 3.0), true)
            .unwrap();
        assert_eq!(manual.net, "A");
        assert_eq!(manual.added_terminals, vec![Terminal::new("X1", "1")]);
        match &orch.board().store.get(manual.rat).unwrap().shape {
            Shape::Rat(r) => assert_eq!(r.anchor1, a1),
            other => panic!("expected rat, got {:?}", other),
        }
        let r = orch.add_rats_for_net("A", &RatPolicy::precise()).unwrap();
        assert_eq!(r.drawn, 0);
        assert_eq!(r.subnets, 1);
    }
    assert_eq!(hooks.journal.len(), 1);
}
