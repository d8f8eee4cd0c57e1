//! End-to-end control-loop tests.
//!
//! Drive `DispenserService::poll_once` against `MockHardware` on a virtual
//! clock and assert on valve edges, published reports and emitted events.

use crate::mock_hw::{MockHardware, RecordingNet, RecordingSink};

use dispenser::app::events::AppEvent;
use dispenser::app::ports::Rgb;
use dispenser::app::service::{DispenserService, LoopOutcome};
use dispenser::config::DispenserConfig;
use dispenser::error::SafetyFault;
use dispenser::fsm::StateId;

const PIXELS: usize = 8;

/// Defaults with every cosmetic delay removed so the clock only moves on
/// poll intervals.
fn bench_config() -> DispenserConfig {
    DispenserConfig {
        presence_debounce_ms: 0,
        fade_step_delay_ms: 0,
        alarm_fade_step_delay_ms: 0,
        hold_poll_ms: 10,
        idle_poll_ms: 50,
        ..DispenserConfig::default()
    }
}

fn started(hw: &mut MockHardware) -> (DispenserService, RecordingNet, RecordingSink) {
    let mut svc = DispenserService::new(bench_config());
    let mut sink = RecordingSink::new();
    svc.start(hw, &mut sink);
    (svc, RecordingNet::new(), sink)
}

/// Poll until the loop reports something other than `Idle`.
fn poll_until_outcome(
    svc: &mut DispenserService,
    hw: &mut MockHardware,
    net: &mut RecordingNet,
    sink: &mut RecordingSink,
) -> LoopOutcome {
    for _ in 0..10_000 {
        let outcome = svc.poll_once(hw, net, sink);
        if outcome != LoopOutcome::Idle {
            return outcome;
        }
    }
    panic!("loop never left Idle");
}

// ── Normal cycle ──────────────────────────────────────────────

#[test]
fn presence_for_2500_ms_reports_once() {
    let mut hw = MockHardware::new(PIXELS).with_presence(0, 2_500);
    let (mut svc, mut net, mut sink) = started(&mut hw);

    assert!(!hw.valve_open(), "valve must be low after start");

    let outcome = poll_until_outcome(&mut svc, &mut hw, &mut net, &mut sink);
    assert_eq!(outcome, LoopOutcome::Dispensed { open_ms: 2_500 });
    assert_eq!(hw.valve_edges(), vec![(0, true), (2_500, false)]);
    assert!(net.published.is_empty(), "report goes out on the next pass");

    for _ in 0..5 {
        svc.poll_once(&mut hw, &mut net, &mut sink);
    }
    assert_eq!(net.published, vec![("water".to_string(), "2500".to_string())]);
    assert!(!svc.record().report_pending);
    assert_eq!(
        sink.count(|e| matches!(e, AppEvent::ReportPublished { open_ms: 2_500 })),
        1
    );
}

#[test]
fn trigger_alone_runs_a_cycle() {
    let mut hw = MockHardware::new(PIXELS).with_trigger(100, 400);
    let (mut svc, mut net, mut sink) = started(&mut hw);

    let outcome = poll_until_outcome(&mut svc, &mut hw, &mut net, &mut sink);
    assert_eq!(outcome, LoopOutcome::Dispensed { open_ms: 300 });
    svc.poll_once(&mut hw, &mut net, &mut sink);
    assert_eq!(net.payloads(), vec!["300"]);
}

#[test]
fn inputs_are_or_combined_into_one_cycle() {
    // Presence starts, switch overlaps, presence drops while switch is held.
    let mut hw = MockHardware::new(PIXELS)
        .with_presence(0, 1_000)
        .with_trigger(500, 3_000);
    let (mut svc, mut net, mut sink) = started(&mut hw);

    let outcome = poll_until_outcome(&mut svc, &mut hw, &mut net, &mut sink);
    assert_eq!(outcome, LoopOutcome::Dispensed { open_ms: 3_000 });
    assert_eq!(hw.valve_edges(), vec![(0, true), (3_000, false)]);

    svc.poll_once(&mut hw, &mut net, &mut sink);
    assert_eq!(net.payloads(), vec!["3000"]);
}

#[test]
fn open_for_exactly_the_limit_is_not_a_fault() {
    let mut hw = MockHardware::new(PIXELS).with_presence(0, 60_000);
    let (mut svc, mut net, mut sink) = started(&mut hw);

    let outcome = poll_until_outcome(&mut svc, &mut hw, &mut net, &mut sink);
    assert_eq!(outcome, LoopOutcome::Dispensed { open_ms: 60_000 });
    assert!(!svc.is_faulted());
}

#[test]
fn dropped_report_is_not_retried() {
    let mut hw = MockHardware::new(PIXELS).with_presence(0, 800);
    let (mut svc, mut net, mut sink) = started(&mut hw);
    net.link_up = false;

    poll_until_outcome(&mut svc, &mut hw, &mut net, &mut sink);
    svc.poll_once(&mut hw, &mut net, &mut sink);
    assert_eq!(
        sink.count(|e| matches!(e, AppEvent::ReportDropped { open_ms: 800, .. })),
        1
    );

    net.link_up = true;
    for _ in 0..5 {
        svc.poll_once(&mut hw, &mut net, &mut sink);
    }
    assert!(net.published.is_empty());
}

#[test]
fn indicator_fades_blue_in_and_out() {
    let mut hw = MockHardware::new(PIXELS).with_presence(0, 200);
    let (mut svc, mut net, mut sink) = started(&mut hw);
    assert_eq!(hw.last_frame(), Some(&[Rgb::OFF; PIXELS][..]));

    poll_until_outcome(&mut svc, &mut hw, &mut net, &mut sink);

    let peak = Rgb::new(0, 0, 255);
    assert!(hw.frames.iter().any(|f| f.iter().all(|p| *p == peak)));
    assert_eq!(hw.last_frame(), Some(&[Rgb::OFF; PIXELS][..]));
    assert!(!svc.indicator().is_on());
}

// ── Overrun fault ─────────────────────────────────────────────

#[test]
fn held_presence_trips_the_interlock() {
    let mut hw = MockHardware::new(PIXELS).with_presence(0, u64::MAX);
    let (mut svc, mut net, mut sink) = started(&mut hw);

    let outcome = poll_until_outcome(&mut svc, &mut hw, &mut net, &mut sink);
    assert_eq!(outcome, LoopOutcome::Halted);
    assert_eq!(svc.state(), StateId::Faulted);
    assert!(svc.is_faulted());
    assert_eq!(
        svc.fault(),
        Some(SafetyFault::Overrun {
            open_ms: 60_010,
            limit_ms: 60_000
        })
    );
    assert_eq!(hw.valve_edges(), vec![(0, true), (60_010, false)]);
    assert!(!svc.record().report_pending);
    assert_eq!(sink.count(|e| matches!(e, AppEvent::OverrunFault(_))), 1);
}

#[test]
fn fault_is_terminal_and_shows_the_alarm() {
    let mut hw = MockHardware::new(PIXELS).with_presence(0, u64::MAX);
    let (mut svc, mut net, mut sink) = started(&mut hw);
    poll_until_outcome(&mut svc, &mut hw, &mut net, &mut sink);

    let services = net.services;
    let frames_before = hw.frames.len();
    for _ in 0..3 {
        assert_eq!(
            svc.poll_once(&mut hw, &mut net, &mut sink),
            LoopOutcome::Halted
        );
    }

    assert!(!hw.valve_open());
    assert_eq!(hw.valve_edges().len(), 2, "valve never reopens");
    assert!(net.published.is_empty(), "no report for an overrun");
    assert_eq!(net.services, services, "network is not serviced once halted");

    let red = Rgb::new(255, 0, 0);
    assert!(hw.frames[frames_before..]
        .iter()
        .any(|f| f.iter().all(|p| *p == red)));
    assert_eq!(sink.count(|e| matches!(e, AppEvent::OverrunFault(_))), 1);
}

#[test]
fn shorter_limit_is_honoured() {
    let mut hw = MockHardware::new(PIXELS).with_trigger(0, u64::MAX);
    let mut svc = DispenserService::new(DispenserConfig {
        max_open_duration_ms: 5_000,
        ..bench_config()
    });
    let mut sink = RecordingSink::new();
    let mut net = RecordingNet::new();
    svc.start(&mut hw, &mut sink);

    assert_eq!(
        poll_until_outcome(&mut svc, &mut hw, &mut net, &mut sink),
        LoopOutcome::Halted
    );
    assert_eq!(hw.valve_edges(), vec![(0, true), (5_010, false)]);
}

#[test]
fn validated_config_closes_within_one_pass_of_the_limit() {
    let quick = DispenserConfig {
        max_open_duration_ms: 1_000,
        fade_steps: 20,
        fade_step_delay_ms: 2,
        alarm_fade_step_delay_ms: 2,
        presence_debounce_ms: 20,
        hold_poll_ms: 10,
        ..DispenserConfig::default()
    };

    for config in [DispenserConfig::default(), quick] {
        config.validate().unwrap();
        let limit = u64::from(config.max_open_duration_ms);
        let slack = config.worst_case_pass_ms();

        let mut hw = MockHardware::new(PIXELS).with_presence(0, u64::MAX);
        let mut svc = DispenserService::new(config);
        let mut sink = RecordingSink::new();
        let mut net = RecordingNet::new();
        svc.start(&mut hw, &mut sink);

        assert_eq!(
            poll_until_outcome(&mut svc, &mut hw, &mut net, &mut sink),
            LoopOutcome::Halted
        );
        let edges = hw.valve_edges();
        assert_eq!(edges.len(), 2);
        let open_for = edges[1].0 - edges[0].0;
        assert!(
            open_for > limit && open_for <= limit + slack,
            "open {open_for} ms against limit {limit} ms"
        );
    }
}
