mod common;

use chrono::{DateTime, TimeDelta, Utc};
use der_telemetry_sim::sim::calendar::TimeContext;
use der_telemetry_sim::sim::contract::WINDOW_SECS;
use der_telemetry_sim::sim::power_meter::ViolationMode;
use der_telemetry_sim::sim::simulator::DerSimulator;
use der_telemetry_sim::sim::types::{DerKind, Region};
use der_telemetry_sim::telemetry::Reading;

use common::{local_midnight, profile};

/// Ticks a fresh simulator every `step_secs` for `hours`, starting at local midnight.
fn run(kind: DerKind, seed: u64, step_secs: i64, hours: i64) -> Vec<Reading> {
    let p = profile(kind, 10.0, 18.0, 15.0);
    let mut sim = DerSimulator::new(p, ViolationMode::OFF, seed, local_midnight());
    (0..hours * 3600 / step_secs)
        .map(|i| sim.tick(local_midnight() + TimeDelta::seconds(i * step_secs)))
        .collect()
}

fn local(at: DateTime<Utc>) -> TimeContext {
    TimeContext::new(at, Region::Fredericton)
}

#[test]
fn battery_soc_stays_in_bounds_for_two_days() {
    for seed in [1, 2, 3] {
        for r in run(DerKind::BatteryStorage, seed, 15, 48) {
            assert!(
                (10.0..=100.0).contains(&r.current_soc),
                "soc {} at {}",
                r.current_soc,
                r.timestamp
            );
            assert!(r.current_output.abs() <= 8.0 + 1e-9);
        }
    }
}

#[test]
fn battery_discharges_in_the_evening_and_charges_midday() {
    let readings = run(DerKind::BatteryStorage, 4, 60, 24);
    let at_hour = |h: u32| {
        readings
            .iter()
            .filter(|r| local(r.timestamp).hour == h)
            .map(|r| r.current_output)
            .collect::<Vec<_>>()
    };
    assert!(at_hour(18).iter().all(|kw| *kw >= 0.0));
    assert!(at_hour(12).iter().all(|kw| *kw <= 0.0));
}

#[test]
fn solar_is_zero_outside_daylight() {
    let readings = run(DerKind::Solar, 7, 60, 24);
    let mut daylight_output = 0.0;
    for r in &readings {
        if local(r.timestamp).is_daylight {
            daylight_output += r.current_output;
        } else {
            assert_eq!(r.current_output, 0.0, "generation at {}", r.timestamp);
        }
        assert!(r.current_output <= 10.0);
    }
    assert!(daylight_output > 0.0);
}

#[test]
fn offline_ev_reports_no_output_and_no_session() {
    let readings = run(DerKind::Ev, 11, 30, 48);
    let mut prev_soc = None;
    let mut saw_online = false;
    let mut saw_offline = false;
    for r in &readings {
        if r.is_online {
            saw_online = true;
            assert!(r.connection_start_at.is_some());
            assert!(r.current_output >= 0.0);
        } else {
            saw_offline = true;
            assert_eq!(r.current_output, 0.0);
            assert!(r.connection_start_at.is_none());
            if let Some(prev) = prev_soc {
                assert_eq!(r.current_soc, prev);
            }
        }
        prev_soc = Some(r.current_soc);
    }
    assert!(saw_online && saw_offline);
}

#[test]
fn meter_is_never_negative() {
    for kind in [DerKind::Solar, DerKind::BatteryStorage, DerKind::Ev] {
        for r in run(kind, 5, 60, 24) {
            assert!(r.power_meter_measurement >= 0.0);
        }
    }
}

#[test]
fn contract_window_covers_exactly_five_minutes() {
    let p = profile(DerKind::Solar, 8.0, 18.0, 15.0);
    let mut sim = DerSimulator::new(p, ViolationMode::OFF, 3, local_midnight());
    let mut last = local_midnight();
    for s in 0..900 {
        last = local_midnight() + TimeDelta::seconds(s);
        sim.tick(last);
        assert!(sim.contract_status().samples <= 300);
    }
    assert_eq!(sim.contract_status().samples, 300);
    let cutoff = last - TimeDelta::seconds(WINDOW_SECS);
    assert!(sim.contract().window().all(|s| s.timestamp > cutoff));
}
