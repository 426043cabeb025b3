use actdb_sched::{solve, solve_grid, BurnTime, ScheduleGrid};
use proptest::prelude::*;

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() <= 1e-9 * a.abs().max(b.abs()).max(1.0)
}

proptest! {
    #[test]
    fn dwell_matches_closed_form(burn in 1e-3f64..1e3, duty in 1e-3f64..=1.0, pulses in 1u32..512) {
        let result = solve(burn, duty, pulses).unwrap();
        let expected = result.pulse_length * (1.0 / duty - 1.0);
        prop_assert!(close(result.dwell_time, expected));
        prop_assert!(result.dwell_time >= 0.0);
        let duty_back = result.pulse_length / (result.pulse_length + result.dwell_time);
        prop_assert!(close(duty_back, duty));
    }

    #[test]
    fn total_time_never_undercuts_burn_time(burn in 1e-3f64..1e3, duty in 1e-3f64..=1.0, pulses in 1u32..512) {
        let result = solve(burn, duty, pulses).unwrap();
        prop_assert!(result.total_irradiation_time >= burn);
        if pulses == 1 || result.dwell_time == 0.0 {
            prop_assert_eq!(result.total_irradiation_time, burn);
        } else if result.off_time() > burn * 1e-12 {
            prop_assert!(result.total_irradiation_time > burn);
        }
        let decomposed = result.pulse_length * f64::from(pulses) + result.dwell_time * f64::from(pulses - 1);
        prop_assert!(close(result.total_irradiation_time, decomposed));
    }

    #[test]
    fn grid_is_elementwise_scalar(duties in proptest::collection::vec(1e-2f64..=1.0, 1..6),
                                  pulses in proptest::collection::vec(1u32..128, 1..6)) {
        let grid = solve_grid(&BurnTime::Scalar(4.0), &duties, &pulses).unwrap();
        let dwell = grid.dwell_times();
        prop_assert_eq!(dwell.len(), pulses.len());
        for (row, &n) in pulses.iter().enumerate() {
            prop_assert_eq!(dwell[row].len(), duties.len());
            for (col, &duty) in duties.iter().enumerate() {
                prop_assert_eq!(dwell[row][col], solve(4.0, duty, n).unwrap().dwell_time);
            }
        }
    }
}

#[test]
fn reference_dwell_table() {
    // Four-year campaign, pulse counts 2..64.
    let duties = [1.0, 0.9, 0.5, 0.25];
    let pulses = [2, 4, 8, 32, 64];
    let grid = solve_grid(&BurnTime::Scalar(4.0), &duties, &pulses).unwrap();
    assert_eq!(grid.get(0, 0).unwrap().dwell_time, 0.0);
    assert_eq!(grid.get(0, 2).unwrap().dwell_time, 2.0);
    assert_eq!(grid.get(0, 3).unwrap().dwell_time, 6.0);
    assert!(close(grid.get(1, 1).unwrap().dwell_time, 1.0 / 9.0));
    assert_eq!(grid.get(4, 2).unwrap().dwell_time, 0.0625);
    assert_eq!(grid.get(4, 2).unwrap().total_irradiation_time, 4.0 + 0.0625 * 63.0);
}

#[test]
fn burn_time_deserializes_scalar_or_list() {
    let scalar: BurnTime = serde_yaml::from_str("4").unwrap();
    assert_eq!(scalar, BurnTime::Scalar(4.0));
    let list: BurnTime = serde_yaml::from_str("[1.0, 2.5]").unwrap();
    assert_eq!(list, BurnTime::PerPulseCount(vec![1.0, 2.5]));
}

#[test]
fn grid_serializes_for_reports() {
    let grid = solve_grid(&BurnTime::Scalar(4.0), &[0.5], &[4]).unwrap();
    let json = serde_json::to_value(&grid).unwrap();
    assert_eq!(json["points"][0]["dwell_time"], 1.0);
    assert_eq!(json["num_pulses"][0], 4);
}

#[test]
fn grid_with_empty_axis_is_rejected_on_read() {
    let parsed: Result<ScheduleGrid, _> =
        serde_json::from_str(r#"{"duty_cycles":[],"num_pulses":[2],"points":[]}"#);
    let err = parsed.unwrap_err();
    assert!(err.to_string().contains("schedule.grid-shape"));
}

#[test]
fn grid_with_missing_points_is_rejected_on_read() {
    let grid = solve_grid(&BurnTime::Scalar(4.0), &[1.0, 0.5], &[2, 4]).unwrap();
    let mut json = serde_json::to_value(&grid).unwrap();
    json["points"].as_array_mut().unwrap().pop();
    assert!(serde_json::from_value::<ScheduleGrid>(json).is_err());
}

#[test]
fn solved_grid_reads_back_unchanged() {
    let grid = solve_grid(&BurnTime::Scalar(4.0), &[1.0, 0.5], &[2, 4]).unwrap();
    let text = serde_json::to_string(&grid).unwrap();
    let back: ScheduleGrid = serde_json::from_str(&text).unwrap();
    assert_eq!(back.dwell_times(), grid.dwell_times());
    assert_eq!(back.pulse_lengths(), vec![2.0, 1.0]);
}
