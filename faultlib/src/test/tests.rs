use std::error::Error;
use std::fs;
use chrono::NaiveDate;
use crate::config::{LruStrategy, PolicyKind, SimulationConfig};
use crate::frame::{count_faults, Access, GenericPager, Pager, WorkingSet};
use crate::replacement_policies::{Clock, FirstInFirstOut, LeastRecentlyUsed, TimestampedLru};
use crate::results::{file_name_for, write_table, CsvFileSink, ResultsSink};
use crate::simulator::{FaultAccumulator, Simulator};
use crate::test::{FixedSequence, REFERENCE_TRACE};
use crate::trace::{normal_sample, SeededSource, TraceGenerator};
use crate::util::{find_result_files, parse_result_file_name};

fn small_config() -> SimulationConfig {
    SimulationConfig {
        trials: 3,
        trace_length: 20,
        wss_lower: 4,
        wss_upper: 6,
        ..SimulationConfig::default()
    }
}

#[test]
fn fifo_reference_trace() {
    let mut pager = Pager::new(3, FirstInFirstOut::new(3));
    assert_eq!(pager.run(&REFERENCE_TRACE), 6);
    assert_eq!(pager.frame().slots(), &[5, 3, 4]);
}

#[test]
fn lru_reference_trace() {
    let mut pager = Pager::new(3, LeastRecentlyUsed::new(3));
    assert_eq!(pager.run(&REFERENCE_TRACE), 7);
    assert_eq!(pager.frame().slots(), &[3, 4, 5]);
}

#[test]
fn timestamped_lru_reference_trace() {
    let mut pager = Pager::new(3, TimestampedLru::new(3));
    assert_eq!(pager.run(&REFERENCE_TRACE), 7);
    assert_eq!(pager.frame().slots(), &[3, 4, 5]);
}

#[test]
fn clock_reference_trace() {
    let mut pager = Pager::new(3, Clock::new(3));
    assert_eq!(pager.run(&REFERENCE_TRACE), 7);
    assert_eq!(pager.frame().slots(), &[3, 4, 5]);
}

#[test]
fn generic_pager_matches_concrete_pagers() {
    let expected = [(PolicyKind::LeastRecentlyUsed, 7), (PolicyKind::FirstInFirstOut, 6), (PolicyKind::Clock, 7)];
    for (kind, faults) in expected {
        for strategy in [LruStrategy::Rescan, LruStrategy::Timestamp] {
            assert_eq!(count_faults(kind, strategy, 3, &REFERENCE_TRACE), faults, "{kind:?} with {strategy:?}");
        }
    }
}

#[test]
fn fifo_first_eviction_targets_first_filled_slot() {
    let trace = [1, 2, 3, 3, 2, 1, 4];
    let mut pager = Pager::new(3, FirstInFirstOut::new(3));
    assert_eq!(pager.run(&trace), 1);
    assert_eq!(pager.frame().slots(), &[4, 2, 3]);
    assert_eq!(pager.policy().cursor(), 1);
}

#[test]
fn clock_sweep_clears_every_bit_then_evicts() {
    let trace = [1, 2, 3, 1, 2, 3, 4];
    let mut pager = Pager::new(3, Clock::new(3));
    for position in 0..6 {
        pager.access(&trace, position);
    }
    assert_eq!(pager.policy().use_bits(), &[true, true, true]);
    assert_eq!(pager.access(&trace, 6), Access::Fault);
    assert_eq!(pager.frame().slots(), &[4, 2, 3]);
    assert_eq!(pager.policy().use_bits(), &[false, false, false]);
    assert_eq!(pager.policy().hand(), 1);
}

#[test]
fn clock_gives_used_pages_a_second_chance() {
    // 1 is hit before the frame fills, so 2 is evicted first
    let trace = [1, 2, 1, 3, 4];
    let mut pager = Pager::new(3, Clock::new(3));
    assert_eq!(pager.run(&trace), 1);
    assert_eq!(pager.frame().slots(), &[1, 4, 3]);
    assert_eq!(pager.policy().use_bits(), &[false, false, false]);
    assert_eq!(pager.policy().hand(), 2);
}

#[test]
fn single_slot_faults_on_every_change() {
    let trace = [1, 2, 2, 1, 2];
    for kind in PolicyKind::ALL {
        assert_eq!(count_faults(kind, LruStrategy::Rescan, 1, &trace), 3, "{kind:?}");
    }
}

#[test]
fn compulsory_fills_are_not_faults() {
    let trace = [7, 3, 7, 9, 3, 9, 7];
    for wss in [3, 5] {
        for kind in PolicyKind::ALL {
            let mut pager = GenericPager::new(kind, LruStrategy::Rescan, wss);
            let fills = (0..trace.len())
                .filter(|&position| pager.access(&trace, position) == Access::Fill)
                .count();
            assert_eq!(fills, 3, "{kind:?} at {wss}");
            assert_eq!(pager.faults(), 0, "{kind:?} at {wss}");
            assert_eq!(pager.frame().len(), 3);
        }
    }
}

#[test]
fn repeated_hits_change_nothing() {
    let mut trace = vec![1, 2, 3];
    trace.extend(std::iter::repeat(2).take(50));
    for kind in PolicyKind::ALL {
        let mut pager = GenericPager::new(kind, LruStrategy::Rescan, 3);
        for position in 0..3 {
            pager.access(&trace, position);
        }
        for position in 3..trace.len() {
            assert_eq!(pager.access(&trace, position), Access::Hit);
            assert_eq!(pager.frame().slots(), &[1, 2, 3]);
        }
        assert_eq!(pager.faults(), 0);
    }
    // Clock only records the hit in the use bit
    let mut pager = Pager::new(3, Clock::new(3));
    pager.run(&trace);
    assert_eq!(pager.policy().use_bits(), &[false, true, false]);
}

#[test]
fn frame_lookups() {
    let trace = [5, -1, 8];
    let mut pager = Pager::new(4, FirstInFirstOut::new(4));
    pager.run(&trace);
    let frame = pager.frame();
    assert!(frame.contains(-1));
    assert!(!frame.contains(0));
    assert_eq!(frame.index_of(8), Some(2));
    assert_eq!(frame.index_of(9), None);
    assert!(!frame.is_full());
    assert_eq!(frame.capacity(), 4);
}

#[test]
fn normal_sample_is_deterministic() {
    let mut source = FixedSequence::new(&[0.5, 0.0]);
    assert_eq!(normal_sample(&mut source, 10.0, 2.0), 12);
    let mut source = FixedSequence::new(&[0.5, 0.5]);
    assert_eq!(normal_sample(&mut source, 10.0, 2.0), 7);
}

#[test]
fn normal_sample_truncates_toward_zero() {
    // -2.35 truncates to -2, where flooring would give -3
    let mut source = FixedSequence::new(&[0.5, 0.5]);
    assert_eq!(normal_sample(&mut source, 0.0, 2.0), -2);
}

#[test]
fn normal_sample_redraws_zero() {
    let mut source = FixedSequence::new(&[0.0, 0.0, 0.5, 0.0]);
    assert_eq!(normal_sample(&mut source, 10.0, 2.0), 12);
    assert_eq!(source.drawn(), 4);
}

#[test]
fn trace_regions_shift_hot_spots() {
    let generator = TraceGenerator::new(1000, 10, 10, 10.0, 2.0);
    let mut source = FixedSequence::new(&[0.5, 0.0]);
    let trace = generator.generate(&mut source);
    assert_eq!(trace.len(), 1000);
    assert_eq!(source.drawn(), 2000);
    assert_eq!(trace[0], 12);
    assert_eq!(trace[99], 12);
    assert_eq!(trace[100], 22);
    assert_eq!(trace[999], 102);
}

#[test]
fn trace_region_index_uses_truncating_division() {
    // 15 / 10 = 1 reference per region, so the last references run past region 9
    let generator = TraceGenerator::new(15, 10, 10, 10.0, 2.0);
    let trace = generator.generate(&mut FixedSequence::new(&[0.5, 0.0]));
    assert_eq!(trace[14], 152);
}

#[test]
fn seeded_traces_stay_near_their_region() {
    let generator = TraceGenerator::new(1000, 10, 10, 10.0, 2.0);
    let trace = generator.generate(&mut SeededSource::new(7));
    for (j, page) in trace.iter().enumerate() {
        let centre = 10 * (j / 100) as i64 + 10;
        // Eight standard deviations
        assert!((page - centre).abs() <= 16, "reference {j} is {page}");
    }
}

#[test]
fn accumulator_average_truncates() {
    let mut accumulator = FaultAccumulator::new(4..=5);
    accumulator.add(PolicyKind::LeastRecentlyUsed, 4, 1999);
    accumulator.add(PolicyKind::FirstInFirstOut, 5, 999);
    accumulator.add(PolicyKind::Clock, 5, 1000);
    let result = accumulator.average(1000);
    assert_eq!(result.average(PolicyKind::LeastRecentlyUsed, 4), Some(1));
    assert_eq!(result.average(PolicyKind::FirstInFirstOut, 5), Some(0));
    assert_eq!(result.average(PolicyKind::Clock, 5), Some(1));
    assert_eq!(result.average(PolicyKind::Clock, 6), None);
}

#[test]
fn accumulator_merge_sums_cells() {
    let mut a = FaultAccumulator::new(4..=4);
    let mut b = FaultAccumulator::new(4..=4);
    a.add(PolicyKind::Clock, 4, 3);
    b.add(PolicyKind::Clock, 4, 4);
    b.add(PolicyKind::FirstInFirstOut, 4, 1);
    a.merge(&b);
    assert_eq!(a.sum(PolicyKind::Clock, 4), 7);
    assert_eq!(a.sum(PolicyKind::FirstInFirstOut, 4), 1);
    assert_eq!(a.sum(PolicyKind::LeastRecentlyUsed, 4), 0);
}

#[test]
fn simulate_with_fixed_randomness() {
    // Every sample is 12, so each region is a single page referenced twice
    let mut simulator = Simulator::new(&small_config());
    let result = simulator.simulate(&mut FixedSequence::new(&[0.5, 0.0]));
    assert_eq!(result.trials(), 3);
    let wss: Vec<_> = result.rows().iter().map(|row| row.wss).collect();
    assert_eq!(wss, vec![4, 5, 6]);
    for (wss, faults) in [(4, 6), (5, 5), (6, 4)] {
        for kind in PolicyKind::ALL {
            assert_eq!(result.average(kind, wss), Some(faults), "{kind:?} at {wss}");
        }
    }
}

#[test]
fn seeded_runs_are_reproducible() {
    let config = SimulationConfig {
        trials: 8,
        seed: Some(99),
        ..small_config()
    };
    let first = Simulator::new(&config).run().clone();
    let second = Simulator::new(&config).run().clone();
    assert_eq!(first, second);
    let sequential = Simulator::new(&config).simulate(&mut SeededSource::new(99)).clone();
    assert_eq!(first, sequential);
}

#[test]
fn parallel_runs_are_reproducible() {
    let config = SimulationConfig {
        trials: 10,
        trace_length: 200,
        ..SimulationConfig::default()
    };
    let first = Simulator::new(&config).simulate_parallel(5, 3).clone();
    let second = Simulator::new(&config).simulate_parallel(5, 3).clone();
    assert_eq!(first, second);
    let single = Simulator::new(&config).simulate_parallel(5, 1).clone();
    let sequential = Simulator::new(&config).simulate(&mut SeededSource::new(5)).clone();
    assert_eq!(single, sequential);
}

#[test]
fn more_workers_than_trials() {
    let config = SimulationConfig {
        trials: 2,
        ..small_config()
    };
    let result = Simulator::new(&config).simulate_parallel(1, 8).clone();
    assert_eq!(result.rows().len(), 3);
    assert!(result.rows().iter().all(|row| row.lru <= 20 && row.fifo <= 20 && row.clock <= 20));
}

#[test]
fn timestamp_strategy_matches_rescan() {
    let config = SimulationConfig {
        trials: 20,
        trace_length: 300,
        seed: Some(3),
        ..SimulationConfig::default()
    };
    let rescan = Simulator::new(&config).run().clone();
    let timestamp = Simulator::new(&SimulationConfig {
        lru_strategy: LruStrategy::Timestamp,
        ..config
    }).run().clone();
    assert_eq!(rescan, timestamp);
}

#[test]
fn averaged_faults_fall_as_working_set_grows() {
    let config = SimulationConfig {
        trials: 100,
        seed: Some(42),
        ..SimulationConfig::default()
    };
    let mut simulator = Simulator::new(&config);
    let result = simulator.run();
    // Single trials can go up with wss, so allow some slack on the averages
    let tolerance = config.trace_length as u64 / 50;
    for kind in PolicyKind::ALL {
        for wss in config.wss_lower..config.wss_upper {
            let smaller = result.average(kind, wss).unwrap();
            let larger = result.average(kind, wss + 1).unwrap();
            assert!(larger <= smaller + tolerance, "{kind:?}: {smaller} at {wss}, {larger} at {}", wss + 1);
        }
        let first = result.average(kind, config.wss_lower).unwrap();
        let last = result.average(kind, config.wss_upper).unwrap();
        assert!(first > last, "{kind:?}: {first} at the lower bound, {last} at the upper bound");
        assert!(first <= config.trace_length as u64);
    }
    assert!(simulator.get_execution_time().as_nanos() > 0);
}

#[test]
fn empty_config_uses_defaults() -> Result<(), Box<dyn Error>> {
    let config = SimulationConfig::from_reader("{}".as_bytes())?;
    assert_eq!(config, SimulationConfig::default());
    assert_eq!(config.trials, 1000);
    assert_eq!(config.trace_length, 1000);
    assert_eq!(config.working_set_sizes(), 4..=20);
    Ok(())
}

#[test]
fn config_fields_are_independent() -> Result<(), Box<dyn Error>> {
    let config = SimulationConfig::from_reader(r#"{"trials": 5, "trace_length": 250, "lru_strategy": "timestamp", "seed": 11}"#.as_bytes())?;
    assert_eq!(config.trials, 5);
    assert_eq!(config.trace_length, 250);
    assert_eq!(config.lru_strategy, LruStrategy::Timestamp);
    assert_eq!(config.seed, Some(11));
    assert_eq!(config.wss_upper, 20);
    Ok(())
}

#[test]
fn invalid_configs_are_rejected() {
    let cases = [
        r#"{"trials": 0}"#,
        r#"{"wss_lower": 0}"#,
        r#"{"wss_lower": 8, "wss_upper": 7}"#,
        r#"{"trace_length": 9}"#,
        r#"{"regions": 0}"#,
        r#"{"std_dev": -1.0}"#,
        r#"{"threads": 0}"#,
    ];
    for case in cases {
        match SimulationConfig::from_reader(case.as_bytes()) {
            Err(crate::Error::InvalidConfig(_)) => {}
            other => panic!("{case} gave {other:?}"),
        }
    }
    assert!(matches!(
        SimulationConfig::from_reader(r#"{"trails": 10}"#.as_bytes()),
        Err(crate::Error::ConfigParse(_))
    ));
}

#[test]
fn results_table_format() -> Result<(), Box<dyn Error>> {
    let mut simulator = Simulator::new(&small_config());
    let result = simulator.simulate(&mut FixedSequence::new(&[0.5, 0.0]));
    let mut out = Vec::new();
    write_table(result, &mut out)?;
    assert_eq!(String::from_utf8(out)?, "wss,LRU,FIFO,Clock\n4,6,6,6\n5,5,5,5\n6,4,4,4\n");
    Ok(())
}

#[test]
fn csv_sink_names_file_after_start_time() -> Result<(), Box<dyn Error>> {
    let dir = tempfile::tempdir()?;
    let started = NaiveDate::from_ymd_opt(2021, 11, 19)
        .and_then(|d| d.and_hms_opt(8, 5, 3))
        .ok_or("bad date")?;
    assert_eq!(file_name_for(&started), "faults_11-19-2021_08:05:03.csv");
    let mut simulator = Simulator::new(&small_config());
    let result = simulator.simulate(&mut FixedSequence::new(&[0.5, 0.0]));
    let mut sink = CsvFileSink::new(dir.path(), &started);
    sink.write_results(result)?;
    let written = fs::read_to_string(sink.path())?;
    assert!(written.starts_with("wss,LRU,FIFO,Clock\n4,6,6,6\n"));

    let found = find_result_files(dir.path())?;
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].started, started);
    Ok(())
}

#[test]
fn csv_sink_reports_unwritable_destination() -> Result<(), Box<dyn Error>> {
    let dir = tempfile::tempdir()?;
    let missing = dir.path().join("does-not-exist");
    let started = NaiveDate::from_ymd_opt(2021, 11, 19)
        .and_then(|d| d.and_hms_opt(8, 5, 3))
        .ok_or("bad date")?;
    let mut sink = CsvFileSink::new(&missing, &started);
    let err = sink.write_results(Simulator::new(&small_config()).result()).unwrap_err();
    assert!(err.is_output_failure());
    assert!(err.to_string().starts_with("Failed to create file"));
    Ok(())
}

#[test]
fn result_files_are_found_oldest_first() -> Result<(), Box<dyn Error>> {
    let dir = tempfile::tempdir()?;
    for name in ["faults_01-02-2022_00:00:00.csv", "faults_12-31-2021_23:59:59.csv", "notes.csv", "faults_latest.csv"] {
        fs::write(dir.path().join(name), "")?;
    }
    let found = find_result_files(dir.path())?;
    let names: Vec<_> = found
        .iter()
        .filter_map(|f| f.path.file_name().and_then(|n| n.to_str()).map(String::from))
        .collect();
    assert_eq!(names, vec!["faults_12-31-2021_23:59:59.csv", "faults_01-02-2022_00:00:00.csv"]);
    assert_eq!(parse_result_file_name("faults_13-40-2021_00:00:00.csv"), None);
    Ok(())
}
