//! Rendering of results: chart series, CSV tables and JSON files.

use std::fs::File;
use std::io;
use std::io::BufWriter;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::config::AppConfigExt;
use crate::experiment::{ExperimentResult, Sweep, SweepResults};
use crate::stats::Snapshot;
use crate::utils::prelude::*;

/// One point of a chart: average sojourn time for a population size
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: usize,
    pub y: f64,
    pub std: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Series {
    pub name: String,
    pub data: Vec<Point>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chart {
    pub series: Vec<Series>,
}

fn series(results: &SweepResults, key: &str, name: String) -> Result<Series> {
    let runs = results
        .get(key)
        .ok_or_else(|| Error::MissingGroup(key.to_owned()))?;
    let data = runs
        .iter()
        .map(|r| Point {
            x: r.num_processes,
            y: r.average_time,
            std: r.standard_deviation,
        })
        .collect();
    Ok(Series { name, data })
}

/// Average time per population size, one series per arrival interval
pub fn interval_series(sweep: &Sweep, results: &SweepResults) -> Result<Chart> {
    let series = sweep
        .arrival_intervals
        .iter()
        .map(|&interval| series(results, &Sweep::interval_key(interval), format!("Interval {}", interval)))
        .collect::<Result<_>>()?;
    Ok(Chart { series })
}

/// The baseline interval against each alternate strategy
pub fn strategy_series(sweep: &Sweep, results: &SweepResults) -> Result<Chart> {
    let base = &sweep.base;
    let baseline = series(
        results,
        &Sweep::interval_key(base.arrival_interval),
        format!(
            "Normal (RAM={}, CPU={}, CPUs={})",
            base.ram_capacity, base.instructions_per_unit, base.cpu_count
        ),
    )?;

    let mut all = vec![baseline];
    for strategy in &sweep.strategies {
        all.push(series(results, &strategy.to_string(), strategy.title(base)?)?);
    }
    Ok(Chart { series: all })
}

#[derive(Serialize)]
struct SweepRow<'a> {
    group: &'a str,
    num_processes: usize,
    average_time: f64,
    standard_deviation: f64,
    completed: usize,
    outcome: String,
    end_time: f64,
}

/// One line per run, grouped as in the results
pub fn write_sweep_csv(results: &SweepResults, writer: impl io::Write) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    for (group, runs) in results {
        for run in runs {
            wtr.serialize(SweepRow {
                group,
                num_processes: run.num_processes,
                average_time: run.average_time,
                standard_deviation: run.standard_deviation,
                completed: run.completed(),
                outcome: run.outcome.to_string(),
                end_time: run.end_time.0,
            })?;
        }
    }
    wtr.flush()?;
    Ok(())
}

#[derive(Serialize)]
struct TraceRow {
    time: f64,
    memory_level: u32,
    new: usize,
    ready: usize,
    running: usize,
    waiting: usize,
    terminated: usize,
}

impl From<&Snapshot> for TraceRow {
    fn from(s: &Snapshot) -> Self {
        let c = &s.states_count;
        Self {
            time: s.time.0,
            memory_level: s.memory_level,
            new: c.new,
            ready: c.ready,
            running: c.running,
            waiting: c.waiting,
            terminated: c.terminated,
        }
    }
}

pub fn write_trace_csv<'a>(trace: impl IntoIterator<Item = &'a Snapshot>, writer: impl io::Write) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    for snapshot in trace {
        wtr.serialize(TraceRow::from(snapshot))?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn write_json(value: &impl Serialize, mut writer: impl io::Write) -> Result<()> {
    serde_json::to_writer_pretty(&mut writer, value)?;
    writer.write_all(b"\n")?;
    Ok(())
}

fn create(name: &str) -> Result<(PathBuf, BufWriter<File>)> {
    let path = config().output_dir()?.file(name)?;
    let file = BufWriter::new(File::create(&path)?);
    Ok((path, file))
}

/// Write `result.json` and, when traced, `trace.csv` to the output directory
pub fn save_run(result: &ExperimentResult) -> Result<Vec<PathBuf>> {
    let mut written = vec![];

    let (path, file) = create("result.json")?;
    write_json(result, file)?;
    written.push(path);

    if let Some(trace) = &result.time_series_data {
        let (path, file) = create("trace.csv")?;
        write_trace_csv(trace, file)?;
        written.push(path);
    }

    for path in &written {
        info!(path = %path.display(), "saved");
    }
    Ok(written)
}

/// Write the raw results, a flat table, and both charts to the output directory
pub fn save_sweep(sweep: &Sweep, results: &SweepResults) -> Result<Vec<PathBuf>> {
    let mut written = vec![];

    let (path, file) = create("sweep.json")?;
    write_json(results, file)?;
    written.push(path);

    let (path, file) = create("sweep.csv")?;
    write_sweep_csv(results, file)?;
    written.push(path);

    let (path, file) = create("intervals.json")?;
    write_json(&interval_series(sweep, results)?, file)?;
    written.push(path);

    let (path, file) = create("strategies.json")?;
    write_json(&strategy_series(sweep, results)?, file)?;
    written.push(path);

    for path in &written {
        info!(path = %path.display(), "saved");
    }
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::experiment::{run_experiment, ExperimentConfig};

    fn small_sweep() -> Sweep {
        Sweep::new(ExperimentConfig::default(), vec![3, 6], vec![10.0, 1.0])
    }

    #[test]
    fn charts_follow_the_sweep() {
        let sweep = small_sweep();
        let results = sweep.run().unwrap();

        let intervals = interval_series(&sweep, &results).unwrap();
        let names: Vec<_> = intervals.series.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["Interval 10", "Interval 1"]);
        let xs: Vec<_> = intervals.series[0].data.iter().map(|p| p.x).collect();
        assert_eq!(xs, vec![3, 6]);

        let strategies = strategy_series(&sweep, &results).unwrap();
        let names: Vec<_> = strategies.series.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["Normal (RAM=100, CPU=3, CPUs=1)", "RAM=200", "Fast CPU (6 inst)", "2 CPUs"]
        );
        assert_eq!(strategies.series[0].data, intervals.series[0].data);
    }

    #[test]
    fn missing_group_is_reported() {
        let sweep = small_sweep();
        let mut results = sweep.run().unwrap();
        results.remove("fast_cpu");

        assert!(interval_series(&sweep, &results).is_ok());
        match strategy_series(&sweep, &results) {
            Err(Error::MissingGroup(group)) => assert_eq!(group, "fast_cpu"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn sweep_csv_has_one_row_per_run() {
        let results = small_sweep().run().unwrap();
        let mut buf = vec![];
        write_sweep_csv(&results, &mut buf).unwrap();

        let text = String::from_utf8(buf).unwrap();
        let mut lines = text.lines();
        assert_eq!(
            lines.next(),
            Some("group,num_processes,average_time,standard_deviation,completed,outcome,end_time")
        );
        assert_eq!(lines.count(), 5 * 2);
    }

    #[test]
    fn trace_csv_flattens_counts() {
        let cfg = ExperimentConfig {
            process_count: 2,
            include_trace: true,
            ..Default::default()
        };
        let result = run_experiment(&cfg).unwrap();
        let trace = result.time_series_data.unwrap();

        let mut buf = vec![];
        write_trace_csv(&trace, &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines[0], "time,memory_level,new,ready,running,waiting,terminated");
        assert_eq!(lines.len(), trace.len() + 1);
        assert!(lines.last().unwrap().ends_with(",100,0,0,0,0,2"));
    }
}
