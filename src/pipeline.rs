//! # Pipeline Driver
//!
//! Runs one subsetting or regridding job: discovery, run-level checks, then one dataset
//! unit at a time through read → crop → (resample) → plan → write.
//!
//! ```text
//! Discovering → Selecting → Resampling ⇄ Writing → Done
//!        \            \           \          \
//!         `------------`-----------`----------`→ Failed
//! ```
//!
//! Nothing is read before every run-level check has passed, and nothing is written
//! before the first unit is fully processed. Units never overlap: memory holds at most
//! one unit, one pending output unit and the open temporal buckets.
//!
//! A time-series run reduces every step or bucket to area means and writes a single
//! table once all units are done.

use crate::error::{ProcessError, ProcessResult};
use crate::extract::{DatasetReader, DatasetUnit, ReadWindow, UnitData};
use crate::filters::{GridFilter, SpatialFilter};
use crate::input::{Job, Operation};
use crate::output::{DatasetWriter, OutputFormat, OutputPlanner, OutputUnit, SeriesTable};
use crate::resample::{AggregatedBucket, TemporalAccumulator, area_means, resample_spatial};
use crate::temporal::{check_cadence, select_units, source_cadence, step_window};
use crate::variables::{check_variables, data_variables};
use chrono::NaiveDate;
use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, info};
use serde::Serialize;
use std::collections::HashSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PipelineState {
    Discovering,
    Selecting,
    Resampling,
    Writing,
    Done,
    Failed,
}

/// What a finished run did
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RunSummary {
    pub units_discovered: usize,
    pub units_selected: usize,
    /// Selected units left out because the box or the dates miss them
    pub units_skipped: usize,
    pub outputs: Vec<String>,
    pub buckets_omitted: usize,
    /// Most temporal buckets held in memory at the same time
    pub peak_open_buckets: usize,
}

/// One unit that survived selection, with what to read from it
#[derive(Debug)]
struct UnitPlan<'u> {
    unit: &'u DatasetUnit,
    window: ReadWindow,
    variables: Vec<String>,
}

impl UnitPlan<'_> {
    fn dates(&self) -> &[NaiveDate] {
        &self.unit.steps[self.window.time.clone()]
    }
}

pub struct Pipeline<'a, R: DatasetReader, W: DatasetWriter> {
    job: &'a Job,
    reader: &'a R,
    writer: &'a W,
    state: PipelineState,
    progress: ProgressBar,
    planner: OutputPlanner,
    /// Present when the run writes an area-mean series instead of grids
    series: Option<SeriesTable>,
    summary: RunSummary,
}

impl<'a, R: DatasetReader, W: DatasetWriter> Pipeline<'a, R, W> {
    pub fn new(job: &'a Job, reader: &'a R, writer: &'a W) -> Self {
        Pipeline {
            job,
            reader,
            writer,
            state: PipelineState::Discovering,
            progress: ProgressBar::hidden(),
            planner: OutputPlanner::new(job.pattern.clone(), job.format, job.window.variables.clone()),
            series: job
                .target
                .as_ref()
                .filter(|t| t.time_series)
                .map(|_| SeriesTable::new(job.window.variables.clone())),
            summary: RunSummary::default(),
        }
    }

    /// Shows a progress bar over the selected units.
    pub fn with_progress(mut self, show: bool) -> Self {
        if show {
            let progress = ProgressBar::new(0);
            if let Ok(style) = ProgressStyle::with_template("{prefix} {msg} {wide_bar} [{human_pos}/{human_len}]") {
                progress.set_style(style);
            }
            progress.set_prefix(self.job.operation.to_string());
            self.progress = progress;
        }
        self
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    fn enter(&mut self, state: PipelineState) {
        if self.state != state {
            debug!("Pipeline state: {:?} -> {:?}", self.state, state);
            self.state = state;
        }
    }

    /// Runs the job to completion, leaving the pipeline in `Done` or `Failed`.
    pub async fn run(&mut self) -> ProcessResult<RunSummary> {
        let result = self.drive().await;
        self.progress.finish_and_clear();
        match result {
            Ok(()) => {
                self.enter(PipelineState::Done);
                Ok(std::mem::take(&mut self.summary))
            }
            Err(e) => {
                self.enter(PipelineState::Failed);
                Err(e)
            }
        }
    }

    async fn drive(&mut self) -> ProcessResult<()> {
        let job = self.job;
        let dims = &job.dims;

        self.enter(PipelineState::Discovering);
        let units = self.reader.discover(&job.in_path, &job.window.dates)?;
        self.summary.units_discovered = units.len();
        info!("Discovered {} dataset units in {}", units.len(), job.in_path);

        self.enter(PipelineState::Selecting);
        let selected = select_units(&units, &job.window.dates);
        self.summary.units_selected = selected.len();
        if selected.is_empty() {
            return Err(ProcessError::EmptyResult);
        }
        check_variables(&job.window.variables, selected.iter().copied(), dims)?;

        let filter = SpatialFilter::new(job.window.bbox);
        let mut plans = Vec::new();
        for unit in selected {
            let Some(time) = step_window(&unit.steps, &job.window.dates) else {
                info!("Skipping {}: no time step in range", unit.name());
                continue;
            };
            let Some(space) = filter.apply(&unit.grid) else {
                info!("Skipping {}: grid does not intersect the bounding box", unit.name());
                continue;
            };
            let variables = data_variables(&job.window.variables, unit, dims);
            if variables.is_empty() {
                info!("Skipping {}: none of the requested variables", unit.name());
                continue;
            }
            plans.push(UnitPlan {
                unit,
                window: ReadWindow { time, space },
                variables,
            });
        }
        self.summary.units_skipped = self.summary.units_selected - plans.len();
        if plans.is_empty() {
            return Err(ProcessError::EmptyResult);
        }

        let temporal = job.target.as_ref().and_then(|t| t.temporal);
        if let Some(resolution) = &temporal {
            let cadence = source_cadence(plans.iter().flat_map(|p| p.dates().iter().copied()));
            check_cadence(resolution, cadence)?;
        }

        self.progress.set_length(plans.len() as u64);
        let mut accumulator = temporal.map(TemporalAccumulator::new);
        let mut emitted: HashSet<NaiveDate> = HashSet::new();

        for plan in &plans {
            self.enter(PipelineState::Resampling);
            self.progress.set_message(plan.unit.stem());
            debug!("Reading {} {:?}", plan.unit.name(), plan.window);
            let mut data = self.reader.read(plan.unit, &plan.variables, &plan.window)?;

            if let Some(step) = job.target.as_ref().and_then(|t| t.spatial) {
                data = resample_spatial(&data, &job.window.bbox, step)?;
            }

            match accumulator.as_mut() {
                Some(acc) => {
                    let first = plan.dates().first().copied().unwrap_or(plan.unit.coverage().0);
                    let ready = acc.flush_before(first);
                    acc.add(&data)?;
                    self.summary.peak_open_buckets = self.summary.peak_open_buckets.max(acc.open_buckets());
                    for bucket in ready {
                        emitted.insert(bucket.bucket.start);
                        self.emit_bucket(bucket).await?;
                    }
                }
                None => self.emit_unit(plan.unit, data).await?,
            }
            self.progress.inc(1);
        }

        if let Some(acc) = accumulator {
            for bucket in acc.finish() {
                emitted.insert(bucket.bucket.start);
                self.emit_bucket(bucket).await?;
            }
        }
        if let Some(resolution) = &temporal {
            for bucket in resolution.buckets_in(&job.window.dates) {
                if !emitted.contains(&bucket.start) {
                    info!("No source step in {}..{}; bucket omitted", bucket.start, bucket.end);
                    self.summary.buckets_omitted += 1;
                }
            }
        }

        if let Some(last) = self.planner.finish() {
            self.write(last).await?;
        }
        if let Some(series) = self.series.take() {
            self.write_series(series).await?;
        }
        Ok(())
    }

    async fn emit_unit(&mut self, unit: &DatasetUnit, data: UnitData) -> ProcessResult<()> {
        let job = self.job;
        if let Some(series) = self.series.as_mut() {
            for (step, date) in data.steps.iter().enumerate() {
                series.add_row(*date, area_means(&data, step))?;
            }
            return Ok(());
        }
        let date = data.steps.first().copied().unwrap_or(unit.coverage().0);
        let filename = (job.operation == Operation::Subset).then(|| unit.stem());
        let name = self.planner.name_for(date, filename.as_deref());
        let mut output = OutputUnit::from_data(name, job.format, data, None);
        if job.operation == Operation::Regrid {
            output = output.with_history(self.history());
        }
        self.plan(output).await
    }

    async fn emit_bucket(&mut self, aggregated: AggregatedBucket) -> ProcessResult<()> {
        if let Some(series) = self.series.as_mut() {
            return series.add_row(aggregated.bucket.mid(), area_means(&aggregated.data, 0));
        }
        let name = self.planner.name_for(aggregated.bucket.start, None);
        let output = OutputUnit::from_data(name, self.job.format, aggregated.data, Some(vec![aggregated.bucket]))
            .with_history(self.history());
        self.plan(output).await
    }

    async fn plan(&mut self, output: OutputUnit) -> ProcessResult<()> {
        if let Some(ready) = self.planner.plan(output)? {
            self.write(ready).await?;
        }
        Ok(())
    }

    async fn write(&mut self, output: OutputUnit) -> ProcessResult<()> {
        self.enter(PipelineState::Writing);
        let names = output.file_names();
        self.writer.write(output).await?;
        self.summary.outputs.extend(names);
        Ok(())
    }

    async fn write_series(&mut self, mut series: SeriesTable) -> ProcessResult<()> {
        let Some(first) = series.first_date() else {
            return Ok(());
        };
        series.name = self.job.pattern.bind(first, &self.job.window.variables, None, OutputFormat::Csv);
        self.enter(PipelineState::Writing);
        let name = series.name.clone();
        self.writer.write_series(series).await?;
        self.summary.outputs.push(name);
        Ok(())
    }

    fn history(&self) -> String {
        let target = self.job.target.as_ref();
        let spatial = target
            .and_then(|t| t.spatial)
            .map(|s| format!(" --spatial-resolution {s}"))
            .unwrap_or_default();
        let temporal = target
            .and_then(|t| t.temporal)
            .map(|t| format!(" --temporal-resolution {t}"))
            .unwrap_or_default();
        format!(
            "gridslice {} regrid --variables {}{}{}",
            env!("CARGO_PKG_VERSION"),
            self.job.window.variables.join(","),
            spatial,
            temporal
        )
    }
}

/// Runs `job` with the given capabilities.
pub async fn run<R: DatasetReader, W: DatasetWriter>(
    job: &Job,
    reader: &R,
    writer: &W,
    show_progress: bool,
) -> ProcessResult<RunSummary> {
    let mut pipeline = Pipeline::new(job, reader, writer).with_progress(show_progress);
    pipeline.run().await
}
