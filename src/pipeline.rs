use super::grouper::{group_by_series, SeriesGroup, SeriesTags};
use super::highlight::{match_highlights, HighlightOutcome, ResolvedHighlight, SkippedHighlight};
use super::parser::{parse_lines, ParserOptions};
use super::render::{ChartRequest, Renderer};
use super::window::{resolve_window, SeriesWindow, TimeWindow};
use super::{GrapherError, Result, DEFAULT_SKIP_LINES, TIME_FMT};
use chrono::NaiveTime;
use chrono_tz::Tz;
use std::path::PathBuf;
use tracing::info;

/// Validated settings of one run.
#[derive(Debug, Clone)]
pub struct GrapherConfig {
    pub csv_file: PathBuf,
    pub highlights: Vec<NaiveTime>,
    pub min: Option<NaiveTime>,
    pub max: Option<NaiveTime>,
    pub title: bool,
    pub outdir: PathBuf,
    pub dry_run: bool,
    pub timezone: Tz,
    pub skip_lines: usize,
    pub verbose: bool,
}

impl GrapherConfig {
    pub fn new(csv_file: PathBuf) -> GrapherConfig {
        GrapherConfig {
            csv_file,
            highlights: Vec::new(),
            min: None,
            max: None,
            title: false,
            outdir: PathBuf::from("."),
            dry_run: false,
            timezone: Tz::Europe__Rome,
            skip_lines: DEFAULT_SKIP_LINES,
            verbose: false,
        }
    }

    pub fn parser_options(&self) -> ParserOptions {
        ParserOptions {
            skip_lines: self.skip_lines,
            timezone: self.timezone,
        }
    }
}

/// What happened to one series.
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesReport {
    pub series_id: i64,
    pub tags: SeriesTags,
    pub window: TimeWindow,
    pub points: usize,
    pub highlights: Vec<ResolvedHighlight>,
    pub skipped: Vec<SkippedHighlight>,
    pub output: Option<PathBuf>,
}

/// Window and highlights of one series, independent of every other series.
pub fn process_series(
    group: &SeriesGroup,
    config: &GrapherConfig,
) -> (SeriesWindow, HighlightOutcome) {
    let resolved = resolve_window(group, config.min, config.max);
    let outcome = match_highlights(
        &resolved.points,
        group.anchor_date(),
        &group.timezone(),
        &config.highlights,
    );
    (resolved, outcome)
}

/// Creates the output dir, including missing parents, unless dry run.
pub fn prepare_outdir(config: &GrapherConfig) -> Result<()> {
    if config.dry_run || config.outdir.is_dir() {
        return Ok(());
    }
    info!("creating output dir '{}'", config.outdir.display());
    std::fs::create_dir_all(&config.outdir).map_err(|source| GrapherError::OutputWrite {
        path: config.outdir.clone(),
        source,
    })
}

/// Parses the export and hands every series to the renderer, in first-appearance order.
/// Parsing completes before any chart is drawn; the first error aborts the run.
pub fn run<S: AsRef<str>, R: Renderer>(
    config: &GrapherConfig,
    lines: &[S],
    renderer: &mut R,
) -> Result<Vec<SeriesReport>> {
    if config.dry_run {
        info!("performing dry run");
    }
    let labels: Vec<String> = config
        .highlights
        .iter()
        .map(|t| t.format(TIME_FMT).to_string())
        .collect();
    info!("using time highlights: [{}]", labels.join(", "));
    prepare_outdir(config)?;

    let records = parse_lines(lines, config.parser_options())?;
    let groups = group_by_series(records);

    let mut reports = Vec::with_capacity(groups.len());
    for group in &groups {
        let tags = group.tags();
        info!("producing plot '{} {} {} - {}'", tags.room, tags.location, tags.host, tags.field);
        let (resolved, outcome) = process_series(group, config);
        let output = renderer.render(&ChartRequest {
            series_id: group.series_id(),
            tags: &tags,
            window: &resolved.window,
            points: &resolved.points,
            highlights: &outcome.resolved,
            dry_run: config.dry_run,
        })?;
        reports.push(SeriesReport {
            series_id: group.series_id(),
            tags,
            window: resolved.window,
            points: resolved.points.len(),
            highlights: outcome.resolved,
            skipped: outcome.skipped,
            output,
        });
    }
    Ok(reports)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::highlight::SkipReason;
    use crate::render::SvgRenderer;
    use crate::window::parse_time_of_day;
    use chrono::prelude::*;

    const HEADER: &str = ",result,table,_start,_stop,_time,_value,_field,_measurement,host,location,room";

    /// Keeps what it was asked to draw.
    #[derive(Default)]
    struct RecordingRenderer {
        charts: Vec<(i64, Vec<(DateTime<Tz>, f64)>, Vec<ResolvedHighlight>, bool)>,
    }

    impl Renderer for RecordingRenderer {
        fn render(&mut self, chart: &ChartRequest<'_>) -> Result<Option<PathBuf>> {
            self.charts.push((
                chart.series_id,
                chart.points.to_vec(),
                chart.highlights.to_vec(),
                chart.dry_run,
            ));
            Ok(None)
        }
    }

    fn row(table: i64, time: &str, value: f64, field: &str) -> String {
        format!(
            ",_result,{},2021-06-01T00:00:00Z,2021-06-02T00:00:00Z,{},{},{},sensors,pi,home,office",
            table, time, value, field
        )
    }

    fn header_block() -> Vec<String> {
        vec![
            "#datatype,string,long".to_string(),
            "#default,_result,,".to_string(),
            HEADER.to_string(),
        ]
    }

    fn scenario_a() -> Vec<String> {
        let mut lines = header_block();
        lines.push(row(0, "2021-06-01T06:00:00Z", 1.0, "temperature"));
        lines.push(row(0, "2021-06-01T10:00:00Z", 2.0, "temperature"));
        lines.push(row(0, "2021-06-01T14:00:00Z", 3.0, "temperature"));
        lines.push(String::new());
        lines
    }

    fn rome(time: &str) -> DateTime<Tz> {
        DateTime::parse_from_rfc3339(time)
            .unwrap()
            .with_timezone(&Tz::Europe__Rome)
    }

    fn dry_config() -> GrapherConfig {
        let mut config = GrapherConfig::new(PathBuf::from("export.csv"));
        config.dry_run = true;
        config
    }

    fn hm(s: &str) -> NaiveTime {
        parse_time_of_day(s).unwrap()
    }

    #[test]
    fn test_scenario_a_whole_series() {
        let mut renderer = RecordingRenderer::default();
        let reports = run(&dry_config(), &scenario_a(), &mut renderer).unwrap();
        assert_eq!(reports.len(), 1);
        let report = &reports[0];
        assert_eq!(report.points, 3);
        assert_eq!(report.window.start, rome("2021-06-01T08:00:00+02:00"));
        assert_eq!(report.window.end, rome("2021-06-01T16:00:00+02:00"));
        assert!(report.highlights.is_empty());
        assert!(report.skipped.is_empty());
        assert_eq!(report.output, None);

        let (id, points, highlights, dry_run) = &renderer.charts[0];
        assert_eq!(*id, 0);
        let values: Vec<f64> = points.iter().map(|p| p.1).collect();
        assert_eq!(values, vec![1.0, 2.0, 3.0]);
        assert!(highlights.is_empty());
        assert!(*dry_run);
    }

    #[test]
    fn test_scenario_b_highlight_near_sample() {
        let mut config = dry_config();
        config.highlights = vec![hm("12:05")];
        let mut renderer = RecordingRenderer::default();
        let reports = run(&config, &scenario_a(), &mut renderer).unwrap();
        assert_eq!(
            reports[0].highlights,
            vec![ResolvedHighlight {
                index: 1,
                label: "12:05".to_string()
            }]
        );
        assert_eq!(renderer.charts[0].2, reports[0].highlights);
    }

    #[test]
    fn test_scenario_c_highlight_too_far() {
        let mut config = dry_config();
        config.highlights = vec![hm("20:00")];
        let mut renderer = RecordingRenderer::default();
        let reports = run(&config, &scenario_a(), &mut renderer).unwrap();
        assert!(reports[0].highlights.is_empty());
        assert_eq!(reports[0].skipped.len(), 1);
        assert_eq!(reports[0].skipped[0].label, "20:00");
    }

    #[test]
    fn test_scenario_d_explicit_window() {
        let mut config = dry_config();
        config.min = Some(hm("09:00"));
        config.max = Some(hm("13:00"));
        let mut renderer = RecordingRenderer::default();
        let reports = run(&config, &scenario_a(), &mut renderer).unwrap();
        assert_eq!(reports[0].points, 1);
        let points = &renderer.charts[0].1;
        assert_eq!(points[0], (rome("2021-06-01T12:00:00+02:00"), 2.0));
    }

    #[test]
    fn test_scenario_e_two_blocks_interleaved() {
        let mut lines = header_block();
        lines.push(row(5, "2021-06-01T06:00:00Z", 1.0, "temperature"));
        lines.push(row(5, "2021-06-01T07:00:00Z", 2.0, "temperature"));
        lines.push(String::new());
        lines.extend(header_block());
        lines.push(row(1, "2021-06-01T06:00:00Z", 40.0, "humidity"));
        lines.push(String::new());
        lines.extend(header_block());
        lines.push(row(5, "2021-06-01T08:00:00Z", 3.0, "temperature"));

        let mut renderer = RecordingRenderer::default();
        let reports = run(&dry_config(), &lines, &mut renderer).unwrap();
        let ids: Vec<i64> = reports.iter().map(|r| r.series_id).collect();
        assert_eq!(ids, vec![5, 1]);
        assert_eq!(reports[0].points, 3);
        assert_eq!(reports[0].tags.field, "temperature");
        assert_eq!(reports[1].points, 1);
        assert_eq!(reports[1].tags.field, "humidity");
        let values: Vec<f64> = renderer.charts[0].1.iter().map(|p| p.1).collect();
        assert_eq!(values, vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_highlight_on_emptied_series_is_skipped() {
        let mut config = dry_config();
        config.min = Some(hm("17:00"));
        config.highlights = vec![hm("12:00")];
        let mut renderer = RecordingRenderer::default();
        let reports = run(&config, &scenario_a(), &mut renderer).unwrap();
        assert_eq!(reports[0].points, 0);
        assert_eq!(reports[0].skipped[0].reason, SkipReason::EmptySeries);
    }

    #[test]
    fn test_parse_error_aborts_before_rendering() {
        let mut lines = scenario_a();
        lines.push(row(0, "not-a-time", 4.0, "temperature"));
        let mut renderer = RecordingRenderer::default();
        match run(&dry_config(), &lines, &mut renderer) {
            Err(GrapherError::Parse { line, .. }) => assert_eq!(line, 8),
            other => panic!("unexpected result {:?}", other),
        }
        assert!(renderer.charts.is_empty());
    }

    #[test]
    fn test_run_creates_outdir_and_writes_svg() {
        let tmp = tempfile::TempDir::new().expect("tempdir");
        let outdir = tmp.path().join("charts").join("daily");
        let mut config = GrapherConfig::new(PathBuf::from("export.csv"));
        config.outdir = outdir.clone();
        config.highlights = vec![hm("12:00")];
        let mut renderer = SvgRenderer::new(&config.outdir, config.title);
        let reports = run(&config, &scenario_a(), &mut renderer).unwrap();
        let expected = outdir.join("temperature_pi_office_home.svg");
        assert_eq!(reports[0].output, Some(expected.clone()));
        assert!(expected.is_file());
    }

    #[test]
    fn test_dry_run_creates_nothing() {
        let tmp = tempfile::TempDir::new().expect("tempdir");
        let mut config = dry_config();
        config.outdir = tmp.path().join("charts");
        let mut renderer = SvgRenderer::new(&config.outdir, false);
        run(&config, &scenario_a(), &mut renderer).unwrap();
        assert!(!config.outdir.exists());
    }

    #[test]
    fn test_outdir_failure() {
        let tmp = tempfile::TempDir::new().expect("tempdir");
        let blocker = tmp.path().join("file");
        std::fs::write(&blocker, "x").unwrap();
        let mut config = GrapherConfig::new(PathBuf::from("export.csv"));
        config.outdir = blocker.join("charts");
        match prepare_outdir(&config) {
            Err(GrapherError::OutputWrite { path, .. }) => assert_eq!(path, config.outdir),
            other => panic!("unexpected result {:?}", other),
        }
    }
}
