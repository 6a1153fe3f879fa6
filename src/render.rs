use super::grouper::SeriesTags;
use super::highlight::ResolvedHighlight;
use super::window::TimeWindow;
use super::{min_and_max, suitable_xfmt, GrapherError, Result, TIME_FMT};
use chrono::prelude::*;
use chrono_tz::Tz;
use plotters::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Everything needed to draw the chart of one series.
#[derive(Debug, Clone)]
pub struct ChartRequest<'a> {
    pub series_id: i64,
    pub tags: &'a SeriesTags,
    pub window: &'a TimeWindow,
    pub points: &'a [(DateTime<Tz>, f64)],
    pub highlights: &'a [ResolvedHighlight],
    pub dry_run: bool,
}

/// Consumer of the per-series pipeline output.
pub trait Renderer {
    /// Returns the path of the written chart, None if nothing was written.
    fn render(&mut self, chart: &ChartRequest<'_>) -> Result<Option<PathBuf>>;
}

/// Draws line charts as svg files named after the series tags.
#[derive(Debug, Clone)]
pub struct SvgRenderer {
    outdir: PathBuf,
    title: bool,
}

impl SvgRenderer {
    pub fn new(outdir: &Path, title: bool) -> SvgRenderer {
        SvgRenderer {
            outdir: outdir.to_path_buf(),
            title,
        }
    }

    pub fn chart_path(&self, tags: &SeriesTags) -> PathBuf {
        self.outdir.join(format!("{}.svg", tags.file_stem()))
    }
}

impl Renderer for SvgRenderer {
    fn render(&mut self, chart: &ChartRequest<'_>) -> Result<Option<PathBuf>> {
        if chart.points.is_empty() {
            warn!(
                "series {} '{}' has no samples between {} and {}, nothing to plot",
                chart.series_id, chart.tags, chart.window.start, chart.window.end
            );
            return Ok(None);
        }
        let fout = self.chart_path(chart.tags);
        if chart.dry_run {
            let marked: Vec<String> = chart
                .highlights
                .iter()
                .filter_map(|h| {
                    let (t, _) = chart.points.get(h.index)?;
                    Some(format!("{}@{}", h.label, t.format(TIME_FMT)))
                })
                .collect();
            info!(
                "dry run, would plot {} samples from {} to {} with highlights [{}] to {}",
                chart.points.len(),
                chart.window.start.format(TIME_FMT),
                chart.window.end.format(TIME_FMT),
                marked.join(", "),
                fout.display()
            );
            return Ok(None);
        }
        plot_datetime(chart, &fout, self.title).map_err(|e| GrapherError::Render {
            path: fout.clone(),
            reason: e.to_string(),
        })?;
        info!("saved plot to {}", fout.display());
        Ok(Some(fout))
    }
}

/// plots the series with its highlighted samples to svg
fn plot_datetime(
    chart: &ChartRequest<'_>,
    fout: &Path,
    title: bool,
) -> std::result::Result<(), Box<dyn std::error::Error>> {
    let tz: Tz = chart.points[0].0.timezone();
    let times: Vec<DateTime<Utc>> = chart
        .points
        .iter()
        .map(|(t, _)| t.with_timezone(&Utc))
        .collect();
    let values: Vec<f64> = chart.points.iter().map(|p| p.1).collect();

    let (xmindt, xmaxdt) = min_and_max(&times[..]).ok_or("no samples to plot")?;
    let xspan: chrono::Duration = xmaxdt - xmindt;
    let xmargin = if xspan > chrono::Duration::zero() {
        xspan / 20
    } else {
        chrono::Duration::minutes(30)
    };
    let xfmt = suitable_xfmt(xspan);
    let (ymin, ymax) = min_and_max(&values[..]).ok_or("no samples to plot")?;
    let ymargin = if ymax > ymin {
        (ymax - ymin) / 10f64
    } else {
        1f64
    };

    let root = SVGBackend::new(fout, (1600, 900)).into_drawing_area();
    root.fill(&WHITE)?;
    let mut builder = ChartBuilder::on(&root);
    builder
        .margin(20)
        .x_label_area_size(60)
        .y_label_area_size(100);
    if title {
        builder.caption(chart.tags.to_string(), ("sans-serif", 32));
    }
    let mut plot = builder.build_cartesian_2d(
        (xmindt - xmargin)..(xmaxdt + xmargin),
        (ymin - ymargin)..(ymax + ymargin),
    )?;
    plot.configure_mesh()
        .light_line_style(&TRANSPARENT)
        .bold_line_style(RGBColor(150, 150, 150).stroke_width(1))
        .set_all_tick_mark_size(2)
        .label_style(("sans-serif", 24))
        .y_desc(chart.tags.field.as_str())
        .x_labels(12)
        .x_label_formatter(&|x: &DateTime<Utc>| x.with_timezone(&tz).format(xfmt).to_string())
        .y_label_formatter(&|y: &f64| format!("{:.2}", y))
        .x_desc(format!("time [{}]", tz.name()))
        .draw()?;

    plot.draw_series(LineSeries::new(
        times.iter().cloned().zip(values.iter().cloned()),
        RGBColor(30, 90, 180).stroke_width(2),
    ))?;

    let marked: Vec<(DateTime<Utc>, f64, &str)> = chart
        .highlights
        .iter()
        .filter_map(|h| {
            let t = times.get(h.index)?;
            let v = values.get(h.index)?;
            Some((*t, *v, h.label.as_str()))
        })
        .collect();
    if !marked.is_empty() {
        plot.draw_series(LineSeries::new(
            marked.iter().map(|(t, v, _)| (*t, *v)),
            RED.stroke_width(1),
        ))?;
        plot.draw_series(marked.iter().map(|(t, v, label)| {
            EmptyElement::at((*t, *v))
                + Circle::new((0, 0), 6, RED.filled())
                + Text::new(label.to_string(), (-24, -34), ("sans-serif", 22).into_font())
        }))?;
    }

    root.present()?;
    Ok(())
}
