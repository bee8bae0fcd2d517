//! Drawing a [`FigurePlan`] with plotters.

use super::layout::{FigurePlan, PanelPlan};
use crate::error::{PairedError, Result};
use plotters::coord::Shift;
use plotters::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

const PANEL_WIDTH: u32 = 320;
const PANEL_HEIGHT: u32 = 260;
const TITLE_FONT_SIZE: u32 = 12;
const TICK_FONT_SIZE: u32 = 10;
/// x-axis margin on either side of the two state positions.
const X_MARGIN: f64 = 0.25;

/// Output format of the composite figure.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlotFormat {
    #[default]
    Svg,
    Png,
}

impl PlotFormat {
    /// File extension without the dot.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Svg => "svg",
            Self::Png => "png",
        }
    }
}

fn plot_error<E: std::fmt::Display>(e: E) -> PairedError {
    PairedError::Plot(e.to_string())
}

/// Pixel size of the whole figure.
pub fn figure_size(plan: &FigurePlan) -> (u32, u32) {
    (
        plan.layout.n_cols() as u32 * PANEL_WIDTH,
        plan.layout.n_rows() as u32 * PANEL_HEIGHT,
    )
}

/// Render the figure to `path`.
///
/// Blank grid cells are left empty: no axes, ticks, or title.
pub fn render_figure<P: AsRef<Path>>(plan: &FigurePlan, path: P, format: PlotFormat) -> Result<()> {
    let path = path.as_ref();
    let size = figure_size(plan);
    match format {
        PlotFormat::Svg => {
            let root = SVGBackend::new(path, size).into_drawing_area();
            draw_figure(&root, plan)?;
        }
        PlotFormat::Png => {
            let root = BitMapBackend::new(path, size).into_drawing_area();
            draw_figure(&root, plan)?;
        }
    }
    info!(
        path = %path.display(),
        panels = plan.panels.len(),
        blank = plan.blank.len(),
        "Wrote figure"
    );
    Ok(())
}

fn draw_figure<DB: DrawingBackend>(root: &DrawingArea<DB, Shift>, plan: &FigurePlan) -> Result<()> {
    root.fill(&WHITE).map_err(plot_error)?;

    let areas = root.split_evenly((plan.layout.n_rows(), plan.layout.n_cols()));
    for panel in &plan.panels {
        let offset = panel.index.row * plan.layout.n_cols() + panel.index.col;
        let area = areas.get(offset).ok_or_else(|| {
            PairedError::Plot(format!("Panel '{}' is outside the grid", panel.title))
        })?;
        draw_panel(area, panel, &plan.state_labels)?;
    }

    root.present().map_err(plot_error)?;
    Ok(())
}

fn draw_panel<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    panel: &PanelPlan,
    state_labels: &[String; 2],
) -> Result<()> {
    let x_range = -X_MARGIN..1.0 + X_MARGIN;
    let mut chart = ChartBuilder::on(area)
        .caption(panel.title.as_str(), ("sans-serif", TITLE_FONT_SIZE))
        .margin(6)
        .x_label_area_size(18)
        .y_label_area_size(40)
        .build_cartesian_2d(x_range, panel.y_range.min..panel.y_range.max)
        .map_err(plot_error)?;

    let label_for = |x: &f64| {
        if x.abs() < 1e-9 {
            state_labels[0].clone()
        } else if (x - 1.0).abs() < 1e-9 {
            state_labels[1].clone()
        } else {
            String::new()
        }
    };
    chart
        .configure_mesh()
        .disable_mesh()
        .x_labels(2)
        .x_label_formatter(&label_for)
        .x_label_style(("sans-serif", TICK_FONT_SIZE))
        .y_label_style(("sans-serif", TICK_FONT_SIZE))
        .draw()
        .map_err(plot_error)?;

    chart
        .draw_series(panel.lines.iter().map(|&[first, second]| {
            PathElement::new(vec![(0.0, first), (1.0, second)], BLACK.stroke_width(1))
        }))
        .map_err(plot_error)?;

    Ok(())
}
