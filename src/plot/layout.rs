//! Panel grid layout and per-panel content, independent of any drawing backend.

use crate::data::{complete_pair, IndividualRecords, MeasurementTable, StatePair};
use crate::error::{PairedError, Result};
use serde::{Deserialize, Serialize};

/// Number of panel columns in the composite figure.
pub const DEFAULT_COLUMNS: usize = 3;

/// Fraction of the data range added above and below each panel's lines.
const Y_PADDING: f64 = 0.05;

/// Row-major position of a panel in the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PanelIndex {
    pub row: usize,
    pub col: usize,
}

/// What a grid cell shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Panel {
    /// Bound to the category at this position in the category list.
    Active { category_index: usize },
    /// Filler after the last category; drawn with no axes or ticks.
    Blank,
}

/// A fixed-column grid holding one panel per category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridLayout {
    n_categories: usize,
    n_rows: usize,
    n_cols: usize,
}

impl GridLayout {
    /// Lay out `n_categories` panels in rows of `n_cols`.
    pub fn new(n_categories: usize, n_cols: usize) -> Result<Self> {
        if n_categories == 0 {
            return Err(PairedError::EmptyData("No categories to plot".to_string()));
        }
        if n_cols == 0 {
            return Err(PairedError::InvalidParameter(
                "Grid must have at least one column".to_string(),
            ));
        }
        Ok(Self {
            n_categories,
            n_rows: n_categories.div_ceil(n_cols),
            n_cols,
        })
    }

    /// Number of rows.
    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    /// Number of columns.
    pub fn n_cols(&self) -> usize {
        self.n_cols
    }

    /// Total number of grid cells.
    pub fn n_panels(&self) -> usize {
        self.n_rows * self.n_cols
    }

    /// Number of trailing blank cells.
    pub fn n_blank(&self) -> usize {
        self.n_panels() - self.n_categories
    }

    /// Grid position of the panel at a row-major offset.
    pub fn index(&self, offset: usize) -> PanelIndex {
        PanelIndex {
            row: offset / self.n_cols,
            col: offset % self.n_cols,
        }
    }

    /// Content of the panel at a row-major offset.
    pub fn panel(&self, offset: usize) -> Panel {
        if offset < self.n_categories {
            Panel::Active {
                category_index: offset,
            }
        } else {
            Panel::Blank
        }
    }

    /// All panels in row-major order.
    pub fn panels(&self) -> impl Iterator<Item = (PanelIndex, Panel)> + '_ {
        (0..self.n_panels()).map(move |offset| (self.index(offset), self.panel(offset)))
    }
}

/// Inclusive y-axis bounds of a panel.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct YRange {
    pub min: f64,
    pub max: f64,
}

impl YRange {
    /// Padded range covering all values, or `None` when there are none.
    fn covering<I: IntoIterator<Item = f64>>(values: I) -> Option<Self> {
        let (min, max) = values
            .into_iter()
            .filter(|v| v.is_finite())
            .fold(None, |acc: Option<(f64, f64)>, v| match acc {
                Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
                None => Some((v, v)),
            })?;
        Some(Self::padded(min, max))
    }

    fn padded(min: f64, max: f64) -> Self {
        if (max - min).abs() < 1e-9 {
            return Self {
                min: min - 1.0,
                max: max + 1.0,
            };
        }
        let pad = (max - min) * Y_PADDING;
        Self {
            min: min - pad,
            max: max + pad,
        }
    }

    /// Range used when a panel has nothing to draw.
    fn unit() -> Self {
        Self { min: 0.0, max: 1.0 }
    }
}

/// Everything needed to draw one active panel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PanelPlan {
    /// Where the panel sits in the grid.
    pub index: PanelIndex,
    /// Panel title (the category identifier).
    pub title: String,
    /// One line per complete individual: values at the two states.
    pub lines: Vec<[f64; 2]>,
    /// y-axis bounds.
    pub y_range: YRange,
}

/// The full figure: grid, active panels, and blank cells.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FigurePlan {
    /// Grid dimensions.
    pub layout: GridLayout,
    /// Tick labels for the two x positions.
    pub state_labels: [String; 2],
    /// Active panels in category order.
    pub panels: Vec<PanelPlan>,
    /// Cells with no category.
    pub blank: Vec<PanelIndex>,
    /// Whether all panels share one y scale.
    pub share_y: bool,
}

fn panel_lines(records: &IndividualRecords) -> Vec<[f64; 2]> {
    records
        .values()
        .filter_map(complete_pair)
        .map(|(first, second)| [first, second])
        .collect()
}

impl FigurePlan {
    /// Plan one panel per category of `table`, in category order.
    ///
    /// With `share_y`, every panel gets the range covering all panels' lines;
    /// otherwise each panel scales to its own lines.
    pub fn from_table(
        table: &MeasurementTable,
        states: &StatePair,
        share_y: bool,
        n_cols: usize,
    ) -> Result<Self> {
        let layout = GridLayout::new(table.n_categories(), n_cols)?;

        let lines: Vec<(String, Vec<[f64; 2]>)> = table
            .iter()
            .map(|(category, records)| (category.to_string(), panel_lines(records)))
            .collect();

        let shared_range = if share_y {
            Some(
                YRange::covering(lines.iter().flat_map(|(_, l)| l.iter().flatten().copied()))
                    .unwrap_or_else(YRange::unit),
            )
        } else {
            None
        };

        let panels = lines
            .into_iter()
            .enumerate()
            .map(|(offset, (title, lines))| {
                let y_range = shared_range.unwrap_or_else(|| {
                    YRange::covering(lines.iter().flatten().copied()).unwrap_or_else(YRange::unit)
                });
                PanelPlan {
                    index: layout.index(offset),
                    title,
                    lines,
                    y_range,
                }
            })
            .collect();

        let blank = layout
            .panels()
            .filter(|(_, panel)| *panel == Panel::Blank)
            .map(|(index, _)| index)
            .collect();

        Ok(Self {
            layout,
            state_labels: states.labels().clone(),
            panels,
            blank,
            share_y,
        })
    }
}
