//! Multi-panel figure of per-individual trajectories.

pub mod layout;
pub mod render;

pub use layout::{FigurePlan, GridLayout, Panel, PanelIndex, PanelPlan, YRange, DEFAULT_COLUMNS};
pub use render::{figure_size, render_figure, PlotFormat};
