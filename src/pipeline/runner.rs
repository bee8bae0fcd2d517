//! Configuring and running a paired difference analysis.

use crate::correct::correct_bonferroni;
use crate::data::{FeatureTable, MappingFile, MeasurementTable, PairedResultSet, StatePair};
use crate::difference::compute_differences;
use crate::error::{PairedError, Result};
use crate::extract::{FeatureTableExtractor, MappingExtractor, StateExtractor, StateSpec};
use crate::filter::SampleFilter;
use crate::plot::{render_figure, FigurePlan, PlotFormat, DEFAULT_COLUMNS};
use crate::rank::{rank_results, SortKey};
use crate::test::test_paired;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// File name of the TSV report inside the output directory.
pub const REPORT_FILE_NAME: &str = "paired_difference_comparisons.txt";

/// File stem of the figure inside the output directory.
pub const FIGURE_FILE_STEM: &str = "plots";

/// Where the categories to analyze come from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CategorySource {
    /// Numeric mapping file columns.
    MappingColumns { categories: Vec<String> },
    /// Observations of a feature table (all of them unless listed).
    FeatureTable {
        path: PathBuf,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        observation_ids: Option<Vec<String>>,
    },
}

impl CategorySource {
    /// Build from the mutually exclusive command-line options.
    ///
    /// Exactly one of `metadata_categories` and `feature_table` must be given;
    /// `observation_ids` only applies to a feature table.
    pub fn from_options(
        metadata_categories: Option<Vec<String>>,
        feature_table: Option<PathBuf>,
        observation_ids: Option<Vec<String>>,
    ) -> Result<Self> {
        match (metadata_categories, feature_table) {
            (Some(_), Some(_)) => Err(PairedError::Config(
                "Can only pass metadata categories or a feature table, not both".to_string(),
            )),
            (None, None) => Err(PairedError::Config(
                "Must pass either metadata categories or a feature table".to_string(),
            )),
            (Some(categories), None) => {
                if observation_ids.is_some() {
                    return Err(PairedError::Config(
                        "Observation ids require a feature table".to_string(),
                    ));
                }
                Ok(Self::MappingColumns { categories })
            }
            (None, Some(path)) => Ok(Self::FeatureTable {
                path,
                observation_ids,
            }),
        }
    }
}

/// Fail on a category listed more than once.
fn reject_duplicates(categories: &[String]) -> Result<()> {
    let mut seen = HashSet::new();
    match categories.iter().find(|c| !seen.insert(c.as_str())) {
        Some(duplicate) => Err(PairedError::Config(format!(
            "Category '{}' is listed more than once",
            duplicate
        ))),
        None => Ok(()),
    }
}

fn default_share_y_axis() -> bool {
    true
}

/// Complete, immutable description of one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairedConfig {
    /// Mapping file path.
    pub mapping: PathBuf,
    /// Categories to analyze.
    pub categories: CategorySource,
    /// Mapping column holding each sample's state.
    pub state_category: String,
    /// The two states to compare, in order.
    pub state_values: Vec<String>,
    /// Mapping column holding each sample's individual identifier.
    pub individual_id_category: String,
    /// Optional sample filter, e.g. `TreatmentResponse:Improved`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub valid_states: Option<String>,
    /// Give every panel the same y scale.
    #[serde(default = "default_share_y_axis")]
    pub share_y_axis: bool,
    /// Statistic used to order the report.
    #[serde(default)]
    pub sort_key: SortKey,
    /// Figure format.
    #[serde(default)]
    pub plot_format: PlotFormat,
    /// Directory receiving the report and figure.
    pub output_dir: PathBuf,
}

impl PairedConfig {
    /// Create a configuration with default display options.
    pub fn new(
        mapping: impl Into<PathBuf>,
        categories: CategorySource,
        state_category: &str,
        state_values: &[&str],
        individual_id_category: &str,
        output_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            mapping: mapping.into(),
            categories,
            state_category: state_category.to_string(),
            state_values: state_values.iter().map(|s| s.to_string()).collect(),
            individual_id_category: individual_id_category.to_string(),
            valid_states: None,
            share_y_axis: true,
            sort_key: SortKey::default(),
            plot_format: PlotFormat::default(),
            output_dir: output_dir.into(),
        }
    }

    /// Only include samples matching a filter description.
    pub fn valid_states(mut self, description: &str) -> Self {
        self.valid_states = Some(description.to_string());
        self
    }

    /// Scale each panel's y axis independently.
    pub fn suppress_share_y_axis(mut self) -> Self {
        self.share_y_axis = false;
        self
    }

    /// Order the report by a different statistic.
    pub fn sort_key(mut self, key: SortKey) -> Self {
        self.sort_key = key;
        self
    }

    /// Write the figure in a different format.
    pub fn plot_format(mut self, format: PlotFormat) -> Self {
        self.plot_format = format;
        self
    }

    /// Load from YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).map_err(PairedError::from)
    }

    /// Save to YAML string.
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).map_err(PairedError::from)
    }

    /// The ordered state pair.
    pub fn states(&self) -> Result<StatePair> {
        StatePair::new(&self.state_values)
    }

    /// Sample/state/individual resolution settings.
    pub fn state_spec(&self) -> Result<StateSpec> {
        Ok(StateSpec {
            state_category: self.state_category.clone(),
            states: self.states()?,
            individual_id_category: self.individual_id_category.clone(),
        })
    }

    /// The parsed sample filter, if any.
    pub fn sample_filter(&self) -> Result<Option<SampleFilter>> {
        self.valid_states.as_deref().map(SampleFilter::parse).transpose()
    }

    /// Check the configuration without touching the filesystem.
    pub fn validate(&self) -> Result<()> {
        self.states()?;
        self.sample_filter()?;
        match &self.categories {
            CategorySource::MappingColumns { categories } if categories.is_empty() => Err(
                PairedError::Config("At least one metadata category is required".to_string()),
            ),
            CategorySource::FeatureTable {
                observation_ids: Some(ids),
                ..
            } if ids.is_empty() => Err(PairedError::Config(
                "Observation id list is empty".to_string(),
            )),
            CategorySource::MappingColumns { categories } => reject_duplicates(categories),
            CategorySource::FeatureTable {
                observation_ids: Some(ids),
                ..
            } => reject_duplicates(ids),
            CategorySource::FeatureTable { .. } => Ok(()),
        }
    }

    /// Path of the TSV report.
    pub fn report_path(&self) -> PathBuf {
        self.output_dir.join(REPORT_FILE_NAME)
    }

    /// Path of the figure.
    pub fn figure_path(&self) -> PathBuf {
        self.output_dir
            .join(format!("{}.{}", FIGURE_FILE_STEM, self.plot_format.extension()))
    }
}

/// Options of the in-memory analysis step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisOptions {
    pub share_y_axis: bool,
    pub sort_key: SortKey,
    pub n_cols: usize,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self {
            share_y_axis: true,
            sort_key: SortKey::default(),
            n_cols: DEFAULT_COLUMNS,
        }
    }
}

impl From<&PairedConfig> for AnalysisOptions {
    fn from(config: &PairedConfig) -> Self {
        Self {
            share_y_axis: config.share_y_axis,
            sort_key: config.sort_key,
            n_cols: DEFAULT_COLUMNS,
        }
    }
}

/// Ranked statistics and the figure layout for one table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PairedAnalysis {
    pub results: PairedResultSet,
    pub figure: FigurePlan,
}

/// Analyze every category of `table`.
///
/// Each category is reduced to its complete-pair differences and t-tested;
/// p-values are Bonferroni-corrected by the number of categories in `table`
/// and the rows are ranked by `options.sort_key`. A category with too few
/// pairs is reported with an explicit status rather than failing the run.
pub fn analyze(
    table: &MeasurementTable,
    states: &StatePair,
    options: &AnalysisOptions,
) -> Result<PairedAnalysis> {
    let n_categories = table.n_categories();
    if n_categories == 0 {
        return Err(PairedError::EmptyData("No categories to analyze".to_string()));
    }

    let rows = table
        .iter()
        .map(|(category, records)| test_paired(&compute_differences(category, records)))
        .collect();
    let corrected = correct_bonferroni(rows, n_categories)?;
    let ranked = rank_results(corrected, options.sort_key);

    let figure = FigurePlan::from_table(table, states, options.share_y_axis, options.n_cols)?;

    Ok(PairedAnalysis {
        results: PairedResultSet::new(ranked),
        figure,
    })
}

/// Files written by [`run`].
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub analysis: PairedAnalysis,
    pub report_path: PathBuf,
    pub figure_path: PathBuf,
}

fn load_extractor(source: &CategorySource) -> Result<Box<dyn StateExtractor>> {
    match source {
        CategorySource::MappingColumns { categories } => {
            Ok(Box::new(MappingExtractor::new(categories.clone())))
        }
        CategorySource::FeatureTable {
            path,
            observation_ids,
        } => {
            let table = FeatureTable::from_tsv(path)?;
            info!(
                features = table.n_features(),
                samples = table.n_samples(),
                "Loaded feature table"
            );
            let extractor = FeatureTableExtractor::new(table);
            Ok(Box::new(match observation_ids {
                Some(ids) => extractor.with_observation_ids(ids.clone()),
                None => extractor,
            }))
        }
    }
}

fn load_mapping(path: &Path, filter: Option<&SampleFilter>) -> Result<MappingFile> {
    let mapping = MappingFile::from_tsv(path)?;
    info!(samples = mapping.n_samples(), "Loaded mapping file");
    match filter {
        Some(filter) => filter.apply(&mapping),
        None => Ok(mapping),
    }
}

/// Run the full analysis: load, extract, analyze, and write the report and figure.
///
/// The configuration is validated before any file is read; nothing is written
/// unless extraction and analysis succeed.
pub fn run(config: &PairedConfig) -> Result<RunOutput> {
    config.validate()?;
    let spec = config.state_spec()?;
    let filter = config.sample_filter()?;

    let mapping = load_mapping(&config.mapping, filter.as_ref())?;
    let extractor = load_extractor(&config.categories)?;
    let table = extractor.extract(&mapping, &spec)?;

    let analysis = analyze(&table, &spec.states, &AnalysisOptions::from(config))?;
    info!(
        categories = analysis.results.len(),
        sort_key = config.sort_key.name(),
        "Computed paired differences"
    );

    fs::create_dir_all(&config.output_dir)?;
    let report_path = config.report_path();
    analysis.results.to_tsv(&report_path)?;
    info!(path = %report_path.display(), "Wrote report");

    let figure_path = config.figure_path();
    render_figure(&analysis.figure, &figure_path, config.plot_format)?;

    Ok(RunOutput {
        analysis,
        report_path,
        figure_path,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{IndividualRecords, TestStatus};
    use crate::plot::{Panel, PanelIndex};
    use approx::assert_relative_eq;
    use tempfile::tempdir;

    fn records(values: &[(&str, [Option<f64>; 2])]) -> IndividualRecords {
        values
            .iter()
            .map(|(id, pair)| (id.to_string(), *pair))
            .collect()
    }

    fn create_test_table() -> MeasurementTable {
        MeasurementTable::new()
            .with_category(
                "A",
                records(&[
                    ("p1", [Some(1.0), Some(3.0)]),
                    ("p2", [Some(2.0), None]),
                    ("p3", [Some(0.0), Some(0.0)]),
                ]),
            )
            .with_category(
                "B",
                records(&[
                    ("p1", [Some(1.0), Some(5.0)]),
                    ("p2", [Some(2.0), Some(6.5)]),
                    ("p3", [Some(0.0), Some(3.5)]),
                ]),
            )
            .with_category("C", records(&[("p1", [Some(1.0), Some(2.0)])]))
            .with_category(
                "D",
                records(&[
                    ("p1", [Some(4.0), Some(4.5)]),
                    ("p2", [Some(4.0), Some(3.0)]),
                ]),
            )
    }

    fn create_test_config(output_dir: &Path) -> PairedConfig {
        PairedConfig::new(
            "map.txt",
            CategorySource::MappingColumns {
                categories: vec!["PD".to_string()],
            },
            "TreatmentState",
            &["Pre", "Post"],
            "PersonalID",
            output_dir,
        )
    }

    #[test]
    fn test_analyze_example_category() {
        let states = StatePair::parse("Pre,Post").unwrap();
        let analysis = analyze(&create_test_table(), &states, &AnalysisOptions::default()).unwrap();

        let a = analysis.results.get("A").unwrap();
        assert_eq!(a.n, 2);
        assert_relative_eq!(a.mean.unwrap(), 1.0, epsilon = 1e-12);
        assert_relative_eq!(a.median.unwrap(), 1.0, epsilon = 1e-12);
        assert_relative_eq!(a.statistic.unwrap(), 1.0, epsilon = 1e-12);
        assert_relative_eq!(a.p_value.unwrap(), 0.5, epsilon = 1e-8);
        // four categories in the family
        assert_relative_eq!(a.corrected_p_value.unwrap(), 1.0);
    }

    #[test]
    fn test_analyze_correction_and_ranking() {
        let states = StatePair::parse("Pre,Post").unwrap();
        let analysis = analyze(&create_test_table(), &states, &AnalysisOptions::default()).unwrap();

        for r in analysis.results.iter() {
            if let Some(p) = r.p_value {
                let q = r.corrected_p_value.unwrap();
                assert_relative_eq!(q, (p * 4.0).min(1.0), epsilon = 1e-12);
                assert!((0.0..=1.0).contains(&q));
            }
        }

        let order: Vec<&str> = analysis.results.iter().map(|r| r.category.as_str()).collect();
        assert_eq!(order[0], "B");
        assert_eq!(order[3], "C");
    }

    #[test]
    fn test_analyze_insufficient_category_does_not_abort() {
        let states = StatePair::parse("Pre,Post").unwrap();
        let analysis = analyze(&create_test_table(), &states, &AnalysisOptions::default()).unwrap();

        let c = analysis.results.get("C").unwrap();
        assert_eq!(c.status, TestStatus::InsufficientData);
        assert_eq!(c.n, 1);
        assert_eq!(c.corrected_p_value, None);
        assert_eq!(analysis.results.len(), 4);

        // the panel is still drawn
        let panel = analysis.figure.panels.iter().find(|p| p.title == "C").unwrap();
        assert_eq!(panel.lines, vec![[1.0, 2.0]]);
    }

    #[test]
    fn test_analyze_figure_layout() {
        let states = StatePair::parse("Pre,Post").unwrap();
        let analysis = analyze(&create_test_table(), &states, &AnalysisOptions::default()).unwrap();

        let layout = analysis.figure.layout;
        assert_eq!(layout.n_rows(), 2);
        assert_eq!(layout.panel(3), Panel::Active { category_index: 3 });
        assert_eq!(layout.panel(4), Panel::Blank);
        assert_eq!(analysis.figure.blank, vec![PanelIndex { row: 1, col: 1 }, PanelIndex { row: 1, col: 2 }]);
    }

    #[test]
    fn test_analyze_empty_table() {
        let states = StatePair::parse("Pre,Post").unwrap();
        let result = analyze(&MeasurementTable::new(), &states, &AnalysisOptions::default());
        assert!(matches!(result, Err(PairedError::EmptyData(_))));
    }

    #[test]
    fn test_category_source_options() {
        let cats = Some(vec!["PD".to_string()]);
        let table = Some(PathBuf::from("otu_table.txt"));

        assert!(matches!(
            CategorySource::from_options(cats.clone(), table.clone(), None),
            Err(PairedError::Config(_))
        ));
        assert!(matches!(
            CategorySource::from_options(None, None, None),
            Err(PairedError::Config(_))
        ));
        assert!(matches!(
            CategorySource::from_options(cats.clone(), None, Some(vec!["otu1".into()])),
            Err(PairedError::Config(_))
        ));
        assert_eq!(
            CategorySource::from_options(None, table, Some(vec!["otu1".into()])).unwrap(),
            CategorySource::FeatureTable {
                path: PathBuf::from("otu_table.txt"),
                observation_ids: Some(vec!["otu1".to_string()]),
            }
        );
    }

    #[test]
    fn test_config_validation() {
        let dir = tempdir().unwrap();
        let config = create_test_config(dir.path());
        assert!(config.validate().is_ok());

        let mut bad_states = config.clone();
        bad_states.state_values = vec!["Pre".to_string()];
        assert!(matches!(bad_states.validate(), Err(PairedError::Config(_))));

        let bad_filter = config.clone().valid_states("Response");
        assert!(matches!(bad_filter.validate(), Err(PairedError::Config(_))));

        let mut repeated = config.clone();
        repeated.categories = CategorySource::MappingColumns {
            categories: vec!["PD".to_string(), "Shannon".to_string(), "PD".to_string()],
        };
        assert!(matches!(repeated.validate(), Err(PairedError::Config(_))));

        let mut repeated_ids = config.clone();
        repeated_ids.categories = CategorySource::FeatureTable {
            path: PathBuf::from("otu_table.txt"),
            observation_ids: Some(vec!["otu1".to_string(), "otu1".to_string()]),
        };
        assert!(matches!(repeated_ids.validate(), Err(PairedError::Config(_))));

        let mut no_categories = config;
        no_categories.categories = CategorySource::MappingColumns { categories: vec![] };
        assert!(matches!(no_categories.validate(), Err(PairedError::Config(_))));
    }

    #[test]
    fn test_config_error_writes_nothing() {
        let dir = tempdir().unwrap();
        let output_dir = dir.path().join("out");
        let mut config = create_test_config(&output_dir);
        config.state_values = vec!["Pre".into(), "Mid".into(), "Post".into()];

        assert!(matches!(run(&config), Err(PairedError::Config(_))));
        assert!(!output_dir.exists());
    }

    #[test]
    fn test_config_yaml_roundtrip() {
        let dir = tempdir().unwrap();
        let config = create_test_config(dir.path())
            .valid_states("Response:Improved")
            .suppress_share_y_axis()
            .sort_key(SortKey::Median)
            .plot_format(PlotFormat::Png);

        let yaml = config.to_yaml().unwrap();
        let parsed = PairedConfig::from_yaml(&yaml).unwrap();
        assert_eq!(parsed, config);
        assert_eq!(parsed.figure_path(), dir.path().join("plots.png"));
    }

    #[test]
    fn test_config_yaml_defaults() {
        let yaml = "mapping: map.txt\n\
                    categories: !feature_table { path: otu_table.txt }\n\
                    state_category: TreatmentState\n\
                    state_values: [Pre, Post]\n\
                    individual_id_category: PersonalID\n\
                    output_dir: out\n";
        let config = PairedConfig::from_yaml(yaml).unwrap();

        assert!(config.share_y_axis);
        assert_eq!(config.sort_key, SortKey::TStatistic);
        assert_eq!(config.plot_format, PlotFormat::Svg);
        assert_eq!(config.report_path(), PathBuf::from("out").join(REPORT_FILE_NAME));
    }
}
