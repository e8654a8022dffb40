//! Metrics collection for one project
//!
//! Locates the analyzer outputs, runs normalizer → extractor → graph parser →
//! assembler, and commits the model with a temp-then-rename write.

use std::fs;
use std::path::Path;

use tracing::info;

use super::assembler::GraphAssembler;
use super::entity::EntityExtractor;
use super::graph::DependencyGraph;
use super::table::MetricsTable;
use crate::config::AnalyzerConfig;
use crate::storage::{ProjectLayout, write_json_atomic};
use crate::types::{ProjectModel, Result, SmellError};

pub struct MetricsCollector {
    layout: ProjectLayout,
    analyzer: AnalyzerConfig,
}

impl MetricsCollector {
    pub fn new(layout: ProjectLayout, analyzer: AnalyzerConfig) -> Self {
        Self { layout, analyzer }
    }

    /// Build the project model from analyzer outputs without writing it
    pub fn build(&self) -> Result<ProjectModel> {
        let table = MetricsTable::read(&self.layout.type_metrics(), "type metrics table")?;

        let root = self.layout.project_root().to_string_lossy().into_owned();
        let extractor = EntityExtractor::from_config(root, &self.analyzer);
        let entities = extractor.extract_all(&table)?;

        // parsed before assembly so a bad graph never yields a zero-coupling model
        let graph = DependencyGraph::from_file(&self.layout.dependency_graph())?;

        Ok(GraphAssembler::assemble(
            self.layout.project(),
            entities,
            &graph,
        ))
    }

    /// Build the model and write `project_metrics.json`
    pub fn collect(&self) -> Result<ProjectModel> {
        let model = self.build()?;
        let output = self.layout.project_model();
        write_json_atomic(&output, &model)?;

        let summary = model.summary();
        info!(
            "Metrics collected for {}: {} packages, {} classes -> {}",
            model.project(),
            summary.total_packages,
            summary.total_classes,
            output.display()
        );
        Ok(model)
    }
}

/// Read a previously written project model
pub fn load_model(path: &Path) -> Result<ProjectModel> {
    if !path.exists() {
        return Err(SmellError::missing("project model", path));
    }
    let content = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PathsConfig;
    use tempfile::TempDir;

    const TYPE_METRICS: &str =
        "\u{feff}Project Name,Package Name,Type Name,NOF,LOC,LCOM,File path\n\
        demo,a,X,1,10,0.5,/ci/repos/demo/src/main/java/a/X.java\n\
        demo,a,XTest,0,7,-1,/ci/repos/demo/src/test/java/a/XTest.java\n\
        demo,b,Y,2,20,-1,/ci/repos/demo/src/main/java/b/Y.java\n";

    const GRAPH: &str = r#"<graphml xmlns="http://graphml.graphdrawing.org/xmlns"><graph>
        <edge source="a.X" target="b.Y"/>
        <edge source="a.XTest" target="a.X"/>
        </graph></graphml>"#;

    fn setup(graph: Option<&str>) -> (TempDir, ProjectLayout) {
        let dir = TempDir::new().unwrap();
        let paths = PathsConfig {
            repositories_dir: "repos".into(),
            output_dir: dir.path().join("out"),
            templates_dir: dir.path().join("tpl"),
        };
        let layout = ProjectLayout::new("demo", paths, AnalyzerConfig::default());
        fs::create_dir_all(layout.metrics_dir()).unwrap();
        fs::write(layout.type_metrics(), TYPE_METRICS).unwrap();
        if let Some(graph) = graph {
            fs::write(layout.dependency_graph(), graph).unwrap();
        }
        (dir, layout)
    }

    #[test]
    fn test_collect_end_to_end() {
        let (_dir, layout) = setup(Some(GRAPH));
        let collector = MetricsCollector::new(layout.clone(), AnalyzerConfig::default());

        let model = collector.collect().unwrap();
        assert_eq!(model.summary().total_classes, 2);
        assert!(model.class("a.XTest").is_none());
        assert_eq!(
            model.class("a.X").unwrap().file,
            "repos/demo/src/main/java/a/X.java"
        );
        assert_eq!(model.package("b").unwrap().afferent_coupling(), 1);

        let reloaded = load_model(&layout.project_model()).unwrap();
        assert_eq!(reloaded, model);
    }

    #[test]
    fn test_collect_is_byte_identical_on_rerun() {
        let (_dir, layout) = setup(Some(GRAPH));
        let collector = MetricsCollector::new(layout.clone(), AnalyzerConfig::default());

        collector.collect().unwrap();
        let first = fs::read(layout.project_model()).unwrap();
        collector.collect().unwrap();
        let second = fs::read(layout.project_model()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_missing_graph_leaves_previous_model() {
        let (_dir, layout) = setup(None);
        fs::write(layout.project_model(), "previous").unwrap();
        let collector = MetricsCollector::new(layout.clone(), AnalyzerConfig::default());

        let err = collector.collect().unwrap_err();
        assert!(matches!(err, SmellError::DependencyGraph { .. }));
        assert_eq!(fs::read_to_string(layout.project_model()).unwrap(), "previous");
    }

    #[test]
    fn test_missing_metrics_table() {
        let (_dir, layout) = setup(Some(GRAPH));
        fs::remove_file(layout.type_metrics()).unwrap();
        let collector = MetricsCollector::new(layout, AnalyzerConfig::default());
        assert!(matches!(
            collector.collect(),
            Err(SmellError::InputMissing { .. })
        ));
    }
}
