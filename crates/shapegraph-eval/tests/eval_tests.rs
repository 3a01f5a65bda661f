use ndarray::Array1;
use shapegraph_core::testing::MeanConvModel;
use shapegraph_core::{EdgeIndex, Explainer, Explanation, NodeQuery, ShapeGraphConfig, ShapeGraphError};
use shapegraph_datasets::ShapeGraph;
use shapegraph_eval::{graph_exp_acc, graph_exp_faith, ScoreTable, Threshold};
use shapegraph_explainers::{GradExplainer, RandomExplainer};
use tempfile::TempDir;

fn shape_graph() -> ShapeGraph {
    ShapeGraph::new(ShapeGraphConfig {
        seed: Some(5),
        num_subgraphs: 4,
        subgraph_size: 8,
        ..Default::default()
    })
    .unwrap()
}

#[test]
fn test_ground_truth_agrees_with_itself() {
    let dataset = shape_graph();
    for node in [0, 3, 17] {
        let gt = dataset.explanation_generator(node).unwrap();
        let scores = graph_exp_acc(&gt, &gt, Threshold::Above(0.5)).unwrap();
        assert_eq!(scores.node, Some(1.0));
        assert_eq!(scores.edge, Some(1.0));
    }
}

#[test]
fn test_explainers_scored_against_ground_truth() {
    let dataset = shape_graph();
    let layers = dataset.config().model_layers;
    let model = MeanConvModel::first_feature_detector(layers, dataset.num_features());
    let mut table = ScoreTable::new();

    for node in 0..10 {
        let gt = dataset.explanation_generator(node).unwrap();
        let query = NodeQuery::new(node, dataset.x(), dataset.edge_index());

        let mut grad = GradExplainer::new();
        let mut random = RandomExplainer::new(node as u64);
        for (name, explainer) in [
            ("grad", &mut grad as &mut dyn Explainer),
            ("rand", &mut random as &mut dyn Explainer),
        ] {
            let exp = explainer.explain_node(&model, &query).unwrap();
            let acc = graph_exp_acc(&gt, &exp, Threshold::TopK(4)).unwrap();
            let node_acc = acc.node.unwrap_or(0.0);
            assert!((0.0..=1.0).contains(&node_acc));
            table.record(name, "small", node_acc);

            let faith =
                graph_exp_faith(&model, dataset.x(), dataset.edge_index(), &exp, 4).unwrap();
            if let Some(edge) = faith.edge {
                assert!((0.0..=1.0).contains(&edge));
            }
        }
    }

    let summaries = table.summaries("small", &["grad", "rand", "gnnex"]);
    assert_eq!(summaries.len(), 2);
    assert!(summaries.iter().all(|(_, s)| s.count == 10));
}

#[test]
fn test_ground_truth_is_faithful_when_keeping_everything() {
    let dataset = shape_graph();
    let model = MeanConvModel::first_feature_detector(
        dataset.config().model_layers,
        dataset.num_features(),
    );
    let gt = dataset.explanation_generator(2).unwrap();
    let everything = gt.scope_num_nodes().max(gt.scope_num_edges());
    let faith =
        graph_exp_faith(&model, dataset.x(), dataset.edge_index(), &gt, everything).unwrap();
    assert!(faith.node.unwrap() < 1e-9);
    assert!(faith.edge.unwrap() < 1e-9);
}

#[test]
fn test_mismatched_scopes_are_rejected() {
    let dataset = shape_graph();
    let a = dataset.explanation_generator(0).unwrap();
    let b = Explanation::for_graph(3, EdgeIndex::undirected(vec![(0, 1), (1, 2)]))
        .with_node_imp(Array1::ones(3));
    assert!(matches!(
        graph_exp_acc(&a, &b, Threshold::default()),
        Err(ShapeGraphError::ShapeMismatch(_))
    ));
}

#[test]
fn test_faithfulness_rejects_foreign_graph() {
    let dataset = shape_graph();
    let model = MeanConvModel::first_feature_detector(
        dataset.config().model_layers,
        dataset.num_features(),
    );
    let gt = dataset.explanation_generator(0).unwrap();
    let other = EdgeIndex::undirected(vec![(0, 1), (1, 2)]);
    assert!(matches!(
        graph_exp_faith(&model, dataset.x(), &other, &gt, 4),
        Err(ShapeGraphError::ShapeMismatch(_))
    ));
    assert!(graph_exp_faith(&model, dataset.x(), dataset.edge_index(), &gt, 4).is_ok());
}

#[test]
fn test_score_table_json_roundtrip() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("scores.json");

    let mut table = ScoreTable::new();
    table.extend("gnnex", "small", [0.25, 0.5, 0.75]);
    table.mark_missing("pgex", "small");
    table.save_json(&path).unwrap();

    let loaded = ScoreTable::load_json(&path).unwrap();
    assert_eq!(loaded, table);
    let summary = loaded.summary("gnnex", "small").unwrap();
    assert_eq!(summary.count, 3);
    assert!((summary.median - 0.5).abs() < 1e-12);
    assert!(loaded.summary("pgex", "small").is_none());
}
