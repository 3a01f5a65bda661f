use ndarray::Array2;
use shapegraph_core::testing::MeanConvModel;
use shapegraph_core::{
    EdgeIndex, Explainer, ExplainerConfig, Explanation, Granularity, GraphQuery, LinkQuery,
    NodeQuery, Query, Result, ShapeGraphConfig, ShapeGraphError,
};
use shapegraph_datasets::ShapeGraph;
use shapegraph_explainers::{GnnExplainer, GradExplainer, RandomExplainer};

/// Path 0-1-2-3-4-5 with a chord 1-4.
fn small_graph() -> (Array2<f64>, EdgeIndex) {
    let x = Array2::from_shape_fn((6, 3), |(i, j)| match j {
        0 => i as f64 * 0.5 - 1.0,
        1 => 1.0,
        _ => (i % 2) as f64,
    });
    let ei = EdgeIndex::undirected(vec![(0, 1), (1, 2), (2, 3), (3, 4), (4, 5), (1, 4)]);
    (x, ei)
}

fn shape_graph() -> ShapeGraph {
    ShapeGraph::new(ShapeGraphConfig {
        seed: Some(11),
        num_subgraphs: 4,
        subgraph_size: 8,
        ..Default::default()
    })
    .unwrap()
}

fn assert_unsupported(result: Result<Explanation>, expected: Granularity) {
    match result {
        Err(ShapeGraphError::Unsupported { granularity, .. }) => assert_eq!(granularity, expected),
        other => panic!("expected unsupported {expected}, got {other:?}"),
    }
}

#[test]
fn test_random_explainer_shapes_and_seeds() {
    let dataset = shape_graph();
    let model = MeanConvModel::first_feature_detector(3, dataset.num_features());
    let query = NodeQuery::new(5, dataset.x(), dataset.edge_index());

    let a = RandomExplainer::new(1).explain_node(&model, &query).unwrap();
    let b = RandomExplainer::new(2).explain_node(&model, &query).unwrap();
    let again = RandomExplainer::new(1).explain_node(&model, &query).unwrap();

    let khop_edges = a.enclosing_subgraph().unwrap().num_edges();
    assert_eq!(a.feature_imp.as_ref().unwrap().len(), dataset.num_features());
    assert_eq!(a.edge_imp.as_ref().unwrap().len(), khop_edges);
    assert!(a.validate(Some(dataset.num_features())).is_ok());

    assert_ne!(a.feature_imp, b.feature_imp);
    assert_ne!(a.edge_imp, b.edge_imp);
    assert_eq!(a.feature_imp, again.feature_imp);
    assert_eq!(a.edge_imp, again.edge_imp);
}

#[test]
fn test_random_explainer_whole_graph() {
    let (x, ei) = small_graph();
    let model = MeanConvModel::first_feature_detector(2, 3);
    let exp = RandomExplainer::new(3)
        .explain_graph(&model, &GraphQuery { x: &x, edge_index: &ei, label: None })
        .unwrap();
    let node_imp = exp.node_imp.as_ref().unwrap();
    assert_eq!(node_imp.len(), 6);
    assert!(node_imp.iter().all(|&v| v == 0.0 || v == 1.0));
    assert_eq!(exp.edge_imp.as_ref().unwrap().len(), ei.len());
    assert_eq!(exp.feature_imp.as_ref().unwrap().len(), 3);
}

#[test]
fn test_random_explainer_rejects_links() {
    let (x, ei) = small_graph();
    let model = MeanConvModel::first_feature_detector(2, 3);
    let mut explainer = RandomExplainer::new(0);
    let link = LinkQuery { x: &x, edge_index: &ei, link: (0, 5) };

    assert!(!explainer.capabilities().supports(Granularity::Link));
    assert_unsupported(explainer.explain(&model, &Query::Link(link)), Granularity::Link);
    assert_unsupported(explainer.explain_link(&model, &link), Granularity::Link);
}

#[test]
fn test_gnn_explainer_rejects_graphs() {
    let (x, ei) = small_graph();
    let model = MeanConvModel::first_feature_detector(2, 3);
    let mut explainer = GnnExplainer::new(ExplainerConfig::default()).unwrap();
    let query = GraphQuery { x: &x, edge_index: &ei, label: Some(1) };

    assert_unsupported(explainer.explain(&model, &Query::Graph(query)), Granularity::Graph);
    assert_unsupported(explainer.explain_graph(&model, &query), Granularity::Graph);
    let err = explainer.explain_graph(&model, &query).unwrap_err();
    assert_eq!(err.to_string(), "GNNExplainer does not support graph-level explanation");
}

#[test]
fn test_grad_explainer_ignores_unused_features() {
    let (x, ei) = small_graph();
    let model = MeanConvModel::first_feature_detector(2, 3);
    let mut explainer = GradExplainer::new();
    let query = NodeQuery::new(2, &x, &ei).with_label(1);

    let exp = explainer.explain(&model, &Query::Node(query)).unwrap();
    exp.validate(Some(3)).unwrap();
    let feature_imp = exp.feature_imp.as_ref().unwrap();
    assert!(feature_imp[0] > 0.0);
    assert_eq!(feature_imp[1], 0.0);
    assert_eq!(feature_imp[2], 0.0);

    let sub = exp.enclosing_subgraph().unwrap();
    assert!(exp.node_imp.as_ref().unwrap()[sub.mapping] > 0.0);
    assert!(exp.edge_imp.as_ref().unwrap().iter().all(|&v| v >= 0.0));
}

#[test]
fn test_grad_explainer_whole_graph() {
    let (x, ei) = small_graph();
    let model = MeanConvModel::first_feature_detector(1, 3);
    let exp = GradExplainer::new()
        .explain_graph(&model, &GraphQuery { x: &x, edge_index: &ei, label: None })
        .unwrap();
    exp.validate(Some(3)).unwrap();
    assert_eq!(exp.node_imp.as_ref().unwrap().len(), 6);
    assert_eq!(exp.edge_imp.as_ref().unwrap().len(), ei.len());
}

#[test]
fn test_out_of_range_label_is_rejected() {
    let (x, ei) = small_graph();
    let model = MeanConvModel::first_feature_detector(2, 3);
    let query = NodeQuery::new(0, &x, &ei).with_label(7);
    assert!(matches!(
        GradExplainer::new().explain_node(&model, &query),
        Err(ShapeGraphError::InvalidOperation(_))
    ));
}

#[test]
fn test_gnn_explainer_learns_bounded_masks() {
    let (x, ei) = small_graph();
    let model = MeanConvModel::first_feature_detector(2, 3);
    let config = ExplainerConfig {
        num_epochs: 40,
        get_feature_mask: true,
        ..Default::default()
    };
    let mut explainer = GnnExplainer::new(config).unwrap();
    let exp = explainer
        .explain_node(&model, &NodeQuery::new(3, &x, &ei))
        .unwrap();
    exp.validate(Some(3)).unwrap();

    let edge_imp = exp.edge_imp.as_ref().unwrap();
    assert!(edge_imp.iter().all(|&v| v > 0.0 && v < 1.0));
    let feature_imp = exp.feature_imp.as_ref().unwrap();
    assert_eq!(feature_imp.len(), 3);
    assert!(feature_imp.iter().all(|&v| v > 0.0 && v < 1.0));

    // Node importance is the strongest incident edge.
    let sub = exp.enclosing_subgraph().unwrap();
    let node_imp = exp.node_imp.as_ref().unwrap();
    let local = sub.local_edge_index();
    for (i, &imp) in node_imp.iter().enumerate() {
        let best = local
            .iter()
            .zip(edge_imp.iter())
            .filter(|((u, v), _)| *u == i || *v == i)
            .map(|(_, &w)| w)
            .fold(0.0, f64::max);
        assert_eq!(imp, best);
    }
}

#[test]
fn test_gnn_explainer_without_feature_mask() {
    let dataset = shape_graph();
    let model = MeanConvModel::first_feature_detector(2, dataset.num_features());
    let config = ExplainerConfig {
        num_epochs: 10,
        ..Default::default()
    };
    let mut explainer = GnnExplainer::new(config).unwrap();
    let exp = explainer
        .explain_node(&model, &NodeQuery::new(0, dataset.x(), dataset.edge_index()))
        .unwrap();
    assert!(exp.feature_imp.is_none());
    assert_eq!(
        exp.edge_imp.as_ref().unwrap().len(),
        exp.enclosing_subgraph().unwrap().num_edges()
    );
}

#[test]
fn test_invalid_explainer_config_is_rejected() {
    let config = ExplainerConfig {
        lr: 0.0,
        ..Default::default()
    };
    assert!(matches!(GnnExplainer::new(config), Err(ShapeGraphError::Config(_))));
}
