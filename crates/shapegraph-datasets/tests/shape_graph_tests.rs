use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use shapegraph_core::{BaseGraph, GenerationVariant, MotifKind, ShapeGraphConfig, ShapeGraphError};
use shapegraph_datasets::{
    split_size, verify_motifs, HostGraph, HostGraphParams, Motif, ShapeGraph,
};
use std::collections::BTreeMap;
use tempfile::TempDir;

fn house_config(seed: u64) -> ShapeGraphConfig {
    ShapeGraphConfig {
        seed: Some(seed),
        num_subgraphs: 10,
        subgraph_size: 13,
        ..Default::default()
    }
}

#[test]
fn test_ten_houses_end_to_end() {
    let dataset = ShapeGraph::new(house_config(1234)).unwrap();
    let n = dataset.num_nodes();

    assert_eq!(n, 10 * (13 + 5));
    assert_eq!(dataset.shapes().iter().filter(|&&s| s != 0).count(), 10 * 5);
    assert_eq!(dataset.x().nrows(), n);
    assert_eq!(dataset.y().len(), n);
    assert!(dataset.attempts() >= 1 && dataset.attempts() <= 5);
    assert!(verify_motifs(dataset.host(), dataset.motif()));

    let masks = dataset.masks();
    assert_eq!(masks.train_count(), split_size(n, 0.7));
    assert_eq!(masks.test_count(), split_size(n, 0.25));
    assert_eq!(masks.valid_count(), split_size(n, 0.05));
}

#[test]
fn test_each_motif_id_owns_one_instance() {
    let dataset = ShapeGraph::new(house_config(1234)).unwrap();
    let mut sizes: BTreeMap<u32, usize> = BTreeMap::new();
    for &s in dataset.shapes() {
        *sizes.entry(s).or_default() += 1;
    }
    assert_eq!(sizes.remove(&0), Some(10 * 13));
    assert_eq!(sizes.len(), 10);
    assert!(sizes.values().all(|&size| size == 5));
    assert_eq!(dataset.host().anchors().len(), 10);
    for &anchor in dataset.host().anchors() {
        assert_eq!(dataset.shapes()[anchor], 0);
    }
}

#[test]
fn test_same_seed_same_dataset() {
    let a = ShapeGraph::new(house_config(99)).unwrap();
    let b = ShapeGraph::new(house_config(99)).unwrap();
    assert_eq!(a.host().edges(), b.host().edges());
    assert_eq!(a.shapes(), b.shapes());
    assert_eq!(a.y(), b.y());
    assert_eq!(a.x(), b.x());
    assert_eq!(a.feature_imp(), b.feature_imp());
    assert_eq!(a.sensitive_feature(), b.sensitive_feature());
    assert_eq!(a.masks(), b.masks());
}

#[test]
fn test_split_masks_ignore_topology_seed() {
    let a = ShapeGraph::new(house_config(1)).unwrap();
    let b = ShapeGraph::new(house_config(2)).unwrap();
    assert_ne!(a.host().edges(), b.host().edges());
    assert_eq!(a.masks(), b.masks());
}

#[test]
fn test_split_masks_overlap() {
    // Masks are sampled independently rather than partitioned.
    let dataset = ShapeGraph::new(house_config(1234)).unwrap();
    assert!(dataset.masks().overlap() > 0);
}

#[test]
fn test_every_explanation_matches_its_khop() {
    let dataset = ShapeGraph::new(house_config(1234)).unwrap();
    let explanations = dataset.explanations().unwrap();
    assert_eq!(explanations.len(), dataset.num_nodes());

    for (n, exp) in explanations.iter().enumerate() {
        let sub = exp.enclosing_subgraph().unwrap();
        assert_eq!(exp.node_idx(), Some(n));
        assert_eq!(sub.nodes[sub.mapping], n);
        assert_eq!(exp.node_imp.as_ref().unwrap().len(), sub.num_nodes());
        assert_eq!(exp.edge_imp.as_ref().unwrap().len(), sub.num_edges());
        assert_eq!(exp.feature_imp.as_ref().unwrap(), dataset.feature_imp());
    }
}

#[test]
fn test_labels_mark_nodes_between_motifs() {
    let dataset = ShapeGraph::new(house_config(1234)).unwrap();
    for n in 0..dataset.num_nodes() {
        let expected = usize::from(dataset.host().shapes_near(n, 1).len() >= 2);
        assert_eq!(dataset.y()[n], expected);
    }
}

#[test]
fn test_sensitive_feature_is_recoverable() {
    let dataset = ShapeGraph::new(house_config(5)).unwrap();
    let idx = dataset.sensitive_feature().unwrap();
    assert_eq!(dataset.num_features(), 11);
    assert_eq!(dataset.feature_imp()[idx], 0.0);
    assert_eq!(dataset.feature_imp().sum(), 4.0);
    assert!(dataset
        .x()
        .column(idx)
        .iter()
        .all(|&v| v == 0.0 || v == 1.0));

    let without = ShapeGraph::new(ShapeGraphConfig {
        features: shapegraph_core::FeatureConfig {
            add_sensitive_feature: false,
            ..Default::default()
        },
        ..house_config(5)
    })
    .unwrap();
    assert_eq!(without.num_features(), 10);
    assert!(without.sensitive_feature().is_none());
}

#[test]
fn test_uniform_variant_with_circle_motif() {
    let config = ShapeGraphConfig {
        variant: GenerationVariant::Uniform,
        prob_connection: 0.5,
        shape: MotifKind::Circle,
        ..house_config(8)
    };
    let dataset = ShapeGraph::new(config).unwrap();
    assert_eq!(dataset.motif().name(), "circle");
    assert_eq!(dataset.num_nodes(), 10 * (13 + 5));
    assert!(verify_motifs(dataset.host(), dataset.motif()));
}

#[test]
fn test_uniform_variant_with_erdos_renyi_base() {
    let config = ShapeGraphConfig {
        variant: GenerationVariant::Uniform,
        base_graph: BaseGraph::ErdosRenyi { edge_prob: 0.08 },
        ..house_config(8)
    };
    let dataset = ShapeGraph::new(config).unwrap();
    assert_eq!(dataset.num_nodes(), 10 * (13 + 5));
    assert_eq!(dataset.shapes().iter().filter(|&&s| s != 0).count(), 50);
}

#[test]
fn test_unverifiable_motif_exhausts_retries() {
    // A single edge occurs all over the base graphs.
    let config = ShapeGraphConfig {
        shape: MotifKind::Custom {
            num_nodes: 2,
            edges: vec![(0, 1)],
        },
        max_tries_verification: 3,
        ..house_config(1234)
    };
    match ShapeGraph::new(config) {
        Err(ShapeGraphError::ConstructionExhausted { attempts }) => assert_eq!(attempts, 3),
        other => panic!("expected exhaustion, got {:?}", other.map(|d| d.num_nodes())),
    }
}

#[test]
fn test_disabled_verification_takes_first_graph() {
    let config = ShapeGraphConfig {
        shape: MotifKind::Custom {
            num_nodes: 2,
            edges: vec![(0, 1)],
        },
        verify: false,
        ..house_config(1234)
    };
    let dataset = ShapeGraph::new(config).unwrap();
    assert_eq!(dataset.attempts(), 1);
    assert_eq!(dataset.num_nodes(), 10 * (13 + 2));
}

#[test]
fn test_injected_house_fails_verification() {
    let motif = Motif::house();
    let config = house_config(1234);
    let params = HostGraphParams::from_config(&config, &motif);
    let mut rng = ChaCha8Rng::seed_from_u64(42);
    let mut host = HostGraph::build(&params, &mut rng);
    assert!(verify_motifs(&host, &motif));

    // One untagged node from each of five subgraphs, pairwise non-adjacent.
    let mut picked: Vec<usize> = Vec::new();
    for s in 0..5 {
        let node = (s * 18..s * 18 + 13)
            .find(|&n| picked.iter().all(|&p| !host.closed_neighborhood(p, 1).contains(&n)))
            .unwrap();
        picked.push(node);
    }
    for (u, v) in motif.edges() {
        host.add_edge(picked[u], picked[v]).unwrap();
    }
    assert!(!verify_motifs(&host, &motif));
}

#[test]
fn test_save_and_load_round_trip() {
    let dataset = ShapeGraph::new(house_config(1234)).unwrap();
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("shape_graph.bin");

    dataset.save(&path).unwrap();
    let loaded = ShapeGraph::load(&path).unwrap();

    assert_eq!(loaded.seed(), 1234);
    assert_eq!(loaded.config(), dataset.config());
    assert_eq!(loaded.host().edges(), dataset.host().edges());
    assert_eq!(loaded.x(), dataset.x());
    assert_eq!(loaded.y(), dataset.y());
    assert_eq!(loaded.masks(), dataset.masks());
    assert_eq!(loaded.explanation(17), dataset.explanation(17));
    assert_eq!(loaded.host().node(3), dataset.host().node(3));
}

#[test]
fn test_load_missing_file_is_io_error() {
    let dir = TempDir::new().unwrap();
    let result = ShapeGraph::load(&dir.path().join("missing.bin"));
    assert!(matches!(result, Err(ShapeGraphError::Io(_))));
}
