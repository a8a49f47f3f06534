use evorecon::libs::phylo::date::randomize_node_times;
use evorecon::libs::recon::species::NodeKind;
use evorecon::{reconcile, Composite, EventTag, LayoutConfig, ReconError, ReconStream, Tree};
use rand::rngs::SmallRng;
use rand::SeedableRng;
use std::io::Write;

const SPECIES: &str = "tests/recon/species.nwk";
const FAMILIES: [&str; 3] = [
    "tests/recon/fam1.txt",
    "tests/recon/fam2.txt",
    "tests/recon/fam3.txt",
];

fn init() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn inputs() -> anyhow::Result<(String, Vec<ReconStream>)> {
    let newick = std::fs::read_to_string(SPECIES)?;
    let streams = FAMILIES
        .iter()
        .map(|f| ReconStream::from_file(f))
        .collect::<anyhow::Result<Vec<_>>>()?;
    Ok((newick, streams))
}

#[test]
fn reconcile_end_to_end() -> anyhow::Result<()> {
    init();
    let (newick, streams) = inputs()?;
    let config = LayoutConfig::default();
    let composite = reconcile(&newick, &streams, &config, 1)?;

    // C spans one extra slice and D two
    assert_eq!(composite.slices, vec![3.0, 2.0, 1.0, 0.0]);
    assert_eq!(composite.dead_chain.len(), 4);
    assert_eq!(
        composite.to_newick()?,
        "(((SD:1)I2:1)I1:1,((SC:1)I0:1,(SA:1,SB:1)AB:1)ABC:1)R;"
    );

    assert_eq!(composite.gene_trees.len(), 3);
    let fam1 = &composite.gene_trees[0];
    assert_eq!(fam1.event_counts.get(&EventTag::S), Some(&3));
    assert_eq!(fam1.event_counts.get(&EventTag::D), Some(&1));
    assert_eq!(fam1.event_counts.get(&EventTag::SL), Some(&1));

    let (left, right) = (config.pad_left, config.width - config.pad_right);
    let (top, bottom) = (config.pad_top, config.height - config.pad_bottom);
    for tree in &composite.gene_trees {
        for node in &tree.nodes {
            let host = node.host.expect("every gene node has a host");
            assert_ne!(host, composite.pseudo_root);
            let (x, y) = (node.x.unwrap(), node.y.unwrap());
            assert!(x > left && x < right, "{} x = {}", node.name, x);
            assert!(y >= top && y <= bottom, "{} y = {}", node.name, y);
        }
    }

    // the dead-lineage family rides the dead chain
    let fam3 = &composite.gene_trees[2];
    let dead_riders = fam3
        .nodes
        .iter()
        .filter(|n| composite.species.node(n.host.unwrap()).kind == NodeKind::Dead)
        .count();
    assert_eq!(dead_riders, 2);

    Ok(())
}

#[test]
fn reconcile_is_deterministic() -> anyhow::Result<()> {
    init();
    let (newick, streams) = inputs()?;
    let config = LayoutConfig::default();

    let first = reconcile(&newick, &streams, &config, 1)?.to_json()?;
    let second = reconcile(&newick, &streams, &config, 1)?.to_json()?;
    assert_eq!(first, second);

    let parallel = reconcile(&newick, &streams, &config, 4)?.to_json()?;
    assert_eq!(first, parallel);

    Ok(())
}

#[test]
fn reconcile_writes_json() -> anyhow::Result<()> {
    init();
    let (newick, streams) = inputs()?;
    let config = LayoutConfig::from_json(r#"{"width": 1200, "height": 800}"#)?;
    let composite = reconcile(&newick, &streams, &config, 2)?;

    let mut file = tempfile::NamedTempFile::new()?;
    file.write_all(composite.to_json()?.as_bytes())?;
    let text = std::fs::read_to_string(file.path())?;
    let json: serde_json::Value = serde_json::from_str(&text)?;

    assert!(json["frame"]["slice_height"].as_f64().unwrap() > 0.0);
    let trees = json["gene_trees"].as_array().unwrap();
    assert_eq!(trees.len(), 3);
    assert_eq!(trees[1]["source"], "tests/recon/fam2.txt");
    let nodes = trees[1]["nodes"].as_array().unwrap();
    assert!(nodes.iter().any(|n| n["mapped_to"][0]["event"] == "T0"));
    assert!(nodes.iter().all(|n| n["x"].is_f64() && n["y"].is_f64()));

    Ok(())
}

#[test]
fn reconcile_reports_first_error() -> anyhow::Result<()> {
    init();
    let (newick, mut streams) = inputs()?;
    streams.push(ReconStream::new("broken", "g0:AB,S,A,B:A_1,E_1"));

    match reconcile(&newick, &streams, &LayoutConfig::default(), 2) {
        Err(ReconError::UnmappedLeaf { gene, species }) => {
            assert_eq!(gene, "E_1");
            assert_eq!(species, "E");
        }
        res => panic!("Expected UnmappedLeaf, got {:?}", res.map(|c| c.gene_trees.len())),
    }

    assert!(matches!(
        reconcile("((A:1,B:2)AB:1,C:2)R;", &streams, &LayoutConfig::default(), 1),
        Err(ReconError::NotUltrametric { .. })
    ));

    Ok(())
}

#[test]
fn randomly_dated_tree_builds() -> anyhow::Result<()> {
    init();
    let trees = Tree::from_file(SPECIES)?;
    let mut rng = SmallRng::seed_from_u64(7);

    for _ in 0..5 {
        let dated = randomize_node_times(&trees[0], 10.0, &mut rng)?;
        let composite = Composite::build(&dated)?;
        assert!((composite.slices[0] - 10.0).abs() < 1e-6);
        assert_eq!(composite.slices.len(), 4);
        assert_eq!(composite.dead_chain.len(), 4);
    }

    Ok(())
}
