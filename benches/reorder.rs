use criterion::{black_box, criterion_group, criterion_main, Criterion};
use graph_locality::builder::BuilderBase;
use graph_locality::cache::SetAssociativeCache;
use graph_locality::degree::degree_order;
use graph_locality::generator::Generator;
use graph_locality::lpn::{LabelPropagator, Neighborhood, Selection};
use graph_locality::tc::TriangleView;
use graph_locality::Graph;
use rand::rngs::StdRng;
use rand::SeedableRng;

const SCALE: usize = 12;
const DEGREE: usize = 8;

fn make_graph() -> Graph {
    let edges = Generator::new(SCALE, DEGREE).generate_edge_list();
    BuilderBase::new()
        .make_graph_from_edge_list(&edges)
        .expect("generated edges are in range")
}

fn bench_reorderings(c: &mut Criterion) {
    let graph = make_graph();

    c.bench_function("degree_order", |b| b.iter(|| degree_order(black_box(&graph))));

    for &(name, selection, neighborhood) in &[
        ("freq_lpn", Selection::MaxFrequency, Neighborhood::All),
        ("freq_lpn_db", Selection::MaxFrequency, Neighborhood::DegreeBucketed),
        ("min_lpn", Selection::MinLabel, Neighborhood::All),
        ("min_lpn_db", Selection::MinLabel, Neighborhood::DegreeBucketed),
    ] {
        let lp = LabelPropagator::new(selection, neighborhood, 1);
        c.bench_function(name, |b| {
            let mut rng = StdRng::seed_from_u64(graph_locality::K_RAND_SEED);
            b.iter(|| lp.order(black_box(&graph), &mut rng).unwrap())
        });
    }
}

fn bench_tc(c: &mut Criterion) {
    let mut graph = make_graph();
    graph.sort_adjacencies();
    let view = TriangleView::new(graph).expect("builder output is symmetric and sorted");
    let visit: Vec<usize> = (0..view.num_nodes()).collect();
    let mut hmap = view.hashmap().unwrap();

    c.bench_function("tc_hashmap", |b| {
        b.iter(|| {
            let mut cache = SetAssociativeCache::with_default_geometry().unwrap();
            view.count_with(black_box(&visit), &mut hmap, &mut cache).unwrap()
        })
    });
}

criterion_group!(benches, bench_reorderings, bench_tc);
criterion_main!(benches);
