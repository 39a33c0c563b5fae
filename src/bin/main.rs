use graph_locality::benchmark::{run_spmv, run_tc};
use graph_locality::builder::BuilderBase;
use graph_locality::config::Params;
use graph_locality::generator::Generator;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::error;
use tracing_subscriber::EnvFilter;

const SCALE: usize = 14;
const DEGREE: usize = 8;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let params = Params::default();
    let generator = Generator::new(SCALE, DEGREE).with_seed(params.seed);
    let mut edge_list = generator.generate_edge_list();
    generator.permutate_ids(&mut edge_list);

    let result = BuilderBase::new()
        .make_graph_from_edge_list(&edge_list)
        .and_then(|graph| {
            let mut rng = StdRng::seed_from_u64(params.seed);
            run_spmv(&graph, &params, &mut rng)?;
            run_tc(&graph, &params, &mut rng)
        });

    if let Err(e) = result {
        error!("{}", e);
        std::process::exit(1);
    }
}
