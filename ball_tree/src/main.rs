//! Entry point (spec §6): bootstraps MPI, parses CLI arguments, spreads
//! generated points out to ranks, builds the distributed/shared-memory
//! ball tree, times the build, and dumps the result in rank order.

use std::process;

use mpi::topology::Color;
use mpi::traits::*;

use ball_tree::{cli, distributed_tree, generator, node::NodeSink, output, point::Shard, time};

const TERMINATE: i64 = -1;

fn main() {
    env_logger::init();

    let universe = mpi::initialize().expect("MPI environment failed to initialize");
    let world = universe.world();
    let rank = world.rank();
    let size = world.size();

    let args: Vec<String> = std::env::args().collect();
    let config = match cli::parse(&args) {
        Ok(config) => config,
        Err(err) => {
            if rank == 0 {
                println!("{}", err);
            }
            let exit_code = match err {
                ball_tree::error::BallTreeError::Usage { exit_code, .. } => exit_code,
                _ => 1,
            };
            process::exit(exit_code);
        }
    };

    let active = (rank as usize) < config.n_points.min(size as usize);

    // Process group (spec §6): exclude ranks [n_points, P) from the
    // communicator the distributed builder actually recurses over.
    let reduced = world
        .split_by_color(if active { Color::with_value(0) } else { Color::undefined() });

    // Spread-to-ranks protocol, over the top-level communicator: rank 0
    // materializes the whole point set once (deterministic from the seed)
    // and ships each rank's contiguous slice, or TERMINATE if unused.
    let active_ranks = config.n_points.min(size as usize);
    let shard = if rank == 0 {
        let all_points = generator::generate_points(config.n_dims, config.n_points, config.seed);
        let base = config.n_points / active_ranks;
        let remainder = config.n_points % active_ranks;
        let counts: Vec<usize> = (0..size as usize)
            .map(|r| if r < active_ranks { base + if r < remainder { 1 } else { 0 } } else { 0 })
            .collect();

        let mut offset = 0usize;
        let mut my_shard = Shard::empty(config.n_dims);
        for r in 0..size as usize {
            let count = counts[r];
            if r == 0 {
                let coords: Vec<f64> = (offset..offset + count)
                    .flat_map(|i| all_points.point(i).to_vec())
                    .collect();
                my_shard = Shard::from_coords(config.n_dims, coords);
            } else {
                let peer = world.process_at_rank(r as i32);
                let n = if count == 0 { TERMINATE } else { count as i64 };
                peer.send(&n);
                for (local_idx, i) in (offset..offset + count).enumerate() {
                    let point = all_points.point(i);
                    peer.send_with_tag(point, local_idx as i32);
                }
            }
            offset += count;
        }
        my_shard
    } else {
        let root = world.process_at_rank(0);
        let (n, _status) = root.receive::<i64>();
        if n == TERMINATE {
            Shard::empty(config.n_dims)
        } else {
            let n = n as usize;
            let mut coords = Vec::with_capacity(n * config.n_dims);
            for local_idx in 0..n {
                let (point, _status) = root.receive_vec_with_tag::<f64>(local_idx as i32);
                coords.extend_from_slice(&point);
            }
            Shard::from_coords(config.n_dims, coords)
        }
    };

    let sink = NodeSink::new();
    let mut elapsed = 0.0f64;

    if let Some(team) = reduced {
        elapsed = time::timer(|| {
            distributed_tree::build(team, shard, config.n_points, 0, &sink);
        });
    }

    let nodes = sink.into_vec();

    if rank == 0 {
        output::print_header(config.n_dims, 2 * config.n_points - 1);
    }
    output::dump_in_rank_order(&nodes, &world);

    if rank == 0 {
        eprintln!("{}", elapsed);
    }
}
