mod checks;

use mpi::traits::*;

fn main() {
    let universe = mpi::initialize().expect("MPI environment failed to initialize");
    let world = universe.world();
    let rank = world.rank();

    if rank == 0 {
        println!("Distributed ball-tree invariant checks:");
    }

    checks::check_scenario(&world, 2, 64, 7);
    checks::check_scenario(&world, 4, 500, 11);
    checks::check_determinism(&world, 3, 120, 5);

    if rank == 0 {
        println!("all distributed checks passed");
    }
}
