//! Tree dump (spec §6).
//!
//! Rank 0 prints the header line; then every rank's local node sink is
//! flushed to stdout in rank order via a ring token-pass — each rank
//! prints its whole list once it receives the token, then forwards the
//! token to the next rank, so the concatenated output across all ranks'
//! stdout streams reads in a stable, rank-ordered sequence. Adapted from
//! `ballAlg-mpi.c::main`'s tail (`MPI_Send`/`MPI_Recv` token chain around
//! `dump_tree`).

use mpi::topology::SystemCommunicator;
use mpi::traits::*;
use std::io::Write;

use crate::node::Node;

const TOKEN_TAG: i32 = 0;

/// Prints the header line. Must be called by rank 0 only.
pub fn print_header(dims: usize, total_nodes: usize) {
    println!("{} {}", dims, total_nodes);
}

fn print_node(node: &Node) {
    let mut line = format!(
        "{} {} {} {:.6}",
        node.id, node.left_id, node.right_id, node.radius
    );
    for c in &node.center {
        line.push(' ');
        line.push_str(&format!("{:.6}", c));
    }
    line.push(' ');
    println!("{}", line);
}

fn print_nodes(nodes: &[Node]) {
    let stdout = std::io::stdout();
    let mut handle = stdout.lock();
    for node in nodes {
        print_node(node);
    }
    let _ = handle.flush();
}

/// Ring token-pass dump across `comm`. Every rank calls this; only rank 0's
/// caller is expected to have printed the header beforehand.
pub fn dump_in_rank_order(nodes: &[Node], comm: &SystemCommunicator) {
    let rank = comm.rank();
    let size = comm.size();

    if size < 2 {
        print_nodes(nodes);
        return;
    }

    if rank == 0 {
        print_nodes(nodes);
        let token = 1i32;
        comm.process_at_rank(1).send_with_tag(&token, TOKEN_TAG);
        let _ = comm.process_at_rank(size - 1).receive_with_tag::<i32>(TOKEN_TAG);
    } else {
        let _ = comm.process_at_rank(rank - 1).receive_with_tag::<i32>(TOKEN_TAG);
        print_nodes(nodes);
        let next = (rank + 1) % size;
        let token = 1i32;
        comm.process_at_rank(next).send_with_tag(&token, TOKEN_TAG);
    }
}
