//! Timing helper: wall-clock elapsed seconds around a closure, matching
//! spec §6's required `"<seconds>\n"` stderr line.

use std::time::Instant;

pub fn timer<F: FnOnce()>(func: F) -> f64 {
    let start = Instant::now();
    func();
    start.elapsed().as_secs_f64()
}
