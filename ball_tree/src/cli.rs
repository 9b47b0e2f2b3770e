//! CLI argument parsing (spec §6).
//!
//! Parsed by hand rather than through a declarative arg-parsing crate: the
//! spec pins an exact exit-code and message contract per failure mode
//! (wrong arg count -> 1, `n_dims < 2` -> 2, `n_points < 1` -> 3), and a
//! generic parser's own usage/error handling would not reproduce that
//! contract without fighting its defaults — see DESIGN.md.

use crate::error::BallTreeError;

#[derive(Debug, Clone, Copy)]
pub struct Config {
    pub n_dims: usize,
    pub n_points: usize,
    pub seed: u64,
}

pub fn parse(args: &[String]) -> Result<Config, BallTreeError> {
    let program = args.first().map(String::as_str).unwrap_or("ball-tree");

    if args.len() != 4 {
        return Err(BallTreeError::Usage {
            message: format!("Usage: {} <n_dims> <n_points> <seed>", program),
            exit_code: 1,
        });
    }

    let n_dims: i64 = args[1].parse().unwrap_or(-1);
    if n_dims < 2 {
        return Err(BallTreeError::Usage {
            message: format!("Illegal number of dimensions ({}), must be above 1.", n_dims),
            exit_code: 2,
        });
    }

    let n_points: i64 = args[2].parse().unwrap_or(-1);
    if n_points < 1 {
        return Err(BallTreeError::Usage {
            message: format!("Illegal number of points ({}), must be above 0.", n_points),
            exit_code: 3,
        });
    }

    let seed: u64 = args[3].parse().unwrap_or(0);

    Ok(Config {
        n_dims: n_dims as usize,
        n_points: n_points as usize,
        seed,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn wrong_arg_count_is_exit_1() {
        let err = parse(&args(&["ball-tree", "2", "10"])).unwrap_err();
        match err {
            BallTreeError::Usage { exit_code, .. } => assert_eq!(exit_code, 1),
            _ => panic!("expected usage error"),
        }
    }

    #[test]
    fn n_dims_below_two_is_exit_2() {
        let err = parse(&args(&["ball-tree", "1", "10", "42"])).unwrap_err();
        match err {
            BallTreeError::Usage { exit_code, .. } => assert_eq!(exit_code, 2),
            _ => panic!("expected usage error"),
        }
    }

    #[test]
    fn n_points_below_one_is_exit_3() {
        let err = parse(&args(&["ball-tree", "2", "0", "42"])).unwrap_err();
        match err {
            BallTreeError::Usage { exit_code, .. } => assert_eq!(exit_code, 3),
            _ => panic!("expected usage error"),
        }
    }

    #[test]
    fn valid_args_parse() {
        let cfg = parse(&args(&["ball-tree", "3", "1000", "42"])).unwrap();
        assert_eq!(cfg.n_dims, 3);
        assert_eq!(cfg.n_points, 1000);
        assert_eq!(cfg.seed, 42);
    }
}
