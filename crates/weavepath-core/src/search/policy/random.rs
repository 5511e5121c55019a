use std::fmt::Debug;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::search::{
    error::PolicyError,
    policy::{ActionPolicy, ensure_choices},
};

/// Default policy drawing one of the offered actions uniformly at random.
#[derive(Debug, Clone)]
pub struct UniformRandomPolicy {
    rng: ChaCha8Rng,
}

impl UniformRandomPolicy {
    /// Create a policy with deterministic RNG seed.
    pub fn new(seed: u64) -> Self {
        UniformRandomPolicy {
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }
}

impl<N, A> ActionPolicy<N, A> for UniformRandomPolicy
where
    N: Debug,
    A: Clone,
{
    fn choose_action(&mut self, node: &N, successors: &[(A, N)]) -> Result<A, PolicyError> {
        ensure_choices(node, successors)?;
        let index = self.rng.gen_range(0..successors.len());
        Ok(successors[index].0.clone())
    }
}
