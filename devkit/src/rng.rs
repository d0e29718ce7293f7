/*!
Générateurs pseudo-aléatoires déterministes pour les tests du simulateur
*/

use rand::rngs::StdRng;
use rand::SeedableRng;

/// RNG reproductible : même graine, même séquence de ticks
pub fn seeded_rng(seed: u64) -> StdRng {
    StdRng::seed_from_u64(seed)
}
