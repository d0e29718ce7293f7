/*!
# mjfleet DevKit - Utilitaires de test

Bibliothèque partagée par les tests du kernel:
- Harness HTTP en mémoire pour les routes axum
- RNG seedés pour des ticks de simulation reproductibles
*/

pub mod rng;
pub mod test_utils;

pub use rng::seeded_rng;
pub use test_utils::TestHarness;
