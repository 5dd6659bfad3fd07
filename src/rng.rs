use rand::{rngs::SmallRng, SeedableRng};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Small RNG remembering the seed it was built from, so that only the seed is
/// persisted.
#[derive(Clone, Debug)]
pub struct MaybeSeededRng {
    pub seed: Option<u64>,
    rng: SmallRng,
}

impl MaybeSeededRng {
    pub fn new(seed: Option<u64>) -> Self {
        let rng = if let Some(seed) = seed {
            SmallRng::seed_from_u64(seed)
        } else {
            SmallRng::from_os_rng()
        };

        Self { seed, rng }
    }

    pub fn get_rng(&mut self) -> &mut SmallRng {
        &mut self.rng
    }
}

impl Serialize for MaybeSeededRng {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.seed.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for MaybeSeededRng {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let seed = Deserialize::deserialize(deserializer)?;
        Ok(Self::new(seed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    const SEED: u64 = 1234;

    #[test]
    fn seeded_streams_repeat() {
        let mut first = MaybeSeededRng::new(Some(SEED));
        let mut second = MaybeSeededRng::new(Some(SEED));
        for _ in 0..10 {
            assert_eq!(
                first.get_rng().random::<u64>(),
                second.get_rng().random::<u64>()
            );
        }
    }

    #[test]
    fn restores_from_seed() {
        let rng = MaybeSeededRng::new(Some(SEED));
        let json = serde_json::to_string(&rng).unwrap();
        assert_eq!(json, "1234");

        let mut restored: MaybeSeededRng = serde_json::from_str(&json).unwrap();
        let mut fresh = MaybeSeededRng::new(Some(SEED));
        assert_eq!(restored.seed, Some(SEED));
        assert_eq!(
            restored.get_rng().random::<u64>(),
            fresh.get_rng().random::<u64>()
        );
    }
}
