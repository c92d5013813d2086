//! Water conservation facts shown between levels.

use rand::Rng;

/// The fact catalog.
pub const WATER_FACTS: [&str; 7] = [
    "A single dripping tap can waste over 5,000 liters of water per year!",
    "Fixing leaks in your home can save up to 10% on your water bill!",
    "Clean water is essential for life - over 2 billion people lack access to safe water!",
    "Agriculture uses about 70% of the world's freshwater supply!",
    "By 2025, half of the world's population may face water shortages!",
    "The average person uses about 150 liters of water per day!",
    "It takes 2,700 liters of water to make one cotton T-shirt!",
];

/// Fact at `index`, wrapping around the catalog.
pub fn fact(index: usize) -> &'static str {
    WATER_FACTS[index % WATER_FACTS.len()]
}

/// A uniformly chosen fact.
pub fn random_fact(rng: &mut impl Rng) -> &'static str {
    fact(rng.gen_range(0..WATER_FACTS.len()))
}
