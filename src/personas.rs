//! CID persona agents: adversarial submitters that probe how the
//! contract and its observers handle noisy, overconfident, or opposing
//! predictions.

use std::time::Duration;

use clap::ValueEnum;
use ethers::prelude::*;
use ethers::utils::keccak256;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::AgentResult;
use crate::eth::client::PredictionClient;
use crate::eth::{events, submit};
use crate::types::PredictionIntent;

/// How far past the current head persona predictions expire.
const EXPIRY_OFFSET: u64 = 75;

/// Blocks Contrarian scans back for the latest prediction.
const CONTRARIAN_LOOKBACK: u64 = 5_000;

const AMBIGUOUS_PHRASES: [&str; 5] = [
    "Something may happen... probably.",
    "Funds might or might not move.",
    "An entity could interact with something undefined.",
    "Activity expected in a non-specific timeframe.",
    "Uncertain events involving unspecified wallets.",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Persona {
    /// Inverts the most recent prediction it can find.
    Contrarian,
    /// Always submits at 100% confidence.
    Overconfident,
    /// Submits plausible-looking noise.
    Obfuscator,
    /// Floods the contract with a burst of random predictions.
    EntropyBomber,
}

impl Persona {
    pub fn name(self) -> &'static str {
        match self {
            Persona::Contrarian => "Contrarian",
            Persona::Overconfident => "Overconfident",
            Persona::Obfuscator => "Obfuscator",
            Persona::EntropyBomber => "EntropyBomber",
        }
    }

    fn headline(self) -> &'static str {
        match self {
            Persona::Contrarian => "CID Contrarian submitted opposing prediction:",
            Persona::Overconfident => "CID Overconfident submitted prediction:",
            Persona::Obfuscator => "CID Obfuscator submitted fake prediction:",
            Persona::EntropyBomber => "EntropyBomber prediction submitted:",
        }
    }
}

/// Runs one persona to completion, returning the hashes it broadcast.
pub async fn run_persona<P: JsonRpcClient>(
    client: &PredictionClient<P>,
    persona: Persona,
) -> AgentResult<Vec<TxHash>> {
    let mut rng = StdRng::from_entropy();

    match persona {
        Persona::EntropyBomber => {
            let iterations = rng.gen_range(5..=10);
            let mut hashes = Vec::with_capacity(iterations);

            for i in 0..iterations {
                let expiry_block = client.block_number().await? + EXPIRY_OFFSET;
                let intent = random_intent(&mut rng, expiry_block);

                let hash = submit::submit_prediction(client, &intent).await?;
                println!("EntropyBomber prediction #{} submitted:", i + 1);
                report(&intent, hash);
                hashes.push(hash);

                if i + 1 < iterations {
                    let pause = rng.gen_range(1_000..=5_000);
                    tokio::time::sleep(Duration::from_millis(pause)).await;
                }
            }

            Ok(hashes)
        }
        _ => {
            let expiry_block = client.block_number().await? + EXPIRY_OFFSET;

            let intent = match persona {
                Persona::Contrarian => {
                    match events::latest_prediction(client, CONTRARIAN_LOOKBACK).await? {
                        Some(latest) => contrarian_intent(&latest, expiry_block),
                        None => random_intent(&mut rng, expiry_block),
                    }
                }
                Persona::Overconfident => {
                    let mut intent = random_intent(&mut rng, expiry_block);
                    intent.confidence = 100;
                    intent
                }
                _ => random_intent(&mut rng, expiry_block),
            };

            let hash = submit::submit_prediction(client, &intent).await?;
            println!("{}", persona.headline());
            report(&intent, hash);

            Ok(vec![hash])
        }
    }
}

fn report(intent: &PredictionIntent, hash: TxHash) {
    println!("Tx hash: {hash:?}");
    println!("Confidence: {}", intent.confidence);
    println!("Description: {}", intent.description);
    println!("Variables Hash: 0x{}", hex::encode(intent.variables_hash));
    println!("Expires at block: {}", intent.expiry_block);
}

pub fn random_intent(rng: &mut impl Rng, expiry_block: u64) -> PredictionIntent {
    PredictionIntent {
        confidence: random_confidence(rng),
        variables_hash: fake_variables_hash(rng),
        expiry_block,
        description: ambiguous_description(rng),
    }
}

pub fn random_confidence(rng: &mut impl Rng) -> u64 {
    rng.gen_range(1..=100)
}

pub fn ambiguous_description(rng: &mut impl Rng) -> String {
    AMBIGUOUS_PHRASES[rng.gen_range(0..AMBIGUOUS_PHRASES.len())].to_string()
}

/// Keccak of "noise:" plus a short random alphanumeric suffix.
pub fn fake_variables_hash(rng: &mut impl Rng) -> [u8; 32] {
    let suffix: String = (0..11)
        .map(|_| char::from(rng.sample(rand::distributions::Alphanumeric)))
        .collect();
    keccak256(format!("noise:{suffix}").as_bytes())
}

fn contrarian_intent(latest: &events::SubmittedPrediction, expiry_block: u64) -> PredictionIntent {
    PredictionIntent {
        confidence: invert_confidence(latest.confidence),
        variables_hash: mutate_variables_hash(latest.variables_hash.0),
        expiry_block,
        description: invert_description(&latest.description),
    }
}

pub fn invert_confidence(confidence: u64) -> u64 {
    100u64.saturating_sub(confidence).max(1)
}

pub fn invert_description(description: &str) -> String {
    if description.is_empty() {
        return "No prediction available.".to_string();
    }

    let rewrites = [
        ("may happen", "will not happen"),
        ("might", "will not"),
        ("could", "could not"),
        ("expected", "not expected"),
        ("Uncertain", "Certain"),
    ];
    for (from, to) in rewrites {
        if description.contains(from) {
            return description.replacen(from, to, 1);
        }
    }

    format!("Opposite of: {description}")
}

/// Toggles the last hex digit between 'f' and 'e'.
pub fn mutate_variables_hash(hash: [u8; 32]) -> [u8; 32] {
    let mut out = hash;
    out[31] = if out[31] & 0x0f == 0x0f {
        (out[31] & 0xf0) | 0x0e
    } else {
        (out[31] & 0xf0) | 0x0f
    };
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inverted_confidence_mirrors_and_stays_positive() {
        assert_eq!(invert_confidence(80), 20);
        assert_eq!(invert_confidence(1), 99);
        assert_eq!(invert_confidence(100), 1);
        assert_eq!(invert_confidence(0), 1);
    }

    #[test]
    fn description_rewrites_apply_in_priority_order() {
        assert_eq!(
            invert_description("Something may happen... probably."),
            "Something will not happen... probably."
        );
        assert_eq!(
            invert_description("Funds might or might not move."),
            "Funds will not or might not move."
        );
        assert_eq!(
            invert_description("Uncertain events involving unspecified wallets."),
            "Certain events involving unspecified wallets."
        );
        assert_eq!(
            invert_description("The sky is blue."),
            "Opposite of: The sky is blue."
        );
        assert_eq!(invert_description(""), "No prediction available.");
    }

    #[test]
    fn hash_mutation_only_touches_the_last_digit() {
        let mut hash = [0xabu8; 32];
        let mutated = mutate_variables_hash(hash);
        assert_eq!(&mutated[..31], &hash[..31]);
        assert_eq!(mutated[31], 0xaf);

        hash[31] = 0xaf;
        assert_eq!(mutate_variables_hash(hash)[31], 0xae);
        hash[31] = 0xae;
        assert_eq!(mutate_variables_hash(hash)[31], 0xaf);
    }

    #[test]
    fn random_intents_stay_in_contract_ranges() {
        let mut rng = StdRng::seed_from_u64(42);

        for _ in 0..100 {
            let intent = random_intent(&mut rng, 500);
            assert!((1..=100).contains(&intent.confidence));
            assert_eq!(intent.expiry_block, 500);
            assert!(AMBIGUOUS_PHRASES.contains(&intent.description.as_str()));
            assert_ne!(intent.variables_hash, [0u8; 32]);
        }
    }

    #[test]
    fn fake_hashes_differ_between_draws() {
        let mut rng = StdRng::seed_from_u64(7);
        assert_ne!(fake_variables_hash(&mut rng), fake_variables_hash(&mut rng));
    }
}
