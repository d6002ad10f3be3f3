//! Sequential vs parallel build generation over a synthetic catalog.
//!
//! Run with: `cargo bench --bench build_generator`

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rand::SeedableRng;
use rand_pcg::Pcg64;

use loadout::analytics::{AnalysisPipeline, AnalysisSnapshot, SynergyRules};
use loadout::classify::Classifiers;
use loadout::data::{CapsuleDefinition, Catalog, CharacterRecord, MatchCorpus, MatchRecord, Ruleset};
use loadout::optimizer::{BuildGenerator, GeneratorSettings, ScoringContext};
use loadout::parallel::WorkerPool;

const CAPSULES: usize = 120;

const EFFECTS: [&str; 8] = [
    "Increases damage dealt by rush attacks",
    "Reduces damage taken while guarding",
    "Ki cost of blasts reduced",
    "Recover health over time",
    "Boosts attack power of ki blasts",
    "Sparking mode lasts longer",
    "Lowers defense but raises power",
    "",
];

fn catalog() -> Catalog {
    let classifiers = Classifiers::standard().expect("built-in tables compile");
    let definitions = (0..CAPSULES)
        .map(|index| {
            CapsuleDefinition::new(
                format!("capsule_{index:03}"),
                format!("Capsule {index}"),
                (index % 6 + 1) as u32,
                EFFECTS[index % EFFECTS.len()],
            )
        })
        .collect();
    Catalog::classify(definitions, &classifiers)
}

/// Synthetic history touching every capsule in overlapping windows of seven.
fn snapshot(catalog: &Catalog) -> AnalysisSnapshot {
    let ids: Vec<String> = catalog.capsules().iter().map(|capsule| capsule.id.clone()).collect();
    let matches = (0..2_000)
        .map(|index| MatchRecord {
            capsules: (0..7).map(|slot| ids[(index * 3 + slot * 11) % ids.len()].clone()).collect(),
            won: index % 3 != 0,
            damage_dealt: 800.0 + (index % 17) as f64 * 50.0,
            damage_taken: 600.0 + (index % 13) as f64 * 40.0,
            hp_remaining: 5_000.0,
            hp_max: 40_000.0,
            battle_time: 75.0,
            team: None,
            ai_strategy: Some(["Rush", "Balanced", "Defensive"][index % 3].to_string()),
        })
        .collect();
    let corpus = MatchCorpus::new(vec![CharacterRecord {
        character: "Bench".to_string(),
        matches,
    }]);
    AnalysisPipeline::new(catalog, SynergyRules::standard().expect("pair rules compile")).run(&corpus)
}

fn bench_build_generation(c: &mut Criterion) {
    let catalog = catalog();
    let snapshot = snapshot(&catalog);
    let ruleset = Ruleset::default();
    let generator = BuildGenerator::new(&catalog, ScoringContext::from(&snapshot), &ruleset);
    let settings = GeneratorSettings {
        max_builds: 10,
        ..GeneratorSettings::default()
    };

    let mut group = c.benchmark_group("build_generator");
    group.sample_size(20);

    group.bench_function("sequential", |b| {
        b.iter(|| {
            let mut rng = Pcg64::seed_from_u64(42);
            black_box(generator.generate(&settings, &mut rng))
        })
    });

    group.bench_function("parallel", |b| {
        let workers = WorkerPool::default();
        b.iter(|| black_box(generator.generate_parallel(&settings, 42, &workers)))
    });

    group.finish();
}

fn bench_analysis(c: &mut Criterion) {
    let catalog = catalog();
    c.bench_function("analysis_pipeline", |b| b.iter(|| black_box(snapshot(&catalog))));
}

criterion_group!(benches, bench_build_generation, bench_analysis);
criterion_main!(benches);
