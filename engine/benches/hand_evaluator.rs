//! Benchmark harness for hand evaluator throughput
//!
//! Measures 7-card evaluation on a deterministic batch of boards and hands.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use gto_engine::card::Card;
use gto_engine::evaluator::{generate_hands, HandEvaluator, MaskEvaluator};

fn benchmark_scalar_evaluation(c: &mut Criterion) {
    let evaluator = MaskEvaluator::new();
    let (boards, hands) = generate_hands(100_000, 12345);

    c.bench_function("hand_evaluator_7card_scalar", |b| {
        b.iter(|| {
            let mut sum = 0u64;
            for (board, hand) in black_box(&boards).iter().zip(black_box(&hands)) {
                sum += evaluator.evaluate_7cards(*board, *hand).value() as u64;
            }
            black_box(sum)
        })
    });
}

fn benchmark_batch_evaluation(c: &mut Criterion) {
    let evaluator = MaskEvaluator::new();
    let (boards, hands) = generate_hands(100_000, 12345);

    c.bench_function("hand_evaluator_7card_batch", |b| {
        b.iter(|| {
            let results = evaluator.evaluate_batch(black_box(&boards), black_box(&hands));
            black_box(results.len())
        })
    });
}

fn benchmark_trait_evaluation(c: &mut Criterion) {
    let evaluator = MaskEvaluator::new();
    let (boards, hands) = generate_hands(100_000, 777);
    let sevens: Vec<Vec<Card>> = boards
        .iter()
        .zip(&hands)
        .map(|(board, hand)| board.iter().chain(hand.iter()).copied().collect())
        .collect();

    c.bench_function("hand_evaluator_slice", |b| {
        b.iter(|| {
            let mut sum = 0u64;
            for cards in black_box(&sevens) {
                if let Ok(strength) = evaluator.evaluate(cards) {
                    sum += strength.value() as u64;
                }
            }
            black_box(sum)
        })
    });
}

criterion_group!(
    benches,
    benchmark_scalar_evaluation,
    benchmark_batch_evaluation,
    benchmark_trait_evaluation,
);
criterion_main!(benches);
