//! Performance benchmarks for team balancing

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use riftbot::balance::{BalanceStrategy, ScoredPlayer, TeamBalancer};
use riftbot::config::LobbySettings;
use riftbot::metrics::MetricsCollector;
use riftbot::skill::{ReportedRank, SkillModel};
use riftbot::LobbyManager;
use std::sync::Arc;

const TIERS: [&str; 10] = [
    "IRON",
    "BRONZE",
    "SILVER",
    "GOLD",
    "PLATINUM",
    "DIAMOND",
    "GOLD",
    "SILVER",
    "MASTER",
    "BRONZE",
];
const DIVISIONS: [&str; 4] = ["I", "II", "III", "IV"];

/// A deterministic mixed roster of `size` scored players
fn roster(size: usize) -> Vec<ScoredPlayer<String>> {
    let model = SkillModel::new();

    (0..size)
        .map(|i| {
            let reported = if i % 7 == 6 {
                ReportedRank::unranked((i * 13) as u32)
            } else {
                ReportedRank::ranked(
                    TIERS[i % TIERS.len()],
                    DIVISIONS[i % DIVISIONS.len()],
                    (i * 11 % 100) as u32,
                    (i * 17) as u32,
                )
            };
            let assessment = model.assess(&reported);
            ScoredPlayer::new(format!("player_{}", i), assessment.value)
        })
        .collect()
}

fn bench_balance_strategies(c: &mut Criterion) {
    let mut group = c.benchmark_group("team_balance");

    for size in [4, 10, 16, 20] {
        let players = roster(size);
        for strategy in [BalanceStrategy::Lookahead, BalanceStrategy::Exact] {
            let balancer = TeamBalancer::new(strategy);
            group.bench_with_input(
                BenchmarkId::new(strategy.to_string(), size),
                &players,
                |b, players| b.iter(|| black_box(balancer.balance(players))),
            );
        }
    }

    group.finish();
}

fn bench_skill_scoring(c: &mut Criterion) {
    let model = SkillModel::new();
    let reported = ReportedRank::ranked("GOLD", "II", 45, 120);

    c.bench_function("skill_assess_ranked", |b| {
        b.iter(|| black_box(model.assess(black_box(&reported))))
    });
}

fn bench_lobby_join_and_ticket(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let metrics = Arc::new(MetricsCollector::new().unwrap());

    c.bench_function("lobby_fill_and_begin_balance", |b| {
        b.iter(|| {
            rt.block_on(async {
                let manager = LobbyManager::new(LobbySettings::default(), metrics.clone());
                let lobby = manager.create_lobby("creator", Some(10)).await.unwrap();

                for i in 0..10 {
                    let _ = manager.join_lobby(lobby.id(), &format!("user_{}", i)).await;
                }

                black_box(manager.begin_balance(lobby.id(), "creator").await)
            })
        })
    });
}

criterion_group!(
    benches,
    bench_balance_strategies,
    bench_skill_scoring,
    bench_lobby_join_and_ticket
);
criterion_main!(benches);
