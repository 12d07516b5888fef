use chess_league::league::{Match, Outcome, Player, PlayerId, players_from_matches};
use chess_league::pairing::{MAX_PLAYERS, round_robin, swiss};
use chess_league::standings::{full_buchholz, median_buchholz};
use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use rand::{SeedableRng, rngs::StdRng};
use std::hint::black_box;

/// Play `rounds` Swiss rounds over `n` players, higher id winning every game
fn history(n: usize, rounds: u32) -> (Vec<PlayerId>, Vec<Match>) {
    let roster: Vec<PlayerId> = (1..=n as PlayerId).collect();
    let mut rng = StdRng::seed_from_u64(42);
    let mut matches = Vec::new();

    for r in 0..rounds {
        let players = players_from_matches(&roster, &matches);
        let Ok(round) = swiss::next_round(&players, r, &mut rng) else {
            break;
        };
        for mut m in round {
            if let Some(black) = m.black {
                m.outcome = Some(if m.white > black {
                    Outcome::WhiteWin
                } else {
                    Outcome::BlackWin
                });
            }
            matches.push(m);
        }
    }

    (roster, matches)
}

/// Benchmark the first round of a full pool
fn bench_swiss_first_round(c: &mut Criterion) {
    let players: Vec<Player> = (1..=MAX_PLAYERS as PlayerId).map(Player::new).collect();

    c.bench_function("swiss_first_round_50", |b| {
        b.iter(|| {
            let mut rng = StdRng::seed_from_u64(7);
            swiss::next_round(black_box(&players), 0, &mut rng)
        });
    });
}

/// Benchmark a later round, where rematch and color constraints bite
fn bench_swiss_with_history(c: &mut Criterion) {
    let mut group = c.benchmark_group("swiss_with_history");

    for rounds in [3u32, 6] {
        let (roster, matches) = history(MAX_PLAYERS, rounds);
        let players = players_from_matches(&roster, &matches);

        group.bench_with_input(BenchmarkId::from_parameter(rounds), &players, |b, players| {
            b.iter(|| {
                let mut rng = StdRng::seed_from_u64(7);
                swiss::next_round(black_box(players), rounds, &mut rng)
            });
        });
    }

    group.finish();
}

fn bench_round_robin(c: &mut Criterion) {
    let players: Vec<Player> = (1..=MAX_PLAYERS as PlayerId).map(Player::new).collect();

    c.bench_function("round_robin_round_25", |b| {
        b.iter(|| round_robin::next_round(black_box(&players), 24));
    });
}

/// Benchmark rebuilding players from stored games plus tie-breaks
fn bench_projection_and_buchholz(c: &mut Criterion) {
    let (roster, matches) = history(MAX_PLAYERS, 6);

    c.bench_function("projection_and_buchholz_50", |b| {
        b.iter(|| {
            let players = players_from_matches(black_box(&roster), &matches);
            players
                .iter()
                .map(|p| {
                    full_buchholz(&players, p.id).half_points()
                        + median_buchholz(&players, p.id).half_points()
                })
                .sum::<u32>()
        });
    });
}

criterion_group!(
    pairing,
    bench_swiss_first_round,
    bench_swiss_with_history,
    bench_round_robin,
);

criterion_group!(standings, bench_projection_and_buchholz);

criterion_main!(pairing, standings);
