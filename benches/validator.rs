//! Benchmark for the winning-hand search
//!
//! Measures `validate_hand` on a winning hand, a hand that needs wilds and a
//! near miss that forces the search to exhaust every branch.

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use okey_server::core::{suited_tile_id, Color, Tile, TileFace};
use okey_server::validator::validate_hand;

fn hand(faces: &[(Color, u8, u8)]) -> Vec<Tile> {
    faces
        .iter()
        .filter_map(|&(color, rank, copy)| {
            suited_tile_id(TileFace::new(color, rank), copy).map(|id| Tile::new(id, color, rank))
        })
        .collect()
}

fn bench_validate(c: &mut Criterion) {
    use Color::{Black as K, Blue as B, Red as R, Yellow as Y};
    let wildcard = TileFace::new(K, 1);

    let winning = hand(&[
        (R, 1, 0), (R, 2, 0), (R, 3, 0),
        (Y, 4, 0), (Y, 5, 0), (Y, 6, 0), (Y, 7, 0),
        (B, 9, 0), (B, 10, 0), (B, 11, 0),
        (R, 12, 0), (Y, 12, 0), (B, 12, 0), (K, 12, 0),
    ]);
    let with_wilds = hand(&[
        (R, 1, 0), (K, 1, 0), (R, 3, 0),
        (Y, 4, 0), (Y, 5, 0), (K, 1, 1), (Y, 7, 0),
        (B, 9, 0), (B, 10, 0), (B, 11, 0),
        (R, 12, 0), (Y, 12, 0), (B, 12, 0), (K, 12, 0),
    ]);
    let near_miss = hand(&[
        (R, 1, 0), (R, 2, 0), (R, 4, 0),
        (Y, 4, 0), (Y, 5, 0), (Y, 7, 0), (Y, 8, 0),
        (B, 9, 0), (B, 10, 0), (B, 12, 0),
        (R, 12, 0), (Y, 12, 0), (B, 13, 0), (K, 11, 0),
    ]);

    c.bench_function("validate_winning", |b| {
        b.iter(|| black_box(validate_hand(black_box(&winning), wildcard)))
    });
    c.bench_function("validate_with_wilds", |b| {
        b.iter(|| black_box(validate_hand(black_box(&with_wilds), wildcard)))
    });
    c.bench_function("validate_near_miss", |b| {
        b.iter(|| black_box(validate_hand(black_box(&near_miss), wildcard)))
    });
}

criterion_group!(benches, bench_validate);
criterion_main!(benches);
