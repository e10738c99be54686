//! Hand validator and meld scoring through the public API, with tiles taken
//! from a real deck.

use okey_server::core::{suited_tile_id, Color, Tile, TileFace, TileId};
use okey_server::validator::{check_pair, score_meld, validate_hand, HandPattern, MeldShape};

use Color::{Black as K, Blue as B, Red as R, Yellow as Y};

fn tile(color: Color, rank: u8, copy: u8) -> Tile {
    let id = suited_tile_id(TileFace::new(color, rank), copy).expect("suited face");
    Tile::new(id, color, rank)
}

/// First copy of each face, second copy for repeats.
fn hand(faces: &[(Color, u8)]) -> Vec<Tile> {
    let mut seen: Vec<(Color, u8)> = Vec::new();
    faces
        .iter()
        .map(|&(color, rank)| {
            let copy = seen.iter().filter(|&&f| f == (color, rank)).count() as u8;
            seen.push((color, rank));
            tile(color, rank, copy)
        })
        .collect()
}

const PLACEHOLDER_A: Tile = Tile::placeholder(TileId(104));
const PLACEHOLDER_B: Tile = Tile::placeholder(TileId(105));

/// Test that a run ending 12-13-1 completes a hand.
#[test]
fn test_wrapped_run_closes_hand() {
    let wildcard = TileFace::new(K, 2);
    let h = hand(&[
        (R, 12), (R, 13), (R, 1),
        (Y, 1), (Y, 2), (Y, 3),
        (B, 4), (B, 5), (B, 6), (B, 7),
        (R, 9), (Y, 9), (B, 9), (K, 9),
    ]);
    let v = validate_hand(&h, wildcard);
    assert!(v.is_valid);
    assert_eq!(v.pattern, Some(HandPattern::Sets));
    assert!(!v.used_wildcard);
}

/// Test that a run cannot continue past the wrapped 1.
#[test]
fn test_run_cannot_continue_after_wrap() {
    let wildcard = TileFace::new(K, 2);
    let h = hand(&[
        (R, 13), (R, 1), (R, 2),
        (Y, 1), (Y, 2), (Y, 3),
        (B, 4), (B, 5), (B, 6), (B, 7),
        (R, 9), (Y, 9), (B, 9), (K, 9),
    ]);
    assert!(!validate_hand(&h, wildcard).is_valid);
}

/// Test that the verdict does not depend on tile order.
#[test]
fn test_order_does_not_matter() {
    let wildcard = TileFace::new(B, 10);
    let mut h = hand(&[
        (R, 1), (R, 2), (R, 3),
        (Y, 4), (Y, 5), (Y, 6), (Y, 7),
        (B, 9), (B, 10), (B, 11),
        (R, 12), (Y, 12), (B, 12), (K, 12),
    ]);
    let forward = validate_hand(&h, wildcard);
    h.reverse();
    assert_eq!(validate_hand(&h, wildcard), forward);
    assert!(forward.is_valid);
    // Blue 10 is the wildcard itself, so it was wild in that run.
    assert!(forward.used_wildcard);
}

/// Test that placeholders pair up as the wildcard face.
#[test]
fn test_placeholders_pair_up() {
    let wildcard = TileFace::new(B, 5);
    let mut h = hand(&[
        (R, 3), (R, 3),
        (Y, 7), (Y, 7),
        (K, 11), (K, 11),
        (B, 2), (B, 2),
        (R, 9), (R, 9),
        (Y, 12), (Y, 12),
    ]);
    h.push(PLACEHOLDER_A);
    h.push(PLACEHOLDER_B);

    let v = validate_hand(&h, wildcard);
    assert!(v.is_valid);
    assert_eq!(v.pattern, Some(HandPattern::Pairs));
    assert!(!v.used_wildcard);
}

/// Test that a hand of the wrong size never wins.
#[test]
fn test_thirteen_tiles_never_win() {
    let h = hand(&[
        (R, 1), (R, 2), (R, 3),
        (Y, 4), (Y, 5), (Y, 6), (Y, 7),
        (B, 9), (B, 10), (B, 11),
        (R, 12), (Y, 12), (B, 12),
    ]);
    assert!(!validate_hand(&h, TileFace::new(K, 1)).is_valid);
}

/// Test meld scoring against the 101 opening threshold.
#[test]
fn test_opening_melds_score_over_threshold() {
    let wildcard = TileFace::new(K, 1);
    let run = score_meld(&hand(&[(R, 10), (R, 11), (R, 12), (R, 13)]), wildcard).unwrap();
    let group = score_meld(&hand(&[(R, 13), (Y, 13), (B, 13)]), wildcard).unwrap();
    let low = score_meld(&hand(&[(B, 7), (B, 8), (B, 9)]), wildcard).unwrap();

    assert_eq!(run.shape, MeldShape::Run);
    assert_eq!(group.shape, MeldShape::Group);
    assert_eq!(run.points + group.points + low.points, 46 + 39 + 24);
}

/// Test declared pair checks.
#[test]
fn test_pair_checks() {
    let wildcard = TileFace::new(K, 1);
    assert!(check_pair(&hand(&[(Y, 6), (Y, 6)]), wildcard).is_ok());
    assert!(check_pair(&[tile(Y, 6, 0), tile(K, 1, 0)], wildcard).is_ok());
    assert!(check_pair(&hand(&[(Y, 6), (R, 6)]), wildcard).is_err());
    assert!(check_pair(&[tile(K, 1, 0), tile(K, 1, 1)], wildcard).is_err());
}
