//! Seat identification and per-seat data storage.
//!
//! ## Seat
//!
//! A logical player slot in a match, independent of the connection sitting
//! in it. Seat 0 is the first seat in turn order; turn order advances by
//! increasing index and wraps.
//!
//! ## SeatMap
//!
//! Per-seat storage backed by `Vec` for O(1) access, indexable by `Seat`.

use serde::{Deserialize, Serialize};
use std::ops::{Index, IndexMut};

/// Seat index in a match (2 or 4 seats in practice).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Seat(pub u8);

impl Seat {
    /// Create a new seat.
    #[must_use]
    pub const fn new(index: u8) -> Self {
        Self(index)
    }

    /// Get the raw seat index (0-based).
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// The seat that acts after this one.
    #[must_use]
    pub fn next(self, seat_count: usize) -> Seat {
        Seat(((self.index() + 1) % seat_count) as u8)
    }

    /// The seat whose discard pile this seat may draw from.
    ///
    /// That is the counter-clockwise neighbour, i.e. the seat that acted
    /// immediately before this one.
    #[must_use]
    pub fn left(self, seat_count: usize) -> Seat {
        Seat(((self.index() + seat_count - 1) % seat_count) as u8)
    }

    /// Iterate over all seats of a match with `seat_count` seats.
    ///
    /// ```
    /// use okey_server::core::Seat;
    ///
    /// let seats: Vec<_> = Seat::all(4).collect();
    /// assert_eq!(seats.len(), 4);
    /// assert_eq!(seats[3], Seat::new(3));
    /// ```
    pub fn all(seat_count: usize) -> impl Iterator<Item = Seat> {
        (0..seat_count as u8).map(Seat)
    }
}

impl std::fmt::Display for Seat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Seat {}", self.0)
    }
}

/// Per-seat data storage with O(1) access.
///
/// ```
/// use okey_server::core::{Seat, SeatMap};
///
/// let mut scores: SeatMap<i32> = SeatMap::new(4, |_| 0);
/// scores[Seat::new(1)] -= 101;
/// assert_eq!(scores[Seat::new(1)], -101);
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SeatMap<T> {
    data: Vec<T>,
}

impl<T> SeatMap<T> {
    /// Create a new map with values from a factory function.
    pub fn new(seat_count: usize, factory: impl Fn(Seat) -> T) -> Self {
        assert!(seat_count > 0, "Must have at least 1 seat");
        assert!(seat_count <= 255, "At most 255 seats supported");

        let data = (0..seat_count as u8).map(|i| factory(Seat(i))).collect();

        Self { data }
    }

    /// Build a map from one value per seat, in seat order.
    pub fn from_vec(data: Vec<T>) -> Self {
        assert!(!data.is_empty(), "Must have at least 1 seat");
        Self { data }
    }

    /// Get the number of seats.
    #[must_use]
    pub fn seat_count(&self) -> usize {
        self.data.len()
    }

    #[must_use]
    pub fn get(&self, seat: Seat) -> &T {
        &self.data[seat.index()]
    }

    pub fn get_mut(&mut self, seat: Seat) -> &mut T {
        &mut self.data[seat.index()]
    }

    /// Iterate over (Seat, &T) pairs.
    pub fn iter(&self) -> impl Iterator<Item = (Seat, &T)> {
        self.data.iter().enumerate().map(|(i, v)| (Seat(i as u8), v))
    }

    /// Iterate over (Seat, &mut T) pairs.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (Seat, &mut T)> {
        self.data
            .iter_mut()
            .enumerate()
            .map(|(i, v)| (Seat(i as u8), v))
    }

    /// Iterate over the values in seat order.
    pub fn values(&self) -> impl Iterator<Item = &T> {
        self.data.iter()
    }

    /// Find the first seat whose value matches.
    pub fn position(&self, pred: impl Fn(&T) -> bool) -> Option<Seat> {
        self.data.iter().position(pred).map(|i| Seat(i as u8))
    }
}

impl<T> Index<Seat> for SeatMap<T> {
    type Output = T;

    fn index(&self, seat: Seat) -> &Self::Output {
        self.get(seat)
    }
}

impl<T> IndexMut<Seat> for SeatMap<T> {
    fn index_mut(&mut self, seat: Seat) -> &mut Self::Output {
        self.get_mut(seat)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seat_next_wraps() {
        assert_eq!(Seat::new(0).next(4), Seat::new(1));
        assert_eq!(Seat::new(3).next(4), Seat::new(0));
        assert_eq!(Seat::new(1).next(2), Seat::new(0));
    }

    #[test]
    fn test_seat_left_is_previous_actor() {
        assert_eq!(Seat::new(0).left(4), Seat::new(3));
        assert_eq!(Seat::new(2).left(4), Seat::new(1));
        assert_eq!(Seat::new(0).left(2), Seat::new(1));
    }

    #[test]
    fn test_seat_map_position() {
        let map: SeatMap<&str> = SeatMap::from_vec(vec!["a", "b", "c"]);
        assert_eq!(map.position(|v| *v == "c"), Some(Seat::new(2)));
        assert_eq!(map.position(|v| *v == "z"), None);
    }

    #[test]
    fn test_seat_map_mutation() {
        let mut map: SeatMap<i32> = SeatMap::new(2, |_| 0);
        map[Seat::new(1)] = 20;
        assert_eq!(map[Seat::new(0)], 0);
        assert_eq!(map[Seat::new(1)], 20);
        assert_eq!(map.seat_count(), 2);
    }

    #[test]
    fn test_seat_map_serializes_as_list() {
        let map: SeatMap<i32> = SeatMap::new(3, |s| s.index() as i32);
        let json = serde_json::to_string(&map).unwrap();
        assert_eq!(json, "[0,1,2]");
        let back: SeatMap<i32> = serde_json::from_str(&json).unwrap();
        assert_eq!(map, back);
    }

    #[test]
    #[should_panic(expected = "Must have at least 1 seat")]
    fn test_seat_map_zero_seats() {
        let _: SeatMap<i32> = SeatMap::new(0, |_| 0);
    }
}
