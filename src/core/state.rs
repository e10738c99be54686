//! Authoritative match state.
//!
//! ## GameState
//!
//! The complete snapshot owned by one engine instance: every hand, every
//! discard pile, the deck, indicator and wildcard, turn bookkeeping, match
//! status and the table sets of the 101 variant.
//!
//! The deck itself is never serialized; clients only see `deckCount`.
//! Hands are stored as `im::Vector`, so the per-recipient copies made by
//! [`GameState::redacted_for`] share structure with the original.
//!
//! ## Primitives
//!
//! Dealing, drawing (with reshuffle on exhaustion), discarding and turn
//! advancement live here so both engine variants share them. Every
//! primitive validates before it mutates: on `Err` the state is untouched.

use im::Vector;
use serde::Serialize;

use super::action::MeldKind;
use super::config::GameMode;
use super::ids::{ConnectionId, TileId};
use super::rng::GameRng;
use super::seat::{Seat, SeatMap};
use super::tile::{full_deck, Tile, TileFace};
use crate::error::RuleError;

/// Whether the match is still running.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MatchStatus {
    Playing,
    Finished,
}

/// What the seat whose turn it is must do next.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum TurnPhase {
    /// Holding N tiles, must draw.
    AwaitingDraw,
    /// Holding N+1 tiles, must discard (or finish).
    AwaitingDiscard,
}

/// How a match was won.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum WinType {
    /// Sets decomposition that needed a wild tile.
    Normal,
    /// No wild or placeholder among the 14 tiles.
    Clean,
    /// Seven pairs.
    Pairs,
    /// Finished by throwing a wild tile.
    OkeyFinish,
    /// Finished by throwing a placeholder.
    FakeFinish,
}

impl WinType {
    /// Ledger points awarded to the winner of a classic match.
    #[must_use]
    pub const fn points(self) -> i32 {
        match self {
            WinType::Normal => 2,
            WinType::Clean | WinType::Pairs | WinType::OkeyFinish => 4,
            WinType::FakeFinish => 1,
        }
    }
}

/// One-shot tag for client effects that cannot be inferred by diffing.
///
/// Cleared at the start of the next successful mutation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum GameEvent {
    Reshuffled,
    DeckExhausted,
    AutoPlayed,
    HandOpened,
    TileProcessed,
}

/// Per-seat state.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerState {
    /// Connection currently sitting in this seat.
    pub id: ConnectionId,
    pub name: String,
    /// Ordered hand. Empty in snapshots sent to anyone else.
    pub hand: Vector<Tile>,
    /// Discard pile; the top is the back.
    pub discards: Vector<Tile>,
    pub is_turn: bool,
    /// 101 only: has laid melds on the table.
    pub opened: bool,
    /// 101 only: what the opening declaration was.
    pub opened_with: Option<MeldKind>,
    /// 101 only: running score for this match. Can go negative.
    pub score: i32,
}

impl PlayerState {
    #[must_use]
    pub fn new(id: ConnectionId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            hand: Vector::new(),
            discards: Vector::new(),
            is_turn: false,
            opened: false,
            opened_with: None,
            score: 0,
        }
    }

    /// Position of a tile in the hand.
    #[must_use]
    pub fn hand_position(&self, tile: TileId) -> Option<usize> {
        self.hand.iter().position(|t| t.id == tile)
    }

    #[must_use]
    pub fn holds(&self, tile: TileId) -> bool {
        self.hand_position(tile).is_some()
    }
}

/// A meld laid face-up on the table (101 only).
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenedSet {
    pub id: u32,
    #[serde(rename = "type")]
    pub kind: MeldKind,
    pub tiles: Vec<Tile>,
    pub owner: ConnectionId,
}

/// Result of a center draw.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CenterDraw {
    Drawn(Tile),
    /// Deck and every discard pile were empty; the match ended drawn.
    Exhausted,
}

/// Seat parameters used when dealing.
#[derive(Clone, Debug)]
pub struct SeatInfo {
    pub id: ConnectionId,
    pub name: String,
}

impl SeatInfo {
    pub fn new(id: ConnectionId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

/// Complete authoritative match state.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GameState {
    pub mode: GameMode,
    pub players: SeatMap<PlayerState>,

    #[serde(skip)]
    deck: Vector<Tile>,

    /// Tiles left in the center deck.
    pub deck_count: usize,

    pub indicator: Tile,
    pub wildcard: TileFace,

    pub turn_index: Seat,
    pub turn_phase: TurnPhase,
    pub status: MatchStatus,
    pub winner_id: Option<ConnectionId>,
    pub win_type: Option<WinType>,

    /// Seconds left for the seat whose turn it is.
    pub turn_timer: u32,

    pub event: Option<GameEvent>,

    /// Sets laid on the table (101 only).
    pub table: Vec<OpenedSet>,

    #[serde(skip)]
    turn_seconds: u32,

    #[serde(skip)]
    next_set_id: u32,
}

impl GameState {
    /// Shuffle a fresh deck and deal a match.
    ///
    /// Every seat receives `hand_size` tiles; a randomly chosen dealer seat
    /// receives one extra and starts in `AwaitingDiscard`. The indicator is
    /// then taken from the deck.
    #[must_use]
    pub fn deal(
        mode: GameMode,
        seats: &[SeatInfo],
        hand_size: usize,
        turn_seconds: u32,
        rng: &mut GameRng,
    ) -> Self {
        assert!(!seats.is_empty(), "Must have at least 1 seat");

        let mut tiles = full_deck();
        rng.shuffle(&mut tiles);
        let mut deck: Vector<Tile> = tiles.into_iter().collect();

        let dealer = Seat(rng.gen_range_usize(0..seats.len()) as u8);

        let mut dealt = Vec::with_capacity(seats.len());
        for (seat, info) in Seat::all(seats.len()).zip(seats) {
            let mut player = PlayerState::new(info.id, info.name.clone());
            let count = if seat == dealer { hand_size + 1 } else { hand_size };
            player.hand = deck.split_off(deck.len() - count);
            player.is_turn = seat == dealer;
            dealt.push(player);
        }
        let players = SeatMap::from_vec(dealt);

        let indicator = deck.remove(deck.len() - 1);
        let wildcard = TileFace::wildcard_for(indicator.face());

        Self {
            mode,
            players,
            deck_count: deck.len(),
            deck,
            indicator,
            wildcard,
            turn_index: dealer,
            turn_phase: TurnPhase::AwaitingDiscard,
            status: MatchStatus::Playing,
            winner_id: None,
            win_type: None,
            turn_timer: turn_seconds,
            event: None,
            table: Vec::new(),
            turn_seconds,
            next_set_id: 0,
        }
    }

    /// Number of seats.
    #[must_use]
    pub fn seat_count(&self) -> usize {
        self.players.seat_count()
    }

    #[must_use]
    pub fn current_player(&self) -> &PlayerState {
        &self.players[self.turn_index]
    }

    #[must_use]
    pub fn is_playing(&self) -> bool {
        self.status == MatchStatus::Playing
    }

    /// Seat occupied by a connection.
    #[must_use]
    pub fn seat_of(&self, id: ConnectionId) -> Option<Seat> {
        self.players.position(|p| p.id == id)
    }

    /// The center deck, top at the back.
    #[must_use]
    pub fn deck(&self) -> &Vector<Tile> {
        &self.deck
    }

    /// Replace the deck, for exhaustion scenarios.
    #[cfg(any(test, feature = "test-support"))]
    pub fn set_deck(&mut self, deck: Vector<Tile>) {
        self.deck = deck;
        self.deck_count = self.deck.len();
    }

    /// Configured turn length.
    #[must_use]
    pub fn turn_seconds(&self) -> u32 {
        self.turn_seconds
    }

    // === Guards ===

    /// Check the match is running and it is `actor`'s turn.
    pub fn ensure_turn(&self, actor: ConnectionId) -> Result<Seat, RuleError> {
        if !self.is_playing() {
            return Err(RuleError::GameOver);
        }
        let seat = self.seat_of(actor).ok_or(RuleError::NotInGame)?;
        if seat != self.turn_index {
            return Err(RuleError::NotYourTurn);
        }
        Ok(seat)
    }

    /// Check the current seat is in the given phase.
    pub fn ensure_phase(&self, phase: TurnPhase) -> Result<(), RuleError> {
        match (self.turn_phase, phase) {
            (a, b) if a == b => Ok(()),
            (TurnPhase::AwaitingDraw, TurnPhase::AwaitingDiscard) => Err(RuleError::MustDrawFirst),
            _ => Err(RuleError::AlreadyDrew),
        }
    }

    // === Mutations ===

    /// Clear the one-shot event tag. Called at the start of each action.
    pub fn clear_event(&mut self) {
        self.event = None;
    }

    /// Draw the top of the center deck into `seat`'s hand.
    ///
    /// An empty deck is rebuilt from every discard pile, shuffled. If that
    /// is empty too the match finishes with no winner.
    pub fn draw_center(&mut self, seat: Seat, rng: &mut GameRng) -> CenterDraw {
        if self.deck.is_empty() {
            self.reshuffle_discards(rng);
        }
        match self.deck.pop_back() {
            Some(tile) => {
                self.deck_count = self.deck.len();
                self.players[seat].hand.push_back(tile);
                self.turn_phase = TurnPhase::AwaitingDiscard;
                CenterDraw::Drawn(tile)
            }
            None => {
                self.event = Some(GameEvent::DeckExhausted);
                self.finish(None, None);
                CenterDraw::Exhausted
            }
        }
    }

    fn reshuffle_discards(&mut self, rng: &mut GameRng) {
        let mut pool: Vec<Tile> = Vec::new();
        for (_, player) in self.players.iter_mut() {
            pool.extend(player.discards.iter().copied());
            player.discards.clear();
        }
        if pool.is_empty() {
            return;
        }
        rng.shuffle(&mut pool);
        self.deck = pool.into_iter().collect();
        self.deck_count = self.deck.len();
        self.event = Some(GameEvent::Reshuffled);
    }

    /// Take the top of the left neighbour's discard pile.
    pub fn draw_left(&mut self, seat: Seat) -> Result<Tile, RuleError> {
        let left = seat.left(self.seat_count());
        let tile = self.players[left]
            .discards
            .pop_back()
            .ok_or(RuleError::EmptyDiscardPile)?;
        self.players[seat].hand.push_back(tile);
        self.turn_phase = TurnPhase::AwaitingDiscard;
        Ok(tile)
    }

    /// Remove a tile from `seat`'s hand.
    pub fn take_from_hand(&mut self, seat: Seat, tile: TileId) -> Result<Tile, RuleError> {
        let player = &mut self.players[seat];
        let pos = player
            .hand_position(tile)
            .ok_or(RuleError::TileNotInHand(tile))?;
        Ok(player.hand.remove(pos))
    }

    /// Move a tile from `seat`'s hand to its discard pile.
    pub fn discard(&mut self, seat: Seat, tile: TileId) -> Result<Tile, RuleError> {
        let tile = self.take_from_hand(seat, tile)?;
        self.players[seat].discards.push_back(tile);
        Ok(tile)
    }

    /// Hand the turn to the next seat and restart its countdown.
    pub fn advance_turn(&mut self) {
        let current = self.turn_index;
        let next = current.next(self.seat_count());
        self.players[current].is_turn = false;
        self.players[next].is_turn = true;
        self.turn_index = next;
        self.turn_phase = TurnPhase::AwaitingDraw;
        self.reset_timer();
    }

    /// Restart the current seat's countdown.
    pub fn reset_timer(&mut self) {
        self.turn_timer = self.turn_seconds;
    }

    /// One second elapsed. Returns the seconds left.
    pub fn tick(&mut self) -> u32 {
        self.turn_timer = self.turn_timer.saturating_sub(1);
        self.turn_timer
    }

    /// End the match.
    pub fn finish(&mut self, winner: Option<Seat>, win_type: Option<WinType>) {
        self.status = MatchStatus::Finished;
        self.winner_id = winner.map(|s| self.players[s].id);
        self.win_type = win_type;
    }

    /// Lay a set on the table, returning its id.
    pub fn push_table_set(&mut self, kind: MeldKind, tiles: Vec<Tile>, owner: ConnectionId) -> u32 {
        let id = self.next_set_id;
        self.next_set_id += 1;
        self.table.push(OpenedSet {
            id,
            kind,
            tiles,
            owner,
        });
        id
    }

    /// Swap a reconnecting player's new connection id in.
    ///
    /// Returns false if `old` has no seat.
    pub fn rebind(&mut self, old: ConnectionId, new: ConnectionId) -> bool {
        let Some(seat) = self.seat_of(old) else {
            return false;
        };
        self.players[seat].id = new;
        if self.winner_id == Some(old) {
            self.winner_id = Some(new);
        }
        for set in &mut self.table {
            if set.owner == old {
                set.owner = new;
            }
        }
        true
    }

    // === Test support ===

    /// Put the given tiles in `seat`'s hand, in order.
    ///
    /// Tiles are pulled from wherever they are; the seat's old hand goes to
    /// the deck and other hands are topped back up from it, so the tile set
    /// and every other hand size are preserved.
    #[cfg(any(test, feature = "test-support"))]
    pub fn arrange_hand(&mut self, seat: Seat, ids: &[TileId]) {
        assert!(!ids.contains(&self.indicator.id), "the indicator cannot be dealt");
        let wanted = |t: &Tile| ids.contains(&t.id);
        let sizes: Vec<usize> = self.players.values().map(|p| p.hand.len()).collect();

        let mut pool: Vec<Tile> = self.deck.iter().filter(|t| wanted(t)).copied().collect();
        self.deck.retain(|t| !wanted(t));
        for (_, player) in self.players.iter_mut() {
            pool.extend(player.hand.iter().filter(|t| wanted(t)).copied());
            pool.extend(player.discards.iter().filter(|t| wanted(t)).copied());
            player.hand.retain(|t| !wanted(t));
            player.discards.retain(|t| !wanted(t));
        }

        let old = std::mem::take(&mut self.players[seat].hand);
        self.deck.extend(old);
        self.players[seat].hand = ids
            .iter()
            .filter_map(|id| pool.iter().find(|t| t.id == *id).copied())
            .collect();
        assert_eq!(self.players[seat].hand.len(), ids.len(), "unknown or repeated tile id");

        for (other, player) in self.players.iter_mut() {
            if other == seat {
                continue;
            }
            while player.hand.len() < sizes[other.index()] {
                match self.deck.pop_front() {
                    Some(tile) => player.hand.push_back(tile),
                    None => break,
                }
            }
        }
        self.deck_count = self.deck.len();
    }

    /// Make a tile with the given face the indicator, swapping the old
    /// indicator into that tile's place.
    #[cfg(any(test, feature = "test-support"))]
    pub fn set_indicator_face(&mut self, face: TileFace) {
        if self.indicator.face() == face {
            return;
        }
        let old = self.indicator;
        let swap = |pile: &mut Vector<Tile>| -> Option<Tile> {
            let pos = pile.iter().position(|t| t.face() == face)?;
            Some(pile.set(pos, old))
        };

        let mut found = swap(&mut self.deck);
        for (_, player) in self.players.iter_mut() {
            if found.is_none() {
                found = swap(&mut player.hand).or_else(|| swap(&mut player.discards));
            }
        }
        if let Some(tile) = found {
            self.indicator = tile;
            self.wildcard = TileFace::wildcard_for(tile.face());
        }
    }

    // === Views ===

    /// Copy of the state with every hand but `viewer`'s emptied and the
    /// deck contents dropped (`deck_count` stays).
    ///
    /// `None` (spectators) empties every hand.
    #[must_use]
    pub fn redacted_for(&self, viewer: Option<ConnectionId>) -> GameState {
        let mut copy = self.clone();
        copy.deck = Vector::new();
        for (_, player) in copy.players.iter_mut() {
            if Some(player.id) != viewer {
                player.hand = Vector::new();
            }
        }
        copy
    }

    /// Every tile id currently in play: hands, discards, deck, table and
    /// the indicator. Always the full deck.
    #[must_use]
    pub fn tile_ids(&self) -> Vec<TileId> {
        let mut ids: Vec<TileId> = Vec::with_capacity(super::tile::DECK_SIZE);
        for player in self.players.values() {
            ids.extend(player.hand.iter().map(|t| t.id));
            ids.extend(player.discards.iter().map(|t| t.id));
        }
        ids.extend(self.deck.iter().map(|t| t.id));
        for set in &self.table {
            ids.extend(set.tiles.iter().map(|t| t.id));
        }
        ids.push(self.indicator.id);
        ids
    }
}
