//! Mutable per-session game state

use crate::content::{Coord, GameContent, Piece, Prize, Tile, TileOverwrite};
use serde::{Deserialize, Serialize};

/// Pieces, prizes and tiles as they currently stand
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GameState {
    pub pieces: Vec<Piece>,
    pub prizes: Vec<Prize>,
    pub tiles: Vec<Tile>,
    /// True only while the key-to-chest window is open
    pub can_take_chest: bool,
}

impl GameState {
    /// Lay out the starting board
    pub fn from_content(content: &GameContent) -> Self {
        Self {
            pieces: content.pieces.clone(),
            prizes: content.prizes.clone(),
            tiles: content.tiles.clone(),
            can_take_chest: false,
        }
    }

    /// The player's piece
    pub fn player(&self) -> Option<&Piece> {
        self.pieces.first()
    }

    /// The player's score
    pub fn points(&self) -> i64 {
        self.player().map_or(0, |piece| piece.prize_points)
    }

    /// Find the prize at a coordinate
    pub fn prize_at(&self, rank: Coord, file: Coord) -> Option<&Prize> {
        self.prizes
            .iter()
            .find(|prize| prize.rank == rank && prize.file == file)
    }

    /// Remove and return the prize at a coordinate
    pub fn remove_prize_at(&mut self, rank: Coord, file: Coord) -> Option<Prize> {
        let index = self
            .prizes
            .iter()
            .position(|prize| prize.rank == rank && prize.file == file)?;
        Some(self.prizes.remove(index))
    }

    /// Add coins to the player's score and return the new total
    pub fn credit(&mut self, coins: i64) -> i64 {
        match self.pieces.first_mut() {
            Some(player) => {
                player.prize_points += coins;
                player.prize_points
            }
            None => 0,
        }
    }

    /// Move the player without validating the destination
    pub fn move_player(&mut self, rank: Coord, file: Coord) -> Option<Piece> {
        let player = self.pieces.first_mut()?;
        player.rank = rank;
        player.file = file;
        Some(player.clone())
    }

    /// Find the explicit tile at a coordinate
    pub fn tile_at(&self, rank: Coord, file: Coord) -> Option<&Tile> {
        self.tiles
            .iter()
            .find(|tile| tile.rank == rank && tile.file == file)
    }

    /// Apply a change set and return the one that undoes it
    ///
    /// Coordinates without a tile get one appended; `src: None` removes the
    /// tile. The returned set is in reverse order, so applying it right away
    /// puts back every tile that was overwritten and drops every tile that
    /// was added.
    pub fn apply_overwrites(&mut self, overwrites: &[TileOverwrite]) -> Vec<TileOverwrite> {
        let mut restore = Vec::with_capacity(overwrites.len());
        for overwrite in overwrites {
            let (rank, file) = (overwrite.rank, overwrite.file);
            let index = self
                .tiles
                .iter()
                .position(|tile| tile.rank == rank && tile.file == file);
            restore.push(TileOverwrite {
                rank,
                file,
                src: index.map(|i| self.tiles[i].src.clone()),
            });
            match (index, &overwrite.src) {
                (Some(i), Some(src)) => self.tiles[i].src = src.clone(),
                (Some(i), None) => {
                    self.tiles.remove(i);
                }
                (None, Some(src)) => self.tiles.push(Tile {
                    rank,
                    file,
                    src: src.clone(),
                }),
                (None, None) => {}
            }
        }
        restore.reverse();
        restore
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state() -> GameState {
        GameState::from_content(&GameContent::default())
    }

    #[test]
    fn test_prize_lookup_and_removal() {
        let mut state = state();
        assert_eq!(state.prize_at(2, 3).and_then(|p| p.coins), Some(100));
        assert!(state.prize_at(0, 0).is_none());

        let removed = state.remove_prize_at(2, 3).unwrap();
        assert_eq!(removed.src, "prizeImages/Sushi.png");
        assert!(state.prize_at(2, 3).is_none());
        assert!(state.remove_prize_at(2, 3).is_none());
        assert_eq!(state.prizes.len(), 5);
    }

    #[test]
    fn test_credit_and_move() {
        let mut state = state();
        assert_eq!(state.credit(100), 100);
        assert_eq!(state.credit(50), 150);
        assert_eq!(state.points(), 150);

        let moved = state.move_player(-3, 40).unwrap();
        assert_eq!((moved.rank, moved.file), (-3, 40));
        assert_eq!(state.player(), Some(&moved));
    }

    #[test]
    fn test_empty_state_has_no_player() {
        let mut state = GameState::default();
        assert_eq!(state.credit(10), 0);
        assert!(state.move_player(1, 1).is_none());
    }

    #[test]
    fn test_apply_then_restore_round_trip() {
        let content = GameContent::default();
        let mut state = GameState::from_content(&content);
        let original = state.tiles.clone();

        let mut changes = content.tile_cycle.clone();
        changes.push(TileOverwrite::set(3, 10, "tileImages/lava.png"));
        let restore = state.apply_overwrites(&changes);

        assert_eq!(state.tile_at(1, 10).map(|t| t.src.as_str()), Some("tileImages/water.png"));
        assert_eq!(state.tile_at(3, 10).map(|t| t.src.as_str()), Some("tileImages/lava.png"));
        assert_eq!(state.tiles.len(), original.len() + content.tile_cycle.len());

        let again = state.apply_overwrites(&restore);
        assert_eq!(state.tiles, original);

        state.apply_overwrites(&again);
        assert_eq!(state.tile_at(3, 10).map(|t| t.src.as_str()), Some("tileImages/lava.png"));
    }

    #[test]
    fn test_repeated_coordinate_restores_first_value() {
        let mut state = state();
        let original = state.tiles.clone();
        let restore = state.apply_overwrites(&[
            TileOverwrite::set(3, 10, "a.png"),
            TileOverwrite::set(3, 10, "b.png"),
        ]);
        assert_eq!(state.tile_at(3, 10).map(|t| t.src.as_str()), Some("b.png"));

        state.apply_overwrites(&restore);
        assert_eq!(state.tiles, original);
    }
}
