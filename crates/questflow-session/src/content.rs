//! Game content: board, pieces, prizes, tiles and sprite paths
//!
//! Content is plain data. It can be written in RON and loaded with
//! [`GameContent::load`], or taken from [`GameContent::default`], which is the
//! "Quest 4 Sushi" board.

use crate::error::{Error, Result};
use questflow_core::{Event, Value, ValueMap};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// A board coordinate
pub type Coord = i64;

/// Board dimensions and background
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Board {
    pub ranks: u32,
    pub files: u32,
    /// Image shown wherever no explicit tile exists
    pub default_tile: String,
}

impl Default for Board {
    fn default() -> Self {
        Self {
            ranks: 20,
            files: 15,
            default_tile: "tileImages/grassField.png".to_string(),
        }
    }
}

/// A piece on the board; the first piece is the player
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Piece {
    pub rank: Coord,
    pub file: Coord,
    pub src: String,
    #[serde(default)]
    pub prize_points: i64,
}

/// A prize waiting on the board
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prize {
    pub rank: Coord,
    pub file: Coord,
    pub src: String,
    /// Points awarded on pickup; key and chest carry none
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coins: Option<i64>,
}

impl Prize {
    /// Event properties describing this prize
    pub fn properties(&self) -> ValueMap {
        let mut properties = ValueMap::new();
        properties.insert("rank".to_string(), Value::Int(self.rank));
        properties.insert("file".to_string(), Value::Int(self.file));
        properties.insert("src".to_string(), Value::from(self.src.as_str()));
        if let Some(coins) = self.coins {
            properties.insert("coins".to_string(), Value::Int(coins));
        }
        properties
    }

    /// Read a prize back out of a `take-prize` event
    pub fn from_event(event: &Event) -> Option<Prize> {
        Some(Prize {
            rank: event.property("rank")?.coerce_int()?,
            file: event.property("file")?.coerce_int()?,
            src: event.property("src")?.as_str()?.to_string(),
            coins: event.property("coins").and_then(Value::coerce_int),
        })
    }
}

/// An explicit tile image at one coordinate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tile {
    pub rank: Coord,
    pub file: Coord,
    pub src: String,
}

/// One entry of a tile change set
///
/// `src: None` means "no explicit tile": applying it removes whatever tile is
/// there. Restore sets produced by
/// [`GameState::apply_overwrites`](crate::GameState::apply_overwrites) use it
/// for coordinates that had no tile before.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TileOverwrite {
    pub rank: Coord,
    pub file: Coord,
    #[serde(default)]
    pub src: Option<String>,
}

impl TileOverwrite {
    /// Create an overwrite that sets an image
    pub fn set(rank: Coord, file: Coord, src: impl Into<String>) -> Self {
        Self {
            rank,
            file,
            src: Some(src.into()),
        }
    }

    /// Encode as a map value so it can travel as a payload
    pub fn to_value(&self) -> Value {
        let mut map = ValueMap::new();
        map.insert("rank".to_string(), Value::Int(self.rank));
        map.insert("file".to_string(), Value::Int(self.file));
        map.insert("src".to_string(), Value::from(self.src.clone()));
        Value::Map(map)
    }

    /// Decode a map value written by [`TileOverwrite::to_value`]
    pub fn from_value(value: &Value) -> Result<Self> {
        let map = value
            .as_map()
            .ok_or_else(|| questflow_core::Error::type_error("map", value))?;
        let coord = |key: &str| -> Result<Coord> {
            let found = map
                .get(key)
                .ok_or_else(|| questflow_core::Error::PropertyNotFound(key.to_string()))?;
            found
                .as_int()
                .ok_or_else(|| questflow_core::Error::type_error("int", found).into())
        };
        let src = match map.get("src") {
            None | Some(Value::Null) => None,
            Some(Value::String(src)) => Some(src.clone()),
            Some(other) => return Err(questflow_core::Error::type_error("string", other).into()),
        };
        Ok(Self {
            rank: coord("rank")?,
            file: coord("file")?,
            src,
        })
    }
}

/// Encode a change set as a list value
pub fn overwrites_to_value(overwrites: &[TileOverwrite]) -> Value {
    Value::List(overwrites.iter().map(TileOverwrite::to_value).collect())
}

/// Decode a change set written by [`overwrites_to_value`]
pub fn overwrites_from_value(value: &Value) -> Result<Vec<TileOverwrite>> {
    value
        .as_list()
        .ok_or_else(|| questflow_core::Error::type_error("list", value))?
        .iter()
        .map(TileOverwrite::from_value)
        .collect()
}

/// Sprite paths the behaviors react to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sprites {
    /// Prizes that score points when taken
    pub collectibles: Vec<String>,
    pub key: String,
    pub chest: String,
}

impl Default for Sprites {
    fn default() -> Self {
        Self {
            collectibles: vec![
                "prizeImages/Sushi.png".to_string(),
                "prizeImages/miso-soup.png".to_string(),
                "prizeImages/bonsai.png".to_string(),
            ],
            key: "prizeImages/Key.png".to_string(),
            chest: "prizeImages/Chest-Closed.png".to_string(),
        }
    }
}

/// Everything a session needs to lay out and animate its board
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameContent {
    /// Shown in the welcome message
    pub title: String,
    #[serde(default)]
    pub board: Board,
    pub pieces: Vec<Piece>,
    #[serde(default)]
    pub prizes: Vec<Prize>,
    #[serde(default)]
    pub tiles: Vec<Tile>,
    /// Overwrites applied and reverted by the tile cycle
    #[serde(default)]
    pub tile_cycle: Vec<TileOverwrite>,
    #[serde(default)]
    pub sprites: Sprites,
}

impl GameContent {
    /// Parse content from a RON string
    pub fn from_ron(content: &str) -> Result<Self> {
        let content: GameContent = ron::from_str(content)?;
        content.validate()?;
        Ok(content)
    }

    /// Load content from a RON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_ron(&content)
    }

    /// Check the content can be played
    pub fn validate(&self) -> Result<()> {
        if self.board.ranks == 0 || self.board.files == 0 {
            return Err(Error::InvalidContent(format!(
                "board must have at least one rank and file, got {}x{}",
                self.board.ranks, self.board.files
            )));
        }
        if self.pieces.is_empty() {
            return Err(Error::InvalidContent(
                "at least one piece is required for the player".to_string(),
            ));
        }
        Ok(())
    }
}

fn water(rank: Coord, file: Coord) -> Tile {
    Tile {
        rank,
        file,
        src: "tileImages/water.png".to_string(),
    }
}

fn prize(rank: Coord, file: Coord, src: &str, coins: Option<i64>) -> Prize {
    Prize {
        rank,
        file,
        src: src.to_string(),
        coins,
    }
}

impl Default for GameContent {
    fn default() -> Self {
        let puddle = [
            (1, 10),
            (1, 11),
            (2, 9),
            (2, 11),
            (4, 9),
            (4, 11),
            (5, 10),
            (5, 11),
        ];
        Self {
            title: "Quest 4 Sushi".to_string(),
            board: Board::default(),
            pieces: vec![Piece {
                rank: 0,
                file: 0,
                src: "pieceImages/sumo-wrestler.png".to_string(),
                prize_points: 0,
            }],
            prizes: vec![
                prize(2, 3, "prizeImages/Sushi.png", Some(100)),
                prize(6, 5, "prizeImages/miso-soup.png", Some(50)),
                prize(10, 9, "prizeImages/bonsai.png", Some(75)),
                prize(12, 14, "prizeImages/Sushi.png", Some(100)),
                prize(7, 2, "prizeImages/Key.png", None),
                prize(11, 13, "prizeImages/Chest-Closed.png", None),
            ],
            tiles: vec![water(3, 10), water(4, 10), water(3, 11), water(2, 10)],
            tile_cycle: puddle
                .iter()
                .map(|&(rank, file)| TileOverwrite::set(rank, file, "tileImages/water.png"))
                .collect(),
            sprites: Sprites::default(),
        }
    }
}
