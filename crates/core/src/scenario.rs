//! ASCII scenarios: a map plus its entities in one block of text.
//!
//! ```text
//! ##########
//! #@...%..a#
//! #..o.."..#
//! ##########
//! ```
//!
//! `.` floor, `#` wall, `%` chasm (blocks movement only), `"` glass (blocks sight
//! only), `@` the acting creature, `a`-`z` other creatures (except `o`), and `o`
//! a blocking object. Entities stand on floor.

use std::collections::BTreeMap;

use crate::entity::Entities;
use crate::grid::{Cell, Grid, Map};
use crate::types::{EntityId, Pos};

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ScenarioError {
    #[error("scenario has no rows")]
    Empty,
    #[error("row {row} is {found} cells wide, expected {expected}")]
    Ragged { row: usize, expected: usize, found: usize },
    #[error("unknown glyph {glyph:?} at {pos}")]
    UnknownGlyph { glyph: char, pos: Pos },
    #[error("creature glyph {glyph:?} is used more than once")]
    DuplicateGlyph { glyph: char },
}

#[derive(Clone, Debug)]
pub struct Scenario {
    pub map: Map,
    pub entities: Entities,
    glyphs: BTreeMap<char, EntityId>,
}

impl Scenario {
    pub fn parse(text: &str) -> Result<Self, ScenarioError> {
        let rows: Vec<&str> =
            text.lines().map(str::trim_end).skip_while(|l| l.is_empty()).collect();
        let rows: Vec<&str> = match rows.iter().rposition(|l| !l.is_empty()) {
            Some(last) => rows[..=last].to_vec(),
            None => return Err(ScenarioError::Empty),
        };

        let width = rows[0].chars().count();
        let mut map = Map::new(width, rows.len());
        let mut entities = Entities::new();
        let mut glyphs = BTreeMap::new();

        for (y, row) in rows.iter().enumerate() {
            let found = row.chars().count();
            if found != width {
                return Err(ScenarioError::Ragged { row: y, expected: width, found });
            }
            for (x, glyph) in row.chars().enumerate() {
                let pos = Pos { y: y as i32, x: x as i32 };
                match glyph {
                    '.' => {}
                    '#' => map.set_cell(pos, Cell::WALL),
                    '%' => map.set_cell(pos, Cell::CHASM),
                    '"' => map.set_cell(pos, Cell::GLASS),
                    'o' => {
                        entities.spawn_object("object", pos, true);
                    }
                    '@' | 'a'..='z' => {
                        if glyphs.contains_key(&glyph) {
                            return Err(ScenarioError::DuplicateGlyph { glyph });
                        }
                        let id = entities.spawn_creature(glyph.to_string(), pos);
                        glyphs.insert(glyph, id);
                    }
                    _ => return Err(ScenarioError::UnknownGlyph { glyph, pos }),
                }
            }
        }

        Ok(Self { map, entities, glyphs })
    }

    pub fn entity(&self, glyph: char) -> Option<EntityId> {
        self.glyphs.get(&glyph).copied()
    }

    /// The `@` creature, if the scenario placed one.
    pub fn source(&self) -> Option<EntityId> {
        self.entity('@')
    }

    pub fn glyph_of(&self, id: EntityId) -> Option<char> {
        self.glyphs.iter().find(|&(_, &v)| v == id).map(|(&g, _)| g)
    }

    /// Draws the scenario back as text. `overlay` wins over everything else.
    pub fn render(&self, overlay: impl Fn(Pos) -> Option<char>) -> String {
        let mut text = String::new();
        for y in 0..self.map.height() {
            for x in 0..self.map.width() {
                let pos = Pos { y: y as i32, x: x as i32 };
                text.push(overlay(pos).unwrap_or_else(|| self.glyph_at(pos)));
            }
            text.push('\n');
        }
        text
    }

    fn glyph_at(&self, pos: Pos) -> char {
        if let Some(e) = self.entities.iter().find(|e| e.pos == pos && e.is_living_creature()) {
            return self.glyph_of(e.id).unwrap_or('?');
        }
        if self.entities.blocking_object_at(pos).is_some() {
            return 'o';
        }
        match self.map.cell_at(pos) {
            Some(cell) if cell.blocked && cell.blocks_sight => '#',
            Some(cell) if cell.blocked => '%',
            Some(cell) if cell.blocks_sight => '"',
            _ => '.',
        }
    }
}
