//! Scene model: drawings, placed assets, tokens and ambient weather.

mod asset;
mod drawing;
mod token;

pub use asset::{ASSET_TYPES, Asset, CUSTOM_IMAGE, CUSTOM_IMAGE_PLACEHOLDER, is_known_asset_type};
pub use drawing::{CircleDrawing, Drawing, PathDrawing, RectDrawing, WallDrawing};
pub use token::{Token, TokenKind};

use crate::history::SceneSnapshot;
use crate::weather::WeatherKind;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

/// Unique identifier for scene entities.
pub type EntityId = Uuid;

/// Reference to one entity in one of the scene collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "layer", content = "id", rename_all = "lowercase")]
pub enum EntityRef {
    Token(EntityId),
    Asset(EntityId),
    Drawing(EntityId),
}

/// Direction of a layer reorder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayerMove {
    Forward,
    Backward,
    ToFront,
    ToBack,
}

/// The editable map content.
///
/// Collections are shared copy-on-write with history snapshots: taking a
/// snapshot clones three `Arc`s, and only the collection that is mutated
/// afterwards gets copied. The serialized form is the autosave document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Scene {
    #[serde(default)]
    drawings: Arc<Vec<Drawing>>,
    /// Back to front.
    #[serde(default)]
    assets: Arc<Vec<Asset>>,
    #[serde(default)]
    tokens: Arc<Vec<Token>>,
    #[serde(default)]
    pub weather: WeatherKind,
}

impl Scene {
    /// Create an empty scene.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a scene from plain collections.
    pub fn from_parts(drawings: Vec<Drawing>, assets: Vec<Asset>, tokens: Vec<Token>, weather: WeatherKind) -> Self {
        Self {
            drawings: Arc::new(drawings),
            assets: Arc::new(assets),
            tokens: Arc::new(tokens),
            weather,
        }
    }

    pub fn drawings(&self) -> &[Drawing] {
        &self.drawings
    }

    /// Assets in z-order (back to front).
    pub fn assets(&self) -> &[Asset] {
        &self.assets
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    pub fn drawings_mut(&mut self) -> &mut Vec<Drawing> {
        Arc::make_mut(&mut self.drawings)
    }

    pub fn assets_mut(&mut self) -> &mut Vec<Asset> {
        Arc::make_mut(&mut self.assets)
    }

    pub fn tokens_mut(&mut self) -> &mut Vec<Token> {
        Arc::make_mut(&mut self.tokens)
    }

    /// Check whether all three collections are empty.
    pub fn is_empty(&self) -> bool {
        self.drawings.is_empty() && self.assets.is_empty() && self.tokens.is_empty()
    }

    pub fn add_drawing(&mut self, drawing: Drawing) {
        self.drawings_mut().push(drawing);
    }

    /// Add an asset on top of all others.
    pub fn add_asset(&mut self, asset: Asset) {
        self.assets_mut().push(asset);
    }

    pub fn add_token(&mut self, token: Token) {
        self.tokens_mut().push(token);
    }

    pub fn asset(&self, id: EntityId) -> Option<&Asset> {
        self.assets.iter().find(|a| a.id == id)
    }

    pub fn asset_mut(&mut self, id: EntityId) -> Option<&mut Asset> {
        // Look up first so a miss does not force a copy of shared data.
        let index = self.assets.iter().position(|a| a.id == id)?;
        self.assets_mut().get_mut(index)
    }

    pub fn token(&self, id: EntityId) -> Option<&Token> {
        self.tokens.iter().find(|t| t.id == id)
    }

    pub fn token_mut(&mut self, id: EntityId) -> Option<&mut Token> {
        let index = self.tokens.iter().position(|t| t.id == id)?;
        self.tokens_mut().get_mut(index)
    }

    pub fn contains(&self, entity: EntityRef) -> bool {
        match entity {
            EntityRef::Token(id) => self.token(id).is_some(),
            EntityRef::Asset(id) => self.asset(id).is_some(),
            EntityRef::Drawing(id) => self.drawings.iter().any(|d| d.id() == id),
        }
    }

    /// Remove an entity. Returns false if it was not present.
    pub fn remove(&mut self, entity: EntityRef) -> bool {
        if !self.contains(entity) {
            return false;
        }
        match entity {
            EntityRef::Token(id) => self.tokens_mut().retain(|t| t.id != id),
            EntityRef::Asset(id) => self.assets_mut().retain(|a| a.id != id),
            EntityRef::Drawing(id) => self.drawings_mut().retain(|d| d.id() != id),
        }
        true
    }

    /// Move an asset within the z-order.
    /// Returns true if the order changed.
    pub fn reorder_asset(&mut self, id: EntityId, movement: LayerMove) -> bool {
        let Some(pos) = self.assets.iter().position(|a| a.id == id) else {
            return false;
        };
        let last = self.assets.len() - 1;
        let target = match movement {
            LayerMove::Forward => (pos + 1).min(last),
            LayerMove::Backward => pos.saturating_sub(1),
            LayerMove::ToFront => last,
            LayerMove::ToBack => 0,
        };
        if target == pos {
            return false;
        }
        let assets = self.assets_mut();
        let asset = assets.remove(pos);
        assets.insert(target, asset);
        true
    }

    /// Remove all drawings, assets and tokens and reset the weather.
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Capture the historized part of the scene.
    pub fn snapshot(&self) -> SceneSnapshot {
        SceneSnapshot {
            drawings: Arc::clone(&self.drawings),
            assets: Arc::clone(&self.assets),
            tokens: Arc::clone(&self.tokens),
        }
    }

    /// Replace all three collections at once. Weather is left untouched.
    pub fn restore(&mut self, snapshot: &SceneSnapshot) {
        self.drawings = Arc::clone(&snapshot.drawings);
        self.assets = Arc::clone(&snapshot.assets);
        self.tokens = Arc::clone(&snapshot.tokens);
    }

    /// Serialize to the autosave JSON document.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Restore from the autosave JSON document.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}
