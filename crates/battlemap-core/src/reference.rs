//! Read-only character, NPC and monster references.

use crate::import::{DragKind, DragPayload};
use crate::scene::TokenKind;
use serde::{Deserialize, Serialize};

/// One referenced character, NPC or monster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReferenceEntry {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub portrait_image: Option<String>,
}

impl ReferenceEntry {
    pub fn new(id: impl Into<String>, name: impl Into<String>, portrait_image: Option<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            portrait_image,
        }
    }

    /// Library drag payload dropping this entry as a token of `kind`.
    pub fn drag_payload(&self, kind: TokenKind) -> Option<DragPayload> {
        let kind = match kind {
            TokenKind::Character => DragKind::Character,
            TokenKind::Npc => DragKind::Npc,
            TokenKind::Monster => DragKind::Monster,
            TokenKind::Marker => return None,
        };
        Some(DragPayload {
            kind,
            id: Some(self.id.clone()),
            name: Some(self.name.clone()),
            asset_type: None,
            width: None,
            height: None,
            image_url: self.portrait_image.clone(),
        })
    }
}

/// Source of reference entries, provided by the surrounding application.
pub trait ReferenceLibrary {
    /// All entries of one kind. Markers have none.
    fn entries(&self, kind: TokenKind) -> &[ReferenceEntry];

    fn lookup(&self, kind: TokenKind, id: &str) -> Option<&ReferenceEntry> {
        self.entries(kind).iter().find(|e| e.id == id)
    }

    /// Portrait of the entry a token refers to.
    fn portrait(&self, kind: TokenKind, id: &str) -> Option<&str> {
        self.lookup(kind, id).and_then(|e| e.portrait_image.as_deref())
    }
}

/// In-memory reference lists.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ReferenceCatalog {
    pub characters: Vec<ReferenceEntry>,
    pub npcs: Vec<ReferenceEntry>,
    pub monsters: Vec<ReferenceEntry>,
}

impl ReferenceCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, kind: TokenKind, entry: ReferenceEntry) {
        let list = match kind {
            TokenKind::Character => &mut self.characters,
            TokenKind::Npc => &mut self.npcs,
            TokenKind::Monster => &mut self.monsters,
            TokenKind::Marker => {
                log::warn!("Ignoring reference entry {} for marker tokens", entry.id);
                return;
            }
        };
        list.retain(|e| e.id != entry.id);
        list.push(entry);
    }
}

impl ReferenceLibrary for ReferenceCatalog {
    fn entries(&self, kind: TokenKind) -> &[ReferenceEntry] {
        match kind {
            TokenKind::Character => &self.characters,
            TokenKind::Npc => &self.npcs,
            TokenKind::Monster => &self.monsters,
            TokenKind::Marker => &[],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::import::DropIntent;

    fn catalog() -> ReferenceCatalog {
        let mut catalog = ReferenceCatalog::new();
        catalog.insert(TokenKind::Monster, ReferenceEntry::new("m1", "Goblin", Some("data:image/png;base64,AAAA".into())));
        catalog.insert(TokenKind::Character, ReferenceEntry::new("c1", "Aria", None));
        catalog
    }

    #[test]
    fn test_lookup_by_kind() {
        let catalog = catalog();
        assert_eq!(catalog.lookup(TokenKind::Monster, "m1").map(|e| e.name.as_str()), Some("Goblin"));
        assert!(catalog.lookup(TokenKind::Npc, "m1").is_none());
        assert_eq!(catalog.portrait(TokenKind::Monster, "m1"), Some("data:image/png;base64,AAAA"));
        assert_eq!(catalog.portrait(TokenKind::Character, "c1"), None);
    }

    #[test]
    fn test_insert_replaces_same_id() {
        let mut catalog = catalog();
        catalog.insert(TokenKind::Character, ReferenceEntry::new("c1", "Aria the Bold", None));
        assert_eq!(catalog.entries(TokenKind::Character).len(), 1);
        catalog.insert(TokenKind::Marker, ReferenceEntry::new("x", "X", None));
        assert!(catalog.entries(TokenKind::Marker).is_empty());
    }

    #[test]
    fn test_drag_payload_resolves_to_token() {
        let catalog = catalog();
        let payload = catalog.characters[0].drag_payload(TokenKind::Character).unwrap();
        let payload = DragPayload::parse(&payload.to_json().unwrap()).unwrap();
        assert_eq!(
            payload.intent(),
            DropIntent::PlaceToken {
                kind: TokenKind::Character,
                reference_id: "c1".to_string(),
                label: "Aria".to_string(),
                image: None,
            }
        );
        assert!(catalog.characters[0].drag_payload(TokenKind::Marker).is_none());
    }
}
