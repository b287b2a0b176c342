//! Battle-map core library
//!
//! Platform-agnostic data structures and editing logic for a tabletop
//! battle-map canvas: the scene model, tools, history, import paths,
//! persistence and broadcasting to player screens.

pub mod broadcast;
pub mod camera;
pub mod codec;
pub mod config;
pub mod editor;
pub mod gesture;
pub mod history;
pub mod import;
pub mod input;
pub mod media;
pub mod reference;
pub mod scene;
pub mod shortcuts;
pub mod snap;
pub mod storage;
pub mod tools;
pub mod weather;

pub use broadcast::{BroadcastError, BroadcastSink, ChannelSink, ClientMessage, Role, ServerMessage, WebSocketSink};
pub use camera::Camera;
pub use codec::{BroadcastPayload, CanvasState, SavedMap, SceneDocument, build_broadcast};
pub use config::{EditorConfig, ImagePolicy};
pub use editor::{Action, Editor};
pub use gesture::{Handle, HandleKind, TransformGesture};
pub use history::{History, SceneSnapshot};
pub use import::{DragPayload, DropIntent, DroppedFile, ImportError, PreparedImage, prepare_image};
pub use input::{InputState, KeyEvent, Modifiers, MouseButton, PointerEvent};
pub use reference::{ReferenceCatalog, ReferenceEntry, ReferenceLibrary};
pub use scene::{Asset, Drawing, EntityId, EntityRef, LayerMove, Scene, Token, TokenKind};
pub use shortcuts::{EditorCommand, ShortcutRegistry};
pub use snap::{GRID_SIZE, SNAP_STEP, snap, snap_point};
pub use storage::{AutoSaveManager, FileStorage, MapLibrary, MemoryStorage, Storage, StorageError};
pub use tools::{Interaction, ToolKind, ToolManager, ToolSettings};
pub use weather::{WeatherAnimation, WeatherFrame, WeatherKind, WeatherOverlay};
