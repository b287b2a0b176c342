//! The map editor: interprets pointer, keyboard and drop input against the
//! scene, the camera and the undo history.
//!
//! Every handler runs synchronously and returns an [`Action`] telling the
//! host what to do next (persist, re-render, open a file chooser, show a
//! notice).

use crate::camera::Camera;
use crate::codec::{BroadcastPayload, SavedMap, SceneDocument, build_broadcast};
use crate::config::EditorConfig;
use crate::gesture::{Handle, TransformGesture, handles_for, hit_test_handles};
use crate::history::History;
use crate::hit_test::{asset_at, entity_at, pick_draggable};
use crate::import::{DragPayload, DropIntent, DroppedFile, ImportError, PreparedImage, prepare_image};
use crate::input::{InputState, KeyEvent, Modifiers, MouseButton, PointerEvent, is_space};
use crate::reference::ReferenceLibrary;
use crate::scene::{Asset, Drawing, EntityId, EntityRef, LayerMove, Scene, Token, is_known_asset_type};
use crate::shortcuts::{EditorCommand, ShortcutRegistry};
use crate::snap::snap_point_to;
use crate::tools::{Interaction, ToolKind, ToolManager, ToolSettings};
use crate::weather::WeatherKind;
use kurbo::{Point, Size, Vec2};

/// What the host should do after an input was handled.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// Nothing changed.
    None,
    /// Scene content changed: persist and re-render.
    SceneChanged,
    /// Only the view, selection or a preview changed: re-render.
    ViewChanged,
    /// Open the image file chooser; answer with [`Editor::complete_upload`].
    RequestUpload,
    /// Show a user-visible notice. The scene was left untouched.
    Notice(String),
}

/// Battle-map editor state.
#[derive(Debug, Clone)]
pub struct Editor {
    scene: Scene,
    camera: Camera,
    history: History,
    tools: ToolManager,
    /// Selected asset (transform tool).
    selection: Option<EntityId>,
    input: InputState,
    /// World position reserved by an upload request.
    pending_upload: Option<Point>,
    viewport: Size,
    config: EditorConfig,
}

impl Default for Editor {
    fn default() -> Self {
        Self::new(EditorConfig::default())
    }
}

impl Editor {
    pub fn new(config: EditorConfig) -> Self {
        let scene = Scene::new();
        let mut history = History::with_capacity(config.history_capacity);
        history.reset(scene.snapshot());
        Self {
            scene,
            camera: Camera::default(),
            history,
            tools: ToolManager::new(),
            selection: None,
            input: InputState::new(),
            pending_upload: None,
            viewport: Size::new(800.0, 600.0),
            config,
        }
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    /// The autosave document.
    pub fn document(&self) -> &SceneDocument {
        &self.scene
    }

    pub fn camera(&self) -> Camera {
        self.camera
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn tool(&self) -> ToolKind {
        self.tools.current_tool
    }

    /// Switch tools. The in-progress interaction is dropped and the asset
    /// selection only survives inside the transform tool.
    pub fn set_tool(&mut self, tool: ToolKind) {
        self.tools.set_tool(tool);
        if tool != ToolKind::Transform {
            self.selection = None;
        }
    }

    pub fn settings(&self) -> &ToolSettings {
        &self.tools.settings
    }

    pub fn settings_mut(&mut self) -> &mut ToolSettings {
        &mut self.tools.settings
    }

    /// The current interaction session.
    pub fn session(&self) -> &Interaction {
        &self.tools.session
    }

    pub fn selection(&self) -> Option<EntityId> {
        self.selection
    }

    pub fn selected_asset(&self) -> Option<&Asset> {
        self.selection.and_then(|id| self.scene.asset(id))
    }

    /// Set the canvas size in screen pixels.
    pub fn set_viewport(&mut self, size: Size) {
        self.viewport = size;
    }

    pub fn viewport(&self) -> Size {
        self.viewport
    }

    /// The in-progress stroke or segment, drawn unsnapped.
    pub fn preview(&self) -> Option<Drawing> {
        self.tools.preview_drawing(&self.config)
    }

    /// Transform handles, shown for the selected asset in the transform tool.
    pub fn handles(&self) -> Option<[Handle; 2]> {
        if self.tools.current_tool != ToolKind::Transform {
            return None;
        }
        self.selected_asset().map(handles_for)
    }

    fn snap(&self, point: Point) -> Point {
        snap_point_to(point, self.config.snap_step)
    }

    fn commit(&mut self) {
        self.history.push(self.scene.snapshot());
    }

    fn prune_selection(&mut self) {
        if self.selection.is_some_and(|id| self.scene.asset(id).is_none()) {
            self.selection = None;
        }
    }

    // ------------------------------------------------------------------
    // Pointer input
    // ------------------------------------------------------------------

    /// Dispatch a pointer event.
    pub fn handle_pointer_event(&mut self, event: &PointerEvent) -> Action {
        match *event {
            PointerEvent::Down { position, button } => self.pointer_down(position, button),
            PointerEvent::Move { position } => self.pointer_move(position),
            PointerEvent::Up { position, button } => self.release(position, button),
            PointerEvent::Leave { position } => self.pointer_leave(position),
            PointerEvent::Scroll { delta, .. } => self.wheel(delta.y),
        }
    }

    /// Pointer pressed at a screen position.
    pub fn pointer_down(&mut self, screen: Point, button: MouseButton) -> Action {
        self.input.handle_pointer_event(&PointerEvent::Down { position: screen, button });

        if self.tools.current_tool == ToolKind::Pan || button == MouseButton::Middle || self.input.is_space_held() {
            self.tools.session = Interaction::Panning { anchor: screen };
            return Action::None;
        }
        if button != MouseButton::Left {
            return Action::None;
        }

        let world = self.camera.screen_to_world(screen);
        match self.tools.current_tool {
            ToolKind::Select => match pick_draggable(&self.scene, world) {
                Some(target) => self.begin_drag(target, world),
                None => Action::None,
            },
            ToolKind::Transform => self.transform_down(world),
            ToolKind::Brush | ToolKind::Wall | ToolKind::Rect | ToolKind::Circle => {
                self.tools.begin_drawing(world);
                Action::ViewChanged
            }
            ToolKind::Erase => self.erase_at(world),
            ToolKind::Pan => Action::None,
        }
    }

    fn transform_down(&mut self, world: Point) -> Action {
        if let Some(asset) = self.selected_asset() {
            let tolerance = self.config.handle_radius / self.camera.scale;
            if let Some(kind) = hit_test_handles(asset, world, tolerance) {
                let gesture = TransformGesture::begin(asset, kind, world, self.config.min_asset_size);
                self.tools.session = Interaction::Transforming(gesture);
                return Action::None;
            }
        }
        match asset_at(&self.scene, world) {
            Some(id) => {
                self.selection = Some(id);
                self.begin_drag(EntityRef::Asset(id), world);
                Action::ViewChanged
            }
            None => {
                let had_selection = self.selection.take().is_some();
                if had_selection { Action::ViewChanged } else { Action::None }
            }
        }
    }

    fn begin_drag(&mut self, target: EntityRef, world: Point) -> Action {
        let origin = match target {
            EntityRef::Token(id) => self.scene.token(id).map(Token::center),
            EntityRef::Asset(id) => self.scene.asset(id).map(Asset::position),
            EntityRef::Drawing(_) => None,
        };
        let Some(origin) = origin else {
            return Action::None;
        };
        self.tools.session = Interaction::Dragging {
            target,
            grab_offset: origin - world,
            moved: false,
        };
        Action::None
    }

    fn erase_at(&mut self, world: Point) -> Action {
        let reach = 2.0 * self.config.eraser_radius / self.camera.scale;
        let Some(entity) = entity_at(&self.scene, world, reach) else {
            return Action::None;
        };
        if !self.scene.remove(entity) {
            return Action::None;
        }
        self.prune_selection();
        self.commit();
        Action::SceneChanged
    }

    /// Pointer moved to a screen position.
    pub fn pointer_move(&mut self, screen: Point) -> Action {
        self.input.handle_pointer_event(&PointerEvent::Move { position: screen });
        let world = self.camera.screen_to_world(screen);

        match &mut self.tools.session {
            Interaction::Idle => Action::None,
            Interaction::Panning { anchor } => {
                let delta: Vec2 = screen - *anchor;
                *anchor = screen;
                self.camera.pan_by(delta);
                Action::ViewChanged
            }
            Interaction::Dragging {
                target,
                grab_offset,
                moved,
            } => {
                let position = snap_point_to(world + *grab_offset, self.config.snap_step);
                let changed = match *target {
                    EntityRef::Token(id) => match self.scene.token(id) {
                        Some(token) if token.center() != position => {
                            if let Some(token) = self.scene.token_mut(id) {
                                token.set_center(position);
                            }
                            true
                        }
                        _ => false,
                    },
                    EntityRef::Asset(id) => match self.scene.asset(id) {
                        Some(asset) if asset.position() != position => {
                            if let Some(asset) = self.scene.asset_mut(id) {
                                asset.set_position(position);
                            }
                            true
                        }
                        _ => false,
                    },
                    EntityRef::Drawing(_) => false,
                };
                if changed {
                    *moved = true;
                    Action::SceneChanged
                } else {
                    Action::None
                }
            }
            Interaction::Stroke { .. } | Interaction::Segment { .. } => {
                self.tools.update_drawing(world);
                Action::ViewChanged
            }
            Interaction::Transforming(gesture) => {
                let update = gesture.update(world);
                match self.scene.asset_mut(gesture.asset_id) {
                    Some(asset) => {
                        TransformGesture::apply(update, asset);
                        Action::SceneChanged
                    }
                    None => Action::None,
                }
            }
        }
    }

    /// Left button released. Commits whatever the session produced.
    pub fn pointer_up(&mut self, screen: Point) -> Action {
        self.release(screen, MouseButton::Left)
    }

    /// Any button released. Commits whatever the session produced.
    pub fn release(&mut self, screen: Point, button: MouseButton) -> Action {
        self.input.handle_pointer_event(&PointerEvent::Up {
            position: screen,
            button,
        });

        if matches!(self.tools.session, Interaction::Stroke { .. } | Interaction::Segment { .. }) {
            return match self.tools.end_drawing(&self.config) {
                Some(drawing) => {
                    self.scene.add_drawing(drawing);
                    self.commit();
                    Action::SceneChanged
                }
                // Clears the preview.
                None => Action::ViewChanged,
            };
        }

        match std::mem::take(&mut self.tools.session) {
            Interaction::Dragging { moved: true, .. } | Interaction::Transforming(_) => {
                self.commit();
                Action::SceneChanged
            }
            _ => Action::None,
        }
    }

    /// Pointer left the canvas: same as a release.
    pub fn pointer_leave(&mut self, screen: Point) -> Action {
        let action = self.pointer_up(screen);
        self.input.handle_pointer_event(&PointerEvent::Leave { position: screen });
        action
    }

    /// Mouse wheel: exponential zoom anchored at the viewport origin.
    pub fn wheel(&mut self, delta: f64) -> Action {
        let before = self.camera.scale;
        self.camera.zoom_by_wheel_with(
            delta,
            self.config.wheel_zoom_factor,
            self.config.min_scale,
            self.config.max_scale,
        );
        if self.camera.scale == before {
            Action::None
        } else {
            Action::ViewChanged
        }
    }

    // ------------------------------------------------------------------
    // Keyboard and commands
    // ------------------------------------------------------------------

    /// Handle a key press or release.
    pub fn handle_key_event(&mut self, event: &KeyEvent, modifiers: Modifiers) -> Action {
        self.input.set_modifiers(modifiers);
        self.input.handle_key_event(event);

        let KeyEvent::Pressed(key) = event else {
            return Action::None;
        };
        if is_space(key) {
            return Action::None;
        }
        match ShortcutRegistry::resolve(key, modifiers) {
            Some(EditorCommand::Undo) => self.undo(),
            Some(EditorCommand::Redo) => self.redo(),
            Some(EditorCommand::DeleteSelection) if self.tools.current_tool == ToolKind::Transform => {
                self.delete_selected()
            }
            Some(EditorCommand::Layer(movement)) => self.reorder_selected(movement),
            _ => Action::None,
        }
    }

    /// Whether the space bar pan override is active.
    pub fn is_space_held(&self) -> bool {
        self.input.is_space_held()
    }

    /// Step back one edit. An unfinished gesture is abandoned first.
    pub fn undo(&mut self) -> Action {
        self.tools.session = Interaction::Idle;
        let Some(snapshot) = self.history.undo() else {
            return Action::None;
        };
        self.scene.restore(snapshot);
        self.prune_selection();
        Action::SceneChanged
    }

    pub fn redo(&mut self) -> Action {
        self.tools.session = Interaction::Idle;
        let Some(snapshot) = self.history.redo() else {
            return Action::None;
        };
        self.scene.restore(snapshot);
        self.prune_selection();
        Action::SceneChanged
    }

    /// Remove the selected asset.
    pub fn delete_selected(&mut self) -> Action {
        let Some(id) = self.selection.take() else {
            return Action::None;
        };
        if !self.scene.remove(EntityRef::Asset(id)) {
            return Action::None;
        }
        self.commit();
        Action::SceneChanged
    }

    /// Move the selected asset within the z-order.
    pub fn reorder_selected(&mut self, movement: LayerMove) -> Action {
        let Some(id) = self.selection else {
            return Action::None;
        };
        if !self.scene.reorder_asset(id, movement) {
            return Action::None;
        }
        self.commit();
        Action::SceneChanged
    }

    /// Change the weather. Not recorded in history.
    pub fn set_weather(&mut self, weather: WeatherKind) -> Action {
        if self.scene.weather == weather {
            return Action::None;
        }
        self.scene.weather = weather;
        Action::SceneChanged
    }

    /// Place a free-standing marker token at a screen position.
    pub fn place_marker(&mut self, label: &str, color: &str, screen: Point) -> Action {
        let center = self.snap(self.camera.screen_to_world(screen));
        self.scene.add_token(Token::marker(label, color, center, self.config.token_radius));
        self.commit();
        Action::SceneChanged
    }

    // ------------------------------------------------------------------
    // Whole-scene operations
    // ------------------------------------------------------------------

    fn reset_session(&mut self) {
        self.history.reset(self.scene.snapshot());
        self.selection = None;
        self.tools.session = Interaction::Idle;
        self.pending_upload = None;
    }

    /// Empty the map and reset weather, history, view, selection and any
    /// pending upload.
    pub fn clear(&mut self) -> Action {
        self.scene.clear();
        self.camera.reset();
        self.reset_session();
        log::info!("Canvas cleared");
        Action::SceneChanged
    }

    /// Replace the scene with a restored document. History starts empty.
    pub fn hydrate(&mut self, document: SceneDocument) {
        self.scene = document;
        self.reset_session();
    }

    /// Open a named save: scene and view are replaced, history starts empty.
    pub fn load_saved_map(&mut self, map: &SavedMap) -> Action {
        self.scene = map.to_scene();
        self.camera = map.view;
        self.reset_session();
        log::info!("Loaded map \"{}\"", map.name);
        Action::SceneChanged
    }

    /// Capture the current map under `name`.
    pub fn save_map(&self, name: &str) -> SavedMap {
        SavedMap::capture(name, &self.scene, self.camera)
    }

    /// Build the payload for viewers.
    pub fn broadcast(&self, references: &dyn ReferenceLibrary) -> BroadcastPayload {
        build_broadcast(&self.scene, self.camera, references, &self.config)
    }

    // ------------------------------------------------------------------
    // Drops and uploads
    // ------------------------------------------------------------------

    /// A library item was dropped at a screen position.
    pub fn drop_payload(&mut self, json: &str, screen: Point) -> Action {
        let payload = match DragPayload::parse(json) {
            Ok(payload) => payload,
            Err(e) => {
                log::warn!("Rejected drop: {}", e);
                return Action::Notice("Could not read the dropped item".to_string());
            }
        };
        let world = self.camera.screen_to_world(screen);

        match payload.intent() {
            DropIntent::Ignore => {
                log::debug!("Ignoring drop without id");
                Action::None
            }
            DropIntent::RequestUpload => {
                self.pending_upload = Some(self.snap(world));
                Action::RequestUpload
            }
            DropIntent::PlaceAsset { asset_type } => {
                if !is_known_asset_type(&asset_type) {
                    log::debug!("Placing unknown asset type {}", asset_type);
                }
                let size = self.config.library_asset_size;
                let position = self.snap(world - Vec2::new(size / 2.0, size / 2.0));
                self.scene.add_asset(Asset::new(asset_type, position, Size::new(size, size)));
                self.commit();
                Action::SceneChanged
            }
            DropIntent::PlaceToken {
                kind,
                reference_id,
                label,
                image,
            } => {
                let center = self.snap(world);
                let mut token = Token::referenced(kind, reference_id, label, center, self.config.token_radius);
                token.image = image;
                self.scene.add_token(token);
                self.commit();
                Action::SceneChanged
            }
        }
    }

    /// Files were dropped at a screen position.
    ///
    /// Each image becomes a custom image asset; later files are offset by
    /// one snap step. Non-image files are skipped. One history entry is
    /// recorded for the whole drop.
    pub fn drop_files(&mut self, files: &[DroppedFile], screen: Point) -> Action {
        let origin = self.snap(self.camera.screen_to_world(screen));
        let step = self.config.snap_step;
        let mut placed = 0usize;
        let mut failures = Vec::new();

        for file in files {
            if !file.is_image() {
                log::debug!("Skipping dropped file {}", file.name);
                continue;
            }
            match prepare_image(file, self.config.canvas_image) {
                Ok(image) => {
                    let offset = step * placed as f64;
                    self.add_custom_image(origin + Vec2::new(offset, offset), image);
                    placed += 1;
                }
                Err(e) => {
                    log::warn!("Dropped file rejected: {}", e);
                    failures.push(file.name.clone());
                }
            }
        }

        if placed > 0 {
            self.commit();
            Action::SceneChanged
        } else if !failures.is_empty() {
            Action::Notice(format!("Could not load {}", failures.join(", ")))
        } else {
            Action::None
        }
    }

    /// Toolbar upload: reserve the snapped viewport center.
    pub fn request_upload(&mut self) -> Action {
        let center = Point::new(self.viewport.width / 2.0, self.viewport.height / 2.0);
        self.pending_upload = Some(self.snap(self.camera.screen_to_world(center)));
        Action::RequestUpload
    }

    /// Position reserved by the last upload request.
    pub fn pending_upload(&self) -> Option<Point> {
        self.pending_upload
    }

    /// Consume the reserved upload position. Returns it at most once.
    pub fn take_pending_upload(&mut self) -> Option<Point> {
        self.pending_upload.take()
    }

    /// Insert an image prepared off-thread at a position obtained from
    /// [`take_pending_upload`](Self::take_pending_upload).
    pub fn place_uploaded_image(&mut self, position: Point, image: Result<PreparedImage, ImportError>) -> Action {
        match image {
            Ok(image) => {
                self.add_custom_image(position, image);
                self.commit();
                Action::SceneChanged
            }
            Err(e) => {
                log::warn!("Upload failed: {}", e);
                Action::Notice(format!("Upload failed: {}", e))
            }
        }
    }

    /// Finish an upload synchronously. `None` means the chooser was
    /// cancelled. The reserved position is released in every case.
    pub fn complete_upload(&mut self, file: Option<&DroppedFile>) -> Action {
        let Some(position) = self.take_pending_upload() else {
            return match file {
                Some(_) => Action::Notice(ImportError::NoPendingUpload.to_string()),
                None => Action::None,
            };
        };
        let Some(file) = file else {
            return Action::None;
        };
        let prepared = prepare_image(file, self.config.canvas_image);
        self.place_uploaded_image(position, prepared)
    }

    fn add_custom_image(&mut self, position: Point, image: PreparedImage) {
        let size = self.config.library_asset_size;
        self.scene
            .add_asset(Asset::custom_image(position, Size::new(size, size), image.data_url, image.label));
    }
}
