//! Layered scene composition.

use crate::display::{DisplayList, DrawCommand, Layer, color_or_default};
use crate::renderer::{GridStyle, RenderContext};
use battlemap_core::scene::Drawing;
use battlemap_core::weather::{Particle, WeatherKind};
use kurbo::{Affine, Point, Rect, Size};
use peniko::Color;

/// Spacing and size of asset tiles along a wall, in world units.
pub const WALL_TILE_SPACING: f64 = 50.0;

/// Visible world rectangle, expanded to whole grid cells.
fn grid_bounds(ctx: &RenderContext, grid_size: f64) -> Rect {
    let world_tl = ctx.camera.screen_to_world(Point::ZERO);
    let world_br = ctx
        .camera
        .screen_to_world(Point::new(ctx.viewport_size.width, ctx.viewport_size.height));
    Rect::new(
        (world_tl.x / grid_size).floor() * grid_size,
        (world_tl.y / grid_size).floor() * grid_size,
        (world_br.x / grid_size).ceil() * grid_size,
        (world_br.y / grid_size).ceil() * grid_size,
    )
}

fn compose_grid(ctx: &RenderContext, list: &mut DisplayList) {
    let grid_size = ctx.grid_size;
    if ctx.grid_style == GridStyle::None || grid_size <= 0.0 {
        return;
    }
    let bounds = grid_bounds(ctx, grid_size);
    let width = 1.0 / ctx.camera.scale;

    let mut x = bounds.x0;
    while x <= bounds.x1 {
        list.push(
            Layer::Grid,
            DrawCommand::Line {
                from: Point::new(x, bounds.y0),
                to: Point::new(x, bounds.y1),
                color: ctx.grid_color,
                width,
            },
        );
        x += grid_size;
    }
    let mut y = bounds.y0;
    while y <= bounds.y1 {
        list.push(
            Layer::Grid,
            DrawCommand::Line {
                from: Point::new(bounds.x0, y),
                to: Point::new(bounds.x1, y),
                color: ctx.grid_color,
                width,
            },
        );
        y += grid_size;
    }
}

/// Tile centers every [`WALL_TILE_SPACING`] along a segment.
pub fn wall_tile_centers(start: Point, end: Point) -> Vec<Point> {
    let length = start.distance(end);
    if length <= f64::EPSILON {
        return vec![start];
    }
    let count = (length / WALL_TILE_SPACING).ceil() as usize;
    (0..count)
        .map(|i| {
            let t = (((i as f64) + 0.5) * WALL_TILE_SPACING).min(length) / length;
            start.lerp(end, t)
        })
        .collect()
}

fn push_drawing(list: &mut DisplayList, layer: Layer, drawing: &Drawing) {
    match drawing {
        Drawing::Path(path) => list.push(
            layer,
            DrawCommand::Polyline {
                points: path.points.clone(),
                color: color_or_default(&path.color),
                width: path.stroke_width,
            },
        ),
        Drawing::Wall(wall) => {
            let [start, end] = wall.points;
            match &wall.asset_type {
                Some(asset_type) => {
                    let rotation = (end.y - start.y).atan2(end.x - start.x).to_degrees();
                    for center in wall_tile_centers(start, end) {
                        list.push(
                            layer,
                            DrawCommand::WallTile {
                                asset_type: asset_type.clone(),
                                center,
                                size: WALL_TILE_SPACING,
                                rotation,
                            },
                        );
                    }
                }
                None => list.push(
                    layer,
                    DrawCommand::Line {
                        from: start,
                        to: end,
                        color: color_or_default(&wall.color),
                        width: wall.stroke_width,
                    },
                ),
            }
        }
        Drawing::Rect(rect) => list.push(
            layer,
            DrawCommand::StrokeRect {
                rect: Rect::new(rect.x, rect.y, rect.x + rect.width, rect.y + rect.height),
                color: color_or_default(&rect.color),
                width: rect.stroke_width,
            },
        ),
        Drawing::Circle(circle) => list.push(
            layer,
            DrawCommand::StrokeCircle {
                center: Point::new(circle.x, circle.y),
                radius: circle.radius,
                color: color_or_default(&circle.color),
                width: circle.stroke_width,
            },
        ),
    }
}

/// Compose the scene into a display list.
///
/// Layers, back to front: background, grid, drawings, assets, preview,
/// handles, tokens. Tokens always end up above everything else in the
/// world.
pub fn compose(ctx: &RenderContext) -> DisplayList {
    let mut list = DisplayList::new(
        ctx.background_color,
        ctx.world_transform(),
        Affine::scale(ctx.scale_factor),
    );

    list.push(
        Layer::Background,
        DrawCommand::FillRect {
            rect: Rect::from_origin_size(Point::ZERO, ctx.viewport_size),
            color: ctx.background_color,
        },
    );

    compose_grid(ctx, &mut list);

    for drawing in ctx.scene.drawings() {
        push_drawing(&mut list, Layer::Drawings, drawing);
    }

    for asset in ctx.scene.assets() {
        list.push(
            Layer::Assets,
            DrawCommand::Asset {
                asset_type: asset.asset_type.clone(),
                rect: asset.rect(),
                rotation: asset.rotation,
                image_url: asset.image_url.clone(),
                label: asset.label.clone(),
            },
        );
    }

    if let Some(preview) = &ctx.preview {
        push_drawing(&mut list, Layer::Preview, preview);
    }

    if let Some(handles) = &ctx.handles {
        let radius = ctx.handle_radius / ctx.camera.scale;
        for handle in handles {
            list.push(
                Layer::Handles,
                DrawCommand::Handle {
                    position: handle.position,
                    kind: handle.kind,
                    radius,
                    color: ctx.selection_color,
                },
            );
        }
    }

    for token in ctx.scene.tokens() {
        list.push(
            Layer::Tokens,
            DrawCommand::Token {
                center: token.center(),
                radius: token.size,
                border: color_or_default(&token.color),
                label: token.label.clone(),
                image: token.image.clone(),
            },
        );
    }

    list
}

fn particle_color(kind: WeatherKind, particle: &Particle) -> Color {
    let alpha = (particle.alpha(kind) * 255.0).round().clamp(0.0, 255.0) as u8;
    match kind {
        WeatherKind::Rain => Color::from_rgba8(174, 194, 224, alpha),
        WeatherKind::Snow => Color::from_rgba8(255, 255, 255, alpha),
        WeatherKind::Embers => Color::from_rgba8(255, 140, 50, alpha),
        WeatherKind::Fog | WeatherKind::None => Color::from_rgba8(200, 200, 210, alpha),
    }
}

/// Compose a particle overlay in screen space.
///
/// Rain is drawn as short streaks along the velocity, everything else as
/// discs.
pub fn compose_weather(kind: WeatherKind, particles: &[Particle], viewport: Size, scale_factor: f64) -> DisplayList {
    let screen = Affine::scale(scale_factor);
    let mut list = DisplayList::new(Color::from_rgba8(0, 0, 0, 0), screen, screen);
    if kind == WeatherKind::None {
        return list;
    }
    let bounds = Rect::from_origin_size(Point::ZERO, viewport);

    for particle in particles {
        let center = Point::new(particle.x, particle.y);
        let color = particle_color(kind, particle);
        match kind {
            WeatherKind::Rain => list.push(
                Layer::Weather,
                DrawCommand::Line {
                    from: center,
                    to: Point::new(particle.x + particle.vx, particle.y + particle.vy),
                    color,
                    width: 1.0,
                },
            ),
            _ => {
                if !bounds.inflate(particle.size, particle.size).contains(center) {
                    continue;
                }
                list.push(
                    Layer::Weather,
                    DrawCommand::FillCircle {
                        center,
                        radius: particle.size,
                        color,
                    },
                );
            }
        }
    }
    list
}
