use bevy::prelude::*;
use bevy::render::render_asset::RenderAssetUsages;
use bevy::render::render_resource::{Extent3d, TextureDimension, TextureFormat};
use bevy::window::PrimaryWindow;

use crate::configuration::config::ViewConfig;
use crate::simulation::engine::Engine;
use crate::visualization::canvas::{draw_star, Bitmap, Canvas};
use crate::visualization::input::{SpawnTrigger, ViewOffset};

/// Everything the frame loop carries between frames
#[derive(Resource)]
struct ViewerState {
    engine: Engine,
    bitmap: Bitmap,
    offset: ViewOffset,
    trigger: SpawnTrigger,
    darken: f32,
}

/// Texture the bitmap is uploaded into every frame
#[derive(Resource)]
struct CanvasImage(Handle<Image>);

pub fn run_viewer(engine: Engine, view: ViewConfig) {
    log::info!(
        "starting viewer with {} stars and {} workers",
        engine.len(),
        engine.workers()
    );

    let state = ViewerState {
        engine,
        bitmap: Bitmap::new(view.width as usize, view.height as usize),
        offset: ViewOffset::default(),
        trigger: SpawnTrigger::default(),
        darken: view.darken,
    };

    App::new()
        .insert_resource(ClearColor(Color::BLACK))
        .insert_resource(state)
        .add_plugins(DefaultPlugins.set(WindowPlugin {
            primary_window: Some(Window {
                title: "Galaxy Simulation".into(),
                resolution: (view.width as f32, view.height as f32).into(),
                resizable: false,
                ..default()
            }),
            ..default()
        }))
        .add_systems(Startup, setup_canvas_system)
        .add_systems(Update, (input_system, physics_step_system, draw_system).chain())
        .run();
}

fn setup_canvas_system(mut commands: Commands, state: Res<ViewerState>, mut images: ResMut<Assets<Image>>) {
    // 2D camera, one world unit per pixel
    commands.spawn(Camera2dBundle::default());

    let size = Extent3d {
        width: state.bitmap.width() as u32,
        height: state.bitmap.height() as u32,
        depth_or_array_layers: 1,
    };
    let image = Image::new_fill(
        size,
        TextureDimension::D2,
        &[0, 0, 0, 255],
        TextureFormat::Rgba8UnormSrgb,
        RenderAssetUsages::MAIN_WORLD | RenderAssetUsages::RENDER_WORLD,
    );
    let handle = images.add(image);

    commands.spawn(SpriteBundle {
        texture: handle.clone(),
        ..default()
    });
    commands.insert_resource(CanvasImage(handle));
}

/// Spawn on a left-click edge, scroll the view with the arrow keys
fn input_system(
    mut state: ResMut<ViewerState>,
    mouse: Res<ButtonInput<MouseButton>>,
    keys: Res<ButtonInput<KeyCode>>,
    windows: Query<&Window, With<PrimaryWindow>>,
) {
    let state = &mut *state;

    if state.trigger.poll(mouse.pressed(MouseButton::Left)) {
        let cursor = windows.get_single().ok().and_then(|w| w.cursor_position());
        if let Some(cursor) = cursor {
            let center = state.offset.to_world(cursor.x as f64, cursor.y as f64);
            state.engine.spawn_galaxy(center);
        }
    }

    // Shift pixels opposite to the scroll so moving doesn't leave trails
    if keys.pressed(KeyCode::ArrowUp) {
        state.offset.y += 1;
        state.bitmap.shift_down();
    }
    if keys.pressed(KeyCode::ArrowDown) {
        state.offset.y -= 1;
        state.bitmap.shift_up();
    }
    if keys.pressed(KeyCode::ArrowRight) {
        state.offset.x -= 1;
        state.bitmap.shift_left();
    }
    if keys.pressed(KeyCode::ArrowLeft) {
        state.offset.x += 1;
        state.bitmap.shift_right();
    }
}

fn physics_step_system(mut state: ResMut<ViewerState>, mut exit: EventWriter<AppExit>) {
    if let Err(err) = state.engine.step() {
        log::error!("simulation step failed: {err}");
        exit.send(AppExit::error());
    }
}

fn draw_system(mut state: ResMut<ViewerState>, canvas: Res<CanvasImage>, mut images: ResMut<Assets<Image>>) {
    let ViewerState {
        engine,
        bitmap,
        offset,
        darken,
        ..
    } = &mut *state;

    // Fade instead of clearing to leave trails
    bitmap.darken(*darken);

    let params = *engine.params();
    engine.with_stars(|stars| {
        for star in stars {
            draw_star(&mut *bitmap, star, &params, *offset);
        }
    });

    if let Some(image) = images.get_mut(&canvas.0) {
        let bytes = bitmap.as_bytes();
        if image.data.len() == bytes.len() {
            image.data.copy_from_slice(bytes);
        }
    }
}
